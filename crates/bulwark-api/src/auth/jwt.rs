// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Token signing and verification.
//!
//! Tokens are signed with an asymmetric key pair. The private key never
//! leaves the process; the public key may be handed to any verifier.
//! Signature checks are delegated to `jsonwebtoken`, the time-based claims
//! are checked here so that a missing `iat` or `nbf` is not an error.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bulwark_config::{JwtAlgorithm, JwtConfig, KeyPair};
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use super::claims::{Claims, ClaimsBuilder};

// =============================================================================
// Errors
// =============================================================================

/// Why a token was rejected.
///
/// Rejection is an expected outcome, not a fault. Callers that talk to
/// clients must collapse every variant into one generic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidToken {
    /// Not a well-formed JWT or the claims do not parse.
    #[error("malformed token")]
    Malformed,
    /// The header names an algorithm other than the configured one.
    #[error("unexpected signing algorithm")]
    Algorithm,
    /// Signature does not verify against the public key.
    #[error("bad signature")]
    BadSignature,
    /// `exp` has passed.
    #[error("token expired")]
    Expired,
    /// `nbf` is in the future.
    #[error("token not yet valid")]
    NotYetValid,
    /// `iss` does not match the configured issuer.
    #[error("wrong issuer")]
    WrongIssuer,
}

impl InvalidToken {
    fn from_jwt(kind: &ErrorKind) -> Self {
        match kind {
            ErrorKind::InvalidSignature => InvalidToken::BadSignature,
            ErrorKind::InvalidAlgorithm => InvalidToken::Algorithm,
            ErrorKind::ExpiredSignature => InvalidToken::Expired,
            ErrorKind::ImmatureSignature => InvalidToken::NotYetValid,
            ErrorKind::InvalidIssuer => InvalidToken::WrongIssuer,
            _ => InvalidToken::Malformed,
        }
    }
}

/// Failure to construct a signer or to sign.
#[derive(Debug, Error)]
pub enum SignerError {
    /// Key material could not be parsed for the configured algorithm.
    #[error("Invalid {kind} key for {algorithm}: {message}")]
    Key {
        /// `private` or `public`.
        kind: &'static str,
        /// Configured algorithm.
        algorithm: &'static str,
        /// Parser message.
        message: String,
    },

    /// Encoding failed.
    #[error("Failed to sign token: {message}")]
    Encode {
        /// Encoder message.
        message: String,
    },
}

// =============================================================================
// TokenSigner
// =============================================================================

/// Signs and verifies tokens.
///
/// Built once at startup from the JWT configuration and shared immutably.
#[derive(Clone)]
pub struct TokenSigner {
    algorithm: JwtAlgorithm,
    issuer: Option<String>,
    leeway: i64,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl TokenSigner {
    /// Creates a signer from configuration and resolved key material.
    pub fn new(config: &JwtConfig, keys: &KeyPair) -> Result<Self, SignerError> {
        let mut signer = Self::from_pem(
            config.algorithm,
            keys.private_pem.expose(),
            &keys.public_pem,
        )?;
        signer.issuer = config.issuer.clone();
        signer.leeway = i64::try_from(config.leeway_secs).unwrap_or(i64::MAX);
        Ok(signer)
    }

    /// Creates a signer from PEM strings with no issuer and zero leeway.
    pub fn from_pem(
        algorithm: JwtAlgorithm,
        private_pem: &str,
        public_pem: &str,
    ) -> Result<Self, SignerError> {
        let (encoding_key, decoding_key) = load_keys(algorithm, private_pem, public_pem)?;

        let mut validation = Validation::new(jwt_algorithm(algorithm));
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Ok(Self {
            algorithm,
            issuer: None,
            leeway: 0,
            encoding_key: Arc::new(encoding_key),
            decoding_key: Arc::new(decoding_key),
            validation: Arc::new(validation),
        })
    }

    /// Sets the issuer stamped on and required from every token.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Sets the clock skew tolerance.
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = i64::try_from(leeway.as_secs()).unwrap_or(i64::MAX);
        self
    }

    /// Returns the signing algorithm.
    pub fn algorithm(&self) -> JwtAlgorithm {
        self.algorithm
    }

    // =========================================================================
    // Signing
    // =========================================================================

    /// Signs claims, stamping `iat` and `exp` from the current time.
    pub fn sign(&self, claims: ClaimsBuilder, ttl: Duration) -> Result<String, SignerError> {
        self.sign_at(claims, ttl, Utc::now().timestamp())
    }

    /// Signs claims as of `now` (Unix seconds).
    pub fn sign_at(
        &self,
        claims: ClaimsBuilder,
        ttl: Duration,
        now: i64,
    ) -> Result<String, SignerError> {
        let claims = match &self.issuer {
            Some(iss) if !claims.has_issuer() => claims.issuer(iss.clone()),
            _ => claims,
        };
        let claims = claims.build(now, ttl);

        let header = Header::new(jwt_algorithm(self.algorithm));
        encode(&header, &claims, &self.encoding_key).map_err(|e| SignerError::Encode {
            message: e.to_string(),
        })
    }

    // =========================================================================
    // Verification
    // =========================================================================

    /// Verifies a token against the current time.
    pub fn verify(&self, token: &str) -> Result<Claims, InvalidToken> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verifies a token as of `now` (Unix seconds).
    ///
    /// The signature check runs before any claim is trusted.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, InvalidToken> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| InvalidToken::from_jwt(e.kind()))?;
        let claims = data.claims;

        if claims.exp <= now.saturating_sub(self.leeway) {
            return Err(InvalidToken::Expired);
        }
        if let Some(nbf) = claims.nbf {
            if nbf > now.saturating_add(self.leeway) {
                return Err(InvalidToken::NotYetValid);
            }
        }
        if let Some(expected) = &self.issuer {
            if claims.iss.as_deref() != Some(expected.as_str()) {
                return Err(InvalidToken::WrongIssuer);
            }
        }

        Ok(claims)
    }
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("leeway", &self.leeway)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn jwt_algorithm(algorithm: JwtAlgorithm) -> Algorithm {
    match algorithm {
        JwtAlgorithm::ES256 => Algorithm::ES256,
        JwtAlgorithm::ES384 => Algorithm::ES384,
        JwtAlgorithm::RS256 => Algorithm::RS256,
        JwtAlgorithm::RS384 => Algorithm::RS384,
        JwtAlgorithm::RS512 => Algorithm::RS512,
        JwtAlgorithm::PS256 => Algorithm::PS256,
        JwtAlgorithm::PS384 => Algorithm::PS384,
        JwtAlgorithm::PS512 => Algorithm::PS512,
        JwtAlgorithm::EdDSA => Algorithm::EdDSA,
    }
}

fn load_keys(
    algorithm: JwtAlgorithm,
    private_pem: &str,
    public_pem: &str,
) -> Result<(EncodingKey, DecodingKey), SignerError> {
    let key_error = |kind: &'static str| {
        move |e: jsonwebtoken::errors::Error| SignerError::Key {
            kind,
            algorithm: algorithm.as_str(),
            message: e.to_string(),
        }
    };
    let private = private_pem.as_bytes();
    let public = public_pem.as_bytes();

    match algorithm {
        JwtAlgorithm::ES256 | JwtAlgorithm::ES384 => Ok((
            EncodingKey::from_ec_pem(private).map_err(key_error("private"))?,
            DecodingKey::from_ec_pem(public).map_err(key_error("public"))?,
        )),
        JwtAlgorithm::RS256
        | JwtAlgorithm::RS384
        | JwtAlgorithm::RS512
        | JwtAlgorithm::PS256
        | JwtAlgorithm::PS384
        | JwtAlgorithm::PS512 => Ok((
            EncodingKey::from_rsa_pem(private).map_err(key_error("private"))?,
            DecodingKey::from_rsa_pem(public).map_err(key_error("public"))?,
        )),
        JwtAlgorithm::EdDSA => Ok((
            EncodingKey::from_ed_pem(private).map_err(key_error("private"))?,
            DecodingKey::from_ed_pem(public).map_err(key_error("public"))?,
        )),
    }
}

// =============================================================================
// Tests
// =============================================================================
