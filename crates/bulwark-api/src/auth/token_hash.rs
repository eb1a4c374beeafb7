// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! One-way digest of raw refresh tokens.

use sha2::{Digest, Sha256};

/// Returns the lowercase hex SHA-256 digest of a raw token.
///
/// This is the only form in which a refresh token reaches the store.
pub fn hash_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}
