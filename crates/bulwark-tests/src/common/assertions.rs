// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Custom Test Assertions
//!
//! Response assertions with informative failure messages.

use axum::http::StatusCode;
use bulwark_api::{Claims, TokenType};

use super::harness::TestResponse;

impl TestResponse {
    /// Asserts the status code.
    pub fn assert_status(&self, expected: StatusCode) {
        assert_eq!(
            self.status, expected,
            "Expected {}, got {} with body {}",
            expected, self.status, self.body
        );
    }

    /// Asserts the status code and the `{"error": ...}` message.
    pub fn assert_error(&self, expected: StatusCode, message: &str) {
        self.assert_status(expected);
        assert_eq!(
            self.str_field("error"),
            Some(message),
            "Unexpected error body {}",
            self.body
        );
    }
}

/// Assertion extensions for verified claims.
pub trait ClaimsAssertions {
    /// Asserts the token type.
    fn assert_type(&self, expected: TokenType);

    /// Asserts that `exp - iat` equals `ttl_secs`.
    fn assert_lifetime(&self, ttl_secs: i64);
}

impl ClaimsAssertions for Claims {
    fn assert_type(&self, expected: TokenType) {
        assert_eq!(self.tt, expected, "Expected {} token, got {}", expected, self.tt);
    }

    fn assert_lifetime(&self, ttl_secs: i64) {
        let iat = self.iat.expect("iat claim");
        assert_eq!(
            self.exp - iat,
            ttl_secs,
            "Expected lifetime {}s, got {}s",
            ttl_secs,
            self.exp - iat
        );
    }
}
