// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the storage and hashing collaborators.
//!
//! # Error Hierarchy
//!
//! ```text
//! StoreError
//! ├── UniqueViolation - a unique constraint rejected a write (which column)
//! ├── NotFound        - an update targeted a missing row
//! ├── Connection      - the store could not be reached
//! ├── Database        - any other backend failure
//! └── Migration       - schema bootstrap failed
//!
//! PasswordError       - the hashing primitive failed
//! ```

use std::fmt;

use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// UniqueField
// =============================================================================

/// The column a unique constraint was raised on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UniqueField {
    /// `users_private.email`
    Email,
    /// `users.username`
    Username,
    /// `refresh_tokens.token_hash`
    TokenHash,
    /// Any other constraint, by name.
    Other(String),
}

impl UniqueField {
    /// Classifies a constraint name or a backend error message.
    ///
    /// Constraint names are matched first. Backends that only report a
    /// message (SQLite: `UNIQUE constraint failed: users_private.email`)
    /// fall through to a column-name search.
    pub fn classify(text: &str) -> Self {
        let lower = text.to_ascii_lowercase();
        match lower.as_str() {
            "users_private_email_key" | "users_private.email" => return Self::Email,
            "users_username_key" | "users.username" => return Self::Username,
            "refresh_tokens_token_hash_key" | "refresh_tokens.token_hash" => {
                return Self::TokenHash
            }
            _ => {}
        }

        if lower.contains("email") {
            Self::Email
        } else if lower.contains("username") {
            Self::Username
        } else if lower.contains("token_hash") {
            Self::TokenHash
        } else {
            Self::Other(text.to_string())
        }
    }
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email => write!(f, "email"),
            Self::Username => write!(f, "username"),
            Self::TokenHash => write!(f, "token_hash"),
            Self::Other(name) => write!(f, "{}", name),
        }
    }
}

// =============================================================================
// StoreError
// =============================================================================

/// Errors raised by the relational collaborators.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("Unique constraint violated on {field}")]
    UniqueViolation {
        /// The offending column.
        field: UniqueField,
    },

    /// The targeted row does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind.
        entity: &'static str,
        /// Lookup key.
        id: String,
    },

    /// The store could not be reached.
    #[error("Store connection failed: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// Any other backend failure.
    #[error("Database error: {message}")]
    Database {
        /// Error message.
        message: String,
    },

    /// Schema bootstrap failed.
    #[error("Migration failed: {message}")]
    Migration {
        /// Error message.
        message: String,
    },
}

impl StoreError {
    /// Creates a unique violation error.
    pub fn unique(field: UniqueField) -> Self {
        Self::UniqueViolation { field }
    }

    /// Creates a not found error.
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Creates a migration error.
    pub fn migration(message: impl Into<String>) -> Self {
        Self::Migration {
            message: message.into(),
        }
    }

    /// Returns the collided column if this is a unique violation.
    pub fn unique_field(&self) -> Option<&UniqueField> {
        match self {
            Self::UniqueViolation { field } => Some(field),
            _ => None,
        }
    }

    /// Returns `true` for failures of the store itself rather than of the
    /// request.
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Database { .. } | Self::Migration { .. }
        )
    }
}

// =============================================================================
// PasswordError
// =============================================================================

/// Errors raised by the password hashing primitive.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// Hashing failed.
    #[error("Password hashing failed: {message}")]
    Hash {
        /// Error message.
        message: String,
    },

    /// Invalid hasher parameters.
    #[error("Invalid password hashing parameters: {message}")]
    Params {
        /// Error message.
        message: String,
    },
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_constraint_names() {
        assert_eq!(UniqueField::classify("users_private_email_key"), UniqueField::Email);
        assert_eq!(UniqueField::classify("users_username_key"), UniqueField::Username);
        assert_eq!(
            UniqueField::classify("refresh_tokens_token_hash_key"),
            UniqueField::TokenHash
        );
    }

    #[test]
    fn test_classify_sqlite_messages() {
        assert_eq!(
            UniqueField::classify("UNIQUE constraint failed: users_private.email"),
            UniqueField::Email
        );
        assert_eq!(
            UniqueField::classify("UNIQUE constraint failed: users.username"),
            UniqueField::Username
        );
        assert_eq!(
            UniqueField::classify("UNIQUE constraint failed: roles.name"),
            UniqueField::Other("UNIQUE constraint failed: roles.name".into())
        );
    }

    #[test]
    fn test_unique_field_accessor() {
        let err = StoreError::unique(UniqueField::Email);
        assert_eq!(err.unique_field(), Some(&UniqueField::Email));
        assert!(!err.is_fault());

        let err = StoreError::database("disk I/O error");
        assert!(err.unique_field().is_none());
        assert!(err.is_fault());
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::not_found("user", "42");
        assert_eq!(err.to_string(), "user not found: 42");
        let err = StoreError::unique(UniqueField::Username);
        assert_eq!(err.to_string(), "Unique constraint violated on username");
    }
}
