//! Login credential payloads and the parsed response.
//!
//! Login is sugar over the `login` method call. Password variants carry a
//! SHA-256 digest of the password; the clear text never leaves the
//! process.

use serde::{Deserialize, Serialize};

use ddp_core::{DdpDate, sha256_hex};

pub(crate) const LOGIN_METHOD: &str = "login";

/// Identifies the account a password login is for.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UserSelector {
    /// Select the account by email address.
    Email {
        /// The account's email address.
        email: String,
    },
    /// Select the account by username.
    Username {
        /// The account's username.
        username: String,
    },
}

/// A one-way password digest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PasswordDigest {
    /// Lowercase hex digest of the password.
    pub digest: String,
    /// Digest algorithm identifier, `"sha-256"`.
    pub algorithm: String,
}

impl PasswordDigest {
    /// Hashes a clear-text password with SHA-256.
    pub fn sha256(password: &str) -> Self {
        Self {
            digest: sha256_hex(password),
            algorithm: "sha-256".to_string(),
        }
    }
}

/// Credential payload for a password login.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PasswordLogin {
    /// Account selector.
    pub user: UserSelector,
    /// Hashed password.
    pub password: PasswordDigest,
}

impl PasswordLogin {
    /// Builds an email + password credential.
    pub fn email(email: impl Into<String>, password: &str) -> Self {
        Self {
            user: UserSelector::Email {
                email: email.into(),
            },
            password: PasswordDigest::sha256(password),
        }
    }

    /// Builds a username + password credential.
    pub fn username(username: impl Into<String>, password: &str) -> Self {
        Self {
            user: UserSelector::Username {
                username: username.into(),
            },
            password: PasswordDigest::sha256(password),
        }
    }
}

/// Credential payload for resuming a session with a previously issued token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumeLogin {
    /// The resume token.
    pub resume: String,
}

impl ResumeLogin {
    /// Wraps a resume token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            resume: token.into(),
        }
    }
}

/// Parsed body of a successful `login` result.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LoginResponse {
    /// Session resume token.
    #[serde(default)]
    pub token: Option<String>,

    /// When the token expires.
    #[serde(rename = "tokenExpires", default)]
    pub token_expires: Option<DdpDate>,
}
