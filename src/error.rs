//! Unified error model for the identity subsystem.
//! This module provides the common error enum surfaced by the resolver chain,
//! the authenticator and the session registry, along with helper constructors.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthError {
    /// No registered resolver claims support for the candidate credential.
    UnsupportedCredential { kind: String },
    /// Directory lookup miss; surfaced as an authentication failure, never retried.
    PrincipalNotFound { name: String },
    /// A resolver rejected the candidate (bad credential, disabled or locked account).
    AuthenticationFailed { reason: String },
    /// Interactive-session wrapping of a resolver failure (`create_session` path).
    LoginFailed { reason: String },
    /// "Who is the current user" asked on a thread with no established identity.
    NoActiveIdentity,
}

impl AuthError {
    pub fn unsupported<S: Into<String>>(kind: S) -> Self { AuthError::UnsupportedCredential { kind: kind.into() } }
    pub fn not_found<S: Into<String>>(name: S) -> Self { AuthError::PrincipalNotFound { name: name.into() } }
    pub fn failed<S: Into<String>>(reason: S) -> Self { AuthError::AuthenticationFailed { reason: reason.into() } }

    /// Wrap a resolver-level failure for the interactive-session path.
    pub fn login_failed(inner: AuthError) -> Self {
        AuthError::LoginFailed { reason: inner.to_string() }
    }

    pub fn code_str(&self) -> &'static str {
        match self {
            AuthError::UnsupportedCredential { .. } => "unsupported_credential",
            AuthError::PrincipalNotFound { .. } => "principal_not_found",
            AuthError::AuthenticationFailed { .. } => "authentication_failed",
            AuthError::LoginFailed { .. } => "login_failed",
            AuthError::NoActiveIdentity => "no_active_identity",
        }
    }

    pub fn message(&self) -> String {
        match self {
            AuthError::UnsupportedCredential { kind } => format!("no resolver supports credential kind '{}'", kind),
            AuthError::PrincipalNotFound { name } => format!("principal '{}' not found", name),
            AuthError::AuthenticationFailed { reason } => reason.clone(),
            AuthError::LoginFailed { reason } => reason.clone(),
            AuthError::NoActiveIdentity => "no identity established on this thread".to_string(),
        }
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AuthError {}

pub type AuthResult<T> = Result<T, AuthError>;
