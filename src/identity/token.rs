//! The identity value flowing through the system: either an unauthenticated
//! claim (just a name, awaiting verification) or a token minted by a resolver.
//! Tokens are immutable after creation; substitution or elevation mints a new
//! token rather than mutating in place, and only resolver code inside this
//! crate can produce an authenticated token.

use serde::{Deserialize, Serialize};

use super::principal::{Details, Principal};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Unverified claim, as constructed by frontend code.
    Claim,
    /// System account or system-path impersonation of a named user; never expires.
    System,
    Anonymous,
    /// Interactive password login.
    Password,
    /// Run-as: an operator acting with another principal's authorities.
    Substitution,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    kind: TokenKind,
    /// Audit principal: for substituted tokens this stays the real operator.
    principal: Principal,
    substituted: Option<Principal>,
    /// Cleared on authentication; only claims may carry a secret.
    credentials: Option<String>,
    details: Details,
    authenticated: bool,
}

impl Token {
    /// Unauthenticated claim carrying only a claimed name. Resolvers turn
    /// claims into trusted tokens; nothing else does.
    pub fn claim<S: Into<String>>(name: S) -> Self {
        Self::claim_with_details(name, Details::default())
    }

    pub fn claim_with_details<S: Into<String>>(name: S, details: Details) -> Self {
        Token {
            kind: TokenKind::Claim,
            principal: Principal::named(name),
            substituted: None,
            credentials: None,
            details,
            authenticated: false,
        }
    }

    /// Mint a trusted token. Crate-private: only resolvers may call this.
    pub(crate) fn trusted(kind: TokenKind, principal: Principal, details: Details) -> Self {
        Token { kind, principal, substituted: None, credentials: None, details, authenticated: true }
    }

    /// Mint a run-as token: audits as `original`'s principal, presents
    /// `target`'s authorities.
    pub(crate) fn run_as(original: &Token, target: Principal) -> Self {
        Token {
            kind: TokenKind::Substitution,
            principal: original.principal.clone(),
            substituted: Some(target),
            credentials: None,
            details: original.details.clone(),
            authenticated: true,
        }
    }

    pub(crate) fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = principal;
        self
    }

    pub(crate) fn with_locale<S: Into<String>>(mut self, locale: S) -> Self {
        self.details.locale = Some(locale.into());
        self
    }

    /// The audit principal. For substituted tokens this is the real operator,
    /// not the identity being acted as.
    pub fn principal(&self) -> &Principal { &self.principal }

    /// The identity in effect: the substituted principal when present,
    /// otherwise the audit principal.
    pub fn effective(&self) -> &Principal {
        self.substituted.as_ref().unwrap_or(&self.principal)
    }

    /// Authorities presented to the rest of the system (the effective
    /// principal's, per the substitution contract).
    pub fn authorities(&self) -> &[String] { &self.effective().authorities }

    pub fn details(&self) -> &Details { &self.details }
    pub fn kind(&self) -> TokenKind { self.kind }
    pub fn is_authenticated(&self) -> bool { self.authenticated }
    pub fn is_substitution(&self) -> bool { self.substituted.is_some() }

    /// System/background tokens never expire and need no session backing.
    pub fn is_system(&self) -> bool { self.kind == TokenKind::System }
}
