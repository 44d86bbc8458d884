//! Authentication resolvers: turn a candidate credential into a trusted
//! token. A closed set of credential kinds is dispatched over resolvers
//! registered explicitly at startup; the first resolver whose `supports`
//! returns true wins.

use std::sync::Arc;

use tracing::debug;

use crate::error::{AuthError, AuthResult};

use super::directory::{verify_password, Directory};
use super::principal::Details;
use super::token::{Token, TokenKind};

/// Candidate credential kinds handled by the platform.
#[derive(Debug, Clone)]
pub enum Credential {
    /// Run as the platform system account (`login: None`) or impersonate a
    /// named user through the system path.
    System { login: Option<String> },
    Anonymous { details: Details },
    /// Run-as: an already-authenticated operator acting as `target`.
    Substitution { original: Token, target: String },
    /// Interactive login.
    Password { login: String, password: String, details: Details },
}

impl Credential {
    pub fn kind(&self) -> &'static str {
        match self {
            Credential::System { .. } => "system",
            Credential::Anonymous { .. } => "anonymous",
            Credential::Substitution { .. } => "substitution",
            Credential::Password { .. } => "password",
        }
    }
}

pub trait Resolver: Send + Sync {
    fn supports(&self, credential: &Credential) -> bool;
    fn authenticate(&self, credential: &Credential) -> AuthResult<Token>;
}

/// System-path resolver: empty login resolves to the distinguished system
/// principal, a named login is looked up in the directory.
pub struct SystemResolver {
    directory: Arc<dyn Directory>,
}

impl SystemResolver {
    pub fn new(directory: Arc<dyn Directory>) -> Self { Self { directory } }
}

impl Resolver for SystemResolver {
    fn supports(&self, credential: &Credential) -> bool {
        matches!(credential, Credential::System { .. })
    }

    fn authenticate(&self, credential: &Credential) -> AuthResult<Token> {
        let Credential::System { login } = credential else {
            return Err(AuthError::unsupported(credential.kind()));
        };
        let principal = match login.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => self.directory.system_user(),
            Some(name) => self.directory.load_by_name(name)?,
        };
        debug!(target: "identicore::auth", "system auth as '{}'", principal.name);
        Ok(Token::trusted(TokenKind::System, principal, Details::default()))
    }
}

/// Anonymous access: always the distinguished anonymous principal. Locale is
/// carried through from the candidate, falling back to the configured default.
pub struct AnonymousResolver {
    directory: Arc<dyn Directory>,
    default_locale: String,
}

impl AnonymousResolver {
    pub fn new(directory: Arc<dyn Directory>, default_locale: &str) -> Self {
        Self { directory, default_locale: default_locale.to_string() }
    }
}

impl Resolver for AnonymousResolver {
    fn supports(&self, credential: &Credential) -> bool {
        matches!(credential, Credential::Anonymous { .. })
    }

    fn authenticate(&self, credential: &Credential) -> AuthResult<Token> {
        let Credential::Anonymous { details } = credential else {
            return Err(AuthError::unsupported(credential.kind()));
        };
        let mut details = details.clone();
        if details.locale.is_none() {
            details.locale = Some(self.default_locale.clone());
        }
        Ok(Token::trusted(TokenKind::Anonymous, self.directory.anonymous_user(), details))
    }
}

/// Run-as resolver: requires an authenticated operator, loads the target from
/// the directory. Resulting token audits as the operator and presents the
/// target's authorities.
pub struct SubstitutionResolver {
    directory: Arc<dyn Directory>,
}

impl SubstitutionResolver {
    pub fn new(directory: Arc<dyn Directory>) -> Self { Self { directory } }
}

impl Resolver for SubstitutionResolver {
    fn supports(&self, credential: &Credential) -> bool {
        matches!(credential, Credential::Substitution { .. })
    }

    fn authenticate(&self, credential: &Credential) -> AuthResult<Token> {
        let Credential::Substitution { original, target } = credential else {
            return Err(AuthError::unsupported(credential.kind()));
        };
        if !original.is_authenticated() {
            return Err(AuthError::failed("substitution requires an authenticated operator"));
        }
        let principal = self.directory.load_by_name(target)?;
        if !principal.enabled || principal.locked {
            return Err(AuthError::failed(format!("substitution target '{}' is not active", target)));
        }
        debug!(target: "identicore::auth", "run-as '{}' by '{}'", principal.name, original.principal().name);
        Ok(Token::run_as(original, principal))
    }
}

/// Interactive login: PHC password verification against the directory entry.
/// Unknown names fail the same way as bad passwords.
pub struct PasswordResolver {
    directory: Arc<dyn Directory>,
}

impl PasswordResolver {
    pub fn new(directory: Arc<dyn Directory>) -> Self { Self { directory } }
}

impl Resolver for PasswordResolver {
    fn supports(&self, credential: &Credential) -> bool {
        matches!(credential, Credential::Password { .. })
    }

    fn authenticate(&self, credential: &Credential) -> AuthResult<Token> {
        let Credential::Password { login, password, details } = credential else {
            return Err(AuthError::unsupported(credential.kind()));
        };
        let principal = self
            .directory
            .load_by_name(login)
            .map_err(|_| AuthError::failed("invalid_credentials"))?;
        if !principal.enabled {
            return Err(AuthError::failed("account_disabled"));
        }
        if principal.locked {
            return Err(AuthError::failed("account_locked"));
        }
        let Some(phc) = self.directory.password_hash(login) else {
            return Err(AuthError::failed("invalid_credentials"));
        };
        if !verify_password(&phc, password) {
            return Err(AuthError::failed("invalid_credentials"));
        }
        debug!(target: "identicore::auth", "login user='{}'", principal.name);
        Ok(Token::trusted(TokenKind::Password, principal, details.clone()))
    }
}

/// Ordered chain of resolvers; first `supports` wins. Registration happens
/// explicitly at startup, no discovery.
#[derive(Clone, Default)]
pub struct ResolverChain {
    resolvers: Vec<Arc<dyn Resolver>>,
}

impl ResolverChain {
    pub fn new() -> Self { Self::default() }

    pub fn register(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolvers.push(resolver);
        self
    }

    /// The standard platform chain: system, anonymous, substitution, password.
    pub fn standard(directory: Arc<dyn Directory>, default_locale: &str) -> Self {
        Self::new()
            .register(Arc::new(SystemResolver::new(directory.clone())))
            .register(Arc::new(AnonymousResolver::new(directory.clone(), default_locale)))
            .register(Arc::new(SubstitutionResolver::new(directory.clone())))
            .register(Arc::new(PasswordResolver::new(directory)))
    }

    pub fn is_empty(&self) -> bool { self.resolvers.is_empty() }
    pub fn len(&self) -> usize { self.resolvers.len() }

    pub fn resolve(&self, credential: &Credential) -> AuthResult<Token> {
        for resolver in &self.resolvers {
            if resolver.supports(credential) {
                return resolver.authenticate(credential);
            }
        }
        Err(AuthError::unsupported(credential.kind()))
    }
}
