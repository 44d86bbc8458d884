//! Locale resolution strategies, consulted in order when a token's own client
//! details carry no locale; falls back to the configured system default.

use std::sync::Arc;

use super::token::Token;

pub trait LocaleResolver: Send + Sync {
    fn resolve(&self, token: &Token) -> Option<String>;
}

/// Uses the effective principal's stored locale preference.
pub struct PrincipalLocaleResolver;

impl LocaleResolver for PrincipalLocaleResolver {
    fn resolve(&self, token: &Token) -> Option<String> {
        token.effective().locale.clone()
    }
}

#[derive(Clone)]
pub struct LocaleChain {
    resolvers: Vec<Arc<dyn LocaleResolver>>,
    default_locale: String,
}

impl LocaleChain {
    pub fn new(default_locale: &str) -> Self {
        Self { resolvers: Vec::new(), default_locale: default_locale.to_string() }
    }

    pub fn register(mut self, resolver: Arc<dyn LocaleResolver>) -> Self {
        self.resolvers.push(resolver);
        self
    }

    pub fn default_locale(&self) -> &str { &self.default_locale }

    /// First resolver with an answer wins; otherwise the system default.
    pub fn resolve(&self, token: &Token) -> String {
        for resolver in &self.resolvers {
            if let Some(locale) = resolver.resolve(token) {
                return locale;
            }
        }
        self.default_locale.clone()
    }
}

impl Default for LocaleChain {
    fn default() -> Self {
        Self::new("en").register(Arc::new(PrincipalLocaleResolver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::principal::{Details, Principal};
    use crate::identity::token::TokenKind;

    #[test]
    fn principal_preference_then_default() {
        let chain = LocaleChain::default();
        let mut p = Principal::named("pierre");
        p.locale = Some("fr".into());
        let tok = Token::trusted(TokenKind::Password, p, Details::default());
        assert_eq!(chain.resolve(&tok), "fr");

        let plain = Token::trusted(TokenKind::Password, Principal::named("joe"), Details::default());
        assert_eq!(chain.resolve(&plain), "en");
    }
}
