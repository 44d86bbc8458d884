//! Ambient identity context for the platform: who is acting, on this thread,
//! right now. Keep the public surface thin and split implementation across
//! sub-modules.

mod principal;
mod token;
mod directory;
mod resolver;
mod context;
mod authenticator;
mod session;
mod locale;
mod reload;

pub use principal::{Details, Principal};
pub use token::{Token, TokenKind};
pub use directory::{Directory, MemoryDirectory, ANONYMOUS_NAME, SYSTEM_NAME};
pub use resolver::{
    AnonymousResolver, Credential, PasswordResolver, Resolver, ResolverChain, SubstitutionResolver,
    SystemResolver,
};
pub use context::{
    current, current_log_tag, current_or_err, pop_and_restore, push_and_activate, set_current,
    stack_depth,
};
pub use authenticator::{global, install, Authenticator};
pub use session::{Session, SessionRegistry, SYSTEM_SESSION_ID};
pub use locale::{LocaleChain, LocaleResolver, PrincipalLocaleResolver};
pub use reload::ReloadHook;
