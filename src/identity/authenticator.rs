//! Public entry point for running logic under a specific identity with
//! guaranteed restoration: begin/end around the thread-local context stack,
//! scoped `with_user`/`with_system` wrappers whose teardown runs on every
//! exit path (panics included), and the process-wide install-once accessor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::error::AuthResult;

use super::context;
use super::locale::LocaleChain;
use super::reload::ReloadHook;
use super::resolver::{Credential, ResolverChain};
use super::token::Token;

pub struct Authenticator {
    chain: ResolverChain,
    locales: LocaleChain,
    reload: Option<Arc<dyn ReloadHook>>,
    started: AtomicBool,
}

impl Authenticator {
    pub fn new(chain: ResolverChain) -> Self {
        Self { chain, locales: LocaleChain::default(), reload: None, started: AtomicBool::new(false) }
    }

    pub fn with_locales(mut self, locales: LocaleChain) -> Self {
        self.locales = locales;
        self
    }

    /// Enable the persisted-principal reload extension point.
    pub fn with_reload(mut self, hook: Arc<dyn ReloadHook>) -> Self {
        self.reload = Some(hook);
        self
    }

    pub fn chain(&self) -> &ResolverChain { &self.chain }

    /// Authenticate as `login` (or the system account when absent) and
    /// activate the token, pushing whatever was current onto this thread's
    /// stack. On failure nothing is pushed, so a failed begin cannot drift
    /// the stack depth.
    pub fn begin(&self, login: Option<&str>) -> AuthResult<Token> {
        let credential = Credential::System { login: login.map(str::to_string) };
        let token = self.chain.resolve(&credential)?;
        let token = self.fixup(token)?;
        context::push_and_activate(token.clone());
        debug!(
            target: "identicore::auth",
            user = %token.effective().name,
            depth = context::stack_depth(),
            "begin"
        );
        Ok(token)
    }

    /// Restore the previously-active identity (possibly none) and re-point
    /// the thread log tag at it.
    pub fn end(&self) -> Option<Token> {
        let restored = context::pop_and_restore();
        debug!(
            target: "identicore::auth",
            user = %context::current_log_tag(),
            depth = context::stack_depth(),
            "end"
        );
        restored
    }

    /// Run `op` as `login`; `end()` runs on every exit path, including
    /// unwinding, and the operation's outcome is what the caller observes.
    pub fn with_user<T>(&self, login: &str, op: impl FnOnce() -> T) -> AuthResult<T> {
        self.begin(Some(login))?;
        let guard = RestoreGuard { auth: self };
        let out = op();
        drop(guard);
        Ok(out)
    }

    /// Run `op` as the system account, same teardown contract as `with_user`.
    pub fn with_system<T>(&self, op: impl FnOnce() -> T) -> AuthResult<T> {
        self.begin(None)?;
        let guard = RestoreGuard { auth: self };
        let out = op();
        drop(guard);
        Ok(out)
    }

    /// Fire-and-forget variant of `with_user`.
    pub fn run_with_user(&self, login: &str, op: impl FnOnce()) -> AuthResult<()> {
        self.with_user(login, op)
    }

    /// Fire-and-forget variant of `with_system`.
    pub fn run_with_system(&self, op: impl FnOnce()) -> AuthResult<()> {
        self.with_system(op)
    }

    /// Process-start hook: establish a system identity for startup code, but
    /// only when an authentication backend is actually configured.
    pub fn startup(&self) -> AuthResult<Option<Token>> {
        if self.chain.is_empty() {
            debug!(target: "identicore::auth", "no authentication backend configured; startup identity skipped");
            return Ok(None);
        }
        let token = self.begin(None)?;
        self.started.store(true, Ordering::SeqCst);
        Ok(Some(token))
    }

    /// Symmetric to `startup`; a no-op when startup never began an identity.
    /// Must run on the thread that called `startup`.
    pub fn shutdown(&self) {
        if self.started.swap(false, Ordering::SeqCst) {
            self.end();
        }
    }

    fn fixup(&self, token: Token) -> AuthResult<Token> {
        let mut token = token;
        // Substituted tokens were loaded fresh by their resolver; only plain
        // persisted principals need the staleness fixup.
        if let Some(hook) = &self.reload {
            if !token.is_substitution() && token.principal().persisted {
                let reloaded = hook.reload(token.principal())?;
                token = token.with_principal(reloaded);
            }
        }
        if token.details().locale.is_none() {
            let locale = self.locales.resolve(&token);
            token = token.with_locale(locale);
        }
        Ok(token)
    }
}

struct RestoreGuard<'a> {
    auth: &'a Authenticator,
}

impl Drop for RestoreGuard<'_> {
    fn drop(&mut self) {
        self.auth.end();
    }
}

static GLOBAL: OnceCell<Arc<Authenticator>> = OnceCell::new();

/// Install the process-wide authenticator. First install wins; later calls
/// return the already-installed instance.
pub fn install(authenticator: Authenticator) -> Arc<Authenticator> {
    GLOBAL.get_or_init(|| Arc::new(authenticator)).clone()
}

pub fn global() -> Option<Arc<Authenticator>> {
    GLOBAL.get().cloned()
}
