//! Server-side session registry for interactive work: concurrent map of
//! sessions with sliding expiration, a per-thread current-session pointer,
//! and the reserved always-valid system session. System/background `begin()`
//! calls never touch this registry; they live purely in the thread-local
//! context.

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use base64::Engine;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{AuthError, AuthResult};
use crate::tprintln;

use super::context;
use super::principal::{Details, Principal};
use super::resolver::{Credential, ResolverChain};
use super::directory::SYSTEM_NAME;
use super::token::{Token, TokenKind};

/// Fixed identifier of the reserved system session; constructed with the
/// registry, never expires, never removable.
pub const SYSTEM_SESSION_ID: &str = "sys-00000000";

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub token: Token,
    pub locale: Option<String>,
    /// Client details carried over from the authenticated token.
    pub details: Details,
    pub created_at: Instant,
    pub last_access: Instant,
}

#[derive(Debug)]
struct SessionEntry {
    session: Session,
}

thread_local! {
    static CURRENT_SESSION: RefCell<Option<String>> = const { RefCell::new(None) };
}

fn gen_id() -> AuthResult<String> {
    // 128-bit random token base64url without padding. A failed RNG must not
    // degrade to a fixed (colliding) id, so the error propagates.
    let mut buf = [0u8; 16];
    getrandom::getrandom(&mut buf).map_err(|e| AuthError::failed(e.to_string()))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf))
}

pub struct SessionRegistry {
    ttl: Duration,
    chain: ResolverChain,
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new(chain: ResolverChain, ttl: Duration) -> Self {
        let registry = Self { ttl, chain, sessions: RwLock::new(HashMap::new()) };
        let now = Instant::now();
        let token = Token::trusted(TokenKind::System, Principal::named(SYSTEM_NAME), Details::default());
        let system = Session {
            id: SYSTEM_SESSION_ID.to_string(),
            locale: None,
            details: Details::default(),
            token,
            created_at: now,
            last_access: now,
        };
        registry.sessions.write().insert(system.id.clone(), SessionEntry { session: system });
        registry
    }

    /// Authenticate `credential` through the resolver chain and register the
    /// resulting session as this thread's current one. Resolver failures wrap
    /// as `LoginFailed`; nothing is registered on failure.
    pub fn create_session(&self, credential: Credential) -> AuthResult<Session> {
        let token = self.chain.resolve(&credential).map_err(AuthError::login_failed)?;
        let now = Instant::now();
        let session = Session {
            id: gen_id()?,
            locale: token.details().locale.clone(),
            details: token.details().clone(),
            token,
            created_at: now,
            last_access: now,
        };
        self.sessions.write().insert(session.id.clone(), SessionEntry { session: session.clone() });
        CURRENT_SESSION.with(|c| *c.borrow_mut() = Some(session.id.clone()));
        tprintln!("session.create user={} sid={}", session.token.effective().name, session.id);
        Ok(session)
    }

    /// Deregister this thread's current session. Idempotent: no current
    /// session, or a session another thread already removed, is a no-op.
    pub fn remove_session(&self) {
        let sid = CURRENT_SESSION.with(|c| c.borrow_mut().take());
        match sid {
            None => {
                debug!(target: "identicore::session", "remove_session with no current session; ignoring");
            }
            Some(id) if id == SYSTEM_SESSION_ID => {
                // The system session is exempt from removal.
                debug!(target: "identicore::session", "remove_session on system session; ignoring");
            }
            Some(id) => {
                if self.sessions.write().remove(&id).is_some() {
                    tprintln!("session.remove sid={}", id);
                } else {
                    debug!(target: "identicore::session", sid = %id, "session already removed");
                }
            }
        }
    }

    /// Sliding-expiration touchpoint: a live session gets its last-access
    /// timestamp moved forward and is returned; expired sessions are dropped
    /// on observation; unknown ids yield none.
    pub fn get_and_refresh(&self, id: &str) -> Option<Session> {
        let now = Instant::now();
        let mut map = self.sessions.write();
        let entry = map.get_mut(id)?;
        if entry.session.id != SYSTEM_SESSION_ID
            && now.duration_since(entry.session.last_access) > self.ttl
        {
            map.remove(id);
            return None;
        }
        entry.session.last_access = now;
        Some(entry.session.clone())
    }

    /// True when a system/background token is current on this thread (always
    /// valid, never expires), or when the thread's session still refreshes.
    pub fn check_current_user_session(&self) -> bool {
        if context::current().is_some_and(|t| t.is_system()) {
            return true;
        }
        match Self::current_session_id() {
            Some(sid) => self.get_and_refresh(&sid).is_some(),
            None => false,
        }
    }

    pub fn current_session_id() -> Option<String> {
        CURRENT_SESSION.with(|c| c.borrow().clone())
    }

    /// Number of registered sessions, the reserved system session included.
    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }
}
