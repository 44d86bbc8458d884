//! Thread-local identity context: the token active on this thread right now,
//! plus a per-thread LIFO stack of previously-active tokens so nested
//! activations restore layer by layer. Thread-confined by design; a task that
//! hops to another worker thread must re-establish identity there.

use std::cell::RefCell;

use tracing::warn;

use crate::error::{AuthError, AuthResult};

use super::token::Token;

/// Past this depth, begin/end calls look unbalanced; diagnostic only.
const DEPTH_WARN: usize = 10;

thread_local! {
    static CURRENT: RefCell<Option<Token>> = const { RefCell::new(None) };
    // Entries are Option<Token>: None records "no identity was active before
    // the push" so restoring it is distinguishable from a real identity.
    static STACK: RefCell<Vec<Option<Token>>> = const { RefCell::new(Vec::new()) };
    static LOG_TAG: RefCell<String> = const { RefCell::new(String::new()) };
}

pub fn current() -> Option<Token> {
    CURRENT.with(|c| c.borrow().clone())
}

/// Current token, or `NoActiveIdentity` when nothing has been established on
/// this thread (non-interactive callers must `begin()` first).
pub fn current_or_err() -> AuthResult<Token> {
    current().ok_or(AuthError::NoActiveIdentity)
}

/// Replace the current value unconditionally. Used by push/pop; not meant for
/// ad hoc mutation from application code.
pub fn set_current(token: Option<Token>) {
    let tag = token.as_ref().map(|t| t.effective().display_name.clone()).unwrap_or_default();
    LOG_TAG.with(|l| *l.borrow_mut() = tag);
    CURRENT.with(|c| *c.borrow_mut() = token);
}

/// Push the currently-active token (possibly none) onto this thread's stack,
/// then activate `token`.
pub fn push_and_activate(token: Token) {
    let previous = current();
    let depth = STACK.with(|s| {
        let mut stack = s.borrow_mut();
        stack.push(previous);
        stack.len()
    });
    if depth > DEPTH_WARN {
        warn!(target: "identicore::context", depth, "identity stack unusually deep; begin/end calls look unbalanced");
    }
    set_current(Some(token));
}

/// Pop this thread's stack and restore the popped entry as current. An empty
/// stack is a begin/end mismatch: logged, and the context degrades to "no
/// identity" rather than failing, so teardown never masks a primary failure.
pub fn pop_and_restore() -> Option<Token> {
    match STACK.with(|s| s.borrow_mut().pop()) {
        None => {
            warn!(target: "identicore::context", "pop on empty identity stack; begin/end mismatch");
            set_current(None);
            None
        }
        Some(previous) => {
            set_current(previous.clone());
            previous
        }
    }
}

pub fn stack_depth() -> usize {
    STACK.with(|s| s.borrow().len())
}

/// Thread-scoped log tag: the display name of the active identity, updated on
/// every activation/restore so log lines correlate to "who was acting".
pub fn current_log_tag() -> String {
    LOG_TAG.with(|l| l.borrow().clone())
}
