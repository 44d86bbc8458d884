use crate::error::AuthResult;

use super::principal::Principal;

/// Persistence-layer extension point: refresh a persisted principal on
/// activation so staleness/lazy-loading issues are fixed up transparently.
/// Skipped for principals that are not backed by a persisted record.
pub trait ReloadHook: Send + Sync {
    fn reload(&self, principal: &Principal) -> AuthResult<Principal>;
}
