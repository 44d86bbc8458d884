//! Identity registry: resolves a principal name (case-insensitively) to full
//! identity details. The platform guarantees the reserved `system` and
//! `anonymous` principals resolve even against an empty backing directory.

use std::collections::HashMap;

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use parking_lot::RwLock;
use password_hash::{PasswordHash, SaltString};

use crate::error::{AuthError, AuthResult};

use super::principal::Principal;

pub const SYSTEM_NAME: &str = "system";
pub const ANONYMOUS_NAME: &str = "anonymous";

/// Backing-directory boundary. Name comparison is case-insensitive.
pub trait Directory: Send + Sync {
    fn load_by_name(&self, name: &str) -> AuthResult<Principal>;

    /// PHC password hash for a principal, when the backing store keeps one.
    /// Directories without credential storage return `None`.
    fn password_hash(&self, _name: &str) -> Option<String> { None }

    fn system_user(&self) -> Principal { Principal::named(SYSTEM_NAME) }
    fn anonymous_user(&self) -> Principal { Principal::named(ANONYMOUS_NAME) }
}

pub fn hash_password(password: &str) -> AuthResult<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| AuthError::failed(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| AuthError::failed(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::failed(e.to_string()))?
        .to_string();
    Ok(phc)
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else { false }
}

#[derive(Debug)]
struct DirEntry {
    principal: Principal,
    password_hash: Option<String>,
}

/// In-memory directory keyed by lower-cased name. Pluggable stores implement
/// `Directory` directly; this one doubles as the test fixture across the crate.
#[derive(Default)]
pub struct MemoryDirectory {
    entries: RwLock<HashMap<String, DirEntry>>,
}

impl MemoryDirectory {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&self, principal: Principal) {
        let key = principal.name.trim().to_lowercase();
        self.entries.write().insert(key, DirEntry { principal, password_hash: None });
    }

    /// Insert a principal with a password, hashing it to PHC form.
    pub fn insert_with_password(&self, principal: Principal, password: &str) -> AuthResult<()> {
        let phc = hash_password(password)?;
        let key = principal.name.trim().to_lowercase();
        self.entries.write().insert(key, DirEntry { principal, password_hash: Some(phc) });
        Ok(())
    }

    pub fn remove(&self, name: &str) -> bool {
        self.entries.write().remove(&name.trim().to_lowercase()).is_some()
    }

    /// Enumerate all registered principals (admin surfaces).
    pub fn all(&self) -> Vec<Principal> {
        self.entries.read().values().map(|e| e.principal.clone()).collect()
    }
}

impl Directory for MemoryDirectory {
    fn load_by_name(&self, name: &str) -> AuthResult<Principal> {
        let key = name.trim().to_lowercase();
        if let Some(entry) = self.entries.read().get(&key) {
            return Ok(entry.principal.clone());
        }
        // Reserved principals resolve even with no backing entry.
        match key.as_str() {
            SYSTEM_NAME => Ok(self.system_user()),
            ANONYMOUS_NAME => Ok(self.anonymous_user()),
            _ => Err(AuthError::not_found(name)),
        }
    }

    fn password_hash(&self, name: &str) -> Option<String> {
        self.entries.read().get(&name.trim().to_lowercase()).and_then(|e| e.password_hash.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let dir = MemoryDirectory::new();
        dir.insert(Principal::named("Admin").with_authorities(["admin"]));
        for name in ["Admin", "admin", "ADMIN"] {
            let p = dir.load_by_name(name).unwrap();
            assert_eq!(p.name, "Admin");
            assert!(p.has_authority("admin"));
        }
    }

    #[test]
    fn reserved_principals_resolve_against_empty_directory() {
        let dir = MemoryDirectory::new();
        let sys = dir.load_by_name("system").unwrap();
        assert_eq!(sys.name, SYSTEM_NAME);
        assert!(sys.authorities.is_empty());
        let anon = dir.load_by_name("Anonymous").unwrap();
        assert_eq!(anon.name, ANONYMOUS_NAME);
        assert!(anon.authorities.is_empty());
    }

    #[test]
    fn unknown_principal_misses() {
        let dir = MemoryDirectory::new();
        let err = dir.load_by_name("ghost").unwrap_err();
        assert_eq!(err, AuthError::not_found("ghost"));
    }

    #[test]
    fn password_hash_round_trip() {
        let dir = MemoryDirectory::new();
        dir.insert_with_password(Principal::named("alice"), "s3cret").unwrap();
        let phc = dir.password_hash("ALICE").expect("hash stored");
        assert!(verify_password(&phc, "s3cret"));
        assert!(!verify_password(&phc, "wrong"));
    }
}
