//! Session-registry integration tests: sliding expiration, idempotent
//! removal, the reserved system session, and login-failure wrapping.

use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use identicore::identity::{
    Authenticator, Credential, Details, MemoryDirectory, Principal, ResolverChain, SessionRegistry,
    SYSTEM_SESSION_ID,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn setup(ttl: Duration) -> SessionRegistry {
    init_tracing();
    let dir = Arc::new(MemoryDirectory::new());
    dir.insert_with_password(Principal::named("alice").with_authorities(["admin"]), "s3cret")
        .unwrap();
    SessionRegistry::new(ResolverChain::standard(dir, "en"), ttl)
}

fn login() -> Credential {
    Credential::Password { login: "alice".into(), password: "s3cret".into(), details: Details::default() }
}

#[test]
fn create_then_refresh_slides_last_access() -> Result<()> {
    let registry = setup(Duration::from_secs(60));
    let session = registry.create_session(login())?;
    assert_eq!(SessionRegistry::current_session_id().as_deref(), Some(session.id.as_str()));

    thread::sleep(Duration::from_millis(5));
    let refreshed = registry.get_and_refresh(&session.id).expect("session live");
    assert!(refreshed.last_access >= session.last_access);
    assert_eq!(refreshed.token.effective().name, "alice");
    assert_eq!(refreshed.details, *refreshed.token.details());
    Ok(())
}

#[test]
fn session_ids_are_random_url_safe_handles() -> Result<()> {
    let registry = setup(Duration::from_secs(60));
    let session = registry.create_session(login())?;
    // 16 random bytes, base64url without padding.
    assert_eq!(session.id.len(), 22);
    assert!(session.id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    Ok(())
}

#[test]
fn unknown_session_id_yields_none() {
    let registry = setup(Duration::from_secs(60));
    assert!(registry.get_and_refresh("no-such-session").is_none());
}

#[test]
fn expired_session_is_dropped_on_observation() {
    let registry = setup(Duration::from_millis(10));
    let session = registry.create_session(login()).unwrap();
    thread::sleep(Duration::from_millis(40));
    assert!(registry.get_and_refresh(&session.id).is_none());
    // Already dropped; a second observation behaves the same.
    assert!(registry.get_and_refresh(&session.id).is_none());
}

#[test]
fn refresh_within_ttl_keeps_session_alive() {
    let registry = setup(Duration::from_millis(80));
    let session = registry.create_session(login()).unwrap();
    for _ in 0..4 {
        thread::sleep(Duration::from_millis(30));
        assert!(registry.get_and_refresh(&session.id).is_some());
    }
}

#[test]
fn remove_session_is_idempotent() {
    let registry = setup(Duration::from_secs(60));
    let session = registry.create_session(login()).unwrap();

    registry.remove_session();
    assert!(registry.get_and_refresh(&session.id).is_none());
    assert!(SessionRegistry::current_session_id().is_none());

    // Second removal with no current session is a no-op.
    registry.remove_session();
    assert!(SessionRegistry::current_session_id().is_none());
}

#[test]
fn sequential_logins_produce_distinct_sessions() {
    let registry = setup(Duration::from_secs(60));
    let first = registry.create_session(login()).unwrap();
    let second = registry.create_session(login()).unwrap();
    assert_ne!(first.id, second.id);

    // Current pointer tracks the latest; removing it leaves the first intact.
    registry.remove_session();
    assert!(registry.get_and_refresh(&second.id).is_none());
    assert!(registry.get_and_refresh(&first.id).is_some());
}

#[test]
fn login_failure_wraps_and_registers_nothing() {
    let registry = setup(Duration::from_secs(60));
    let before = registry.count();
    let err = registry
        .create_session(Credential::Password {
            login: "alice".into(),
            password: "wrong".into(),
            details: Details::default(),
        })
        .unwrap_err();
    assert_eq!(err.code_str(), "login_failed");
    assert!(err.message().contains("invalid_credentials"));
    assert_eq!(registry.count(), before);
    assert!(SessionRegistry::current_session_id().is_none());
}

#[test]
fn system_session_never_expires() {
    let registry = setup(Duration::from_millis(5));
    thread::sleep(Duration::from_millis(30));
    let sys = registry.get_and_refresh(SYSTEM_SESSION_ID).expect("system session");
    assert_eq!(sys.token.effective().name, "system");
    thread::sleep(Duration::from_millis(30));
    assert!(registry.get_and_refresh(SYSTEM_SESSION_ID).is_some());
}

#[test]
fn check_current_user_session_paths() {
    let dir = Arc::new(MemoryDirectory::new());
    dir.insert_with_password(Principal::named("alice"), "s3cret").unwrap();
    let chain = ResolverChain::standard(dir, "en");
    let registry = SessionRegistry::new(chain.clone(), Duration::from_secs(60));
    let auth = Authenticator::new(chain);

    // Nothing established on this thread.
    assert!(!registry.check_current_user_session());

    // System/background identities are always valid without a session.
    auth.with_system(|| assert!(registry.check_current_user_session())).unwrap();
    assert!(!registry.check_current_user_session());

    // Interactive path goes through the registry.
    registry.create_session(login()).unwrap();
    assert!(registry.check_current_user_session());
    registry.remove_session();
    assert!(!registry.check_current_user_session());
}

#[test]
fn anonymous_sessions_are_supported() {
    let registry = setup(Duration::from_secs(60));
    let session = registry
        .create_session(Credential::Anonymous { details: Details::default() })
        .unwrap();
    assert_eq!(session.token.effective().name, "anonymous");
    assert_eq!(session.locale.as_deref(), Some("en"));
    assert_eq!(session.details.locale.as_deref(), Some("en"));
}

#[test]
fn removal_after_another_thread_dropped_the_entry_is_a_no_op() {
    let registry = Arc::new(setup(Duration::from_millis(10)));
    let (id_tx, id_rx) = mpsc::channel();
    let (go_tx, go_rx) = mpsc::channel();

    let shared = registry.clone();
    let handle = thread::spawn(move || {
        let session = shared.create_session(login()).unwrap();
        id_tx.send(session.id).unwrap();
        go_rx.recv().unwrap();
        // The entry is already gone; removal must lose the race quietly.
        shared.remove_session();
        assert!(SessionRegistry::current_session_id().is_none());
    });

    let id: String = id_rx.recv().unwrap();
    thread::sleep(Duration::from_millis(40));
    // Expired entry is dropped on observation from this thread.
    assert!(registry.get_and_refresh(&id).is_none());
    go_tx.send(()).unwrap();
    handle.join().unwrap();

    // Only the reserved system session remains.
    assert_eq!(registry.count(), 1);
}
