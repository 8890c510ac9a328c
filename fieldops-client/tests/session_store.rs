// fieldops-client/tests/session_store.rs
// Session persistence and role switching

use fieldops_client::{SessionError, SessionStore};
use serde_json::json;
use tempfile::TempDir;

#[test]
fn test_save_load_clear() {
    let temp_dir = TempDir::new().unwrap();
    let store = SessionStore::new(temp_dir.path());

    store.save("token-1", json!({ "id": 1, "name": "Admin" })).unwrap();
    let session = store.load().unwrap().unwrap();
    assert_eq!(session.token, "token-1");
    assert_eq!(session.user["name"], "Admin");

    // Reopening reads the same file
    let reopened = SessionStore::new(temp_dir.path());
    assert_eq!(reopened.load().unwrap(), Some(session));

    store.clear().unwrap();
    assert!(store.load().unwrap().is_none());
    assert!(!store.path().exists());
}

#[test]
fn test_impersonation_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let store = SessionStore::new(&temp_dir.path().join("nested"));
    store.save("admin-token", json!({ "id": 1, "role": "admin" })).unwrap();

    store
        .begin_impersonation("tech-token", json!({ "id": 7, "role": "tecnico" }))
        .unwrap();
    assert!(store.is_impersonating().unwrap());
    assert_eq!(store.load().unwrap().unwrap().token, "tech-token");

    let original = store.return_to_original().unwrap();
    assert_eq!(original.token, "admin-token");
    assert_eq!(original.user["role"], "admin");
    assert!(!store.is_impersonating().unwrap());
    assert_eq!(store.load().unwrap().unwrap().token, "admin-token");
}

#[test]
fn test_impersonation_refuses_nesting() {
    let temp_dir = TempDir::new().unwrap();
    let store = SessionStore::new(temp_dir.path());
    store.save("admin-token", json!({ "id": 1 })).unwrap();
    store.begin_impersonation("a", json!({ "id": 2 })).unwrap();

    let err = store.begin_impersonation("b", json!({ "id": 3 })).unwrap_err();
    assert!(matches!(err, SessionError::AlreadyImpersonating));

    // The first stash survives the refused attempt
    assert_eq!(store.return_to_original().unwrap().token, "admin-token");
}

#[test]
fn test_return_without_stash_and_impersonate_without_login() {
    let temp_dir = TempDir::new().unwrap();
    let store = SessionStore::new(temp_dir.path());

    let err = store.return_to_original().unwrap_err();
    assert!(matches!(err, SessionError::NotImpersonating));

    let err = store.begin_impersonation("x", json!({})).unwrap_err();
    assert!(matches!(err, SessionError::NotLoggedIn));
}

#[test]
fn test_corrupt_file_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let store = SessionStore::new(temp_dir.path());
    std::fs::write(store.path(), "{ not json").unwrap();

    assert!(matches!(store.load(), Err(SessionError::Json(_))));
}
