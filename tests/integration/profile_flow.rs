//! Profile editing against SQLite and filesystem storage

use std::sync::Arc;

use super::common::fixtures::{create_test_stores, identity};
use thyroscan::data::ProfileRepository;
use thyroscan::profile::{Confirmation, FieldOutcome, ProfileForm};
use thyroscan::{LocalSessionStore, ProfileService, SessionStore};

#[tokio::test]
async fn test_profile_edits_are_merge_written() {
    let stores = create_test_stores();
    let alice = identity("alice");
    let session = Arc::new(LocalSessionStore::signed_in(alice.clone()));
    let service = ProfileService::new(session.clone(), stores.profiles.clone(), stores.blobs.clone());

    assert!(service.toggle_process_flow(&alice).await.unwrap());

    let profile = service.load_profile(&alice).await.unwrap();
    let mut form = ProfileForm::from_current(&alice, &profile);
    form.phone = "555-0100".into();
    form.address = "1 Main St".into();
    let report = service.update_profile(&alice, &form).await;

    assert!(report.is_success());
    assert!(matches!(report.display_name, FieldOutcome::Unchanged));

    let stored = stores.profiles.get(&alice.id).await.unwrap().unwrap();
    assert_eq!(stored.phone, "555-0100");
    assert_eq!(stored.address, "1 Main St");
    // Contact write did not clobber the preference
    assert!(stored.show_process_flow);
    assert!(stored.updated_at.is_some());
}

#[tokio::test]
async fn test_avatar_lands_in_blob_store() {
    let stores = create_test_stores();
    let alice = identity("alice");
    let session = Arc::new(LocalSessionStore::signed_in(alice.clone()));
    let service = ProfileService::new(session.clone(), stores.profiles.clone(), stores.blobs.clone());

    let updated = service.update_avatar(&alice, b"avatar-bytes").await.unwrap();

    let url = updated.avatar_url.unwrap();
    assert!(url.starts_with("file://"));
    assert!(url.ends_with("profile_images/alice"));
    let on_disk = std::fs::read(stores.dir.path().join("blobs/profile_images/alice")).unwrap();
    assert_eq!(on_disk, b"avatar-bytes");
    assert_eq!(session.current().unwrap().avatar_url.as_deref(), Some(url.as_str()));
}

#[tokio::test]
async fn test_account_deletion_needs_fresh_login() {
    let stores = create_test_stores();
    let alice = identity("alice");
    let session = Arc::new(LocalSessionStore::signed_in(alice.clone()));
    let service = ProfileService::new(session.clone(), stores.profiles.clone(), stores.blobs.clone());

    session.expire_login();
    let err = service
        .delete_account(&alice, Confirmation::confirmed())
        .await
        .unwrap_err();
    assert!(err.requires_reauthentication());

    session.sign_in(alice.clone());
    service
        .delete_account(&alice, Confirmation::confirmed())
        .await
        .unwrap();
    assert!(session.current().is_none());
}
