use tessera_domain::identity::IdentityStatus;
use tessera_identity::domain::types::{NewIdentity, Password, RoleSyncOutcome};
use tessera_identity::error::IdentityError;

use crate::helpers::*;

fn store() -> TestStore {
    test_store(
        MockIdentityRepo::empty(),
        MockRoleAuthority::with_roles(&["admin", "editor"]),
    )
}

#[tokio::test]
async fn should_create_identity_with_role_and_credentials() {
    let store = store();

    let identity = store
        .create(new_identity("alice", "pw123", "editor"))
        .await
        .unwrap();

    assert_eq!(identity.status, IdentityStatus::Active);
    assert_eq!(identity.created_at, identity.updated_at);
    assert_eq!(identity.session_token.len(), 32);
    assert!(identity.new_password.is_none());
    assert!(store.validate_credential(&identity, "pw123").unwrap());
    assert_eq!(store.authority().assigned(identity.id), roles(&["editor"]));
    assert_eq!(
        store.repo().writes(),
        vec![RepoCall::Insert(identity.id)]
    );

    let stored = store.repo().stored(identity.id).unwrap();
    assert_eq!(stored.credential_hash, identity.credential_hash);
    assert!(stored.new_password.is_none());
}

#[tokio::test]
async fn should_reject_unknown_role_before_touching_storage() {
    let store = store();

    let result = store.create(new_identity("bob", "pw", "owner")).await;

    match result {
        Err(IdentityError::Validation(errors)) => {
            assert_eq!(errors.get("role"), Some("unknown role \"owner\""));
        }
        other => panic!("expected Validation, got {other:?}"),
    }
    assert!(store.repo().calls().is_empty());
    assert!(store.authority().mutations().is_empty());
}

#[tokio::test]
async fn should_report_every_invalid_field_together() {
    let store = store();

    let result = store
        .create(NewIdentity {
            username: "  ".into(),
            password: Some(Password::new("")),
            role: None,
            department_ref: Some("sales".into()),
            ..Default::default()
        })
        .await;

    let err = result.unwrap_err();
    let errors = err.validation().expect("validation error");
    assert!(errors.has("username"));
    assert!(errors.has("new_password"));
    assert!(errors.has("department_ref"));
    assert!(errors.has("role"));
    assert!(store.repo().calls().is_empty());
}

#[tokio::test]
async fn should_require_password_only_on_create() {
    let store = store();
    let mut identity = store
        .create(new_identity("alice", "pw123", "editor"))
        .await
        .unwrap();
    let hash = identity.credential_hash.clone();

    identity.full_name = Some("Alice Liddell".into());
    store.save(&mut identity).await.unwrap();

    assert_eq!(identity.credential_hash, hash);
    let stored = store.repo().stored(identity.id).unwrap();
    assert_eq!(stored.full_name.as_deref(), Some("Alice Liddell"));
}

#[tokio::test]
async fn should_rehash_when_new_password_is_set() {
    let store = store();
    let mut identity = store
        .create(new_identity("alice", "pw123", "editor"))
        .await
        .unwrap();

    identity.new_password = Some(Password::new("s3cret"));
    store.save(&mut identity).await.unwrap();

    assert!(identity.new_password.is_none());
    assert!(store.validate_credential(&identity, "s3cret").unwrap());
    assert!(!store.validate_credential(&identity, "pw123").unwrap());
}

#[tokio::test]
async fn should_reject_duplicate_username() {
    let store = store();
    store
        .create(new_identity("alice", "pw123", "editor"))
        .await
        .unwrap();

    let result = store.create(new_identity("alice", "other", "admin")).await;

    match result {
        Err(IdentityError::Validation(errors)) => {
            assert_eq!(errors.get("username"), Some("already taken"));
        }
        other => panic!("expected Validation, got {other:?}"),
    }
    assert_eq!(store.repo().writes().len(), 1);
}

#[tokio::test]
async fn should_allow_update_to_keep_own_username() {
    let store = store();
    let mut identity = store
        .create(new_identity("alice", "pw123", "editor"))
        .await
        .unwrap();

    let outcome = store.save(&mut identity).await.unwrap();

    assert_eq!(outcome, RoleSyncOutcome::Unchanged);
}

#[tokio::test]
async fn should_normalize_empty_department_to_none() {
    let store = store();

    let identity = store
        .create(NewIdentity {
            department_ref: Some(String::new()),
            ..new_identity("alice", "pw123", "editor")
        })
        .await
        .unwrap();

    assert_eq!(identity.department_ref, None);
    assert_eq!(store.repo().stored(identity.id).unwrap().department_ref, None);
}

#[tokio::test]
async fn should_keep_department_reference() {
    let store = store();

    let identity = store
        .create(NewIdentity {
            department_ref: Some("7".into()),
            ..new_identity("alice", "pw123", "editor")
        })
        .await
        .unwrap();

    assert_eq!(identity.department_ref.as_deref(), Some("7"));
}

#[tokio::test]
async fn should_skip_role_sync_when_write_fails() {
    let store = test_store(
        MockIdentityRepo::empty().failing_writes(),
        MockRoleAuthority::with_roles(&["admin", "editor"]),
    );

    let result = store.create(new_identity("alice", "pw123", "editor")).await;

    match &result {
        Err(e @ IdentityError::Persistence(_)) => assert!(!e.row_saved()),
        other => panic!("expected Persistence, got {other:?}"),
    }
    assert!(store.authority().mutations().is_empty());
}

#[tokio::test]
async fn should_leave_caller_identity_untouched_when_update_fails() {
    let mut identity = stored_identity("alice", IdentityStatus::Active);
    let store = test_store(
        MockIdentityRepo::new(vec![identity.clone()]).failing_writes(),
        MockRoleAuthority::with_roles(&["admin", "editor"]),
    );
    let before = identity.updated_at;
    identity.desired_role = Some("editor".into());
    identity.new_password = Some(Password::new("s3cret"));

    let result = store.save(&mut identity).await;

    assert!(matches!(result, Err(IdentityError::Persistence(_))), "expected Persistence, got {result:?}");
    assert_eq!(identity.updated_at, before);
    assert!(identity.new_password.is_some());
    assert!(identity.credential_hash.is_empty());
}

#[tokio::test]
async fn should_fail_validation_when_authority_is_unavailable() {
    let store = test_store(
        MockIdentityRepo::empty(),
        MockRoleAuthority::with_roles(&["editor"]).unavailable(),
    );

    let result = store.create(new_identity("alice", "pw123", "editor")).await;

    assert!(
        matches!(result, Err(IdentityError::Authority(_))),
        "expected Authority, got {result:?}"
    );
    assert!(store.repo().calls().is_empty());
}
