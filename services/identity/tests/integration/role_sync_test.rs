use tessera_domain::identity::IdentityStatus;
use tessera_identity::domain::types::RoleSyncOutcome;
use tessera_identity::error::{IdentityError, RoleSyncStage};

use crate::helpers::*;

#[tokio::test]
async fn should_not_mutate_roles_when_already_in_sync() {
    let store = test_store(
        MockIdentityRepo::empty(),
        MockRoleAuthority::with_roles(&["admin", "editor"]),
    );
    let mut identity = store
        .create(new_identity("alice", "pw123", "editor"))
        .await
        .unwrap();
    assert_eq!(
        store.authority().mutations(),
        vec![
            AuthorityCall::RevokeAll(identity.id),
            AuthorityCall::Assign("editor".into(), identity.id),
        ]
    );
    store.authority().clear_mutations();

    let outcome = store.save(&mut identity).await.unwrap();

    assert_eq!(outcome, RoleSyncOutcome::Unchanged);
    assert!(store.authority().mutations().is_empty());
}

#[tokio::test]
async fn should_replace_role_with_single_revoke_and_assign() {
    let mut identity = stored_identity("alice", IdentityStatus::Active);
    let authority = MockRoleAuthority::with_roles(&["admin", "editor"]);
    authority.seed(identity.id, &["editor"]);
    let store = test_store(MockIdentityRepo::new(vec![identity.clone()]), authority);

    identity.desired_role = Some("admin".into());
    let outcome = store.save(&mut identity).await.unwrap();

    assert_eq!(
        outcome,
        RoleSyncOutcome::Replaced {
            previous: roles(&["editor"])
        }
    );
    assert_eq!(
        store.authority().mutations(),
        vec![
            AuthorityCall::RevokeAll(identity.id),
            AuthorityCall::Assign("admin".into(), identity.id),
        ]
    );
    assert_eq!(store.authority().assigned(identity.id), roles(&["admin"]));
}

#[tokio::test]
async fn should_collapse_extra_assignments_to_desired_role() {
    let mut identity = stored_identity("alice", IdentityStatus::Active);
    let authority = MockRoleAuthority::with_roles(&["admin", "editor"]);
    authority.seed(identity.id, &["admin", "editor"]);
    let store = test_store(MockIdentityRepo::new(vec![identity.clone()]), authority);

    identity.desired_role = Some("editor".into());
    store.save(&mut identity).await.unwrap();

    assert_eq!(store.authority().assigned(identity.id), roles(&["editor"]));
    assert_eq!(store.authority().mutations().len(), 2);
}

#[tokio::test]
async fn should_retry_failed_assign() {
    let mut identity = stored_identity("alice", IdentityStatus::Active);
    let authority = MockRoleAuthority::with_roles(&["admin", "editor"]);
    authority.seed(identity.id, &["editor"]);
    authority.fail_next_assigns(1);
    let store = test_store(MockIdentityRepo::new(vec![identity.clone()]), authority)
        .with_assign_attempts(2);

    identity.desired_role = Some("admin".into());
    let outcome = store.save(&mut identity).await.unwrap();

    assert!(matches!(outcome, RoleSyncOutcome::Replaced { .. }));
    assert_eq!(store.authority().assign_attempts(), 2);
    assert_eq!(store.authority().assigned(identity.id), roles(&["admin"]));
}

#[tokio::test]
async fn should_restore_prior_roles_when_assign_keeps_failing() {
    let mut identity = stored_identity("alice", IdentityStatus::Active);
    let authority = MockRoleAuthority::with_roles(&["admin", "editor"]);
    authority.seed(identity.id, &["editor"]);
    authority.fail_next_assigns(2);
    let store = test_store(MockIdentityRepo::new(vec![identity.clone()]), authority)
        .with_assign_attempts(2);

    identity.desired_role = Some("admin".into());
    let result = store.save(&mut identity).await;

    match &result {
        Err(
            e @ IdentityError::RoleSync {
                stage,
                prior_roles,
                restored,
                ..
            },
        ) => {
            assert_eq!(*stage, RoleSyncStage::Assign);
            assert_eq!(*prior_roles, roles(&["editor"]));
            assert!(*restored);
            assert!(e.row_saved());
        }
        other => panic!("expected RoleSync, got {other:?}"),
    }
    assert_eq!(store.authority().assigned(identity.id), roles(&["editor"]));
    // The row write is not rolled back.
    assert_eq!(store.repo().writes(), vec![RepoCall::Update(identity.id)]);
}

#[tokio::test]
async fn should_report_unrestored_roles_when_restore_fails() {
    let mut identity = stored_identity("alice", IdentityStatus::Active);
    let authority = MockRoleAuthority::with_roles(&["admin", "editor"]);
    authority.seed(identity.id, &["editor"]);
    authority.fail_next_assigns(2);
    let store = test_store(MockIdentityRepo::new(vec![identity.clone()]), authority);

    identity.desired_role = Some("admin".into());
    let result = store.save(&mut identity).await;

    match &result {
        Err(IdentityError::RoleSync {
            stage, restored, ..
        }) => {
            assert_eq!(*stage, RoleSyncStage::Assign);
            assert!(!*restored);
        }
        other => panic!("expected RoleSync, got {other:?}"),
    }
    assert!(store.authority().assigned(identity.id).is_empty());
}

#[tokio::test]
async fn should_report_revoke_failure_as_unrestored() {
    let mut identity = stored_identity("alice", IdentityStatus::Active);
    let authority = MockRoleAuthority::with_roles(&["admin", "editor"]).failing_revoke();
    authority.seed(identity.id, &["editor"]);
    let store = test_store(MockIdentityRepo::new(vec![identity.clone()]), authority);

    identity.desired_role = Some("admin".into());
    let result = store.save(&mut identity).await;

    match &result {
        Err(IdentityError::RoleSync {
            stage, restored, ..
        }) => {
            assert_eq!(*stage, RoleSyncStage::Revoke);
            assert!(!*restored);
        }
        other => panic!("expected RoleSync, got {other:?}"),
    }
    assert_eq!(store.authority().assign_attempts(), 0);
}

#[tokio::test]
async fn should_report_inspect_failure_after_row_is_saved() {
    let mut identity = stored_identity("alice", IdentityStatus::Active);
    let authority = MockRoleAuthority::with_roles(&["admin", "editor"]).failing_inspect();
    let store = test_store(MockIdentityRepo::new(vec![identity.clone()]), authority);

    identity.desired_role = Some("admin".into());
    let result = store.save(&mut identity).await;

    match &result {
        Err(
            e @ IdentityError::RoleSync {
                stage,
                prior_roles,
                restored,
                ..
            },
        ) => {
            assert_eq!(*stage, RoleSyncStage::Inspect);
            assert!(prior_roles.is_empty());
            assert!(*restored);
            assert!(e.row_saved());
        }
        other => panic!("expected RoleSync, got {other:?}"),
    }
    assert_eq!(store.repo().writes(), vec![RepoCall::Update(identity.id)]);
    assert!(store.authority().mutations().is_empty());
}

#[tokio::test]
async fn should_report_role_removed_after_validation() {
    let mut identity = stored_identity("alice", IdentityStatus::Active);
    let authority = MockRoleAuthority::with_roles(&["admin", "editor"]).missing_role("admin");
    authority.seed(identity.id, &["editor"]);
    let store = test_store(MockIdentityRepo::new(vec![identity.clone()]), authority);

    identity.desired_role = Some("admin".into());
    let result = store.save(&mut identity).await;

    match &result {
        Err(
            e @ IdentityError::RoleSync {
                stage,
                prior_roles,
                restored,
                ..
            },
        ) => {
            assert_eq!(*stage, RoleSyncStage::Resolve);
            assert_eq!(*prior_roles, roles(&["editor"]));
            assert!(*restored);
            assert!(e.row_saved());
        }
        other => panic!("expected RoleSync, got {other:?}"),
    }
    assert!(store.authority().mutations().is_empty());
    assert_eq!(store.authority().assigned(identity.id), roles(&["editor"]));
}

#[tokio::test]
async fn should_serialize_concurrent_saves_of_one_identity() {
    let identity = stored_identity("alice", IdentityStatus::Active);
    let authority = MockRoleAuthority::with_roles(&["admin", "editor"]);
    authority.seed(identity.id, &["editor"]);
    let store = test_store(MockIdentityRepo::new(vec![identity.clone()]), authority);

    let mut first = identity.clone();
    first.desired_role = Some("admin".into());
    let mut second = identity.clone();
    second.desired_role = Some("editor".into());

    let (a, b) = tokio::join!(store.save(&mut first), store.save(&mut second));
    a.unwrap();
    b.unwrap();

    let mutations = store.authority().mutations();
    assert_eq!(mutations.len(), 4, "got {mutations:?}");
    for pair in mutations.chunks(2) {
        assert!(
            matches!(
                pair,
                [AuthorityCall::RevokeAll(_), AuthorityCall::Assign(_, _)]
            ),
            "revoke/assign pair interleaved: {mutations:?}"
        );
    }
    assert_eq!(store.authority().assigned(identity.id).len(), 1);
}
