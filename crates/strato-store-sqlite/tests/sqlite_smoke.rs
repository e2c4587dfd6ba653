//! End-to-end exercises against an in-memory sqlite store.

use strato_storage::{
    CreateInviteParams, CreatePrivateFolderGrantParams, CreateSharingInviteParams,
    CreateSharingParams, CreateWorkspaceParams, CreateWorkspaceUserParams, FolderId, GranteeId,
    GranteeType, ItemId, ItemType, MembershipStore, RoleName, SharingKind, SharingStore,
    StoreError, UserUuid, WorkspaceId,
};
use strato_store_sqlite::SqliteStore;
use uuid::Uuid;

async fn store() -> SqliteStore {
    SqliteStore::open_in_memory().await.unwrap()
}

fn user() -> UserUuid {
    UserUuid(Uuid::new_v4())
}

async fn workspace(s: &SqliteStore, owner: UserUuid, seats: u32) -> WorkspaceId {
    s.create_workspace(&CreateWorkspaceParams {
        id: WorkspaceId(Uuid::now_v7()),
        owner_id: owner,
        workspace_user_uuid: UserUuid(Uuid::new_v4()),
        number_of_seats: seats,
        name: "acme".into(),
    })
    .await
    .unwrap()
}

async fn join(s: &SqliteStore, ws: WorkspaceId, member: UserUuid, space_limit: u64) {
    s.create_workspace_user(&CreateWorkspaceUserParams {
        workspace_id: ws,
        member_id: member,
        space_limit,
    })
    .await
    .unwrap();
}

// ───────────────────────────── Memberships ────────────────────────────

#[tokio::test]
async fn membership_lifecycle() {
    let s = store().await;
    let ws = workspace(&s, user(), 5).await;
    let member = user();

    assert!(s.find_workspace_user(&ws, &member).await.unwrap().is_none());

    join(&s, ws, member, 2048).await;
    let row = s
        .find_workspace_user(&ws, &member)
        .await
        .unwrap()
        .expect("membership row");
    assert_eq!(row.member_id, member);
    assert_eq!(row.space_limit, 2048);
    assert!(!row.deactivated);
    assert_eq!(row.drive_usage, 0);

    s.delete_workspace_user(&ws, &member).await.unwrap();
    assert!(s.find_workspace_user(&ws, &member).await.unwrap().is_none());
    let err = s.delete_workspace_user(&ws, &member).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
}

#[tokio::test]
async fn deactivation_excludes_member_from_active_count() {
    let s = store().await;
    let ws = workspace(&s, user(), 5).await;
    let (a, b) = (user(), user());
    join(&s, ws, a, 100).await;
    join(&s, ws, b, 100).await;

    assert_eq!(s.count_active_members(&ws).await.unwrap(), 2);

    s.set_member_deactivated(&ws, &a, true).await.unwrap();
    assert_eq!(s.count_active_members(&ws).await.unwrap(), 1);
    // Deactivated members still hold their promised space
    assert_eq!(s.sum_member_space_limits(&ws).await.unwrap(), 200);

    s.set_member_deactivated(&ws, &a, false).await.unwrap();
    assert_eq!(s.count_active_members(&ws).await.unwrap(), 2);
}

#[tokio::test]
async fn team_membership_lifecycle() {
    let s = store().await;
    let owner = user();
    let ws = workspace(&s, owner, 5).await;
    let team = s.get_workspace(&ws).await.unwrap().default_team_id;
    let member = user();

    assert!(s.find_team_user(&team, &member).await.unwrap().is_none());
    s.create_team_user(&team, &member).await.unwrap();
    let row = s
        .find_team_user(&team, &member)
        .await
        .unwrap()
        .expect("team row");
    assert_eq!(row.team_id, team);
    assert_eq!(row.member_id, member);

    let err = s.create_team_user(&team, &member).await.unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists));

    assert_eq!(s.list_team_ids_for_member(&ws, &member).await.unwrap(), vec![team]);

    s.delete_team_user(&team, &member).await.unwrap();
    assert!(s.list_team_ids_for_member(&ws, &member).await.unwrap().is_empty());
}

#[tokio::test]
async fn team_manager_can_be_replaced() {
    let s = store().await;
    let owner = user();
    let ws = workspace(&s, owner, 5).await;
    let team = s.get_workspace(&ws).await.unwrap().default_team_id;

    let successor = user();
    s.set_team_manager(&team, &successor).await.unwrap();
    assert_eq!(s.get_team(&team).await.unwrap().manager_id, successor);

    let err = s
        .set_team_manager(&strato_storage::TeamId(Uuid::new_v4()), &successor)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
}

// ───────────────────────────── Users ──────────────────────────────────

#[tokio::test]
async fn user_lookup_by_email_and_uuid() {
    let s = store().await;
    let uuid = user();
    let id = s.create_user(&uuid, "ada@example.com").await.unwrap();

    let by_email = s.get_user_by_email("ada@example.com").await.unwrap();
    assert_eq!(by_email.id, id);
    assert_eq!(by_email.uuid, uuid);

    let by_uuid = s.get_user_by_uuid(&uuid).await.unwrap();
    assert_eq!(by_uuid.email, "ada@example.com");

    let err = s.get_user_by_email("nobody@example.com").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound));

    let err = s.create_user(&user(), "ada@example.com").await.unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists));
}

// ───────────────────────────── Invites ────────────────────────────────

fn invite_params(ws: WorkspaceId, invited: UserUuid, space_limit: u64) -> CreateInviteParams {
    CreateInviteParams {
        workspace_id: ws,
        invited_user: invited,
        space_limit,
        encryption_key: vec![1, 2, 3],
        encryption_algorithm: "aes256gcm".into(),
    }
}

#[tokio::test]
async fn invite_lifecycle() {
    let s = store().await;
    let ws = workspace(&s, user(), 5).await;
    let invited = user();

    let id = s.create_invite(&invite_params(ws, invited, 512)).await.unwrap();

    let by_id = s.get_invite(&id).await.unwrap();
    assert_eq!(by_id.invited_user, invited);
    assert_eq!(by_id.space_limit, 512);
    assert_eq!(by_id.encryption_key, vec![1, 2, 3]);

    let found = s.find_invite(&ws, &invited).await.unwrap().expect("invite");
    assert_eq!(found.id, id);

    // One pending invite per (workspace, user)
    let err = s.create_invite(&invite_params(ws, invited, 64)).await.unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists));

    s.delete_invite(&id).await.unwrap();
    assert!(s.find_invite(&ws, &invited).await.unwrap().is_none());
    let err = s.get_invite(&id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
}

#[tokio::test]
async fn aggregates_are_workspace_scoped() {
    let s = store().await;
    let ws_a = workspace(&s, user(), 5).await;
    let ws_b = workspace(&s, user(), 5).await;

    join(&s, ws_a, user(), 300).await;
    join(&s, ws_a, user(), 200).await;
    s.create_invite(&invite_params(ws_a, user(), 100)).await.unwrap();

    assert_eq!(s.count_active_members(&ws_a).await.unwrap(), 2);
    assert_eq!(s.count_pending_invites(&ws_a).await.unwrap(), 1);
    assert_eq!(s.sum_member_space_limits(&ws_a).await.unwrap(), 500);
    assert_eq!(s.sum_invite_space_limits(&ws_a).await.unwrap(), 100);

    // Empty workspace sums to zero, not NULL
    assert_eq!(s.count_active_members(&ws_b).await.unwrap(), 0);
    assert_eq!(s.count_pending_invites(&ws_b).await.unwrap(), 0);
    assert_eq!(s.sum_member_space_limits(&ws_b).await.unwrap(), 0);
    assert_eq!(s.sum_invite_space_limits(&ws_b).await.unwrap(), 0);
}

// ───────────────────────────── Sharing ────────────────────────────────

async fn grant(
    s: &SqliteStore,
    item: ItemId,
    owner: UserUuid,
    shared_with: GranteeId,
    role: RoleName,
) -> strato_storage::SharingId {
    let role = s.find_role_by_name(role).await.unwrap();
    s.create_sharing(&CreateSharingParams {
        item_id: item,
        item_type: ItemType::File,
        owner_id: owner,
        shared_with,
        shared_with_type: GranteeType::Individual,
        kind: SharingKind::Private,
        encryption_key: vec![9, 9],
        role_id: role.id,
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn list_grants_filters_by_grantee_in_row_order() {
    let s = store().await;
    let item = ItemId(Uuid::new_v4());
    let owner = user();
    let (alice, bob, carol) = (user(), user(), user());

    grant(&s, item, owner, GranteeId::from(alice), RoleName::Viewer).await;
    grant(&s, item, owner, GranteeId::from(bob), RoleName::Editor).await;
    grant(&s, item, owner, GranteeId::from(carol), RoleName::Owner).await;

    let grants = s
        .list_grants(&item, ItemType::File, &[GranteeId::from(alice), GranteeId::from(bob)])
        .await
        .unwrap();
    assert_eq!(grants.len(), 2);
    assert_eq!(grants[0].sharing.shared_with, GranteeId::from(alice));
    assert_eq!(grants[0].role.as_ref().unwrap().name, RoleName::Viewer);
    assert_eq!(grants[1].role.as_ref().unwrap().name, RoleName::Editor);

    // Wrong item type matches nothing
    let none = s
        .list_grants(&item, ItemType::Folder, &[GranteeId::from(alice)])
        .await
        .unwrap();
    assert!(none.is_empty());

    let all = s.list_grants_for_item(&item, ItemType::File).await.unwrap();
    assert_eq!(all.len(), 3);

    let empty = s.list_grants(&item, ItemType::File, &[]).await.unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn set_grant_role_replaces_in_place() {
    let s = store().await;
    let item = ItemId(Uuid::new_v4());
    let alice = user();
    let id = grant(&s, item, user(), GranteeId::from(alice), RoleName::Viewer).await;

    let editor = s.find_role_by_name(RoleName::Editor).await.unwrap();
    s.set_grant_role(&id, &editor.id).await.unwrap();

    let grants = s
        .list_grants(&item, ItemType::File, &[GranteeId::from(alice)])
        .await
        .unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].role.as_ref().unwrap().name, RoleName::Editor);

    let err = s
        .set_grant_role(&strato_storage::SharingId(Uuid::new_v4()), &editor.id)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
}

#[tokio::test]
async fn delete_sharing_removes_grant_and_role() {
    let s = store().await;
    let item = ItemId(Uuid::new_v4());
    let alice = user();
    let id = grant(&s, item, user(), GranteeId::from(alice), RoleName::Viewer).await;

    s.delete_sharing(&id).await.unwrap();
    assert!(s.list_grants_for_item(&item, ItemType::File).await.unwrap().is_empty());

    let err = s.delete_sharing(&id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
}

#[tokio::test]
async fn sharing_invite_consumed_into_grant() {
    let s = store().await;
    let item = ItemId(Uuid::new_v4());
    let owner = user();
    let editor = s.find_role_by_name(RoleName::Editor).await.unwrap();

    let invite_id = s
        .create_sharing_invite(&CreateSharingInviteParams {
            item_id: item,
            item_type: ItemType::File,
            owner_id: owner,
            shared_with: "bob@example.com".into(),
            role_id: editor.id,
        })
        .await
        .unwrap();

    // One pending invite per (item, email)
    let err = s
        .create_sharing_invite(&CreateSharingInviteParams {
            item_id: item,
            item_type: ItemType::File,
            owner_id: owner,
            shared_with: "bob@example.com".into(),
            role_id: editor.id,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists));

    let found = s
        .find_sharing_invite(&item, ItemType::File, "bob@example.com")
        .await
        .unwrap()
        .expect("pending invite");
    assert_eq!(found.id, invite_id);
    assert_eq!(found.owner_id, owner);

    let bob = user();
    let sharing_id = s
        .consume_sharing_invite(&invite_id, &bob, &[7, 7, 7])
        .await
        .unwrap();

    // Invite is gone, grant exists with the invite's role and owner
    assert!(s
        .find_sharing_invite(&item, ItemType::File, "bob@example.com")
        .await
        .unwrap()
        .is_none());
    let grants = s
        .list_grants(&item, ItemType::File, &[GranteeId::from(bob)])
        .await
        .unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].sharing.id, sharing_id);
    assert_eq!(grants[0].sharing.owner_id, owner);
    assert_eq!(grants[0].sharing.encryption_key, vec![7, 7, 7]);
    assert_eq!(grants[0].role.as_ref().unwrap().name, RoleName::Editor);

    let err = s
        .consume_sharing_invite(&invite_id, &bob, &[7])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
}

#[tokio::test]
async fn private_folder_grant_lifecycle() {
    let s = store().await;
    let folder = FolderId(Uuid::new_v4());
    let (owner, alice) = (user(), user());
    let viewer = s.find_role_by_name(RoleName::Viewer).await.unwrap();

    let params = CreatePrivateFolderGrantParams {
        folder_id: folder,
        owner_id: owner,
        shared_with: alice,
        encryption_key: vec![4, 2],
        role_id: viewer.id,
    };
    s.create_private_folder_grant(&params).await.unwrap();

    let err = s.create_private_folder_grant(&params).await.unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists));

    let role = s
        .find_private_folder_role(&folder, &alice)
        .await
        .unwrap()
        .expect("role");
    assert_eq!(role.name, RoleName::Viewer);

    assert!(s.find_private_folder_role(&folder, &owner).await.unwrap().is_none());

    s.delete_private_folder_grant(&folder, &alice).await.unwrap();
    assert!(s.find_private_folder_role(&folder, &alice).await.unwrap().is_none());
    let err = s.delete_private_folder_grant(&folder, &alice).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
}
