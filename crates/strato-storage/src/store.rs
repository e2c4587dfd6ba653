//! The persistence ports that backends implement.

use crate::types::*;
use crate::StoreError;

/// Persistence port for workspaces, memberships, teams and invites.
///
/// All lookups that can legitimately come back empty return `Option`
/// (absence of a membership row is not an error); `get_*` methods return
/// `StoreError::NotFound` when the record must exist.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait MembershipStore: Send + Sync {
    // ───────────────────────────── Workspaces ─────────────────────────────

    /// Create a workspace and its default team atomically (returns the id).
    async fn create_workspace(
        &self,
        params: &CreateWorkspaceParams,
    ) -> Result<WorkspaceId, StoreError>;

    /// Get workspace by ID.
    async fn get_workspace(&self, workspace_id: &WorkspaceId) -> Result<Workspace, StoreError>;

    /// Persist setup metadata and flip `setup_completed`, scoped by
    /// `(owner, workspace)`. `NotFound` when the pair matches no row, so a
    /// non-owner can never flip the flag.
    async fn complete_setup(
        &self,
        owner: &UserUuid,
        workspace_id: &WorkspaceId,
        setup: &WorkspaceSetup,
    ) -> Result<(), StoreError>;

    // ───────────────────────────── Memberships ────────────────────────────

    /// Find the membership row for a member in a workspace.
    async fn find_workspace_user(
        &self,
        workspace_id: &WorkspaceId,
        member: &UserUuid,
    ) -> Result<Option<WorkspaceUser>, StoreError>;

    /// Create a membership row (returns generated ID).
    async fn create_workspace_user(
        &self,
        params: &CreateWorkspaceUserParams,
    ) -> Result<WorkspaceUserId, StoreError>;

    /// Delete the membership row for a member in a workspace.
    async fn delete_workspace_user(
        &self,
        workspace_id: &WorkspaceId,
        member: &UserUuid,
    ) -> Result<(), StoreError>;

    /// Flip the deactivated flag on a membership row.
    async fn set_member_deactivated(
        &self,
        workspace_id: &WorkspaceId,
        member: &UserUuid,
        deactivated: bool,
    ) -> Result<(), StoreError>;

    // ───────────────────────────── Teams ──────────────────────────────────

    /// Get team by ID.
    async fn get_team(&self, team_id: &TeamId) -> Result<WorkspaceTeam, StoreError>;

    /// Replace the team's manager (never adds a second one).
    async fn set_team_manager(
        &self,
        team_id: &TeamId,
        manager: &UserUuid,
    ) -> Result<(), StoreError>;

    /// Find the team-membership row for a member.
    async fn find_team_user(
        &self,
        team_id: &TeamId,
        member: &UserUuid,
    ) -> Result<Option<WorkspaceTeamUser>, StoreError>;

    /// Create a team-membership row (returns generated ID).
    async fn create_team_user(
        &self,
        team_id: &TeamId,
        member: &UserUuid,
    ) -> Result<TeamUserId, StoreError>;

    /// Delete the team-membership row for a member.
    async fn delete_team_user(&self, team_id: &TeamId, member: &UserUuid)
        -> Result<(), StoreError>;

    /// List the ids of every team in the workspace the member belongs to.
    async fn list_team_ids_for_member(
        &self,
        workspace_id: &WorkspaceId,
        member: &UserUuid,
    ) -> Result<Vec<TeamId>, StoreError>;

    // ───────────────────────────── Users ──────────────────────────────────

    /// Get user by email.
    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError>;

    /// Get user by uuid.
    async fn get_user_by_uuid(&self, uuid: &UserUuid) -> Result<User, StoreError>;

    // ───────────────────────────── Invites ────────────────────────────────

    /// Create a workspace invite (returns generated ID).
    async fn create_invite(&self, params: &CreateInviteParams) -> Result<InviteId, StoreError>;

    /// Get invite by ID.
    async fn get_invite(&self, invite_id: &InviteId) -> Result<WorkspaceInvite, StoreError>;

    /// Find the pending invite for a user in a workspace.
    async fn find_invite(
        &self,
        workspace_id: &WorkspaceId,
        invited_user: &UserUuid,
    ) -> Result<Option<WorkspaceInvite>, StoreError>;

    /// Delete an invite (acceptance or revocation).
    async fn delete_invite(&self, invite_id: &InviteId) -> Result<(), StoreError>;

    // ───────────────────────────── Aggregates ─────────────────────────────

    /// Count non-deactivated membership rows.
    async fn count_active_members(&self, workspace_id: &WorkspaceId) -> Result<u32, StoreError>;

    /// Count pending invites.
    async fn count_pending_invites(&self, workspace_id: &WorkspaceId) -> Result<u32, StoreError>;

    /// Sum of `space_limit` over all membership rows.
    async fn sum_member_space_limits(&self, workspace_id: &WorkspaceId)
        -> Result<u64, StoreError>;

    /// Sum of `space_limit` over all pending invites.
    async fn sum_invite_space_limits(&self, workspace_id: &WorkspaceId)
        -> Result<u64, StoreError>;
}

/// Persistence port for sharing grants, roles and sharing invites.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait SharingStore: Send + Sync {
    // ───────────────────────────── Roles ──────────────────────────────────

    /// List the role vocabulary.
    async fn list_roles(&self) -> Result<Vec<Role>, StoreError>;

    /// Get role by ID.
    async fn get_role(&self, role_id: &RoleId) -> Result<Role, StoreError>;

    /// Look up a role by name.
    async fn find_role_by_name(&self, name: RoleName) -> Result<Role, StoreError>;

    // ───────────────────────────── Grants ─────────────────────────────────

    /// Create a Sharing row and its single SharingRole row (returns the id).
    async fn create_sharing(&self, params: &CreateSharingParams) -> Result<SharingId, StoreError>;

    /// Update the grant's single active SharingRole row (never inserts a
    /// second one).
    async fn set_grant_role(
        &self,
        sharing_id: &SharingId,
        role_id: &RoleId,
    ) -> Result<(), StoreError>;

    /// Delete a grant and its role row.
    async fn delete_sharing(&self, sharing_id: &SharingId) -> Result<(), StoreError>;

    /// Join Sharing → SharingRole → Role for any `shared_with` in
    /// `grantee_ids`, in natural row order. Rows whose SharingRole is
    /// missing come back with `role: None`.
    async fn list_grants(
        &self,
        item_id: &ItemId,
        item_type: ItemType,
        grantee_ids: &[GranteeId],
    ) -> Result<Vec<SharingGrant>, StoreError>;

    /// All grants on an item regardless of grantee, in natural row order.
    async fn list_grants_for_item(
        &self,
        item_id: &ItemId,
        item_type: ItemType,
    ) -> Result<Vec<SharingGrant>, StoreError>;

    // ───────────────────────────── Sharing invites ────────────────────────

    /// Create a pending email grant (returns generated ID).
    async fn create_sharing_invite(
        &self,
        params: &CreateSharingInviteParams,
    ) -> Result<SharingInviteId, StoreError>;

    /// Find the pending invite for an email on an item.
    async fn find_sharing_invite(
        &self,
        item_id: &ItemId,
        item_type: ItemType,
        email: &str,
    ) -> Result<Option<SharingInvite>, StoreError>;

    /// Delete a pending sharing invite.
    async fn delete_sharing_invite(&self, invite_id: &SharingInviteId) -> Result<(), StoreError>;

    /// Consume a pending invite into a Sharing + SharingRole pair for the
    /// now-registered grantee, deleting the invite.
    async fn consume_sharing_invite(
        &self,
        invite_id: &SharingInviteId,
        grantee: &UserUuid,
        encryption_key: &[u8],
    ) -> Result<SharingId, StoreError>;

    // ───────────────────────────── Private folders ────────────────────────

    /// Create a 1:1 private-folder grant and its role row.
    async fn create_private_folder_grant(
        &self,
        params: &CreatePrivateFolderGrantParams,
    ) -> Result<PrivateSharingFolderId, StoreError>;

    /// The role a user holds on a privately shared folder, if any.
    async fn find_private_folder_role(
        &self,
        folder_id: &FolderId,
        user: &UserUuid,
    ) -> Result<Option<Role>, StoreError>;

    /// Delete a private-folder grant and its role row.
    async fn delete_private_folder_grant(
        &self,
        folder_id: &FolderId,
        user: &UserUuid,
    ) -> Result<(), StoreError>;
}
