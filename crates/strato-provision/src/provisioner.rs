//! The provisioning saga implementations.

use std::sync::Arc;

use thiserror::Error;

use strato_audit::{record_best_effort, AuditAction, AuditEvent, AuditSink};
use strato_bridge::{Bridge, BridgeError, Mailer};
use strato_quota::{QuotaError, QuotaLedger};
use strato_storage::{
    Actor, CreateInviteParams, CreateWorkspaceUserParams, InviteId, MembershipStore, StoreError,
    UserUuid, Workspace, WorkspaceId, WorkspaceInvite, WorkspaceSetup,
};

/// Caller-facing error taxonomy for provisioning operations.
///
/// `Capacity` covers seat and space rejections; `Conflict` covers duplicate
/// membership/invite races; `Internal` is raised after saga compensation has
/// run (or for any infrastructure failure).
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("not found")]
    NotFound,
    #[error("forbidden")]
    Forbidden,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("capacity exceeded: {0}")]
    Capacity(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ProvisionError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ProvisionError::NotFound,
            StoreError::AlreadyExists => ProvisionError::Conflict("already exists".into()),
            StoreError::Conflict => ProvisionError::Conflict("conflicting state".into()),
            StoreError::Backend(msg) => ProvisionError::Internal(msg),
        }
    }
}

impl From<BridgeError> for ProvisionError {
    fn from(e: BridgeError) -> Self {
        match e {
            BridgeError::AccountNotFound => ProvisionError::NotFound,
            BridgeError::Transport(msg) => ProvisionError::Internal(msg),
        }
    }
}

impl From<QuotaError> for ProvisionError {
    fn from(e: QuotaError) -> Self {
        match e {
            QuotaError::Bridge(b) => b.into(),
            QuotaError::Store(s) => s.into(),
        }
    }
}

/// Invitation request as received from the caller.
#[derive(Clone, Debug)]
pub struct InviteRequest {
    pub email: String,
    pub space_limit: u64,
    pub encryption_key: Vec<u8>,
    pub encryption_algorithm: String,
}

/// Orchestrates workspace setup, invitations and membership lifecycle.
pub struct WorkspaceProvisioner {
    membership: Arc<dyn MembershipStore>,
    bridge: Arc<dyn Bridge>,
    mailer: Arc<dyn Mailer>,
    audit: Arc<dyn AuditSink>,
    quota: QuotaLedger,
}

impl WorkspaceProvisioner {
    pub fn new(
        membership: Arc<dyn MembershipStore>,
        bridge: Arc<dyn Bridge>,
        mailer: Arc<dyn Mailer>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let quota = QuotaLedger::new(membership.clone(), bridge.clone());
        Self {
            membership,
            bridge,
            mailer,
            audit,
            quota,
        }
    }

    // ───────────────────────────── Setup saga ─────────────────────────────

    /// Finish setting up a freshly created workspace.
    ///
    /// Step A creates the owner's membership row, Step B adds the owner to
    /// the default team, Step C persists the metadata and flips
    /// `setup_completed`. A and B are create-if-absent, so retrying after a
    /// partial failure is safe. If any step after A fails, the rows created
    /// by this invocation are deleted and the original failure is raised as
    /// `Internal`.
    pub async fn setup_workspace(
        &self,
        actor: &Actor,
        workspace_id: &WorkspaceId,
        setup: WorkspaceSetup,
    ) -> Result<(), ProvisionError> {
        if setup.name.trim().is_empty() {
            return Err(ProvisionError::BadRequest("workspace name is required".into()));
        }

        let workspace = self.membership.get_workspace(workspace_id).await?;
        if workspace.owner_id != actor.uuid {
            return Err(ProvisionError::Forbidden);
        }

        // Step A: owner membership row, create if absent.
        let created_membership = match self
            .membership
            .find_workspace_user(workspace_id, &actor.uuid)
            .await?
        {
            Some(_) => false,
            None => {
                self.membership
                    .create_workspace_user(&CreateWorkspaceUserParams {
                        workspace_id: *workspace_id,
                        member_id: actor.uuid,
                        space_limit: 0,
                    })
                    .await?;
                true
            }
        };

        // Step B: default-team membership row, create if absent.
        let created_team_user = match self
            .membership
            .find_team_user(&workspace.default_team_id, &actor.uuid)
            .await
        {
            Ok(Some(_)) => false,
            Ok(None) => {
                match self
                    .membership
                    .create_team_user(&workspace.default_team_id, &actor.uuid)
                    .await
                {
                    Ok(_) => true,
                    Err(e) => {
                        return Err(self
                            .unwind_setup(&workspace, actor, created_membership, false, e)
                            .await);
                    }
                }
            }
            Err(e) => {
                return Err(self
                    .unwind_setup(&workspace, actor, created_membership, false, e)
                    .await);
            }
        };

        // Step C: persist metadata, scoped by (owner, workspace).
        if let Err(e) = self
            .membership
            .complete_setup(&actor.uuid, workspace_id, &setup)
            .await
        {
            return Err(self
                .unwind_setup(&workspace, actor, created_membership, created_team_user, e)
                .await);
        }

        record_best_effort(
            self.audit.as_ref(),
            AuditEvent::builder(AuditAction::WorkspaceSetup)
                .entity("workspace", workspace_id.0.to_string())
                .performer(&actor.uuid)
                .workspace_id(workspace_id)
                .metadata(serde_json::json!({ "name": setup.name }))
                .build(),
        )
        .await;

        Ok(())
    }

    /// Best-effort rollback of the setup saga. Always returns `Internal`
    /// carrying the original failure; compensation failures are logged.
    async fn unwind_setup(
        &self,
        workspace: &Workspace,
        actor: &Actor,
        created_membership: bool,
        created_team_user: bool,
        cause: StoreError,
    ) -> ProvisionError {
        tracing::error!(
            workspace_id = %workspace.id.0,
            error = %cause,
            "workspace setup failed, compensating"
        );
        if created_membership {
            if let Err(e) = self
                .membership
                .delete_workspace_user(&workspace.id, &actor.uuid)
                .await
            {
                tracing::error!(
                    workspace_id = %workspace.id.0,
                    error = %e,
                    "compensation failed to delete workspace membership"
                );
            }
        }
        if created_team_user {
            if let Err(e) = self
                .membership
                .delete_team_user(&workspace.default_team_id, &actor.uuid)
                .await
            {
                tracing::error!(
                    team_id = %workspace.default_team_id.0,
                    error = %e,
                    "compensation failed to delete team membership"
                );
            }
        }
        ProvisionError::Internal(cause.to_string())
    }

    // ───────────────────────────── Invitations ────────────────────────────

    /// Invite a user (by email) into a workspace.
    ///
    /// Validation order: workspace exists, target registered or
    /// pre-registered at the bridge, free seat, not already a member, no
    /// duplicate pending invite, requested space fits what is assignable.
    /// Only then is the invite row created; the notification is dispatched
    /// afterwards and its failure never revokes the invite.
    pub async fn invite_user_to_workspace(
        &self,
        actor: &Actor,
        workspace_id: &WorkspaceId,
        request: InviteRequest,
    ) -> Result<InviteId, ProvisionError> {
        if request.email.trim().is_empty() {
            return Err(ProvisionError::BadRequest("email is required".into()));
        }

        let workspace = self.membership.get_workspace(workspace_id).await?;

        // Resolve or pre-register the target account.
        let (target, external) = match self.membership.get_user_by_email(&request.email).await {
            Ok(user) => (user.uuid, false),
            Err(StoreError::NotFound) => {
                let created = self.bridge.create_user(&request.email).await?;
                (created.uuid, true)
            }
            Err(e) => return Err(e.into()),
        };

        if self.quota.is_workspace_full(workspace_id).await? {
            return Err(ProvisionError::Capacity("no free seat".into()));
        }
        if self
            .membership
            .find_workspace_user(workspace_id, &target)
            .await?
            .is_some()
        {
            return Err(ProvisionError::Conflict("user is already a member".into()));
        }
        if self
            .membership
            .find_invite(workspace_id, &target)
            .await?
            .is_some()
        {
            return Err(ProvisionError::Conflict(
                "user already has a pending invite".into(),
            ));
        }
        let assignable = self.quota.assignable_space(&workspace).await?;
        if request.space_limit > assignable {
            return Err(ProvisionError::Capacity(
                "requested space exceeds what is assignable".into(),
            ));
        }

        let invite_id = self
            .membership
            .create_invite(&CreateInviteParams {
                workspace_id: *workspace_id,
                invited_user: target,
                space_limit: request.space_limit,
                encryption_key: request.encryption_key,
                encryption_algorithm: request.encryption_algorithm,
            })
            .await?;
        let invite = self.membership.get_invite(&invite_id).await?;

        self.dispatch_invitation(&request.email, &workspace.name, &invite, external)
            .await;

        record_best_effort(
            self.audit.as_ref(),
            AuditEvent::builder(AuditAction::InviteCreate)
                .entity("invite", invite_id.0.to_string())
                .performer(&actor.uuid)
                .workspace_id(workspace_id)
                .metadata(serde_json::json!({
                    "space_limit": request.space_limit,
                    "pre_registered": external,
                }))
                .build(),
        )
        .await;

        Ok(invite_id)
    }

    async fn dispatch_invitation(
        &self,
        email: &str,
        workspace_name: &str,
        invite: &WorkspaceInvite,
        external: bool,
    ) {
        let sent = if external {
            self.mailer
                .send_workspace_user_external_invitation(email, workspace_name, invite)
                .await
        } else {
            self.mailer
                .send_workspace_user_invitation(email, workspace_name, invite)
                .await
        };
        if let Err(e) = sent {
            tracing::warn!(
                invite_id = %invite.id.0,
                error = %e,
                "invitation mail could not be delivered"
            );
        }
    }

    /// Accept a pending invite, joining the workspace.
    ///
    /// Seat and membership state are re-validated; the invite may have gone
    /// stale between creation and acceptance. The saga creates the
    /// membership row, joins the default team, then pushes the storage
    /// allocation to the bridge before consuming the invite; any failure
    /// after the first write unwinds the created rows.
    pub async fn accept_invite(
        &self,
        actor: &Actor,
        invite_id: &InviteId,
    ) -> Result<(), ProvisionError> {
        let invite = self.membership.get_invite(invite_id).await?;
        if invite.invited_user != actor.uuid {
            return Err(ProvisionError::Forbidden);
        }
        let workspace = self.membership.get_workspace(&invite.workspace_id).await?;

        // Re-validation: the invite already holds its seat in the pending
        // count, so the live check is against active members only.
        if self
            .membership
            .find_workspace_user(&workspace.id, &actor.uuid)
            .await?
            .is_some()
        {
            return Err(ProvisionError::Conflict("user is already a member".into()));
        }
        let active = self.membership.count_active_members(&workspace.id).await?;
        if active >= workspace.number_of_seats {
            return Err(ProvisionError::Capacity("no free seat".into()));
        }

        self.membership
            .create_workspace_user(&CreateWorkspaceUserParams {
                workspace_id: workspace.id,
                member_id: actor.uuid,
                space_limit: invite.space_limit,
            })
            .await?;

        if let Err(e) = self
            .membership
            .create_team_user(&workspace.default_team_id, &actor.uuid)
            .await
        {
            return Err(self
                .unwind_acceptance(&workspace, &actor.uuid, false, e.to_string())
                .await);
        }

        if let Err(e) = self.bridge.set_storage(&actor.uuid, invite.space_limit).await {
            return Err(self
                .unwind_acceptance(&workspace, &actor.uuid, true, e.to_string())
                .await);
        }

        if let Err(e) = self.membership.delete_invite(invite_id).await {
            return Err(self
                .unwind_acceptance(&workspace, &actor.uuid, true, e.to_string())
                .await);
        }

        record_best_effort(
            self.audit.as_ref(),
            AuditEvent::builder(AuditAction::InviteAccept)
                .entity("invite", invite_id.0.to_string())
                .performer(&actor.uuid)
                .workspace_id(&workspace.id)
                .metadata(serde_json::json!({ "space_limit": invite.space_limit }))
                .build(),
        )
        .await;
        record_best_effort(
            self.audit.as_ref(),
            AuditEvent::builder(AuditAction::MemberJoin)
                .entity("workspace", workspace.id.0.to_string())
                .performer(&actor.uuid)
                .workspace_id(&workspace.id)
                .build(),
        )
        .await;

        Ok(())
    }

    async fn unwind_acceptance(
        &self,
        workspace: &Workspace,
        member: &UserUuid,
        created_team_user: bool,
        cause: String,
    ) -> ProvisionError {
        tracing::error!(
            workspace_id = %workspace.id.0,
            error = %cause,
            "invite acceptance failed, compensating"
        );
        if created_team_user {
            if let Err(e) = self
                .membership
                .delete_team_user(&workspace.default_team_id, member)
                .await
            {
                tracing::error!(
                    team_id = %workspace.default_team_id.0,
                    error = %e,
                    "compensation failed to delete team membership"
                );
            }
        }
        if let Err(e) = self
            .membership
            .delete_workspace_user(&workspace.id, member)
            .await
        {
            tracing::error!(
                workspace_id = %workspace.id.0,
                error = %e,
                "compensation failed to delete workspace membership"
            );
        }
        ProvisionError::Internal(cause)
    }

    /// Revoke a pending invite. Owner only; frees the held seat.
    pub async fn revoke_invite(
        &self,
        actor: &Actor,
        workspace_id: &WorkspaceId,
        invite_id: &InviteId,
    ) -> Result<(), ProvisionError> {
        let workspace = self.membership.get_workspace(workspace_id).await?;
        if workspace.owner_id != actor.uuid {
            return Err(ProvisionError::Forbidden);
        }
        let invite = self.membership.get_invite(invite_id).await?;
        if invite.workspace_id != *workspace_id {
            return Err(ProvisionError::NotFound);
        }
        self.membership.delete_invite(invite_id).await?;

        record_best_effort(
            self.audit.as_ref(),
            AuditEvent::builder(AuditAction::InviteRevoke)
                .entity("invite", invite_id.0.to_string())
                .performer(&actor.uuid)
                .workspace_id(workspace_id)
                .build(),
        )
        .await;
        Ok(())
    }

    /// Remove the actor's own membership: team rows first, then the
    /// membership row. The owner cannot leave their own workspace.
    pub async fn leave_workspace(
        &self,
        actor: &Actor,
        workspace_id: &WorkspaceId,
    ) -> Result<(), ProvisionError> {
        let workspace = self.membership.get_workspace(workspace_id).await?;
        if workspace.owner_id == actor.uuid {
            return Err(ProvisionError::Forbidden);
        }
        if self
            .membership
            .find_workspace_user(workspace_id, &actor.uuid)
            .await?
            .is_none()
        {
            return Err(ProvisionError::NotFound);
        }

        for team_id in self
            .membership
            .list_team_ids_for_member(workspace_id, &actor.uuid)
            .await?
        {
            self.membership.delete_team_user(&team_id, &actor.uuid).await?;
        }
        self.membership
            .delete_workspace_user(workspace_id, &actor.uuid)
            .await?;

        record_best_effort(
            self.audit.as_ref(),
            AuditEvent::builder(AuditAction::MemberLeave)
                .entity("workspace", workspace_id.0.to_string())
                .performer(&actor.uuid)
                .workspace_id(workspace_id)
                .build(),
        )
        .await;
        Ok(())
    }
}
