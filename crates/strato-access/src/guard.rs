//! The access decision engine.
//!
//! Callers translate the verdict to their transport's error space
//! (`Deny` → 403, `NotFound` → 404, `GuardError::BadRequest` → 400); the
//! guard itself never throws for a simply-denied decision.

use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use strato_storage::{
    Actor, MembershipStore, StoreError, TeamId, Workspace, WorkspaceId, WorkspaceTeam,
    WorkspaceUser,
};

/// Which resource kind the capability is checked against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessContext {
    Workspace,
    Team,
}

/// The capability a use-case requires of the actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    Owner,
    Manager,
    Member,
}

/// Why access was denied. Callers surface only the category, never
/// membership detail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DenyReason {
    NotAMember,
    OwnerRequired,
    WorkspaceNotReady,
    MemberDeactivated,
    ManagerRequired,
    NotATeamMember,
}

/// Which resource was absent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingResource {
    Workspace,
    Team,
}

/// Outcome of an access decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny(DenyReason),
    NotFound(MissingResource),
}

impl Verdict {
    pub fn is_allow(&self) -> bool {
        matches!(self, Verdict::Allow)
    }
}

/// Errors the guard can raise. A deny is not an error; only malformed
/// input and infrastructure failures are.
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("malformed resource id: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Evaluates role-gated access for workspace and team contexts.
pub struct WorkspaceGuard {
    store: Arc<dyn MembershipStore>,
}

impl WorkspaceGuard {
    pub fn new(store: Arc<dyn MembershipStore>) -> Self {
        Self { store }
    }

    /// Evaluate `(actor, context, resource, capability)`.
    ///
    /// The resource id is format-validated before any I/O; a malformed id
    /// is a `BadRequest`, never a silent deny.
    pub async fn evaluate(
        &self,
        actor: &Actor,
        context: AccessContext,
        resource_id: &str,
        capability: Capability,
    ) -> Result<Verdict, GuardError> {
        let id = Uuid::from_str(resource_id)
            .map_err(|_| GuardError::BadRequest(resource_id.to_string()))?;
        match context {
            AccessContext::Workspace => {
                self.evaluate_workspace(actor, &WorkspaceId(id), capability)
                    .await
            }
            AccessContext::Team => self.evaluate_team(actor, &TeamId(id), capability).await,
        }
    }

    /// Workspace-context decision.
    pub async fn evaluate_workspace(
        &self,
        actor: &Actor,
        workspace_id: &WorkspaceId,
        capability: Capability,
    ) -> Result<Verdict, GuardError> {
        let workspace = match self.store.get_workspace(workspace_id).await {
            Ok(w) => w,
            Err(StoreError::NotFound) => return Ok(Verdict::NotFound(MissingResource::Workspace)),
            Err(e) => return Err(e.into()),
        };
        let membership = self
            .store
            .find_workspace_user(workspace_id, &actor.uuid)
            .await?;

        let verdict = workspace_verdict(actor, &workspace, membership.as_ref(), capability);
        tracing::debug!(
            workspace = %workspace_id.0,
            actor = %actor.uuid.0,
            ?capability,
            ?verdict,
            "workspace access decision"
        );
        Ok(verdict)
    }

    /// Team-context decision. Team access always requires live workspace
    /// membership first; the workspace owner bypasses all team checks.
    pub async fn evaluate_team(
        &self,
        actor: &Actor,
        team_id: &TeamId,
        capability: Capability,
    ) -> Result<Verdict, GuardError> {
        let team = match self.store.get_team(team_id).await {
            Ok(t) => t,
            Err(StoreError::NotFound) => return Ok(Verdict::NotFound(MissingResource::Team)),
            Err(e) => return Err(e.into()),
        };
        let team_membership = self.store.find_team_user(team_id, &actor.uuid).await?;

        let workspace = match self.store.get_workspace(&team.workspace_id).await {
            Ok(w) => w,
            Err(StoreError::NotFound) => return Ok(Verdict::NotFound(MissingResource::Workspace)),
            Err(e) => return Err(e.into()),
        };
        let workspace_membership = self
            .store
            .find_workspace_user(&team.workspace_id, &actor.uuid)
            .await?;

        let verdict = team_verdict(
            actor,
            &team,
            &workspace,
            workspace_membership.as_ref(),
            team_membership.is_some(),
            capability,
        );
        tracing::debug!(
            team = %team_id.0,
            actor = %actor.uuid.0,
            ?capability,
            ?verdict,
            "team access decision"
        );
        Ok(verdict)
    }
}

/// Pure workspace-context rule evaluation.
///
/// The not-set-up rule exists because provisioning creates the owner's
/// membership rows before `setup_completed` flips true; without it other
/// actors could race to act on a workspace mid-setup.
fn workspace_verdict(
    actor: &Actor,
    workspace: &Workspace,
    membership: Option<&WorkspaceUser>,
    capability: Capability,
) -> Verdict {
    let is_owner = actor.uuid == workspace.owner_id;
    let is_member = membership.is_some() || is_owner;

    if !is_member {
        return Verdict::Deny(DenyReason::NotAMember);
    }
    if capability == Capability::Owner && !is_owner {
        return Verdict::Deny(DenyReason::OwnerRequired);
    }
    if !workspace.setup_completed && !is_owner {
        return Verdict::Deny(DenyReason::WorkspaceNotReady);
    }
    if membership.is_some_and(|m| m.deactivated) {
        return Verdict::Deny(DenyReason::MemberDeactivated);
    }
    Verdict::Allow
}

/// Pure team-context rule evaluation.
fn team_verdict(
    actor: &Actor,
    team: &WorkspaceTeam,
    workspace: &Workspace,
    workspace_membership: Option<&WorkspaceUser>,
    in_team: bool,
    capability: Capability,
) -> Verdict {
    let is_owner = actor.uuid == workspace.owner_id;

    if workspace_membership.is_none() && !is_owner {
        return Verdict::Deny(DenyReason::NotAMember);
    }
    if workspace_membership.is_some_and(|m| m.deactivated) {
        return Verdict::Deny(DenyReason::MemberDeactivated);
    }
    if is_owner {
        return Verdict::Allow;
    }
    if !in_team {
        return Verdict::Deny(DenyReason::NotATeamMember);
    }
    match capability {
        Capability::Member => Verdict::Allow,
        Capability::Manager => {
            if team.manager_id == actor.uuid {
                Verdict::Allow
            } else {
                Verdict::Deny(DenyReason::ManagerRequired)
            }
        }
        // Owner-level actions on a team belong to the workspace owner only.
        Capability::Owner => Verdict::Deny(DenyReason::OwnerRequired),
    }
}
