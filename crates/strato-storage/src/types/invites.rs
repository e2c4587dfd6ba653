//! Workspace invite records.

use chrono::{DateTime, Utc};

use super::{InviteId, UserUuid, WorkspaceId};

/// Pending workspace invite. Consumed (deleted) on acceptance or explicit
/// revocation. The encryption material is opaque to the engine.
#[derive(Clone, Debug)]
pub struct WorkspaceInvite {
    pub id: InviteId,
    pub workspace_id: WorkspaceId,
    pub invited_user: UserUuid,
    pub space_limit: u64,
    pub encryption_key: Vec<u8>,
    pub encryption_algorithm: String,
    pub created_at: DateTime<Utc>,
}

/// Parameters for creating a workspace invite.
#[derive(Clone, Debug)]
pub struct CreateInviteParams {
    pub workspace_id: WorkspaceId,
    pub invited_user: UserUuid,
    pub space_limit: u64,
    pub encryption_key: Vec<u8>,
    pub encryption_algorithm: String,
}
