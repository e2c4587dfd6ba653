//! Workspace membership records.

use chrono::{DateTime, Utc};

use super::{UserUuid, WorkspaceId, WorkspaceUserId};

/// Workspace membership row. Unique per `(member_id, workspace_id)`.
///
/// Usage is tracked independently of `space_limit` and may transiently
/// exceed it; enforcement happens at allocation time, not usage time.
#[derive(Clone, Debug)]
pub struct WorkspaceUser {
    pub id: WorkspaceUserId,
    pub member_id: UserUuid,
    pub workspace_id: WorkspaceId,
    pub space_limit: u64,
    pub drive_usage: u64,
    pub backups_usage: u64,
    pub deactivated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for creating a workspace membership row.
#[derive(Clone, Debug)]
pub struct CreateWorkspaceUserParams {
    pub workspace_id: WorkspaceId,
    pub member_id: UserUuid,
    pub space_limit: u64,
}
