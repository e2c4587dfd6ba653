//! Workspace records.

use chrono::{DateTime, Utc};

use super::{TeamId, UserUuid, WorkspaceId};

/// Workspace record (tenant container).
///
/// `workspace_user_uuid` is a dedicated service account holding the
/// workspace's own storage quota at the external bridge. Exactly one owner,
/// immutable after creation; exactly one default team, created atomically
/// with the workspace.
#[derive(Clone, Debug)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub owner_id: UserUuid,
    pub default_team_id: TeamId,
    pub workspace_user_uuid: UserUuid,
    pub setup_completed: bool,
    pub number_of_seats: u32,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for creating a workspace (with its default team, atomically).
#[derive(Clone, Debug)]
pub struct CreateWorkspaceParams {
    pub id: WorkspaceId,
    pub owner_id: UserUuid,
    pub workspace_user_uuid: UserUuid,
    pub number_of_seats: u32,
    pub name: String,
}

/// Metadata persisted when workspace setup completes.
#[derive(Clone, Debug)]
pub struct WorkspaceSetup {
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
}
