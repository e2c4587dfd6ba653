//! Team records.

use chrono::{DateTime, Utc};

use super::{TeamId, TeamUserId, UserUuid, WorkspaceId};

/// Team within a workspace. Exactly one manager at any time; reassigning
/// replaces, never adds.
#[derive(Clone, Debug)]
pub struct WorkspaceTeam {
    pub id: TeamId,
    pub workspace_id: WorkspaceId,
    pub manager_id: UserUuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Team membership row. Team membership never implies workspace membership;
/// workspace membership is always required first.
#[derive(Clone, Debug)]
pub struct WorkspaceTeamUser {
    pub id: TeamUserId,
    pub team_id: TeamId,
    pub member_id: UserUuid,
    pub created_at: DateTime<Utc>,
}
