use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use uuid::Uuid;

use strato_storage::{
    CreateInviteParams, CreatePrivateFolderGrantParams, CreateSharingInviteParams,
    CreateSharingParams, CreateWorkspaceParams, CreateWorkspaceUserParams, FolderId, GranteeId,
    GranteeType, InviteId, ItemId, ItemType, MembershipStore, PrivateSharingFolderId, Role, RoleId,
    RoleName, Sharing, SharingGrant, SharingId, SharingInvite, SharingInviteId, SharingKind,
    SharingStore, StoreError, TeamId, TeamUserId, User, UserId, UserUuid, Workspace, WorkspaceId,
    WorkspaceInvite, WorkspaceSetup, WorkspaceTeam, WorkspaceTeamUser, WorkspaceUser,
    WorkspaceUserId,
};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub struct SqliteStore {
    pool: SqlitePool,
}

fn backend<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn map_unique(e: sqlx::Error) -> StoreError {
    let s = e.to_string();
    if s.contains("UNIQUE") {
        StoreError::AlreadyExists
    } else {
        StoreError::Backend(s)
    }
}

fn parse_uuid(s: &str) -> Result<Uuid, StoreError> {
    Uuid::try_parse(s).map_err(backend)
}

fn parse_ts(secs: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| StoreError::Backend(format!("bad timestamp: {secs}")))
}

impl SqliteStore {
    /// `~/.strato/store.db` (creates dir with 0700 perms on unix)
    pub async fn open_default() -> Result<Self, StoreError> {
        let dir = dirs::home_dir()
            .ok_or_else(|| StoreError::Backend("no home dir".into()))?
            .join(".strato");
        std::fs::create_dir_all(&dir).map_err(backend)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o700))
                .map_err(backend)?;
        }
        let path = dir.join("store.db");
        let url = format!("sqlite://{}", path.to_string_lossy());
        Self::open(&url).await
    }

    pub async fn open_in_memory() -> Result<Self, StoreError> {
        Self::open("sqlite::memory:").await
    }

    pub async fn open(url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .map_err(backend)?;

        MIGRATOR.run(&pool).await.map_err(backend)?;

        Ok(Self { pool })
    }

    /// Test/bootstrap helper: register a user row.
    pub async fn create_user(&self, uuid: &UserUuid, email: &str) -> Result<UserId, StoreError> {
        let now = Utc::now().timestamp();
        let res = sqlx::query("INSERT INTO users(uuid,email,created_at,updated_at) VALUES(?,?,?,?)")
            .bind(uuid.0.to_string())
            .bind(email)
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(map_unique)?;
        Ok(UserId(res.last_insert_rowid()))
    }
}

type WorkspaceRow = (
    String,
    String,
    String,
    String,
    i64,
    i64,
    String,
    Option<String>,
    Option<String>,
    i64,
    i64,
);

fn workspace_from_row(row: WorkspaceRow) -> Result<Workspace, StoreError> {
    let (id, owner, team, ws_user, setup, seats, name, description, address, created, updated) =
        row;
    Ok(Workspace {
        id: WorkspaceId(parse_uuid(&id)?),
        owner_id: UserUuid(parse_uuid(&owner)?),
        default_team_id: TeamId(parse_uuid(&team)?),
        workspace_user_uuid: UserUuid(parse_uuid(&ws_user)?),
        setup_completed: setup != 0,
        number_of_seats: seats as u32,
        name,
        description,
        address,
        created_at: parse_ts(created)?,
        updated_at: parse_ts(updated)?,
    })
}

type MemberRow = (String, String, String, i64, i64, i64, i64, i64, i64);

fn member_from_row(row: MemberRow) -> Result<WorkspaceUser, StoreError> {
    let (id, member, ws, limit, drive, backups, deactivated, created, updated) = row;
    Ok(WorkspaceUser {
        id: WorkspaceUserId(parse_uuid(&id)?),
        member_id: UserUuid(parse_uuid(&member)?),
        workspace_id: WorkspaceId(parse_uuid(&ws)?),
        space_limit: limit as u64,
        drive_usage: drive as u64,
        backups_usage: backups as u64,
        deactivated: deactivated != 0,
        created_at: parse_ts(created)?,
        updated_at: parse_ts(updated)?,
    })
}

type InviteRow = (String, String, String, i64, Vec<u8>, String, i64);

fn invite_from_row(row: InviteRow) -> Result<WorkspaceInvite, StoreError> {
    let (id, ws, invited, limit, key, algorithm, created) = row;
    Ok(WorkspaceInvite {
        id: InviteId(parse_uuid(&id)?),
        workspace_id: WorkspaceId(parse_uuid(&ws)?),
        invited_user: UserUuid(parse_uuid(&invited)?),
        space_limit: limit as u64,
        encryption_key: key,
        encryption_algorithm: algorithm,
        created_at: parse_ts(created)?,
    })
}

type GrantRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    Vec<u8>,
    i64,
    i64,
    Option<String>,
    Option<String>,
);

fn grant_from_row(row: GrantRow) -> Result<SharingGrant, StoreError> {
    let (
        id,
        item,
        item_type,
        owner,
        shared_with,
        shared_with_type,
        kind,
        key,
        created,
        updated,
        role_id,
        role_name,
    ) = row;
    let role = match (role_id, role_name) {
        (Some(rid), Some(rname)) => Some(Role {
            id: RoleId(parse_uuid(&rid)?),
            name: rname.parse::<RoleName>().map_err(backend)?,
        }),
        _ => None,
    };
    Ok(SharingGrant {
        sharing: Sharing {
            id: SharingId(parse_uuid(&id)?),
            item_id: ItemId(parse_uuid(&item)?),
            item_type: item_type.parse::<ItemType>().map_err(backend)?,
            owner_id: UserUuid(parse_uuid(&owner)?),
            shared_with: GranteeId(parse_uuid(&shared_with)?),
            shared_with_type: shared_with_type.parse::<GranteeType>().map_err(backend)?,
            kind: kind.parse::<SharingKind>().map_err(backend)?,
            encryption_key: key,
            created_at: parse_ts(created)?,
            updated_at: parse_ts(updated)?,
        },
        role,
    })
}

const GRANT_COLUMNS: &str = "s.id, s.item_id, s.item_type, s.owner_id, s.shared_with, \
     s.shared_with_type, s.kind, s.encryption_key, s.created_at, s.updated_at, r.id, r.name";

#[async_trait::async_trait]
impl MembershipStore for SqliteStore {
    // ───────────────────────────── Workspaces ─────────────────────────────

    async fn create_workspace(
        &self,
        p: &CreateWorkspaceParams,
    ) -> Result<WorkspaceId, StoreError> {
        let team_id = Uuid::now_v7();
        let now = Utc::now().timestamp();
        let mut tx = self.pool.begin().await.map_err(backend)?;

        sqlx::query(
            "INSERT INTO workspaces(id,owner_id,default_team_id,workspace_user_uuid,
                 setup_completed,number_of_seats,name,created_at,updated_at)
             VALUES(?,?,?,?,0,?,?,?,?)",
        )
        .bind(p.id.0.to_string())
        .bind(p.owner_id.0.to_string())
        .bind(team_id.to_string())
        .bind(p.workspace_user_uuid.0.to_string())
        .bind(p.number_of_seats as i64)
        .bind(&p.name)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_unique)?;

        sqlx::query(
            "INSERT INTO workspace_teams(id,workspace_id,manager_id,name,created_at,updated_at)
             VALUES(?,?,?,?,?,?)",
        )
        .bind(team_id.to_string())
        .bind(p.id.0.to_string())
        .bind(p.owner_id.0.to_string())
        .bind("Default")
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        tx.commit().await.map_err(backend)?;
        Ok(p.id)
    }

    async fn get_workspace(&self, workspace_id: &WorkspaceId) -> Result<Workspace, StoreError> {
        let row = sqlx::query_as::<_, WorkspaceRow>(
            "SELECT id,owner_id,default_team_id,workspace_user_uuid,setup_completed,
                    number_of_seats,name,description,address,created_at,updated_at
               FROM workspaces WHERE id=?",
        )
        .bind(workspace_id.0.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        match row {
            None => Err(StoreError::NotFound),
            Some(row) => workspace_from_row(row),
        }
    }

    async fn complete_setup(
        &self,
        owner: &UserUuid,
        workspace_id: &WorkspaceId,
        setup: &WorkspaceSetup,
    ) -> Result<(), StoreError> {
        let res = sqlx::query(
            "UPDATE workspaces
                SET name=?, description=?, address=?, setup_completed=1, updated_at=?
              WHERE id=? AND owner_id=?",
        )
        .bind(&setup.name)
        .bind(&setup.description)
        .bind(&setup.address)
        .bind(Utc::now().timestamp())
        .bind(workspace_id.0.to_string())
        .bind(owner.0.to_string())
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    // ───────────────────────────── Memberships ────────────────────────────

    async fn find_workspace_user(
        &self,
        workspace_id: &WorkspaceId,
        member: &UserUuid,
    ) -> Result<Option<WorkspaceUser>, StoreError> {
        let row = sqlx::query_as::<_, MemberRow>(
            "SELECT id,member_id,workspace_id,space_limit,drive_usage,backups_usage,
                    deactivated,created_at,updated_at
               FROM workspace_users WHERE workspace_id=? AND member_id=?",
        )
        .bind(workspace_id.0.to_string())
        .bind(member.0.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(member_from_row).transpose()
    }

    async fn create_workspace_user(
        &self,
        p: &CreateWorkspaceUserParams,
    ) -> Result<WorkspaceUserId, StoreError> {
        let id = Uuid::now_v7();
        let now = Utc::now().timestamp();
        sqlx::query(
            "INSERT INTO workspace_users(id,member_id,workspace_id,space_limit,created_at,updated_at)
             VALUES(?,?,?,?,?,?)",
        )
        .bind(id.to_string())
        .bind(p.member_id.0.to_string())
        .bind(p.workspace_id.0.to_string())
        .bind(p.space_limit as i64)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_unique)?;
        Ok(WorkspaceUserId(id))
    }

    async fn delete_workspace_user(
        &self,
        workspace_id: &WorkspaceId,
        member: &UserUuid,
    ) -> Result<(), StoreError> {
        let res = sqlx::query("DELETE FROM workspace_users WHERE workspace_id=? AND member_id=?")
            .bind(workspace_id.0.to_string())
            .bind(member.0.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn set_member_deactivated(
        &self,
        workspace_id: &WorkspaceId,
        member: &UserUuid,
        deactivated: bool,
    ) -> Result<(), StoreError> {
        let res = sqlx::query(
            "UPDATE workspace_users SET deactivated=?, updated_at=?
              WHERE workspace_id=? AND member_id=?",
        )
        .bind(deactivated as i64)
        .bind(Utc::now().timestamp())
        .bind(workspace_id.0.to_string())
        .bind(member.0.to_string())
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    // ───────────────────────────── Teams ──────────────────────────────────

    async fn get_team(&self, team_id: &TeamId) -> Result<WorkspaceTeam, StoreError> {
        let row = sqlx::query_as::<_, (String, String, String, String, i64, i64)>(
            "SELECT id,workspace_id,manager_id,name,created_at,updated_at
               FROM workspace_teams WHERE id=?",
        )
        .bind(team_id.0.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        match row {
            None => Err(StoreError::NotFound),
            Some((id, ws, manager, name, created, updated)) => Ok(WorkspaceTeam {
                id: TeamId(parse_uuid(&id)?),
                workspace_id: WorkspaceId(parse_uuid(&ws)?),
                manager_id: UserUuid(parse_uuid(&manager)?),
                name,
                created_at: parse_ts(created)?,
                updated_at: parse_ts(updated)?,
            }),
        }
    }

    async fn set_team_manager(
        &self,
        team_id: &TeamId,
        manager: &UserUuid,
    ) -> Result<(), StoreError> {
        let res = sqlx::query("UPDATE workspace_teams SET manager_id=?, updated_at=? WHERE id=?")
            .bind(manager.0.to_string())
            .bind(Utc::now().timestamp())
            .bind(team_id.0.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn find_team_user(
        &self,
        team_id: &TeamId,
        member: &UserUuid,
    ) -> Result<Option<WorkspaceTeamUser>, StoreError> {
        let row = sqlx::query_as::<_, (String, String, String, i64)>(
            "SELECT id,team_id,member_id,created_at
               FROM workspace_team_users WHERE team_id=? AND member_id=?",
        )
        .bind(team_id.0.to_string())
        .bind(member.0.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        match row {
            None => Ok(None),
            Some((id, team, member, created)) => Ok(Some(WorkspaceTeamUser {
                id: TeamUserId(parse_uuid(&id)?),
                team_id: TeamId(parse_uuid(&team)?),
                member_id: UserUuid(parse_uuid(&member)?),
                created_at: parse_ts(created)?,
            })),
        }
    }

    async fn create_team_user(
        &self,
        team_id: &TeamId,
        member: &UserUuid,
    ) -> Result<TeamUserId, StoreError> {
        let id = Uuid::now_v7();
        sqlx::query(
            "INSERT INTO workspace_team_users(id,team_id,member_id,created_at) VALUES(?,?,?,?)",
        )
        .bind(id.to_string())
        .bind(team_id.0.to_string())
        .bind(member.0.to_string())
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(map_unique)?;
        Ok(TeamUserId(id))
    }

    async fn delete_team_user(
        &self,
        team_id: &TeamId,
        member: &UserUuid,
    ) -> Result<(), StoreError> {
        let res = sqlx::query("DELETE FROM workspace_team_users WHERE team_id=? AND member_id=?")
            .bind(team_id.0.to_string())
            .bind(member.0.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_team_ids_for_member(
        &self,
        workspace_id: &WorkspaceId,
        member: &UserUuid,
    ) -> Result<Vec<TeamId>, StoreError> {
        let rows = sqlx::query_as::<_, (String,)>(
            "SELECT tu.team_id
               FROM workspace_team_users tu
               JOIN workspace_teams t ON t.id=tu.team_id
              WHERE t.workspace_id=? AND tu.member_id=?",
        )
        .bind(workspace_id.0.to_string())
        .bind(member.0.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        let mut out = Vec::with_capacity(rows.len());
        for (id,) in rows {
            out.push(TeamId(parse_uuid(&id)?));
        }
        Ok(out)
    }

    // ───────────────────────────── Users ──────────────────────────────────

    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, (i64, String, String, i64, i64)>(
            "SELECT id,uuid,email,created_at,updated_at FROM users WHERE email=?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        match row {
            None => Err(StoreError::NotFound),
            Some((id, uuid, email, created, updated)) => Ok(User {
                id: UserId(id),
                uuid: UserUuid(parse_uuid(&uuid)?),
                email,
                created_at: parse_ts(created)?,
                updated_at: parse_ts(updated)?,
            }),
        }
    }

    async fn get_user_by_uuid(&self, uuid: &UserUuid) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, (i64, String, String, i64, i64)>(
            "SELECT id,uuid,email,created_at,updated_at FROM users WHERE uuid=?",
        )
        .bind(uuid.0.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        match row {
            None => Err(StoreError::NotFound),
            Some((id, uuid, email, created, updated)) => Ok(User {
                id: UserId(id),
                uuid: UserUuid(parse_uuid(&uuid)?),
                email,
                created_at: parse_ts(created)?,
                updated_at: parse_ts(updated)?,
            }),
        }
    }

    // ───────────────────────────── Invites ────────────────────────────────

    async fn create_invite(&self, p: &CreateInviteParams) -> Result<InviteId, StoreError> {
        let id = Uuid::now_v7();
        sqlx::query(
            "INSERT INTO workspace_invites(id,workspace_id,invited_user,space_limit,
                 encryption_key,encryption_algorithm,created_at)
             VALUES(?,?,?,?,?,?,?)",
        )
        .bind(id.to_string())
        .bind(p.workspace_id.0.to_string())
        .bind(p.invited_user.0.to_string())
        .bind(p.space_limit as i64)
        .bind(&p.encryption_key)
        .bind(&p.encryption_algorithm)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(map_unique)?;
        Ok(InviteId(id))
    }

    async fn get_invite(&self, invite_id: &InviteId) -> Result<WorkspaceInvite, StoreError> {
        let row = sqlx::query_as::<_, InviteRow>(
            "SELECT id,workspace_id,invited_user,space_limit,encryption_key,
                    encryption_algorithm,created_at
               FROM workspace_invites WHERE id=?",
        )
        .bind(invite_id.0.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        match row {
            None => Err(StoreError::NotFound),
            Some(row) => invite_from_row(row),
        }
    }

    async fn find_invite(
        &self,
        workspace_id: &WorkspaceId,
        invited_user: &UserUuid,
    ) -> Result<Option<WorkspaceInvite>, StoreError> {
        let row = sqlx::query_as::<_, InviteRow>(
            "SELECT id,workspace_id,invited_user,space_limit,encryption_key,
                    encryption_algorithm,created_at
               FROM workspace_invites WHERE workspace_id=? AND invited_user=?",
        )
        .bind(workspace_id.0.to_string())
        .bind(invited_user.0.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(invite_from_row).transpose()
    }

    async fn delete_invite(&self, invite_id: &InviteId) -> Result<(), StoreError> {
        let res = sqlx::query("DELETE FROM workspace_invites WHERE id=?")
            .bind(invite_id.0.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    // ───────────────────────────── Aggregates ─────────────────────────────

    async fn count_active_members(&self, workspace_id: &WorkspaceId) -> Result<u32, StoreError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM workspace_users WHERE workspace_id=? AND deactivated=0",
        )
        .bind(workspace_id.0.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;
        Ok(count as u32)
    }

    async fn count_pending_invites(&self, workspace_id: &WorkspaceId) -> Result<u32, StoreError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM workspace_invites WHERE workspace_id=?")
                .bind(workspace_id.0.to_string())
                .fetch_one(&self.pool)
                .await
                .map_err(backend)?;
        Ok(count as u32)
    }

    async fn sum_member_space_limits(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<u64, StoreError> {
        let (sum,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(space_limit),0) FROM workspace_users WHERE workspace_id=?",
        )
        .bind(workspace_id.0.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;
        Ok(sum as u64)
    }

    async fn sum_invite_space_limits(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<u64, StoreError> {
        let (sum,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(space_limit),0) FROM workspace_invites WHERE workspace_id=?",
        )
        .bind(workspace_id.0.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;
        Ok(sum as u64)
    }
}

#[async_trait::async_trait]
impl SharingStore for SqliteStore {
    // ───────────────────────────── Roles ──────────────────────────────────

    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        let rows = sqlx::query_as::<_, (String, String)>("SELECT id,name FROM roles")
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        let mut out = Vec::with_capacity(rows.len());
        for (id, name) in rows {
            out.push(Role {
                id: RoleId(parse_uuid(&id)?),
                name: name.parse::<RoleName>().map_err(backend)?,
            });
        }
        Ok(out)
    }

    async fn get_role(&self, role_id: &RoleId) -> Result<Role, StoreError> {
        let row = sqlx::query_as::<_, (String, String)>("SELECT id,name FROM roles WHERE id=?")
            .bind(role_id.0.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        match row {
            None => Err(StoreError::NotFound),
            Some((id, name)) => Ok(Role {
                id: RoleId(parse_uuid(&id)?),
                name: name.parse::<RoleName>().map_err(backend)?,
            }),
        }
    }

    async fn find_role_by_name(&self, name: RoleName) -> Result<Role, StoreError> {
        let row = sqlx::query_as::<_, (String,)>("SELECT id FROM roles WHERE name=?")
            .bind(name.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        match row {
            None => Err(StoreError::NotFound),
            Some((id,)) => Ok(Role {
                id: RoleId(parse_uuid(&id)?),
                name,
            }),
        }
    }

    // ───────────────────────────── Grants ─────────────────────────────────

    async fn create_sharing(&self, p: &CreateSharingParams) -> Result<SharingId, StoreError> {
        let sharing_id = Uuid::now_v7();
        let now = Utc::now().timestamp();
        let mut tx = self.pool.begin().await.map_err(backend)?;

        sqlx::query(
            "INSERT INTO sharings(id,item_id,item_type,owner_id,shared_with,shared_with_type,
                 kind,encryption_key,created_at,updated_at)
             VALUES(?,?,?,?,?,?,?,?,?,?)",
        )
        .bind(sharing_id.to_string())
        .bind(p.item_id.0.to_string())
        .bind(p.item_type.as_str())
        .bind(p.owner_id.0.to_string())
        .bind(p.shared_with.0.to_string())
        .bind(p.shared_with_type.as_str())
        .bind(p.kind.as_str())
        .bind(&p.encryption_key)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_unique)?;

        sqlx::query("INSERT INTO sharing_roles(id,sharing_id,role_id,created_at) VALUES(?,?,?,?)")
            .bind(Uuid::now_v7().to_string())
            .bind(sharing_id.to_string())
            .bind(p.role_id.0.to_string())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        tx.commit().await.map_err(backend)?;
        Ok(SharingId(sharing_id))
    }

    async fn set_grant_role(
        &self,
        sharing_id: &SharingId,
        role_id: &RoleId,
    ) -> Result<(), StoreError> {
        let res = sqlx::query("UPDATE sharing_roles SET role_id=? WHERE sharing_id=?")
            .bind(role_id.0.to_string())
            .bind(sharing_id.0.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_sharing(&self, sharing_id: &SharingId) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        sqlx::query("DELETE FROM sharing_roles WHERE sharing_id=?")
            .bind(sharing_id.0.to_string())
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        let res = sqlx::query("DELETE FROM sharings WHERE id=?")
            .bind(sharing_id.0.to_string())
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        tx.commit().await.map_err(backend)?;
        Ok(())
    }

    async fn list_grants(
        &self,
        item_id: &ItemId,
        item_type: ItemType,
        grantee_ids: &[GranteeId],
    ) -> Result<Vec<SharingGrant>, StoreError> {
        if grantee_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; grantee_ids.len()].join(",");
        let sql = format!(
            "SELECT {GRANT_COLUMNS}
               FROM sharings s
               LEFT JOIN sharing_roles sr ON sr.sharing_id=s.id
               LEFT JOIN roles r ON r.id=sr.role_id
              WHERE s.item_id=? AND s.item_type=? AND s.shared_with IN ({placeholders})
              ORDER BY s.rowid",
        );
        let mut query = sqlx::query_as::<_, GrantRow>(&sql)
            .bind(item_id.0.to_string())
            .bind(item_type.as_str());
        for grantee in grantee_ids {
            query = query.bind(grantee.0.to_string());
        }
        let rows = query.fetch_all(&self.pool).await.map_err(backend)?;

        rows.into_iter().map(grant_from_row).collect()
    }

    async fn list_grants_for_item(
        &self,
        item_id: &ItemId,
        item_type: ItemType,
    ) -> Result<Vec<SharingGrant>, StoreError> {
        let sql = format!(
            "SELECT {GRANT_COLUMNS}
               FROM sharings s
               LEFT JOIN sharing_roles sr ON sr.sharing_id=s.id
               LEFT JOIN roles r ON r.id=sr.role_id
              WHERE s.item_id=? AND s.item_type=?
              ORDER BY s.rowid",
        );
        let rows = sqlx::query_as::<_, GrantRow>(&sql)
            .bind(item_id.0.to_string())
            .bind(item_type.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;

        rows.into_iter().map(grant_from_row).collect()
    }

    // ───────────────────────────── Sharing invites ────────────────────────

    async fn create_sharing_invite(
        &self,
        p: &CreateSharingInviteParams,
    ) -> Result<SharingInviteId, StoreError> {
        let id = Uuid::now_v7();
        sqlx::query(
            "INSERT INTO sharing_invites(id,item_id,item_type,owner_id,shared_with,role_id,created_at)
             VALUES(?,?,?,?,?,?,?)",
        )
        .bind(id.to_string())
        .bind(p.item_id.0.to_string())
        .bind(p.item_type.as_str())
        .bind(p.owner_id.0.to_string())
        .bind(&p.shared_with)
        .bind(p.role_id.0.to_string())
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(map_unique)?;
        Ok(SharingInviteId(id))
    }

    async fn find_sharing_invite(
        &self,
        item_id: &ItemId,
        item_type: ItemType,
        email: &str,
    ) -> Result<Option<SharingInvite>, StoreError> {
        let row = sqlx::query_as::<_, (String, String, String, String, String, String, i64)>(
            "SELECT id,item_id,item_type,owner_id,shared_with,role_id,created_at
               FROM sharing_invites WHERE item_id=? AND item_type=? AND shared_with=?",
        )
        .bind(item_id.0.to_string())
        .bind(item_type.as_str())
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        match row {
            None => Ok(None),
            Some((id, item, item_type, owner, shared_with, role, created)) => {
                Ok(Some(SharingInvite {
                    id: SharingInviteId(parse_uuid(&id)?),
                    item_id: ItemId(parse_uuid(&item)?),
                    item_type: item_type.parse::<ItemType>().map_err(backend)?,
                    owner_id: UserUuid(parse_uuid(&owner)?),
                    shared_with,
                    role_id: RoleId(parse_uuid(&role)?),
                    created_at: parse_ts(created)?,
                }))
            }
        }
    }

    async fn delete_sharing_invite(&self, invite_id: &SharingInviteId) -> Result<(), StoreError> {
        let res = sqlx::query("DELETE FROM sharing_invites WHERE id=?")
            .bind(invite_id.0.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn consume_sharing_invite(
        &self,
        invite_id: &SharingInviteId,
        grantee: &UserUuid,
        encryption_key: &[u8],
    ) -> Result<SharingId, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let row = sqlx::query_as::<_, (String, String, String, String)>(
            "SELECT item_id,item_type,owner_id,role_id FROM sharing_invites WHERE id=?",
        )
        .bind(invite_id.0.to_string())
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?;

        let (item_id, item_type, owner_id, role_id) = match row {
            Some(row) => row,
            None => return Err(StoreError::NotFound),
        };

        let sharing_id = Uuid::now_v7();
        let now = Utc::now().timestamp();
        sqlx::query(
            "INSERT INTO sharings(id,item_id,item_type,owner_id,shared_with,shared_with_type,
                 kind,encryption_key,created_at,updated_at)
             VALUES(?,?,?,?,?,?,?,?,?,?)",
        )
        .bind(sharing_id.to_string())
        .bind(&item_id)
        .bind(&item_type)
        .bind(&owner_id)
        .bind(grantee.0.to_string())
        .bind(GranteeType::Individual.as_str())
        .bind(SharingKind::Private.as_str())
        .bind(encryption_key)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_unique)?;

        sqlx::query("INSERT INTO sharing_roles(id,sharing_id,role_id,created_at) VALUES(?,?,?,?)")
            .bind(Uuid::now_v7().to_string())
            .bind(sharing_id.to_string())
            .bind(&role_id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        sqlx::query("DELETE FROM sharing_invites WHERE id=?")
            .bind(invite_id.0.to_string())
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        tx.commit().await.map_err(backend)?;
        Ok(SharingId(sharing_id))
    }

    // ───────────────────────────── Private folders ────────────────────────

    async fn create_private_folder_grant(
        &self,
        p: &CreatePrivateFolderGrantParams,
    ) -> Result<PrivateSharingFolderId, StoreError> {
        let id = Uuid::now_v7();
        let now = Utc::now().timestamp();
        let mut tx = self.pool.begin().await.map_err(backend)?;

        sqlx::query(
            "INSERT INTO private_sharing_folders(id,folder_id,owner_id,shared_with,
                 encryption_key,created_at)
             VALUES(?,?,?,?,?,?)",
        )
        .bind(id.to_string())
        .bind(p.folder_id.0.to_string())
        .bind(p.owner_id.0.to_string())
        .bind(p.shared_with.0.to_string())
        .bind(&p.encryption_key)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_unique)?;

        sqlx::query(
            "INSERT INTO private_sharing_folder_roles(id,private_sharing_folder_id,role_id,created_at)
             VALUES(?,?,?,?)",
        )
        .bind(Uuid::now_v7().to_string())
        .bind(id.to_string())
        .bind(p.role_id.0.to_string())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        tx.commit().await.map_err(backend)?;
        Ok(PrivateSharingFolderId(id))
    }

    async fn find_private_folder_role(
        &self,
        folder_id: &FolderId,
        user: &UserUuid,
    ) -> Result<Option<Role>, StoreError> {
        let row = sqlx::query_as::<_, (String, String)>(
            "SELECT r.id, r.name
               FROM private_sharing_folders f
               JOIN private_sharing_folder_roles fr ON fr.private_sharing_folder_id=f.id
               JOIN roles r ON r.id=fr.role_id
              WHERE f.folder_id=? AND f.shared_with=?",
        )
        .bind(folder_id.0.to_string())
        .bind(user.0.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        match row {
            None => Ok(None),
            Some((id, name)) => Ok(Some(Role {
                id: RoleId(parse_uuid(&id)?),
                name: name.parse::<RoleName>().map_err(backend)?,
            })),
        }
    }

    async fn delete_private_folder_grant(
        &self,
        folder_id: &FolderId,
        user: &UserUuid,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        sqlx::query(
            "DELETE FROM private_sharing_folder_roles
              WHERE private_sharing_folder_id IN (
                    SELECT id FROM private_sharing_folders WHERE folder_id=? AND shared_with=?)",
        )
        .bind(folder_id.0.to_string())
        .bind(user.0.to_string())
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        let res =
            sqlx::query("DELETE FROM private_sharing_folders WHERE folder_id=? AND shared_with=?")
                .bind(folder_id.0.to_string())
                .bind(user.0.to_string())
                .execute(&mut *tx)
                .await
                .map_err(backend)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        tx.commit().await.map_err(backend)?;
        Ok(())
    }
}
