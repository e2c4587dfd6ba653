//! Sharing records: item grants, pending invites, private-folder grants.

use chrono::{DateTime, Utc};

use super::{FolderId, GranteeId, ItemId, Role, RoleId, SharingId, SharingInviteId, UserUuid};

/// Kind of shared item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemType {
    File,
    Folder,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::File => "file",
            ItemType::Folder => "folder",
        }
    }
}

impl std::str::FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(ItemType::File),
            "folder" => Ok(ItemType::Folder),
            _ => Err(format!("invalid item type: {}", s)),
        }
    }
}

/// Who the grant points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GranteeType {
    Individual,
    WorkspaceTeam,
}

impl GranteeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GranteeType::Individual => "individual",
            GranteeType::WorkspaceTeam => "workspace-team",
        }
    }
}

impl std::str::FromStr for GranteeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "individual" => Ok(GranteeType::Individual),
            "workspace-team" => Ok(GranteeType::WorkspaceTeam),
            _ => Err(format!("invalid grantee type: {}", s)),
        }
    }
}

/// Visibility of the grant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SharingKind {
    Public,
    Private,
}

impl SharingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SharingKind::Public => "public",
            SharingKind::Private => "private",
        }
    }
}

impl std::str::FromStr for SharingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(SharingKind::Public),
            "private" => Ok(SharingKind::Private),
            _ => Err(format!("invalid sharing kind: {}", s)),
        }
    }
}

/// Sharing grant. One row per `(item, grantee)` pair.
#[derive(Clone, Debug)]
pub struct Sharing {
    pub id: SharingId,
    pub item_id: ItemId,
    pub item_type: ItemType,
    pub owner_id: UserUuid,
    pub shared_with: GranteeId,
    pub shared_with_type: GranteeType,
    pub kind: SharingKind,
    pub encryption_key: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A Sharing row joined with its role. The role is optional because a
/// missing SharingRole row is a data inconsistency the resolver must
/// tolerate, not a fatal error.
#[derive(Clone, Debug)]
pub struct SharingGrant {
    pub sharing: Sharing,
    pub role: Option<Role>,
}

/// Parameters for creating a sharing grant together with its single
/// SharingRole row.
#[derive(Clone, Debug)]
pub struct CreateSharingParams {
    pub item_id: ItemId,
    pub item_type: ItemType,
    pub owner_id: UserUuid,
    pub shared_with: GranteeId,
    pub shared_with_type: GranteeType,
    pub kind: SharingKind,
    pub encryption_key: Vec<u8>,
    pub role_id: RoleId,
}

/// Pending grant awaiting the invitee's registration/acceptance.
#[derive(Clone, Debug)]
pub struct SharingInvite {
    pub id: SharingInviteId,
    pub item_id: ItemId,
    pub item_type: ItemType,
    pub owner_id: UserUuid,
    pub shared_with: String,
    pub role_id: RoleId,
    pub created_at: DateTime<Utc>,
}

/// Parameters for creating a sharing invite.
#[derive(Clone, Debug)]
pub struct CreateSharingInviteParams {
    pub item_id: ItemId,
    pub item_type: ItemType,
    pub owner_id: UserUuid,
    pub shared_with: String,
    pub role_id: RoleId,
}

/// Parameters for creating a private-folder grant with its role.
#[derive(Clone, Debug)]
pub struct CreatePrivateFolderGrantParams {
    pub folder_id: FolderId,
    pub owner_id: UserUuid,
    pub shared_with: UserUuid,
    pub encryption_key: Vec<u8>,
    pub role_id: RoleId,
}
