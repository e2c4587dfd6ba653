//! Strongly-typed identifiers (avoid mixing strings/UUIDs arbitrarily).

use uuid::Uuid;

/// Numeric account identifier assigned by the authentication layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Stable user identity used in membership and ownership records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserUuid(pub Uuid);

/// Workspace identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorkspaceId(pub Uuid);

/// Workspace membership row identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorkspaceUserId(pub Uuid);

/// Team identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TeamId(pub Uuid);

/// Team membership row identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TeamUserId(pub Uuid);

/// Workspace invite identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InviteId(pub Uuid);

/// Shared item (file or folder) identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ItemId(pub Uuid);

/// Folder identifier for the 1:1 private-folder sharing mechanism.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FolderId(pub Uuid);

/// Sharing grant identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SharingId(pub Uuid);

/// Role identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RoleId(pub Uuid);

/// Pending sharing-invite identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SharingInviteId(pub Uuid);

/// Private-folder grant identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PrivateSharingFolderId(pub Uuid);

/// The party a sharing grant points at: a user uuid or a team uuid.
///
/// The nil uuid is reserved as the "no grantee yet" placeholder used by
/// pending rows; `is_placeholder` identifies it so resolvers can skip it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GranteeId(pub Uuid);

impl GranteeId {
    pub fn placeholder() -> Self {
        Self(Uuid::nil())
    }

    pub fn is_placeholder(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<UserUuid> for GranteeId {
    fn from(u: UserUuid) -> Self {
        Self(u.0)
    }
}

impl From<TeamId> for GranteeId {
    fn from(t: TeamId) -> Self {
        Self(t.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_ids_equality_and_hash() {
        use std::collections::HashSet;

        let uuid = Uuid::new_v4();
        let a = WorkspaceId(uuid);
        let b = WorkspaceId(uuid);
        assert_eq!(a, b);
        assert_ne!(a, WorkspaceId(Uuid::new_v4()));

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn grantee_placeholder_is_nil() {
        assert!(GranteeId::placeholder().is_placeholder());
        assert!(!GranteeId(Uuid::new_v4()).is_placeholder());
    }

    #[test]
    fn grantee_from_user_and_team() {
        let uuid = Uuid::new_v4();
        assert_eq!(GranteeId::from(UserUuid(uuid)), GranteeId(uuid));
        assert_eq!(GranteeId::from(TeamId(uuid)), GranteeId(uuid));
    }
}
