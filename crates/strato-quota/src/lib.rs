//! Seat and storage-quota accounting.
//!
//! The ledger is advisory: it reads aggregates and the bridge limit with no
//! locking, so two concurrent provisioning calls can both pass a check that
//! would fail serialized. Callers that need a hard guarantee rely on the
//! storage layer's uniqueness constraints, not on these numbers.

use std::sync::Arc;

use thiserror::Error;

use strato_bridge::{Bridge, BridgeError};
use strato_storage::{MembershipStore, StoreError, Workspace, WorkspaceId};

#[derive(Debug, Error)]
pub enum QuotaError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Computes how much storage and how many seats a workspace has left.
pub struct QuotaLedger {
    membership: Arc<dyn MembershipStore>,
    bridge: Arc<dyn Bridge>,
}

impl QuotaLedger {
    pub fn new(membership: Arc<dyn MembershipStore>, bridge: Arc<dyn Bridge>) -> Self {
        Self {
            membership,
            bridge,
        }
    }

    /// Bytes still assignable to new members or invites.
    ///
    /// The workspace's pooled limit lives at the bridge under the dedicated
    /// workspace account; already-promised space is the sum of member
    /// allocations plus pending-invite allocations. Over-commitment (sums
    /// exceeding a since-lowered bridge limit) floors at zero rather than
    /// underflowing.
    pub async fn assignable_space(&self, workspace: &Workspace) -> Result<u64, QuotaError> {
        let limit = self
            .bridge
            .get_limit(&workspace.workspace_user_uuid)
            .await?;
        let promised_members = self
            .membership
            .sum_member_space_limits(&workspace.id)
            .await?;
        let promised_invites = self
            .membership
            .sum_invite_space_limits(&workspace.id)
            .await?;

        let free = limit as i128 - promised_members as i128 - promised_invites as i128;
        if free < 0 {
            tracing::warn!(
                workspace_id = %workspace.id.0,
                limit,
                promised_members,
                promised_invites,
                "workspace storage is over-committed"
            );
        }
        Ok(free.max(0) as u64)
    }

    /// True when active members plus pending invites have used every seat.
    /// A pending invite holds a seat; revoking it frees the seat.
    pub async fn is_workspace_full(&self, workspace_id: &WorkspaceId) -> Result<bool, QuotaError> {
        let workspace = self.membership.get_workspace(workspace_id).await?;
        let active = self.membership.count_active_members(workspace_id).await?;
        let pending = self.membership.count_pending_invites(workspace_id).await?;
        Ok(active + pending >= workspace.number_of_seats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mockall::predicate::eq;
    use strato_bridge::MockBridge;
    use strato_storage::{MockMembershipStore, TeamId, UserUuid};
    use uuid::Uuid;

    fn workspace(seats: u32) -> Workspace {
        Workspace {
            id: WorkspaceId(Uuid::new_v4()),
            owner_id: UserUuid(Uuid::new_v4()),
            default_team_id: TeamId(Uuid::new_v4()),
            workspace_user_uuid: UserUuid(Uuid::new_v4()),
            setup_completed: true,
            number_of_seats: seats,
            name: "acme".into(),
            description: None,
            address: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    const GIB: u64 = 1024 * 1024 * 1024;

    #[tokio::test]
    async fn assignable_space_subtracts_members_and_invites() {
        let ws = workspace(10);
        let account = ws.workspace_user_uuid;

        let mut bridge = MockBridge::new();
        bridge
            .expect_get_limit()
            .with(eq(account))
            .returning(|_| Ok(100 * GIB));

        let mut store = MockMembershipStore::new();
        store
            .expect_sum_member_space_limits()
            .with(eq(ws.id))
            .returning(|_| Ok(60 * GIB));
        store
            .expect_sum_invite_space_limits()
            .with(eq(ws.id))
            .returning(|_| Ok(15 * GIB));

        let ledger = QuotaLedger::new(Arc::new(store), Arc::new(bridge));
        assert_eq!(ledger.assignable_space(&ws).await.unwrap(), 25 * GIB);
    }

    #[tokio::test]
    async fn assignable_space_floors_at_zero_when_over_committed() {
        let ws = workspace(10);

        let mut bridge = MockBridge::new();
        bridge.expect_get_limit().returning(|_| Ok(50 * GIB));

        let mut store = MockMembershipStore::new();
        store
            .expect_sum_member_space_limits()
            .returning(|_| Ok(60 * GIB));
        store
            .expect_sum_invite_space_limits()
            .returning(|_| Ok(10 * GIB));

        let ledger = QuotaLedger::new(Arc::new(store), Arc::new(bridge));
        assert_eq!(ledger.assignable_space(&ws).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn pending_invites_hold_seats() {
        let ws = workspace(5);
        let ws_for_get = ws.clone();

        let mut store = MockMembershipStore::new();
        store
            .expect_get_workspace()
            .with(eq(ws.id))
            .returning(move |_| Ok(ws_for_get.clone()));
        store.expect_count_active_members().returning(|_| Ok(4));
        store.expect_count_pending_invites().returning(|_| Ok(1));

        let ledger = QuotaLedger::new(Arc::new(store), Arc::new(MockBridge::new()));
        assert!(ledger.is_workspace_full(&ws.id).await.unwrap());
    }

    #[tokio::test]
    async fn workspace_with_free_seat_is_not_full() {
        let ws = workspace(5);
        let ws_for_get = ws.clone();

        let mut store = MockMembershipStore::new();
        store
            .expect_get_workspace()
            .returning(move |_| Ok(ws_for_get.clone()));
        store.expect_count_active_members().returning(|_| Ok(3));
        store.expect_count_pending_invites().returning(|_| Ok(1));

        let ledger = QuotaLedger::new(Arc::new(store), Arc::new(MockBridge::new()));
        assert!(!ledger.is_workspace_full(&ws.id).await.unwrap());
    }

    #[tokio::test]
    async fn bridge_failure_propagates() {
        let ws = workspace(5);

        let mut bridge = MockBridge::new();
        bridge
            .expect_get_limit()
            .returning(|_| Err(BridgeError::Transport("timeout".into())));

        let ledger = QuotaLedger::new(Arc::new(MockMembershipStore::new()), Arc::new(bridge));
        assert!(matches!(
            ledger.assignable_space(&ws).await,
            Err(QuotaError::Bridge(_))
        ));
    }
}
