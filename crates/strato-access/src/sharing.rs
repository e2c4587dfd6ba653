//! Effective-role resolution over sharing grants.
//!
//! The priority tie-break is a structured sort key rather than SQL string
//! templating: rows whose role matches the requested priority rank first,
//! everything else second, ties broken by natural row order.

use std::sync::Arc;

use strato_storage::{
    FolderId, GranteeId, ItemId, ItemType, Role, RoleName, Sharing, SharingGrant, SharingStore,
    StoreError, TeamId, UserUuid,
};

/// Options for a resolution call.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResolveOptions {
    /// Place grants with this role name first in the result.
    pub give_priority_to_role: Option<RoleName>,
}

/// Resolves the effective role(s) a set of grantees holds over an item.
pub struct SharingResolver {
    store: Arc<dyn SharingStore>,
}

impl SharingResolver {
    pub fn new(store: Arc<dyn SharingStore>) -> Self {
        Self { store }
    }

    /// All `(Sharing, Role)` pairs for any grantee in `grantee_ids`.
    ///
    /// Returns an empty vec (not an error) when no grant exists. Grants
    /// whose role row is missing are skipped with a warning; a data
    /// inconsistency must never crash the resolver.
    pub async fn resolve_roles(
        &self,
        item_id: &ItemId,
        item_type: ItemType,
        grantee_ids: &[GranteeId],
        options: ResolveOptions,
    ) -> Result<Vec<(Sharing, Role)>, StoreError> {
        let grants = self
            .store
            .list_grants(item_id, item_type, grantee_ids)
            .await?;
        Ok(order_grants(grants, options.give_priority_to_role))
    }

    /// All grants on an item, skipping pending placeholder rows (the
    /// zero-uuid sentinel grantee) so they never appear as real grants.
    pub async fn resolve_for_item(
        &self,
        item_id: &ItemId,
        item_type: ItemType,
    ) -> Result<Vec<(Sharing, Role)>, StoreError> {
        let grants = self
            .store
            .list_grants_for_item(item_id, item_type)
            .await?
            .into_iter()
            .filter(|g| !g.sharing.shared_with.is_placeholder())
            .collect();
        Ok(order_grants(grants, None))
    }

    /// The strongest grant a user holds on an item, directly or via team
    /// membership. Owner-level grants rank first, so one lookup answers
    /// "does the user own this anywhere" without scanning all grants.
    pub async fn resolve_user_role(
        &self,
        item_id: &ItemId,
        item_type: ItemType,
        user: &UserUuid,
        team_ids: &[TeamId],
    ) -> Result<Option<(Sharing, Role)>, StoreError> {
        let mut grantees: Vec<GranteeId> = Vec::with_capacity(team_ids.len() + 1);
        grantees.push((*user).into());
        grantees.extend(team_ids.iter().copied().map(GranteeId::from));

        let options = ResolveOptions {
            give_priority_to_role: Some(RoleName::Owner),
        };
        let mut roles = self
            .resolve_roles(item_id, item_type, &grantees, options)
            .await?;
        Ok(if roles.is_empty() {
            None
        } else {
            Some(roles.swap_remove(0))
        })
    }

    /// The role a user holds on a privately shared folder, if any.
    pub async fn resolve_private_folder_role(
        &self,
        folder_id: &FolderId,
        user: &UserUuid,
    ) -> Result<Option<Role>, StoreError> {
        self.store.find_private_folder_role(folder_id, user).await
    }
}

/// Sort rank for the priority tie-break: 1 for the requested role name,
/// 2 for everything else.
fn priority_rank(role: RoleName, priority: Option<RoleName>) -> u8 {
    match priority {
        Some(p) if p == role => 1,
        _ => 2,
    }
}

fn order_grants(grants: Vec<SharingGrant>, priority: Option<RoleName>) -> Vec<(Sharing, Role)> {
    let mut rows: Vec<(Sharing, Role)> = grants
        .into_iter()
        .filter_map(|g| match g.role {
            Some(role) => Some((g.sharing, role)),
            None => {
                tracing::warn!(
                    sharing_id = %g.sharing.id.0,
                    "sharing grant has no role row, skipping"
                );
                None
            }
        })
        .collect();
    // Stable sort: natural row order is preserved within each rank.
    rows.sort_by_key(|(_, role)| priority_rank(role.name, priority));
    rows
}
