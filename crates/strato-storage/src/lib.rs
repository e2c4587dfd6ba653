//! Storage abstraction for strato.
//!
//! Backend crates (e.g., strato-store-sqlite) implement the `MembershipStore`
//! and `SharingStore` traits so the decision engine and provisioning flows
//! never depend on a specific database engine or schema details.

use thiserror::Error;

mod store;
mod types;

pub use store::{MembershipStore, SharingStore};
pub use types::*;

#[cfg(feature = "test-support")]
pub use store::{MockMembershipStore, MockSharingStore};

/// Uniform error type for all storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("conflict")]
    Conflict,
    #[error("backend error: {0}")]
    Backend(String),
}
