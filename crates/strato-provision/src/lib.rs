//! Workspace provisioning sagas.
//!
//! The provisioner is the only component that performs compensating writes:
//! setup and invite acceptance each mutate independent aggregates (and, for
//! acceptance, call the external bridge between mutations), so partial
//! failure is unwound by explicit deletes rather than a database transaction.
//! Store and bridge handles are never held open across external calls.

mod provisioner;

pub use provisioner::{InviteRequest, ProvisionError, WorkspaceProvisioner};
