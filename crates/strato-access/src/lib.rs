//! Access decisions and sharing-role resolution for strato.
//!
//! `guard` answers "can this actor perform a role-gated action on this
//! workspace or team"; `sharing` resolves the effective role a user (or
//! their teams) holds over a shared item. Both are pure decision logic over
//! the storage ports: a plain deny or an empty grant set is a value, never
//! an error.

mod guard;
mod sharing;

pub use guard::{
    AccessContext, Capability, DenyReason, GuardError, MissingResource, Verdict, WorkspaceGuard,
};
pub use sharing::{ResolveOptions, SharingResolver};
