//! Type definitions for strato storage.

mod ids;
mod invites;
mod members;
mod roles;
mod sharing;
mod teams;
mod users;
mod workspaces;

pub use ids::*;
pub use invites::*;
pub use members::*;
pub use roles::*;
pub use sharing::*;
pub use teams::*;
pub use users::*;
pub use workspaces::*;
