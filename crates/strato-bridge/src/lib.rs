//! External collaborator ports for strato.
//!
//! The object-storage service ("bridge") owns file content and per-account
//! storage limits; the mailer delivers invitation notifications. The engine
//! only consumes these interfaces; transport lives elsewhere.

use async_trait::async_trait;
use thiserror::Error;

use strato_storage::{UserId, UserUuid, WorkspaceInvite};

/// Bridge call failures. The bridge is a remote service; every error is an
/// infrastructure error from the engine's point of view.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("bridge account not found")]
    AccountNotFound,
    #[error("bridge error: {0}")]
    Transport(String),
}

/// Account created (or pre-registered) at the bridge.
#[derive(Clone, Debug)]
pub struct BridgeUser {
    pub id: UserId,
    pub uuid: UserUuid,
}

/// Object-storage quota service.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait Bridge: Send + Sync {
    /// Total storage limit in bytes for an account.
    async fn get_limit(&self, account: &UserUuid) -> Result<u64, BridgeError>;

    /// Set the storage allocation in bytes for an account.
    async fn set_storage(&self, account: &UserUuid, bytes: u64) -> Result<(), BridgeError>;

    /// Pre-register a user by email (used when inviting someone who has not
    /// signed up yet).
    async fn create_user(&self, email: &str) -> Result<BridgeUser, BridgeError>;
}

/// Mailer call failures.
#[derive(Debug, Error)]
pub enum MailerError {
    #[error("mailer error: {0}")]
    Delivery(String),
}

/// Invitation delivery. Failures here are logged by callers, never
/// propagated; the invite row stands either way.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Notify a registered user of a workspace invitation.
    async fn send_workspace_user_invitation(
        &self,
        email: &str,
        workspace_name: &str,
        invite: &WorkspaceInvite,
    ) -> Result<(), MailerError>;

    /// Notify a not-yet-registered address; the mail carries a sign-up link.
    async fn send_workspace_user_external_invitation(
        &self,
        email: &str,
        workspace_name: &str,
        invite: &WorkspaceInvite,
    ) -> Result<(), MailerError>;
}
