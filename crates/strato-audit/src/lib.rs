//! Audit logging abstraction for strato.
//!
//! This crate defines the `AuditSink` trait for persisting audit events and
//! the types representing auditable actions in the system. Recording is
//! fire-and-forget: sink failures are logged, never propagated to callers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use strato_storage::{UserUuid, WorkspaceId};

/// Unique identifier for an audit entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditEventId(pub Uuid);

impl AuditEventId {
    /// Generate a new audit event ID using UUID v7 (time-ordered)
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for AuditEventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AuditEventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Categories of auditable actions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    // Workspace lifecycle
    WorkspaceCreate,
    WorkspaceSetup,

    // Membership
    MemberJoin,
    MemberLeave,
    MemberRemove,

    // Invites
    InviteCreate,
    InviteAccept,
    InviteRevoke,

    // Teams
    TeamMemberAdd,
    TeamMemberRemove,
    TeamManagerChange,

    // Sharing
    SharingGrant,
    SharingRevoke,
    SharingRoleChange,
    SharingInviteCreate,
    SharingInviteAccept,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuditAction::WorkspaceCreate => "workspace.create",
            AuditAction::WorkspaceSetup => "workspace.setup",
            AuditAction::MemberJoin => "member.join",
            AuditAction::MemberLeave => "member.leave",
            AuditAction::MemberRemove => "member.remove",
            AuditAction::InviteCreate => "invite.create",
            AuditAction::InviteAccept => "invite.accept",
            AuditAction::InviteRevoke => "invite.revoke",
            AuditAction::TeamMemberAdd => "team.member_add",
            AuditAction::TeamMemberRemove => "team.member_remove",
            AuditAction::TeamManagerChange => "team.manager_change",
            AuditAction::SharingGrant => "sharing.grant",
            AuditAction::SharingRevoke => "sharing.revoke",
            AuditAction::SharingRoleChange => "sharing.role_change",
            AuditAction::SharingInviteCreate => "sharing_invite.create",
            AuditAction::SharingInviteAccept => "sharing_invite.accept",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "workspace.create" => Ok(AuditAction::WorkspaceCreate),
            "workspace.setup" => Ok(AuditAction::WorkspaceSetup),
            "member.join" => Ok(AuditAction::MemberJoin),
            "member.leave" => Ok(AuditAction::MemberLeave),
            "member.remove" => Ok(AuditAction::MemberRemove),
            "invite.create" => Ok(AuditAction::InviteCreate),
            "invite.accept" => Ok(AuditAction::InviteAccept),
            "invite.revoke" => Ok(AuditAction::InviteRevoke),
            "team.member_add" => Ok(AuditAction::TeamMemberAdd),
            "team.member_remove" => Ok(AuditAction::TeamMemberRemove),
            "team.manager_change" => Ok(AuditAction::TeamManagerChange),
            "sharing.grant" => Ok(AuditAction::SharingGrant),
            "sharing.revoke" => Ok(AuditAction::SharingRevoke),
            "sharing.role_change" => Ok(AuditAction::SharingRoleChange),
            "sharing_invite.create" => Ok(AuditAction::SharingInviteCreate),
            "sharing_invite.accept" => Ok(AuditAction::SharingInviteAccept),
            _ => Err(format!("Unknown audit action: {}", s)),
        }
    }
}

/// Who performed the action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformerType {
    User,
    System,
}

/// An audit entry for a single auditable action.
///
/// Uses raw UUIDs for serialization compatibility. Use the builder to
/// construct events from typed IDs. `metadata` is an opaque JSON payload
/// the engine never inspects, only forwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: AuditEventId,
    pub timestamp: DateTime<Utc>,
    /// Type of entity affected (e.g., "workspace", "invite", "sharing")
    pub entity_type: String,
    /// Identifier of the affected entity
    pub entity_id: String,
    pub action: AuditAction,
    pub performer_type: PerformerType,
    /// Performer identity; None for system-initiated actions
    pub performer_id: Option<Uuid>,
    /// Workspace context (if applicable)
    pub workspace_id: Option<Uuid>,
    pub metadata: Option<serde_json::Value>,
}

impl AuditEvent {
    /// Create a new audit event builder
    pub fn builder(action: AuditAction) -> AuditEventBuilder {
        AuditEventBuilder::new(action)
    }
}

/// Builder for constructing audit events
pub struct AuditEventBuilder {
    action: AuditAction,
    entity_type: String,
    entity_id: String,
    performer_type: PerformerType,
    performer_id: Option<Uuid>,
    workspace_id: Option<Uuid>,
    metadata: Option<serde_json::Value>,
}

impl AuditEventBuilder {
    pub fn new(action: AuditAction) -> Self {
        Self {
            action,
            entity_type: String::new(),
            entity_id: String::new(),
            performer_type: PerformerType::System,
            performer_id: None,
            workspace_id: None,
            metadata: None,
        }
    }

    pub fn entity(mut self, entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        self.entity_type = entity_type.into();
        self.entity_id = entity_id.into();
        self
    }

    pub fn performer(mut self, performer: &UserUuid) -> Self {
        self.performer_type = PerformerType::User;
        self.performer_id = Some(performer.0);
        self
    }

    pub fn workspace_id(mut self, workspace_id: &WorkspaceId) -> Self {
        self.workspace_id = Some(workspace_id.0);
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn build(self) -> AuditEvent {
        AuditEvent {
            id: AuditEventId::new(),
            timestamp: Utc::now(),
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            action: self.action,
            performer_type: self.performer_type,
            performer_id: self.performer_id,
            workspace_id: self.workspace_id,
            metadata: self.metadata,
        }
    }
}

/// Error type for audit sink operations
#[derive(Debug, Error)]
pub enum AuditSinkError {
    #[error("sink error: {0}")]
    Sink(String),
}

/// Trait for audit event persistence.
///
/// Failures to record audit events must be logged by the caller but must
/// not fail the main operation; see [`record_best_effort`].
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    async fn record(&self, event: AuditEvent) -> Result<(), AuditSinkError>;
}

/// Record an event, swallowing (but logging) sink failures.
pub async fn record_best_effort(sink: &dyn AuditSink, event: AuditEvent) {
    let action = event.action;
    if let Err(e) = sink.record(event).await {
        tracing::warn!(%action, error = %e, "failed to record audit event");
    }
}

/// In-memory sink for tests and single-process deployments.
#[derive(Default)]
pub struct MemoryAuditSink {
    events: tokio::sync::Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditSinkError> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn audit_action_display() {
        assert_eq!(AuditAction::WorkspaceSetup.to_string(), "workspace.setup");
        assert_eq!(AuditAction::InviteAccept.to_string(), "invite.accept");
        assert_eq!(
            AuditAction::SharingRoleChange.to_string(),
            "sharing.role_change"
        );
    }

    #[test]
    fn audit_action_parse() {
        assert_eq!(
            "invite.create".parse::<AuditAction>().unwrap(),
            AuditAction::InviteCreate
        );
        assert!("invalid.action".parse::<AuditAction>().is_err());
    }

    #[test]
    fn builder_sets_performer() {
        let performer = UserUuid(Uuid::new_v4());
        let ws = WorkspaceId(Uuid::new_v4());
        let event = AuditEvent::builder(AuditAction::MemberJoin)
            .entity("workspace", ws.0.to_string())
            .performer(&performer)
            .workspace_id(&ws)
            .metadata(serde_json::json!({"seats": 5}))
            .build();

        assert_eq!(event.performer_type, PerformerType::User);
        assert_eq!(event.performer_id, Some(performer.0));
        assert_eq!(event.workspace_id, Some(ws.0));
        assert_eq!(event.entity_type, "workspace");
    }

    #[tokio::test]
    async fn memory_sink_records() {
        let sink = MemoryAuditSink::new();
        let event = AuditEvent::builder(AuditAction::InviteRevoke)
            .entity("invite", "abc")
            .build();
        record_best_effort(&sink, event).await;

        let events = sink.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, AuditAction::InviteRevoke);
        assert_eq!(events[0].performer_type, PerformerType::System);
    }

    #[tokio::test]
    async fn failing_sink_does_not_propagate() {
        struct FailingSink;

        #[async_trait]
        impl AuditSink for FailingSink {
            async fn record(&self, _event: AuditEvent) -> Result<(), AuditSinkError> {
                Err(AuditSinkError::Sink("down".into()))
            }
        }

        // Must not panic or return an error.
        record_best_effort(
            &FailingSink,
            AuditEvent::builder(AuditAction::MemberLeave).build(),
        )
        .await;
    }
}
