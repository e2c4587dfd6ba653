//! User records and the authenticated actor.

use chrono::{DateTime, Utc};

use super::{UserId, UserUuid};

/// User record.
#[derive(Clone, Debug)]
pub struct User {
    pub id: UserId,
    pub uuid: UserUuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The caller as established by the authentication layer.
///
/// Authentication has already happened by the time the engine runs; both
/// identifiers are trusted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub uuid: UserUuid,
}

impl Actor {
    pub fn new(id: UserId, uuid: UserUuid) -> Self {
        Self { id, uuid }
    }
}
