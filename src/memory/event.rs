//! The episodic event value type.
//!
//! An `Event` describes one memory segment inside a tenant session. The token
//! span is the half-open interval `[start_token, end_token_exclusive)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::MemoryError;

/// One episodic memory segment in a tenant session.
///
/// Events are validated on construction (including deserialization), so a
/// value of this type is always well-formed. Fields stay private; read access
/// goes through the accessors below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EventPayload")]
pub struct Event {
    event_id: String,
    tenant_id: String,
    session_id: String,
    start_token: i64,
    end_token_exclusive: i64,
    created_at: DateTime<Utc>,
}

/// Wire shape of an event. Deserialization funnels through this mirror so
/// that `Event::new` runs on every ingress path.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EventPayload {
    event_id: String,
    tenant_id: String,
    session_id: String,
    start_token: i64,
    end_token_exclusive: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<EventPayload> for Event {
    type Error = MemoryError;

    fn try_from(payload: EventPayload) -> Result<Self, Self::Error> {
        Event::new(
            payload.event_id,
            payload.tenant_id,
            payload.session_id,
            payload.start_token,
            payload.end_token_exclusive,
            payload.created_at,
        )
    }
}

impl Event {
    /// Builds a validated event.
    ///
    /// Identifiers must be non-empty, `start_token` non-negative, and the
    /// span non-empty. Timestamps with a non-UTC offset are normalized by the
    /// `DateTime<Utc>` type before they reach this constructor.
    pub fn new(
        event_id: String,
        tenant_id: String,
        session_id: String,
        start_token: i64,
        end_token_exclusive: i64,
        created_at: DateTime<Utc>,
    ) -> Result<Self, MemoryError> {
        if event_id.is_empty() {
            return Err(MemoryError::EventIdRequired);
        }
        if tenant_id.is_empty() {
            return Err(MemoryError::TenantIdRequired);
        }
        if session_id.is_empty() {
            return Err(MemoryError::SessionIdRequired);
        }
        if start_token < 0 {
            return Err(MemoryError::StartTokenNegative);
        }
        if end_token_exclusive <= start_token {
            return Err(MemoryError::InvalidTokenRange);
        }

        Ok(Self {
            event_id,
            tenant_id,
            session_id,
            start_token,
            end_token_exclusive,
            created_at,
        })
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn start_token(&self) -> i64 {
        self.start_token
    }

    pub fn end_token_exclusive(&self) -> i64 {
        self.end_token_exclusive
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
