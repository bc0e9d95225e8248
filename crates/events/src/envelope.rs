use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::Event;

/// Standard envelope around every message on the broker.
///
/// Carries the metadata all consumers rely on: a unique event id (the dedup
/// key under at-least-once delivery), the event type and schema version, the
/// business occurrence time, and a correlation id shared by every event fanned
/// out from one state change.
///
/// Field names are camelCase on the wire for broker compatibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    event_type: String,
    schema_version: u32,
    occurred_at: DateTime<Utc>,
    correlation_id: Uuid,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: Uuid,
        event_type: impl Into<String>,
        schema_version: u32,
        occurred_at: DateTime<Utc>,
        correlation_id: Uuid,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            event_type: event_type.into(),
            schema_version,
            occurred_at,
            correlation_id,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

impl<E: Event> EventEnvelope<E> {
    /// Wrap a payload, stamping a fresh event id.
    ///
    /// Prefer [`EventEnvelope::new`] with explicit ids in tests for
    /// determinism.
    pub fn wrap(payload: E, correlation_id: Uuid, occurred_at: DateTime<Utc>) -> Self {
        let event_type = payload.event_type().to_string();
        let schema_version = payload.schema_version();
        Self {
            event_id: Uuid::now_v7(),
            event_type,
            schema_version,
            occurred_at,
            correlation_id,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::ProductCancelled;
    use boxoffice_core::ProductId;

    #[test]
    fn envelope_serializes_camel_case() {
        let envelope = EventEnvelope::new(
            Uuid::nil(),
            "product.cancelled",
            1,
            Utc::now(),
            Uuid::nil(),
            ProductCancelled::new(ProductId::new(7)),
        );
        let json = serde_json::to_value(&envelope).unwrap();
        assert!(json.get("eventId").is_some());
        assert!(json.get("eventType").is_some());
        assert!(json.get("schemaVersion").is_some());
        assert!(json.get("occurredAt").is_some());
        assert!(json.get("correlationId").is_some());
        assert_eq!(json["payload"]["productId"], 7);
    }

    #[test]
    fn wrap_takes_type_and_version_from_the_payload() {
        let envelope = EventEnvelope::wrap(
            ProductCancelled::new(ProductId::new(7)),
            Uuid::now_v7(),
            Utc::now(),
        );
        assert_eq!(envelope.event_type(), "product.cancelled");
        assert_eq!(envelope.schema_version(), 1);
    }
}
