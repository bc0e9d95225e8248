//! Inbound seat events from the remote reservation system.

use serde::{Deserialize, Serialize};

use boxoffice_core::ProductId;

use crate::routing;

fn default_count() -> u32 {
    1
}

/// Wire payload of `seat.reserved` / `seat.released`.
///
/// The kind is carried by the envelope's event type, not by the payload; both
/// kinds share this shape. `count` defaults to 1 when the field is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatEventPayload {
    pub product_id: ProductId,
    pub grade: String,
    #[serde(default = "default_count")]
    pub count: u32,
}

/// The two seat-event kinds this core consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatEventKind {
    Reserved,
    Released,
}

impl SeatEventKind {
    /// Resolve the kind from an envelope's event type; `None` means the
    /// message is not one of ours (malformed or misrouted).
    pub fn from_event_type(event_type: &str) -> Option<Self> {
        match event_type {
            routing::SEAT_RESERVED => Some(SeatEventKind::Reserved),
            routing::SEAT_RELEASED => Some(SeatEventKind::Released),
            _ => None,
        }
    }

    pub fn event_type(self) -> &'static str {
        match self {
            SeatEventKind::Reserved => routing::SEAT_RESERVED,
            SeatEventKind::Released => routing::SEAT_RELEASED,
        }
    }
}
