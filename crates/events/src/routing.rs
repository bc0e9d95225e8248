//! Broker routing surface (wire-level, preserved for compatibility).

use serde::{Deserialize, Serialize};

/// Exchange carrying the product core's events.
pub const EVENT_EXCHANGE: &str = "product.events";

/// Parallel dead-letter exchange; rejected messages land under `dlq.<key>`.
pub const DEAD_LETTER_EXCHANGE: &str = "product.events.dlx";

/// Outbound compensating event for the reservation subsystem.
pub const PRODUCT_CANCELLED_RESERVATION: &str = "product.cancelled.reservation";

/// Outbound compensating event for the seat-inventory subsystem.
pub const PRODUCT_CANCELLED_RESERVATION_SEAT: &str = "product.cancelled.reservation-seat";

/// Inbound seat reservation applied to the local ledger.
pub const SEAT_RESERVED: &str = "seat.reserved";

/// Inbound seat release applied to the local ledger.
pub const SEAT_RELEASED: &str = "seat.released";

const DEAD_LETTER_PREFIX: &str = "dlq.";

/// A broker routing key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutingKey(String);

impl RoutingKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The dead-letter binding for this key: `dlq.<key>`.
    pub fn dead_letter(&self) -> RoutingKey {
        RoutingKey(format!("{DEAD_LETTER_PREFIX}{}", self.0))
    }

    pub fn is_dead_letter(&self) -> bool {
        self.0.starts_with(DEAD_LETTER_PREFIX)
    }
}

impl core::fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoutingKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Every downstream consumer of a cancellation, in no particular order.
///
/// Each fanned-out event is independent; no ordering is required between the
/// targets.
pub fn cancellation_fanout() -> [RoutingKey; 2] {
    [
        RoutingKey::new(PRODUCT_CANCELLED_RESERVATION),
        RoutingKey::new(PRODUCT_CANCELLED_RESERVATION_SEAT),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dead_letter_key_is_prefixed() {
        let key = RoutingKey::new(SEAT_RESERVED);
        let dlq = key.dead_letter();
        assert_eq!(dlq.as_str(), "dlq.seat.reserved");
        assert!(dlq.is_dead_letter());
        assert!(!key.is_dead_letter());
    }

    #[test]
    fn fanout_covers_both_downstream_consumers() {
        let keys = cancellation_fanout();
        assert_eq!(keys[0].as_str(), "product.cancelled.reservation");
        assert_eq!(keys[1].as_str(), "product.cancelled.reservation-seat");
    }
}
