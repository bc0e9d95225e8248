//! View and reservation counters.

use serde::{Deserialize, Serialize};

use boxoffice_core::ValueObject;

/// Aggregate-level usage counters.
///
/// Snapshot semantics: mutators return a new value so callers can compare
/// before/after without aliasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductStats {
    view_count: u64,
    reservation_count: u64,
}

impl ProductStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view_count(&self) -> u64 {
        self.view_count
    }

    pub fn reservation_count(&self) -> u64 {
        self.reservation_count
    }

    pub fn record_view(&self) -> Self {
        Self {
            view_count: self.view_count.saturating_add(1),
            ..*self
        }
    }

    pub fn record_reservation(&self) -> Self {
        Self {
            reservation_count: self.reservation_count.saturating_add(1),
            ..*self
        }
    }

    /// Floored at zero: a compensating release for a reservation this node
    /// never saw must not underflow.
    pub fn release_reservation(&self) -> Self {
        Self {
            reservation_count: self.reservation_count.saturating_sub(1),
            ..*self
        }
    }
}

impl ValueObject for ProductStats {}
