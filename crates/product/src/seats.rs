//! Seat availability ledger: aggregate summary and per-grade counters.
//!
//! The ledger mirrors a remote reservation system that owns the individual
//! seats; locally we only track aggregate counts. The low-level counters here
//! **clamp** into `0..=total` so stored state can never violate the range
//! invariant even under event drift. The strict business check (failing a
//! reservation that exceeds availability) lives on the aggregate, not here;
//! the two tiers are deliberate and must not be unified.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use boxoffice_core::{DomainError, DomainResult, ValueObject};

const MAX_GRADE_NAME_CHARS: usize = 20;

/// Aggregate-level seat counts.
///
/// Snapshot semantics: mutators take `&self` and return the new value;
/// callers commit the snapshot (or drop it on failure).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatSummary {
    total_seats: u32,
    available_seats: u32,
    updated_at: DateTime<Utc>,
}

impl SeatSummary {
    pub fn new(total_seats: u32, now: DateTime<Utc>) -> Self {
        Self {
            total_seats,
            available_seats: total_seats,
            updated_at: now,
        }
    }

    /// Rebuild the summary after a grade change, preserving already-sold seats.
    pub(crate) fn recomputed(total_seats: u32, sold_seats: u32, now: DateTime<Utc>) -> Self {
        Self {
            total_seats,
            available_seats: total_seats.saturating_sub(sold_seats),
            updated_at: now,
        }
    }

    pub fn total_seats(&self) -> u32 {
        self.total_seats
    }

    pub fn available_seats(&self) -> u32 {
        self.available_seats
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn sold_seats(&self) -> u32 {
        self.total_seats - self.available_seats
    }

    /// Sold percentage in `0.0..=100.0`; zero-capacity products read as 0.
    pub fn sold_rate(&self) -> f64 {
        if self.total_seats == 0 {
            0.0
        } else {
            f64::from(self.sold_seats()) * 100.0 / f64::from(self.total_seats)
        }
    }

    pub fn is_sold_out(&self) -> bool {
        self.available_seats == 0
    }

    pub fn has_available(&self) -> bool {
        self.available_seats > 0
    }

    /// Decrease availability, clamped at zero.
    ///
    /// Fails only on a non-positive count; running below zero is clamped so
    /// storage never holds an out-of-range counter.
    pub fn decrease(&self, count: u32, now: DateTime<Utc>) -> DomainResult<Self> {
        if count == 0 {
            return Err(DomainError::validation("seat count must be positive"));
        }
        Ok(Self {
            available_seats: self.available_seats.saturating_sub(count),
            updated_at: now,
            ..*self
        })
    }

    /// Increase availability, clamped at `total_seats`.
    pub fn increase(&self, count: u32, now: DateTime<Utc>) -> DomainResult<Self> {
        if count == 0 {
            return Err(DomainError::validation("seat count must be positive"));
        }
        Ok(Self {
            available_seats: self.available_seats.saturating_add(count).min(self.total_seats),
            updated_at: now,
            ..*self
        })
    }
}

impl ValueObject for SeatSummary {}

/// A price band of seats within one product.
///
/// Grades have no identity outside their parent product; the name is unique
/// within the product and acts as the correlation key on seat events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatGrade {
    name: String,
    price: u64,
    total_seats: u32,
    available_seats: u32,
    display_order: u32,
}

impl SeatGrade {
    pub fn new(
        name: impl Into<String>,
        price: u64,
        total_seats: u32,
        display_order: u32,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("grade name cannot be empty"));
        }
        if name.chars().count() > MAX_GRADE_NAME_CHARS {
            return Err(DomainError::validation(format!(
                "grade name cannot exceed {MAX_GRADE_NAME_CHARS} characters"
            )));
        }
        if total_seats == 0 {
            return Err(DomainError::validation("grade must have at least one seat"));
        }
        Ok(Self {
            name,
            price,
            total_seats,
            available_seats: total_seats,
            display_order,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> u64 {
        self.price
    }

    pub fn total_seats(&self) -> u32 {
        self.total_seats
    }

    pub fn available_seats(&self) -> u32 {
        self.available_seats
    }

    pub fn display_order(&self) -> u32 {
        self.display_order
    }

    pub fn sold_seats(&self) -> u32 {
        self.total_seats - self.available_seats
    }

    pub fn is_sold_out(&self) -> bool {
        self.available_seats == 0
    }

    /// Decrease this grade's availability, clamped at zero.
    pub fn decrease(&self, count: u32) -> DomainResult<Self> {
        if count == 0 {
            return Err(DomainError::validation("seat count must be positive"));
        }
        Ok(Self {
            available_seats: self.available_seats.saturating_sub(count),
            ..self.clone()
        })
    }

    /// Increase this grade's availability, clamped at `total_seats`.
    pub fn increase(&self, count: u32) -> DomainResult<Self> {
        if count == 0 {
            return Err(DomainError::validation("seat count must be positive"));
        }
        Ok(Self {
            available_seats: self.available_seats.saturating_add(count).min(self.total_seats),
            ..self.clone()
        })
    }
}

impl ValueObject for SeatGrade {}
