//! Event and sale schedules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use boxoffice_core::{DomainError, DomainResult, ValueObject};

/// When the performance itself runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
}

impl Schedule {
    pub fn new(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> DomainResult<Self> {
        if ends_at <= starts_at {
            return Err(DomainError::validation(
                "event schedule must end strictly after it starts",
            ));
        }
        Ok(Self { starts_at, ends_at })
    }

    pub fn starts_at(&self) -> DateTime<Utc> {
        self.starts_at
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        self.ends_at
    }

    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        now >= self.starts_at
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        now >= self.ends_at
    }
}

impl ValueObject for Schedule {}

/// When tickets for the performance are purchasable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleSchedule {
    opens_at: DateTime<Utc>,
    closes_at: DateTime<Utc>,
}

impl SaleSchedule {
    pub fn new(opens_at: DateTime<Utc>, closes_at: DateTime<Utc>) -> DomainResult<Self> {
        if closes_at <= opens_at {
            return Err(DomainError::validation(
                "sale schedule must close strictly after it opens",
            ));
        }
        Ok(Self { opens_at, closes_at })
    }

    pub fn opens_at(&self) -> DateTime<Utc> {
        self.opens_at
    }

    pub fn closes_at(&self) -> DateTime<Utc> {
        self.closes_at
    }

    pub fn has_opened(&self, now: DateTime<Utc>) -> bool {
        now >= self.opens_at
    }

    pub fn has_closed(&self, now: DateTime<Utc>) -> bool {
        now >= self.closes_at
    }

    /// The purchasable window: opened and not yet closed.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.has_opened(now) && !self.has_closed(now)
    }
}

impl ValueObject for SaleSchedule {}
