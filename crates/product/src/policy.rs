//! Booking, admission, refund and age-restriction policies.

use serde::{Deserialize, Serialize};

use boxoffice_core::{DomainError, DomainResult, ValueObject};

/// How many tickets a single booking may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingPolicy {
    max_tickets_per_booking: u32,
}

impl BookingPolicy {
    pub fn new(max_tickets_per_booking: u32) -> DomainResult<Self> {
        if max_tickets_per_booking == 0 {
            return Err(DomainError::validation(
                "max tickets per booking must be positive",
            ));
        }
        Ok(Self {
            max_tickets_per_booking,
        })
    }

    pub fn max_tickets_per_booking(&self) -> u32 {
        self.max_tickets_per_booking
    }
}

impl ValueObject for BookingPolicy {}

/// Door and re-entry rules for the performance itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionPolicy {
    doors_open_minutes_before: u32,
    reentry_allowed: bool,
}

impl AdmissionPolicy {
    pub fn new(doors_open_minutes_before: u32, reentry_allowed: bool) -> Self {
        Self {
            doors_open_minutes_before,
            reentry_allowed,
        }
    }

    pub fn doors_open_minutes_before(&self) -> u32 {
        self.doors_open_minutes_before
    }

    pub fn reentry_allowed(&self) -> bool {
        self.reentry_allowed
    }
}

impl ValueObject for AdmissionPolicy {}

/// Refund window and fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundPolicy {
    refundable_until_hours_before: u32,
    fee_rate_percent: u8,
}

impl RefundPolicy {
    pub fn new(refundable_until_hours_before: u32, fee_rate_percent: u8) -> DomainResult<Self> {
        if fee_rate_percent > 100 {
            return Err(DomainError::validation(
                "refund fee rate cannot exceed 100 percent",
            ));
        }
        Ok(Self {
            refundable_until_hours_before,
            fee_rate_percent,
        })
    }

    pub fn refundable_until_hours_before(&self) -> u32 {
        self.refundable_until_hours_before
    }

    pub fn fee_rate_percent(&self) -> u8 {
        self.fee_rate_percent
    }
}

impl ValueObject for RefundPolicy {}

/// Minimum age required for admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRestriction {
    minimum_age: u8,
}

impl AgeRestriction {
    pub fn new(minimum_age: u8) -> Self {
        Self { minimum_age }
    }

    pub fn minimum_age(&self) -> u8 {
        self.minimum_age
    }

    pub fn admits(&self, age: u8) -> bool {
        age >= self.minimum_age
    }
}

impl ValueObject for AgeRestriction {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_policy_rejects_zero_limit() {
        assert!(BookingPolicy::new(0).is_err());
        assert_eq!(BookingPolicy::new(4).unwrap().max_tickets_per_booking(), 4);
    }

    #[test]
    fn refund_policy_caps_fee_rate() {
        assert!(RefundPolicy::new(24, 101).is_err());
        assert!(RefundPolicy::new(24, 100).is_ok());
    }

    #[test]
    fn age_restriction_admits_at_threshold() {
        let r = AgeRestriction::new(15);
        assert!(r.admits(15));
        assert!(!r.admits(14));
    }
}
