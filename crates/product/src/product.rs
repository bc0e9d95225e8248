//! The Product aggregate: one sellable event listing.
//!
//! All mutation goes through named operations that validate and then commit;
//! there are no raw setters across the aggregate boundary. Three independent
//! actors drive these operations concurrently (owner commands, the seat-event
//! consumer, the scheduler); per-aggregate mutual exclusion is the storage
//! layer's job, invariant enforcement is this type's.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use boxoffice_core::{AggregateRoot, DomainError, Entity, ProductId, UserId};

use crate::content::ProductContent;
use crate::error::ProductError;
use crate::policy::{AdmissionPolicy, AgeRestriction, BookingPolicy, RefundPolicy};
use crate::schedule::{SaleSchedule, Schedule};
use crate::seats::{SeatGrade, SeatSummary};
use crate::stats::ProductStats;
use crate::status::ProductStatus;
use crate::venue::Venue;

const MAX_NAME_CHARS: usize = 50;

/// Category of listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Concert,
    Musical,
    Play,
    Classical,
    Exhibition,
}

/// Soft-delete marker, set exactly once on cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionStamp {
    pub deleted_at: DateTime<Utc>,
    pub deleted_by: UserId,
}

/// Everything required to create a product, validated as a set by the factory.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub owner: UserId,
    pub name: String,
    pub product_type: ProductType,
    pub running_time_minutes: u32,
    pub event_schedule: Schedule,
    pub sale_schedule: SaleSchedule,
    pub venue: Option<Venue>,
    pub grades: Vec<SeatGrade>,
    /// Required when no grades are supplied; otherwise derived from them.
    pub total_seats: Option<u32>,
    pub content: Option<ProductContent>,
    pub booking_policy: Option<BookingPolicy>,
    pub admission_policy: Option<AdmissionPolicy>,
    pub refund_policy: Option<RefundPolicy>,
    pub age_restriction: Option<AgeRestriction>,
}

/// Aggregate root: Product.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    id: ProductId,
    owner: UserId,
    name: String,
    product_type: ProductType,
    running_time_minutes: u32,
    event_schedule: Schedule,
    sale_schedule: SaleSchedule,
    venue: Option<Venue>,
    status: ProductStatus,
    seat_summary: SeatSummary,
    grades: Vec<SeatGrade>,
    stats: ProductStats,
    content: Option<ProductContent>,
    booking_policy: Option<BookingPolicy>,
    admission_policy: Option<AdmissionPolicy>,
    refund_policy: Option<RefundPolicy>,
    age_restriction: Option<AgeRestriction>,
    deletion: Option<DeletionStamp>,
    version: u64,
}

impl Product {
    /// Factory: validates the whole field set and yields a Draft product.
    pub fn create(id: ProductId, spec: NewProduct, now: DateTime<Utc>) -> Result<Self, ProductError> {
        validate_name(&spec.name)?;
        if spec.running_time_minutes == 0 {
            return Err(DomainError::validation("running time must be positive").into());
        }

        let mut grades = spec.grades;
        ensure_unique_grade_names(&grades)?;
        grades.sort_by_key(SeatGrade::display_order);

        let total_seats = if grades.is_empty() {
            spec.total_seats.ok_or_else(|| {
                DomainError::validation("total seats is required when no grades are supplied")
            })?
        } else {
            let derived = sum_grade_totals(&grades)?;
            if let Some(explicit) = spec.total_seats {
                if explicit != derived {
                    return Err(DomainError::validation(format!(
                        "total seats {explicit} does not match grade sum {derived}"
                    ))
                    .into());
                }
            }
            derived
        };

        Ok(Self {
            id,
            owner: spec.owner,
            name: spec.name.trim().to_string(),
            product_type: spec.product_type,
            running_time_minutes: spec.running_time_minutes,
            event_schedule: spec.event_schedule,
            sale_schedule: spec.sale_schedule,
            venue: spec.venue,
            status: ProductStatus::Draft,
            seat_summary: SeatSummary::new(total_seats, now),
            grades,
            stats: ProductStats::new(),
            content: spec.content,
            booking_policy: spec.booking_policy,
            admission_policy: spec.admission_policy,
            refund_policy: spec.refund_policy,
            age_restriction: spec.age_restriction,
            deletion: None,
            version: 1,
        })
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn product_type(&self) -> ProductType {
        self.product_type
    }

    pub fn running_time_minutes(&self) -> u32 {
        self.running_time_minutes
    }

    pub fn event_schedule(&self) -> &Schedule {
        &self.event_schedule
    }

    pub fn sale_schedule(&self) -> &SaleSchedule {
        &self.sale_schedule
    }

    pub fn venue(&self) -> Option<&Venue> {
        self.venue.as_ref()
    }

    pub fn status(&self) -> ProductStatus {
        self.status
    }

    pub fn seat_summary(&self) -> &SeatSummary {
        &self.seat_summary
    }

    pub fn grades(&self) -> &[SeatGrade] {
        &self.grades
    }

    pub fn grade(&self, name: &str) -> Option<&SeatGrade> {
        self.grades.iter().find(|g| g.name() == name)
    }

    pub fn stats(&self) -> &ProductStats {
        &self.stats
    }

    pub fn content(&self) -> Option<&ProductContent> {
        self.content.as_ref()
    }

    pub fn booking_policy(&self) -> Option<&BookingPolicy> {
        self.booking_policy.as_ref()
    }

    pub fn admission_policy(&self) -> Option<&AdmissionPolicy> {
        self.admission_policy.as_ref()
    }

    pub fn refund_policy(&self) -> Option<&RefundPolicy> {
        self.refund_policy.as_ref()
    }

    pub fn age_restriction(&self) -> Option<&AgeRestriction> {
        self.age_restriction.as_ref()
    }

    pub fn deletion(&self) -> Option<&DeletionStamp> {
        self.deletion.as_ref()
    }

    pub fn is_cancelled(&self) -> bool {
        self.status.is_cancelled()
    }

    /// Change status through the transition table.
    ///
    /// Checks AlreadyCancelled first, then the table. Commits the status field
    /// only; seat/stat mutation is a separate concern.
    pub fn change_status(&mut self, target: ProductStatus) -> Result<(), ProductError> {
        self.ensure_not_cancelled()?;
        if !self.status.can_transition(target) {
            return Err(ProductError::IllegalTransition {
                current: self.status,
                attempted: target,
            });
        }
        self.status = target;
        self.touch();
        Ok(())
    }

    /// One-way cancellation: status change plus soft-delete stamp.
    ///
    /// Never a physical deletion. A second invocation fails with
    /// `AlreadyCancelled`.
    pub fn cancel(&mut self, actor: UserId, now: DateTime<Utc>) -> Result<(), ProductError> {
        self.change_status(ProductStatus::Cancelled)?;
        self.deletion = Some(DeletionStamp {
            deleted_at: now,
            deleted_by: actor,
        });
        Ok(())
    }

    pub fn update_details(
        &mut self,
        name: impl Into<String>,
        running_time_minutes: u32,
    ) -> Result<(), ProductError> {
        self.ensure_not_cancelled()?;
        let name = name.into();
        validate_name(&name)?;
        if running_time_minutes == 0 {
            return Err(DomainError::validation("running time must be positive").into());
        }
        self.name = name.trim().to_string();
        self.running_time_minutes = running_time_minutes;
        self.touch();
        Ok(())
    }

    /// Venue is frozen once the event schedule has started.
    pub fn change_venue(&mut self, venue: Venue, now: DateTime<Utc>) -> Result<(), ProductError> {
        self.ensure_not_cancelled()?;
        if self.event_schedule.has_started(now) {
            return Err(ProductError::VenueLocked);
        }
        self.venue = Some(venue);
        self.touch();
        Ok(())
    }

    /// Grades may only be added before the first sale (Draft or Pending).
    pub fn add_grade(&mut self, grade: SeatGrade, now: DateTime<Utc>) -> Result<(), ProductError> {
        self.ensure_not_cancelled()?;
        if !matches!(self.status, ProductStatus::Draft | ProductStatus::Pending) {
            return Err(DomainError::invariant(
                "seat grades can only be added before the sale starts",
            )
            .into());
        }
        if self.grade(grade.name()).is_some() {
            return Err(
                DomainError::conflict(format!("duplicate grade name: {}", grade.name())).into(),
            );
        }
        self.grades.push(grade);
        self.grades.sort_by_key(SeatGrade::display_order);
        self.recompute_summary(now)?;
        self.touch();
        Ok(())
    }

    /// Grades may only be removed while the product is still in Draft.
    pub fn remove_grade(&mut self, name: &str, now: DateTime<Utc>) -> Result<(), ProductError> {
        self.ensure_not_cancelled()?;
        if self.status != ProductStatus::Draft {
            return Err(DomainError::invariant(
                "seat grades can only be removed while the product is in draft",
            )
            .into());
        }
        let idx = self
            .grades
            .iter()
            .position(|g| g.name() == name)
            .ok_or_else(|| ProductError::UnknownGrade(name.to_string()))?;
        self.grades.remove(idx);
        self.recompute_summary(now)?;
        self.touch();
        Ok(())
    }

    /// Apply a remote seat reservation to the local ledger.
    ///
    /// Strict at this level: reserving more than remains fails with
    /// `InsufficientSeats` and leaves the aggregate untouched. The underlying
    /// counters still clamp defensively.
    pub fn reserve_seats(
        &mut self,
        grade: &str,
        count: u32,
        now: DateTime<Utc>,
    ) -> Result<(), ProductError> {
        self.ensure_not_cancelled()?;
        if count == 0 {
            return Err(DomainError::validation("seat count must be positive").into());
        }
        if count > self.seat_summary.available_seats() {
            return Err(ProductError::InsufficientSeats {
                requested: count,
                available: self.seat_summary.available_seats(),
            });
        }

        let updated_grade = match self.find_grade(grade)? {
            Some(idx) => Some((idx, self.grades[idx].decrease(count)?)),
            None => None,
        };
        let summary = self.seat_summary.decrease(count, now)?;

        if let Some((idx, g)) = updated_grade {
            self.grades[idx] = g;
        }
        self.seat_summary = summary;
        self.stats = self.stats.record_reservation();
        self.touch();
        Ok(())
    }

    /// Apply a remote seat release (compensating event) to the local ledger.
    ///
    /// Clamped at the totals; the reservation counter is floored at zero.
    pub fn release_seats(
        &mut self,
        grade: &str,
        count: u32,
        now: DateTime<Utc>,
    ) -> Result<(), ProductError> {
        self.ensure_not_cancelled()?;
        if count == 0 {
            return Err(DomainError::validation("seat count must be positive").into());
        }

        let updated_grade = match self.find_grade(grade)? {
            Some(idx) => Some((idx, self.grades[idx].increase(count)?)),
            None => None,
        };
        let summary = self.seat_summary.increase(count, now)?;

        if let Some((idx, g)) = updated_grade {
            self.grades[idx] = g;
        }
        self.seat_summary = summary;
        self.stats = self.stats.release_reservation();
        self.touch();
        Ok(())
    }

    pub fn record_view(&mut self) -> Result<(), ProductError> {
        self.ensure_not_cancelled()?;
        self.stats = self.stats.record_view();
        self.touch();
        Ok(())
    }

    fn ensure_not_cancelled(&self) -> Result<(), ProductError> {
        if self.is_cancelled() {
            return Err(ProductError::AlreadyCancelled { id: self.id });
        }
        Ok(())
    }

    /// When grades are in use, the event names one; an unknown name means the
    /// ledger would drift, so it is rejected. Gradeless products track the
    /// summary only.
    fn find_grade(&self, name: &str) -> Result<Option<usize>, ProductError> {
        if self.grades.is_empty() {
            return Ok(None);
        }
        self.grades
            .iter()
            .position(|g| g.name() == name)
            .map(Some)
            .ok_or_else(|| ProductError::UnknownGrade(name.to_string()))
    }

    fn recompute_summary(&mut self, now: DateTime<Utc>) -> Result<(), ProductError> {
        let total = sum_grade_totals(&self.grades)?;
        self.seat_summary = SeatSummary::recomputed(total, self.seat_summary.sold_seats(), now);
        Ok(())
    }

    fn touch(&mut self) {
        self.version += 1;
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for Product {
    fn version(&self) -> u64 {
        self.version
    }
}

fn validate_name(name: &str) -> Result<(), ProductError> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name cannot be empty").into());
    }
    if name.trim().chars().count() > MAX_NAME_CHARS {
        return Err(
            DomainError::validation(format!("name cannot exceed {MAX_NAME_CHARS} characters"))
                .into(),
        );
    }
    Ok(())
}

fn ensure_unique_grade_names(grades: &[SeatGrade]) -> Result<(), ProductError> {
    for (i, grade) in grades.iter().enumerate() {
        if grades[..i].iter().any(|g| g.name() == grade.name()) {
            return Err(
                DomainError::conflict(format!("duplicate grade name: {}", grade.name())).into(),
            );
        }
    }
    Ok(())
}

fn sum_grade_totals(grades: &[SeatGrade]) -> Result<u32, ProductError> {
    grades
        .iter()
        .try_fold(0u32, |acc, g| acc.checked_add(g.total_seats()))
        .ok_or_else(|| DomainError::validation("grade seat totals overflow").into())
}
