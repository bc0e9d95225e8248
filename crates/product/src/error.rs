//! Business-rule error taxonomy for the product aggregate.

use thiserror::Error;

use boxoffice_core::{DomainError, ProductId};

use crate::status::ProductStatus;

/// Error raised by named operations on the product aggregate.
///
/// Validation failures surface through the transparent `Domain` variant;
/// the remaining variants are business-rule violations, kept distinguishable
/// so callers can report them without server-side log access.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProductError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The product is cancelled; cancellation is terminal and absorbing.
    #[error("product {id} is already cancelled")]
    AlreadyCancelled { id: ProductId },

    /// The transition table forbids this status change.
    #[error("illegal status transition: {current:?} -> {attempted:?}")]
    IllegalTransition {
        current: ProductStatus,
        attempted: ProductStatus,
    },

    /// Strict aggregate-level decrease: more seats requested than remain.
    #[error("insufficient seats: requested {requested}, available {available}")]
    InsufficientSeats { requested: u32, available: u32 },

    /// The venue cannot change once the event schedule has started.
    #[error("venue cannot change after the event has started")]
    VenueLocked,

    /// No seat grade with this name belongs to the product.
    #[error("unknown seat grade: {0}")]
    UnknownGrade(String),
}
