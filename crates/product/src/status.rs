//! Product status lifecycle and the transition table that gates it.

use serde::{Deserialize, Serialize};

/// Product status lifecycle.
///
/// `Cancelled` is terminal and absorbing: nothing transitions out of it,
/// including to itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Draft,
    Pending,
    OnSale,
    SoldOut,
    Cancelled,
}

impl ProductStatus {
    /// Every status, in lifecycle order. Handy for exhaustive table checks.
    pub const ALL: [ProductStatus; 5] = [
        ProductStatus::Draft,
        ProductStatus::Pending,
        ProductStatus::OnSale,
        ProductStatus::SoldOut,
        ProductStatus::Cancelled,
    ];

    /// Pure, total transition table.
    ///
    /// Draft -> {Pending, Cancelled}
    /// Pending -> {Draft, OnSale, Cancelled}
    /// OnSale -> {SoldOut, Cancelled}
    /// SoldOut -> {OnSale, Cancelled}
    /// Cancelled -> {}
    ///
    /// Self-transitions are always illegal.
    pub fn can_transition(self, target: ProductStatus) -> bool {
        use ProductStatus::*;

        matches!(
            (self, target),
            (Draft, Pending)
                | (Draft, Cancelled)
                | (Pending, Draft)
                | (Pending, OnSale)
                | (Pending, Cancelled)
                | (OnSale, SoldOut)
                | (OnSale, Cancelled)
                | (SoldOut, OnSale)
                | (SoldOut, Cancelled)
        )
    }

    pub fn is_cancelled(self) -> bool {
        self == ProductStatus::Cancelled
    }
}
