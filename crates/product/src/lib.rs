//! Product domain module.
//!
//! This crate contains the business rules for sellable event listings: the
//! status lifecycle, the seat availability ledger mirroring the remote
//! reservation system, and the value objects a listing owns. Implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod content;
pub mod error;
pub mod policy;
pub mod product;
pub mod schedule;
pub mod seats;
pub mod stats;
pub mod status;
pub mod venue;

pub use content::ProductContent;
pub use error::ProductError;
pub use policy::{AdmissionPolicy, AgeRestriction, BookingPolicy, RefundPolicy};
pub use product::{DeletionStamp, NewProduct, Product, ProductType};
pub use schedule::{SaleSchedule, Schedule};
pub use seats::{SeatGrade, SeatSummary};
pub use stats::ProductStats;
pub use status::ProductStatus;
pub use venue::Venue;
