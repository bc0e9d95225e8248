//! Client for the remote reservation system's seat provisioning call.
//!
//! When a product is created, its individual seats are provisioned remotely.
//! The remote system is the source of truth for seat identity; this core only
//! keeps the aggregate availability ledger.

use std::sync::Mutex;

use serde::Serialize;
use thiserror::Error;

use boxoffice_core::{Entity, ProductId};
use boxoffice_product::Product;

/// One physical seat to provision, camelCase on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatSpec {
    pub seat_number: String,
    pub grade: String,
    pub price: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatCreationRequest {
    pub product_id: ProductId,
    pub seats: Vec<SeatSpec>,
}

impl SeatCreationRequest {
    /// Expand a product's grades into numbered seats (`VIP-1`, `VIP-2`, ...).
    ///
    /// Gradeless products yield an empty request; without grades there are no
    /// individual seats to describe remotely.
    pub fn for_product(product: &Product) -> Self {
        let mut seats = Vec::new();
        for grade in product.grades() {
            for n in 1..=grade.total_seats() {
                seats.push(SeatSpec {
                    seat_number: format!("{}-{n}", grade.name()),
                    grade: grade.name().to_string(),
                    price: grade.price(),
                });
            }
        }
        Self {
            product_id: *product.id(),
            seats,
        }
    }
}

#[derive(Debug, Error)]
pub enum SeatClientError {
    #[error("seat service unavailable: {0}")]
    Unavailable(String),
}

pub trait SeatCreationClient: Send + Sync {
    fn create_seats(&self, request: &SeatCreationRequest) -> Result<(), SeatClientError>;
}

impl<C> SeatCreationClient for std::sync::Arc<C>
where
    C: SeatCreationClient + ?Sized,
{
    fn create_seats(&self, request: &SeatCreationRequest) -> Result<(), SeatClientError> {
        (**self).create_seats(request)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSeatClient;

impl SeatCreationClient for NoopSeatClient {
    fn create_seats(&self, _request: &SeatCreationRequest) -> Result<(), SeatClientError> {
        Ok(())
    }
}

/// Captures requests for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingSeatClient {
    requests: Mutex<Vec<SeatCreationRequest>>,
}

impl RecordingSeatClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<SeatCreationRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl SeatCreationClient for RecordingSeatClient {
    fn create_seats(&self, request: &SeatCreationRequest) -> Result<(), SeatClientError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        Ok(())
    }
}
