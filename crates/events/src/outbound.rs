//! Outbound compensating events published by this core.

use serde::{Deserialize, Serialize};

use boxoffice_core::ProductId;

use crate::event::Event;

/// Fanned out to every downstream consumer when a product is cancelled.
///
/// Each copy of the fan-out shares one correlation id on its envelope so
/// consumers' side effects can be tied back to the triggering cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCancelled {
    pub product_id: ProductId,
}

impl ProductCancelled {
    pub fn new(product_id: ProductId) -> Self {
        Self { product_id }
    }
}

impl Event for ProductCancelled {
    fn event_type(&self) -> &'static str {
        "product.cancelled"
    }

    fn schema_version(&self) -> u32 {
        1
    }
}
