//! Business action log sink.
//!
//! Every meaningful state change emits an action record for audit and
//! analytics. Recording is best-effort: a sink must never fail the operation
//! that triggered it.

use std::sync::Mutex;

use boxoffice_core::ProductId;

/// Taxonomy of auditable product actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionType {
    Created,
    Approved,
    SaleOpened,
    SaleReopened,
    SoldOut,
    ReturnedToDraft,
    Cancelled,
    SeatsDecreased,
    SeatsIncreased,
    ViewIncreased,
    DetailsUpdated,
    VenueChanged,
    GradeAdded,
    GradeRemoved,
}

impl ActionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::Created => "created",
            ActionType::Approved => "approved",
            ActionType::SaleOpened => "sale-opened",
            ActionType::SaleReopened => "sale-reopened",
            ActionType::SoldOut => "sold-out",
            ActionType::ReturnedToDraft => "returned-to-draft",
            ActionType::Cancelled => "cancelled",
            ActionType::SeatsDecreased => "seats-decreased",
            ActionType::SeatsIncreased => "seats-increased",
            ActionType::ViewIncreased => "view-increased",
            ActionType::DetailsUpdated => "details-updated",
            ActionType::VenueChanged => "venue-changed",
            ActionType::GradeAdded => "grade-added",
            ActionType::GradeRemoved => "grade-removed",
        }
    }
}

/// Sink for business action records. Infallible by contract.
pub trait LogEventSink: Send + Sync {
    fn record(&self, action: ActionType, product_id: ProductId);
}

impl<S> LogEventSink for std::sync::Arc<S>
where
    S: LogEventSink + ?Sized,
{
    fn record(&self, action: ActionType, product_id: ProductId) {
        (**self).record(action, product_id);
    }
}

/// Emits action records as structured tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

impl LogEventSink for TracingLogSink {
    fn record(&self, action: ActionType, product_id: ProductId) {
        tracing::info!(
            action = action.as_str(),
            product_id = product_id.value(),
            "product action"
        );
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogSink;

impl LogEventSink for NoopLogSink {
    fn record(&self, _action: ActionType, _product_id: ProductId) {}
}

/// Captures records for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingLogSink {
    entries: Mutex<Vec<(ActionType, ProductId)>>,
}

impl RecordingLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(ActionType, ProductId)> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl LogEventSink for RecordingLogSink {
    fn record(&self, action: ActionType, product_id: ProductId) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((action, product_id));
        }
    }
}
