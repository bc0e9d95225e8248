//! Seat-event consumer: applies remote reservations to the local ledger.
//!
//! Delivery is at least once, so the consumer keys idempotency on the
//! envelope's event id through a bounded dedup window. Failure handling is
//! tiered: duplicates are silently dropped, events for unknown products are
//! logged and dropped, and events the ledger rejects are re-published to the
//! dead-letter binding (`dlq.<key>`). The loop itself never propagates an
//! error; one bad message must not take the consumer down.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use tracing::{debug, error, warn};
use uuid::Uuid;

use boxoffice_events::bus::{EventBus, Subscription};
use boxoffice_events::dedup::DedupWindow;
use boxoffice_events::envelope::EventEnvelope;
use boxoffice_events::inbound::{SeatEventKind, SeatEventPayload};
use boxoffice_events::routing::RoutingKey;

use crate::log_sink::{ActionType, LogEventSink};
use crate::repository::{ProductRepository, RepositoryError};

#[derive(Debug, Clone, Copy)]
pub struct ConsumerConfig {
    /// How many recent event ids the dedup window retains.
    pub dedup_capacity: usize,
    /// Receive timeout of the consumer loop; bounds shutdown latency.
    pub poll_timeout: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            dedup_capacity: 4096,
            poll_timeout: Duration::from_millis(250),
        }
    }
}

/// Terminal outcome of one delivered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Applied,
    Duplicate,
    UnknownProduct,
    DeadLettered,
}

pub struct SeatEventConsumer<R, B, L> {
    repo: R,
    bus: B,
    log_sink: L,
    dedup: Mutex<DedupWindow>,
    poll_timeout: Duration,
}

impl<R, B, L> SeatEventConsumer<R, B, L>
where
    R: ProductRepository,
    B: EventBus<EventEnvelope<SeatEventPayload>>,
    L: LogEventSink,
{
    pub fn new(repo: R, bus: B, log_sink: L, config: ConsumerConfig) -> Self {
        Self {
            repo,
            bus,
            log_sink,
            dedup: Mutex::new(DedupWindow::new(config.dedup_capacity)),
            poll_timeout: config.poll_timeout,
        }
    }

    /// Process one delivered envelope to a terminal outcome.
    pub fn handle(&self, envelope: &EventEnvelope<SeatEventPayload>) -> IngestOutcome {
        if !self.first_sighting(envelope.event_id()) {
            debug!(event_id = %envelope.event_id(), "duplicate delivery dropped");
            return IngestOutcome::Duplicate;
        }

        let Some(kind) = SeatEventKind::from_event_type(envelope.event_type()) else {
            warn!(
                event_type = envelope.event_type(),
                event_id = %envelope.event_id(),
                "unrecognized event type"
            );
            self.dead_letter(envelope);
            return IngestOutcome::DeadLettered;
        };

        let payload = envelope.payload();
        let occurred_at = envelope.occurred_at();
        let result = self.repo.update(payload.product_id, |p| match kind {
            SeatEventKind::Reserved => p.reserve_seats(&payload.grade, payload.count, occurred_at),
            SeatEventKind::Released => p.release_seats(&payload.grade, payload.count, occurred_at),
        });

        match result {
            Ok(()) => {
                let action = match kind {
                    SeatEventKind::Reserved => ActionType::SeatsDecreased,
                    SeatEventKind::Released => ActionType::SeatsIncreased,
                };
                self.log_sink.record(action, payload.product_id);
                IngestOutcome::Applied
            }
            Err(RepositoryError::NotFound) => {
                // Likely a listing owned by another deployment; not ours to fix.
                warn!(
                    product_id = payload.product_id.value(),
                    event_id = %envelope.event_id(),
                    "seat event for unknown product dropped"
                );
                IngestOutcome::UnknownProduct
            }
            Err(e) => {
                warn!(
                    product_id = payload.product_id.value(),
                    event_id = %envelope.event_id(),
                    error = %e,
                    "seat event rejected by the ledger"
                );
                self.dead_letter(envelope);
                IngestOutcome::DeadLettered
            }
        }
    }

    /// Consume until `shutdown` is raised or the channel closes.
    pub fn run(
        &self,
        subscription: &Subscription<EventEnvelope<SeatEventPayload>>,
        shutdown: &AtomicBool,
    ) {
        while !shutdown.load(Ordering::Relaxed) {
            match subscription.recv_timeout(self.poll_timeout) {
                Ok(envelope) => {
                    self.handle(&envelope);
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    fn first_sighting(&self, event_id: Uuid) -> bool {
        match self.dedup.lock() {
            Ok(mut window) => window.observe(event_id),
            // A poisoned window cannot veto processing; at-least-once wins
            // over exactly-once here.
            Err(_) => true,
        }
    }

    fn dead_letter(&self, envelope: &EventEnvelope<SeatEventPayload>) {
        let key = RoutingKey::new(envelope.event_type()).dead_letter();
        if let Err(e) = self.bus.publish(&key, envelope.clone()) {
            error!(key = %key, error = ?e, "dead-letter publish failed, message dropped");
        }
    }
}
