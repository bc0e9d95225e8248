//! Messaging mechanics and wire types.
//!
//! Transport-agnostic pub/sub with routing keys, the event envelope shared by
//! every payload, the inbound/outbound wire types of the product core, and the
//! dedup window that makes at-least-once ingestion safe.

pub mod bus;
pub mod dedup;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;
pub mod inbound;
pub mod outbound;
pub mod routing;

pub use bus::{EventBus, Subscription};
pub use dedup::DedupWindow;
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use inbound::{SeatEventKind, SeatEventPayload};
pub use outbound::ProductCancelled;
pub use routing::RoutingKey;
