//! Infrastructure layer: storage, application service, consumer, scheduler.
//!
//! Composes the pure product domain with the messaging mechanics: a
//! repository abstraction with per-aggregate locking, the command-facing
//! `ProductService` (including the cancellation fan-out), the idempotent
//! seat-event consumer, and the time-gated sweep scheduler.

pub mod consumer;
pub mod log_sink;
pub mod repository;
pub mod scheduler;
pub mod seat_client;
pub mod service;


pub use consumer::{ConsumerConfig, IngestOutcome, SeatEventConsumer};
pub use log_sink::{ActionType, LogEventSink, NoopLogSink, RecordingLogSink, TracingLogSink};
pub use repository::{
    InMemoryProductRepository, Page, PageRequest, ProductFilter, ProductRepository,
    RepositoryError,
};
pub use scheduler::{
    SchedulerConfig, SchedulerHandle, Sweep, SweepReport, SweepRunner, TimeGate, default_sweeps,
    spawn,
};
pub use seat_client::{
    NoopSeatClient, RecordingSeatClient, SeatClientError, SeatCreationClient, SeatCreationRequest,
    SeatSpec,
};
pub use service::{ProductService, ServiceError};
