/// A domain-agnostic event payload.
///
/// Events are immutable facts with a stable name and a schema version for
/// evolution. Occurrence metadata (event id, timestamp, correlation id) lives
/// on the [`EventEnvelope`](crate::EventEnvelope) by composition, not on the
/// payload: one envelope shape, many tagged payload kinds.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "seat.reserved").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn schema_version(&self) -> u32;
}
