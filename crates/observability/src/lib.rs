//! Shared tracing/logging setup for the box office services.

/// Initialize process-wide observability (tracing/logging).
///
/// Call once from each binary entry point; repeated calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, layers).
pub mod tracing;
