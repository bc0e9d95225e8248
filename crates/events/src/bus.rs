//! Event publishing/subscription abstraction (mechanics only).
//!
//! A lightweight pub/sub contract keyed by routing key:
//!
//! - **Transport-agnostic**: in-memory channels for tests/dev, a broker in
//!   production.
//! - **At-least-once delivery**: messages may arrive more than once and out of
//!   order; consumers must be idempotent.
//! - **No persistence**: the bus distributes, it does not store.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use crate::routing::RoutingKey;

/// A subscription to one routing key.
///
/// Designed for single-threaded consumption; each subscription belongs to one
/// consumer loop.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Routing-keyed event bus (pub/sub abstraction).
///
/// `publish` can fail (broker unavailable, serialization error); failures are
/// surfaced to the caller, which decides whether the operation is retryable.
/// Subscribers bound to a key each receive a copy of every message published
/// under it.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, key: &RoutingKey, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self, key: &RoutingKey) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, key: &RoutingKey, message: M) -> Result<(), Self::Error> {
        (**self).publish(key, message)
    }

    fn subscribe(&self, key: &RoutingKey) -> Subscription<M> {
        (**self).subscribe(key)
    }
}
