//! In-memory event bus for tests/dev.

use std::collections::HashMap;
use std::sync::{Mutex, mpsc};

use crate::bus::{EventBus, Subscription};
use crate::routing::RoutingKey;

#[derive(Debug)]
pub enum InMemoryBusError {
    /// Publish failed due to internal lock poisoning.
    Poisoned,
}

/// In-memory pub/sub bus with routing-key bindings.
///
/// - No IO / no async
/// - Best-effort fan-out per key
/// - At-least-once acceptable (subscribers must be idempotent)
/// - Publishing to a key with no bindings is a silent success, like a broker
///   dropping an unrouted message
#[derive(Debug)]
pub struct InMemoryEventBus<M> {
    bindings: Mutex<HashMap<RoutingKey, Vec<mpsc::Sender<M>>>>,
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self {
            bindings: Mutex::new(HashMap::new()),
        }
    }
}

impl<M> EventBus<M> for InMemoryEventBus<M>
where
    M: Clone + Send + 'static,
{
    type Error = InMemoryBusError;

    fn publish(&self, key: &RoutingKey, message: M) -> Result<(), Self::Error> {
        let mut bindings = self.bindings.lock().map_err(|_| InMemoryBusError::Poisoned)?;

        if let Some(subs) = bindings.get_mut(key) {
            // Drop any dead subscribers while publishing.
            subs.retain(|tx| tx.send(message.clone()).is_ok());
        }

        Ok(())
    }

    fn subscribe(&self, key: &RoutingKey) -> Subscription<M> {
        let (tx, rx) = mpsc::channel();

        // If the lock is poisoned, we still return a subscription;
        // it just won't receive messages until the process restarts.
        if let Ok(mut bindings) = self.bindings.lock() {
            bindings.entry(key.clone()).or_default().push(tx);
        }

        Subscription::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing;

    #[test]
    fn messages_route_by_binding_key() {
        let bus: InMemoryEventBus<u32> = InMemoryEventBus::new();
        let reserved = RoutingKey::new(routing::SEAT_RESERVED);
        let released = RoutingKey::new(routing::SEAT_RELEASED);

        let sub = bus.subscribe(&reserved);
        bus.publish(&released, 1).unwrap();
        bus.publish(&reserved, 2).unwrap();

        assert_eq!(sub.try_recv().unwrap(), 2);
        assert!(sub.try_recv().is_err());
    }

    #[test]
    fn every_binding_on_a_key_gets_a_copy() {
        let bus: InMemoryEventBus<u32> = InMemoryEventBus::new();
        let key = RoutingKey::new(routing::SEAT_RESERVED);

        let a = bus.subscribe(&key);
        let b = bus.subscribe(&key);
        bus.publish(&key, 7).unwrap();

        assert_eq!(a.try_recv().unwrap(), 7);
        assert_eq!(b.try_recv().unwrap(), 7);
    }

    #[test]
    fn unrouted_publish_is_a_silent_success() {
        let bus: InMemoryEventBus<u32> = InMemoryEventBus::new();
        bus.publish(&RoutingKey::new("nobody.listens"), 9).unwrap();
    }
}
