//! Change notifications.
//!
//! The store owns a [`CartEvents`] registry. After every successful mutation
//! it emits one [`CartEvent`] carrying the full new snapshot; every current
//! handler runs synchronously, in subscription order, before the mutating
//! call returns.
//!
//! Handlers may read the store, subscribe or unsubscribe, and mutate the
//! store that is notifying them. A nested mutation emits its own event, with
//! the next sequence number, to every handler before the outer delivery
//! resumes.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use tienda_core::ProductId;

use crate::line::CartLine;

/// What a mutation changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartChange {
    /// A product was added, either as a new line or onto an existing one.
    Added {
        /// Product added.
        id: ProductId,
        /// Line quantity after the add.
        quantity: u32,
    },
    /// A line was removed.
    Removed {
        /// Product removed.
        id: ProductId,
    },
    /// A line's quantity was set.
    QuantityChanged {
        /// Product updated.
        id: ProductId,
        /// New line quantity.
        quantity: u32,
    },
    /// The whole cart was cleared.
    Cleared,
}

/// Notification emitted after a successful mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct CartEvent {
    /// Emission counter of the originating store, starting at 1.
    pub sequence: u64,
    /// What changed.
    pub change: CartChange,
    /// Full cart after the mutation.
    pub snapshot: Vec<CartLine>,
}

type Handler = Arc<dyn Fn(&CartEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_handler_id: u64,
    sequence: u64,
    handlers: Vec<(u64, Handler)>,
}

/// Subscriber registry for one store.
#[derive(Default)]
pub struct CartEvents {
    registry: Arc<Mutex<Registry>>,
}

impl CartEvents {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. It stays registered until the returned
    /// [`Subscription`] is dropped or unsubscribed.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&CartEvent) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock();
        registry.next_handler_id += 1;
        let id = registry.next_handler_id;
        registry.handlers.push((id, Arc::new(handler)));
        tracing::debug!(subscription_id = id, "cart subscriber registered");

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().handlers.len()
    }

    /// Sequence number of the last emitted event (0 if none yet).
    #[must_use]
    pub fn last_sequence(&self) -> u64 {
        self.registry.lock().sequence
    }

    /// Deliver an event to every current handler and return it.
    ///
    /// The registry lock is released before handlers run, so handlers can
    /// subscribe or drop subscriptions without deadlocking.
    pub(crate) fn emit(&self, change: CartChange, snapshot: Vec<CartLine>) -> CartEvent {
        let (event, handlers) = {
            let mut registry = self.registry.lock();
            registry.sequence += 1;
            let event = CartEvent {
                sequence: registry.sequence,
                change,
                snapshot,
            };
            let handlers: Vec<Handler> =
                registry.handlers.iter().map(|(_, h)| Arc::clone(h)).collect();
            (event, handlers)
        };

        tracing::debug!(
            sequence = event.sequence,
            subscribers = handlers.len(),
            lines = event.snapshot.len(),
            "cart updated"
        );

        for handler in handlers {
            handler(&event);
        }
        event
    }
}

impl std::fmt::Debug for CartEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.lock();
        f.debug_struct("CartEvents")
            .field("subscribers", &registry.handlers.len())
            .field("sequence", &registry.sequence)
            .finish()
    }
}

/// Disposer for a registered handler.
///
/// Dropping it unregisters the handler.
#[must_use = "dropping a Subscription unregisters its handler immediately"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Unregister the handler now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().handlers.retain(|(id, _)| *id != self.id);
            tracing::debug!(subscription_id = self.id, "cart subscriber removed");
        }
    }
}
