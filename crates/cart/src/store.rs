//! The cart store.
//!
//! [`CartStore`] is the only component that reads or writes the cart entry of
//! a storage origin. Each mutation runs under a write lock for its whole
//! read-validate-persist-notify sequence, so one operation completes before
//! the next begins even when the store is shared between threads. Reads do
//! not take the lock.
//!
//! Change handlers run while the lock is held. The lock is reentrant, so a
//! handler may mutate the store it listens to; the nested change is persisted
//! and delivered before delivery of the outer change continues.
//!
//! Two stores over the same storage share the persisted cart but not their
//! subscribers: a mutation notifies only the store that performed it, and the
//! other store sees the change on its next [`CartStore::read`].

use parking_lot::ReentrantMutex;
use tracing::instrument;

use tienda_core::{Price, ProductId, ProductSnapshot};

use crate::error::{CartError, Result};
use crate::events::{CartChange, CartEvent, CartEvents, Subscription};
use crate::line::CartLine;
use crate::session::keys as session_keys;
use crate::storage::{CartStorage, StorageError, validate_key};

/// Storage key the cart is persisted under.
pub const DEFAULT_CART_KEY: &str = "shopping_cart";

/// Check that `key` can hold the cart.
///
/// Besides the storage key rules, the session keys are refused so the cart
/// and the session never overwrite each other in one origin.
///
/// # Errors
///
/// Returns [`StorageError::InvalidKey`] if the key is unusable.
pub fn validate_cart_key(key: &str) -> std::result::Result<(), StorageError> {
    validate_key(key)?;
    if [session_keys::ACCESS_TOKEN, session_keys::USER].contains(&key) {
        return Err(StorageError::InvalidKey(
            key.to_string(),
            "reserved for the session",
        ));
    }
    Ok(())
}

/// Result of a successful [`CartStore::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new line was appended.
    NewLine {
        /// Quantity of the new line.
        quantity: u32,
    },
    /// An existing line's quantity was increased.
    Increased {
        /// Line quantity after the add.
        quantity: u32,
    },
}

impl AddOutcome {
    /// Line quantity after the add.
    #[must_use]
    pub const fn quantity(self) -> u32 {
        match self {
            Self::NewLine { quantity } | Self::Increased { quantity } => quantity,
        }
    }
}

/// Client-side shopping cart over a storage origin.
pub struct CartStore<S> {
    storage: S,
    key: String,
    events: CartEvents,
    // Reentrant so a change handler can mutate the store it listens to.
    write_lock: ReentrantMutex<()>,
}

impl<S: CartStorage> CartStore<S> {
    /// Create a store using [`DEFAULT_CART_KEY`].
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            key: DEFAULT_CART_KEY.to_string(),
            events: CartEvents::new(),
            write_lock: ReentrantMutex::new(()),
        }
    }

    /// Create a store persisting under a custom key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not a valid storage key or is one of
    /// the session keys.
    pub fn with_key(storage: S, key: impl Into<String>) -> std::result::Result<Self, StorageError> {
        let key = key.into();
        validate_cart_key(&key)?;
        Ok(Self {
            key,
            ..Self::new(storage)
        })
    }

    /// The underlying storage.
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// The storage key of the cart entry.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The change notification registry.
    pub const fn events(&self) -> &CartEvents {
        &self.events
    }

    /// Register a change handler. See [`CartEvents::subscribe`].
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&CartEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(handler)
    }

    /// Current cart lines in insertion order.
    ///
    /// An absent or unreadable entry, or one that is not a JSON array, reads
    /// as an empty cart. Array elements that do not parse as a line are
    /// dropped one by one. Persisted lines that break the cart invariants are
    /// repaired in the returned value (see [`sanitize`]); the next mutation
    /// persists the repaired form.
    pub fn read(&self) -> Vec<CartLine> {
        let raw = match self.storage.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "cart storage unreadable, treating as empty");
                return Vec::new();
            }
        };

        let entries = match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "malformed cart entry, treating as empty");
                return Vec::new();
            }
        };

        let lines = entries
            .into_iter()
            .enumerate()
            .filter_map(|(position, entry)| {
                serde_json::from_value::<CartLine>(entry)
                    .inspect_err(|e| {
                        tracing::warn!(key = %self.key, position, error = %e, "dropping malformed cart line");
                    })
                    .ok()
            })
            .collect();
        sanitize(lines)
    }

    /// Add `quantity` units of `product`.
    ///
    /// A product already in the cart has its line quantity increased and its
    /// stock ceiling refreshed from `product`; name, price and image keep
    /// their original snapshot. Otherwise a new line is appended.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidInput`] if the product has no id, its price is
    ///   not a finite non-negative number, or `quantity` is zero.
    /// - [`CartError::InsufficientStock`] if the resulting line quantity
    ///   would exceed `product.current_stock`.
    /// - [`CartError::Storage`] if the cart cannot be persisted.
    ///
    /// On error nothing is persisted and no notification is sent.
    #[instrument(skip(self, product), fields(product_id = ?product.id))]
    pub fn add(&self, product: &ProductSnapshot, quantity: u32) -> Result<AddOutcome> {
        let id = product
            .id
            .clone()
            .ok_or_else(|| CartError::InvalidInput("product is missing an id".to_string()))?;
        let price = Price::new(product.price)
            .map_err(|e| CartError::InvalidInput(format!("product {id}: {e}")))?;
        if quantity == 0 {
            return Err(CartError::InvalidInput(
                "quantity must be at least 1".to_string(),
            ));
        }
        let available = product.current_stock;
        if quantity > available {
            return Err(CartError::InsufficientStock {
                available,
                requested: u64::from(quantity),
            });
        }

        let _guard = self.write_lock.lock();
        let mut lines = self.read();

        let outcome = if let Some(line) = lines.iter_mut().find(|line| line.id == id) {
            let combined = u64::from(line.quantity) + u64::from(quantity);
            if combined > u64::from(available) {
                tracing::debug!(existing = line.quantity, requested = quantity, available, "add rejected");
                return Err(CartError::InsufficientStock {
                    available,
                    requested: combined,
                });
            }
            line.quantity += quantity;
            line.current_stock = available;
            AddOutcome::Increased {
                quantity: line.quantity,
            }
        } else {
            lines.push(CartLine::from_product(id.clone(), product, price, quantity));
            AddOutcome::NewLine { quantity }
        };

        self.commit(
            lines,
            CartChange::Added {
                id,
                quantity: outcome.quantity(),
            },
        )?;
        Ok(outcome)
    }

    /// Remove the line for `id`.
    ///
    /// Returns `true` if a line was removed. Removing a product that is not in
    /// the cart is a no-op: nothing is persisted and no notification is sent.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if the cart cannot be persisted.
    #[instrument(skip(self))]
    pub fn remove(&self, id: &ProductId) -> Result<bool> {
        let _guard = self.write_lock.lock();
        self.remove_locked(self.read(), id)
    }

    /// Set the quantity of the line for `id`.
    ///
    /// A quantity of zero or below removes the line.
    ///
    /// # Errors
    ///
    /// - [`CartError::NotFound`] if no line matches `id`.
    /// - [`CartError::InsufficientStock`] if `new_quantity` exceeds the line's
    ///   stock ceiling; the line is left unchanged.
    /// - [`CartError::Storage`] if the cart cannot be persisted.
    #[instrument(skip(self))]
    pub fn update_quantity(&self, id: &ProductId, new_quantity: i64) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.update_locked(self.read(), id, |_| new_quantity)
    }

    /// Increase the line for `id` by one unit.
    ///
    /// # Errors
    ///
    /// Same as [`CartStore::update_quantity`].
    #[instrument(skip(self))]
    pub fn increment(&self, id: &ProductId) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.update_locked(self.read(), id, |current| i64::from(current) + 1)
    }

    /// Decrease the line for `id` by one unit, removing it at zero.
    ///
    /// # Errors
    ///
    /// Same as [`CartStore::update_quantity`].
    #[instrument(skip(self))]
    pub fn decrement(&self, id: &ProductId) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.update_locked(self.read(), id, |current| i64::from(current) - 1)
    }

    /// Delete the persisted cart.
    ///
    /// Always notifies subscribers with an empty snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if the entry cannot be removed.
    #[instrument(skip(self))]
    pub fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.storage.remove(&self.key)?;
        self.events.emit(CartChange::Cleared, Vec::new());
        Ok(())
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> u64 {
        self.read().iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.read().len()
    }

    /// Sum of `price * quantity` over all lines.
    pub fn total(&self) -> f64 {
        self.read()
            .iter()
            .map(|line| line.line_total().amount())
            .sum()
    }

    fn update_locked(
        &self,
        mut lines: Vec<CartLine>,
        id: &ProductId,
        target: impl FnOnce(u32) -> i64,
    ) -> Result<()> {
        let Some(line) = lines.iter_mut().find(|line| &line.id == id) else {
            return Err(CartError::NotFound(id.clone()));
        };
        let new_quantity = target(line.quantity);

        if new_quantity > i64::from(line.current_stock) {
            return Err(CartError::InsufficientStock {
                available: line.current_stock,
                requested: new_quantity.unsigned_abs(),
            });
        }
        let quantity = match u32::try_from(new_quantity) {
            Ok(quantity) if quantity > 0 => quantity,
            _ => return self.remove_locked(lines, id).map(|_| ()),
        };

        line.quantity = quantity;
        self.commit(
            lines,
            CartChange::QuantityChanged {
                id: id.clone(),
                quantity,
            },
        )
    }

    fn remove_locked(&self, mut lines: Vec<CartLine>, id: &ProductId) -> Result<bool> {
        let before = lines.len();
        lines.retain(|line| &line.id != id);
        if lines.len() == before {
            tracing::debug!(product_id = %id, "remove of absent line ignored");
            return Ok(false);
        }
        self.commit(lines, CartChange::Removed { id: id.clone() })?;
        Ok(true)
    }

    fn commit(&self, lines: Vec<CartLine>, change: CartChange) -> Result<()> {
        let serialized = serde_json::to_string(&lines)?;
        self.storage.set(&self.key, &serialized)?;
        tracing::debug!(key = %self.key, lines = lines.len(), ?change, "cart persisted");
        self.events.emit(change, lines);
        Ok(())
    }
}

impl<S> std::fmt::Debug for CartStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("key", &self.key)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

/// Repair persisted lines that break the cart invariants.
///
/// - lines with zero quantity or zero stock are dropped
/// - lines with a negative or non-finite price are dropped
/// - a quantity above the stock ceiling is lowered to the ceiling
/// - repeated ids keep only their first line
#[must_use]
pub fn sanitize(lines: Vec<CartLine>) -> Vec<CartLine> {
    let mut clean: Vec<CartLine> = Vec::with_capacity(lines.len());
    for mut line in lines {
        let amount = line.price.amount();
        if line.quantity == 0 || line.current_stock == 0 || !amount.is_finite() || amount < 0.0 {
            tracing::warn!(product_id = %line.id, "dropping invalid persisted cart line");
            continue;
        }
        if clean.iter().any(|existing| existing.id == line.id) {
            tracing::warn!(product_id = %line.id, "dropping duplicate persisted cart line");
            continue;
        }
        if line.quantity > line.current_stock {
            tracing::warn!(
                product_id = %line.id,
                quantity = line.quantity,
                current_stock = line.current_stock,
                "clamping persisted quantity to stock"
            );
            line.quantity = line.current_stock;
        }
        clean.push(line);
    }
    clean
}
