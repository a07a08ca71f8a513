//! Integration tests for the Tienda cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tienda-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_scenarios` - Store behavior and invariants over memory storage
//! - `cart_persistence` - File storage, malformed data, several stores per origin
//! - `session_checkout` - Page access, checkout and logout
//!
//! This library holds the fixtures shared by those tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use parking_lot::Mutex;
use secrecy::SecretString;

use tienda_cart::session::{CurrentUser, StorageSession};
use tienda_cart::{CartEvent, CartStorage, CartStore, Subscription};
use tienda_core::{ProductId, ProductSnapshot, Role};

/// Product snapshot with a readable name.
///
/// # Panics
///
/// Panics if `id` is blank.
#[must_use]
pub fn product(id: &str, price: f64, stock: u32) -> ProductSnapshot {
    let id = ProductId::parse(id).unwrap_or_else(|e| panic!("fixture id {id:?}: {e}"));
    let name = format!("Product {id}");
    ProductSnapshot::new(id, name, price, stock)
}

/// Product ID from text.
///
/// # Panics
///
/// Panics if `raw` is blank.
#[must_use]
pub fn pid(raw: &str) -> ProductId {
    ProductId::parse(raw).unwrap_or_else(|e| panic!("fixture id {raw:?}: {e}"))
}

/// Collects every event delivered to one subscriber.
pub struct Recorder {
    events: Arc<Mutex<Vec<CartEvent>>>,
    _subscription: Subscription,
}

impl Recorder {
    /// Subscribe to `store` and start recording.
    pub fn attach<S: CartStorage>(store: &CartStore<S>) -> Self {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let subscription = store.subscribe(move |event| sink.lock().push(event.clone()));
        Self {
            events,
            _subscription: subscription,
        }
    }

    /// Events received so far.
    #[must_use]
    pub fn events(&self) -> Vec<CartEvent> {
        self.events.lock().clone()
    }

    /// Sequence numbers received so far.
    #[must_use]
    pub fn sequences(&self) -> Vec<u64> {
        self.events.lock().iter().map(|event| event.sequence).collect()
    }

    /// Number of events received so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether nothing has been received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

/// Sign a user in on `storage` with the given role.
///
/// # Panics
///
/// Panics if the session cannot be written.
pub fn sign_in<S: CartStorage>(storage: S, role: &str) -> StorageSession<S> {
    let session = StorageSession::new(storage);
    let user = CurrentUser {
        email: Some("ana@example.com".to_string()),
        role: Some(Role::new(role)),
        ..CurrentUser::default()
    };
    session
        .sign_in(&SecretString::from("test-token".to_string()), &user)
        .unwrap_or_else(|e| panic!("sign in: {e}"));
    session
}
