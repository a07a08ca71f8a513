//! View models derived from the cart.
//!
//! Views never mutate the cart. They render from [`CartStore::read`] and
//! re-render after each change notification.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use tienda_core::Price;

use crate::error::{CartError, Result};
use crate::events::{CartEvent, Subscription};
use crate::line::CartLine;
use crate::storage::CartStorage;
use crate::store::CartStore;

/// Navbar badge state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartBadge {
    /// Total units in the cart.
    pub count: u64,
    /// Whether the badge is shown (only when the cart is non-empty).
    pub visible: bool,
}

impl CartBadge {
    /// Badge for a unit count.
    #[must_use]
    pub const fn new(count: u64) -> Self {
        Self {
            count,
            visible: count > 0,
        }
    }

    /// Badge for the current state of a store.
    pub fn from_store<S: CartStorage>(store: &CartStore<S>) -> Self {
        Self::new(store.item_count())
    }
}

/// One rendered cart row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemView {
    /// Product ID as text.
    pub id: String,
    /// Product name.
    pub name: String,
    /// Units in the cart.
    pub quantity: u32,
    /// Upper bound for the quantity input.
    pub max_quantity: u32,
    /// Unit price, formatted as currency.
    pub price: String,
    /// Unit price times quantity, formatted as currency.
    pub line_price: String,
    /// Product image, if any.
    pub image_url: Option<String>,
    /// Stock line shown under the product, e.g. `Stock available: 3`.
    pub stock_note: String,
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.id.to_string(),
            name: line.name.clone(),
            quantity: line.quantity,
            max_quantity: line.current_stock,
            price: line.price.display(),
            line_price: line.line_total().display(),
            image_url: line.image_url.clone(),
            stock_note: format!("Stock available: {}", line.current_stock),
        }
    }
}

/// Rendered cart page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    /// Rows in insertion order.
    pub items: Vec<CartItemView>,
    /// Sum of line prices, formatted as currency.
    pub subtotal: String,
    /// Amount due. Equal to the subtotal; there are no fees or discounts.
    pub total: String,
    /// Units across all lines.
    pub item_count: u64,
    /// Number of distinct products.
    pub line_count: usize,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_lines(&[])
    }

    /// Render a set of lines.
    #[must_use]
    pub fn from_lines(lines: &[CartLine]) -> Self {
        let total: f64 = lines.iter().map(|line| line.line_total().amount()).sum();
        let total = Price::from(total).display();
        Self {
            items: lines.iter().map(CartItemView::from).collect(),
            subtotal: total.clone(),
            total,
            item_count: lines.iter().map(|line| u64::from(line.quantity)).sum(),
            line_count: lines.len(),
        }
    }

    /// Render the current state of a store.
    pub fn from_store<S: CartStorage>(store: &CartStore<S>) -> Self {
        Self::from_lines(&store.read())
    }

    /// Whether the empty-state panel should be shown instead of the table.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Badge matching this view.
    #[must_use]
    pub const fn badge(&self) -> CartBadge {
        CartBadge::new(self.item_count)
    }
}

/// Parse a quantity typed into the cart page.
///
/// Accepts an optional sign followed by digits, ignoring surrounding
/// whitespace and anything after the digits (`"3 units"` is 3).
///
/// # Errors
///
/// Returns [`CartError::InvalidInput`] if no number can be read or it is
/// below 1.
pub fn parse_quantity_input(raw: &str) -> Result<u32> {
    let trimmed = raw.trim();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits: String = unsigned.chars().take_while(char::is_ascii_digit).collect();

    if digits.is_empty() {
        return Err(CartError::InvalidInput(format!(
            "{raw:?} is not a quantity"
        )));
    }
    if negative {
        return Err(CartError::InvalidInput(
            "quantity must be at least 1".to_string(),
        ));
    }
    match digits.parse::<u32>() {
        Ok(0) => Err(CartError::InvalidInput(
            "quantity must be at least 1".to_string(),
        )),
        Ok(quantity) => Ok(quantity),
        Err(_) => Err(CartError::InvalidInput(format!(
            "{raw:?} is too large"
        ))),
    }
}

/// Cart page view kept in sync with a store.
///
/// On every change notification the view re-reads the store and re-renders.
/// Dropping the view model unsubscribes it.
pub struct CartViewModel {
    view: Arc<Mutex<CartView>>,
    renders: Arc<Mutex<u64>>,
    _subscription: Subscription,
}

impl CartViewModel {
    /// Render the store now and keep re-rendering after each change.
    pub fn attach<S>(store: &Arc<CartStore<S>>) -> Self
    where
        S: CartStorage + 'static,
    {
        let view = Arc::new(Mutex::new(CartView::from_store(store)));
        let renders = Arc::new(Mutex::new(1));

        let weak: Weak<CartStore<S>> = Arc::downgrade(store);
        let target = Arc::clone(&view);
        let counter = Arc::clone(&renders);
        let subscription = store.subscribe(move |event: &CartEvent| {
            let rendered = weak.upgrade().map_or_else(
                || CartView::from_lines(&event.snapshot),
                |store| CartView::from_store(&store),
            );
            *target.lock() = rendered;
            *counter.lock() += 1;
        });

        Self {
            view,
            renders,
            _subscription: subscription,
        }
    }

    /// The most recently rendered view.
    #[must_use]
    pub fn current(&self) -> CartView {
        self.view.lock().clone()
    }

    /// How many times the view has been rendered, including the initial render.
    #[must_use]
    pub fn render_count(&self) -> u64 {
        *self.renders.lock()
    }
}
