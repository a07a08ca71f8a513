//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! tienda cart add --id 1 --name "Desk lamp" --price 15 --stock 3
//! tienda cart add --json '{"id": 2, "name": "Mug", "price": "3.50", "stock": 4}'
//! tienda cart inc 1
//! tienda cart show
//! tienda cart clear --yes
//! ```
//!
//! `show`, `update`, `inc` and `dec` stand in for the cart page and need a
//! signed-in session.

use std::io::Write;

use tienda_cart::session::{self, Access, CheckoutOutcome};
use tienda_cart::view::{CartBadge, CartView, parse_quantity_input};
use tienda_cart::AddOutcome;
use tienda_core::{Price, ProductId, ProductSnapshot, StockLevel};

use super::{CommandError, Context};

/// Product details given on the command line.
pub struct NewProduct {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    pub stock: u32,
    pub image_url: Option<String>,
}

impl NewProduct {
    fn into_snapshot(self) -> Result<ProductSnapshot, CommandError> {
        if self.name.trim().is_empty() {
            return Err(CommandError::InvalidArgument("name must not be empty".to_string()));
        }
        let snapshot = ProductSnapshot::new(self.id, self.name, self.price, self.stock);
        Ok(match self.image_url {
            Some(url) => snapshot.with_image_url(url),
            None => snapshot,
        })
    }
}

/// Where the product being added comes from.
pub enum ProductInput {
    /// Individual flags.
    Flags(NewProduct),
    /// A product object as returned by the listing API.
    Json(String),
}

impl ProductInput {
    fn into_snapshot(self) -> Result<ProductSnapshot, CommandError> {
        match self {
            Self::Flags(product) => product.into_snapshot(),
            Self::Json(raw) => serde_json::from_str(&raw)
                .map_err(|e| CommandError::InvalidArgument(format!("product json: {e}"))),
        }
    }
}

fn require_cart_page(ctx: &Context) -> Result<(), CommandError> {
    match session::cart_page_access(&ctx.session) {
        Access::Granted => Ok(()),
        Access::RedirectToLogin => Err(CommandError::LoginRequired),
    }
}

/// Print the cart as a table followed by the total.
pub fn show(ctx: &Context, out: &mut impl Write) -> Result<(), CommandError> {
    require_cart_page(ctx)?;
    let view = CartView::from_store(&ctx.store);
    if view.is_empty() {
        writeln!(out, "Your cart is empty")?;
        return Ok(());
    }

    for item in &view.items {
        writeln!(
            out,
            "{:<8} {:<28} {:>4} x {:>10} = {:>10}  ({})",
            item.id, item.name, item.quantity, item.price, item.line_price, item.stock_note
        )?;
    }
    writeln!(out, "Subtotal: {}", view.subtotal)?;
    writeln!(out, "Total:    {}", view.total)?;
    Ok(())
}

/// Print the badge count.
pub fn count(ctx: &Context, out: &mut impl Write) -> Result<(), CommandError> {
    let badge = CartBadge::from_store(&ctx.store);
    writeln!(out, "{}", badge.count)?;
    Ok(())
}

/// Add a product to the cart.
///
/// Out-of-stock products are refused before the cart is touched, the same way
/// a listing disables its add button.
pub fn add(
    ctx: &Context,
    out: &mut impl Write,
    product: ProductInput,
    quantity: u32,
) -> Result<(), CommandError> {
    let product = product.into_snapshot()?;
    let level = product.stock_level();
    if !level.can_add_to_cart() {
        return Err(CommandError::OutOfStock(product.name));
    }
    let outcome = ctx.store.add(&product, quantity)?;

    tracing::info!(product = %product.name, quantity, stock_level = %level, "added to cart");
    match outcome {
        AddOutcome::NewLine { .. } => writeln!(out, "Added {} to the cart", product.name)?,
        AddOutcome::Increased { quantity } => {
            writeln!(out, "{} now has {quantity} in the cart", product.name)?;
        }
    }
    if level == StockLevel::Low {
        writeln!(out, "Only {} left in stock", product.current_stock)?;
    }
    Ok(())
}

/// Remove a product from the cart.
pub fn remove(ctx: &Context, out: &mut impl Write, id: &ProductId) -> Result<(), CommandError> {
    if ctx.store.remove(id)? {
        writeln!(out, "Removed {id} from the cart")?;
    } else {
        writeln!(out, "{id} is not in the cart")?;
    }
    Ok(())
}

/// Set the quantity of a line from user input.
pub fn update(
    ctx: &Context,
    out: &mut impl Write,
    id: &ProductId,
    raw_quantity: &str,
) -> Result<(), CommandError> {
    require_cart_page(ctx)?;
    let quantity = parse_quantity_input(raw_quantity)?;
    ctx.store.update_quantity(id, i64::from(quantity))?;
    writeln!(out, "{id} now has {quantity} in the cart")?;
    Ok(())
}

/// Add one unit to a line.
pub fn increment(ctx: &Context, out: &mut impl Write, id: &ProductId) -> Result<(), CommandError> {
    require_cart_page(ctx)?;
    ctx.store.increment(id)?;
    print_line_quantity(ctx, out, id)
}

/// Take one unit from a line, removing it at zero.
pub fn decrement(ctx: &Context, out: &mut impl Write, id: &ProductId) -> Result<(), CommandError> {
    require_cart_page(ctx)?;
    ctx.store.decrement(id)?;
    print_line_quantity(ctx, out, id)
}

/// Empty the cart. Requires `confirmed`.
pub fn clear(ctx: &Context, out: &mut impl Write, confirmed: bool) -> Result<(), CommandError> {
    if !confirmed {
        writeln!(out, "Pass --yes to empty the cart")?;
        return Ok(());
    }
    ctx.store.clear()?;
    writeln!(out, "Cart emptied")?;
    Ok(())
}

/// Start checkout for the signed-in user.
pub fn checkout(ctx: &Context, out: &mut impl Write) -> Result<(), CommandError> {
    match session::checkout(&ctx.store, &ctx.session)? {
        CheckoutOutcome::NotAvailable { item_count, total } => {
            writeln!(
                out,
                "Checkout is not available yet ({item_count} items, {})",
                total.display()
            )?;
        }
    }
    Ok(())
}

fn print_line_quantity(
    ctx: &Context,
    out: &mut impl Write,
    id: &ProductId,
) -> Result<(), CommandError> {
    let line = ctx.store.read().into_iter().find(|line| &line.id == id);
    match line {
        Some(line) => writeln!(
            out,
            "{id} now has {} in the cart ({})",
            line.quantity,
            line.line_total().display()
        )?,
        None => writeln!(out, "Removed {id} from the cart")?,
    }
    writeln!(out, "Total: {}", Price::from(ctx.store.total()).display())?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use tienda_cart::session::CurrentUser;
    use tienda_cart::CartConfig;

    use super::*;

    fn context(dir: &tempfile::TempDir) -> Context {
        let config = CartConfig {
            storage_dir: dir.path().to_path_buf(),
            ..CartConfig::default()
        };
        Context::open(&config).unwrap()
    }

    fn signed_in(dir: &tempfile::TempDir) -> Context {
        let ctx = context(dir);
        ctx.session
            .sign_in(
                &SecretString::from("token-123".to_string()),
                &CurrentUser::default(),
            )
            .unwrap();
        ctx
    }

    fn lamp(stock: u32) -> ProductInput {
        ProductInput::Flags(NewProduct {
            id: ProductId::from(1_u32),
            name: "Desk lamp".to_string(),
            price: 15.0,
            stock,
            image_url: None,
        })
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_add_then_show() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = signed_in(&dir);

        let mut buf = Vec::new();
        add(&ctx, &mut buf, lamp(3), 2).unwrap();
        assert_eq!(output(buf), "Added Desk lamp to the cart\n");

        let mut buf = Vec::new();
        show(&ctx, &mut buf).unwrap();
        let text = output(buf);
        assert!(text.contains("Desk lamp"));
        assert!(text.contains("Total:    $30.00"));
    }

    #[test]
    fn test_add_over_stock_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let err = add(&ctx, &mut Vec::new(), lamp(1), 2).unwrap_err();
        assert_eq!(err.to_string(), "Insufficient stock. Available: 1");
    }

    #[test]
    fn test_blank_name_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let product = ProductInput::Flags(NewProduct {
            id: ProductId::from(1_u32),
            name: "  ".to_string(),
            price: 15.0,
            stock: 3,
            image_url: None,
        });
        assert!(matches!(
            add(&ctx, &mut Vec::new(), product, 1),
            Err(CommandError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_add_from_listing_json() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let listing = r#"{"id": 31, "name": "Notebook", "price": "2.75", "stock": "6", "stock_minimo": 2}"#;

        let mut buf = Vec::new();
        add(&ctx, &mut buf, ProductInput::Json(listing.to_string()), 2).unwrap();
        assert_eq!(output(buf), "Added Notebook to the cart\n");

        let lines = ctx.store.read();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].id, ProductId::from(31_u32));
        assert_eq!(lines[0].current_stock, 6);
        assert!((ctx.store.total() - 5.5).abs() < 1e-9);
    }

    #[test]
    fn test_add_low_stock_notes_remaining() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let listing = r#"{"id": 4, "name": "Mug", "price": 3.5, "stock": 2, "stock_minimo": 5}"#;

        let mut buf = Vec::new();
        add(&ctx, &mut buf, ProductInput::Json(listing.to_string()), 1).unwrap();
        assert_eq!(output(buf), "Added Mug to the cart\nOnly 2 left in stock\n");
    }

    #[test]
    fn test_add_out_of_stock_refused() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let listing = r#"{"id": 4, "name": "Mug", "price": 3.5, "stock": null}"#;

        let err = add(&ctx, &mut Vec::new(), ProductInput::Json(listing.to_string()), 1)
            .unwrap_err();
        assert!(matches!(err, CommandError::OutOfStock(ref name) if name == "Mug"));
        assert_eq!(err.to_string(), "Mug is out of stock");
        assert_eq!(ctx.store.line_count(), 0);

        assert!(matches!(
            add(&ctx, &mut Vec::new(), lamp(0), 1),
            Err(CommandError::OutOfStock(_))
        ));
    }

    #[test]
    fn test_add_rejects_unparseable_json() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let err = add(&ctx, &mut Vec::new(), ProductInput::Json("{oops".to_string()), 1)
            .unwrap_err();
        assert!(err.to_string().starts_with("Invalid argument: product json"));
    }

    #[test]
    fn test_update_parses_input() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = signed_in(&dir);
        add(&ctx, &mut Vec::new(), lamp(5), 1).unwrap();

        update(&ctx, &mut Vec::new(), &ProductId::from(1_u32), "4 units").unwrap();
        assert_eq!(ctx.store.item_count(), 4);

        assert!(update(&ctx, &mut Vec::new(), &ProductId::from(1_u32), "zero").is_err());
        assert_eq!(ctx.store.item_count(), 4);
    }

    #[test]
    fn test_update_negative_quantity_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = signed_in(&dir);
        add(&ctx, &mut Vec::new(), lamp(5), 2).unwrap();

        let err = update(&ctx, &mut Vec::new(), &ProductId::from(1_u32), "-1").unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: quantity must be at least 1");
        assert_eq!(ctx.store.item_count(), 2);
    }

    #[test]
    fn test_decrement_to_removal() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = signed_in(&dir);
        add(&ctx, &mut Vec::new(), lamp(5), 1).unwrap();

        let mut buf = Vec::new();
        decrement(&ctx, &mut buf, &ProductId::from(1_u32)).unwrap();
        assert!(output(buf).starts_with("Removed 1 from the cart"));
        assert_eq!(ctx.store.line_count(), 0);
    }

    #[test]
    fn test_cart_page_commands_require_session() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let id = ProductId::from(1_u32);
        add(&ctx, &mut Vec::new(), lamp(5), 2).unwrap();

        assert!(matches!(show(&ctx, &mut Vec::new()), Err(CommandError::LoginRequired)));
        assert!(matches!(
            update(&ctx, &mut Vec::new(), &id, "3"),
            Err(CommandError::LoginRequired)
        ));
        assert!(matches!(
            increment(&ctx, &mut Vec::new(), &id),
            Err(CommandError::LoginRequired)
        ));
        assert!(matches!(
            decrement(&ctx, &mut Vec::new(), &id),
            Err(CommandError::LoginRequired)
        ));
        assert_eq!(ctx.store.item_count(), 2);

        let mut buf = Vec::new();
        count(&ctx, &mut buf).unwrap();
        assert_eq!(output(buf), "2\n");
    }

    #[test]
    fn test_clear_requires_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        add(&ctx, &mut Vec::new(), lamp(5), 1).unwrap();

        clear(&ctx, &mut Vec::new(), false).unwrap();
        assert_eq!(ctx.store.item_count(), 1);

        clear(&ctx, &mut Vec::new(), true).unwrap();
        assert_eq!(ctx.store.item_count(), 0);
    }

    #[test]
    fn test_count_and_empty_show() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = signed_in(&dir);

        let mut buf = Vec::new();
        count(&ctx, &mut buf).unwrap();
        assert_eq!(output(buf), "0\n");

        let mut buf = Vec::new();
        show(&ctx, &mut buf).unwrap();
        assert_eq!(output(buf), "Your cart is empty\n");
    }

    #[test]
    fn test_checkout_without_session() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        add(&ctx, &mut Vec::new(), lamp(5), 1).unwrap();
        assert!(matches!(
            checkout(&ctx, &mut Vec::new()),
            Err(CommandError::Checkout(_))
        ));
    }
}
