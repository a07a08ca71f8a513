//! Tienda CLI - shopping cart and session management.
//!
//! # Usage
//!
//! ```bash
//! # Sign in so checkout and the cart page are available
//! tienda session login --token abc123 --email ana@example.com
//!
//! # Add two units of a product with 3 in stock
//! tienda cart add --id 1 --name "Desk lamp" --price 15 --stock 3 --quantity 2
//!
//! # Show the cart, then change a quantity
//! tienda cart show
//! tienda cart update 1 3
//!
//! # Sign out (also clears the cart)
//! tienda session logout
//! ```
//!
//! # Commands
//!
//! - `cart` - Inspect and change the cart
//! - `session` - Sign in, sign out, show the current user

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tienda_core::ProductId;

mod commands;

#[derive(Parser)]
#[command(name = "tienda")]
#[command(author, version, about = "Tienda cart tools")]
struct Cli {
    /// Storage directory (overrides `TIENDA_CART_DIR`)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the signed-in session
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart contents and total
    Show,
    /// Print the number of units in the cart
    Count,
    /// Add a product to the cart
    Add {
        /// Product ID
        #[arg(long, required_unless_present = "json")]
        id: Option<ProductId>,

        /// Product name
        #[arg(long, required_unless_present = "json")]
        name: Option<String>,

        /// Unit price
        #[arg(long, required_unless_present = "json")]
        price: Option<f64>,

        /// Units currently in stock
        #[arg(long, required_unless_present = "json")]
        stock: Option<u32>,

        /// Product image URL
        #[arg(long)]
        image_url: Option<String>,

        /// Product object from the listing API, instead of the flags above
        #[arg(long, conflicts_with_all = ["id", "name", "price", "stock", "image_url"])]
        json: Option<String>,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Set the quantity of a product in the cart
    Update {
        /// Product ID
        id: ProductId,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: String,
    },
    /// Add one unit of a product already in the cart
    Inc {
        /// Product ID
        id: ProductId,
    },
    /// Take one unit of a product out of the cart
    Dec {
        /// Product ID
        id: ProductId,
    },
    /// Empty the cart
    Clear {
        /// Skip the confirmation check
        #[arg(long)]
        yes: bool,
    },
    /// Start checkout
    Checkout,
}

#[derive(Subcommand)]
enum SessionAction {
    /// Store a session token and user
    Login {
        /// Bearer token issued by the auth service
        #[arg(long)]
        token: String,

        /// User email
        #[arg(short, long)]
        email: Option<String>,

        /// User full name
        #[arg(short, long)]
        name: Option<String>,

        /// User role (`cliente`, `vendedor`, `admin`)
        #[arg(short, long, default_value = "cliente")]
        role: String,

        /// User ID
        #[arg(long)]
        user_id: Option<String>,
    },
    /// Sign out and clear the cart
    Logout,
    /// Show the signed-in user
    Whoami,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tienda_cart=info,tienda=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli);

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = commands::Context::load(cli.dir)?;
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&ctx, &mut out)?,
            CartAction::Count => commands::cart::count(&ctx, &mut out)?,
            CartAction::Add {
                id,
                name,
                price,
                stock,
                image_url,
                json,
                quantity,
            } => {
                let product = match (json, id, name, price, stock) {
                    (Some(json), ..) => commands::cart::ProductInput::Json(json),
                    (None, Some(id), Some(name), Some(price), Some(stock)) => {
                        commands::cart::ProductInput::Flags(commands::cart::NewProduct {
                            id,
                            name,
                            price,
                            stock,
                            image_url,
                        })
                    }
                    _ => {
                        return Err(commands::CommandError::InvalidArgument(
                            "--id, --name, --price and --stock are required without --json"
                                .to_string(),
                        )
                        .into());
                    }
                };
                commands::cart::add(&ctx, &mut out, product, quantity)?;
            }
            CartAction::Remove { id } => commands::cart::remove(&ctx, &mut out, &id)?,
            CartAction::Update { id, quantity } => {
                commands::cart::update(&ctx, &mut out, &id, &quantity)?;
            }
            CartAction::Inc { id } => commands::cart::increment(&ctx, &mut out, &id)?,
            CartAction::Dec { id } => commands::cart::decrement(&ctx, &mut out, &id)?,
            CartAction::Clear { yes } => commands::cart::clear(&ctx, &mut out, yes)?,
            CartAction::Checkout => commands::cart::checkout(&ctx, &mut out)?,
        },
        Commands::Session { action } => match action {
            SessionAction::Login {
                token,
                email,
                name,
                role,
                user_id,
            } => {
                let login = commands::session::Login {
                    token,
                    email,
                    full_name: name,
                    role,
                    user_id,
                };
                commands::session::login(&ctx, &mut out, login)?;
            }
            SessionAction::Logout => commands::session::logout(&ctx, &mut out)?,
            SessionAction::Whoami => commands::session::whoami(&ctx, &mut out)?,
        },
    }
    Ok(())
}
