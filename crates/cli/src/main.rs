//! Woala CLI - browse the catalog, fill the cart and check out from a terminal.
//!
//! The cart lives in a file-backed store under `WOALA_DATA_DIR`, so it
//! survives between invocations the way the browser cart survives a reload.
//!
//! # Usage
//!
//! ```bash
//! # List products
//! woala products
//!
//! # Add two of product 3, then look at the cart
//! woala add 3 -q 2
//! woala cart
//!
//! # Pay cash on delivery
//! woala checkout --first-name Ada --last-name Lovelace --email ada@example.com \
//!     --phone 5550000000 --address "1 Analytical St" --city Izmir \
//!     --postal-code 35000 --payment cod
//! ```
//!
//! # Commands
//!
//! - `products` / `show` - Browse the catalog
//! - `add` / `buy` / `set` / `remove` / `cart` - Manage the cart
//! - `checkout` - Validate the form and place the order

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use woala_core::ProductId;
use woala_storefront::{AppError, Catalog, StorefrontConfig, load_catalog};

mod commands;

use commands::ConsoleNavigator;
use commands::checkout::CheckoutArgs;

#[derive(Parser)]
#[command(name = "woala")]
#[command(author, version, about = "Woala storefront in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every product in the catalog
    Products,
    /// Show one product's details
    Show {
        /// Product ID
        id: ProductId,
    },
    /// Add a product to the cart
    Add {
        /// Product ID
        id: ProductId,

        /// Number of units
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Add a product and go straight to checkout
    Buy {
        /// Product ID
        id: ProductId,

        /// Number of units
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a cart line's quantity (1-10)
    Set {
        /// Product ID
        id: ProductId,

        /// New quantity
        quantity: u32,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Show the cart and order summary
    Cart,
    /// Fill in the checkout form and place the order
    Checkout(CheckoutArgs),
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "woala_storefront=info,woala_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    match run(cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.is_fault() {
                let event_id = sentry::capture_error(&e);
                tracing::error!(error = %e, sentry_event_id = %event_id, "Command failed");
            } else {
                tracing::debug!(error = %e, "Command rejected");
            }
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: &StorefrontConfig) -> Result<(), AppError> {
    // The product page redirects home when the catalog cannot be fetched.
    let catalog = if matches!(cli.command, Commands::Show { .. }) {
        let Some(catalog) = load_catalog(&config.catalog, &ConsoleNavigator).await else {
            return Ok(());
        };
        catalog
    } else {
        Catalog::load(&config.catalog).await?
    };
    let shop = commands::open_shop(config, catalog)?;

    match cli.command {
        Commands::Products => commands::catalog::list(&shop),
        Commands::Show { id } => commands::catalog::show(&shop, id)?,
        Commands::Add { id, quantity } => commands::cart::add(&shop, id, quantity)?,
        Commands::Buy { id, quantity } => commands::cart::buy(&shop, id, quantity)?,
        Commands::Set { id, quantity } => commands::cart::set(&shop, id, quantity)?,
        Commands::Remove { id } => commands::cart::remove(&shop, id)?,
        Commands::Cart => commands::cart::show(&shop)?,
        Commands::Checkout(args) => {
            commands::checkout::run(&shop, args, config.submit_timeout).await?;
        }
    }
    Ok(())
}
