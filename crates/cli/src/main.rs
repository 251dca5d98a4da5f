//! Mangosteen CLI - Guest cart, cart merge, and theme tools.
//!
//! # Usage
//!
//! ```bash
//! # Add two units of product 7 to the guest cart
//! mg-cli cart add -p 7 -q 2 -n "Widget" --price 9.99
//!
//! # Show the guest cart
//! mg-cli cart list
//!
//! # Merge the guest cart into the signed-in storefront cart
//! mg-cli merge --page /cart
//!
//! # Flip the color theme
//! mg-cli theme toggle
//! ```
//!
//! # Commands
//!
//! - `cart` - Inspect and edit the locally stored guest cart
//! - `merge` - Push the guest cart to the storefront merge endpoint
//! - `theme` - Show or change the persisted color theme

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mg-cli")]
#[command(author, version, about = "Mangosteen CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and edit the guest cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Merge the guest cart into the signed-in storefront cart
    Merge {
        /// Page path reported to the merge flow (a path containing
        /// `/cart` schedules a reload after a successful merge)
        #[arg(short, long, default_value = "/")]
        page: String,
    },
    /// Show or change the color theme
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add units of a product to the guest cart
    Add {
        /// Product ID
        #[arg(short, long)]
        product_id: i64,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Product display name
        #[arg(short, long, default_value = "")]
        name: String,

        /// Unit price (e.g. `9.99`)
        #[arg(long, default_value = "0")]
        price: String,
    },
    /// Remove a product from the guest cart
    Remove {
        /// Product ID
        #[arg(short, long)]
        product_id: i64,
    },
    /// Set the exact quantity of a product (0 removes the line)
    Update {
        /// Product ID
        #[arg(short, long)]
        product_id: i64,

        /// New quantity
        #[arg(short, long)]
        quantity: u32,
    },
    /// List the guest cart lines
    List,
    /// Print the total unit count
    Count,
    /// Drop all guest cart state
    Clear,
}

#[derive(Subcommand)]
enum ThemeAction {
    /// Print the effective theme
    Get,
    /// Persist a theme choice
    Set {
        /// Theme to apply (`dark` or `light`)
        theme: String,
    },
    /// Flip the theme and print the new one
    Toggle,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Add {
                product_id,
                quantity,
                name,
                price,
            } => commands::cart::add(product_id, quantity, &name, &price)?,
            CartAction::Remove { product_id } => commands::cart::remove(product_id)?,
            CartAction::Update {
                product_id,
                quantity,
            } => commands::cart::update(product_id, quantity)?,
            CartAction::List => commands::cart::list()?,
            CartAction::Count => commands::cart::count()?,
            CartAction::Clear => commands::cart::clear()?,
        },
        Commands::Merge { page } => commands::merge::run(&page).await?,
        Commands::Theme { action } => match action {
            ThemeAction::Get => commands::theme::get()?,
            ThemeAction::Set { theme } => commands::theme::set(&theme)?,
            ThemeAction::Toggle => commands::theme::toggle()?,
        },
    }
    Ok(())
}
