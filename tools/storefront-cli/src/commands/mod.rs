//! CLI command implementations.

pub mod cart;
pub mod catalog;
pub mod config;
pub mod session;

use clap::{Args, Subcommand};

/// Arguments for the categories command.
#[derive(Args)]
pub struct CategoriesArgs {
    /// Show the flat home page list instead of the navigation tree.
    #[arg(long)]
    pub home: bool,
}

/// Arguments for the subcategories command.
#[derive(Args)]
pub struct SubcategoriesArgs {
    /// Category id.
    pub category: u64,
}

/// Arguments for the attributes command.
#[derive(Args)]
pub struct AttributesArgs {
    /// Subcategory id.
    pub subcategory: u64,
}

/// Arguments for the products command.
#[derive(Args)]
pub struct ProductsArgs {
    /// Subcategory id.
    pub subcategory: u64,
}

/// Arguments for the cart command.
#[derive(Args)]
pub struct CartArgs {
    #[command(subcommand)]
    pub command: Option<CartCommand>,
}

#[derive(Subcommand)]
pub enum CartCommand {
    /// Show the local cart
    Show,

    /// Add a product and wait for the server to confirm
    Add {
        /// Product id.
        product: u64,

        /// Quantity to add.
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Take the product snapshot from this subcategory's listing.
        #[arg(long, conflicts_with_all = ["name", "price"])]
        subcategory: Option<u64>,

        /// Product name stored with the line.
        #[arg(long, default_value = "")]
        name: String,

        /// Unit price stored with the line.
        #[arg(long, default_value_t = 0.0)]
        price: f64,
    },

    /// Replace the local cart with the server cart
    Sync,
}

/// Arguments for the login command.
#[derive(Args)]
pub struct LoginArgs {
    /// Bearer token issued by the backend.
    #[arg(long, env = "STOREFRONT_TOKEN")]
    pub token: String,

    /// User record as a JSON object.
    #[arg(long)]
    pub user: String,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Create a storefront.toml in the current directory
    Init {
        /// Overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}
