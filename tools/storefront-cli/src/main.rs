//! Storefront CLI - Command line client for a TurboCommerce storefront.
//!
//! Commands:
//! - `storefront categories` - Navigation or home page categories
//! - `storefront subcategories <id>` - Subcategories of a category
//! - `storefront attributes <id>` - Filter attributes of a subcategory
//! - `storefront products <id>` - Products listed under a subcategory
//! - `storefront banners` / `storefront footer` - Home page listings
//! - `storefront cart` - Show, add to and sync the cart
//! - `storefront counts` - Header badge counts
//! - `storefront login` / `logout` / `whoami` - Stored credentials
//! - `storefront config` - Manage configuration

mod commands;
mod config;
mod context;
mod logging;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    AttributesArgs, CartArgs, CategoriesArgs, ConfigArgs, LoginArgs, ProductsArgs,
    SubcategoriesArgs,
};

/// Storefront CLI - Browse the catalog and manage the cart from a terminal
#[derive(Parser)]
#[command(name = "storefront")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List categories
    Categories(CategoriesArgs),

    /// List the subcategories of a category
    Subcategories(SubcategoriesArgs),

    /// List the filter attributes of a subcategory
    Attributes(AttributesArgs),

    /// List the products of a subcategory
    Products(ProductsArgs),

    /// List home page banners
    Banners,

    /// Show the footer taxonomy
    Footer,

    /// Show or change the cart
    Cart(CartArgs),

    /// Show unread message, order and cart counts
    Counts,

    /// Store a token and user record
    Login(LoginArgs),

    /// Clear stored credentials
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let output = output::Output::new(cli.verbose, cli.json);

    let config_path = cli.config.as_deref();
    let ctx = match context::Context::load(config_path, output.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::init(cli.verbose, cli.json, &ctx.config.log) {
        ctx.output.warn(&format!("Logging disabled: {:#}", e));
    }

    let result = match cli.command {
        Commands::Categories(args) => commands::catalog::categories(args, &ctx).await,
        Commands::Subcategories(args) => commands::catalog::subcategories(args, &ctx).await,
        Commands::Attributes(args) => commands::catalog::attributes(args, &ctx).await,
        Commands::Products(args) => commands::catalog::products(args, &ctx).await,
        Commands::Banners => commands::catalog::banners(&ctx).await,
        Commands::Footer => commands::catalog::footer(&ctx).await,
        Commands::Cart(args) => commands::cart::run(args, &ctx).await,
        Commands::Counts => commands::session::counts(&ctx).await,
        Commands::Login(args) => commands::session::login(args, &ctx).await,
        Commands::Logout => commands::session::logout(&ctx).await,
        Commands::Whoami => commands::session::whoami(&ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
