//! Cart commands.

use anyhow::{Context as _, Result};
use serde_json::json;
use turbo_commerce::cart::{CartLines, SyncOutcome};
use turbo_commerce::catalog::Product;
use turbo_commerce::{CartError, ProductId, SubcategoryId};

use super::{CartArgs, CartCommand};
use crate::context::Context;
use crate::output::{format_price, sync_badge};

/// Run the cart command.
pub async fn run(args: CartArgs, ctx: &Context) -> Result<()> {
    match args.command {
        Some(CartCommand::Show) | None => show_cart(ctx),
        Some(CartCommand::Add {
            product,
            quantity,
            subcategory,
            name,
            price,
        }) => {
            let product_id = ProductId::from(product);
            let snapshot = match subcategory {
                Some(sub) => listed_product(product_id, SubcategoryId::from(sub), ctx).await?,
                None => Product::new(product_id, name, price),
            };
            add_to_cart(snapshot, quantity, ctx).await
        }
        Some(CartCommand::Sync) => sync_cart(ctx).await,
    }
}

fn show_cart(ctx: &Context) -> Result<()> {
    let store = ctx.storefront()?;
    let lines = store.cart().lines();

    if ctx.output.is_json() {
        ctx.output.json(&lines);
        return Ok(());
    }

    print_lines(&lines, ctx);
    Ok(())
}

/// The product as the subcategory listing currently shows it.
async fn listed_product(
    product_id: ProductId,
    subcategory: SubcategoryId,
    ctx: &Context,
) -> Result<Product> {
    let store = ctx.storefront()?;
    let products = store
        .api()
        .subcategory_products(subcategory)
        .await
        .with_context(|| format!("Failed to load products of subcategory {}", subcategory))?;
    match products.into_iter().find(|p| p.id == product_id) {
        Some(product) => Ok(product),
        None => anyhow::bail!(
            "Product {} is not listed under subcategory {}",
            product_id,
            subcategory
        ),
    }
}

async fn add_to_cart(product: Product, quantity: u32, ctx: &Context) -> Result<()> {
    let store = ctx.storefront()?;
    let product_id = product.id;

    let feedback = store.add_feedback();
    feedback.trigger();

    let sync = match store.cart().add_to_cart(&product, quantity) {
        Ok(sync) => sync,
        Err(CartError::Unauthenticated) => {
            anyhow::bail!("Not signed in. Run `storefront login` first.")
        }
        Err(e) => return Err(e).context("Failed to add to cart"),
    };

    if sync.persisted() {
        ctx.output.success(&format!(
            "Added {} x {} (local cart now {} lines)",
            quantity,
            product_id,
            sync.optimistic().len()
        ));
    } else {
        ctx.output
            .warn("Local cart could not be saved, waiting for the server cart");
    }
    let optimistic = sync.optimistic().clone();
    let persisted = sync.persisted();

    let outcome = sync.settled().await;
    feedback.mark_added();

    let (label, detail) = match &outcome {
        SyncOutcome::Reconciled { lines } => ("reconciled", format!("server cart has {} lines", lines)),
        SyncOutcome::Kept { error } => ("kept", format!("server add failed: {}", error)),
        SyncOutcome::Discarded => ("discarded", "response ignored".to_string()),
    };

    if ctx.output.is_json() {
        ctx.output.json(&json!({
            "optimistic": optimistic,
            "persisted": persisted,
            "outcome": label,
            "detail": detail,
            "cart": store.cart().lines(),
        }));
        return Ok(());
    }

    ctx.output.kv("sync", &sync_badge(label));
    ctx.output.kv("detail", &detail);
    print_lines(&store.cart().lines(), ctx);
    Ok(())
}

async fn sync_cart(ctx: &Context) -> Result<()> {
    let store = ctx.storefront()?;
    let lines = match store.cart().refresh().await {
        Ok(lines) => lines,
        Err(CartError::Unauthenticated) => {
            anyhow::bail!("Not signed in. Run `storefront login` first.")
        }
        Err(e) => return Err(e).context("Failed to fetch the server cart"),
    };

    if ctx.output.is_json() {
        ctx.output.json(&lines);
        return Ok(());
    }

    ctx.output.success("Local cart replaced with the server cart");
    print_lines(&lines, ctx);
    Ok(())
}

fn print_lines(lines: &CartLines, ctx: &Context) {
    ctx.output.header("Cart");
    if lines.is_empty() {
        ctx.output.info("Cart is empty.");
        return;
    }

    ctx.output
        .table_row(&["PRODUCT", "NAME", "QTY", "PRICE"], &[8, 30, 5, 10]);
    for line in lines.iter() {
        let (name, price) = match line.product {
            Some(ref p) => (p.name.as_str(), format_price(p.price)),
            None => ("", "-".to_string()),
        };
        ctx.output.table_row(
            &[
                &line.product_id.to_string(),
                name,
                &line.quantity.to_string(),
                &price,
            ],
            &[8, 30, 5, 10],
        );
    }
    ctx.output.kv("items", &lines.total_quantity().to_string());
    ctx.output.kv("subtotal", &format_price(lines.subtotal()));
}
