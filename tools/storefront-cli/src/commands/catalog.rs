//! Catalog listing commands.

use anyhow::{Context as _, Result};
use turbo_commerce::catalog::{
    image_url, BANNERS_KEY, FOOTER_KEY, HOME_CATEGORIES_KEY, NAV_CATEGORIES_KEY,
};
use turbo_commerce::{CategoryId, Storefront, SubcategoryId};

use super::{AttributesArgs, CategoriesArgs, ProductsArgs, SubcategoriesArgs};
use crate::context::Context;
use crate::output::{format_duration, format_epoch_ms, format_price};

pub async fn categories(args: CategoriesArgs, ctx: &Context) -> Result<()> {
    let store = ctx.storefront()?;

    if args.home {
        let categories = store
            .catalog()
            .home_categories()
            .await
            .context("Failed to load categories")?;
        if ctx.output.is_json() {
            ctx.output.json(&categories);
            return Ok(());
        }
        ctx.output.header("Categories");
        for category in &categories {
            ctx.output
                .table_row(&[&category.id.to_string(), &category.name], &[6, 40]);
        }
        show_freshness(&store, HOME_CATEGORIES_KEY, ctx);
        return Ok(());
    }

    let categories = store
        .catalog()
        .nav_categories()
        .await
        .context("Failed to load categories")?;
    if ctx.output.is_json() {
        ctx.output.json(&categories);
        return Ok(());
    }

    ctx.output.header("Categories");
    if categories.is_empty() {
        ctx.output.info("No categories.");
    }
    for category in &categories {
        ctx.output
            .table_row(&[&category.id.to_string(), &category.name], &[6, 40]);
        for sub in &category.subcategories {
            ctx.output.list_item(&format!("{} {}", sub.id, sub.name));
        }
    }
    show_freshness(&store, NAV_CATEGORIES_KEY, ctx);
    Ok(())
}

pub async fn subcategories(args: SubcategoriesArgs, ctx: &Context) -> Result<()> {
    let store = ctx.storefront()?;
    let category = CategoryId::from(args.category);
    let subcategories = store
        .catalog()
        .subcategories(category)
        .await
        .with_context(|| format!("Failed to load subcategories of category {}", category))?;

    if ctx.output.is_json() {
        ctx.output.json(&subcategories);
        return Ok(());
    }

    ctx.output.header(&format!("Subcategories of {}", category));
    if subcategories.is_empty() {
        ctx.output.info("No subcategories.");
    }
    for sub in &subcategories {
        ctx.output.table_row(&[&sub.id.to_string(), &sub.name], &[6, 40]);
        if let Some(ref icon) = sub.icon_image_url {
            ctx.output.debug(&format!("icon: {}", icon));
        }
    }
    Ok(())
}

pub async fn attributes(args: AttributesArgs, ctx: &Context) -> Result<()> {
    let store = ctx.storefront()?;
    let subcategory = SubcategoryId::from(args.subcategory);
    let attributes = store
        .catalog()
        .attributes(subcategory)
        .await
        .with_context(|| format!("Failed to load attributes of subcategory {}", subcategory))?;

    if ctx.output.is_json() {
        ctx.output.json(&attributes);
        return Ok(());
    }

    ctx.output.header(&format!("Attributes of {}", subcategory));
    if attributes.is_empty() {
        ctx.output.info("No attributes.");
    }
    for attribute in &attributes {
        let values: Vec<&str> = attribute.options.iter().map(|o| o.value.as_str()).collect();
        ctx.output.kv(&attribute.name, &values.join(", "));
    }
    Ok(())
}

pub async fn products(args: ProductsArgs, ctx: &Context) -> Result<()> {
    let store = ctx.storefront()?;
    let subcategory = SubcategoryId::from(args.subcategory);
    let products = store
        .api()
        .subcategory_products(subcategory)
        .await
        .with_context(|| format!("Failed to load products of subcategory {}", subcategory))?;

    if ctx.output.is_json() {
        ctx.output.json(&products);
        return Ok(());
    }

    ctx.output.header(&format!("Products in {}", subcategory));
    if products.is_empty() {
        ctx.output.info("No spare parts available.");
        return Ok(());
    }
    for product in &products {
        let sale = match product.discount_percent() {
            0 => String::new(),
            pct => format!("-{}%", pct),
        };
        ctx.output.table_row(
            &[
                &product.id.to_string(),
                &product.name,
                &format_price(product.price),
                &sale,
            ],
            &[8, 36, 12, 5],
        );
        if let Some(rating) = product.rating {
            ctx.output.debug(&format!(
                "rating {:.1} ({} reviews)",
                rating,
                product.reviews.unwrap_or(0)
            ));
        }
        if !product.attributes.is_empty() {
            ctx.output.debug(&product.attributes.join(", "));
        }
    }
    Ok(())
}

pub async fn banners(ctx: &Context) -> Result<()> {
    let store = ctx.storefront()?;
    let banners = store
        .catalog()
        .banners()
        .await
        .context("Failed to load banners")?;

    if ctx.output.is_json() {
        ctx.output.json(&banners);
        return Ok(());
    }

    ctx.output.header("Banners");
    let storage_base = ctx.config.api.storage_url.as_deref();
    for banner in &banners {
        let image = image_url(Some(&banner.image), storage_base);
        ctx.output.table_row(
            &[&banner.id.to_string(), banner.placement.as_str(), &image],
            &[6, 8, 60],
        );
        if let Some(ref link) = banner.link {
            ctx.output.debug(&format!("link: {}", link));
        }
    }
    show_freshness(&store, BANNERS_KEY, ctx);
    Ok(())
}

pub async fn footer(ctx: &Context) -> Result<()> {
    let store = ctx.storefront()?;
    let footer = store
        .catalog()
        .footer()
        .await
        .context("Failed to load footer")?;

    if ctx.output.is_json() {
        ctx.output.json(&footer);
        return Ok(());
    }

    for category in &footer.categories {
        ctx.output.header(&category.name);
        for sub in footer.column(category.id) {
            ctx.output.list_item(&sub.name);
        }
    }
    show_freshness(&store, FOOTER_KEY, ctx);
    Ok(())
}

/// In verbose mode, say when the listing was stored and how long it stays fresh.
fn show_freshness(store: &Storefront, key: &str, ctx: &Context) {
    if !ctx.output.is_verbose() {
        return;
    }
    let persistent = store.caches().persistent();
    if let Some(entry) = persistent.get_entry::<serde_json::Value>(key) {
        let remaining = entry.remaining_ms(persistent.now_ms()) / 1000;
        ctx.output.debug(&format!(
            "{} cached at {}, fresh for {}",
            key,
            format_epoch_ms(entry.stored_at_epoch_ms),
            format_duration(remaining)
        ));
    }
}
