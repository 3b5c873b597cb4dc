//! Configuration management commands.

use std::fs;

use anyhow::{bail, Context as _, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, CONFIG_NAMES};
use crate::context::Context;
use crate::output::format_duration;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match ctx.config_path {
        Some(ref path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    let config = &ctx.config;

    ctx.output.info("[api]");
    ctx.output.kv("base_url", &config.api.base_url);
    if let Some(ref url) = config.api.storage_url {
        ctx.output.kv("storage_url", url);
    }
    ctx.output.kv("timeout_ms", &config.api.timeout_ms.to_string());

    ctx.output.info("[storage]");
    ctx.output.kv("dir", &config.storage.dir);
    ctx.output.kv("origin", &config.storage.origin);

    ctx.output.info("[cache]");
    let cache = &config.cache;
    for (key, secs) in [
        ("categories_ttl", cache.categories_ttl_secs),
        ("home_categories_ttl", cache.home_categories_ttl_secs),
        ("banners_ttl", cache.banners_ttl_secs),
        ("footer_ttl", cache.footer_ttl_secs),
        ("subcategories_ttl", cache.subcategories_ttl_secs),
        ("attributes_ttl", cache.attributes_ttl_secs),
    ] {
        ctx.output.kv(key, &format_duration(secs));
    }

    ctx.output.info("[cart]");
    ctx.output
        .kv("feedback_delay_ms", &config.cart.feedback_delay_ms.to_string());

    if let Some(ref filter) = config.log.filter {
        ctx.output.info("[log]");
        ctx.output.kv("filter", filter);
    }

    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_NAMES[0]);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config())
        .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}
