//! Sign-in state and header counts.

use anyhow::{bail, Context as _, Result};
use serde_json::Value;
use turbo_auth::UserRecord;

use super::LoginArgs;
use crate::context::Context;

pub async fn login(args: LoginArgs, ctx: &Context) -> Result<()> {
    let user = parse_user_arg(&args.user)?;
    let store = ctx.storefront()?;
    let identity = store
        .auth()
        .sign_in(&args.token, user)
        .context("Failed to store credentials")?;

    if ctx.output.is_json() {
        ctx.output.json(&identity);
        return Ok(());
    }

    match identity.record_user_id() {
        Some(id) => ctx.output.success(&format!("Signed in as user {}", id)),
        None => ctx.output.success("Signed in"),
    }
    Ok(())
}

pub async fn logout(ctx: &Context) -> Result<()> {
    let store = ctx.storefront()?;
    store.auth().sign_out().context("Failed to clear credentials")?;
    ctx.output.success("Signed out");
    Ok(())
}

pub async fn whoami(ctx: &Context) -> Result<()> {
    let store = ctx.storefront()?;
    let auth = store.auth();
    let identity = auth.current_identity();

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "authenticated": identity.is_authenticated(),
            "userId": auth.user_id(),
            "user": identity.user,
        }));
        return Ok(());
    }

    if !identity.is_authenticated() {
        ctx.output.info("Not signed in.");
        return Ok(());
    }

    ctx.output.header("Signed in");
    if let Some(id) = auth.user_id() {
        ctx.output.kv("userId", &id);
    }
    if let Some(user) = identity.user {
        for (key, value) in &user {
            let shown = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            ctx.output.kv(key, &shown);
        }
    }
    Ok(())
}

pub async fn counts(ctx: &Context) -> Result<()> {
    let store = ctx.storefront()?;
    if !store.auth().is_authenticated() {
        ctx.output.info("Not signed in, counts are not fetched.");
    }
    let counts = store.badges().refresh().await;

    if ctx.output.is_json() {
        ctx.output.json(&counts);
        return Ok(());
    }

    ctx.output.header("Counts");
    ctx.output
        .kv("unread messages", &counts.unread_messages.to_string());
    ctx.output.kv("orders", &counts.orders.to_string());
    ctx.output.kv("cart lines", &counts.cart_lines.to_string());
    Ok(())
}

/// The `--user` argument must be a non-empty JSON object.
fn parse_user_arg(raw: &str) -> Result<UserRecord> {
    match serde_json::from_str::<Value>(raw).context("--user is not valid JSON")? {
        Value::Object(map) if !map.is_empty() => Ok(map),
        _ => bail!("--user must be a non-empty JSON object"),
    }
}
