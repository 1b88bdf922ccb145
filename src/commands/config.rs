//! `config` subcommands: inspect and edit `~/.requirements/config.toml`.

use anyhow::Result;
use log::debug;
use toml::Value;

use crate::{
    config::{ConfigKey, ConfigLoader, DEFAULT_CONFIG, Settings},
    runtime::Runtime,
};

use super::Context;

/// `section.key = value` for every entry of a raw config table.
pub fn flatten_table(table: &toml::Table) -> Vec<String> {
    let mut lines = Vec::new();
    for (section, value) in table {
        match value {
            Value::Table(entries) => {
                for (key, value) in entries {
                    lines.push(format!("  {}.{} = {}", section, key, display_value(value)));
                }
            }
            other => lines.push(format!("  {} = {}", section, display_value(other))),
        }
    }
    lines
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(display_value).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

/// The merged settings, one `key = value` line each.
pub fn effective_lines(settings: &Settings) -> Vec<String> {
    let color = settings
        .color
        .map_or_else(|| "auto".to_string(), |c| c.to_string());
    let fallback = settings.fallback_url.as_deref().unwrap_or("(none)");
    let extras = if settings.extra_index_urls.is_empty() {
        "(none)".to_string()
    } else {
        settings.extra_index_urls.join(", ")
    };
    vec![
        format!("  color.enabled = {}", color),
        format!(
            "  pypi.index_url = {} (from {})",
            settings.index_url, settings.index_source
        ),
        format!("  pypi.fallback_url = {}", fallback),
        format!("  pypi.extra_index_urls = {}", extras),
        format!("  sort.locale = {}", settings.sort.locale),
        format!("  sort.preserve_comments = {}", settings.sort.preserve_comments),
        format!("  edit.sort = {}", settings.sort_after_edit),
    ]
}

/// Show the config file and the effective settings
#[tracing::instrument(skip(ctx))]
pub fn show<R: Runtime + ?Sized>(ctx: &Context<'_, R>) -> Result<()> {
    let loader = ConfigLoader::new(ctx.runtime);
    let path = loader.user_config_path()?;
    println!("{} {}", ctx.console.path("Config file:"), path.display());

    let layers = loader.load();
    if let Some(root) = &layers.project_root {
        println!(
            "{} {}",
            ctx.console.path("Project root:"),
            root.display()
        );
    }

    let table = loader.read_user_table().unwrap_or_else(|e| {
        ctx.console.warn(&format!("Warning: {:#}", e));
        toml::Table::new()
    });
    if table.is_empty() {
        println!("No configuration set (using defaults)");
    } else {
        println!("\nCurrent settings:");
        for line in flatten_table(&table) {
            println!("{}", line);
        }
    }

    println!("\nEffective settings:");
    for line in effective_lines(&ctx.settings) {
        println!("{}", line);
    }
    Ok(())
}

/// Print the config file path
pub fn path<R: Runtime + ?Sized>(ctx: &Context<'_, R>) -> Result<()> {
    println!("{}", ConfigLoader::new(ctx.runtime).user_config_path()?.display());
    Ok(())
}

/// Set one key, keeping the rest of the file
#[tracing::instrument(skip(ctx))]
pub fn set<R: Runtime + ?Sized>(ctx: &Context<'_, R>, key: &str, value: &str) -> Result<()> {
    let key = ConfigKey::parse(key)?;
    let loader = ConfigLoader::new(ctx.runtime);
    let mut table = loader.read_user_table()?;
    key.set(&mut table, value)?;
    let path = loader.write_user_table(&table)?;
    debug!("Wrote {}", path.display());
    println!("Set {} = {}", key.name(), value.trim());
    Ok(())
}

/// Remove one key from the config file
#[tracing::instrument(skip(ctx))]
pub fn unset<R: Runtime + ?Sized>(ctx: &Context<'_, R>, key: &str) -> Result<()> {
    let key = ConfigKey::parse(key)?;
    let loader = ConfigLoader::new(ctx.runtime);
    let mut table = loader.read_user_table()?;
    if !key.unset(&mut table) {
        println!("{} is not set", key.name());
        return Ok(());
    }
    loader.write_user_table(&table)?;
    println!("Unset {}", key.name());
    Ok(())
}

/// Write a commented default config file unless one exists
#[tracing::instrument(skip(ctx))]
pub fn init<R: Runtime + ?Sized>(ctx: &Context<'_, R>) -> Result<()> {
    let path = ConfigLoader::new(ctx.runtime).user_config_path()?;
    if ctx.runtime.exists(&path) {
        println!("Config file already exists: {}", path.display());
        return Ok(());
    }
    if let Some(dir) = path.parent() {
        ctx.runtime.create_dir_all(dir)?;
    }
    ctx.runtime.write(&path, DEFAULT_CONFIG)?;
    println!("Created config file: {}", path.display());
    Ok(())
}
