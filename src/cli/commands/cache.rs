//! Cache command - inspect and maintain the response cache

use crate::cache::{unix_now, CacheFile, CacheKey, CacheStore};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::cli::commands::open_store;
use crate::config::Config;
use crate::error::VientoResult;
use console::style;
use std::time::Duration;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> VientoResult<()> {
    let store = open_store(config)?;

    match args.action {
        CacheAction::Path => {
            println!("{}", store.path().display());
            Ok(())
        }
        CacheAction::Show { format } => show_entries(&store, format),
        CacheAction::Purge => {
            let removed = store.purge_expired()?;
            println!(
                "{} Removed {} expired entr{}",
                style("✓").green(),
                removed,
                if removed == 1 { "y" } else { "ies" }
            );
            Ok(())
        }
        CacheAction::Clear { yes } => clear_entries(&store, yes),
    }
}

fn show_entries(store: &CacheStore, format: OutputFormat) -> VientoResult<()> {
    let mapping = store.snapshot()?;

    if mapping.is_empty() && !matches!(format, OutputFormat::Json) {
        println!("No cached responses.");
        return Ok(());
    }

    match format {
        OutputFormat::Table => print_table(&mapping, store.ttl()),
        OutputFormat::Json => print_json(&mapping, store.ttl())?,
        OutputFormat::Plain => {
            for (key, _) in mapping.iter() {
                println!("{}", key);
            }
        }
    }
    Ok(())
}

fn print_table(mapping: &CacheFile, ttl: Duration) {
    let now = unix_now();
    println!("{:<48} {:<8} {:<8} {:<20}", "KEY", "AGE", "STATE", "CREATED");
    println!("{}", "-".repeat(86));

    for (key, entry) in mapping.iter() {
        let state = if entry.is_expired_at(now, ttl) {
            style("expired").dim().to_string()
        } else {
            style("fresh").green().to_string()
        };
        let created = entry
            .created_at()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<48} {:<8} {:<8} {:<20}",
            key,
            format!("{:.0}s", entry.age(now)),
            state,
            created
        );
    }

    println!();
    println!("Total: {} entr{}", mapping.len(), if mapping.len() == 1 { "y" } else { "ies" });
}

fn print_json(mapping: &CacheFile, ttl: Duration) -> VientoResult<()> {
    #[derive(serde::Serialize)]
    struct EntryJson<'a> {
        key: &'a str,
        endpoint: Option<String>,
        latitude: Option<String>,
        longitude: Option<String>,
        age_secs: f64,
        expired: bool,
        created_at: Option<String>,
    }

    let now = unix_now();
    let entries: Vec<EntryJson<'_>> = mapping
        .iter()
        .map(|(key, entry)| {
            let parsed = CacheKey::parse(key);
            EntryJson {
                key,
                endpoint: parsed.as_ref().map(|k| k.endpoint().to_string()),
                latitude: parsed.as_ref().map(|k| k.latitude().to_string()),
                longitude: parsed.as_ref().map(|k| k.longitude().to_string()),
                age_secs: entry.age(now),
                expired: entry.is_expired_at(now, ttl),
                created_at: entry.created_at().map(|t| t.to_rfc3339()),
            }
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

fn clear_entries(store: &CacheStore, yes: bool) -> VientoResult<()> {
    if !yes {
        println!(
            "{} This removes every cached response in {}",
            style("!").yellow(),
            store.path().display()
        );
        println!("  Re-run with --yes to confirm");
        return Ok(());
    }

    let removed = store.clear()?;
    println!(
        "{} Cleared {} entr{}",
        style("✓").green(),
        removed,
        if removed == 1 { "y" } else { "ies" }
    );
    Ok(())
}
