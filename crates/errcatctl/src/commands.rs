//! Command implementations for errcatctl

use std::time::SystemTime;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use errcat_common::{CacheStats, CatalogConfig, ErrorCatalog, MemorySink, Severity, Strategy};
use serde::Serialize;
use tracing::debug;

use crate::cli::{Cli, Commands};
use crate::errors::{EXIT_NOT_FOUND, EXIT_SUCCESS};
use crate::output::{self, ConsoleSink};

/// Catalog state shown by `info`
#[derive(Debug, Serialize)]
pub struct CatalogInfo {
    pub source: String,
    pub strategy: Strategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_secs: Option<u64>,
    pub records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheStats>,
}

#[derive(Debug, Serialize)]
struct DispatchedMessage {
    severity: Severity,
    message: String,
}

/// Load configuration and apply command-line overrides
pub fn resolve_config(cli: &Cli) -> Result<CatalogConfig> {
    let mut config = match &cli.config {
        Some(path) => CatalogConfig::load_from(path)?,
        None => CatalogConfig::load()?,
    };

    if let Some(path) = &cli.catalog {
        config.source.path = path.clone();
    }
    if let Some(strategy) = cli.strategy {
        config.strategy = strategy;
    }

    debug!(
        "Using catalog {} ({} strategy)",
        config.source.path.display(),
        config.strategy
    );
    Ok(config)
}

/// Execute the parsed command, returning the process exit code
pub fn run(cli: &Cli) -> Result<i32> {
    let config = resolve_config(cli)?;
    let catalog = config.open_catalog();

    match &cli.command {
        Commands::Show { id } => show(&catalog, id, cli.json),
        Commands::Level { level } => list_level(&catalog, level, cli.json),
        Commands::Exists { id } => exists(&catalog, id, cli.json),
        Commands::Count => count(&catalog, cli.json),
        Commands::Levels => levels(&catalog, cli.json),
        Commands::Report { id } => report(&catalog, id, cli.json),
        Commands::Info => info(&catalog, &config, cli.json),
    }
}

fn show(catalog: &ErrorCatalog, id: &str, json: bool) -> Result<i32> {
    let record = catalog.lookup(id)?;

    if json {
        output::print_json(&record)?;
    } else if let Some(record) = &record {
        output::display_records(std::slice::from_ref(record));
    } else {
        output::display_warning(&format!("Error with ID '{}' not found", id));
    }

    Ok(if record.is_some() {
        EXIT_SUCCESS
    } else {
        EXIT_NOT_FOUND
    })
}

fn list_level(catalog: &ErrorCatalog, level: &str, json: bool) -> Result<i32> {
    let records = catalog.list_by_level(level)?;

    if json {
        output::print_json(&records)?;
    } else if records.is_empty() {
        output::display_warning(&format!("No errors with level '{}'", level));
    } else {
        output::display_records(&records);
    }

    Ok(EXIT_SUCCESS)
}

fn exists(catalog: &ErrorCatalog, id: &str, json: bool) -> Result<i32> {
    let found = catalog.exists(id);

    if json {
        output::print_json(&serde_json::json!({ "id": id, "exists": found }))?;
    } else {
        println!("{}", found);
    }

    Ok(if found { EXIT_SUCCESS } else { EXIT_NOT_FOUND })
}

fn count(catalog: &ErrorCatalog, json: bool) -> Result<i32> {
    let total = catalog.count();

    if json {
        output::print_json(&serde_json::json!({ "count": total }))?;
    } else {
        println!("{}", total);
    }

    Ok(EXIT_SUCCESS)
}

fn levels(catalog: &ErrorCatalog, json: bool) -> Result<i32> {
    let levels = catalog.distinct_levels()?;

    if json {
        output::print_json(&levels)?;
    } else {
        for level in &levels {
            println!("{}", level);
        }
    }

    Ok(EXIT_SUCCESS)
}

fn report(catalog: &ErrorCatalog, id: &str, json: bool) -> Result<i32> {
    let dispatched = if json {
        let sink = MemorySink::default();
        let dispatched = catalog.report(id, &sink);
        let messages: Vec<DispatchedMessage> = sink
            .entries()
            .into_iter()
            .map(|(severity, message)| DispatchedMessage { severity, message })
            .collect();
        output::print_json(&messages)?;
        dispatched
    } else {
        catalog.report(id, &ConsoleSink)
    };

    Ok(if dispatched {
        EXIT_SUCCESS
    } else {
        EXIT_NOT_FOUND
    })
}

fn info(catalog: &ErrorCatalog, config: &CatalogConfig, json: bool) -> Result<i32> {
    let records = catalog.count();
    let info = CatalogInfo {
        source: catalog.source_name(),
        strategy: catalog.strategy(),
        ttl_secs: match catalog.strategy() {
            Strategy::Cached => Some(config.cache.ttl_secs),
            Strategy::Streaming => None,
        },
        records,
        loaded_at: catalog.loaded_at().map(timestamp),
        cache: catalog.cache_stats(),
    };

    if json {
        output::print_json(&info)?;
        return Ok(EXIT_SUCCESS);
    }

    output::display_field("Source", &info.source);
    output::display_field("Strategy", info.strategy.as_str());
    if let Some(ttl) = info.ttl_secs {
        output::display_field("TTL", &format!("{}s", ttl));
    }
    output::display_field("Records", &info.records.to_string());
    if let Some(loaded_at) = &info.loaded_at {
        output::display_field("Loaded at", loaded_at);
    }
    if let Some(stats) = &info.cache {
        output::display_field(
            "Cache",
            &format!(
                "{} loads, {} hits, {} refresh failures",
                stats.loads, stats.hits, stats.refresh_failures
            ),
        );
    }

    Ok(EXIT_SUCCESS)
}

fn timestamp(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use std::path::PathBuf;

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(
            &config_path,
            "strategy = \"cached\"\n[source]\npath = \"from-config.xml\"\n[cache]\nttl_secs = 5\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "errcatctl",
            "--config",
            config_path.to_str().unwrap(),
            "--catalog",
            "override.xml",
            "--strategy",
            "streaming",
            "count",
        ])
        .unwrap();

        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.source.path, PathBuf::from("override.xml"));
        assert_eq!(config.strategy, Strategy::Streaming);
        assert_eq!(config.cache.ttl_secs, 5);
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let cli =
            Cli::try_parse_from(["errcatctl", "--config", "/nonexistent/errcat.toml", "count"])
                .unwrap();
        let err = resolve_config(&cli).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read"));
    }

    #[test]
    fn test_timestamp_is_rfc3339_utc() {
        assert_eq!(timestamp(SystemTime::UNIX_EPOCH), "1970-01-01T00:00:00Z");
    }
}
