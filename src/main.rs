//! delivcache - inspect and refresh cached email-deliverability datasets
//!
//! A thin operator front end over the refresh engine and reporting facade.

use std::collections::BTreeMap;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use delivcache::cache::CacheStore;
use delivcache::cli::{debug_targets, parse_resource_arg, Cli, Command};
use delivcache::config::Config;
use delivcache::fetch::ConfiguredFetcher;
use delivcache::refresh::{RefreshEngine, RefreshResult, RefreshStatus};
use delivcache::report::{format_debug, format_refresh, status_report, Reporter};

/// Initialize logging based on CLI verbosity settings
fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = EnvFilter::try_new(cli.log_filter(rust_log.as_deref()))
        .context("invalid log filter")?;

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

/// Prints refresh results and maps any `Error` outcome to a failing exit code
fn print_results(results: &BTreeMap<String, RefreshResult>, json: bool) -> anyhow::Result<ExitCode> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
    } else {
        println!("=== Resource Update Results ===");
        for result in results.values() {
            println!("{}", format_refresh(result));
        }
    }

    let failed = results
        .values()
        .filter(|r| r.status == RefreshStatus::Error)
        .count();
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_debug(store: CacheStore, names: &[String], json: bool) -> anyhow::Result<ExitCode> {
    let targets = debug_targets(names)?;
    let reporter = Reporter::new(store);
    let infos: Vec<_> = targets.iter().map(|name| reporter.debug(name)).collect();
    let files = reporter
        .cache_files()
        .context("failed to list cache directory")?;

    if json {
        let report = serde_json::json!({ "resources": infos, "cache_files": files });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("=== Resource Debug Information ===");
    for info in &infos {
        println!();
        print!("{}", format_debug(info));
    }
    println!();
    println!("=== Cache Files ===");
    for file in &files {
        println!("{}: {} bytes", file.file_name, file.byte_size);
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config = Config::from_cli(&cli)?;
    info!(cache_dir = %config.cache_dir.display(), offline = config.offline, "using cache directory");
    let store = CacheStore::new(config.cache_dir.clone());

    match &cli.command {
        Command::Debug { names, json } => run_debug(store, names, *json),
        Command::Update { json } => {
            let engine = RefreshEngine::new(store, ConfiguredFetcher::from_config(&config));
            print_results(&engine.refresh_all().await, *json)
        }
        Command::Verify { json } => {
            let engine = RefreshEngine::new(store, ConfiguredFetcher::from_config(&config));
            print_results(&status_report(&engine).await, *json)
        }
        Command::Refresh { name } => {
            let definition = parse_resource_arg(name)?;
            let engine = RefreshEngine::new(store, ConfiguredFetcher::from_config(&config));
            let result = engine.refresh(definition.name).await?;
            let results = BTreeMap::from([(result.resource_name.clone(), result)]);
            print_results(&results, false)
        }
    }
}
