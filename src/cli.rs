//! Command-line interface parsing for delivcache
//!
//! This module handles parsing of CLI arguments using clap and turns them
//! into a [`Config`] for the cache, refresh engine and reporter.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::config::Config;
use crate::resources::{get_resource_by_name, registry::RESOURCE_NAMES, ResourceDefinition};

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified resource name is not registered
    #[error("Unknown resource: '{0}'. Valid resources: disposable_domains, dnsbl_list, tld_list, ip_reputation_providers")]
    UnknownResource(String),

    /// No cache directory was given and none could be derived
    #[error("Could not determine a cache directory; pass --cache-dir or set DELIVCACHE_DIR")]
    NoCacheDir,
}

/// delivcache - local cache of email-deliverability reference datasets
#[derive(Parser, Debug)]
#[command(name = "delivcache")]
#[command(about = "Inspect and refresh cached email-deliverability datasets")]
#[command(version)]
pub struct Cli {
    /// Cache directory (defaults to the per-user cache directory)
    #[arg(long, global = true, env = "DELIVCACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Never contact upstream sources; repair from built-in fallback data only
    #[arg(long, global = true)]
    pub offline: bool,

    /// Timeout for each upstream request, in seconds
    #[arg(long, global = true, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the cached state of resources without modifying them
    Debug {
        /// Resources to inspect (all registered resources if omitted)
        names: Vec<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Refresh every resource
    Update {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Verify every resource by forcing a refresh cycle
    Verify {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Refresh a single resource
    Refresh {
        /// Resource to refresh
        name: String,
    },
}

impl Cli {
    /// Log level for this crate derived from `-v` occurrences
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Filter directives for the log subscriber
    ///
    /// A non-empty `RUST_LOG` wins outright; otherwise other crates log
    /// errors only and this crate logs at [`Cli::log_level`].
    pub fn log_filter(&self, rust_log: Option<&str>) -> String {
        match rust_log.map(str::trim) {
            Some(directives) if !directives.is_empty() => directives.to_string(),
            _ => format!("error,delivcache={}", self.log_level()),
        }
    }
}

/// Parses a resource name argument into its definition.
///
/// # Returns
/// * `Ok(&ResourceDefinition)` if the name is registered
/// * `Err(CliError::UnknownResource)` otherwise
pub fn parse_resource_arg(s: &str) -> Result<&'static ResourceDefinition, CliError> {
    get_resource_by_name(s).ok_or_else(|| CliError::UnknownResource(s.to_string()))
}

/// Resolves the resource names a `debug` invocation should inspect
pub fn debug_targets(names: &[String]) -> Result<Vec<&'static str>, CliError> {
    if names.is_empty() {
        return Ok(RESOURCE_NAMES.to_vec());
    }
    names
        .iter()
        .map(|name| parse_resource_arg(name).map(|definition| definition.name))
        .collect()
}

impl Config {
    /// Creates a Config from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(Config)` with the requested cache directory and network settings
    /// * `Err(CliError::NoCacheDir)` if no directory was given and none could be derived
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let config = match &cli.cache_dir {
            Some(dir) => Config::with_cache_dir(dir.clone()),
            None => Config::new().ok_or(CliError::NoCacheDir)?,
        };
        Ok(config
            .offline(cli.offline)
            .request_timeout(Duration::from_secs(cli.timeout)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resource_arg_known() {
        let definition = parse_resource_arg("dnsbl_list").unwrap();
        assert_eq!(definition.name, "dnsbl_list");
    }

    #[test]
    fn test_parse_resource_arg_invalid() {
        let result = parse_resource_arg("invalid");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Unknown resource"));
        assert!(err.to_string().contains("invalid"));
    }

    #[test]
    fn test_debug_targets_default_to_all() {
        assert_eq!(debug_targets(&[]).unwrap(), RESOURCE_NAMES.to_vec());
    }

    #[test]
    fn test_debug_targets_rejects_unknown() {
        let names = vec!["tld_list".to_string(), "bogus".to_string()];
        assert!(debug_targets(&names).is_err());
    }

    #[test]
    fn test_cli_parse_update() {
        let cli = Cli::parse_from(["delivcache", "update"]);
        assert_eq!(cli.command, Command::Update { json: false });
        assert!(!cli.offline);
        assert_eq!(cli.timeout, 30);
    }

    #[test]
    fn test_cli_parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "delivcache",
            "verify",
            "--offline",
            "--cache-dir",
            "/tmp/cache",
            "-vv",
        ]);
        assert_eq!(cli.command, Command::Verify { json: false });
        assert!(cli.offline);
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/cache")));
        assert_eq!(cli.log_level(), "trace");
    }

    #[test]
    fn test_cli_parse_debug_with_names() {
        let cli = Cli::parse_from(["delivcache", "debug", "tld_list", "dnsbl_list", "--json"]);
        assert_eq!(
            cli.command,
            Command::Debug {
                names: vec!["tld_list".to_string(), "dnsbl_list".to_string()],
                json: true,
            }
        );
    }

    #[test]
    fn test_cli_parse_refresh_requires_name() {
        assert!(Cli::try_parse_from(["delivcache", "refresh"]).is_err());
    }

    #[test]
    fn test_config_from_cli() {
        let cli = Cli::parse_from([
            "delivcache",
            "--cache-dir",
            "/tmp/cache",
            "--offline",
            "--timeout",
            "5",
            "update",
        ]);
        let config = Config::from_cli(&cli).unwrap();
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/cache"));
        assert!(config.offline);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_log_filter_prefers_rust_log() {
        let cli = Cli::parse_from(["delivcache", "-v", "update"]);
        assert_eq!(cli.log_filter(Some("delivcache=trace")), "delivcache=trace");
    }

    #[test]
    fn test_log_filter_uses_verbosity_without_rust_log() {
        let cli = Cli::parse_from(["delivcache", "-v", "update"]);
        assert_eq!(cli.log_filter(None), "error,delivcache=debug");
        assert_eq!(cli.log_filter(Some("  ")), "error,delivcache=debug");
    }

    #[test]
    fn test_log_level_default() {
        let cli = Cli::parse_from(["delivcache", "update"]);
        assert_eq!(cli.log_level(), "info");
    }
}
