//! Command-line configuration

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use status_image_client::DEFAULT_BASE_URL;
use std::path::PathBuf;

/// Caching proxy for http.cat status images
///
/// `-h` selects the bind host, so help is only available as `--help`.
#[derive(Parser, Debug)]
#[command(name = "http-cat-proxy")]
#[command(version, disable_help_flag = true)]
pub struct Cli {
    /// Server host
    #[arg(short = 'h', long, env = "PROXY_HOST", value_name = "HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(short, long, env = "PORT", value_name = "PORT")]
    pub port: Option<u16>,

    /// Cache directory path
    #[arg(short, long, env = "CACHE_DIR", value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// Base URL of the upstream image service
    #[arg(short, long, env = "UPSTREAM_URL", value_name = "URL", default_value = DEFAULT_BASE_URL)]
    pub upstream: String,

    /// Print help
    #[arg(long, action = clap::ArgAction::Help)]
    #[allow(dead_code)]
    help: Option<bool>,
}

/// Resolved startup configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    /// Absolute cache root
    pub cache_dir: PathBuf,
    pub upstream_url: String,
}

impl ProxyConfig {
    /// Build the configuration from parsed arguments.
    ///
    /// Missing values are reported in flag order, one at a time, as clap
    /// errors so they exit the way any other usage error does.
    pub fn from_cli(cli: Cli) -> Result<Self, clap::Error> {
        let host = cli
            .host
            .ok_or_else(|| missing("Please, specify server host"))?;
        let port = cli
            .port
            .ok_or_else(|| missing("Please, specify server port"))?;
        let cache = cli
            .cache
            .ok_or_else(|| missing("Please, specify cache directory"))?;

        let cache_dir = std::path::absolute(&cache).map_err(|e| {
            Cli::command().error(
                ErrorKind::ValueValidation,
                format!("Cannot resolve cache directory {:?}: {}", cache, e),
            )
        })?;

        Ok(Self {
            host,
            port,
            cache_dir,
            upstream_url: cli.upstream,
        })
    }
}

fn missing(message: &str) -> clap::Error {
    Cli::command().error(ErrorKind::MissingRequiredArgument, message)
}
