//! Command-line interface.
//!
//! Flags override values from the optional config file, which override the
//! built-in defaults.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::loader::read_config;
use crate::config::validation::validate_config;
use crate::config::{ConfigError, LogFormat, SinkConfig};

#[derive(Debug, Parser)]
#[command(name = "mirror-sink")]
#[command(about = "Answers every HTTP request with 200 OK and reports traffic statistics")]
#[command(long_about = None)]
pub struct Cli {
    /// TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// IPv4 address to listen on (":8080" binds all interfaces)
    #[arg(long)]
    pub addr: Option<String>,

    /// How often to print stats (e.g. "2s", "500ms")
    #[arg(long, value_parser = parse_duration)]
    pub stats: Option<Duration>,

    /// Time allowed to read request headers and body chunks
    #[arg(long, value_parser = parse_duration)]
    pub read_timeout: Option<Duration>,

    /// Time a stalled response write may block
    #[arg(long, value_parser = parse_duration)]
    pub write_timeout: Option<Duration>,

    /// How long idle keep-alive connections stay open
    #[arg(long, value_parser = parse_duration)]
    pub idle_timeout: Option<Duration>,

    /// How many hosts to show per interval
    #[arg(long)]
    pub top: Option<usize>,

    /// Cap on distinct hosts tracked (0 = unlimited)
    #[arg(long)]
    pub max_hosts: Option<usize>,

    /// How long to wait for in-flight requests at shutdown
    #[arg(long, value_parser = parse_duration)]
    pub grace: Option<Duration>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    pub metrics_addr: Option<String>,
}

impl Cli {
    /// Build the effective configuration: defaults, then file, then flags.
    pub fn resolve_config(&self) -> Result<SinkConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => SinkConfig::default(),
        };
        self.apply(&mut config);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    /// Overwrite every field that was given on the command line.
    pub fn apply(&self, config: &mut SinkConfig) {
        if let Some(addr) = &self.addr {
            config.listener.bind_address = normalize_bind_address(addr);
        }
        if let Some(stats) = self.stats {
            config.stats.interval_ms = as_millis(stats);
        }
        if let Some(read) = self.read_timeout {
            config.timeouts.read_ms = as_millis(read);
        }
        if let Some(write) = self.write_timeout {
            config.timeouts.write_ms = as_millis(write);
        }
        if let Some(idle) = self.idle_timeout {
            config.timeouts.idle_ms = as_millis(idle);
        }
        if let Some(top) = self.top {
            config.stats.top_hosts = top;
        }
        if let Some(max_hosts) = self.max_hosts {
            config.stats.max_tracked_hosts = max_hosts;
        }
        if let Some(grace) = self.grace {
            config.shutdown.grace_period_ms = as_millis(grace);
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }
        if let Some(metrics_addr) = &self.metrics_addr {
            config.observability.metrics_enabled = true;
            config.observability.metrics_address = metrics_addr.clone();
        }
    }
}

fn as_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Expand the `:port` shorthand to all IPv4 interfaces.
pub fn normalize_bind_address(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    }
}

/// Parse a duration such as `500ms`, `2s`, `1.5s`, `1m` or `1h`.
///
/// A bare number is taken as seconds.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    let split = input
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(input.len());
    let (number, unit) = input.split_at(split);

    let value: f64 = number
        .parse()
        .map_err(|_| format!("invalid duration '{input}'"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("invalid duration '{input}'"));
    }

    let secs = match unit {
        "ms" => value / 1000.0,
        "" | "s" => value,
        "m" => value * 60.0,
        "h" => value * 3600.0,
        other => return Err(format!("unknown duration unit '{other}' in '{input}'")),
    };

    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid duration '{input}': {e}"))
}
