//! Configuration for the queue server.
//!
//! CLI arguments with environment variable fallbacks, parsed with clap.
//! A `.env` file is loaded by `main` before parsing.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::session::CoordinatorConfig;

/// songq - collaborative song queue server
#[derive(Parser, Debug, Clone)]
#[command(name = "songq")]
#[command(about = "Collaborative song queue server with optimistic rebasing of edits")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Directory of the on-disk queue store; queues are kept in memory only when unset
    #[arg(long, env = "STORE_PATH")]
    pub store_path: Option<PathBuf>,

    /// Time to live of persisted queues in milliseconds
    #[arg(long, env = "CACHE_DATA_EXPIRE_TIME", default_value_t = 24 * 60 * 60 * 1000)]
    pub data_expire_ms: u64,

    /// Retention of operation log entries in milliseconds; also the sweep interval
    #[arg(long, env = "CACHE_OP_EXPIRE_TIME", default_value_t = 5 * 60 * 1000)]
    pub op_expire_ms: u64,

    /// Maximum operation log entries kept per room
    #[arg(long, env = "OP_LOG_CAPACITY", default_value_t = 50)]
    pub op_log_capacity: usize,

    /// Resolve short links in submitted songs
    #[arg(long, env = "RESOLVE_LINKS", default_value_t = true, action = clap::ArgAction::Set)]
    pub resolve_links: bool,

    /// Timeout for short link resolution in milliseconds
    #[arg(long, env = "RESOLVE_TIMEOUT_MS", default_value_t = 5000)]
    pub resolve_timeout_ms: u64,
}

impl Args {
    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.data_expire_ms == 0 {
            return Err("CACHE_DATA_EXPIRE_TIME must be greater than zero".to_string());
        }
        if self.op_expire_ms == 0 {
            return Err("CACHE_OP_EXPIRE_TIME must be greater than zero".to_string());
        }
        if i64::try_from(self.op_expire_ms).is_err() {
            return Err("CACHE_OP_EXPIRE_TIME is too large".to_string());
        }
        if self.op_log_capacity == 0 {
            return Err("OP_LOG_CAPACITY must be greater than zero".to_string());
        }
        if self.resolve_timeout_ms == 0 {
            return Err("RESOLVE_TIMEOUT_MS must be greater than zero".to_string());
        }
        Ok(())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.op_expire_ms)
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            log_capacity: self.op_log_capacity,
            op_retention: chrono::Duration::milliseconds(
                i64::try_from(self.op_expire_ms).unwrap_or(i64::MAX),
            ),
            store_ttl: Some(Duration::from_millis(self.data_expire_ms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["songq"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);

        assert!(args.validate().is_ok());
        assert_eq!(args.op_log_capacity, 50);
        assert_eq!(args.sweep_interval(), Duration::from_secs(300));

        let config = args.coordinator_config();
        assert_eq!(config.op_retention, chrono::Duration::minutes(5));
        assert_eq!(config.store_ttl, Some(Duration::from_secs(86_400)));
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = parse(&["--op-log-capacity", "10", "--resolve-links", "false"]);
        assert_eq!(args.op_log_capacity, 10);
        assert!(!args.resolve_links);
    }

    #[test]
    fn test_store_path_flag() {
        let args = parse(&["--store-path", "/var/lib/songq"]);
        assert_eq!(args.store_path, Some(PathBuf::from("/var/lib/songq")));
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        assert!(parse(&["--op-log-capacity", "0"]).validate().is_err());
        assert!(parse(&["--op-expire-ms", "0"]).validate().is_err());
        assert!(parse(&["--data-expire-ms", "0"]).validate().is_err());
    }
}
