use crate::driver::MELTED_DRIVER;
use crate::error::{HeartbeatError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Connection settings for the melted (MVCP) driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeltedConfig {
	pub host: String,
	pub port: u16,
	/// Unit the playlist is loaded on, e.g. `U0`
	pub unit: String,
	/// Per-request timeout
	pub timeout: Duration,
}

impl Default for MeltedConfig {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".to_string(),
			port: 5250,
			unit: "U0".to_string(),
			timeout: Duration::from_secs(2),
		}
	}
}

/// Complete configuration for the heartbeat service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
	/// How often expired entries are collected
	pub gc_interval: Duration,
	/// How often the playout engine is polled and corrected
	pub sync_interval: Duration,
	/// Which playout driver to bootstrap
	pub driver_name: String,
	/// Age past an entry's end after which it is collected
	pub retention_window: Duration,
	/// Delay between failed connection attempts
	pub connect_backoff: Duration,
	/// Graceful shutdown timeout
	pub shutdown_timeout: Duration,
	/// Capacity of the status event channel
	pub status_capacity: usize,
	/// Playlist file used by the binary
	pub playlist_path: PathBuf,
	pub melted: MeltedConfig,
}

impl Config {
	/// Load configuration from environment variables with sensible defaults
	pub fn from_env() -> Result<Self> {
		let defaults = Self::default();
		let melted = MeltedConfig {
			host: std::env::var("MELTED_HOST").unwrap_or(defaults.melted.host),
			port: env_or("MELTED_PORT", defaults.melted.port),
			unit: std::env::var("MELTED_UNIT").unwrap_or(defaults.melted.unit),
			timeout: Duration::from_millis(env_or("MELTED_TIMEOUT_MS", 2_000)),
		};

		let config = Self {
			gc_interval: Duration::from_millis(env_or("HEARTBEAT_GC_INTERVAL_MS", 3_600_000)),
			sync_interval: Duration::from_millis(env_or("HEARTBEAT_SYNC_INTERVAL_MS", 250)),
			driver_name: std::env::var("HEARTBEAT_DRIVER").unwrap_or(defaults.driver_name),
			retention_window: Duration::from_secs(env_or("HEARTBEAT_RETENTION_SECS", 3_600)),
			connect_backoff: Duration::from_millis(env_or("HEARTBEAT_CONNECT_BACKOFF_MS", 2_000)),
			shutdown_timeout: Duration::from_secs(env_or("HEARTBEAT_SHUTDOWN_TIMEOUT_SECS", 10)),
			status_capacity: env_or("HEARTBEAT_STATUS_CAPACITY", defaults.status_capacity),
			playlist_path: std::env::var("HEARTBEAT_PLAYLIST").map_or(defaults.playlist_path, PathBuf::from),
			melted,
		};
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<()> {
		if self.gc_interval.is_zero() {
			return Err(HeartbeatError::Config("gc_interval must be greater than zero".into()));
		}
		if self.sync_interval.is_zero() {
			return Err(HeartbeatError::Config("sync_interval must be greater than zero".into()));
		}
		if self.driver_name.trim().is_empty() {
			return Err(HeartbeatError::Config("driver_name must not be empty".into()));
		}
		Ok(())
	}

	pub fn with_sync_interval(mut self, interval: Duration) -> Self {
		self.sync_interval = interval;
		self
	}

	pub fn with_gc_interval(mut self, interval: Duration) -> Self {
		self.gc_interval = interval;
		self
	}

	pub fn with_connect_backoff(mut self, backoff: Duration) -> Self {
		self.connect_backoff = backoff;
		self
	}

	pub fn with_retention_window(mut self, window: Duration) -> Self {
		self.retention_window = window;
		self
	}
}

impl Default for Config {
	fn default() -> Self {
		Self {
			gc_interval: Duration::from_secs(60 * 60),
			sync_interval: Duration::from_millis(250),
			driver_name: MELTED_DRIVER.to_string(),
			retention_window: Duration::from_secs(60 * 60),
			connect_backoff: Duration::from_secs(2),
			shutdown_timeout: Duration::from_secs(10),
			status_capacity: 64,
			playlist_path: PathBuf::from("melted_medias.json"),
			melted: MeltedConfig::default(),
		}
	}
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
	std::env::var(key).ok().and_then(|value| value.parse().ok()).unwrap_or(default)
}
