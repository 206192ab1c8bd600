mod mvcp;

use crate::config::Config;
use crate::error::{HeartbeatError, Result};
use crate::types::RemoteStatus;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub use mvcp::MeltedDriver;

/// Name of the melted (MVCP) driver
pub const MELTED_DRIVER: &str = "melted";

/// Driver-specific error types
#[derive(Error, Debug)]
pub enum DriverError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Request timed out after {0:?}")]
	Timeout(Duration),

	#[error("Protocol error: {0}")]
	Protocol(String),

	#[error("Command rejected: {0}")]
	Rejected(String),

	#[error("Driver is not connected")]
	NotConnected,
}

/// Session with the playout engine
#[async_trait]
pub trait PlayoutDriver: Send + Sync {
	fn name(&self) -> &str;

	/// Establish the session
	async fn connect(&self) -> std::result::Result<(), DriverError>;

	/// Poll the engine for what is on air
	async fn status(&self) -> std::result::Result<RemoteStatus, DriverError>;

	/// Jump to `frame` of the clip at `actual_order`
	async fn seek(&self, actual_order: u32, frame: u64) -> std::result::Result<(), DriverError>;
}

/// Build the driver named in the configuration
pub fn from_name(name: &str, config: &Config) -> Result<Arc<dyn PlayoutDriver>> {
	match name {
		MELTED_DRIVER => Ok(Arc::new(MeltedDriver::new(config.melted.clone()))),
		other => Err(HeartbeatError::Config(format!("unknown playout driver '{other}'"))),
	}
}
