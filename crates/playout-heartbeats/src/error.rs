use crate::driver::DriverError;
use crate::store::StoreError;
use crate::types::PlaybackStatus;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HeartbeatError>;

#[derive(Error, Debug)]
pub enum HeartbeatError {
	#[error("Error starting playout driver session: {0}")]
	ConnectionFailure(#[source] DriverError),

	#[error("Could not find expected clip at {at}")]
	ScheduleExhausted { at: DateTime<Utc> },

	#[error("Playout engine is not playing (status: {status})")]
	RemoteNotPlaying { status: PlaybackStatus },

	#[error("Playout driver call failed: {0}")]
	DriverCall(#[from] DriverError),

	#[error("Playlist store error: {0}")]
	Store(#[from] StoreError),

	#[error("Invalid media length: {0}")]
	InvalidLength(String),

	#[error("Invalid playlist entry: {0}")]
	InvalidEntry(String),

	#[error("Invalid session transition: {0}")]
	InvalidTransition(String),

	#[error("Configuration error: {0}")]
	Config(String),

	#[error("Service task failed: {0}")]
	Task(String),

	#[error("Service cancelled")]
	Cancelled,
}
