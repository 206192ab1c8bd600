use crate::error::{HeartbeatError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier of a media entry, compared by value
pub type MediaId = String;

/// One scheduled playout item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaEntry {
	#[serde(deserialize_with = "id_from_string_or_number")]
	pub id: MediaId,
	pub start: DateTime<Utc>,
	pub end: DateTime<Utc>,
	/// Frames per second. Also used as the drift tolerance in frames.
	pub fps: f64,
	pub length: Length,
	/// Position used when commanding the driver to jump to this entry
	pub actual_order: u32,
}

impl MediaEntry {
	pub fn new(id: impl Into<MediaId>, start: DateTime<Utc>, end: DateTime<Utc>, fps: f64, length: Length, actual_order: u32) -> Self {
		Self {
			id: id.into(),
			start,
			end,
			fps,
			length,
			actual_order,
		}
	}

	/// Reject entries the control loop cannot reason about
	pub fn validate(&self) -> Result<()> {
		if !(self.fps.is_finite() && self.fps > 0.0) {
			return Err(HeartbeatError::InvalidEntry(format!("'{}' has non-positive fps {}", self.id, self.fps)));
		}
		Ok(())
	}

	/// Length of the entry in frames at its own rate
	pub fn length_in_frames(&self) -> Result<f64> {
		self.length.to_frames(self.fps)
	}

	pub fn same_media(&self, id: &str) -> bool {
		self.id == id
	}
}

/// Entry length: either a literal frame count or a `HH:MM:SS[.fff]` duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Length {
	Frames(f64),
	Text(String),
}

impl Length {
	pub fn to_frames(&self, fps: f64) -> Result<f64> {
		match self {
			Self::Frames(frames) => Ok(*frames),
			Self::Text(text) => {
				let text = text.trim();
				match text.parse::<f64>() {
					Ok(frames) if frames.is_finite() => Ok(frames),
					_ => parse_duration_secs(text).map(|secs| secs * fps).ok_or_else(|| HeartbeatError::InvalidLength(text.to_string())),
				}
			}
		}
	}
}

impl From<u32> for Length {
	fn from(frames: u32) -> Self {
		Self::Frames(f64::from(frames))
	}
}

impl From<&str> for Length {
	fn from(text: &str) -> Self {
		Self::Text(text.to_string())
	}
}

/// Parses `HH:MM:SS[.fff]` or `MM:SS[.fff]` into seconds
fn parse_duration_secs(text: &str) -> Option<f64> {
	if !text.contains(':') {
		return None;
	}
	let mut parts = text.rsplit(':');
	let seconds: f64 = parts.next()?.parse().ok()?;
	let minutes: u32 = parts.next().map_or(Ok(0), str::parse).ok()?;
	let hours: u32 = parts.next().map_or(Ok(0), str::parse).ok()?;
	if parts.next().is_some() || !seconds.is_finite() || seconds < 0.0 {
		return None;
	}
	Some(f64::from(hours) * 3600.0 + f64::from(minutes) * 60.0 + seconds)
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> std::result::Result<MediaId, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum RawId {
		Text(String),
		Integer(i64),
		Float(f64),
	}

	Ok(match RawId::deserialize(deserializer)? {
		RawId::Text(text) => text,
		RawId::Integer(n) => n.to_string(),
		RawId::Float(n) => n.to_string(),
	})
}

/// Playback state reported by the playout engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackStatus {
	Playing,
	Other(String),
}

impl PlaybackStatus {
	pub fn from_word(word: &str) -> Self {
		if word.eq_ignore_ascii_case("playing") {
			Self::Playing
		} else {
			Self::Other(word.to_string())
		}
	}

	pub fn is_playing(&self) -> bool {
		matches!(self, Self::Playing)
	}
}

impl fmt::Display for PlaybackStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Playing => f.write_str("playing"),
			Self::Other(word) => f.write_str(word),
		}
	}
}

/// Clip currently loaded in the playout engine
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteClip {
	pub id: MediaId,
	pub current_frame: f64,
	pub length: f64,
}

/// Snapshot of the playout engine's state for one poll
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteStatus {
	pub status: PlaybackStatus,
	pub clip: RemoteClip,
}
