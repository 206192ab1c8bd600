use crate::error::{HeartbeatError, Result};
use crate::schedule::Schedule;
use crate::types::MediaEntry;
use chrono::{DateTime, Utc};

/// Entry and frame that should be on air at a given instant
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedPosition {
	pub entry: MediaEntry,
	pub frame_offset: f64,
}

impl ExpectedPosition {
	/// Whole frame used for seek commands
	#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
	pub fn seek_frame(&self) -> u64 {
		self.frame_offset.floor() as u64
	}
}

/// Expected position plus its ordinal neighbors, captured under one lock
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedWindow {
	pub expected: ExpectedPosition,
	pub above: Option<MediaEntry>,
	pub below: Option<MediaEntry>,
}

/// Frames elapsed since `entry.start`, never negative
#[allow(clippy::cast_precision_loss)]
pub fn frame_offset(entry: &MediaEntry, now: DateTime<Utc>) -> f64 {
	let elapsed_secs = (now - entry.start).num_milliseconds() as f64 / 1000.0;
	(elapsed_secs * entry.fps).max(0.0)
}

fn expected_at(entry: &MediaEntry, now: DateTime<Utc>) -> ExpectedPosition {
	ExpectedPosition {
		frame_offset: frame_offset(entry, now),
		entry: entry.clone(),
	}
}

pub fn compute_expected(schedule: &Schedule, now: DateTime<Utc>) -> Result<ExpectedPosition> {
	Ok(expected_at(schedule.find_expected(now)?, now))
}

/// Neighbors are taken by position, so repeated media resolve to the right airing
pub fn expected_window(schedule: &Schedule, now: DateTime<Utc>) -> Result<ExpectedWindow> {
	let index = schedule.expected_index(now)?;
	let entry = schedule.at(index).ok_or(HeartbeatError::ScheduleExhausted { at: now })?;
	Ok(ExpectedWindow {
		expected: expected_at(entry, now),
		above: schedule.above(index).cloned(),
		below: schedule.below(index).cloned(),
	})
}
