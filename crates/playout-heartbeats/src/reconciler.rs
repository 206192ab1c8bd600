use crate::clock::Clock;
use crate::driver::PlayoutDriver;
use crate::error::{HeartbeatError, Result};
use crate::expectation::{expected_window, ExpectedPosition, ExpectedWindow};
use crate::schedule::Playlist;
use crate::status::StatusEmitter;
use crate::types::{MediaId, RemoteClip};
use std::sync::Arc;
use tracing::{debug, warn};

/// Discrepancy between the expected and the reported position, in frames of the expected entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Drift {
	Frames(f64),
	/// The engine is somewhere unrelated to the expectation
	Unbounded,
}

impl Drift {
	pub fn exceeds(self, tolerance: f64) -> bool {
		match self {
			Self::Frames(frames) => frames > tolerance,
			Self::Unbounded => true,
		}
	}
}

/// Where the engine is relative to the expected entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Divergence {
	SameEntry,
	/// Still finishing the entry right before the expected one
	FinishingPrevious,
	/// Already playing the entry right after the expected one
	AheadOnNext,
	Unrelated,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
	pub divergence: Divergence,
	pub drift: Drift,
}

/// Classify how far the reported clip is from the expectation
pub fn assess(window: &ExpectedWindow, remote: &RemoteClip) -> Result<Assessment> {
	let expected = &window.expected;

	if expected.entry.same_media(&remote.id) {
		return Ok(Assessment {
			divergence: Divergence::SameEntry,
			drift: Drift::Frames((remote.current_frame - expected.frame_offset).abs()),
		});
	}

	if window.above.as_ref().is_some_and(|above| above.same_media(&remote.id)) {
		return Ok(Assessment {
			divergence: Divergence::FinishingPrevious,
			drift: Drift::Frames(remote.length - remote.current_frame + expected.frame_offset),
		});
	}

	if window.below.as_ref().is_some_and(|below| below.same_media(&remote.id)) {
		let length = expected.entry.length_in_frames()?;
		return Ok(Assessment {
			divergence: Divergence::AheadOnNext,
			drift: Drift::Frames(remote.current_frame + (length - expected.frame_offset)),
		});
	}

	Ok(Assessment {
		divergence: Divergence::Unrelated,
		drift: Drift::Unbounded,
	})
}

/// Result of one sync tick
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
	InSync { assessment: Assessment, frame_offset: f64 },
	Corrected { assessment: Assessment, actual_order: u32, frame: u64 },
}

/// Remembers which entry was last reported as current
#[derive(Debug, Default)]
struct CurrentMediaTracker {
	current: Option<MediaId>,
}

impl CurrentMediaTracker {
	/// Returns true when `id` replaces a different tracked entry.
	/// The first observation only seeds the tracker.
	fn observe(&mut self, id: &str) -> bool {
		match self.current.as_deref() {
			Some(current) if current == id => false,
			Some(_) => {
				self.current = Some(id.to_string());
				true
			}
			None => {
				self.current = Some(id.to_string());
				false
			}
		}
	}
}

/// Compares the engine's reported state against the schedule and corrects it
pub struct Reconciler {
	driver: Arc<dyn PlayoutDriver>,
	playlist: Playlist,
	clock: Arc<dyn Clock>,
	emitter: StatusEmitter,
	tracker: CurrentMediaTracker,
}

impl Reconciler {
	pub fn new(driver: Arc<dyn PlayoutDriver>, playlist: Playlist, clock: Arc<dyn Clock>, emitter: StatusEmitter) -> Self {
		Self {
			driver,
			playlist,
			clock,
			emitter,
			tracker: CurrentMediaTracker::default(),
		}
	}

	/// Run one poll-compare-correct cycle
	pub async fn tick(&mut self) -> Result<TickOutcome> {
		let remote = self.driver.status().await?;
		if !remote.status.is_playing() {
			return Err(HeartbeatError::RemoteNotPlaying { status: remote.status });
		}

		let now = self.clock.now();
		let window = self.playlist.read(|schedule| expected_window(schedule, now)).await?;
		let assessment = assess(&window, &remote.clip)?;
		let expected = window.expected;

		if assessment.drift.exceeds(expected.entry.fps) {
			warn!(
				expected = %expected.entry.id,
				remote = %remote.clip.id,
				divergence = ?assessment.divergence,
				drift = ?assessment.drift,
				"⚠️ Playout engine is out of sync"
			);
			return self.correct(expected, assessment).await;
		}

		debug!(clip = %expected.entry.id, frame = expected.frame_offset, divergence = ?assessment.divergence, "in sync");
		self.emit_status(&expected);
		Ok(TickOutcome::InSync {
			assessment,
			frame_offset: expected.frame_offset,
		})
	}

	async fn correct(&mut self, expected: ExpectedPosition, assessment: Assessment) -> Result<TickOutcome> {
		let actual_order = expected.entry.actual_order;
		let frame = expected.seek_frame();
		self.driver.seek(actual_order, frame).await?;
		self.emit_status(&expected);
		Ok(TickOutcome::Corrected {
			assessment,
			actual_order,
			frame,
		})
	}

	fn emit_status(&mut self, expected: &ExpectedPosition) {
		if self.tracker.observe(&expected.entry.id) {
			self.emitter.clip_changed(expected.entry.clone());
		}
		self.emitter.frame_advanced(expected.frame_offset);
	}
}
