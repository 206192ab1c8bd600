// Shared harness: a scripted playout driver and a two-entry playlist
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use playout_heartbeats::{DriverError, Length, MediaEntry, MemoryStore, PlaybackStatus, PlayoutDriver, Playlist, PlaylistStore, RemoteClip, RemoteStatus, Schedule, StoreError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Driver whose answers are set by the test and whose calls are recorded
#[derive(Default)]
pub struct ScriptedDriver {
	connect_results: Mutex<VecDeque<Result<(), DriverError>>>,
	status: Mutex<Option<RemoteStatus>>,
	fail_seeks: Mutex<bool>,
	status_delay: Mutex<Duration>,
	status_in_flight: AtomicUsize,
	status_peak: AtomicUsize,
	seeks: Mutex<Vec<(u32, u64)>>,
	calls: Mutex<Vec<&'static str>>,
}

impl ScriptedDriver {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	/// Fail the next `n` connection attempts
	pub fn fail_connects(&self, n: usize) {
		let mut results = self.connect_results.lock().unwrap();
		for _ in 0..n {
			results.push_back(Err(DriverError::NotConnected));
		}
	}

	pub fn set_playing(&self, id: &str, current_frame: f64, length: f64) {
		self.set_status(PlaybackStatus::Playing, id, current_frame, length);
	}

	pub fn set_status(&self, status: PlaybackStatus, id: &str, current_frame: f64, length: f64) {
		*self.status.lock().unwrap() = Some(RemoteStatus {
			status,
			clip: RemoteClip {
				id: id.to_string(),
				current_frame,
				length,
			},
		});
	}

	/// Make every status call take `delay`
	pub fn set_status_delay(&self, delay: Duration) {
		*self.status_delay.lock().unwrap() = delay;
	}

	/// Highest number of status calls seen running at once
	pub fn peak_concurrent_status(&self) -> usize {
		self.status_peak.load(Ordering::SeqCst)
	}

	pub fn fail_seeks(&self) {
		*self.fail_seeks.lock().unwrap() = true;
	}

	pub fn seeks(&self) -> Vec<(u32, u64)> {
		self.seeks.lock().unwrap().clone()
	}

	pub fn calls(&self) -> Vec<&'static str> {
		self.calls.lock().unwrap().clone()
	}

	fn record(&self, call: &'static str) {
		self.calls.lock().unwrap().push(call);
	}
}

#[async_trait]
impl PlayoutDriver for ScriptedDriver {
	fn name(&self) -> &str {
		"scripted"
	}

	async fn connect(&self) -> Result<(), DriverError> {
		self.record("connect");
		self.connect_results.lock().unwrap().pop_front().unwrap_or(Ok(()))
	}

	async fn status(&self) -> Result<RemoteStatus, DriverError> {
		self.record("status");
		let delay = *self.status_delay.lock().unwrap();
		let running = self.status_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
		self.status_peak.fetch_max(running, Ordering::SeqCst);
		if !delay.is_zero() {
			tokio::time::sleep(delay).await;
		}
		self.status_in_flight.fetch_sub(1, Ordering::SeqCst);
		self.status.lock().unwrap().clone().ok_or(DriverError::NotConnected)
	}

	async fn seek(&self, actual_order: u32, frame: u64) -> Result<(), DriverError> {
		self.record("seek");
		if *self.fail_seeks.lock().unwrap() {
			return Err(DriverError::Rejected("seek refused".into()));
		}
		self.seeks.lock().unwrap().push((actual_order, frame));
		Ok(())
	}
}

/// Store whose saves wait until the test releases them
pub struct GatedStore {
	inner: MemoryStore,
	entered: Notify,
	release: Notify,
	saves: AtomicUsize,
}

impl GatedStore {
	pub fn new(entries: Vec<MediaEntry>) -> Arc<Self> {
		Arc::new(Self {
			inner: MemoryStore::new(entries),
			entered: Notify::new(),
			release: Notify::new(),
			saves: AtomicUsize::new(0),
		})
	}

	/// Resolves once a save has started and is waiting to be released
	pub async fn wait_for_save(&self) {
		self.entered.notified().await;
	}

	pub fn release(&self) {
		self.release.notify_one();
	}

	pub fn saves(&self) -> usize {
		self.saves.load(Ordering::SeqCst)
	}

	pub async fn snapshot(&self) -> Vec<MediaEntry> {
		self.inner.snapshot().await
	}
}

#[async_trait]
impl PlaylistStore for GatedStore {
	async fn load(&self) -> Result<Vec<MediaEntry>, StoreError> {
		self.inner.load().await
	}

	async fn save(&self, entries: &[MediaEntry]) -> Result<(), StoreError> {
		self.entered.notify_one();
		self.release.notified().await;
		self.inner.save(entries).await?;
		self.saves.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}
}

pub fn epoch() -> DateTime<Utc> {
	Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

pub fn at_millis(ms: i64) -> DateTime<Utc> {
	epoch() + ChronoDuration::milliseconds(ms)
}

/// A plays [0s, 10s), B plays [10s, 20s), both 250 frames at 25 fps
pub fn two_entries() -> Vec<MediaEntry> {
	vec![
		MediaEntry::new("A", at_millis(0), at_millis(10_000), 25.0, Length::from(250), 0),
		MediaEntry::new("B", at_millis(10_000), at_millis(20_000), 25.0, Length::from(250), 1),
	]
}

pub fn playlist_with(entries: Vec<MediaEntry>) -> (Playlist, Arc<MemoryStore>) {
	let store = Arc::new(MemoryStore::new(entries.clone()));
	let playlist = Playlist::new(Schedule::new(entries), store.clone());
	(playlist, store)
}
