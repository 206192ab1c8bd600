use crate::error::{HeartbeatError, Result};
use crate::store::PlaylistStore;
use crate::types::MediaEntry;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Ordered view over the scheduled entries, in playback order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
	entries: Vec<MediaEntry>,
}

impl Schedule {
	pub fn new(entries: Vec<MediaEntry>) -> Self {
		Self { entries }
	}

	pub fn entries(&self) -> &[MediaEntry] {
		&self.entries
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Position of the first entry in playback order whose end has not passed yet
	pub fn expected_index(&self, now: DateTime<Utc>) -> Result<usize> {
		self.entries.iter().position(|entry| entry.end >= now).ok_or(HeartbeatError::ScheduleExhausted { at: now })
	}

	pub fn find_expected(&self, now: DateTime<Utc>) -> Result<&MediaEntry> {
		self.entries.iter().find(|entry| entry.end >= now).ok_or(HeartbeatError::ScheduleExhausted { at: now })
	}

	/// Position of this exact entry. The same media can be scheduled more
	/// than once, so the whole entry is compared, not only its id.
	pub fn index_of(&self, entry: &MediaEntry) -> Option<usize> {
		self.entries.iter().position(|candidate| candidate == entry)
	}

	pub fn at(&self, index: usize) -> Option<&MediaEntry> {
		self.entries.get(index)
	}

	/// Entry played right before `entry`
	pub fn neighbor_above(&self, entry: &MediaEntry) -> Option<&MediaEntry> {
		self.above(self.index_of(entry)?)
	}

	/// Entry played right after `entry`
	pub fn neighbor_below(&self, entry: &MediaEntry) -> Option<&MediaEntry> {
		self.below(self.index_of(entry)?)
	}

	pub fn above(&self, index: usize) -> Option<&MediaEntry> {
		self.at(index.checked_sub(1)?)
	}

	pub fn below(&self, index: usize) -> Option<&MediaEntry> {
		self.at(index.checked_add(1)?)
	}

	/// Removes every entry matching `predicate` in one pass, preserving the order of the rest
	pub fn remove_where<F>(&mut self, mut predicate: F) -> Vec<MediaEntry>
	where
		F: FnMut(&MediaEntry) -> bool,
	{
		let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries).into_iter().partition(|entry| predicate(entry));
		self.entries = kept;
		removed
	}
}

/// Shared handle to the schedule and the store that persists it.
///
/// Every reader and writer goes through the same lock, so a removal never
/// interleaves with a lookup.
#[derive(Clone)]
pub struct Playlist {
	schedule: Arc<Mutex<Schedule>>,
	store: Arc<dyn PlaylistStore>,
}

impl Playlist {
	pub fn new(schedule: Schedule, store: Arc<dyn PlaylistStore>) -> Self {
		Self {
			schedule: Arc::new(Mutex::new(schedule)),
			store,
		}
	}

	/// Seed the playlist from the store
	pub async fn load(store: Arc<dyn PlaylistStore>) -> Result<Self> {
		let entries = store.load().await?;
		for entry in &entries {
			entry.validate()?;
		}
		tracing::info!("📋 Loaded playlist with {} entries", entries.len());
		Ok(Self::new(Schedule::new(entries), store))
	}

	pub async fn lock(&self) -> MutexGuard<'_, Schedule> {
		self.schedule.lock().await
	}

	pub async fn read<R>(&self, f: impl FnOnce(&Schedule) -> R) -> R {
		f(&*self.schedule.lock().await)
	}

	pub async fn snapshot(&self) -> Vec<MediaEntry> {
		self.schedule.lock().await.entries().to_vec()
	}

	/// Write the current sequence to the store
	pub async fn persist(&self) -> Result<()> {
		let schedule = self.schedule.lock().await;
		self.store.save(schedule.entries()).await?;
		Ok(())
	}

	/// Remove matching entries and, if any were removed, persist before releasing the lock
	pub async fn remove_and_persist<F>(&self, predicate: F) -> Result<Vec<MediaEntry>>
	where
		F: FnMut(&MediaEntry) -> bool,
	{
		let mut schedule = self.schedule.lock().await;
		let removed = schedule.remove_where(predicate);
		if !removed.is_empty() {
			self.store.save(schedule.entries()).await?;
		}
		Ok(removed)
	}
}
