use crate::clock::Clock;
use crate::error::{HeartbeatError, Result};
use crate::schedule::Playlist;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Removes entries that finished more than `retention` ago
pub struct GarbageCollector {
	playlist: Playlist,
	clock: Arc<dyn Clock>,
	retention: Duration,
}

impl GarbageCollector {
	pub fn new(playlist: Playlist, clock: Arc<dyn Clock>, retention: Duration) -> Self {
		Self { playlist, clock, retention }
	}

	/// Run one collection pass. Returns how many entries were removed.
	pub async fn collect(&self) -> Result<usize> {
		info!("🧹 Started garbage collector");
		let retention = chrono::Duration::from_std(self.retention).map_err(|e| HeartbeatError::Config(format!("retention window out of range: {e}")))?;
		let limit = self.clock.now() - retention;

		let removed = self.playlist.remove_and_persist(|entry| entry.end < limit).await?;

		info!("🧹 Finished garbage collector: {} removed", removed.len());
		Ok(removed.len())
	}
}
