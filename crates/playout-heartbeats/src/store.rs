use crate::types::MediaEntry;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("Store unavailable: {0}")]
	Unavailable(String),
}

/// Durable backing for the playlist. A mutation only becomes durable once `save` is called.
#[async_trait]
pub trait PlaylistStore: Send + Sync {
	async fn load(&self) -> Result<Vec<MediaEntry>, StoreError>;

	async fn save(&self, entries: &[MediaEntry]) -> Result<(), StoreError>;
}

/// Playlist persisted as a JSON array on disk
#[derive(Debug, Clone)]
pub struct JsonFileStore {
	path: PathBuf,
}

impl JsonFileStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

#[async_trait]
impl PlaylistStore for JsonFileStore {
	/// A missing file is an empty playlist
	async fn load(&self) -> Result<Vec<MediaEntry>, StoreError> {
		match tokio::fs::read(&self.path).await {
			Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				debug!("playlist file {} not found, starting empty", self.path.display());
				Ok(Vec::new())
			}
			Err(e) => Err(e.into()),
		}
	}

	async fn save(&self, entries: &[MediaEntry]) -> Result<(), StoreError> {
		let bytes = serde_json::to_vec_pretty(entries)?;
		let tmp = self.path.with_extension("json.tmp");
		tokio::fs::write(&tmp, bytes).await?;
		tokio::fs::rename(&tmp, &self.path).await?;
		debug!("saved {} entries to {}", entries.len(), self.path.display());
		Ok(())
	}
}

/// In-process store, mainly for embedding and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
	entries: Mutex<Vec<MediaEntry>>,
	saves: AtomicUsize,
	fail_saves: AtomicBool,
}

impl MemoryStore {
	pub fn new(entries: Vec<MediaEntry>) -> Self {
		Self {
			entries: Mutex::new(entries),
			..Self::default()
		}
	}

	/// Number of successful `save` calls
	pub fn saves(&self) -> usize {
		self.saves.load(Ordering::SeqCst)
	}

	pub fn set_fail_saves(&self, fail: bool) {
		self.fail_saves.store(fail, Ordering::SeqCst);
	}

	pub async fn snapshot(&self) -> Vec<MediaEntry> {
		self.entries.lock().await.clone()
	}
}

#[async_trait]
impl PlaylistStore for MemoryStore {
	async fn load(&self) -> Result<Vec<MediaEntry>, StoreError> {
		Ok(self.entries.lock().await.clone())
	}

	async fn save(&self, entries: &[MediaEntry]) -> Result<(), StoreError> {
		if self.fail_saves.load(Ordering::SeqCst) {
			return Err(StoreError::Unavailable("saves disabled".into()));
		}
		*self.entries.lock().await = entries.to_vec();
		self.saves.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}
}
