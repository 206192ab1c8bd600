use crate::bootstrap::{Bootstrapper, SessionState};
use crate::clock::{Clock, SystemClock};
use crate::driver::PlayoutDriver;
use crate::error::{HeartbeatError, Result};
use crate::schedule::Playlist;
use crate::status::{StatusEmitter, StatusEvent};
use crate::Config;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

mod gc;
mod sync;

/// Keeps the playout engine in step with the playlist
pub struct HeartbeatService {
	config: Config,
	playlist: Playlist,
	driver: Arc<dyn PlayoutDriver>,
	clock: Arc<dyn Clock>,
	emitter: StatusEmitter,
	bootstrapper: Bootstrapper,
	cancel_token: CancellationToken,
}

impl HeartbeatService {
	pub fn new(config: Config, playlist: Playlist, driver: Arc<dyn PlayoutDriver>) -> Result<Self> {
		config.validate()?;
		let bootstrapper = Bootstrapper::new(driver.clone(), config.connect_backoff);
		let emitter = StatusEmitter::new(config.status_capacity);

		Ok(Self {
			config,
			playlist,
			driver,
			clock: Arc::new(SystemClock),
			emitter,
			bootstrapper,
			cancel_token: CancellationToken::new(),
		})
	}

	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;
		self
	}

	pub fn subscribe(&self) -> async_broadcast::Receiver<StatusEvent> {
		self.emitter.subscribe()
	}

	pub fn session_state(&self) -> watch::Receiver<SessionState> {
		self.bootstrapper.subscribe()
	}

	pub fn cancel_token(&self) -> CancellationToken {
		self.cancel_token.clone()
	}

	pub fn playlist(&self) -> &Playlist {
		&self.playlist
	}

	/// Run until cancelled: connect, then drive the sync and GC loops
	pub async fn run(self) -> Result<()> {
		let service = Arc::new(self);

		tracing::info!("💓 Starting heartbeats with driver '{}'", service.driver.name());
		match service.bootstrapper.start(&service.cancel_token).await {
			Ok(_) => {}
			Err(HeartbeatError::Cancelled) => {
				tracing::info!("🛑 Cancelled before the driver session was established");
				return Ok(());
			}
			Err(e) => return Err(e),
		}

		let sync_loop = service.clone().spawn_sync_loop();
		let gc_loop = service.clone().spawn_gc_loop();

		service.cancel_token.cancelled().await;
		tracing::info!("🔄 Initiating graceful shutdown...");

		if timeout(service.config.shutdown_timeout, async {
			let _ = tokio::join!(sync_loop, gc_loop);
		})
		.await
		.is_err()
		{
			tracing::warn!("⚠️ Timers did not stop within {:?}", service.config.shutdown_timeout);
		}

		service.bootstrapper.stop();
		tracing::info!("✅ Heartbeats stopped");
		Ok(())
	}

	/// Run on a background task
	pub fn spawn(self) -> ServiceHandle {
		let cancel_token = self.cancel_token.clone();
		let session = self.session_state();
		let events = self.subscribe().deactivate();
		let task = tokio::spawn(self.run());

		ServiceHandle {
			cancel_token,
			session,
			events,
			task,
		}
	}

	/// Tick-level error handler: log, then force the playlist out to the store
	pub(crate) async fn handle_error(&self, error: &HeartbeatError) {
		tracing::error!("❌ Sync tick failed: {}", error);
		// TODO: compare the driver's queue with the playlist, repair it and restart playback
		if let Err(e) = self.playlist.persist().await {
			tracing::error!("❌ Failed to persist playlist after sync error: {}", e);
		}
	}
}

/// Handle to a spawned service
pub struct ServiceHandle {
	cancel_token: CancellationToken,
	session: watch::Receiver<SessionState>,
	events: async_broadcast::InactiveReceiver<StatusEvent>,
	task: JoinHandle<Result<()>>,
}

impl ServiceHandle {
	pub fn session_state(&self) -> watch::Receiver<SessionState> {
		self.session.clone()
	}

	pub fn subscribe(&self) -> async_broadcast::Receiver<StatusEvent> {
		self.events.activate_cloned()
	}

	pub fn is_running(&self) -> bool {
		!self.task.is_finished()
	}

	/// Cancel both loops and wait for the service to wind down
	pub async fn stop(self) -> Result<()> {
		self.cancel_token.cancel();
		match self.task.await {
			Ok(result) => result,
			Err(e) => Err(HeartbeatError::Task(e.to_string())),
		}
	}
}
