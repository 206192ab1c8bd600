use crate::gc::GarbageCollector;
use crate::HeartbeatService;
use std::sync::Arc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

impl HeartbeatService {
	/// Spawn the periodic garbage collector
	pub(crate) fn spawn_gc_loop(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
		tokio::spawn(async move {
			tracing::info!("🧹 Starting garbage collector every {:?}", self.config.gc_interval);

			let collector = GarbageCollector::new(self.playlist.clone(), self.clock.clone(), self.config.retention_window);
			let period = self.config.gc_interval;
			let mut ticker = interval_at(Instant::now() + period, period);
			ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

			loop {
				tokio::select! {
					_ = self.cancel_token.cancelled() => {
						tracing::info!("🛑 Garbage collector shutting down");
						break;
					}
					_ = ticker.tick() => {
						if let Err(e) = collector.collect().await {
							tracing::error!("❌ Garbage collection failed: {}", e);
						}
					}
				}
			}

			tracing::info!("✅ Garbage collector stopped");
		})
	}
}
