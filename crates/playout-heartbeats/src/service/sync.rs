use crate::reconciler::{Reconciler, TickOutcome};
use crate::HeartbeatService;
use std::sync::Arc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

impl HeartbeatService {
	/// Spawn the sync loop. Ticks run one at a time; a tick that is still
	/// waiting on the driver makes the following ones skip.
	pub(crate) fn spawn_sync_loop(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
		tokio::spawn(async move {
			tracing::info!("🔁 Starting sync loop every {:?}", self.config.sync_interval);

			let mut reconciler = Reconciler::new(self.driver.clone(), self.playlist.clone(), self.clock.clone(), self.emitter.clone());
			let period = self.config.sync_interval;
			let mut ticker = interval_at(Instant::now() + period, period);
			ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

			loop {
				tokio::select! {
					_ = self.cancel_token.cancelled() => {
						tracing::info!("🛑 Sync loop shutting down");
						break;
					}
					_ = ticker.tick() => {
						match reconciler.tick().await {
							Ok(TickOutcome::InSync { frame_offset, .. }) => {
								tracing::trace!("sync tick in step at frame {:.1}", frame_offset);
							}
							Ok(TickOutcome::Corrected { actual_order, frame, .. }) => {
								tracing::info!("🎯 Corrected playout to clip #{} frame {}", actual_order, frame);
							}
							Err(e) => self.handle_error(&e).await,
						}
					}
				}
			}

			tracing::info!("✅ Sync loop stopped");
		})
	}
}
