use playout_heartbeats::{driver, Config, HeartbeatService, JsonFileStore, Playlist, StatusEvent};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::registry()
		.with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "heartbeatd=info,playout_heartbeats=info".into()))
		.with(tracing_subscriber::fmt::layer())
		.init();

	tracing::info!("🚀 Starting playout heartbeats");

	let config = Config::from_env()?;
	tracing::info!(
		"📋 Configuration loaded - driver: {}, melted: {}:{} ({}), playlist: {}",
		config.driver_name,
		config.melted.host,
		config.melted.port,
		config.melted.unit,
		config.playlist_path.display()
	);

	let store = Arc::new(JsonFileStore::new(config.playlist_path.clone()));
	let playlist = Playlist::load(store).await?;
	let driver = driver::from_name(&config.driver_name, &config)?;
	let service = HeartbeatService::new(config, playlist, driver)?;

	let cancel_token = service.cancel_token();
	tokio::spawn(async move {
		match tokio::signal::ctrl_c().await {
			Ok(()) => {
				tracing::info!("🛑 Received shutdown signal (Ctrl+C)");
				cancel_token.cancel();
			}
			Err(e) => {
				tracing::error!("❌ Failed to listen for shutdown signal: {}", e);
			}
		}
	});

	let mut events = service.subscribe();
	tokio::spawn(async move {
		loop {
			match events.recv().await {
				Ok(StatusEvent::ClipChanged(entry)) => {
					tracing::info!("📺 Now playing '{}' (#{})", entry.id, entry.actual_order);
				}
				Ok(StatusEvent::FrameAdvanced(frame)) => {
					tracing::trace!("frame {:.1}", frame);
				}
				Err(async_broadcast::RecvError::Overflowed(skipped)) => {
					tracing::debug!("status listener lagged, skipped {} events", skipped);
				}
				Err(async_broadcast::RecvError::Closed) => break,
			}
		}
	});

	service.run().await?;

	tracing::info!("👋 Playout heartbeats shutdown complete");
	Ok(())
}
