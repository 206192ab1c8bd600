mod common;

use common::{at_millis, playlist_with, two_entries, ScriptedDriver};
use playout_heartbeats::{Config, FixedClock, HeartbeatService, PlaybackStatus, SessionState, StatusEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

fn fast_config() -> Config {
	Config::default().with_sync_interval(Duration::from_millis(20)).with_connect_backoff(Duration::from_millis(10))
}

#[tokio::test]
async fn test_connects_after_retries_before_polling() {
	let driver = ScriptedDriver::new();
	driver.fail_connects(2);
	driver.set_playing("A", 100.0, 250.0);
	let (playlist, _store) = playlist_with(two_entries());

	let service = HeartbeatService::new(fast_config(), playlist, driver.clone()).unwrap().with_clock(Arc::new(FixedClock::new(at_millis(4_000))));
	let handle = service.spawn();
	let mut session = handle.session_state();
	let mut events = handle.subscribe();

	let state = timeout(Duration::from_secs(2), session.wait_for(|s| matches!(s, SessionState::Connected { .. })))
		.await
		.expect("session never connected")
		.map(|s| *s)
		.unwrap();
	assert_eq!(state, SessionState::Connected { attempts: 3 });

	let event = timeout(Duration::from_secs(2), events.recv()).await.expect("no status event").unwrap();
	assert_eq!(event, StatusEvent::FrameAdvanced(100.0));

	let calls = driver.calls();
	assert_eq!(&calls[..3], &["connect", "connect", "connect"]);
	assert_eq!(calls.iter().filter(|c| **c == "connect").count(), 3);
	assert!(calls[3..].iter().all(|c| *c == "status"));

	handle.stop().await.unwrap();
	assert_eq!(*session.borrow(), SessionState::Stopped);
}

#[tokio::test]
async fn test_sync_errors_persist_playlist() {
	let driver = ScriptedDriver::new();
	driver.set_status(PlaybackStatus::from_word("stopped"), "A", 0.0, 250.0);
	let (playlist, store) = playlist_with(two_entries());

	let service = HeartbeatService::new(fast_config(), playlist, driver.clone()).unwrap().with_clock(Arc::new(FixedClock::new(at_millis(4_000))));
	let handle = service.spawn();

	let persisted = timeout(Duration::from_secs(2), async {
		while store.saves() == 0 {
			tokio::time::sleep(Duration::from_millis(10)).await;
		}
	})
	.await;
	assert!(persisted.is_ok(), "error handler never persisted the playlist");
	assert!(driver.seeks().is_empty());
	assert_eq!(store.snapshot().await, two_entries());

	handle.stop().await.unwrap();
}

#[tokio::test]
async fn test_gc_loop_prunes_finished_entries() {
	let driver = ScriptedDriver::new();
	driver.set_playing("B", 0.0, 250.0);
	let (playlist, store) = playlist_with(two_entries());
	let config = fast_config().with_gc_interval(Duration::from_millis(20)).with_retention_window(Duration::from_secs(5));

	// 17s: A ended 7s ago, B is still on air
	let service = HeartbeatService::new(config, playlist.clone(), driver).unwrap().with_clock(Arc::new(FixedClock::new(at_millis(17_000))));
	let handle = service.spawn();

	let pruned = timeout(Duration::from_secs(2), async {
		while store.snapshot().await.len() != 1 {
			tokio::time::sleep(Duration::from_millis(10)).await;
		}
	})
	.await;
	assert!(pruned.is_ok(), "garbage collector never ran");

	let remaining = playlist.snapshot().await;
	assert_eq!(remaining.len(), 1);
	assert_eq!(remaining[0].id, "B");

	handle.stop().await.unwrap();
}

#[tokio::test]
async fn test_stop_while_still_connecting() {
	let driver = ScriptedDriver::new();
	driver.fail_connects(1_000);
	let (playlist, _store) = playlist_with(two_entries());

	let handle = HeartbeatService::new(fast_config(), playlist, driver.clone()).unwrap().spawn();
	let mut session = handle.session_state();

	timeout(Duration::from_secs(2), session.wait_for(|s| matches!(s, SessionState::Backoff { attempt } if *attempt >= 2)))
		.await
		.expect("never retried")
		.unwrap();

	handle.stop().await.unwrap();
	assert_eq!(*session.borrow(), SessionState::Stopped);
	assert!(!driver.calls().contains(&"status"));
}

#[tokio::test]
async fn test_rejects_invalid_config() {
	let (playlist, _store) = playlist_with(two_entries());
	let config = Config::default().with_sync_interval(Duration::ZERO);

	assert!(HeartbeatService::new(config, playlist, ScriptedDriver::new()).is_err());
}
