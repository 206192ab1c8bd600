use crate::types::MediaEntry;
use async_broadcast::{InactiveReceiver, Receiver, Sender, TrySendError};
use tracing::{debug, trace};

/// Notifications raised on each sync tick
#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
	/// The entry on air changed
	ClipChanged(MediaEntry),
	/// Frame offset of the entry on air
	FrameAdvanced(f64),
}

/// Best-effort fan-out of status events.
///
/// Slow subscribers lose the oldest events; emitting never waits.
#[derive(Clone)]
pub struct StatusEmitter {
	sender: Sender<StatusEvent>,
	_keep_open: InactiveReceiver<StatusEvent>,
}

impl StatusEmitter {
	pub fn new(capacity: usize) -> Self {
		let (mut sender, receiver) = async_broadcast::broadcast(capacity.max(1));
		sender.set_overflow(true);
		sender.set_await_active(false);

		Self {
			sender,
			_keep_open: receiver.deactivate(),
		}
	}

	pub fn subscribe(&self) -> Receiver<StatusEvent> {
		self.sender.new_receiver()
	}

	pub fn subscriber_count(&self) -> usize {
		self.sender.receiver_count()
	}

	pub fn clip_changed(&self, entry: MediaEntry) {
		self.emit(StatusEvent::ClipChanged(entry));
	}

	pub fn frame_advanced(&self, frame_offset: f64) {
		self.emit(StatusEvent::FrameAdvanced(frame_offset));
	}

	fn emit(&self, event: StatusEvent) {
		match self.sender.try_broadcast(event) {
			Ok(Some(dropped)) => trace!(?dropped, "status subscriber lagging, dropped oldest event"),
			Ok(None) => {}
			Err(TrySendError::Inactive(_)) => trace!("no status subscribers"),
			Err(e) => debug!("failed to emit status event: {}", e),
		}
	}
}

impl Default for StatusEmitter {
	fn default() -> Self {
		Self::new(64)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_events_reach_every_subscriber() {
		let emitter = StatusEmitter::new(8);
		let mut rx1 = emitter.subscribe();
		let mut rx2 = emitter.subscribe();

		emitter.frame_advanced(12.0);

		assert_eq!(rx1.recv().await.unwrap(), StatusEvent::FrameAdvanced(12.0));
		assert_eq!(rx2.recv().await.unwrap(), StatusEvent::FrameAdvanced(12.0));
	}

	#[tokio::test]
	async fn test_emit_without_subscribers_is_silent() {
		let emitter = StatusEmitter::new(2);
		emitter.frame_advanced(1.0);
		assert_eq!(emitter.subscriber_count(), 0);
	}

	#[tokio::test]
	async fn test_lagging_subscriber_keeps_newest() {
		let emitter = StatusEmitter::new(2);
		let mut rx = emitter.subscribe();
		for frame in 0..5 {
			emitter.frame_advanced(f64::from(frame));
		}
		assert!(matches!(rx.recv().await, Err(async_broadcast::RecvError::Overflowed(_))));
		assert_eq!(rx.recv().await.unwrap(), StatusEvent::FrameAdvanced(3.0));
		assert_eq!(rx.recv().await.unwrap(), StatusEvent::FrameAdvanced(4.0));
	}
}
