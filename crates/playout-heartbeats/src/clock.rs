use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of wall-clock time for the control loop
pub trait Clock: Send + Sync + 'static {
	fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> DateTime<Utc> {
		Utc::now()
	}
}

/// Manually driven clock with millisecond resolution
#[derive(Debug)]
pub struct FixedClock {
	millis: AtomicI64,
}

impl FixedClock {
	pub fn new(at: DateTime<Utc>) -> Self {
		Self {
			millis: AtomicI64::new(at.timestamp_millis()),
		}
	}

	pub fn set(&self, at: DateTime<Utc>) {
		self.millis.store(at.timestamp_millis(), Ordering::SeqCst);
	}

	pub fn advance(&self, by: chrono::Duration) {
		self.millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
	}
}

impl Clock for FixedClock {
	fn now(&self) -> DateTime<Utc> {
		Utc.timestamp_millis_opt(self.millis.load(Ordering::SeqCst)).single().unwrap_or(DateTime::<Utc>::MIN_UTC)
	}
}
