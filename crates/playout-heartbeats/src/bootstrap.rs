use crate::driver::PlayoutDriver;
use crate::error::{HeartbeatError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Lifecycle of the playout driver session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
	Disconnected,
	Connecting { attempt: u32 },
	/// Waiting out the backoff after a failed attempt
	Backoff { attempt: u32 },
	Connected { attempts: u32 },
	/// Terminal, reached only on deliberate shutdown
	Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTransition {
	Attempt,
	AttemptFailed,
	Established,
	Shutdown,
}

/// Validate a transition and return the next state
pub fn transition(current: SessionState, event: SessionTransition) -> Result<SessionState> {
	use SessionState::*;
	use SessionTransition::*;

	Ok(match (current, event) {
		(Disconnected, Attempt) => Connecting { attempt: 1 },
		(Backoff { attempt }, Attempt) => Connecting { attempt: attempt.saturating_add(1) },
		(Connecting { attempt }, AttemptFailed) => Backoff { attempt },
		(Connecting { attempt }, Established) => Connected { attempts: attempt },
		(_, Shutdown) => Stopped,
		(from, event) => return Err(HeartbeatError::InvalidTransition(format!("{from:?} -/-> {event:?}"))),
	})
}

/// Establishes the driver session, retrying forever with a fixed backoff
pub struct Bootstrapper {
	driver: Arc<dyn PlayoutDriver>,
	backoff: Duration,
	state_tx: watch::Sender<SessionState>,
}

impl Bootstrapper {
	pub fn new(driver: Arc<dyn PlayoutDriver>, backoff: Duration) -> Self {
		let (state_tx, _) = watch::channel(SessionState::Disconnected);
		Self { driver, backoff, state_tx }
	}

	pub fn subscribe(&self) -> watch::Receiver<SessionState> {
		self.state_tx.subscribe()
	}

	pub fn state(&self) -> SessionState {
		*self.state_tx.borrow()
	}

	fn apply(&self, event: SessionTransition) -> Result<SessionState> {
		let next = transition(self.state(), event)?;
		self.state_tx.send_replace(next);
		Ok(next)
	}

	/// Suspends until the driver session is up. Returns the number of attempts it took.
	pub async fn start(&self, cancel: &CancellationToken) -> Result<u32> {
		loop {
			let state = self.apply(SessionTransition::Attempt)?;

			let result = tokio::select! {
				_ = cancel.cancelled() => {
					self.stop();
					return Err(HeartbeatError::Cancelled);
				}
				result = self.driver.connect() => result,
			};

			match result {
				Ok(()) => match self.apply(SessionTransition::Established)? {
					SessionState::Connected { attempts } => {
						info!("✅ Playout driver '{}' session started after {} attempt(s)", self.driver.name(), attempts);
						return Ok(attempts);
					}
					other => return Err(HeartbeatError::InvalidTransition(format!("expected Connected, got {other:?}"))),
				},
				Err(e) => {
					self.apply(SessionTransition::AttemptFailed)?;
					let err = HeartbeatError::ConnectionFailure(e);
					error!("❌ {} ({:?}). Retrying in {:?}...", err, state, self.backoff);

					tokio::select! {
						_ = cancel.cancelled() => {
							self.stop();
							return Err(HeartbeatError::Cancelled);
						}
						_ = tokio::time::sleep(self.backoff) => {}
					}
				}
			}
		}
	}

	/// Move to the terminal state
	pub fn stop(&self) {
		self.state_tx.send_replace(SessionState::Stopped);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use SessionState::*;
	use SessionTransition::*;

	#[test]
	fn test_transition_table() {
		assert_eq!(transition(Disconnected, Attempt).unwrap(), Connecting { attempt: 1 });
		assert_eq!(transition(Connecting { attempt: 1 }, AttemptFailed).unwrap(), Backoff { attempt: 1 });
		assert_eq!(transition(Backoff { attempt: 1 }, Attempt).unwrap(), Connecting { attempt: 2 });
		assert_eq!(transition(Connecting { attempt: 3 }, Established).unwrap(), Connected { attempts: 3 });
		assert_eq!(transition(Connected { attempts: 3 }, Shutdown).unwrap(), Stopped);
		assert_eq!(transition(Backoff { attempt: 2 }, Shutdown).unwrap(), Stopped);
	}

	#[test]
	fn test_attempt_counter_saturates() {
		assert_eq!(transition(Backoff { attempt: u32::MAX }, Attempt).unwrap(), Connecting { attempt: u32::MAX });
	}

	#[test]
	fn test_invalid_transitions() {
		assert!(transition(Disconnected, Established).is_err());
		assert!(transition(Connected { attempts: 1 }, Attempt).is_err());
		assert!(transition(Backoff { attempt: 1 }, Established).is_err());
		assert!(transition(Stopped, Attempt).is_err());
	}
}
