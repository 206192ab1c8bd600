// playout-heartbeats
//
// Keeps a playout engine (melted) in step with a wall-clock playlist:
// polls the engine, compares it with the entry that should be on air,
// seeks when they drift apart, and prunes finished entries.

pub mod bootstrap;
pub mod clock;
pub mod config;
pub mod driver;
pub mod error;
pub mod expectation;
pub mod gc;
pub mod reconciler;
pub mod schedule;
pub mod service;
pub mod status;
pub mod store;
pub mod types;

pub use bootstrap::{Bootstrapper, SessionState};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, MeltedConfig};
pub use driver::{DriverError, MeltedDriver, PlayoutDriver};
pub use error::{HeartbeatError, Result};
pub use expectation::{compute_expected, ExpectedPosition};
pub use gc::GarbageCollector;
pub use reconciler::{Assessment, Divergence, Drift, Reconciler, TickOutcome};
pub use schedule::{Playlist, Schedule};
pub use service::{HeartbeatService, ServiceHandle};
pub use status::{StatusEmitter, StatusEvent};
pub use store::{JsonFileStore, MemoryStore, PlaylistStore, StoreError};
pub use types::{Length, MediaEntry, MediaId, PlaybackStatus, RemoteClip, RemoteStatus};
