//! # Engine Core
//!
//! The stateful half of the crate. `engine_state` holds the slots and flags,
//! `router` and `pause_controller` are the only code that mutates them,
//! `connection_manager` keeps the feed connection alive and `engine` runs the
//! whole thing on one task.

pub mod connection_manager;
pub mod engine;
pub mod engine_state;
pub mod pause_controller;
pub mod router;
pub mod sink;

pub use connection_manager::{ConnectionError, ConnectionManager, ConnectionState, FeedSource, FrameStream};
pub use engine::{EngineCommand, EngineError, EngineHandle, MosaicEngine};
pub use engine_state::{EngineState, Slot};
pub use pause_controller::{FeedSwitch, PauseController};
pub use router::{next_open_slot, route, RouteOutcome};
pub use sink::{PresentationSink, SinkEvent};
