//! # Mosaic Engine
//!
//! Wires the pipeline together:
//!
//! ```text
//! FeedSource -> ConnectionManager -> frames -> filter -> EnrichmentFetcher
//!                                                             |
//!                     PresentationSink <- router <- enriched items
//! ```
//!
//! One task owns the [`EngineState`] and runs [`MosaicEngine::run`]. Viewer
//! controls arrive as [`EngineCommand`]s through a cloneable
//! [`EngineHandle`], so nothing outside that task ever touches slots or
//! flags. Enrichment lookups run concurrently on a `JoinSet` and their
//! results are routed in completion order.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinSet};

use crate::configs::allow_list::AllowList;
use crate::configs::config_engine::{ConfigError, EngineConfig, Viewport};
use crate::core::connection_manager::{ConnectionManager, ConnectionState, FeedSource};
use crate::core::engine_state::{EngineState, Slot};
use crate::core::pause_controller::PauseController;
use crate::core::router::{route, RouteOutcome};
use crate::core::sink::PresentationSink;
use crate::enrich::fetcher::{EmbedLookup, EnrichError, EnrichmentFetcher};
use crate::filters::event_filter::filter;
use crate::models::feed_event::RawEvent;
use crate::models::items::{CandidateItem, DisplayItem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    TogglePause,
    SetSlotPaused { slot: usize, paused: bool },
    Reconfigure(Viewport),
    Shutdown,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine is not running")]
    Closed,

    #[error("invalid engine configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Cloneable remote control for a running engine. The engine stops once
/// every handle is dropped.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<EngineCommand>,
    connection: watch::Receiver<ConnectionState>,
}

impl EngineHandle {
    pub fn toggle_pause(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::TogglePause)
    }

    /// Marks one slot as hovered (`true`) or released (`false`).
    pub fn set_slot_paused(&self, slot: usize, paused: bool) -> Result<(), EngineError> {
        self.send(EngineCommand::SetSlotPaused { slot, paused })
    }

    pub fn reconfigure(&self, viewport: Viewport) -> Result<(), EngineError> {
        self.send(EngineCommand::Reconfigure(viewport))
    }

    pub fn shutdown(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::Shutdown)
    }

    /// Follows the feed connection state.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.connection.clone()
    }

    fn send(&self, command: EngineCommand) -> Result<(), EngineError> {
        self.tx.send(command).map_err(|_| EngineError::Closed)
    }
}

type Resolved = (CandidateItem, Result<Vec<DisplayItem>, EnrichError>);

pub struct MosaicEngine<F, L, S> {
    state: EngineState,
    controller: PauseController,
    connection: ConnectionManager<F>,
    fetcher: Arc<EnrichmentFetcher<L>>,
    allow_list: AllowList,
    sink: S,
    commands: mpsc::UnboundedReceiver<EngineCommand>,
    frames: mpsc::UnboundedReceiver<String>,
    in_flight: JoinSet<Resolved>,
}

impl<F, L, S> MosaicEngine<F, L, S>
where
    F: FeedSource,
    L: EmbedLookup + 'static,
    S: PresentationSink,
{
    /// Validates `config` and builds an engine that has not connected yet.
    pub fn new(config: &EngineConfig, source: F, lookup: L, sink: S) -> Result<(Self, EngineHandle), EngineError> {
        config.validate()?;

        let (frames_tx, frames) = mpsc::unbounded_channel();
        let (tx, commands) = mpsc::unbounded_channel();

        let connection = ConnectionManager::new(source, frames_tx, config.reconnect_delay());
        let fetcher = EnrichmentFetcher::new(
            lookup,
            &config.embed_base_url,
            config.enrichment_mode,
            config.backoff(),
        );
        let controller = PauseController::new(config.slot_policy.clone());
        let slot_count = controller.policy().slot_count(config.initial_viewport);
        let state = EngineState::new(slot_count, config.slot_capacity, config.session_item_ceiling);

        let allow_list = config.allow_list();
        if allow_list.is_empty() {
            log::info!("No hashtag filter configured; every image post is eligible.");
        } else {
            log::info!("Hashtag filter active with {} tags.", allow_list.len());
        }

        let handle = EngineHandle {
            tx,
            connection: connection.subscribe_state(),
        };

        let engine = Self {
            state,
            controller,
            connection,
            fetcher: Arc::new(fetcher),
            allow_list,
            sink,
            commands,
            frames,
            in_flight: JoinSet::new(),
        };
        Ok((engine, handle))
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Runs until [`EngineHandle::shutdown`] is called or every handle is
    /// dropped. Returns the sink so the host can reclaim it.
    pub async fn run(mut self) -> S {
        log::info!(
            "Mosaic engine starting with {} slots (capacity {}).",
            self.state.slot_count(),
            self.state.slot_capacity
        );
        self.sink.on_slots_rebuilt(self.state.slot_count());
        self.connection.start();

        loop {
            tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    Some(EngineCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(done) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    self.handle_resolved(done);
                }
                Some(frame) = self.frames.recv() => self.handle_frame(frame),
            }
        }

        self.connection.stop();
        self.in_flight.abort_all();
        log::info!(
            "Mosaic engine stopped ({} items on screen).",
            self.state.total_items()
        );
        self.sink
    }

    fn handle_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::TogglePause => {
                self.controller
                    .toggle_pause(&mut self.state, &mut self.connection, &mut self.sink);
            }
            EngineCommand::SetSlotPaused { slot, paused } => {
                if !self.controller.set_slot_paused(&mut self.state, slot, paused) {
                    log::warn!("Ignoring pause request for unknown slot {}.", slot);
                }
            }
            EngineCommand::Reconfigure(viewport) => {
                self.controller
                    .reconfigure(&mut self.state, viewport, &mut self.sink);
            }
            EngineCommand::Shutdown => {}
        }
    }

    fn handle_frame(&mut self, frame: String) {
        // Frames still queued from before a pause are stale.
        if self.state.is_globally_paused() {
            return;
        }

        let event = match RawEvent::from_json(&frame) {
            Ok(event) => event,
            Err(e) => {
                log::debug!("Skipping undecodable frame: {}", e);
                return;
            }
        };

        let Some(candidate) = filter(&event, &self.allow_list) else {
            return;
        };

        log::debug!("Resolving candidate {}", candidate.post_url());
        let fetcher = Arc::clone(&self.fetcher);
        self.in_flight.spawn(async move {
            let result = fetcher.resolve(&candidate).await;
            (candidate, result)
        });
    }

    fn handle_resolved(&mut self, done: Result<Resolved, JoinError>) {
        let (candidate, result) = match done {
            Ok(resolved) => resolved,
            Err(e) => {
                if e.is_panic() {
                    log::error!("Enrichment task panicked: {}", e);
                }
                return;
            }
        };

        match result {
            Ok(items) if items.is_empty() => {
                log::debug!("{} resolved to nothing displayable.", candidate.post_url());
            }
            Ok(items) => {
                for item in items {
                    self.place(item);
                }
            }
            Err(e) => log::warn!("Dropping {}: {}", candidate.post_url(), e),
        }
    }

    fn place(&mut self, item: DisplayItem) {
        match route(&mut self.state, item) {
            RouteOutcome::Placed {
                slot,
                evicted,
                ceiling_reached,
            } => {
                if let Some(placed) = self.state.slot(slot).and_then(Slot::newest) {
                    self.sink.on_item(slot, placed);
                }
                for old in &evicted {
                    self.sink.on_evict(slot, old);
                }
                if ceiling_reached {
                    log::info!(
                        "Session ceiling of {} items reached; pausing.",
                        self.state.session_items()
                    );
                    self.controller
                        .pause(&mut self.state, &mut self.connection, &mut self.sink);
                }
            }
            RouteOutcome::AllPaused | RouteOutcome::CeilingReached => {}
        }
    }
}
