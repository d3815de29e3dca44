//! # Connection Manager
//!
//! Owns the single live connection to the upstream feed and its reconnect
//! state machine:
//!
//! ```text
//! Idle -> Connecting -> Open -> Closed
//!             |                   |
//!             +------> Closed     +--(delay, unless stopped)--> Connecting
//! ```
//!
//! A close that was not requested through [`ConnectionManager::stop`] schedules
//! a reconnect after a fixed delay. `stop()` raises the intentional-close flag
//! *before* closing, and the flag is checked again right before a delayed
//! reconnect fires, so a pause always wins over a pending reconnect. The next
//! `start()` clears the flag.
//!
//! Frames are not queued across reconnects: whatever the upstream sends
//! during a gap is lost.

use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::pause_controller::FeedSwitch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Never started.
    Idle,
    Connecting,
    Open,
    Closed,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("invalid feed URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to connect: {0}")]
    Connect(String),

    #[error("stream error: {0}")]
    Stream(String),
}

/// Text frames from one open connection. The stream ending means the remote
/// side closed the connection.
pub type FrameStream = BoxStream<'static, Result<String, ConnectionError>>;

/// Something that can open a connection to the upstream feed.
pub trait FeedSource: Send + Sync + 'static {
    fn connect(&self) -> impl Future<Output = Result<FrameStream, ConnectionError>> + Send;
}

struct Shared {
    state: watch::Sender<ConnectionState>,
    intentional_close: AtomicBool,
    attempts: AtomicU64,
}

impl Shared {
    fn set_state(&self, next: ConnectionState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            log::debug!("Feed connection: {:?} -> {:?}", prev, next);
        }
    }
}

struct ActiveConnection {
    token: CancellationToken,
    task: JoinHandle<()>,
}

pub struct ConnectionManager<F> {
    source: Arc<F>,
    frames: mpsc::UnboundedSender<String>,
    reconnect_delay: Duration,
    shared: Arc<Shared>,
    active: Option<ActiveConnection>,
}

impl<F: FeedSource> ConnectionManager<F> {
    /// Creates an idle manager. Received text frames are forwarded to `frames`.
    pub fn new(source: F, frames: mpsc::UnboundedSender<String>, reconnect_delay: Duration) -> Self {
        let (state, _) = watch::channel(ConnectionState::Idle);
        Self {
            source: Arc::new(source),
            frames,
            reconnect_delay,
            shared: Arc::new(Shared {
                state,
                intentional_close: AtomicBool::new(false),
                attempts: AtomicU64::new(0),
            }),
            active: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    /// Watch channel following every state transition.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    /// Total connection attempts since the manager was created.
    pub fn attempts(&self) -> u64 {
        self.shared.attempts.load(Ordering::SeqCst)
    }

    pub fn is_intentionally_closed(&self) -> bool {
        self.shared.intentional_close.load(Ordering::SeqCst)
    }

    /// Tears down any previous connection, then opens a new one.
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        self.teardown();
        self.shared.intentional_close.store(false, Ordering::SeqCst);

        let token = CancellationToken::new();
        let task = tokio::spawn(run_connection(
            Arc::clone(&self.source),
            self.frames.clone(),
            Arc::clone(&self.shared),
            self.reconnect_delay,
            token.clone(),
        ));
        self.active = Some(ActiveConnection { token, task });
    }

    /// Closes the live connection and suppresses the automatic reconnect.
    pub fn stop(&mut self) {
        self.shared.intentional_close.store(true, Ordering::SeqCst);
        if let Some(active) = &self.active {
            active.token.cancel();
        }
        if self.state() != ConnectionState::Idle {
            self.shared.set_state(ConnectionState::Closed);
        }
    }

    fn teardown(&mut self) {
        if let Some(active) = self.active.take() {
            active.token.cancel();
            active.task.abort();
        }
    }
}

impl<F: FeedSource> FeedSwitch for ConnectionManager<F> {
    fn start(&mut self) {
        ConnectionManager::start(self);
    }

    fn stop(&mut self) {
        ConnectionManager::stop(self);
    }
}

impl<F> Drop for ConnectionManager<F> {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.token.cancel();
            active.task.abort();
        }
    }
}

/// Connection loop for one `start()`: connect, forward frames, and reconnect
/// after `delay` until cancelled or intentionally closed.
async fn run_connection<F: FeedSource>(
    source: Arc<F>,
    frames: mpsc::UnboundedSender<String>,
    shared: Arc<Shared>,
    delay: Duration,
    token: CancellationToken,
) {
    loop {
        shared.set_state(ConnectionState::Connecting);
        let attempt = shared.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        log::info!("Connecting to feed (attempt {})", attempt);

        let connected = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            res = source.connect() => res,
        };

        match connected {
            Ok(mut stream) => {
                shared.set_state(ConnectionState::Open);
                log::info!("Feed connection open.");

                loop {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => {
                            log::info!("Feed connection closed on request.");
                            return;
                        }
                        frame = stream.next() => match frame {
                            Some(Ok(text)) => {
                                if frames.send(text).is_err() {
                                    log::info!("Frame receiver dropped; closing feed connection.");
                                    shared.set_state(ConnectionState::Closed);
                                    return;
                                }
                            }
                            Some(Err(e)) => {
                                log::error!("Feed stream error: {}", e);
                                break;
                            }
                            None => {
                                log::warn!("Feed stream closed by remote host.");
                                break;
                            }
                        }
                    }
                }
            }
            Err(e) => log::error!("Failed to connect to feed: {}", e),
        }

        shared.set_state(ConnectionState::Closed);
        if shared.intentional_close.load(Ordering::SeqCst) {
            return;
        }

        log::info!("Reconnecting in {}ms...", delay.as_millis());
        tokio::select! {
            biased;
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
        if shared.intentional_close.load(Ordering::SeqCst) {
            log::debug!("Reconnect suppressed by manual pause.");
            return;
        }
    }
}
