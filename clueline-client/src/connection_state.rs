//! Connection state management
//!
//! Tracks the link's lifecycle and the reconnect budget.
//!
//! # Connection States
//!
//! - **Idle**: not connected and not trying (initial state, and after `disconnect()`)
//! - **Connecting**: an attempt is in flight
//! - **Open**: connected and usable
//! - **Reconnecting**: the link dropped; waiting out the backoff
//! - **Failed**: reconnect attempts exhausted, waiting for a manual `connect()`
//!
//! # State Transitions
//!
//! ```text
//! Idle → Connecting → Open
//!          ↑  ↓         ↓
//!   Reconnecting ←──────┘
//!          ↓
//!        Failed
//! ```
//!
//! `disconnect()` returns any state to Idle.
//!
//! # Reconnect Budget
//!
//! The manager counts consecutive failed or dropped connections. The count
//! is reset by a successful open and by a manual disconnect, and it is the
//! `attempt` argument handed to the [`ReconnectionStrategy`].

use crate::reconnect::ReconnectionStrategy;
use parking_lot::Mutex;
use std::time::Duration;
use tokio::sync::watch;

/// Lifecycle state of the link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected, not trying
    Idle,
    /// Attempting to connect
    Connecting,
    /// Connected
    Open,
    /// Waiting before reconnection attempt number `attempt` (1-based)
    Reconnecting { attempt: u32 },
    /// Gave up reconnecting
    Failed,
}

impl ConnectionState {
    /// Numeric code used for the connection state gauge
    pub fn as_code(&self) -> i64 {
        match self {
            ConnectionState::Idle => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Open => 2,
            ConnectionState::Reconnecting { .. } => 3,
            ConnectionState::Failed => 4,
        }
    }
}

struct Backoff {
    strategy: Box<dyn ReconnectionStrategy>,
    attempts: u32,
}

/// Owns the connection state and the reconnect budget
pub struct ConnectionManager {
    state: watch::Sender<ConnectionState>,
    backoff: Mutex<Backoff>,
}

impl ConnectionManager {
    /// Create a manager in the Idle state
    pub fn new(strategy: Box<dyn ReconnectionStrategy>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Idle);
        Self {
            state,
            backoff: Mutex::new(Backoff {
                strategy,
                attempts: 0,
            }),
        }
    }

    /// Current state
    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state change
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Whether the link is open
    pub fn is_open(&self) -> bool {
        matches!(*self.state.borrow(), ConnectionState::Open)
    }

    /// Consecutive failed or dropped connections since the last success
    pub fn attempts(&self) -> u32 {
        self.backoff.lock().attempts
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }

    /// An attempt is starting
    pub fn connecting(&self) {
        self.set_state(ConnectionState::Connecting);
    }

    /// The link opened; the reconnect budget is restored
    pub fn opened(&self) {
        {
            let mut backoff = self.backoff.lock();
            backoff.attempts = 0;
            backoff.strategy.reset();
        }
        self.set_state(ConnectionState::Open);
    }

    /// Manual close: back to Idle with a fresh budget
    pub fn reset(&self) {
        {
            let mut backoff = self.backoff.lock();
            backoff.attempts = 0;
            backoff.strategy.reset();
        }
        self.set_state(ConnectionState::Idle);
    }

    /// Consume one unit of reconnect budget
    ///
    /// Returns the delay before the next attempt and moves to Reconnecting,
    /// or returns `None` and moves to Failed when the strategy gives up.
    pub fn next_reconnect_delay(&self) -> Option<Duration> {
        let mut backoff = self.backoff.lock();
        let attempt = backoff.attempts;

        match backoff.strategy.next_delay(attempt) {
            Some(delay) => {
                backoff.attempts = attempt + 1;
                let attempt = backoff.attempts;
                drop(backoff);
                self.set_state(ConnectionState::Reconnecting { attempt });
                Some(delay)
            }
            None => {
                drop(backoff);
                self.set_state(ConnectionState::Failed);
                None
            }
        }
    }
}
