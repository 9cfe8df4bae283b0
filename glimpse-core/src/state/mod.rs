//! Process-wide connection state, owned by the supervisor.
//!
//! The state outlives individual sessions: a session only ever pushes
//! `ConnectedActive` reports while its cycles complete; the supervisor
//! drives everything else.

use std::sync::{Arc, Mutex};

use crate::event::{EventSender, MirrorEvent};

// ── ConnectionState ──────────────────────────────────────────────

/// Observable connection state.
///
/// ```text
///  Unknown ──► ConnectedIdle ──► ConnectedActive
///     │              ▲  ▲              │
///     ▼              │  └──────────────┘
///  Disconnected ─────┘
/// ```
///
/// `ConnectedActive` holds only while request/response cycles are
/// completing; the moment the exchange loop ends the state decays back
/// to `ConnectedIdle`. `Disconnected` means the last connection attempt
/// failed and no transport exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Initial value before any connection attempt completes.
    #[default]
    Unknown,

    /// No transport; the last connection attempt failed.
    Disconnected,

    /// Transport open but no cycle completed recently.
    ConnectedIdle,

    /// A request/response cycle is in flight or just completed.
    ConnectedActive,
}

impl ConnectionState {
    /// Whether a transport currently exists.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::ConnectedIdle | Self::ConnectedActive)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "Unknown"),
            Self::Disconnected => write!(f, "Disconnected"),
            Self::ConnectedIdle => write!(f, "ConnectedIdle"),
            Self::ConnectedActive => write!(f, "ConnectedActive"),
        }
    }
}

// ── StateReporter ────────────────────────────────────────────────

/// Deduplicating publisher for [`ConnectionState`].
///
/// Cloned into sessions so they can report cycle completions; the
/// observer only sees `StateChanged` events for actual transitions.
#[derive(Clone)]
pub struct StateReporter {
    events: EventSender,
    current: Arc<Mutex<ConnectionState>>,
}

impl StateReporter {
    /// New reporter starting in [`ConnectionState::Unknown`].
    pub fn new(events: EventSender) -> Self {
        Self {
            events,
            current: Arc::new(Mutex::new(ConnectionState::Unknown)),
        }
    }

    /// Publish `next`, emitting an event only when it differs from the
    /// current state. The observer side may be gone during teardown, so
    /// a closed channel is ignored.
    pub fn report(&self, next: ConnectionState) {
        let mut current = self.current.lock().expect("state lock poisoned");
        if *current != next {
            tracing::debug!(state = %next, "connection state change");
            let _ = self.events.send(MirrorEvent::StateChanged(next));
            *current = next;
        }
    }

    /// The most recently reported state.
    pub fn current(&self) -> ConnectionState {
        *self.current.lock().expect("state lock poisoned")
    }
}

// ── Tests ────────────────────────────────────────────────────────
