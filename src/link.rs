use std::time::{Duration, Instant};

use chrono::Local;
use tracing::{debug, info, trace, warn};

use crate::error::LinkError;
use crate::state::{ConnectionStatus, DashboardState};

/// Identifies one transport attempt. Events from older attempts are ignored.
pub type ConnId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEventKind {
    Opened,
    Message(String),
    Error(String),
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportEvent {
    pub conn: ConnId,
    pub kind: TransportEventKind,
}

pub trait TransportHandle: Send {
    /// Ask the transport to close. A `Closed` event follows once it has.
    fn close(&mut self);
}

pub trait Transport {
    fn open(&mut self, url: &str, conn: ConnId) -> Result<Box<dyn TransportHandle>, LinkError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Connecting,
    Open,
    Closing,
    Closed,
}

struct Connection {
    id: ConnId,
    phase: Phase,
    handle: Box<dyn TransportHandle>,
}

impl Connection {
    fn close(&mut self) {
        if matches!(self.phase, Phase::Connecting | Phase::Open) {
            self.handle.close();
            self.phase = Phase::Closing;
        }
    }
}

// -----------------------------
// Link manager
// -----------------------------
pub struct Link<T: Transport> {
    transport: T,
    url: String,
    reconnect_delay: Duration,
    current: Option<Connection>,
    next_id: ConnId,
    reconnect_at: Option<Instant>,
}

impl<T: Transport> Link<T> {
    pub fn new(transport: T, url: impl Into<String>, reconnect_delay: Duration) -> Self {
        Self {
            transport,
            url: url.into(),
            reconnect_delay,
            current: None,
            next_id: 1,
            reconnect_at: None,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn reconnect_at(&self) -> Option<Instant> {
        self.reconnect_at
    }

    /// True while an attempt is in flight or the link is open.
    pub fn is_active(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|c| matches!(c.phase, Phase::Connecting | Phase::Open))
    }

    pub fn connect(&mut self, state: &mut DashboardState, now: Instant) {
        if self.is_active() {
            return;
        }
        if state.simulating() {
            state.set_status(ConnectionStatus::Connected);
            return;
        }

        self.reconnect_at = None;
        if let Some(mut old) = self.current.take() {
            old.close();
        }

        state.set_status(ConnectionStatus::Connecting);
        let id = self.next_id;
        self.next_id += 1;
        info!(conn = id, url = %self.url, "connecting");

        match self.transport.open(&self.url, id) {
            Ok(handle) => {
                self.current = Some(Connection {
                    id,
                    phase: Phase::Connecting,
                    handle,
                });
            }
            Err(e) => {
                warn!(conn = id, "{e}");
                state.set_error("WebSocket initialization failed");
                state.set_status(ConnectionStatus::Disconnected);
                self.schedule_reconnect(now);
            }
        }
    }

    pub fn handle_event(&mut self, event: TransportEvent, state: &mut DashboardState, now: Instant) {
        let Some(conn) = self.current.as_mut().filter(|c| c.id == event.conn) else {
            trace!(conn = event.conn, "dropping event from superseded transport");
            return;
        };

        match event.kind {
            TransportEventKind::Opened => {
                if conn.phase == Phase::Connecting {
                    conn.phase = Phase::Open;
                    info!(conn = conn.id, "link open");
                    state.set_status(ConnectionStatus::Connected);
                    state.clear_error();
                }
            }
            TransportEventKind::Message(text) => {
                // Diagnostic logging happens inside; nothing surfaces to the user.
                let _ = state.apply_message(&text, Local::now());
            }
            TransportEventKind::Error(detail) => {
                warn!(conn = conn.id, "transport error: {detail}");
                state.set_error(format!("Failed to connect to Node-RED: {detail}"));
                conn.close();
            }
            TransportEventKind::Closed => {
                conn.phase = Phase::Closed;
                debug!(conn = conn.id, "link closed");
                if !state.simulating() {
                    state.set_status(ConnectionStatus::Disconnected);
                    self.schedule_reconnect(now);
                }
            }
        }
    }

    /// Fire the pending reconnect once it is due.
    pub fn poll(&mut self, state: &mut DashboardState, now: Instant) {
        match self.reconnect_at {
            Some(at) if now >= at => {
                self.reconnect_at = None;
                debug!("reconnect timer fired");
                self.connect(state, now);
            }
            _ => {}
        }
    }

    /// Entering simulation closes the live link and cancels any pending retry.
    pub fn set_simulation(&mut self, on: bool, state: &mut DashboardState, now: Instant) {
        state.set_simulating(on);
        if on {
            self.reconnect_at = None;
            if let Some(mut conn) = self.current.take() {
                info!(conn = conn.id, "closing live link for simulation");
                conn.close();
            }
        }
        self.connect(state, now);
    }

    /// Close the transport and cancel the retry. Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.reconnect_at = None;
        if let Some(mut conn) = self.current.take() {
            debug!(conn = conn.id, "shutting down link");
            conn.close();
        }
    }

    fn schedule_reconnect(&mut self, now: Instant) {
        if self.reconnect_at.is_none() {
            self.reconnect_at = Some(now + self.reconnect_delay);
            debug!(delay_ms = self.reconnect_delay.as_millis() as u64, "reconnect scheduled");
        }
    }
}

impl<T: Transport> Drop for Link<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
