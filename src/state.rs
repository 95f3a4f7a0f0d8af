use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::error::PayloadError;
use crate::signals::Signal;
use crate::sim::SimSample;
use crate::snapshot::{parse_payload, SignalValue, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "CONNECTING",
            ConnectionStatus::Connected => "CONNECTED",
            ConnectionStatus::Disconnected => "DISCONNECTED",
        }
    }
}

/// Everything the view renders. Only the UI thread writes to it, through the
/// methods below.
#[derive(Debug, Clone)]
pub struct DashboardState {
    snapshot: Snapshot,
    status: ConnectionStatus,
    error: Option<String>,
    last_update: Option<DateTime<Local>>,
    simulating: bool,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            snapshot: Snapshot::new(),
            status: ConnectionStatus::Disconnected,
            error: None,
            last_update: None,
            simulating: false,
        }
    }
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn last_update(&self) -> Option<DateTime<Local>> {
        self.last_update
    }

    pub fn simulating(&self) -> bool {
        self.simulating
    }

    /// Merge one inbound frame. A frame that is not a JSON object leaves the
    /// snapshot and the timestamp untouched.
    pub fn apply_message(&mut self, text: &str, at: DateTime<Local>) -> Result<usize, PayloadError> {
        let payload = match parse_payload(text) {
            Ok(p) => p,
            Err(e) => {
                warn!("discarding inbound frame: {e}");
                return Err(e);
            }
        };
        let written = self.snapshot.merge(&payload);
        self.last_update = Some(at);
        debug!(keys = payload.len(), written, "merged inbound frame");
        Ok(written)
    }

    pub fn apply_sample(&mut self, sample: SimSample, at: DateTime<Local>) {
        self.snapshot.set(Signal::TempL1, SignalValue::Number(sample.temp_l1));
        self.snapshot.set(Signal::TempL3, SignalValue::Number(sample.temp_l3));
        self.snapshot.set(Signal::CoolingOk, SignalValue::Bool(true));
        self.snapshot.set(Signal::Trip, SignalValue::Bool(sample.trip));
        self.last_update = Some(at);
    }

    pub fn set_status(&mut self, status: ConnectionStatus) {
        if self.status != status {
            debug!(from = self.status.as_str(), to = status.as_str(), "link status");
            self.status = status;
        }
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.error = Some(msg.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn set_simulating(&mut self, on: bool) {
        self.simulating = on;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Local> {
        Local.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn starts_disconnected_and_empty() {
        let st = DashboardState::new();
        assert_eq!(st.status(), ConnectionStatus::Disconnected);
        assert!(st.snapshot().is_empty());
        assert!(st.last_update().is_none());
        assert!(st.error().is_none());
    }

    #[test]
    fn bad_frames_leave_state_untouched() {
        let mut st = DashboardState::new();
        st.apply_message(r#"{"LV L1 Winding temperature": 97.2}"#, at(0))
            .unwrap();
        let before_snapshot = st.snapshot().clone();
        let before_ts = st.last_update();

        for bad in ["", "{", "[]", "\"text\"", "17", "true", "null"] {
            assert!(st.apply_message(bad, at(10)).is_err(), "{bad:?} accepted");
        }

        assert_eq!(st.snapshot(), &before_snapshot);
        assert_eq!(st.last_update(), before_ts);
    }

    #[test]
    fn good_frame_refreshes_timestamp() {
        let mut st = DashboardState::new();
        st.apply_message(r#"{"Transformer alarm": true}"#, at(5)).unwrap();
        assert_eq!(st.last_update(), Some(at(5)));
        assert_eq!(st.snapshot().flag(Signal::AlarmGeneral), Some(true));
    }

    #[test]
    fn null_value_clears_a_reading() {
        let mut st = DashboardState::new();
        st.apply_message(r#"{"LV L3 Winding temperature": 140}"#, at(0)).unwrap();
        let written = st
            .apply_message(r#"{"LV L3 Winding temperature": null}"#, at(1))
            .unwrap();
        assert_eq!(written, 0);
        assert_eq!(st.snapshot().number(Signal::TempL3), None);
        assert_eq!(st.last_update(), Some(at(1)));
    }

    #[test]
    fn sample_merges_into_existing_values() {
        let mut st = DashboardState::new();
        st.apply_message(r#"{"Transformer alarm": true, "Transformer trip": true}"#, at(0))
            .unwrap();
        st.apply_sample(
            SimSample {
                temp_l1: 101.3,
                temp_l3: 84.0,
                trip: false,
            },
            at(1),
        );
        let snap = st.snapshot();
        assert_eq!(snap.number(Signal::TempL1), Some(101.3));
        assert_eq!(snap.number(Signal::TempL3), Some(84.0));
        assert_eq!(snap.flag(Signal::CoolingOk), Some(true));
        assert_eq!(snap.flag(Signal::Trip), Some(false));
        assert_eq!(snap.flag(Signal::AlarmGeneral), Some(true));
        assert_eq!(st.last_update(), Some(at(1)));
    }
}
