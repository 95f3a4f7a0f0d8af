use std::time::{Duration, Instant};

use chrono::Local;
use crossbeam_channel::{unbounded, Receiver, TryRecvError};
use egui::Vec2;
#[cfg(debug_assertions)]
use egui::{Color32, RichText};
#[cfg(debug_assertions)]
use egui_extras::{Column, TableBuilder};
use tracing::info;

use crate::config::DashboardConfig;
use crate::link::{Link, Transport, TransportEvent};
use crate::logbuf::LogBuffer;
use crate::sim::Simulator;
use crate::state::DashboardState;
use crate::view;
use crate::ws::WsTransport;

#[derive(PartialEq, Eq, Clone, Copy)]
enum Tab {
    Main,
    #[cfg(debug_assertions)]
    Logs,
}

/// Owns the view state and everything that mutates it. All mutation happens
/// inside `update`, on the UI thread.
pub struct Dashboard<T: Transport = WsTransport> {
    state: DashboardState,
    link: Link<T>,
    sim: Simulator,
    rx: Receiver<TransportEvent>,

    #[cfg_attr(not(debug_assertions), allow(dead_code))]
    logs: LogBuffer,
    active_tab: Tab,
    #[cfg_attr(not(debug_assertions), allow(dead_code))]
    autoscroll: bool,
    #[cfg_attr(not(debug_assertions), allow(dead_code))]
    last_log_count: usize,
}

impl Dashboard<WsTransport> {
    pub fn new(cfg: &DashboardConfig, logs: LogBuffer) -> Self {
        let (tx, rx) = unbounded::<TransportEvent>();
        Self::with_transport(cfg, WsTransport::new(tx), rx, logs)
    }
}

impl<T: Transport> Dashboard<T> {
    pub fn with_transport(
        cfg: &DashboardConfig,
        transport: T,
        rx: Receiver<TransportEvent>,
        logs: LogBuffer,
    ) -> Self {
        let link = Link::new(transport, cfg.endpoint(), cfg.reconnect_delay);
        info!(endpoint = %link.url(), "transformer HMI starting");
        let mut app = Self {
            state: DashboardState::new(),
            link,
            sim: Simulator::new(cfg.sim_period),
            rx,
            logs,
            active_tab: Tab::Main,
            autoscroll: true,
            last_log_count: 0,
        };
        let now = Instant::now();
        if cfg.start_simulating {
            app.set_simulation(true, now);
        } else {
            app.link.connect(&mut app.state, now);
        }
        app
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn set_simulation(&mut self, on: bool, now: Instant) {
        if on == self.state.simulating() {
            return;
        }
        info!(on, "simulation mode");
        if on {
            self.sim.start(now);
        } else {
            self.sim.stop();
        }
        self.link.set_simulation(on, &mut self.state, now);
    }

    /// Drain transport events and fire due timers.
    pub fn pump(&mut self, now: Instant) {
        loop {
            match self.rx.try_recv() {
                Ok(ev) => self.link.handle_event(ev, &mut self.state, now),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break,
            }
        }
        self.link.poll(&mut self.state, now);
        if self.state.simulating() {
            if let Some(sample) = self.sim.poll(now) {
                self.state.apply_sample(sample, Local::now());
            }
        }
    }

    pub fn shutdown(&mut self) {
        self.sim.stop();
        self.link.shutdown();
    }

    #[cfg(debug_assertions)]
    fn logs_tab(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Logs");
            ui.separator();
            ui.checkbox(&mut self.autoscroll, "Auto-scroll");
        });
        ui.separator();

        let logs = self.logs.snapshot();
        let row_height = 16.0;
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                TableBuilder::new(ui)
                    .striped(true)
                    .cell_layout(egui::Layout::left_to_right(egui::Align::Min))
                    .column(Column::remainder())
                    .body(|body| {
                        body.rows(row_height, logs.len(), |mut row| {
                            let i = row.index();
                            row.col(|ui| {
                                ui.label(RichText::new(&logs[i]).monospace().color(Color32::LIGHT_GRAY));
                            });
                        });
                    });

                if self.autoscroll && logs.len() > self.last_log_count {
                    let _ = ui.label("");
                    ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                }
                self.last_log_count = logs.len();
            });
    }
}

impl<T: Transport> eframe::App for Dashboard<T> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        {
            const TARGET_FPS: u64 = 30;
            ctx.request_repaint_after(Duration::from_millis(1000 / TARGET_FPS));
        }

        let now = Instant::now();
        self.pump(now);

        let mut style = (*ctx.style()).clone();
        style.spacing.item_spacing = Vec2::new(6.0, 6.0);
        ctx.set_style(style);

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            let want_sim = view::header(ui, &self.state);
            if want_sim != self.state.simulating() {
                self.set_simulation(want_sim, now);
            }
            #[cfg(debug_assertions)]
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.active_tab, Tab::Main, "Main");
                ui.selectable_value(&mut self.active_tab, Tab::Logs, "Logs");
            });
        });

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            view::footer(ui, &self.state);
        });

        match self.active_tab {
            Tab::Main => {
                egui::SidePanel::right("status")
                    .resizable(false)
                    .exact_width(300.0)
                    .show(ctx, |ui| {
                        egui::ScrollArea::vertical().show(ui, |ui| {
                            view::safety_panel(ui, &self.state);
                            ui.add_space(8.0);
                            view::telemetry_panel(ui, &self.state);
                            ui.add_space(8.0);
                            view::raw_table(ui, &self.state);
                        });
                    });
                egui::CentralPanel::default().show(ctx, |ui| {
                    view::schematic(ui, &self.state);
                });
            }
            #[cfg(debug_assertions)]
            Tab::Logs => {
                egui::CentralPanel::default().show(ctx, |ui| self.logs_tab(ui));
            }
        }
    }
}

impl<T: Transport> Drop for Dashboard<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LinkError;
    use crate::link::{ConnId, TransportEventKind, TransportHandle};
    use crate::signals::Signal;
    use crate::state::ConnectionStatus;
    use crossbeam_channel::Sender;

    struct NullHandle;
    impl TransportHandle for NullHandle {
        fn close(&mut self) {}
    }

    #[derive(Default)]
    struct CountingTransport {
        opens: Vec<ConnId>,
    }
    impl Transport for CountingTransport {
        fn open(&mut self, _url: &str, conn: ConnId) -> Result<Box<dyn TransportHandle>, LinkError> {
            self.opens.push(conn);
            Ok(Box::new(NullHandle))
        }
    }

    fn dashboard(cfg: DashboardConfig) -> (Dashboard<CountingTransport>, Sender<TransportEvent>) {
        let (tx, rx) = unbounded();
        let d = Dashboard::with_transport(&cfg, CountingTransport::default(), rx, LogBuffer::default());
        (d, tx)
    }

    #[test]
    fn first_action_is_a_connect_attempt() {
        let (d, _tx) = dashboard(DashboardConfig::default());
        assert_eq!(d.state().status(), ConnectionStatus::Connecting);
        assert_eq!(d.link.transport().opens, vec![1]);
    }

    #[test]
    fn pump_applies_channel_events_in_order() {
        let (mut d, tx) = dashboard(DashboardConfig::default());
        let now = Instant::now();
        tx.send(TransportEvent { conn: 1, kind: TransportEventKind::Opened }).unwrap();
        tx.send(TransportEvent {
            conn: 1,
            kind: TransportEventKind::Message(r#"{"LV L1 Winding temperature": 99.9}"#.into()),
        })
        .unwrap();
        d.pump(now);
        assert_eq!(d.state().status(), ConnectionStatus::Connected);
        assert_eq!(d.state().snapshot().number(Signal::TempL1), Some(99.9));
    }

    #[test]
    fn simulation_ticks_feed_the_snapshot() {
        let cfg = DashboardConfig {
            start_simulating: true,
            ..DashboardConfig::default()
        };
        let (mut d, _tx) = dashboard(cfg);
        assert_eq!(d.state().status(), ConnectionStatus::Connected);
        assert!(d.link.transport().opens.is_empty());

        let t0 = Instant::now();
        d.pump(t0 + Duration::from_secs(2));
        let snap = d.state().snapshot();
        let t1 = snap.number(Signal::TempL1).expect("simulated L1");
        assert!((80.0..120.0).contains(&t1));
        assert_eq!(snap.flag(Signal::CoolingOk), Some(true));
        assert_eq!(snap.flag(Signal::Trip), Some(false));
        assert!(d.state().last_update().is_some());
    }

    #[test]
    fn disabling_simulation_keeps_last_values_and_reconnects() {
        let cfg = DashboardConfig {
            start_simulating: true,
            ..DashboardConfig::default()
        };
        let (mut d, _tx) = dashboard(cfg);
        let t0 = Instant::now();
        d.pump(t0 + Duration::from_secs(2));
        let before = d.state().snapshot().clone();

        d.set_simulation(false, t0 + Duration::from_secs(2));
        d.pump(t0 + Duration::from_secs(10));
        assert_eq!(d.state().snapshot(), &before);
        assert_eq!(d.state().status(), ConnectionStatus::Connecting);
        assert_eq!(d.link.transport().opens, vec![1]);
    }
}
