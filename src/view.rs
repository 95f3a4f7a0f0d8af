use std::f32::consts::TAU;

use chrono::{DateTime, Local};
use egui::{Align2, Color32, FontId, Pos2, Rect, RichText, Rounding, Stroke, Vec2};
use egui_extras::{Column, TableBuilder};

use crate::signals::{Signal, TEMP_CRITICAL, TEMP_WARNING};
use crate::snapshot::SignalValue;
use crate::state::{ConnectionStatus, DashboardState};

pub const READOUT_PLACEHOLDER: &str = "--.-";
pub const OVERLAY_PLACEHOLDER: &str = "---";

// -----------------------------
// Classification
// -----------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoilTier {
    Unknown,
    Nominal,
    Warning,
    Critical,
}

/// Trip and alarm can force a tier without a temperature breach, but an
/// absent reading always stays unknown.
pub fn coil_tier(temp: Option<f64>, trip: Option<bool>, alarm: Option<bool>) -> CoilTier {
    let Some(t) = temp else {
        return CoilTier::Unknown;
    };
    if t > TEMP_CRITICAL || trip == Some(true) {
        CoilTier::Critical
    } else if t > TEMP_WARNING || alarm == Some(true) {
        CoilTier::Warning
    } else {
        CoilTier::Nominal
    }
}

impl CoilTier {
    pub fn color(self) -> Color32 {
        match self {
            CoilTier::Unknown => Color32::from_rgb(0x33, 0x33, 0x33),
            CoilTier::Nominal => Color32::from_rgb(0x22, 0xc5, 0x5e),
            CoilTier::Warning => Color32::from_rgb(0xea, 0xb3, 0x08),
            CoilTier::Critical => Color32::from_rgb(0xef, 0x44, 0x44),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LampKind {
    Trip,
    Alarm,
    Cooling,
}

impl LampKind {
    fn hue(self) -> Color32 {
        match self {
            LampKind::Trip => Color32::from_rgb(0xef, 0x44, 0x44),
            LampKind::Alarm => Color32::from_rgb(0xea, 0xb3, 0x08),
            LampKind::Cooling => Color32::from_rgb(0x22, 0xc5, 0x5e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LampState {
    Unknown,
    Active,
    Inactive,
}

pub fn lamp_state(value: Option<bool>) -> LampState {
    match value {
        None => LampState::Unknown,
        Some(true) => LampState::Active,
        Some(false) => LampState::Inactive,
    }
}

/// LED fill, LED ring, label color, glow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LampStyle {
    pub led: Color32,
    pub ring: Color32,
    pub text: Color32,
    pub glow: bool,
}

pub fn lamp_style(state: LampState, kind: LampKind) -> LampStyle {
    match state {
        LampState::Unknown => LampStyle {
            led: Color32::from_rgb(0x1f, 0x29, 0x37),
            ring: Color32::from_rgb(0x37, 0x41, 0x51),
            text: Color32::from_rgb(0x6b, 0x72, 0x80),
            glow: false,
        },
        LampState::Active => LampStyle {
            led: kind.hue(),
            ring: kind.hue(),
            text: kind.hue(),
            glow: true,
        },
        LampState::Inactive => LampStyle {
            led: Color32::from_rgb(0x18, 0x18, 0x1b),
            ring: Color32::from_rgb(0x27, 0x27, 0x2a),
            text: Color32::from_rgb(0x52, 0x52, 0x5b),
            glow: false,
        },
    }
}

/// One lamp per digital signal, in panel order.
pub const LAMPS: [(Signal, LampKind); 6] = [
    (Signal::Trip, LampKind::Trip),
    (Signal::AlarmGeneral, LampKind::Alarm),
    (Signal::CoolingFail, LampKind::Trip),
    (Signal::TempAlarm1, LampKind::Alarm),
    (Signal::TempAlarm2, LampKind::Alarm),
    (Signal::CoolingOk, LampKind::Cooling),
];

// -----------------------------
// Text formatting
// -----------------------------
pub fn format_readout(temp: Option<f64>) -> String {
    match temp.filter(|t| t.is_finite()) {
        Some(t) => format!("{t:.1}°C"),
        None => format!("{READOUT_PLACEHOLDER}°C"),
    }
}

pub fn format_overlay(temp: Option<f64>) -> String {
    match temp.filter(|t| t.is_finite()) {
        Some(t) => format!("{}°", (t + 0.5).floor() as i64),
        None => OVERLAY_PLACEHOLDER.to_string(),
    }
}

pub fn format_last_sync(at: Option<DateTime<Local>>) -> String {
    match at {
        Some(t) => t.format("%H:%M:%S").to_string(),
        None => "Waiting...".to_string(),
    }
}

// -----------------------------
// Widgets
// -----------------------------
const PANEL_BG: Color32 = Color32::from_rgb(0x11, 0x11, 0x13);
const PANEL_BORDER: Color32 = Color32::from_rgb(0x27, 0x27, 0x2a);
const MUTED: Color32 = Color32::from_rgb(0x71, 0x71, 0x7a);

fn lamp(ui: &mut egui::Ui, label: &str, state: LampState, kind: LampKind) {
    let style = lamp_style(state, kind);
    ui.horizontal(|ui| {
        let h = ui.style().spacing.interact_size.y.max(16.0);
        let (rect, _) = ui.allocate_exact_size(Vec2::new(h, h), egui::Sense::hover());
        let c = rect.center();
        let r = h * 0.32;
        if style.glow {
            ui.painter().circle_filled(c, r * 1.7, style.led.gamma_multiply(0.25));
        }
        ui.painter().circle_filled(c, r, style.led);
        ui.painter().circle_stroke(c, r, Stroke::new(2.0, style.ring));

        let mut text = RichText::new(label.to_uppercase()).color(style.text).small();
        if state == LampState::Active {
            text = text.strong();
        }
        ui.label(text);
        if state == LampState::Unknown {
            ui.label(RichText::new("(N/A)").small().color(MUTED));
        }
    });
}

fn status_dot(ui: &mut egui::Ui, status: ConnectionStatus) {
    let color = match status {
        ConnectionStatus::Connected => Color32::from_rgb(0x22, 0xc5, 0x5e),
        ConnectionStatus::Connecting => Color32::from_rgb(0xea, 0xb3, 0x08),
        ConnectionStatus::Disconnected => Color32::from_rgb(0xef, 0x44, 0x44),
    };
    ui.horizontal(|ui| {
        let (rect, _) = ui.allocate_exact_size(Vec2::splat(10.0), egui::Sense::hover());
        ui.painter().circle_filled(rect.center(), 4.0, color);
        ui.label(RichText::new(status.as_str()).monospace().small());
    });
}

fn panel<R>(ui: &mut egui::Ui, title: &str, add: impl FnOnce(&mut egui::Ui) -> R) -> R {
    egui::Frame::none()
        .fill(PANEL_BG)
        .stroke(Stroke::new(1.0, PANEL_BORDER))
        .rounding(Rounding::same(8.0))
        .inner_margin(egui::Margin::same(12.0))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(RichText::new(title.to_uppercase()).small().strong().color(MUTED));
            ui.add_space(6.0);
            add(ui)
        })
        .inner
}

/// Header row. Returns the requested simulation mode.
pub fn header(ui: &mut egui::Ui, state: &DashboardState) -> bool {
    let mut simulate = state.simulating();
    ui.horizontal(|ui| {
        let (bar, _) = ui.allocate_exact_size(Vec2::new(5.0, 32.0), egui::Sense::hover());
        ui.painter()
            .rect_filled(bar, Rounding::same(2.5), Color32::from_rgb(0xea, 0xb3, 0x08));
        ui.vertical(|ui| {
            ui.label(RichText::new("TRANSFORMER MONITORING UNIT").heading().strong());
            ui.label(RichText::new("WAGO CC100 INDUSTRIAL HMI").small().monospace().color(MUTED));
        });

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.vertical(|ui| {
                ui.checkbox(&mut simulate, RichText::new("SIM MODE").small().monospace());
                status_dot(ui, state.status());
            });
        });
    });
    if let Some(err) = state.error() {
        ui.colored_label(Color32::LIGHT_RED, err);
    }
    simulate
}

pub fn footer(ui: &mut egui::Ui, state: &DashboardState) {
    ui.horizontal(|ui| {
        let small = |s: String| RichText::new(s).small().monospace().color(MUTED);
        ui.label(small("SYSTEM READY // NO FAULTS DETECTED".into()));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(small(format!("LAST SYNC: {}", format_last_sync(state.last_update()))));
        });
    });
}

pub fn safety_panel(ui: &mut egui::Ui, state: &DashboardState) {
    panel(ui, "Safety Status", |ui| {
        for (signal, kind) in LAMPS {
            lamp(ui, signal.label(), lamp_state(state.snapshot().flag(signal)), kind);
        }
    });
}

pub fn telemetry_panel(ui: &mut egui::Ui, state: &DashboardState) {
    panel(ui, "Telemetry", |ui| {
        for signal in [Signal::TempL1, Signal::TempL3] {
            ui.horizontal(|ui| {
                ui.label(RichText::new(signal.label()).color(Color32::from_gray(160)));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(
                        RichText::new(format_readout(state.snapshot().number(signal)))
                            .monospace()
                            .strong()
                            .size(22.0),
                    );
                });
            });
        }
    });
}

/// Every dictionary signal with its raw value, then any other keys the
/// controller sent.
pub fn raw_table(ui: &mut egui::Ui, state: &DashboardState) {
    let snapshot = state.snapshot();
    panel(ui, "Raw Signals", |ui| {
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::remainder())
            .column(Column::auto().at_least(60.0))
            .body(|mut body| {
                let mut rows: Vec<(&str, Option<SignalValue>)> =
                    Signal::ALL.iter().map(|s| (s.key(), snapshot.get(s.key()))).collect();
                rows.extend(snapshot.extras().map(|(k, v)| (k, Some(v))));
                for (key, value) in rows {
                    body.row(18.0, |mut row| {
                        row.col(|ui| {
                            ui.label(RichText::new(key).small().monospace());
                        });
                        row.col(|ui| {
                            let v = value.map_or_else(|| "—".to_string(), |v| v.to_string());
                            ui.label(RichText::new(v).small().monospace());
                        });
                    });
                }
            });
    });
}

// -----------------------------
// Schematic
// -----------------------------
const VIEW_W: f32 = 400.0;
const VIEW_H: f32 = 300.0;

/// Maps schematic units (400x300) into a screen rect, preserving aspect.
struct Canvas {
    origin: Pos2,
    scale: f32,
}

impl Canvas {
    fn fit(rect: Rect) -> Self {
        let scale = (rect.width() / VIEW_W).min(rect.height() / VIEW_H);
        let size = Vec2::new(VIEW_W, VIEW_H) * scale;
        Self {
            origin: rect.center() - size / 2.0,
            scale,
        }
    }

    fn p(&self, x: f32, y: f32) -> Pos2 {
        self.origin + Vec2::new(x, y) * self.scale
    }

    fn rect(&self, x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::from_min_max(self.p(x, y), self.p(x + w, y + h))
    }

    fn s(&self, v: f32) -> f32 {
        v * self.scale
    }
}

fn coil(painter: &egui::Painter, cv: &Canvas, x: f32, label: &str, color: Color32, live: bool) {
    let body = cv.rect(x, 60.0, 75.0, 170.0);
    let r = Rounding::same(cv.s(10.0));
    painter.rect_filled(body, r, color.gamma_multiply(if live { 0.15 } else { 0.1 }));
    painter.rect_stroke(body, r, Stroke::new(cv.s(3.0), color));
    let winding = color.gamma_multiply(if live { 0.4 } else { 0.3 });
    for i in 0..8 {
        let y = 80.0 + i as f32 * 20.0;
        painter.line_segment(
            [cv.p(x, y), cv.p(x + 75.0, y)],
            Stroke::new(cv.s(1.5), winding),
        );
    }
    let label_color = if live {
        Color32::from_rgb(0x9c, 0xa3, 0xaf)
    } else {
        Color32::from_rgb(0x4b, 0x55, 0x63)
    };
    painter.text(
        cv.p(x + 37.5, 255.0),
        Align2::CENTER_BOTTOM,
        label,
        FontId::proportional(cv.s(14.0)),
        label_color,
    );
}

fn overlay(painter: &egui::Painter, cv: &Canvas, x: f32, temp: Option<f64>) {
    painter.rect_filled(
        cv.rect(x + 10.0, 130.0, 55.0, 30.0),
        Rounding::same(cv.s(4.0)),
        Color32::from_black_alpha(150),
    );
    painter.text(
        cv.p(x + 37.5, 145.0),
        Align2::CENTER_CENTER,
        format_overlay(temp),
        FontId::monospace(cv.s(18.0)),
        Color32::WHITE,
    );
}

fn cooling_badge(ui: &egui::Ui, painter: &egui::Painter, area: Rect, cooling: Option<bool>) {
    let active = cooling == Some(true);
    let badge = Rect::from_min_size(
        area.left_bottom() + Vec2::new(16.0, -52.0),
        Vec2::new(230.0, 36.0),
    );
    painter.rect_filled(badge, Rounding::same(6.0), Color32::from_black_alpha(160));
    painter.rect_stroke(badge, Rounding::same(6.0), Stroke::new(1.0, Color32::from_gray(60)));

    let c = badge.left_center() + Vec2::new(20.0, 0.0);
    let color = if active {
        Color32::from_rgb(0x22, 0xc5, 0x5e)
    } else {
        Color32::from_gray(82)
    };
    let stroke = Stroke::new(1.6, color);
    painter.circle_stroke(c, 9.0, stroke);
    painter.circle_stroke(c, 2.0, stroke);
    // One revolution every 3 s while cooling runs.
    let angle = if active {
        ((ui.input(|i| i.time) / 3.0).fract() as f32) * TAU
    } else {
        0.0
    };
    for k in 0..4 {
        let a = angle + k as f32 * TAU / 4.0;
        let dir = Vec2::angled(a);
        painter.line_segment([c + dir * 4.0, c + dir * 9.0], stroke);
    }

    painter.text(
        badge.left_center() + Vec2::new(38.0, 0.0),
        Align2::LEFT_CENTER,
        format!("COOLING SYSTEM: {}", if active { "ACTIVE" } else { "IDLE" }),
        FontId::proportional(11.0),
        Color32::from_gray(220),
    );
}

pub fn schematic(ui: &mut egui::Ui, state: &DashboardState) {
    let snap = state.snapshot();
    let trip = snap.flag(Signal::Trip);
    let alarm = snap.flag(Signal::AlarmGeneral);
    let l1 = snap.number(Signal::TempL1);
    let l3 = snap.number(Signal::TempL3);

    let (area, _) = ui.allocate_exact_size(ui.available_size(), egui::Sense::hover());
    let painter = ui.painter_at(area);
    painter.rect_filled(area, Rounding::same(10.0), PANEL_BG);
    painter.rect_stroke(area, Rounding::same(10.0), Stroke::new(1.0, PANEL_BORDER));

    let cv = Canvas::fit(area.shrink(24.0));

    // Base and core frame.
    painter.rect_filled(
        cv.rect(30.0, 240.0, 340.0, 25.0),
        Rounding::same(cv.s(4.0)),
        Color32::from_rgb(0x1f, 0x29, 0x37),
    );
    painter.rect_filled(
        cv.rect(50.0, 265.0, 300.0, 12.0),
        Rounding::same(cv.s(2.0)),
        Color32::from_rgb(0x11, 0x18, 0x27),
    );
    let frame = Stroke::new(cv.s(10.0), Color32::from_rgb(0x37, 0x41, 0x51));
    painter.line_segment([cv.p(60.0, 240.0), cv.p(60.0, 40.0)], frame);
    painter.line_segment([cv.p(60.0, 40.0), cv.p(340.0, 40.0)], frame);
    painter.line_segment([cv.p(340.0, 40.0), cv.p(340.0, 240.0)], frame);

    coil(&painter, &cv, 75.0, "L1", coil_tier(l1, trip, alarm).color(), true);
    // L2 has no sensor.
    coil(&painter, &cv, 162.5, "L2", Color32::from_rgb(0x37, 0x41, 0x51), false);
    coil(&painter, &cv, 250.0, "L3", coil_tier(l3, trip, alarm).color(), true);

    overlay(&painter, &cv, 75.0, l1);
    overlay(&painter, &cv, 250.0, l3);

    cooling_badge(ui, &painter, area, snap.flag(Signal::CoolingOk));
}
