// -----------------------------
// Signal dictionary (wire keys as published by the Node-RED flow)
// -----------------------------

/// Coil temperature above this is drawn in the warning tier.
pub const TEMP_WARNING: f64 = 100.0;
/// Coil temperature above this is drawn in the critical tier.
pub const TEMP_CRITICAL: f64 = 130.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Analog,
    Digital,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    TempL1,
    TempL3,
    TempAlarm1,
    TempAlarm2,
    Trip,
    AlarmGeneral,
    CoolingOk,
    CoolingFail,
}

impl Signal {
    pub const ALL: [Signal; 8] = [
        Signal::TempL1,
        Signal::TempL3,
        Signal::TempAlarm1,
        Signal::TempAlarm2,
        Signal::Trip,
        Signal::AlarmGeneral,
        Signal::CoolingOk,
        Signal::CoolingFail,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Signal::TempL1 => "LV L1 Winding temperature",
            Signal::TempL3 => "LV L3 Winding temperature",
            Signal::TempAlarm1 => "Temp alarm1",
            Signal::TempAlarm2 => "Temp alarm2",
            Signal::Trip => "Transformer trip",
            Signal::AlarmGeneral => "Transformer alarm",
            Signal::CoolingOk => "Cooling bank working",
            Signal::CoolingFail => "Cooling bank failure",
        }
    }

    pub fn from_key(key: &str) -> Option<Signal> {
        Signal::ALL.into_iter().find(|s| s.key() == key)
    }

    pub const fn kind(self) -> SignalKind {
        match self {
            Signal::TempL1 | Signal::TempL3 => SignalKind::Analog,
            _ => SignalKind::Digital,
        }
    }

    /// Panel label.
    pub const fn label(self) -> &'static str {
        match self {
            Signal::TempL1 => "LV L1 Temp",
            Signal::TempL3 => "LV L3 Temp",
            Signal::TempAlarm1 => "Temp Alarm 1",
            Signal::TempAlarm2 => "Temp Alarm 2",
            Signal::Trip => "Transformer Trip",
            Signal::AlarmGeneral => "General Alarm",
            Signal::CoolingOk => "Cooling Bank Working",
            Signal::CoolingFail => "Cooling Bank Fail",
        }
    }
}
