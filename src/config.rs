use std::time::Duration;

use clap::Parser;

pub const DEFAULT_PORT: u16 = 1880;
pub const DEFAULT_PATH: &str = "/ws/transformer";

/// Command line of the HMI.
#[derive(Debug, Clone, Parser)]
#[command(name = "transformer-hmi", version, about = "Transformer monitoring HMI (WAGO CC100 / Node-RED)")]
pub struct Args {
    /// Controller host. Empty means localhost.
    #[arg(long, default_value = "")]
    pub host: String,

    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    #[arg(long, default_value = DEFAULT_PATH)]
    pub path: String,

    /// Delay between reconnect attempts, in milliseconds.
    #[arg(long, default_value_t = 5000)]
    pub reconnect_ms: u64,

    /// Start in simulation mode.
    #[arg(long)]
    pub simulate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub reconnect_delay: Duration,
    pub sim_period: Duration,
    pub start_simulating: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            path: DEFAULT_PATH.to_string(),
            reconnect_delay: Duration::from_millis(5000),
            sim_period: Duration::from_millis(1000),
            start_simulating: false,
        }
    }
}

impl DashboardConfig {
    pub fn endpoint(&self) -> String {
        let host = match self.host.trim() {
            "" => "localhost",
            h => h,
        };
        let path = self.path.trim();
        if path.starts_with('/') {
            format!("ws://{host}:{}{path}", self.port)
        } else {
            format!("ws://{host}:{}/{path}", self.port)
        }
    }
}

impl From<Args> for DashboardConfig {
    fn from(a: Args) -> Self {
        Self {
            host: a.host,
            port: a.port,
            path: a.path,
            reconnect_delay: Duration::from_millis(a.reconnect_ms),
            start_simulating: a.simulate,
            ..Self::default()
        }
    }
}
