//! Transformer monitoring HMI: a live view of one power transformer's
//! winding temperatures and protection signals, fed by a Node-RED
//! websocket on the WAGO CC100 controller.

pub mod app;
pub mod config;
pub mod error;
pub mod link;
pub mod logbuf;
pub mod signals;
pub mod sim;
pub mod snapshot;
pub mod state;
pub mod view;
pub mod ws;

pub use app::Dashboard;
pub use config::{Args, DashboardConfig};
pub use state::{ConnectionStatus, DashboardState};
