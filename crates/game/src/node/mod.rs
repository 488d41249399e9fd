mod config;
mod controller;
mod error;
mod events;
mod handle;
mod roles;

pub use config::NodeConfig;
pub use controller::NodeController;
pub use error::NodeError;
pub use events::{MasterChange, NodeEvent};
pub use handle::{NodeCommand, NodeHandle};
pub use roles::pick_deputy;
