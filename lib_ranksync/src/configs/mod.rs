/// Construction-time parameters and endpoint resolution.
pub mod config_sync;

pub use config_sync::{Endpoints, SyncConfig};
