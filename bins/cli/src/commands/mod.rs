//! Local CLI command handlers.

pub mod config;
pub mod refresh;
pub mod resolve;
pub mod settings;

pub use config::{run_config_check, run_config_show};
pub use refresh::run_refresh;
pub use resolve::run_resolve;
pub use settings::run_settings;
