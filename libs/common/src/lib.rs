//! Shared infrastructure for the mbload workspace
//!
//! Provides the pieces every binary needs before it does real work:
//! - logging bootstrap (console + optional file)
//! - layered configuration loading

pub mod config_loader;
pub mod logging;

pub use config_loader::{load_layered, ConfigFormat};
pub use logging::{init_logging, LoggingOptions};

// Re-export common dependencies
pub use errors;
pub use figment;
pub use tracing;
