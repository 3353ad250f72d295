//! Content platform engagement service
//!
//! Wires the storage backend, the engagement engines, and the REST gateway
//! into one production binary with configuration loading, structured
//! logging, and graceful shutdown.

pub mod config;
pub mod logging;
pub mod service;
pub mod signals;

pub use config::{load_configuration, LoggingConfig, ServiceConfig, StoreBackend, StoreConfig};
pub use logging::initialize_logging;
pub use service::ServiceState;
pub use signals::{graceful_shutdown, setup_signal_handlers};
