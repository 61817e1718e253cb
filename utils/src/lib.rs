//! Shared utilities for the election client.

pub mod logging;

pub use logging::{try_init_logging, LogFormat, LoggingError};
