//! Docchat Common - Shared configuration, errors, and logging for docchat.
//!
//! This crate provides:
//! - Configuration types and loading (file + environment overrides)
//! - Error types and handling utilities
//! - Logging setup with noise filtering

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CompletionConfig, Config, ObservabilityConfig, ServerConfig, TelegramConfig};
pub use error::{Error, Result};

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::logging::init_logging;
}
