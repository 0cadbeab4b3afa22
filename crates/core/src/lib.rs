//! Ragcrew Core Library
//!
//! This crate provides the foundational utilities shared by every ragcrew crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management (YAML file, `.env`, environment, CLI overrides)

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};
