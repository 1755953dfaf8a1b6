//! Domain layer: pure types, parsing, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod banners;
pub mod chat;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod files;
pub mod poll;
pub mod response;
pub mod storage;

pub use config::{A0Config, ActiveTab, validate_config_key, validate_config_value};
pub use error::{BackendError, ConfigError, EngineError, FileError, SyncError};
