//! Application layer: port trait definitions and use-case orchestration.
//!
//! This module depends only on `crate::domain`. Never on `crate::infra`,
//! `crate::commands`, or `crate::output`.

pub mod ports;
pub mod services;

pub use ports::{
    BackendApi, CommandRunner, ConfigStore, ContainerEngine, LocalFiles, ProgressReporter,
    UiObserver,
};
