//! Command implementations

pub mod chat;
pub mod config;
pub mod engine;
pub mod files;
pub mod settings;
pub mod storage;
pub mod version;
