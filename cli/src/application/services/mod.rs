//! Application services: use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports`, never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod chat;
pub mod config_service;
pub mod engine_session;
pub mod files;
pub mod poll_loop;
pub mod reconcile;
pub mod runtime_lists;
pub mod settings;
pub mod storage;
