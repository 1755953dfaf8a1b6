//! Unit tests for the a0 CLI
//!
//! These tests use mocked dependencies and run fast without external I/O.

mod architecture;
mod chat_send;
mod engine_session;
mod mocks;
