//! Safeguard: human approval panel library.
//!
//! The binary entrypoint is in `main.rs`; everything here is public so the
//! integration tests can drive the store and the console page directly.

pub mod api;
pub mod approval;
pub mod cli;
pub mod config;
pub mod console;
pub mod store;
