//! Versecraft library crate
//!
//! Exposes the suggestion orchestration engine so hosts other than the CLI
//! (and the test suite) can drive sessions directly.

pub mod app;
pub mod config;
pub mod locate;
pub mod oracle;
pub mod patch;
pub mod schedule;
pub mod session;
pub mod store;
pub mod suggest;
