//! Shared domain types for the Conductor orchestration core

pub mod types;

pub use types::*;
