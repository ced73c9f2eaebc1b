//! Domain type definitions shared across Conductor services

pub mod event;
pub mod operation;
pub mod provider;
pub mod workflow;

pub use event::*;
pub use operation::*;
pub use provider::*;
pub use workflow::*;
