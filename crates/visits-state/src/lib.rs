//! Run state persistence.
//!
//! The orchestrator decides when to save; the stores only guarantee that
//! a save either fully replaces the previous state or leaves it intact.

mod error;
mod store;

pub use error::{Result, StateError};
pub use store::{JsonFileStore, MemoryStore, RunStateStore};
