//! Backend implementations of the record store contract
//!
//! The production deployment sits on an external transactional document
//! store; this module carries the in-process backend:
//! - `memory`: in-memory storage for testing and the demo binary

pub mod memory;

pub use memory::MemoryRecordStore;
