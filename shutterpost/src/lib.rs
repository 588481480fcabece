//! Application wiring for the shutterpost binary: configuration file
//! loading, log subscriber setup, and the dry-run console providers.

pub mod config;
pub mod logging;
pub mod providers;
