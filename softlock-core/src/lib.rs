//! # softlock-core
//!
//! Soft advisory lease engine. One holder, identified by user and address,
//! may edit a resource at a time; everyone else is told it is busy. Nothing
//! is locked in storage: the engine consults a lease table before permitting
//! an edit, and leases lapse on their own unless renewed.

pub mod client;
pub mod clock;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod expiry;
pub mod infrastructure;
#[path = "infrastructure_in_memory.rs"]
pub mod infrastructure_in_memory;
#[cfg(feature = "sqlite")]
#[path = "infrastructure_sqlite.rs"]
pub mod infrastructure_sqlite;
pub mod navigation;
pub mod resolver;
pub mod sweeper;
pub mod types;

#[cfg(test)]
mod expiry_test;
#[cfg(test)]
mod test_support;
