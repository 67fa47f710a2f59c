//! Testing utilities for the MySQL source
//!
//! Docker container management for tests that need a live server.

pub mod container;

pub use container::MySQLContainer;
