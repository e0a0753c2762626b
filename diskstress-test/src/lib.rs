//! Test utilities for diskstress.
//!
//! This crate provides helpers shared by the integration tests. See the modules for all available
//! utilities.

pub mod tracing;
pub mod workspace;
