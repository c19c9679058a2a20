//! CLI command implementations.

pub mod diff;
pub mod paths;
pub mod sync;
