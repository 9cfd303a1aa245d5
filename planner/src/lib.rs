//! Configuration driven generation planning for sharded analytics event exports.
//!
//! The planner resolves layered configuration into an [`resolve::EffectiveConfig`], derives the
//! per-event projection of the declared parameters, builds the deterministic identity key used
//! to deduplicate events and plans which daily shards a refresh run rematerializes. It performs
//! no I/O: executing the generated expressions is left to the caller.

pub mod catalog;
pub mod error;
pub mod generate;
pub mod generation;
mod macros;
pub mod refresh;
pub mod resolve;
pub mod sql;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
