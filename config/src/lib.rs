//! Declarative configuration for the event projection generator.
//!
//! Holds the serde types a configuration document deserializes into, the structural
//! validation errors they can raise, and the hierarchical loader that stacks the base file,
//! the environment file and `APP_`-prefixed environment variables.

pub mod environment;
mod load;
pub mod shared;

pub use load::*;
