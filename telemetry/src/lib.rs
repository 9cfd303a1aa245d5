//! Tracing setup shared by the generator binary and the test suites.

pub mod tracing;
