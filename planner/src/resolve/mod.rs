//! Layered configuration resolution.
//!
//! Framework defaults, the client document, per-property overrides and run-time overrides are
//! merged field by field into one [`EffectiveConfig`]. Every default is applied here and every
//! downstream component receives the resolved values explicitly.

pub mod defaults;
pub mod effective;
pub mod merge;
pub mod resolver;
pub mod streams;

pub use effective::{Backfill, Destination, EffectiveConfig, Mode, RefreshSettings, StreamRef};
pub use resolver::{LayeredConfig, parse_date, resolve, resolve_for_property};
pub use streams::{STREAM_ID_COLUMN, StreamPredicate, StreamResolution, inclusion_predicate, resolve_streams};
