//! Refresh window planning and shard classification.

pub mod plan;
pub mod shard;

pub use plan::{RefreshMode, RefreshPlan, RefreshPlanEntry, SHARD_DATE_FORMAT, SourceKind, plan};
pub use shard::{ShardRef, classify_shard};
