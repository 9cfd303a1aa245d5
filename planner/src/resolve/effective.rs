use chrono::NaiveDate;
use config::shared::{PropertyConfig, StreamSelection, StreamType};
use serde::Serialize;

use crate::bail;
use crate::catalog::ParameterCatalog;
use crate::error::{ErrorKind, PlannerResult};
use crate::resolve::streams::{StreamPredicate, inclusion_predicate};

/// How the configuration describes its streams.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// One export dataset with one declared stream type.
    Simple,
    /// A tree of properties and streams.
    Advanced,
}

/// A stream enumerated from the properties tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StreamRef {
    pub property_name: String,
    pub stream_id: String,
    pub stream_type: StreamType,
    pub source_dataset: String,
    pub use_fresh_daily: bool,
    pub include: bool,
}

/// Backfill window, already defaulted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Backfill {
    pub active: bool,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Temporal settings consumed by the refresh planner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RefreshSettings {
    pub rolling_window_days: u32,
    pub use_fresh_daily: bool,
    pub backfill: Backfill,
    pub initial_load_days: u32,
}

impl RefreshSettings {
    /// Checks the window bounds.
    pub fn validate(&self) -> PlannerResult<()> {
        if self.rolling_window_days == 0 {
            bail!(
                ErrorKind::InvalidRefreshWindow,
                "Rolling window must cover at least one day",
                "`rolling_window_days` must be greater than 0"
            );
        }

        if self.initial_load_days == 0 {
            bail!(
                ErrorKind::InvalidRefreshWindow,
                "Initial load must cover at least one day",
                "`initial_load_days` must be greater than 0"
            );
        }

        if self.backfill.active && self.backfill.start > self.backfill.end {
            bail!(
                ErrorKind::InvalidRefreshWindow,
                "Backfill starts after it ends",
                format!(
                    "`backfill_start` ({}) is after `backfill_end` ({})",
                    self.backfill.start, self.backfill.end
                )
            );
        }

        Ok(())
    }

    /// Returns a copy using `use_fresh_daily` instead of the configured flag.
    pub fn with_fresh_daily(mut self, use_fresh_daily: bool) -> Self {
        self.use_fresh_daily = use_fresh_daily;
        self
    }
}

/// Destination location.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Destination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
}

/// Read-only result of resolving all configuration layers.
///
/// Built only by the resolver. Consolidation is never enabled unless both web and app
/// streams are covered.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectiveConfig {
    pub(crate) mode: Mode,
    pub(crate) effective_stream_type: StreamSelection,
    pub(crate) consolidate: bool,
    pub(crate) included_streams: Vec<StreamRef>,
    pub(crate) refresh: RefreshSettings,
    pub(crate) catalog: ParameterCatalog,
    pub(crate) source_dataset: Option<String>,
    pub(crate) destination: Destination,
    pub(crate) property: Option<String>,
    pub(crate) properties: Vec<PropertyConfig>,
}

impl EffectiveConfig {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn effective_stream_type(&self) -> StreamSelection {
        self.effective_stream_type
    }

    pub fn consolidate(&self) -> bool {
        self.consolidate
    }

    /// Included streams of the resolution scope. Always empty in simple mode.
    pub fn included_streams(&self) -> &[StreamRef] {
        &self.included_streams
    }

    pub fn refresh(&self) -> &RefreshSettings {
        &self.refresh
    }

    pub fn catalog(&self) -> &ParameterCatalog {
        &self.catalog
    }

    /// Export dataset read in simple mode.
    pub fn source_dataset(&self) -> Option<&str> {
        self.source_dataset.as_deref()
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    /// Property this configuration was resolved for, if any.
    pub fn property(&self) -> Option<&str> {
        self.property.as_deref()
    }

    /// Returns `false` when there is nothing to generate: advanced mode with no included
    /// stream.
    pub fn has_work(&self) -> bool {
        match self.mode {
            Mode::Simple => true,
            Mode::Advanced => !self.included_streams.is_empty(),
        }
    }

    /// Returns the stream filter of a declared property.
    pub fn inclusion_predicate(&self, property_name: &str) -> PlannerResult<StreamPredicate> {
        if self.mode == Mode::Simple {
            bail!(
                ErrorKind::UnknownProperty,
                "Property is not declared",
                format!(
                    "property `{property_name}` was referenced but no `properties` are configured"
                )
            );
        }

        inclusion_predicate(&self.properties, property_name)
    }
}
