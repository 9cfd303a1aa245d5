use chrono::{Days, Months, NaiveDate};
use config::shared::{ConfigLayer, PropertyConfig, StreamSelection};
use tracing::{debug, info};

use crate::catalog::ParameterCatalog;
use crate::error::{ErrorKind, PlannerError, PlannerResult};
use crate::resolve::defaults::{
    DEFAULT_BACKFILL_END_OFFSET_DAYS, DEFAULT_BACKFILL_MONTHS, DEFAULT_INITIAL_LOAD_DAYS,
    DEFAULT_ROLLING_WINDOW_DAYS, framework_defaults,
};
use crate::resolve::effective::{Backfill, Destination, EffectiveConfig, Mode, RefreshSettings};
use crate::resolve::merge::merge_layers;
use crate::resolve::streams::resolve_streams;
use crate::{bail, planner_error};

/// Date formats accepted for backfill bounds.
const DATE_FORMATS: [&str; 2] = ["%Y%m%d", "%Y-%m-%d"];

/// The configuration layers of a run, from least to most specific.
///
/// Per-property override layers are not stored here: they live inside the properties tree and
/// are stacked between the client and run-time layers when resolving for one property.
#[derive(Clone, Debug, PartialEq)]
pub struct LayeredConfig {
    defaults: ConfigLayer,
    client: ConfigLayer,
    runtime: ConfigLayer,
}

impl LayeredConfig {
    /// Stacks `client` on top of the framework defaults.
    pub fn new(client: ConfigLayer) -> Self {
        Self {
            defaults: framework_defaults(),
            client,
            runtime: ConfigLayer::default(),
        }
    }

    /// Sets the run-time layer, which wins over every other layer.
    pub fn with_runtime_overrides(mut self, runtime: ConfigLayer) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn client(&self) -> &ConfigLayer {
        &self.client
    }

    pub fn runtime(&self) -> &ConfigLayer {
        &self.runtime
    }

    /// Names of the declared properties. Empty in simple mode.
    pub fn property_names(&self) -> Vec<String> {
        self.merged()
            .properties
            .unwrap_or_default()
            .into_iter()
            .map(|property| property.name)
            .collect()
    }

    fn merged(&self) -> ConfigLayer {
        merge_layers([&self.defaults, &self.client, &self.runtime])
    }
}

/// Resolves the layers into one effective configuration.
///
/// In advanced mode the included streams of every property are enumerated and the effective
/// stream type is derived from them. Per-property overrides are not applied, use
/// [`resolve_for_property`] for that.
pub fn resolve(layers: &LayeredConfig, today: NaiveDate) -> PlannerResult<EffectiveConfig> {
    let merged = layers.merged();
    merged.validate()?;

    build_effective(merged, None, today)
}

/// Resolves the layers for a single property.
///
/// The property's `overrides` layer is stacked above the client layer and below the run-time
/// layer, and only the property's own streams are considered.
pub fn resolve_for_property(
    layers: &LayeredConfig,
    property_name: &str,
    today: NaiveDate,
) -> PlannerResult<EffectiveConfig> {
    let base = layers.merged();
    base.validate()?;

    let Some(property) = base
        .properties
        .as_deref()
        .unwrap_or_default()
        .iter()
        .find(|property| property.name == property_name)
        .cloned()
    else {
        bail!(
            ErrorKind::UnknownProperty,
            "Property is not declared",
            format!("property `{property_name}` is not declared in `properties`")
        );
    };

    let property_layer = property.overrides.clone().unwrap_or_default();
    let merged = merge_layers([
        &layers.defaults,
        &layers.client,
        &property_layer,
        &layers.runtime,
    ]);
    merged.validate()?;

    build_effective(merged, Some(&property), today)
}

fn build_effective(
    merged: ConfigLayer,
    property: Option<&PropertyConfig>,
    today: NaiveDate,
) -> PlannerResult<EffectiveConfig> {
    let catalog = ParameterCatalog::from_layer(&merged)?;

    let refresh = refresh_settings(&merged, today)?;
    refresh.validate()?;

    let properties = merged.properties.clone();
    let (mode, effective_stream_type, included_streams, source_dataset) = match &properties {
        Some(properties) => {
            let resolution = match property {
                Some(property) => resolve_streams([property], refresh.use_fresh_daily),
                None => resolve_streams(properties, refresh.use_fresh_daily),
            };

            (
                Mode::Advanced,
                resolution.effective_type,
                resolution.included_streams,
                property.map(|property| property.source_dataset.clone()),
            )
        }
        None => {
            let (stream_type, source_dataset) = simple_mode_settings(&merged)?;
            (Mode::Simple, stream_type, Vec::new(), Some(source_dataset))
        }
    };

    let consolidate_requested = merged.consolidate_web_app.unwrap_or(false);
    let consolidate = consolidate_requested && effective_stream_type == StreamSelection::Both;
    if consolidate_requested && !consolidate {
        debug!(
            %effective_stream_type,
            "consolidation requested but only one stream kind is covered, disabling it"
        );
    }

    let effective = EffectiveConfig {
        mode,
        effective_stream_type,
        consolidate,
        included_streams,
        refresh,
        catalog,
        source_dataset,
        destination: Destination {
            project: merged.destination_project,
            dataset: merged.destination_dataset,
        },
        property: property.map(|property| property.name.clone()),
        properties: properties.unwrap_or_default(),
    };

    info!(
        mode = ?effective.mode,
        property = effective.property.as_deref().unwrap_or("-"),
        %effective_stream_type,
        consolidate,
        included_streams = effective.included_streams.len(),
        rolling_window_days = effective.refresh.rolling_window_days,
        backfill = effective.refresh.backfill.active,
        "resolved effective configuration"
    );

    Ok(effective)
}

/// Reads the settings simple mode cannot do without.
fn simple_mode_settings(merged: &ConfigLayer) -> PlannerResult<(StreamSelection, String)> {
    let mut errors = Vec::new();

    if merged.stream_type.is_none() {
        errors.push(planner_error!(
            ErrorKind::MissingConfiguration,
            "Required setting is missing",
            "`stream_type` must be set when no `properties` are configured"
        ));
    }

    if merged.source_dataset.is_none() {
        errors.push(planner_error!(
            ErrorKind::MissingConfiguration,
            "Required setting is missing",
            "`source_dataset` must be set when no `properties` are configured"
        ));
    }

    match (merged.stream_type, &merged.source_dataset) {
        (Some(stream_type), Some(source_dataset)) => Ok((stream_type, source_dataset.clone())),
        _ => Err(PlannerError::from(errors)),
    }
}

fn refresh_settings(merged: &ConfigLayer, today: NaiveDate) -> PlannerResult<RefreshSettings> {
    let rolling_window_days = window_days(
        "rolling_window_days",
        merged
            .rolling_window_days
            .unwrap_or(DEFAULT_ROLLING_WINDOW_DAYS),
    )?;
    let initial_load_days = window_days(
        "initial_load_days",
        merged.initial_load_days.unwrap_or(DEFAULT_INITIAL_LOAD_DAYS),
    )?;

    let start = match &merged.backfill_start {
        Some(value) => parse_date("backfill_start", value)?,
        None => today
            .checked_sub_months(Months::new(DEFAULT_BACKFILL_MONTHS))
            .ok_or_else(|| out_of_range("backfill_start", today))?,
    };
    let end = match &merged.backfill_end {
        Some(value) => parse_date("backfill_end", value)?,
        None => today
            .checked_sub_days(Days::new(DEFAULT_BACKFILL_END_OFFSET_DAYS))
            .ok_or_else(|| out_of_range("backfill_end", today))?,
    };

    Ok(RefreshSettings {
        rolling_window_days,
        use_fresh_daily: merged.use_fresh_daily.unwrap_or(false),
        backfill: Backfill {
            active: merged.backfill.unwrap_or(false),
            start,
            end,
        },
        initial_load_days,
    })
}

fn window_days(setting: &str, days: i64) -> PlannerResult<u32> {
    match u32::try_from(days) {
        Ok(days) if days > 0 => Ok(days),
        _ => bail!(
            ErrorKind::InvalidRefreshWindow,
            "Refresh window must cover at least one day",
            format!("`{setting}` must be greater than 0, got {days}")
        ),
    }
}

/// Parses a `YYYYMMDD` or `YYYY-MM-DD` date.
pub fn parse_date(setting: &str, value: &str) -> PlannerResult<NaiveDate> {
    let value = value.trim();

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .ok_or_else(|| {
            planner_error!(
                ErrorKind::InvalidDate,
                "Date is not valid",
                format!("`{setting}` must be a `YYYYMMDD` or `YYYY-MM-DD` date, got `{value}`")
            )
        })
}

fn out_of_range(setting: &str, today: NaiveDate) -> PlannerError {
    planner_error!(
        ErrorKind::InvalidDate,
        "Default date is out of range",
        format!("cannot derive `{setting}` from {today}")
    )
}
