//! Generation pass.
//!
//! Resolves the configuration once per unit of work and gathers everything a query builder
//! needs for it: the per-event projection, the identity key, the stream filter and the refresh
//! plan of every source dataset. The pass is all-or-nothing: any configuration error aborts it
//! and no unit is returned.

use chrono::NaiveDate;
use config::shared::{StreamSelection, StreamType};
use serde::Serialize;
use tracing::info;

use crate::catalog::CatalogArray;
use crate::error::{PlannerError, PlannerResult};
use crate::generate::{
    ConsolidatedField, FieldExpression, build_identity_key, consolidate, extract_array,
};
use crate::refresh::{RefreshPlan, plan};
use crate::resolve::{
    Destination, EffectiveConfig, LayeredConfig, Mode, STREAM_ID_COLUMN, resolve,
    resolve_for_property,
};

/// Inputs of one run that do not come from configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunContext {
    /// Last day of the rolling and initial load windows.
    pub today: NaiveDate,
    /// Whether the destination table does not exist yet.
    pub initial_load: bool,
}

impl RunContext {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            initial_load: false,
        }
    }

    pub fn with_initial_load(mut self, initial_load: bool) -> Self {
        self.initial_load = initial_load;
        self
    }
}

/// Shards read from one export dataset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SourcePlan {
    pub source_dataset: String,
    /// Included streams read from the dataset. Empty in simple mode.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stream_ids: Vec<String>,
    pub use_fresh_daily: bool,
    pub refresh: RefreshPlan,
    pub shards: Vec<String>,
}

/// Everything generated for one unit of work.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GenerationUnit {
    /// Property the unit covers. Absent in simple mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    pub mode: Mode,
    pub effective_stream_type: StreamSelection,
    pub consolidate: bool,
    /// Event parameter columns: core, web, app and custom parameters.
    pub event_fields: Vec<FieldExpression>,
    pub consolidated_fields: Vec<ConsolidatedField>,
    pub user_property_fields: Vec<FieldExpression>,
    pub item_fields: Vec<FieldExpression>,
    /// Text expression of every identity key component, in key order.
    pub identity_key: Vec<String>,
    /// Separator-joined concatenation of the identity key components.
    pub identity_key_expression: String,
    /// Row filter on the stream id column. Absent in simple mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_filter: Option<String>,
    pub sources: Vec<SourcePlan>,
    pub destination: Destination,
}

/// Runs the generation pass.
///
/// Simple mode yields one unit. Advanced mode yields one unit per property, skipping the
/// properties without any included stream; errors of every property are reported together.
pub fn generate(layers: &LayeredConfig, run: &RunContext) -> PlannerResult<Vec<GenerationUnit>> {
    let effective = resolve(layers, run.today)?;

    if effective.mode() == Mode::Simple {
        return Ok(vec![build_unit(&effective, run)?]);
    }

    let mut units = Vec::new();
    let mut errors = Vec::new();

    for property_name in layers.property_names() {
        let unit = resolve_for_property(layers, &property_name, run.today).and_then(|effective| {
            if !effective.has_work() {
                info!(property = %property_name, "no stream is included, skipping property");
                return Ok(None);
            }

            build_unit(&effective, run).map(Some)
        });

        match unit {
            Ok(Some(unit)) => units.push(unit),
            Ok(None) => {}
            Err(err) => errors.push(err),
        }
    }

    if !errors.is_empty() {
        return Err(PlannerError::from(errors));
    }

    info!(units = units.len(), "generation pass finished");

    Ok(units)
}

/// Builds the unit of an already resolved configuration.
pub fn build_unit(effective: &EffectiveConfig, run: &RunContext) -> PlannerResult<GenerationUnit> {
    let catalog = effective.catalog();
    let stream_type = effective.effective_stream_type();

    let covered = |array: CatalogArray| match array {
        CatalogArray::Web => stream_type.covers(StreamType::Web),
        CatalogArray::App => stream_type.covers(StreamType::App),
        _ => true,
    };

    let event_fields = CatalogArray::PROJECTED
        .into_iter()
        .filter(|array| covered(*array))
        .flat_map(|array| extract_array(catalog, array))
        .collect();

    let consolidated_fields = consolidate(
        catalog.array(CatalogArray::Web),
        catalog.array(CatalogArray::App),
        effective.consolidate(),
    );

    let identity_key = build_identity_key(effective);

    let stream_filter = match (effective.mode(), effective.property()) {
        (Mode::Advanced, Some(property)) => Some(
            effective
                .inclusion_predicate(property)?
                .to_sql(STREAM_ID_COLUMN),
        ),
        _ => None,
    };

    let unit = GenerationUnit {
        property: effective.property().map(str::to_owned),
        mode: effective.mode(),
        effective_stream_type: stream_type,
        consolidate: effective.consolidate(),
        event_fields,
        consolidated_fields,
        user_property_fields: extract_array(catalog, CatalogArray::UserProperties),
        item_fields: extract_array(catalog, CatalogArray::ItemParams),
        identity_key: identity_key.to_sql_components(),
        identity_key_expression: identity_key.concat_sql(),
        stream_filter,
        sources: source_plans(effective, run)?,
        destination: effective.destination().clone(),
    };

    info!(
        property = unit.property.as_deref().unwrap_or("-"),
        event_fields = unit.event_fields.len(),
        consolidated_fields = unit.consolidated_fields.len(),
        sources = unit.sources.len(),
        "generated unit"
    );

    Ok(unit)
}

/// Plans every export dataset the unit reads.
///
/// In advanced mode included streams are grouped by dataset in declaration order, and a dataset
/// only reads fresh shards when every stream reading it has a fresh daily export.
fn source_plans(effective: &EffectiveConfig, run: &RunContext) -> PlannerResult<Vec<SourcePlan>> {
    let refresh = effective.refresh();

    let mut groups: Vec<(String, Vec<String>, bool)> = Vec::new();
    match effective.mode() {
        Mode::Simple => {
            if let Some(source_dataset) = effective.source_dataset() {
                groups.push((source_dataset.to_owned(), Vec::new(), refresh.use_fresh_daily));
            }
        }
        Mode::Advanced => {
            for stream in effective.included_streams() {
                match groups
                    .iter_mut()
                    .find(|(dataset, _, _)| *dataset == stream.source_dataset)
                {
                    Some((_, stream_ids, use_fresh_daily)) => {
                        stream_ids.push(stream.stream_id.clone());
                        *use_fresh_daily &= stream.use_fresh_daily;
                    }
                    None => groups.push((
                        stream.source_dataset.clone(),
                        vec![stream.stream_id.clone()],
                        stream.use_fresh_daily,
                    )),
                }
            }
        }
    }

    groups
        .into_iter()
        .map(|(source_dataset, stream_ids, use_fresh_daily)| {
            let refresh = plan(
                run.today,
                &refresh.with_fresh_daily(use_fresh_daily),
                run.initial_load,
            )?;
            let shards = refresh.source_shards(&source_dataset);

            Ok(SourcePlan {
                source_dataset,
                stream_ids,
                use_fresh_daily,
                refresh,
                shards,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use config::shared::ConfigLayer;

    use super::*;
    use crate::error::ErrorKind;
    use crate::refresh::SourceKind;
    use crate::test_utils::{
        TEST_SOURCE_DATASET, advanced_layer, consolidating_layer, date, excluded_stream, param,
        property, simple_layer, stream,
    };

    fn run() -> RunContext {
        RunContext::new(date(2025, 3, 10))
    }

    #[test]
    fn test_simple_mode_yields_one_unit() {
        let units = generate(&LayeredConfig::new(consolidating_layer()), &run()).unwrap();

        assert_eq!(units.len(), 1);
        let unit = &units[0];
        assert_eq!(unit.property, None);
        assert_eq!(unit.stream_filter, None);
        assert!(unit.consolidate);
        assert_eq!(unit.consolidated_fields.len(), 1);
        assert_eq!(unit.sources.len(), 1);
        assert_eq!(unit.sources[0].source_dataset, TEST_SOURCE_DATASET);
        assert_eq!(unit.sources[0].shards.len(), 3);
        assert_eq!(unit.identity_key.len(), 7 + 4 + 1 + 2);
    }

    #[test]
    fn test_uncovered_stream_kind_is_not_projected() {
        let units = generate(
            &LayeredConfig::new(simple_layer(StreamSelection::Web)),
            &run(),
        )
        .unwrap();

        let names: Vec<_> = units[0]
            .event_fields
            .iter()
            .map(|field| field.name.as_str())
            .collect();
        assert!(names.contains(&"page_location"));
        assert!(!names.contains(&"firebase_screen"));
    }

    #[test]
    fn test_advanced_mode_yields_one_unit_per_property() {
        let mut mobile = property(
            "mobile",
            vec![
                stream("222", StreamType::App),
                stream("333", StreamType::App),
            ],
        );
        mobile.streams[1].source_dataset = Some("acme-analytics.analytics_legacy".to_owned());
        mobile.streams[1].use_fresh_daily = Some(true);
        let client = ConfigLayer {
            use_fresh_daily: Some(true),
            ..advanced_layer(vec![
                property("shop", vec![stream("111", StreamType::Web)]),
                mobile,
                property("blog", vec![excluded_stream("444", StreamType::Web)]),
            ])
        };

        let units = generate(&LayeredConfig::new(client), &run()).unwrap();

        let properties: Vec<_> = units
            .iter()
            .map(|unit| unit.property.as_deref())
            .collect();
        assert_eq!(properties, vec![Some("shop"), Some("mobile")]);

        let mobile = &units[1];
        assert_eq!(mobile.effective_stream_type, StreamSelection::App);
        assert_eq!(mobile.stream_filter.as_deref(), Some("stream_id IN ('222', '333')"));
        assert_eq!(mobile.sources.len(), 2);
        assert_eq!(mobile.sources[1].stream_ids, vec!["333".to_owned()]);
        assert_eq!(
            mobile.sources[1].refresh.entries()[0].source_kind,
            SourceKind::Fresh
        );
    }

    #[test]
    fn test_datasets_without_fresh_export_for_every_stream_read_finalized() {
        let mut shop = property(
            "shop",
            vec![stream("111", StreamType::Web), stream("222", StreamType::App)],
        );
        shop.use_fresh_daily = Some(true);
        shop.streams[1].use_fresh_daily = Some(false);

        let units = generate(&LayeredConfig::new(advanced_layer(vec![shop])), &run()).unwrap();

        let source = &units[0].sources[0];
        assert_eq!(source.stream_ids.len(), 2);
        assert!(!source.use_fresh_daily);
        assert!(
            source
                .refresh
                .entries()
                .iter()
                .all(|entry| entry.source_kind == SourceKind::Finalized)
        );
    }

    #[test]
    fn test_errors_of_every_property_are_reported() {
        let mut shop = property("shop", vec![stream("111", StreamType::Web)]);
        shop.overrides = Some(ConfigLayer {
            custom_params: Some(vec![param("coupon", "money")]),
            ..ConfigLayer::default()
        });
        let mut blog = property("blog", vec![stream("222", StreamType::Web)]);
        blog.overrides = Some(ConfigLayer {
            rolling_window_days: Some(0),
            ..ConfigLayer::default()
        });

        let err =
            generate(&LayeredConfig::new(advanced_layer(vec![shop, blog])), &run()).unwrap_err();

        assert_eq!(
            err.kinds(),
            vec![
                ErrorKind::UnsupportedParameterType,
                ErrorKind::InvalidRefreshWindow
            ]
        );
    }

    #[test]
    fn test_backfill_run() {
        let client = ConfigLayer {
            backfill: Some(true),
            backfill_start: Some("20240101".to_owned()),
            backfill_end: Some("20240103".to_owned()),
            ..simple_layer(StreamSelection::Web)
        };

        let units = generate(
            &LayeredConfig::new(client),
            &run().with_initial_load(true),
        )
        .unwrap();

        assert_eq!(
            units[0].sources[0].shards,
            vec![
                format!("{TEST_SOURCE_DATASET}.events_20240101"),
                format!("{TEST_SOURCE_DATASET}.events_20240102"),
                format!("{TEST_SOURCE_DATASET}.events_20240103"),
            ]
        );
    }
}
