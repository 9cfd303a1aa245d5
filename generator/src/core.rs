use std::io::Write;

use chrono::NaiveDate;
use config::shared::ConfigLayer;
use planner::generation::{GenerationUnit, RunContext, build_unit, generate};
use planner::resolve::{LayeredConfig, resolve_for_property};
use tracing::info;

use crate::error::GeneratorResult;

/// Run-time overrides taken from the command line.
///
/// Every set value becomes part of the most specific configuration layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeOverrides {
    /// Turns a backfill on or off. `None` keeps the configured setting.
    pub backfill: Option<bool>,
    pub backfill_start: Option<String>,
    pub backfill_end: Option<String>,
    pub destination_project: Option<String>,
    pub destination_dataset: Option<String>,
}

impl RuntimeOverrides {
    /// Builds the run-time configuration layer. An absent flag leaves the field unset.
    pub fn to_layer(&self) -> ConfigLayer {
        ConfigLayer {
            backfill: self.backfill,
            backfill_start: self.backfill_start.clone(),
            backfill_end: self.backfill_end.clone(),
            destination_project: self.destination_project.clone(),
            destination_dataset: self.destination_dataset.clone(),
            ..ConfigLayer::default()
        }
    }
}

/// What a single generator invocation produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub today: NaiveDate,
    pub initial_load: bool,
    /// Restricts an advanced mode run to one property.
    pub property: Option<String>,
    pub overrides: RuntimeOverrides,
}

/// Runs the generation pass for `client` and returns the generated units.
pub fn run_generation(
    client: ConfigLayer,
    request: &GenerationRequest,
) -> GeneratorResult<Vec<GenerationUnit>> {
    let runtime = request.overrides.to_layer();
    let layers = LayeredConfig::new(client).with_runtime_overrides(runtime);
    let run = RunContext::new(request.today).with_initial_load(request.initial_load);

    info!(
        today = %request.today,
        initial_load = request.initial_load,
        property = request.property.as_deref().unwrap_or("-"),
        "starting generation pass"
    );

    let units = match &request.property {
        Some(property) => {
            let effective = resolve_for_property(&layers, property, request.today)?;
            if effective.has_work() {
                vec![build_unit(&effective, &run)?]
            } else {
                info!(%property, "no stream is included, nothing to generate");
                Vec::new()
            }
        }
        None => generate(&layers, &run)?,
    };

    Ok(units)
}

/// Writes `units` to `writer` as JSON followed by a newline.
pub fn write_units<W: Write>(
    units: &[GenerationUnit],
    compact: bool,
    mut writer: W,
) -> GeneratorResult<()> {
    if compact {
        serde_json::to_writer(&mut writer, units)?;
    } else {
        serde_json::to_writer_pretty(&mut writer, units)?;
    }

    writeln!(writer)?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use config::shared::{StreamSelection, StreamType};
    use planner::refresh::RefreshMode;
    use planner::test_utils::{advanced_layer, date, excluded_stream, property, simple_layer, stream};

    use super::*;
    use crate::error::GeneratorError;

    fn request() -> GenerationRequest {
        GenerationRequest {
            today: date(2025, 3, 10),
            initial_load: false,
            property: None,
            overrides: RuntimeOverrides::default(),
        }
    }

    #[test]
    fn test_absent_flags_leave_the_runtime_layer_empty() {
        assert!(RuntimeOverrides::default().to_layer().is_empty());
    }

    #[test]
    fn test_runtime_overrides_win_over_client_settings() {
        let client = ConfigLayer {
            backfill_start: Some("20230101".to_owned()),
            destination_dataset: Some("marts".to_owned()),
            ..simple_layer(StreamSelection::Web)
        };
        let request = GenerationRequest {
            overrides: RuntimeOverrides {
                backfill: Some(true),
                backfill_start: Some("2024-01-01".to_owned()),
                backfill_end: Some("2024-01-03".to_owned()),
                destination_dataset: Some("adhoc".to_owned()),
                ..RuntimeOverrides::default()
            },
            ..request()
        };

        let units = run_generation(client, &request).unwrap();

        assert_eq!(units[0].sources[0].shards.len(), 3);
        assert_eq!(units[0].destination.dataset.as_deref(), Some("adhoc"));
    }

    #[test]
    fn test_runtime_override_turns_a_standing_backfill_off() {
        let client = ConfigLayer {
            backfill: Some(true),
            backfill_start: Some("20240101".to_owned()),
            backfill_end: Some("20240131".to_owned()),
            ..simple_layer(StreamSelection::Web)
        };
        let rolling = GenerationRequest {
            overrides: RuntimeOverrides {
                backfill: Some(false),
                ..RuntimeOverrides::default()
            },
            ..request()
        };

        let configured = run_generation(client.clone(), &request()).unwrap();
        assert_eq!(configured[0].sources[0].shards.len(), 31);

        let units = run_generation(client, &rolling).unwrap();
        assert_eq!(units[0].sources[0].refresh.mode(), RefreshMode::Rolling);
    }

    #[test]
    fn test_single_property_run() {
        let client = advanced_layer(vec![
            property("shop", vec![stream("111", StreamType::Web)]),
            property("blog", vec![excluded_stream("222", StreamType::Web)]),
        ]);

        let shop = run_generation(
            client.clone(),
            &GenerationRequest {
                property: Some("shop".to_owned()),
                ..request()
            },
        )
        .unwrap();
        assert_eq!(shop.len(), 1);

        let blog = run_generation(
            client.clone(),
            &GenerationRequest {
                property: Some("blog".to_owned()),
                ..request()
            },
        )
        .unwrap();
        assert!(blog.is_empty());

        let err = run_generation(
            client,
            &GenerationRequest {
                property: Some("news".to_owned()),
                ..request()
            },
        )
        .unwrap_err();
        assert!(matches!(err, GeneratorError::Planner(_)));
        assert_eq!(err.category(), "configuration error");
    }

    #[test]
    fn test_compact_output_is_one_line() {
        let units = run_generation(simple_layer(StreamSelection::App), &request()).unwrap();

        let mut out = Vec::new();
        write_units(&units, true, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);

        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[0]["effective_stream_type"], "app");
        assert_eq!(parsed[0]["sources"][0]["refresh"]["mode"], "rolling");
    }
}
