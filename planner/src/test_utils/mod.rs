//! Builders for configuration layers, properties and dates used across planner tests.
//!
//! Enabled for unit tests and, through the `test-utils` feature, for downstream crates.

use chrono::NaiveDate;
use config::shared::{
    ConfigLayer, ParameterDeclaration, PropertyConfig, StreamConfig, StreamSelection, StreamType,
};

/// Export dataset used by the builders.
pub const TEST_SOURCE_DATASET: &str = "acme-analytics.analytics_123456";

/// Builds a calendar day.
///
/// # Panics
///
/// Panics if the date does not exist.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date")
}

/// Declares a parameter without a consolidated name.
pub fn param(name: &str, value_type: &str) -> ParameterDeclaration {
    ParameterDeclaration::new(name, value_type)
}

/// Declares a string parameter merged under `consolidated_name`.
pub fn consolidated_param(name: &str, consolidated_name: &str) -> ParameterDeclaration {
    ParameterDeclaration::new(name, "string").consolidated_as(consolidated_name)
}

/// Builds an included stream.
pub fn stream(stream_id: &str, stream_type: StreamType) -> StreamConfig {
    StreamConfig {
        stream_id: stream_id.to_owned(),
        stream_type,
        source_dataset: None,
        use_fresh_daily: None,
        include: true,
    }
}

/// Builds a stream switched off with `include: false`.
pub fn excluded_stream(stream_id: &str, stream_type: StreamType) -> StreamConfig {
    StreamConfig {
        include: false,
        ..stream(stream_id, stream_type)
    }
}

/// Builds a property reading from `acme-analytics.analytics_<name>`.
pub fn property(name: &str, streams: Vec<StreamConfig>) -> PropertyConfig {
    PropertyConfig {
        name: name.to_owned(),
        source_dataset: format!("acme-analytics.analytics_{name}"),
        use_fresh_daily: None,
        streams,
        overrides: None,
    }
}

/// Builds a simple mode client layer covering `stream_type`.
pub fn simple_layer(stream_type: StreamSelection) -> ConfigLayer {
    ConfigLayer {
        stream_type: Some(stream_type),
        source_dataset: Some(TEST_SOURCE_DATASET.to_owned()),
        ..ConfigLayer::default()
    }
}

/// Builds an advanced mode client layer.
pub fn advanced_layer(properties: Vec<PropertyConfig>) -> ConfigLayer {
    ConfigLayer {
        properties: Some(properties),
        ..ConfigLayer::default()
    }
}

/// Builds a simple mode layer covering both stream kinds with paired screen parameters and
/// consolidation requested.
pub fn consolidating_layer() -> ConfigLayer {
    ConfigLayer {
        consolidate_web_app: Some(true),
        web_params: Some(vec![
            consolidated_param("page_location", "screen_location"),
            param("page_referrer", "string"),
        ]),
        app_params: Some(vec![
            consolidated_param("firebase_screen", "screen_location"),
            param("firebase_screen_class", "string"),
        ]),
        ..simple_layer(StreamSelection::Both)
    }
}
