use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::Config;
use crate::shared::{ParameterDeclaration, PropertyConfig, StreamSelection, ValidationError};

/// One layer of generation settings.
///
/// Every field is optional: a layer only states what it overrides. Layers are stacked from
/// the framework defaults, through the client document and per-property overrides, up to the
/// run-time overrides, and the most specific layer that sets a field wins. Array-valued fields
/// are replaced wholesale, never concatenated.
///
/// The client configuration document (`configuration/base.yaml`) deserializes directly into
/// this type.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct ConfigLayer {
    /// Stream kinds covered in simple mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_type: Option<StreamSelection>,
    /// Export dataset (`project.dataset`) read in simple mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_dataset: Option<String>,
    /// Requests merging paired web and app parameters into unified fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consolidate_web_app: Option<bool>,
    /// Multi-property tree; its presence switches resolution to advanced mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<PropertyConfig>>,

    /// Event parameters extracted for every stream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_params: Option<Vec<ParameterDeclaration>>,
    /// Event parameters only web streams send.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_params: Option<Vec<ParameterDeclaration>>,
    /// Event parameters only app streams send.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_params: Option<Vec<ParameterDeclaration>>,
    /// Client specific event parameters, always extracted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_params: Option<Vec<ParameterDeclaration>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_properties: Option<Vec<ParameterDeclaration>>,
    /// Parameters of the nested item records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_params: Option<Vec<ParameterDeclaration>>,

    /// Number of trailing days reloaded on every incremental run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rolling_window_days: Option<i64>,
    /// Whether intermediate window days read the fresh daily export.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_fresh_daily: Option<bool>,
    /// Number of trailing days loaded when the destination table does not exist yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_load_days: Option<i64>,
    /// Runs a full reload of `[backfill_start, backfill_end]` instead of the rolling window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backfill: Option<bool>,
    /// First backfilled day, `YYYYMMDD` or `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backfill_start: Option<String>,
    /// Last backfilled day, `YYYYMMDD` or `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backfill_end: Option<String>,

    /// Destination project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_project: Option<String>,
    /// Destination dataset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_dataset: Option<String>,
}

impl ConfigLayer {
    /// Validates the structure of the layer and of every property it declares.
    ///
    /// Semantic checks that need the merged view (parameter types, window bounds) happen at
    /// resolution time.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(properties) = &self.properties {
            let mut seen = HashSet::with_capacity(properties.len());
            for property in properties {
                property.validate()?;

                if !seen.insert(property.name.as_str()) {
                    return Err(ValidationError::DuplicatePropertyName(
                        property.name.clone(),
                    ));
                }
            }
        }

        for (field, value) in [
            ("source_dataset", &self.source_dataset),
            ("destination_project", &self.destination_project),
            ("destination_dataset", &self.destination_dataset),
        ] {
            if value.as_deref().is_some_and(|value| value.trim().is_empty()) {
                return Err(ValidationError::InvalidFieldValue {
                    field: field.to_owned(),
                    constraint: "cannot be empty when set".to_owned(),
                });
            }
        }

        Ok(())
    }

    /// Returns `true` when the layer sets nothing.
    pub fn is_empty(&self) -> bool {
        self == &ConfigLayer::default()
    }
}

impl Config for ConfigLayer {
    const LIST_PARSE_KEYS: &'static [&'static str] = &[];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_document_deserialization() {
        let layer: ConfigLayer = serde_json::from_str(
            r#"{
                "stream_type": "both",
                "source_dataset": "acme.analytics_1",
                "consolidate_web_app": true,
                "web_params": [
                    {"name": "page_location", "consolidated_name": "screen_location"}
                ],
                "app_params": [
                    {"name": "firebase_screen", "type": "string", "consolidated_name": "screen_location"}
                ],
                "rolling_window_days": 5,
                "backfill_start": "20240101"
            }"#,
        )
        .unwrap();

        assert_eq!(layer.stream_type, Some(StreamSelection::Both));
        assert_eq!(layer.rolling_window_days, Some(5));
        assert!(layer.properties.is_none());

        let web_params = layer.web_params.unwrap();
        assert_eq!(web_params[0].value_type, "string");
        assert_eq!(
            web_params[0].consolidated_name.as_deref(),
            Some("screen_location")
        );
    }

    #[test]
    fn test_null_properties_stay_in_simple_mode() {
        let layer: ConfigLayer = serde_json::from_str(r#"{"properties": null}"#).unwrap();
        assert!(layer.properties.is_none());
        assert!(layer.is_empty());
    }

    #[test]
    fn test_duplicate_property_names_are_rejected() {
        let layer: ConfigLayer = serde_json::from_str(
            r#"{"properties": [
                {"name": "shop", "source_dataset": "acme.analytics_1"},
                {"name": "shop", "source_dataset": "acme.analytics_2"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(
            layer.validate(),
            Err(ValidationError::DuplicatePropertyName("shop".to_owned()))
        );
    }

    #[test]
    fn test_empty_destination_dataset_is_rejected() {
        let layer = ConfigLayer {
            destination_dataset: Some(" ".to_owned()),
            ..ConfigLayer::default()
        };

        assert!(matches!(
            layer.validate(),
            Err(ValidationError::InvalidFieldValue { field, .. }) if field == "destination_dataset"
        ));
    }
}
