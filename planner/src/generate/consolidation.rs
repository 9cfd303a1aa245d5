use serde::Serialize;
use tracing::debug;

use crate::catalog::ParameterSpec;
use crate::generate::record::{EventRecord, FieldValue};

/// A unified output field merging a web-side and an app-side parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConsolidatedField {
    /// Shared consolidated name, used as the output column name.
    pub name: String,
    /// Web parameter declaring the name, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_source: Option<String>,
    /// App parameter declaring the name, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_source: Option<String>,
    /// First-non-null expression over the present sources, web first.
    pub expression: String,
}

impl ConsolidatedField {
    fn new(name: String, web_source: Option<String>, app_source: Option<String>) -> Self {
        let sources = web_source
            .iter()
            .chain(app_source.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            expression: format!("COALESCE({sources})"),
            name,
            web_source,
            app_source,
        }
    }

    /// Renders the expression aliased to the consolidated name.
    pub fn to_sql(&self) -> String {
        format!("{} AS {}", self.expression, self.name)
    }

    /// Returns `true` if `parameter` is one of the merged sources.
    pub fn merges(&self, parameter: &str) -> bool {
        self.web_source.as_deref() == Some(parameter) || self.app_source.as_deref() == Some(parameter)
    }

    /// Evaluates the field against a record holding the source columns.
    pub fn evaluate<'a>(&self, record: &'a EventRecord) -> Option<&'a FieldValue> {
        self.web_source
            .iter()
            .chain(self.app_source.iter())
            .find_map(|source| record.get(source))
    }
}

/// Builds unified fields from paired web and app parameters.
///
/// Returns nothing when `enabled` is false. Otherwise emits one field per distinct
/// `consolidated_name`, ordered by first declaration (web array first), preferring the web
/// value over the app value. A name declared on one side only still yields a single-source
/// field. Parameters without a consolidated name are left to their stream projection.
pub fn consolidate(
    web_params: &[ParameterSpec],
    app_params: &[ParameterSpec],
    enabled: bool,
) -> Vec<ConsolidatedField> {
    if !enabled {
        return Vec::new();
    }

    // (consolidated name, web source, app source), in first-declaration order.
    let mut pairs: Vec<(String, Option<String>, Option<String>)> = Vec::new();

    for (params, is_web) in [(web_params, true), (app_params, false)] {
        for param in params {
            let Some(consolidated_name) = &param.consolidated_name else {
                continue;
            };

            let index = match pairs.iter().position(|(name, _, _)| name == consolidated_name) {
                Some(index) => index,
                None => {
                    pairs.push((consolidated_name.clone(), None, None));
                    pairs.len() - 1
                }
            };

            let slot = if is_web {
                &mut pairs[index].1
            } else {
                &mut pairs[index].2
            };

            if slot.is_none() {
                *slot = Some(param.name.clone());
            } else {
                debug!(
                    consolidated_name = %consolidated_name,
                    kept = ?slot,
                    ignored = %param.name,
                    "consolidated name declared twice on the same side, keeping the first"
                );
            }
        }
    }

    pairs
        .into_iter()
        .map(|(name, web_source, app_source)| ConsolidatedField::new(name, web_source, app_source))
        .collect()
}
