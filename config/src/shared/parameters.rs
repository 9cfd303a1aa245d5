use serde::{Deserialize, Serialize};

/// Value type assumed when a declaration omits `type`.
pub const DEFAULT_PARAMETER_TYPE: &str = "string";

fn default_parameter_type() -> String {
    DEFAULT_PARAMETER_TYPE.to_owned()
}

/// A parameter as written in a configuration document.
///
/// The type is kept as free text here; it only becomes a typed value once the catalog is
/// resolved, so an unsupported type surfaces as a resolution error naming the parameter and
/// its array instead of an opaque deserialization failure.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ParameterDeclaration {
    /// Key looked up in the source key/value array, also used as the output column name.
    pub name: String,
    /// Declared value type (`string`, `int` or `float`).
    #[serde(rename = "type", default = "default_parameter_type")]
    pub value_type: String,
    /// Unified output name shared with the counterpart in the opposing web/app array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consolidated_name: Option<String>,
}

impl ParameterDeclaration {
    /// Creates a declaration without a consolidated name.
    pub fn new(name: impl Into<String>, value_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_type: value_type.into(),
            consolidated_name: None,
        }
    }

    /// Sets the consolidated name.
    pub fn consolidated_as(mut self, consolidated_name: impl Into<String>) -> Self {
        self.consolidated_name = Some(consolidated_name.into());
        self
    }
}
