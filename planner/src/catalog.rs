//! Typed parameter catalog.
//!
//! Configuration documents declare parameters with a free-text type. The catalog converts
//! them into [`ParameterSpec`]s through a closed match over the supported kinds and checks that
//! names are unique within each array. Every problem found in a pass is reported, and a catalog
//! is only built when there are none.

use std::collections::{HashMap, HashSet};
use std::fmt;

use config::shared::{ConfigLayer, ParameterDeclaration};
use serde::Serialize;

use crate::error::{ErrorKind, PlannerError, PlannerResult};
use crate::planner_error;
use crate::sql::is_valid_identifier;

/// Supported parameter value kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    String,
    Int,
    Float,
}

impl ValueType {
    /// Parses a declared type name.
    ///
    /// Returns [`None`] for anything that is not one of the supported kinds.
    pub fn parse(declared: &str) -> Option<ValueType> {
        match declared.trim().to_ascii_lowercase().as_str() {
            "string" => Some(ValueType::String),
            "int" => Some(ValueType::Int),
            "float" => Some(ValueType::Float),
            _ => None,
        }
    }

    /// Returns the slot of a key/value pair's tagged value that holds this kind.
    ///
    /// The export writes floating-point values to the double slot.
    pub fn value_slot(&self) -> &'static str {
        match self {
            ValueType::String => "string_value",
            ValueType::Int => "int_value",
            ValueType::Float => "double_value",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::String => f.write_str("string"),
            ValueType::Int => f.write_str("int"),
            ValueType::Float => f.write_str("float"),
        }
    }
}

/// The named parameter arrays of a catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CatalogArray {
    Core,
    Web,
    App,
    Custom,
    UserProperties,
    ItemParams,
}

impl CatalogArray {
    /// Every array, in catalog order.
    pub const ALL: [CatalogArray; 6] = [
        CatalogArray::Core,
        CatalogArray::Web,
        CatalogArray::App,
        CatalogArray::Custom,
        CatalogArray::UserProperties,
        CatalogArray::ItemParams,
    ];

    /// Arrays projected side by side from `event_params`.
    pub const PROJECTED: [CatalogArray; 4] = [
        CatalogArray::Core,
        CatalogArray::Web,
        CatalogArray::App,
        CatalogArray::Custom,
    ];

    /// Returns the configuration key the array is declared under.
    pub fn name(&self) -> &'static str {
        match self {
            CatalogArray::Core => "core_params",
            CatalogArray::Web => "web_params",
            CatalogArray::App => "app_params",
            CatalogArray::Custom => "custom_params",
            CatalogArray::UserProperties => "user_properties",
            CatalogArray::ItemParams => "item_params",
        }
    }

    /// Returns the repeated key/value column the array's parameters are looked up in.
    ///
    /// Item parameters are relative to an unnested item record.
    pub fn source_array(&self) -> &'static str {
        match self {
            CatalogArray::Core | CatalogArray::Web | CatalogArray::App | CatalogArray::Custom => {
                "event_params"
            }
            CatalogArray::UserProperties => "user_properties",
            CatalogArray::ItemParams => "item_params",
        }
    }

    fn declarations(self, layer: &ConfigLayer) -> Option<&Vec<ParameterDeclaration>> {
        match self {
            CatalogArray::Core => layer.core_params.as_ref(),
            CatalogArray::Web => layer.web_params.as_ref(),
            CatalogArray::App => layer.app_params.as_ref(),
            CatalogArray::Custom => layer.custom_params.as_ref(),
            CatalogArray::UserProperties => layer.user_properties.as_ref(),
            CatalogArray::ItemParams => layer.item_params.as_ref(),
        }
    }
}

impl fmt::Display for CatalogArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated parameter declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParameterSpec {
    pub name: String,
    pub value_type: ValueType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consolidated_name: Option<String>,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            consolidated_name: None,
        }
    }

    /// Converts one declaration of `array`, naming both in any error.
    pub fn from_declaration(
        declaration: &ParameterDeclaration,
        array: CatalogArray,
    ) -> PlannerResult<Self> {
        if !is_valid_identifier(&declaration.name) {
            return Err(planner_error!(
                ErrorKind::InvalidIdentifier,
                "Parameter name is not a valid column name",
                format!(
                    "parameter `{}` in `{array}` must contain only letters, digits and underscores and must not start with a digit",
                    declaration.name
                )
            ));
        }

        if let Some(consolidated_name) = &declaration.consolidated_name
            && !is_valid_identifier(consolidated_name)
        {
            return Err(planner_error!(
                ErrorKind::InvalidIdentifier,
                "Consolidated name is not a valid column name",
                format!(
                    "consolidated name `{consolidated_name}` of parameter `{}` in `{array}` must contain only letters, digits and underscores",
                    declaration.name
                )
            ));
        }

        let Some(value_type) = ValueType::parse(&declaration.value_type) else {
            return Err(planner_error!(
                ErrorKind::UnsupportedParameterType,
                "Parameter declares an unsupported type",
                format!(
                    "parameter `{}` in `{array}` declares type `{}`; supported types are `string`, `int` and `float`",
                    declaration.name, declaration.value_type
                )
            ));
        };

        Ok(Self {
            name: declaration.name.clone(),
            value_type,
            consolidated_name: declaration.consolidated_name.clone(),
        })
    }
}

/// Converts a whole declaration array.
///
/// Every declaration is checked before anything is returned, so a single bad entry fails the
/// whole array. All problems found are reported together.
pub fn parse_parameter_array(
    array: CatalogArray,
    declarations: &[ParameterDeclaration],
) -> PlannerResult<Vec<ParameterSpec>> {
    let mut specs = Vec::with_capacity(declarations.len());
    let mut errors = Vec::new();
    let mut seen = HashSet::with_capacity(declarations.len());

    for declaration in declarations {
        if !seen.insert(declaration.name.as_str()) {
            errors.push(planner_error!(
                ErrorKind::DuplicateParameterName,
                "Parameter is declared more than once",
                format!(
                    "parameter `{}` appears more than once in `{array}`",
                    declaration.name
                )
            ));
            continue;
        }

        match ParameterSpec::from_declaration(declaration, array) {
            Ok(spec) => specs.push(spec),
            Err(err) => errors.push(err),
        }
    }

    if !errors.is_empty() {
        return Err(PlannerError::from(errors));
    }

    Ok(specs)
}

/// Validated parameter arrays of one effective configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ParameterCatalog {
    pub core: Vec<ParameterSpec>,
    pub web: Vec<ParameterSpec>,
    pub app: Vec<ParameterSpec>,
    pub custom: Vec<ParameterSpec>,
    pub user_properties: Vec<ParameterSpec>,
    pub item_params: Vec<ParameterSpec>,
}

impl ParameterCatalog {
    /// Builds the catalog from the arrays of a merged layer. Missing arrays are empty.
    pub fn from_layer(layer: &ConfigLayer) -> PlannerResult<Self> {
        let mut catalog = ParameterCatalog::default();
        let mut errors = Vec::new();

        for array in CatalogArray::ALL {
            let Some(declarations) = array.declarations(layer) else {
                continue;
            };

            match parse_parameter_array(array, declarations) {
                Ok(specs) => *catalog.array_mut(array) = specs,
                Err(err) => match err.errors() {
                    Some(inner) => errors.extend(inner.iter().cloned()),
                    None => errors.push(err),
                },
            }
        }

        errors.extend(catalog.projection_collisions());

        if !errors.is_empty() {
            return Err(PlannerError::from(errors));
        }

        Ok(catalog)
    }

    /// Finds names that would appear twice as a column of the event projection.
    ///
    /// Core, web, app and custom parameters share one projection, so a name may be declared
    /// in only one of them. A consolidated name must not shadow any of those parameters.
    fn projection_collisions(&self) -> Vec<PlannerError> {
        let mut errors = Vec::new();
        let mut owners: HashMap<&str, CatalogArray> = HashMap::new();

        for array in CatalogArray::PROJECTED {
            for spec in self.array(array) {
                match owners.get(spec.name.as_str()) {
                    Some(owner) => errors.push(planner_error!(
                        ErrorKind::DuplicateParameterName,
                        "Parameter is declared in more than one array",
                        format!(
                            "parameter `{}` is declared in both `{owner}` and `{array}`",
                            spec.name
                        )
                    )),
                    None => {
                        owners.insert(spec.name.as_str(), array);
                    }
                }
            }
        }

        for array in [CatalogArray::Web, CatalogArray::App] {
            for spec in self.array(array) {
                let Some(consolidated_name) = &spec.consolidated_name else {
                    continue;
                };

                if let Some(owner) = owners.get(consolidated_name.as_str()) {
                    errors.push(planner_error!(
                        ErrorKind::DuplicateParameterName,
                        "Consolidated name collides with a parameter",
                        format!(
                            "consolidated name `{consolidated_name}` of parameter `{}` in `{array}` is also a parameter in `{owner}`",
                            spec.name
                        )
                    ));
                }
            }
        }

        errors
    }

    /// Returns the specs of `array`.
    pub fn array(&self, array: CatalogArray) -> &[ParameterSpec] {
        match array {
            CatalogArray::Core => &self.core,
            CatalogArray::Web => &self.web,
            CatalogArray::App => &self.app,
            CatalogArray::Custom => &self.custom,
            CatalogArray::UserProperties => &self.user_properties,
            CatalogArray::ItemParams => &self.item_params,
        }
    }

    fn array_mut(&mut self, array: CatalogArray) -> &mut Vec<ParameterSpec> {
        match array {
            CatalogArray::Core => &mut self.core,
            CatalogArray::Web => &mut self.web,
            CatalogArray::App => &mut self.app,
            CatalogArray::Custom => &mut self.custom,
            CatalogArray::UserProperties => &mut self.user_properties,
            CatalogArray::ItemParams => &mut self.item_params,
        }
    }
}
