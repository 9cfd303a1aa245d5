use config::shared::ParameterDeclaration;
use serde::Serialize;

use crate::catalog::{CatalogArray, ParameterCatalog, ParameterSpec, ValueType, parse_parameter_array};
use crate::error::PlannerResult;
use crate::sql::quote_literal;

/// A named value expression reading one parameter out of a key/value array.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldExpression {
    /// Output column name, equal to the parameter name.
    pub name: String,
    pub value_type: ValueType,
    /// Lookup expression without its alias.
    pub expression: String,
}

impl FieldExpression {
    /// Renders the expression aliased to its name.
    pub fn to_sql(&self) -> String {
        format!("{} AS {}", self.expression, self.name)
    }
}

/// Generates one field expression per declaration of `array`, read from `source_ref`.
///
/// Output order matches input order. The whole array is validated before anything is
/// generated, so an unsupported type or duplicate name yields an error and no expressions.
pub fn extract(
    params: &[ParameterDeclaration],
    array: CatalogArray,
    source_ref: &str,
) -> PlannerResult<Vec<FieldExpression>> {
    let specs = parse_parameter_array(array, params)?;

    Ok(extract_specs(&specs, source_ref))
}

/// Generates field expressions for already validated specs.
pub fn extract_specs(specs: &[ParameterSpec], source_ref: &str) -> Vec<FieldExpression> {
    specs
        .iter()
        .map(|spec| FieldExpression {
            name: spec.name.clone(),
            value_type: spec.value_type,
            expression: lookup_expression(spec, source_ref),
        })
        .collect()
}

/// Generates field expressions for one catalog array read from its default source column.
pub fn extract_array(catalog: &ParameterCatalog, array: CatalogArray) -> Vec<FieldExpression> {
    extract_specs(catalog.array(array), array.source_array())
}

/// Single-value lookup of `spec` in the key/value array `source_ref`.
fn lookup_expression(spec: &ParameterSpec, source_ref: &str) -> String {
    format!(
        "(SELECT value.{slot} FROM UNNEST({source_ref}) WHERE key = {key} LIMIT 1)",
        slot = spec.value_type.value_slot(),
        key = quote_literal(&spec.name),
    )
}
