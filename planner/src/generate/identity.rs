//! Deterministic per-event identity key.
//!
//! The key is the separator-joined concatenation of a fixed, ordered list of projected
//! columns. The order defines the hash domain of every key ever produced: reordering,
//! inserting or removing a component changes the key of every previously processed event and
//! must only ever happen as an explicit breaking change.

use config::shared::StreamType;
use serde::Serialize;

use crate::catalog::{CatalogArray, ParameterSpec};
use crate::generate::consolidation::consolidate;
use crate::generate::record::EventRecord;
use crate::resolve::EffectiveConfig;
use crate::sql::quote_literal;

/// Literal placed between key components.
pub const IDENTITY_KEY_SEPARATOR: &str = "|~|";

/// Event columns leading every key, in key order.
const LEADING_COMPONENTS: [(&str, NullHandling); 7] = [
    ("user_id", NullHandling::Coalesce),
    ("session_id", NullHandling::Coalesce),
    ("event_timestamp", NullHandling::Verbatim),
    ("event_name", NullHandling::Verbatim),
    ("event_server_timestamp_offset", NullHandling::Coalesce),
    ("batch_event_index", NullHandling::Coalesce),
    ("event_bundle_sequence_id", NullHandling::Coalesce),
];

/// How a null component value enters the key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NullHandling {
    /// The column is always present and is cast to text as is.
    Verbatim,
    /// A null value contributes an empty string instead of nulling the whole key.
    Coalesce,
}

/// One column of the identity key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KeyComponent {
    pub field: String,
    pub null_handling: NullHandling,
}

impl KeyComponent {
    fn new(field: impl Into<String>, null_handling: NullHandling) -> Self {
        Self {
            field: field.into(),
            null_handling,
        }
    }

    /// Renders the text expression of the component.
    pub fn to_sql(&self) -> String {
        match self.null_handling {
            NullHandling::Verbatim => format!("CAST({} AS STRING)", self.field),
            NullHandling::Coalesce => format!("COALESCE(CAST({} AS STRING), '')", self.field),
        }
    }

    /// Evaluates the component against `record`.
    ///
    /// Returns [`None`] only when a verbatim column is missing, which the warehouse would turn
    /// into a null key.
    pub fn evaluate(&self, record: &EventRecord) -> Option<String> {
        match (record.get(&self.field), self.null_handling) {
            (Some(value), _) => Some(value.to_string()),
            (None, NullHandling::Coalesce) => Some(String::new()),
            (None, NullHandling::Verbatim) => None,
        }
    }
}

/// The ordered components of an identity key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IdentityKey {
    components: Vec<KeyComponent>,
}

impl IdentityKey {
    pub fn components(&self) -> &[KeyComponent] {
        &self.components
    }

    /// Returns the text expression of every component, in key order.
    pub fn to_sql_components(&self) -> Vec<String> {
        self.components.iter().map(KeyComponent::to_sql).collect()
    }

    /// Renders the separator-joined concatenation. Hashing it is up to the caller.
    pub fn concat_sql(&self) -> String {
        let separator = quote_literal(IDENTITY_KEY_SEPARATOR);
        let parts = self.to_sql_components().join(&format!(", {separator}, "));

        format!("CONCAT({parts})")
    }

    /// Evaluates every component against `record`, in key order.
    pub fn evaluate(&self, record: &EventRecord) -> Option<Vec<String>> {
        self.components
            .iter()
            .map(|component| component.evaluate(record))
            .collect()
    }

    /// Returns the concatenated key of `record`, as the warehouse would compute it.
    pub fn preview(&self, record: &EventRecord) -> Option<String> {
        self.evaluate(record)
            .map(|values| values.join(IDENTITY_KEY_SEPARATOR))
    }
}

/// Builds the identity key of `effective`.
///
/// Components are the leading event columns, then core parameters, then web and app
/// parameters of the covered stream kinds, then custom parameters, each in catalog order.
/// When consolidation is on, the consolidated fields come first among the web and app
/// components and the parameters they merge are left out.
pub fn build_identity_key(effective: &EffectiveConfig) -> IdentityKey {
    let catalog = effective.catalog();
    let stream_type = effective.effective_stream_type();

    let mut components: Vec<KeyComponent> = LEADING_COMPONENTS
        .iter()
        .map(|(field, null_handling)| KeyComponent::new(*field, *null_handling))
        .collect();

    let optional =
        |spec: &ParameterSpec| KeyComponent::new(spec.name.as_str(), NullHandling::Coalesce);

    components.extend(catalog.array(CatalogArray::Core).iter().map(optional));

    let web: &[ParameterSpec] = if stream_type.covers(StreamType::Web) {
        catalog.array(CatalogArray::Web)
    } else {
        &[]
    };
    let app: &[ParameterSpec] = if stream_type.covers(StreamType::App) {
        catalog.array(CatalogArray::App)
    } else {
        &[]
    };

    let consolidated = consolidate(web, app, effective.consolidate());
    components.extend(
        consolidated
            .iter()
            .map(|field| KeyComponent::new(field.name.as_str(), NullHandling::Coalesce)),
    );
    components.extend(
        web.iter()
            .chain(app.iter())
            .filter(|spec| !consolidated.iter().any(|field| field.merges(&spec.name)))
            .map(optional),
    );

    components.extend(catalog.array(CatalogArray::Custom).iter().map(optional));

    IdentityKey { components }
}

/// Returns the text expression of every key component, in key order.
pub fn build_key_components(effective: &EffectiveConfig) -> Vec<String> {
    build_identity_key(effective).to_sql_components()
}
