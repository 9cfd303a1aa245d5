use thiserror::Error;

/// Structural configuration errors detectable from a single document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A property was declared without a name.
    #[error("`properties[].name` cannot be empty")]
    EmptyPropertyName,
    /// Two properties share a name.
    #[error("property `{0}` is declared more than once")]
    DuplicatePropertyName(String),
    /// A stream was declared without an id.
    #[error("property `{property}` declares a stream with an empty `stream_id`")]
    EmptyStreamId { property: String },
    /// Two streams of the same property share an id.
    #[error("property `{property}` declares stream `{stream_id}` more than once")]
    DuplicateStreamId { property: String, stream_id: String },
    /// A per-property override layer tried to declare its own properties tree.
    #[error("overrides of property `{property}` cannot declare `properties`")]
    NestedProperties { property: String },
    /// A field holds a value outside its allowed range.
    #[error("invalid value for `{field}`: {constraint}")]
    InvalidFieldValue { field: String, constraint: String },
}
