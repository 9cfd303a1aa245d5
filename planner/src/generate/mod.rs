//! Per-event projection: field extraction, web/app consolidation and the identity key.

pub mod consolidation;
pub mod extraction;
pub mod identity;
pub mod record;

pub use consolidation::{ConsolidatedField, consolidate};
pub use extraction::{FieldExpression, extract, extract_array, extract_specs};
pub use identity::{
    IDENTITY_KEY_SEPARATOR, IdentityKey, KeyComponent, NullHandling, build_identity_key,
    build_key_components,
};
pub use record::{EventRecord, FieldValue};
