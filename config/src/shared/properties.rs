use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::shared::{ConfigLayer, ValidationError};

/// Platform a single data stream collects events from.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum StreamType {
    Web,
    App,
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamType::Web => f.write_str("web"),
            StreamType::App => f.write_str("app"),
        }
    }
}

/// Which stream kinds a generation run covers.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StreamSelection {
    Web,
    App,
    Both,
}

impl StreamSelection {
    /// Returns `true` if streams of `stream_type` are covered.
    pub fn covers(&self, stream_type: StreamType) -> bool {
        match self {
            StreamSelection::Both => true,
            StreamSelection::Web => stream_type == StreamType::Web,
            StreamSelection::App => stream_type == StreamType::App,
        }
    }
}

impl From<StreamType> for StreamSelection {
    fn from(value: StreamType) -> Self {
        match value {
            StreamType::Web => StreamSelection::Web,
            StreamType::App => StreamSelection::App,
        }
    }
}

impl fmt::Display for StreamSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamSelection::Web => f.write_str("web"),
            StreamSelection::App => f.write_str("app"),
            StreamSelection::Both => f.write_str("both"),
        }
    }
}

const fn default_stream_include() -> bool {
    true
}

/// A data stream inside a property.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct StreamConfig {
    /// Identifier the export writes into each event's `stream_id` column.
    pub stream_id: String,
    /// Platform of the stream.
    pub stream_type: StreamType,
    /// Export dataset for this stream, when it differs from the property's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_dataset: Option<String>,
    /// Whether the stream has a fresh daily export. Inherits the property setting when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_fresh_daily: Option<bool>,
    /// Streams are included unless explicitly switched off.
    #[serde(default = "default_stream_include")]
    pub include: bool,
}

/// An analytics property and the streams it owns.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct PropertyConfig {
    /// Unique property name used to address the property from overrides and filters.
    pub name: String,
    /// Export dataset (`project.dataset`) holding the property's daily shards.
    pub source_dataset: String,
    /// Default fresh daily export flag for the property's streams.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_fresh_daily: Option<bool>,
    #[serde(default)]
    pub streams: Vec<StreamConfig>,
    /// Settings that apply only when generating for this property.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<ConfigLayer>,
}

impl PropertyConfig {
    /// Checks names and stream ids of the property.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyPropertyName);
        }

        let mut seen = HashSet::with_capacity(self.streams.len());
        for stream in &self.streams {
            if stream.stream_id.trim().is_empty() {
                return Err(ValidationError::EmptyStreamId {
                    property: self.name.clone(),
                });
            }

            if !seen.insert(stream.stream_id.as_str()) {
                return Err(ValidationError::DuplicateStreamId {
                    property: self.name.clone(),
                    stream_id: stream.stream_id.clone(),
                });
            }
        }

        if let Some(overrides) = &self.overrides
            && overrides.properties.is_some()
        {
            return Err(ValidationError::NestedProperties {
                property: self.name.clone(),
            });
        }

        Ok(())
    }
}
