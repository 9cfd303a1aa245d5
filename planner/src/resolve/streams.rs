use config::shared::{PropertyConfig, StreamSelection, StreamType};
use serde::Serialize;
use tracing::{debug, warn};

use crate::bail;
use crate::error::{ErrorKind, PlannerResult};
use crate::resolve::effective::StreamRef;
use crate::sql::quote_literal;

/// Column holding the stream identifier of each exported event.
pub const STREAM_ID_COLUMN: &str = "stream_id";

/// Streams enumerated from a properties tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamResolution {
    /// Every declared stream, included or not, in declaration order.
    pub streams: Vec<StreamRef>,
    /// The streams not explicitly excluded.
    pub included_streams: Vec<StreamRef>,
    pub effective_type: StreamSelection,
}

/// Enumerates the streams of `properties`.
///
/// A stream inherits `source_dataset` and `use_fresh_daily` from its property when it does
/// not set them, and the property inherits `use_fresh_daily` from `default_use_fresh_daily`.
/// The effective type is `both` when web and app streams are both included, the single kind
/// when only one is, and `both` when no stream is included at all. Callers must treat an
/// empty inclusion set as nothing to generate.
pub fn resolve_streams<'a, I>(properties: I, default_use_fresh_daily: bool) -> StreamResolution
where
    I: IntoIterator<Item = &'a PropertyConfig>,
{
    let mut streams = Vec::new();

    for property in properties {
        let property_fresh_daily = property.use_fresh_daily.unwrap_or(default_use_fresh_daily);

        for stream in &property.streams {
            streams.push(StreamRef {
                property_name: property.name.clone(),
                stream_id: stream.stream_id.clone(),
                stream_type: stream.stream_type,
                source_dataset: stream
                    .source_dataset
                    .clone()
                    .unwrap_or_else(|| property.source_dataset.clone()),
                use_fresh_daily: stream.use_fresh_daily.unwrap_or(property_fresh_daily),
                include: stream.include,
            });
        }
    }

    let included_streams: Vec<StreamRef> = streams
        .iter()
        .filter(|stream| stream.include)
        .cloned()
        .collect();

    let has_web = included_streams
        .iter()
        .any(|stream| stream.stream_type == StreamType::Web);
    let has_app = included_streams
        .iter()
        .any(|stream| stream.stream_type == StreamType::App);

    let effective_type = match (has_web, has_app) {
        (true, false) => StreamSelection::Web,
        (false, true) => StreamSelection::App,
        (true, true) => StreamSelection::Both,
        (false, false) => {
            warn!(
                declared_streams = streams.len(),
                "no stream is included, falling back to effective stream type `both`"
            );
            StreamSelection::Both
        }
    };

    debug!(
        declared_streams = streams.len(),
        included_streams = included_streams.len(),
        %effective_type,
        "resolved streams"
    );

    StreamResolution {
        streams,
        included_streams,
        effective_type,
    }
}

/// Row filter keeping the events of a property's included streams.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StreamPredicate {
    pub property_name: String,
    pub included_stream_ids: Vec<String>,
    pub excluded_stream_ids: Vec<String>,
}

impl StreamPredicate {
    /// Returns `true` if rows of `stream_id` are kept.
    pub fn matches(&self, stream_id: &str) -> bool {
        self.included_stream_ids.iter().any(|id| id == stream_id)
    }

    /// Renders the filter as a boolean expression over `column`.
    ///
    /// A property without any included stream renders `FALSE`.
    pub fn to_sql(&self, column: &str) -> String {
        if self.included_stream_ids.is_empty() {
            return "FALSE".to_owned();
        }

        let ids = self
            .included_stream_ids
            .iter()
            .map(|id| quote_literal(id))
            .collect::<Vec<_>>()
            .join(", ");

        format!("{column} IN ({ids})")
    }
}

/// Builds the stream filter of `property_name`.
pub fn inclusion_predicate(
    properties: &[PropertyConfig],
    property_name: &str,
) -> PlannerResult<StreamPredicate> {
    let Some(property) = properties
        .iter()
        .find(|property| property.name == property_name)
    else {
        bail!(
            ErrorKind::UnknownProperty,
            "Property is not declared",
            format!("property `{property_name}` is not declared in `properties`")
        );
    };

    let (included, excluded): (Vec<_>, Vec<_>) =
        property.streams.iter().partition(|stream| stream.include);

    Ok(StreamPredicate {
        property_name: property.name.clone(),
        included_stream_ids: included
            .into_iter()
            .map(|stream| stream.stream_id.clone())
            .collect(),
        excluded_stream_ids: excluded
            .into_iter()
            .map(|stream| stream.stream_id.clone())
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use config::shared::StreamConfig;

    use super::*;

    fn stream(stream_id: &str, stream_type: StreamType, include: bool) -> StreamConfig {
        StreamConfig {
            stream_id: stream_id.to_owned(),
            stream_type,
            source_dataset: None,
            use_fresh_daily: None,
            include,
        }
    }

    fn property(name: &str, streams: Vec<StreamConfig>) -> PropertyConfig {
        PropertyConfig {
            name: name.to_owned(),
            source_dataset: format!("acme.analytics_{name}"),
            use_fresh_daily: None,
            streams,
            overrides: None,
        }
    }

    #[test]
    fn test_web_and_app_streams_resolve_to_both() {
        let properties = vec![
            property("shop", vec![stream("1", StreamType::Web, true)]),
            property("mobile", vec![stream("2", StreamType::App, true)]),
        ];

        let resolution = resolve_streams(&properties, false);

        assert_eq!(resolution.effective_type, StreamSelection::Both);
        assert_eq!(resolution.included_streams.len(), 2);
    }

    #[test]
    fn test_excluded_streams_do_not_count() {
        let properties = vec![property(
            "shop",
            vec![
                stream("1", StreamType::Web, true),
                stream("2", StreamType::App, false),
            ],
        )];

        let resolution = resolve_streams(&properties, false);

        assert_eq!(resolution.effective_type, StreamSelection::Web);
        assert_eq!(resolution.streams.len(), 2);
        assert_eq!(resolution.included_streams.len(), 1);
        assert_eq!(resolution.included_streams[0].stream_id, "1");
    }

    #[test]
    fn test_no_included_stream_falls_back_to_both() {
        let properties = vec![property("shop", vec![stream("1", StreamType::App, false)])];

        let resolution = resolve_streams(&properties, false);

        assert!(resolution.included_streams.is_empty());
        assert_eq!(resolution.effective_type, StreamSelection::Both);
    }

    #[test]
    fn test_streams_inherit_property_settings() {
        let mut shop = property(
            "shop",
            vec![
                stream("1", StreamType::Web, true),
                StreamConfig {
                    source_dataset: Some("acme.analytics_other".to_owned()),
                    use_fresh_daily: Some(false),
                    ..stream("2", StreamType::App, true)
                },
            ],
        );
        shop.use_fresh_daily = Some(true);

        let resolution = resolve_streams([&shop], false);

        assert_eq!(resolution.streams[0].source_dataset, "acme.analytics_shop");
        assert!(resolution.streams[0].use_fresh_daily);
        assert_eq!(resolution.streams[1].source_dataset, "acme.analytics_other");
        assert!(!resolution.streams[1].use_fresh_daily);
    }

    #[test]
    fn test_inclusion_predicate() {
        let properties = vec![property(
            "shop",
            vec![
                stream("1", StreamType::Web, true),
                stream("2", StreamType::App, false),
                stream("3", StreamType::App, true),
            ],
        )];

        let predicate = inclusion_predicate(&properties, "shop").unwrap();

        assert!(predicate.matches("1"));
        assert!(!predicate.matches("2"));
        assert_eq!(predicate.excluded_stream_ids, vec!["2".to_owned()]);
        assert_eq!(predicate.to_sql(STREAM_ID_COLUMN), "stream_id IN ('1', '3')");
    }

    #[test]
    fn test_inclusion_predicate_without_streams_is_false() {
        let properties = vec![property("shop", vec![stream("1", StreamType::Web, false)])];

        let predicate = inclusion_predicate(&properties, "shop").unwrap();

        assert_eq!(predicate.to_sql(STREAM_ID_COLUMN), "FALSE");
    }

    #[test]
    fn test_unknown_property_is_a_configuration_error() {
        let properties = vec![property("shop", vec![])];

        let err = inclusion_predicate(&properties, "blog").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnknownProperty);
        assert!(err.detail().unwrap().contains("`blog`"));
    }
}
