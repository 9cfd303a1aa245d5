use chrono::NaiveDate;
use config::shared::{ConfigLayer, StreamSelection};
use insta::assert_json_snapshot;
use planner::error::ErrorKind;
use planner::generate::{EventRecord, build_identity_key, extract};
use planner::generation::{RunContext, generate};
use planner::refresh::SourceKind;
use planner::resolve::{LayeredConfig, resolve};
use telemetry::tracing::init_test_tracing;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

fn client(document: &str) -> ConfigLayer {
    let layer: ConfigLayer = serde_json::from_str(document).unwrap();
    layer.validate().unwrap();
    layer
}

#[test]
fn simple_mode_document_generates_one_unit() {
    init_test_tracing();

    let layers = LayeredConfig::new(client(
        r#"{
            "stream_type": "both",
            "source_dataset": "acme-analytics.analytics_123456",
            "consolidate_web_app": true,
            "core_params": [
                {"name": "ga_session_number", "type": "int"}
            ],
            "web_params": [
                {"name": "page_location", "consolidated_name": "screen_location"}
            ],
            "app_params": [
                {"name": "firebase_screen", "consolidated_name": "screen_location"}
            ],
            "custom_params": [
                {"name": "cart_value", "type": "float"}
            ],
            "use_fresh_daily": true
        }"#,
    ));

    let units = generate(&layers, &RunContext::new(today())).unwrap();
    assert_eq!(units.len(), 1);
    let unit = &units[0];

    let fields: Vec<_> = unit.event_fields.iter().map(|field| field.to_sql()).collect();
    assert_eq!(
        fields,
        vec![
            "(SELECT value.int_value FROM UNNEST(event_params) WHERE key = 'ga_session_number' LIMIT 1) AS ga_session_number",
            "(SELECT value.string_value FROM UNNEST(event_params) WHERE key = 'page_location' LIMIT 1) AS page_location",
            "(SELECT value.string_value FROM UNNEST(event_params) WHERE key = 'firebase_screen' LIMIT 1) AS firebase_screen",
            "(SELECT value.double_value FROM UNNEST(event_params) WHERE key = 'cart_value' LIMIT 1) AS cart_value",
        ]
    );
    assert_eq!(
        unit.consolidated_fields[0].to_sql(),
        "COALESCE(page_location, firebase_screen) AS screen_location"
    );
    assert_eq!(
        unit.identity_key[7..],
        [
            "COALESCE(CAST(ga_session_number AS STRING), '')",
            "COALESCE(CAST(screen_location AS STRING), '')",
            "COALESCE(CAST(cart_value AS STRING), '')",
        ]
    );

    assert_json_snapshot!(unit.sources, @r#"
    [
      {
        "source_dataset": "acme-analytics.analytics_123456",
        "use_fresh_daily": true,
        "refresh": {
          "mode": "rolling",
          "entries": [
            {
              "day": "2025-03-08",
              "in_scope": true,
              "source_kind": "fresh"
            },
            {
              "day": "2025-03-09",
              "in_scope": true,
              "source_kind": "fresh"
            },
            {
              "day": "2025-03-10",
              "in_scope": true,
              "source_kind": "finalized"
            }
          ]
        },
        "shards": [
          "acme-analytics.analytics_123456.events_fresh_20250308",
          "acme-analytics.analytics_123456.events_fresh_20250309",
          "acme-analytics.analytics_123456.events_20250310"
        ]
      }
    ]
    "#);
}

#[test]
fn advanced_mode_document_generates_a_unit_per_property() {
    init_test_tracing();

    let layers = LayeredConfig::new(client(
        r#"{
            "consolidate_web_app": true,
            "properties": [
                {
                    "name": "shop",
                    "source_dataset": "acme-analytics.analytics_111",
                    "streams": [
                        {"stream_id": "1001", "stream_type": "web"},
                        {"stream_id": "1002", "stream_type": "app"},
                        {"stream_id": "1003", "stream_type": "web", "include": false}
                    ]
                },
                {
                    "name": "blog",
                    "source_dataset": "acme-analytics.analytics_222",
                    "streams": [
                        {"stream_id": "2001", "stream_type": "web"}
                    ],
                    "overrides": {
                        "rolling_window_days": 1,
                        "destination_dataset": "blog_marts"
                    }
                }
            ]
        }"#,
    ));

    let units = generate(&layers, &RunContext::new(today())).unwrap();
    assert_eq!(units.len(), 2);

    let shop = &units[0];
    assert_eq!(shop.property.as_deref(), Some("shop"));
    assert_eq!(shop.effective_stream_type, StreamSelection::Both);
    assert!(shop.consolidate);
    assert_eq!(
        shop.stream_filter.as_deref(),
        Some("stream_id IN ('1001', '1002')")
    );

    let blog = &units[1];
    assert_eq!(blog.effective_stream_type, StreamSelection::Web);
    assert!(!blog.consolidate);
    assert_eq!(blog.destination.dataset.as_deref(), Some("blog_marts"));
    assert_eq!(
        blog.sources[0].shards,
        vec!["acme-analytics.analytics_222.events_20250310".to_owned()]
    );
}

#[test]
fn backfill_override_reads_finalized_shards_only() {
    init_test_tracing();

    let client = client(
        r#"{
            "stream_type": "web",
            "source_dataset": "acme-analytics.analytics_123456",
            "rolling_window_days": 30,
            "use_fresh_daily": true
        }"#,
    );
    let runtime = ConfigLayer {
        backfill: Some(true),
        backfill_start: Some("20240101".to_owned()),
        backfill_end: Some("20240103".to_owned()),
        ..ConfigLayer::default()
    };
    let layers = LayeredConfig::new(client).with_runtime_overrides(runtime);

    let units = generate(&layers, &RunContext::new(today())).unwrap();

    let refresh = &units[0].sources[0].refresh;
    assert_eq!(refresh.entries().len(), 3);
    assert!(
        refresh
            .entries()
            .iter()
            .all(|entry| entry.in_scope && entry.source_kind == SourceKind::Finalized)
    );
    assert!(!refresh.admits_shard("events_intraday_20240102"));
}

#[test]
fn unsupported_type_fails_before_any_expression() {
    init_test_tracing();

    let client = client(
        r#"{
            "stream_type": "web",
            "source_dataset": "acme-analytics.analytics_123456",
            "custom_params": [
                {"name": "order_total", "type": "currency"}
            ]
        }"#,
    );

    let err = generate(&LayeredConfig::new(client.clone()), &RunContext::new(today()))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedParameterType);
    assert!(err.is_configuration_error());
    let message = err.to_string();
    assert!(message.contains("`order_total`"));
    assert!(message.contains("`custom_params`"));

    let custom_params = client.custom_params.unwrap_or_default();
    assert!(
        extract(
            &custom_params,
            planner::catalog::CatalogArray::Custom,
            "event_params"
        )
        .is_err()
    );
}

#[test]
fn null_parameter_yields_distinct_keys() {
    init_test_tracing();

    let effective = resolve(
        &LayeredConfig::new(client(
            r#"{
                "stream_type": "web",
                "source_dataset": "acme-analytics.analytics_123456",
                "core_params": [],
                "web_params": [{"name": "page_title"}]
            }"#,
        )),
        today(),
    )
    .unwrap();
    let key = build_identity_key(&effective);

    let event = EventRecord::new()
        .with("user_id", "u-1")
        .with("session_id", "s-1")
        .with("event_timestamp", 1_741_564_800_000_000_i64)
        .with("event_name", "page_view");

    let titled = key
        .preview(&event.clone().with("page_title", "Home"))
        .unwrap();
    let untitled = key.preview(&event).unwrap();

    assert_eq!(titled, "u-1|~|s-1|~|1741564800000000|~|page_view|~||~||~||~|Home");
    assert_eq!(untitled, "u-1|~|s-1|~|1741564800000000|~|page_view|~||~||~||~|");
}

#[test]
fn colliding_projection_names_fail_the_pass() {
    init_test_tracing();

    let client = client(
        r#"{
            "stream_type": "both",
            "source_dataset": "acme-analytics.analytics_123456",
            "consolidate_web_app": true,
            "core_params": [
                {"name": "content_type"},
                {"name": "ga_session_number", "type": "int"}
            ],
            "web_params": [
                {"name": "content_type"},
                {"name": "page_location", "consolidated_name": "ga_session_number"}
            ],
            "app_params": [{"name": "content_type"}]
        }"#,
    );

    let err = generate(&LayeredConfig::new(client), &RunContext::new(today())).unwrap_err();

    assert!(err.is_configuration_error());
    assert_eq!(
        err.kinds(),
        vec![ErrorKind::DuplicateParameterName; 3]
    );
    let message = err.to_string();
    assert!(message.contains("`content_type`"));
    assert!(message.contains("consolidated name `ga_session_number`"));
}
