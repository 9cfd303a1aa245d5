//! Framework defaults.
//!
//! Every default the planner applies lives here. Other components receive fully resolved
//! values and never fall back on their own.

use config::shared::{ConfigLayer, ParameterDeclaration};

/// Trailing days reloaded by an incremental run.
pub const DEFAULT_ROLLING_WINDOW_DAYS: i64 = 3;

/// Trailing days loaded when the destination table does not exist yet.
pub const DEFAULT_INITIAL_LOAD_DAYS: i64 = 7;

/// Months before today a backfill starts at when no start is given.
pub const DEFAULT_BACKFILL_MONTHS: u32 = 13;

/// Days before today a backfill ends at when no end is given.
pub const DEFAULT_BACKFILL_END_OFFSET_DAYS: u64 = 1;

/// Returns the least specific configuration layer.
///
/// Declares the event parameters every export carries regardless of platform. A client that
/// declares `core_params` replaces this list.
pub fn framework_defaults() -> ConfigLayer {
    ConfigLayer {
        consolidate_web_app: Some(false),
        core_params: Some(vec![
            ParameterDeclaration::new("ga_session_number", "int"),
            ParameterDeclaration::new("engagement_time_msec", "int"),
            ParameterDeclaration::new("session_engaged", "string"),
            ParameterDeclaration::new("entrances", "int"),
        ]),
        web_params: Some(vec![
            ParameterDeclaration::new("page_location", "string"),
            ParameterDeclaration::new("page_referrer", "string"),
            ParameterDeclaration::new("page_title", "string"),
        ]),
        app_params: Some(vec![
            ParameterDeclaration::new("firebase_screen", "string"),
            ParameterDeclaration::new("firebase_screen_class", "string"),
        ]),
        custom_params: Some(vec![]),
        user_properties: Some(vec![]),
        item_params: Some(vec![]),
        rolling_window_days: Some(DEFAULT_ROLLING_WINDOW_DAYS),
        use_fresh_daily: Some(false),
        initial_load_days: Some(DEFAULT_INITIAL_LOAD_DAYS),
        backfill: Some(false),
        ..ConfigLayer::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framework_defaults_are_valid() {
        let defaults = framework_defaults();
        assert!(defaults.validate().is_ok());
        assert!(defaults.properties.is_none());
        assert!(defaults.stream_type.is_none());
    }
}
