use config::shared::ConfigLayer;

/// Stacks `over` on top of `base`, field by field.
///
/// A field set in `over` replaces the one in `base` entirely. This includes arrays: a
/// parameter list or properties tree is taken from the most specific layer that sets it and
/// never concatenated with less specific ones.
pub fn overlay(base: ConfigLayer, over: &ConfigLayer) -> ConfigLayer {
    macro_rules! pick {
        ($($field:ident),* $(,)?) => {
            ConfigLayer {
                $($field: over.$field.clone().or(base.$field),)*
            }
        };
    }

    pick!(
        stream_type,
        source_dataset,
        consolidate_web_app,
        properties,
        core_params,
        web_params,
        app_params,
        custom_params,
        user_properties,
        item_params,
        rolling_window_days,
        use_fresh_daily,
        initial_load_days,
        backfill,
        backfill_start,
        backfill_end,
        destination_project,
        destination_dataset,
    )
}

/// Merges layers ordered from least to most specific.
pub fn merge_layers<'a, I>(layers: I) -> ConfigLayer
where
    I: IntoIterator<Item = &'a ConfigLayer>,
{
    layers
        .into_iter()
        .fold(ConfigLayer::default(), |merged, layer| overlay(merged, layer))
}

#[cfg(test)]
mod tests {
    use config::shared::{ParameterDeclaration, StreamSelection};

    use super::*;

    #[test]
    fn test_later_layers_win_per_field() {
        let defaults = ConfigLayer {
            rolling_window_days: Some(3),
            use_fresh_daily: Some(false),
            ..ConfigLayer::default()
        };
        let client = ConfigLayer {
            rolling_window_days: Some(5),
            stream_type: Some(StreamSelection::Web),
            ..ConfigLayer::default()
        };

        let merged = merge_layers([&defaults, &client]);

        assert_eq!(merged.rolling_window_days, Some(5));
        assert_eq!(merged.use_fresh_daily, Some(false));
        assert_eq!(merged.stream_type, Some(StreamSelection::Web));
    }

    #[test]
    fn test_arrays_are_replaced_not_concatenated() {
        let defaults = ConfigLayer {
            core_params: Some(vec![
                ParameterDeclaration::new("page_location", "string"),
                ParameterDeclaration::new("page_title", "string"),
            ]),
            ..ConfigLayer::default()
        };
        let client = ConfigLayer {
            core_params: Some(vec![ParameterDeclaration::new("content_group", "string")]),
            ..ConfigLayer::default()
        };

        let merged = merge_layers([&defaults, &client]);

        assert_eq!(
            merged.core_params,
            Some(vec![ParameterDeclaration::new("content_group", "string")])
        );
    }

    #[test]
    fn test_empty_array_overrides_defaults() {
        let defaults = ConfigLayer {
            custom_params: Some(vec![ParameterDeclaration::new("plan", "string")]),
            ..ConfigLayer::default()
        };
        let client = ConfigLayer {
            custom_params: Some(vec![]),
            ..ConfigLayer::default()
        };

        assert_eq!(merge_layers([&defaults, &client]).custom_params, Some(vec![]));
    }
}
