use chrono::NaiveDate;

use crate::refresh::plan::{SHARD_DATE_FORMAT, SourceKind};

/// A daily event shard identified from its table name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShardRef {
    pub day: NaiveDate,
    pub source_kind: SourceKind,
}

/// Prefixes sharing `events_` must be matched before the bare finalized one.
const SHARD_FAMILIES: [SourceKind; 3] = [
    SourceKind::ExcludedIntraday,
    SourceKind::Fresh,
    SourceKind::Finalized,
];

/// Identifies a daily event shard from a table name, optionally dataset qualified.
///
/// Returns [`None`] for tables outside the three shard families or without a valid
/// `YYYYMMDD` suffix.
pub fn classify_shard(table_name: &str) -> Option<ShardRef> {
    let table = table_name.rsplit('.').next().unwrap_or(table_name);

    SHARD_FAMILIES.into_iter().find_map(|source_kind| {
        let suffix = table.strip_prefix(source_kind.table_prefix())?;
        if suffix.len() != 8 || !suffix.bytes().all(|byte| byte.is_ascii_digit()) {
            return None;
        }

        let day = NaiveDate::parse_from_str(suffix, SHARD_DATE_FORMAT).ok()?;

        Some(ShardRef { day, source_kind })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::date;

    #[test]
    fn test_shard_families() {
        assert_eq!(
            classify_shard("events_20250310"),
            Some(ShardRef {
                day: date(2025, 3, 10),
                source_kind: SourceKind::Finalized,
            })
        );
        assert_eq!(
            classify_shard("acme.analytics_1.events_fresh_20250310").map(|shard| shard.source_kind),
            Some(SourceKind::Fresh)
        );
        assert_eq!(
            classify_shard("events_intraday_20250310").map(|shard| shard.source_kind),
            Some(SourceKind::ExcludedIntraday)
        );
    }

    #[test]
    fn test_non_shard_tables_are_ignored() {
        for table in [
            "events_2025031",
            "events_20251301",
            "events_+2025031",
            "events_latest",
            "users_20250310",
            "events_fresh_",
        ] {
            assert_eq!(classify_shard(table), None, "{table}");
        }
    }
}
