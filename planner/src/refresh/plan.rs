use std::fmt;

use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::error::{ErrorKind, PlannerResult};
use crate::planner_error;
use crate::refresh::shard::classify_shard;
use crate::resolve::RefreshSettings;

/// Day suffix format of the daily shards.
pub const SHARD_DATE_FORMAT: &str = "%Y%m%d";

/// Source partition a day is read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Low-latency daily export, replaced later by the finalized shard.
    Fresh,
    /// Finalized daily export.
    Finalized,
    /// Streaming intraday export, never read.
    ExcludedIntraday,
}

impl SourceKind {
    /// Returns the table name prefix of the shard family.
    pub fn table_prefix(&self) -> &'static str {
        match self {
            SourceKind::Fresh => "events_fresh_",
            SourceKind::Finalized => "events_",
            SourceKind::ExcludedIntraday => "events_intraday_",
        }
    }

    /// Returns the shard table name holding `day`.
    pub fn shard_name(&self, day: NaiveDate) -> String {
        format!("{}{}", self.table_prefix(), day.format(SHARD_DATE_FORMAT))
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Fresh => f.write_str("fresh"),
            SourceKind::Finalized => f.write_str("finalized"),
            SourceKind::ExcludedIntraday => f.write_str("excluded_intraday"),
        }
    }
}

/// Regime a plan was built under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshMode {
    /// Full reload of an explicit date range.
    Backfill,
    /// First load of a destination that does not exist yet.
    InitialLoad,
    /// Reload of the most recent days.
    Rolling,
}

/// Decision for one calendar day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RefreshPlanEntry {
    pub day: NaiveDate,
    pub in_scope: bool,
    pub source_kind: SourceKind,
}

impl RefreshPlanEntry {
    /// Returns the shard table name the entry reads from.
    pub fn shard_name(&self) -> String {
        self.source_kind.shard_name(self.day)
    }
}

/// Ordered per-day plan of a refresh run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RefreshPlan {
    mode: RefreshMode,
    entries: Vec<RefreshPlanEntry>,
}

impl RefreshPlan {
    pub fn mode(&self) -> RefreshMode {
        self.mode
    }

    /// Entries in ascending day order.
    pub fn entries(&self) -> &[RefreshPlanEntry] {
        &self.entries
    }

    /// Returns `true` when no day is in scope.
    pub fn is_empty(&self) -> bool {
        !self.entries.iter().any(|entry| entry.in_scope)
    }

    /// First and last in-scope day, the range the destination deletes before inserting.
    pub fn delete_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut in_scope = self.entries.iter().filter(|entry| entry.in_scope);
        let first = in_scope.next()?;
        let last = in_scope.last().unwrap_or(first);

        Some((first.day, last.day))
    }

    /// Fully qualified shard tables read from `dataset`, in day order.
    pub fn source_shards(&self, dataset: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.in_scope)
            .map(|entry| format!("{dataset}.{}", entry.shard_name()))
            .collect()
    }

    /// Classifies a shard table name against the plan.
    ///
    /// Returns [`None`] for tables that are not daily event shards. Intraday shards and shards
    /// of a day or source kind the plan does not read are returned out of scope.
    pub fn entry_for_shard(&self, table_name: &str) -> Option<RefreshPlanEntry> {
        let shard = classify_shard(table_name)?;

        let in_scope = shard.source_kind != SourceKind::ExcludedIntraday
            && self.entries.iter().any(|entry| {
                entry.in_scope && entry.day == shard.day && entry.source_kind == shard.source_kind
            });

        Some(RefreshPlanEntry {
            day: shard.day,
            in_scope,
            source_kind: shard.source_kind,
        })
    }

    /// Returns `true` if the plan reads `table_name`.
    pub fn admits_shard(&self, table_name: &str) -> bool {
        self.entry_for_shard(table_name)
            .is_some_and(|entry| entry.in_scope)
    }
}

/// Plans the days to rematerialize.
///
/// An active backfill wins and reads every day of its range from finalized shards. Otherwise,
/// when the destination does not exist yet (`initial_load`), the most recent
/// `initial_load_days` days are planned, and in every other case the most recent
/// `rolling_window_days` days ending at `today`. In those two regimes `today` is read from the
/// finalized shard and earlier days from the fresh shard when `use_fresh_daily` is set.
///
/// Bounds are validated before any entry is produced.
pub fn plan(
    today: NaiveDate,
    settings: &RefreshSettings,
    initial_load: bool,
) -> PlannerResult<RefreshPlan> {
    settings.validate()?;

    let plan = if settings.backfill.active {
        let entries = settings
            .backfill
            .start
            .iter_days()
            .take_while(|day| *day <= settings.backfill.end)
            .map(|day| RefreshPlanEntry {
                day,
                in_scope: true,
                source_kind: SourceKind::Finalized,
            })
            .collect();

        RefreshPlan {
            mode: RefreshMode::Backfill,
            entries,
        }
    } else if initial_load {
        RefreshPlan {
            mode: RefreshMode::InitialLoad,
            entries: trailing_window(today, settings.initial_load_days, settings.use_fresh_daily)?,
        }
    } else {
        RefreshPlan {
            mode: RefreshMode::Rolling,
            entries: trailing_window(today, settings.rolling_window_days, settings.use_fresh_daily)?,
        }
    };

    debug!(
        mode = ?plan.mode,
        days = plan.entries.len(),
        range = ?plan.delete_range(),
        use_fresh_daily = settings.use_fresh_daily,
        "planned refresh"
    );

    Ok(plan)
}

/// The `days` most recent days ending at `today`, oldest first.
fn trailing_window(
    today: NaiveDate,
    days: u32,
    use_fresh_daily: bool,
) -> PlannerResult<Vec<RefreshPlanEntry>> {
    let first = today
        .checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
        .ok_or_else(|| {
            planner_error!(
                ErrorKind::InvalidRefreshWindow,
                "Refresh window starts before the supported date range",
                format!("a window of {days} days cannot end at {today}")
            )
        })?;

    Ok(first
        .iter_days()
        .take_while(|day| *day <= today)
        .map(|day| RefreshPlanEntry {
            day,
            in_scope: true,
            source_kind: if day < today && use_fresh_daily {
                SourceKind::Fresh
            } else {
                SourceKind::Finalized
            },
        })
        .collect())
}
