use crate::db::{self, DbPool};
use crate::errors::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Fixed shared-prefs key the home-screen widget process reads.
pub const SCHEDULE_SNAPSHOT_KEY: &str = "widget.upcoming_schedules";

/// One upcoming schedule line shown on the widget.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    /// Optional "HH:MM" display time.
    #[serde(default)]
    pub time: Option<String>,
}

/// Replaces the widget's schedule snapshot with a JSON-encoded entry list.
///
/// The snapshot is a read-only, eventually-consistent view for the widget
/// process; it is not transactional with the rest of the store.
#[instrument(skip(pool, entries))]
pub async fn write_schedule_snapshot(pool: &DbPool, entries: &[ScheduleEntry]) -> Result<()> {
    let encoded = serde_json::to_string(entries)?;
    db::shared_prefs::set_value(pool, SCHEDULE_SNAPSHOT_KEY, &encoded).await?;
    debug!("Wrote widget snapshot with {} entries", entries.len());
    Ok(())
}

/// Reads the current schedule snapshot; an absent key is an empty list.
#[instrument(skip(pool))]
pub async fn read_schedule_snapshot(pool: &DbPool) -> Result<Vec<ScheduleEntry>> {
    match db::shared_prefs::get_value(pool, SCHEDULE_SNAPSHOT_KEY).await? {
        Some(encoded) => Ok(serde_json::from_str(&encoded)?),
        None => Ok(Vec::new()),
    }
}
