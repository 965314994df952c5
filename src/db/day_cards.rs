use crate::db::DbPool;
use crate::errors::{Error, Result};
use crate::models::{DayCard, Symptom};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info, instrument};

const DAY_CARD_COLUMNS: &str = "id, date, year, month, day, notes, image_record_id";

pub(crate) fn map_day_card_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DayCard> {
    Ok(DayCard {
        id: row.get(0)?,
        date: row.get(1)?,
        year: row.get(2)?,
        month: row.get(3)?,
        day: row.get(4)?,
        notes: row.get(5)?,
        image_record_id: row.get(6)?,
        symptom_ids: Vec::new(), // Filled from the containment table by the caller
    })
}

pub(crate) fn load_symptom_ids(conn: &Connection, day_card_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT symptom_id FROM day_card_symptoms WHERE day_card_id = ?1 ORDER BY position",
    )?;
    let ids = stmt
        .query_map(params![day_card_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(ids)
}

pub(crate) fn upsert_symptom_row(conn: &Connection, symptom: &Symptom) -> Result<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO symptoms (id, name, severity, notes, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            severity = excluded.severity,
            notes = excluded.notes,
            recorded_at = excluded.recorded_at",
    )?;
    stmt.execute(params![
        symptom.id,
        symptom.name,
        symptom.severity,
        symptom.notes,
        symptom.recorded_at,
    ])?;
    Ok(())
}

/// Point lookup of the card for one calendar date.
///
/// Returns `Ok(None)` when no card exists yet; cards are only created once a
/// symptom or note is first saved for the date.
#[instrument(skip(pool))]
pub async fn get_day_card_for_date(
    pool: &DbPool,
    year: i32,
    month: u32,
    day: u32,
) -> Result<Option<DayCard>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::InvalidState("Store handle no longer available".to_string()))?;
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {DAY_CARD_COLUMNS} FROM day_cards WHERE year = ?1 AND month = ?2 AND day = ?3"
    ))?;
    let card = stmt
        .query_row(params![year, month, day], map_day_card_row)
        .optional()?;

    match card {
        Some(mut card) => {
            card.symptom_ids = load_symptom_ids(&conn, &card.id)?;
            Ok(Some(card))
        }
        None => Ok(None),
    }
}

/// Range query for a calendar month, ordered by day of month.
#[instrument(skip(pool))]
pub async fn get_day_cards(pool: &DbPool, year: i32, month: u32) -> Result<Vec<DayCard>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::InvalidState("Store handle no longer available".to_string()))?;
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {DAY_CARD_COLUMNS} FROM day_cards WHERE year = ?1 AND month = ?2 ORDER BY day"
    ))?;
    let mut cards = stmt
        .query_map(params![year, month], map_day_card_row)?
        .collect::<rusqlite::Result<Vec<DayCard>>>()?;

    for card in &mut cards {
        card.symptom_ids = load_symptom_ids(&conn, &card.id)?;
    }
    debug!("Fetched {} day cards for {}-{:02}", cards.len(), year, month);
    Ok(cards)
}

/// Upserts a card by id.
///
/// Scalar fields only (date components, notes, attached image); the symptom
/// collection is maintained through [`add_symptom`] and the symptom
/// repository. Callers are expected to have done a lookup-before-create for
/// the date - uniqueness per calendar date is logical, not a constraint.
#[instrument(skip(pool, card))]
pub async fn save_day_card(pool: &DbPool, card: &DayCard) -> Result<()> {
    let conn = pool
        .lock()
        .map_err(|_| Error::InvalidState("Store handle no longer available".to_string()))?;
    conn.execute(
        "INSERT INTO day_cards (id, date, year, month, day, notes, image_record_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
            date = excluded.date,
            year = excluded.year,
            month = excluded.month,
            day = excluded.day,
            notes = excluded.notes,
            image_record_id = excluded.image_record_id",
        params![
            card.id,
            card.date,
            card.year,
            card.month,
            card.day,
            card.notes,
            card.image_record_id,
        ],
    )
    .map_err(|e| Error::Storage(format!("Failed to save day card {}: {}", card.id, e)))?;
    info!(
        "Saved day card {} for {}-{:02}-{:02}",
        card.id, card.year, card.month, card.day
    );
    Ok(())
}

/// Appends a symptom to a card's collection.
///
/// The symptom row upsert and the containment link are one transaction, so
/// a symptom can never exist without an owning card.
#[instrument(skip(pool, symptom))]
pub async fn add_symptom(pool: &DbPool, symptom: &Symptom, day_card_id: &str) -> Result<()> {
    let mut conn = pool
        .lock()
        .map_err(|_| Error::InvalidState("Store handle no longer available".to_string()))?;
    let tx = conn
        .transaction()
        .map_err(|e| Error::Storage(format!("Failed to start transaction: {}", e)))?;

    upsert_symptom_row(&tx, symptom)?;
    tx.execute(
        "INSERT INTO day_card_symptoms (day_card_id, symptom_id, position)
         VALUES (?1, ?2,
            (SELECT COALESCE(MAX(position) + 1, 0) FROM day_card_symptoms WHERE day_card_id = ?1))
         ON CONFLICT(day_card_id, symptom_id) DO NOTHING",
        params![day_card_id, symptom.id],
    )?;

    tx.commit().map_err(|e| {
        Error::Storage(format!(
            "Failed to commit symptom append for card {}: {}",
            day_card_id, e
        ))
    })?;
    info!("Appended symptom {} to day card {}", symptom.id, day_card_id);
    Ok(())
}

/// Day-of-month values in `(year, month)` whose card has at least one
/// symptom, for calendar-dot rendering.
#[instrument(skip(pool))]
pub async fn get_days_with_symptoms(pool: &DbPool, year: i32, month: u32) -> Result<Vec<u32>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::InvalidState("Store handle no longer available".to_string()))?;
    let mut stmt = conn.prepare_cached(
        "SELECT DISTINCT dc.day FROM day_cards dc
         JOIN day_card_symptoms dcs ON dcs.day_card_id = dc.id
         WHERE dc.year = ?1 AND dc.month = ?2
         ORDER BY dc.day",
    )?;
    let days = stmt
        .query_map(params![year, month], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<u32>>>()?;
    debug!(
        "Found {} days with symptoms in {}-{:02}",
        days.len(),
        year,
        month
    );
    Ok(days)
}
