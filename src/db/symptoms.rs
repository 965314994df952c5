use crate::db::DbPool;
use crate::db::day_cards::{
    add_symptom, get_day_card_for_date, get_days_with_symptoms, save_day_card, upsert_symptom_row,
};
use crate::errors::{Error, Result};
use crate::models::{DayCard, Symptom};
use crate::notifications::{DayCardUpdate, NotificationBus};
use chrono::{Datelike, NaiveDate};
use rusqlite::{Connection, params};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

const SYMPTOM_COLUMNS: &str = "s.id, s.name, s.severity, s.notes, s.recorded_at";

pub(crate) fn map_symptom_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Symptom> {
    Ok(Symptom {
        id: row.get(0)?,
        name: row.get(1)?,
        severity: row.get(2)?,
        notes: row.get(3)?,
        recorded_at: row.get(4)?,
        image_ids: Vec::new(), // Filled from the link table by the caller
    })
}

pub(crate) fn load_image_ids(conn: &Connection, symptom_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT image_id FROM symptom_image_links WHERE symptom_id = ?1 ORDER BY position",
    )?;
    let ids = stmt
        .query_map(params![symptom_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(ids)
}

/// Dates of every card containing `symptom_id` (normally exactly one),
/// resolved through the containment table since symptom rows store no
/// back-pointer.
fn owning_card_dates(conn: &Connection, symptom_id: &str) -> Result<Vec<DayCardUpdate>> {
    let mut stmt = conn.prepare_cached(
        "SELECT dc.year, dc.month, dc.day FROM day_cards dc
         JOIN day_card_symptoms dcs ON dcs.day_card_id = dc.id
         WHERE dcs.symptom_id = ?1",
    )?;
    let dates = stmt
        .query_map(params![symptom_id], |row| {
            Ok(DayCardUpdate {
                year: row.get(0)?,
                month: row.get(1)?,
                day: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<DayCardUpdate>>>()?;
    Ok(dates)
}

/// Saves a symptom for a calendar date, creating the date's card on first
/// use, and publishes a "day card updated" notification on success.
///
/// Card creation and the symptom append are separate transactions; a crash
/// between the two leaves an empty card behind, never an orphaned symptom.
#[instrument(skip(pool, bus, symptom))]
pub async fn save_symptom(
    pool: &DbPool,
    bus: &NotificationBus,
    symptom: &Symptom,
    date: NaiveDate,
) -> Result<Symptom> {
    let (year, month, day) = (date.year(), date.month(), date.day());

    let card = match get_day_card_for_date(pool, year, month, day).await? {
        Some(card) => card,
        None => {
            let card = DayCard::for_date(date);
            debug!("No card for {} yet, creating {}", date, card.id);
            save_day_card(pool, &card).await?;
            card
        }
    };

    add_symptom(pool, symptom, &card.id).await?;
    info!(
        "Saved symptom {} ('{}') for {}-{:02}-{:02}",
        symptom.id, symptom.name, year, month, day
    );

    bus.publish(DayCardUpdate { year, month, day });
    Ok(symptom.clone())
}

/// Symptoms for one calendar date, in card order. Empty when no card exists.
#[instrument(skip(pool))]
pub async fn get_symptoms(pool: &DbPool, year: i32, month: u32, day: u32) -> Result<Vec<Symptom>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::InvalidState("Store handle no longer available".to_string()))?;
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {SYMPTOM_COLUMNS} FROM symptoms s
         JOIN day_card_symptoms dcs ON dcs.symptom_id = s.id
         JOIN day_cards dc ON dc.id = dcs.day_card_id
         WHERE dc.year = ?1 AND dc.month = ?2 AND dc.day = ?3
         ORDER BY dcs.position"
    ))?;
    let mut symptoms = stmt
        .query_map(params![year, month, day], map_symptom_row)?
        .collect::<rusqlite::Result<Vec<Symptom>>>()?;

    for symptom in &mut symptoms {
        symptom.image_ids = load_image_ids(&conn, &symptom.id)?;
    }
    Ok(symptoms)
}

pub async fn get_symptoms_for_date(pool: &DbPool, date: NaiveDate) -> Result<Vec<Symptom>> {
    get_symptoms(pool, date.year(), date.month(), date.day()).await
}

/// Month view: day of month -> symptoms, keeping only days whose card has a
/// non-empty collection.
#[instrument(skip(pool))]
pub async fn get_symptoms_by_month(
    pool: &DbPool,
    year: i32,
    month: u32,
) -> Result<BTreeMap<u32, Vec<Symptom>>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::InvalidState("Store handle no longer available".to_string()))?;
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT dc.day, {SYMPTOM_COLUMNS} FROM symptoms s
         JOIN day_card_symptoms dcs ON dcs.symptom_id = s.id
         JOIN day_cards dc ON dc.id = dcs.day_card_id
         WHERE dc.year = ?1 AND dc.month = ?2
         ORDER BY dc.day, dcs.position"
    ))?;
    let rows = stmt
        .query_map(params![year, month], |row| {
            let day: u32 = row.get(0)?;
            let symptom = Symptom {
                id: row.get(1)?,
                name: row.get(2)?,
                severity: row.get(3)?,
                notes: row.get(4)?,
                recorded_at: row.get(5)?,
                image_ids: Vec::new(),
            };
            Ok((day, symptom))
        })?
        .collect::<rusqlite::Result<Vec<(u32, Symptom)>>>()?;

    let mut by_day: BTreeMap<u32, Vec<Symptom>> = BTreeMap::new();
    for (day, mut symptom) in rows {
        symptom.image_ids = load_image_ids(&conn, &symptom.id)?;
        by_day.entry(day).or_default().push(symptom);
    }
    debug!(
        "Collected symptoms for {} day(s) in {}-{:02}",
        by_day.len(),
        year,
        month
    );
    Ok(by_day)
}

/// Day-of-month values with at least one symptom; delegates to the day-card
/// repository's calendar-dot query.
pub async fn get_symptom_days(pool: &DbPool, year: i32, month: u32) -> Result<Vec<u32>> {
    get_days_with_symptoms(pool, year, month).await
}

/// Deletes a symptom: removes it from every owning card's collection and
/// deletes the row, all in one transaction. Owning dates are captured before
/// mutation so the correct notifications go out after commit.
#[instrument(skip(pool, bus, symptom))]
pub async fn delete_symptom(pool: &DbPool, bus: &NotificationBus, symptom: &Symptom) -> Result<()> {
    let dates = {
        let mut conn = pool
            .lock()
            .map_err(|_| Error::InvalidState("Store handle no longer available".to_string()))?;

        let exists: bool = {
            let mut stmt = conn.prepare_cached("SELECT 1 FROM symptoms WHERE id = ?1")?;
            stmt.exists(params![symptom.id])?
        };
        if !exists {
            return Err(Error::NotFound(format!(
                "Symptom {} does not exist",
                symptom.id
            )));
        }

        let dates = owning_card_dates(&conn, &symptom.id)?;

        let tx = conn
            .transaction()
            .map_err(|e| Error::Storage(format!("Failed to start transaction: {}", e)))?;
        tx.execute(
            "DELETE FROM day_card_symptoms WHERE symptom_id = ?1",
            params![symptom.id],
        )?;
        tx.execute(
            "DELETE FROM symptom_image_links WHERE symptom_id = ?1",
            params![symptom.id],
        )?;
        tx.execute("DELETE FROM symptoms WHERE id = ?1", params![symptom.id])?;
        tx.commit().map_err(|e| {
            Error::Storage(format!(
                "Failed to commit delete of symptom {}: {}",
                symptom.id, e
            ))
        })?;

        dates
    };

    info!(
        "Deleted symptom {} from {} owning card(s)",
        symptom.id,
        dates.len()
    );
    for date in dates {
        bus.publish(date);
    }
    Ok(())
}

/// Upserts a symptom by id without changing its ownership; the owning card
/// is re-resolved purely so the right date gets notified.
#[instrument(skip(pool, bus, symptom))]
pub async fn update_symptom(
    pool: &DbPool,
    bus: &NotificationBus,
    symptom: &Symptom,
) -> Result<Symptom> {
    let dates = {
        let conn = pool
            .lock()
            .map_err(|_| Error::InvalidState("Store handle no longer available".to_string()))?;
        upsert_symptom_row(&conn, symptom)?;
        owning_card_dates(&conn, &symptom.id)?
    };

    info!("Updated symptom {} ('{}')", symptom.id, symptom.name);
    for date in dates {
        bus.publish(date);
    }
    Ok(symptom.clone())
}
