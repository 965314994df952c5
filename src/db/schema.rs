use crate::errors::{Error, Result};
use rusqlite::Connection;
use tracing::{debug, info, instrument};

#[instrument(skip(conn))]
pub(crate) fn create_tables(conn: &Connection) -> Result<()> {
    debug!("Executing CREATE TABLE statements if tables do not exist.");
    conn.execute_batch(
        "BEGIN;

        CREATE TABLE IF NOT EXISTS image_records (
            id TEXT PRIMARY KEY,
            original_path TEXT,
            thumbnail_path TEXT,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            is_favorite BOOLEAN NOT NULL DEFAULT FALSE
        );

        CREATE TABLE IF NOT EXISTS day_cards (
            id TEXT PRIMARY KEY,
            date TEXT NOT NULL,
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            day INTEGER NOT NULL,
            notes TEXT,
            image_record_id TEXT,
            FOREIGN KEY (image_record_id) REFERENCES image_records (id)
        );

        -- Monthly calendar views range-query on the denormalized components.
        CREATE INDEX IF NOT EXISTS idx_day_cards_year_month
            ON day_cards(year, month);

        CREATE TABLE IF NOT EXISTS symptoms (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            severity INTEGER NOT NULL,
            notes TEXT,
            recorded_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        -- Ordered containment of symptoms in a card. Symptom rows carry no
        -- back-pointer to their card; this table is also the reverse index
        -- for locating the owning card of a symptom id.
        CREATE TABLE IF NOT EXISTS day_card_symptoms (
            day_card_id TEXT NOT NULL,
            symptom_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (day_card_id, symptom_id),
            FOREIGN KEY (day_card_id) REFERENCES day_cards (id),
            FOREIGN KEY (symptom_id) REFERENCES symptoms (id)
        );

        CREATE INDEX IF NOT EXISTS idx_day_card_symptoms_symptom
            ON day_card_symptoms(symptom_id);

        CREATE TABLE IF NOT EXISTS symptom_images (
            id TEXT PRIMARY KEY,
            original_path TEXT,
            thumbnail_path TEXT,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS symptom_image_links (
            symptom_id TEXT NOT NULL,
            image_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (symptom_id, image_id),
            FOREIGN KEY (symptom_id) REFERENCES symptoms (id),
            FOREIGN KEY (image_id) REFERENCES symptom_images (id)
        );

        CREATE TABLE IF NOT EXISTS shared_prefs ( key TEXT PRIMARY KEY, value TEXT );
        COMMIT;",
    )
    .map_err(|e| Error::Storage(format!("Failed to create tables: {}", e)))?;
    info!("Database tables ensured.");
    Ok(())
}
