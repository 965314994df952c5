use crate::db::DbPool;
use crate::errors::{Error, Result};
use crate::images::ImageFileManager;
use crate::models::ImageRecord;
use rusqlite::{OptionalExtension, params};
use tracing::{debug, info, instrument};

const IMAGE_RECORD_COLUMNS: &str = "id, original_path, thumbnail_path, created_at, is_favorite";

fn map_image_record_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ImageRecord> {
    Ok(ImageRecord {
        id: row.get(0)?,
        original_path: row.get(1)?,
        thumbnail_path: row.get(2)?,
        created_at: row.get(3)?,
        is_favorite: row.get(4)?,
    })
}

/// Upserts an image record by id.
#[instrument(skip(pool, record))]
pub async fn save_image_record(pool: &DbPool, record: &ImageRecord) -> Result<ImageRecord> {
    let conn = pool
        .lock()
        .map_err(|_| Error::InvalidState("Store handle no longer available".to_string()))?;
    conn.execute(
        "INSERT INTO image_records (id, original_path, thumbnail_path, created_at, is_favorite)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
            original_path = excluded.original_path,
            thumbnail_path = excluded.thumbnail_path,
            created_at = excluded.created_at,
            is_favorite = excluded.is_favorite",
        params![
            record.id,
            record.original_path,
            record.thumbnail_path,
            record.created_at,
            record.is_favorite,
        ],
    )
    .map_err(|e| Error::Storage(format!("Failed to save image record {}: {}", record.id, e)))?;
    info!("Saved image record {}", record.id);
    Ok(record.clone())
}

#[instrument(skip(pool))]
pub async fn get_image_record(pool: &DbPool, id: &str) -> Result<Option<ImageRecord>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::InvalidState("Store handle no longer available".to_string()))?;
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {IMAGE_RECORD_COLUMNS} FROM image_records WHERE id = ?1"
    ))?;
    let record = stmt.query_row(params![id], map_image_record_row).optional()?;
    Ok(record)
}

/// All image records, newest first.
#[instrument(skip(pool))]
pub async fn get_all_image_records(pool: &DbPool) -> Result<Vec<ImageRecord>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::InvalidState("Store handle no longer available".to_string()))?;
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {IMAGE_RECORD_COLUMNS} FROM image_records ORDER BY created_at DESC"
    ))?;
    let records = stmt
        .query_map([], map_image_record_row)?
        .collect::<rusqlite::Result<Vec<ImageRecord>>>()?;
    debug!("Fetched {} image records", records.len());
    Ok(records)
}

/// Favorite-flagged image records, newest first.
#[instrument(skip(pool))]
pub async fn get_favorite_image_records(pool: &DbPool) -> Result<Vec<ImageRecord>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::InvalidState("Store handle no longer available".to_string()))?;
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {IMAGE_RECORD_COLUMNS} FROM image_records
         WHERE is_favorite = TRUE ORDER BY created_at DESC"
    ))?;
    let records = stmt
        .query_map([], map_image_record_row)?
        .collect::<rusqlite::Result<Vec<ImageRecord>>>()?;
    Ok(records)
}

/// Flips the favorite flag in place.
#[instrument(skip(pool))]
pub async fn toggle_favorite(pool: &DbPool, id: &str) -> Result<()> {
    let conn = pool
        .lock()
        .map_err(|_| Error::InvalidState("Store handle no longer available".to_string()))?;
    let changed = conn.execute(
        "UPDATE image_records SET is_favorite = NOT is_favorite WHERE id = ?1",
        params![id],
    )?;
    if changed == 0 {
        return Err(Error::NotFound(format!("Image record {} does not exist", id)));
    }
    info!("Toggled favorite flag on image record {}", id);
    Ok(())
}

/// Deletes an image record.
///
/// Any day card pointing at the record has its reference cleared in the same
/// transaction, so no dangling reference survives; the card itself persists.
/// Backing files are removed best-effort after commit from paths captured
/// before the mutation.
#[instrument(skip(pool, images, record))]
pub async fn delete_image_record(
    pool: &DbPool,
    images: &dyn ImageFileManager,
    record: &ImageRecord,
) -> Result<()> {
    // Paths captured up front; the row is gone once the transaction commits.
    let original_path = record.original_path.clone();
    let thumbnail_path = record.thumbnail_path.clone();

    {
        let mut conn = pool
            .lock()
            .map_err(|_| Error::InvalidState("Store handle no longer available".to_string()))?;
        let tx = conn
            .transaction()
            .map_err(|e| Error::Storage(format!("Failed to start transaction: {}", e)))?;

        tx.execute(
            "UPDATE day_cards SET image_record_id = NULL WHERE image_record_id = ?1",
            params![record.id],
        )?;
        let deleted = tx.execute("DELETE FROM image_records WHERE id = ?1", params![record.id])?;
        if deleted == 0 {
            return Err(Error::NotFound(format!(
                "Image record {} does not exist",
                record.id
            )));
        }

        tx.commit().map_err(|e| {
            Error::Storage(format!(
                "Failed to commit delete of image record {}: {}",
                record.id, e
            ))
        })?;
    }

    info!("Deleted image record {}", record.id);
    if let Some(path) = original_path {
        images.delete_image_file(&path, true);
    }
    if let Some(path) = thumbnail_path {
        images.delete_image_file(&path, false);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::day_cards::{get_day_card_for_date, save_day_card};
    use crate::db::test_utils::{RecordingImageManager, init_test_tracing, setup_test_db};
    use crate::errors::Result;
    use crate::models::DayCard;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn save_and_get_round_trip() -> Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;

        let record = ImageRecord::new(Some("/img/a.jpg".into()), Some("/img/a_t.jpg".into()));
        save_image_record(&db_pool, &record).await?;

        let fetched = get_image_record(&db_pool, &record.id)
            .await?
            .expect("record should exist");
        assert_eq!(fetched.original_path.as_deref(), Some("/img/a.jpg"));
        assert_eq!(fetched.thumbnail_path.as_deref(), Some("/img/a_t.jpg"));
        assert!(!fetched.is_favorite);
        Ok(())
    }

    #[tokio::test]
    async fn get_all_is_sorted_newest_first() -> Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;

        let mut older = ImageRecord::new(Some("/img/old.jpg".into()), None);
        older.created_at = chrono::Utc::now() - chrono::Duration::hours(2);
        let newer = ImageRecord::new(Some("/img/new.jpg".into()), None);
        save_image_record(&db_pool, &older).await?;
        save_image_record(&db_pool, &newer).await?;

        let all = get_all_image_records(&db_pool).await?;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, newer.id);
        assert_eq!(all[1].id, older.id);
        Ok(())
    }

    #[tokio::test]
    async fn favorites_filter_only_flagged_records() -> Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;

        let plain = ImageRecord::new(Some("/img/plain.jpg".into()), None);
        let mut starred = ImageRecord::new(Some("/img/starred.jpg".into()), None);
        starred.is_favorite = true;
        save_image_record(&db_pool, &plain).await?;
        save_image_record(&db_pool, &starred).await?;

        let favorites = get_favorite_image_records(&db_pool).await?;
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].id, starred.id);
        Ok(())
    }

    #[tokio::test]
    async fn double_toggle_restores_original_flag() -> Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;

        let record = ImageRecord::new(Some("/img/b.jpg".into()), None);
        save_image_record(&db_pool, &record).await?;

        toggle_favorite(&db_pool, &record.id).await?;
        let flipped = get_image_record(&db_pool, &record.id).await?.unwrap();
        assert!(flipped.is_favorite);

        toggle_favorite(&db_pool, &record.id).await?;
        let restored = get_image_record(&db_pool, &record.id).await?.unwrap();
        assert_eq!(restored.is_favorite, record.is_favorite);
        Ok(())
    }

    #[tokio::test]
    async fn toggle_on_missing_id_is_not_found() -> Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;

        let err = toggle_favorite(&db_pool, "no-such-id").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        Ok(())
    }

    #[tokio::test]
    async fn delete_clears_day_card_reference_but_keeps_card() -> Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;

        let record = ImageRecord::new(Some("/img/c.jpg".into()), Some("/img/c_t.jpg".into()));
        save_image_record(&db_pool, &record).await?;

        let date = NaiveDate::from_ymd_opt(2025, 10, 4).unwrap();
        let mut card = DayCard::for_date(date);
        card.image_record_id = Some(record.id.clone());
        save_day_card(&db_pool, &card).await?;

        let manager = RecordingImageManager::default();
        delete_image_record(&db_pool, &manager, &record).await?;

        let card_after = get_day_card_for_date(&db_pool, 2025, 10, 4)
            .await?
            .expect("card must survive the image delete");
        assert!(card_after.image_record_id.is_none());
        assert!(get_image_record(&db_pool, &record.id).await?.is_none());

        // Both backing files get a best-effort delete attempt.
        let deleted = manager.deleted();
        assert_eq!(
            deleted,
            vec![
                ("/img/c.jpg".to_string(), true),
                ("/img/c_t.jpg".to_string(), false)
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn delete_of_missing_record_is_not_found() -> Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;

        let record = ImageRecord::new(None, None);
        let manager = RecordingImageManager::default();
        let err = delete_image_record(&db_pool, &manager, &record)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(manager.deleted().is_empty());
        Ok(())
    }
}
