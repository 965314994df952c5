use crate::db::DbPool;
use crate::errors::{Error, Result};
use crate::images::ImageFileManager;
use crate::models::SymptomImage;
use rusqlite::{OptionalExtension, params};
use tracing::{debug, info, instrument};

const SYMPTOM_IMAGE_COLUMNS: &str = "id, original_path, thumbnail_path, created_at";

fn map_symptom_image_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SymptomImage> {
    Ok(SymptomImage {
        id: row.get(0)?,
        original_path: row.get(1)?,
        thumbnail_path: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// Upserts a symptom image by id. Images are saved standalone first and
/// attached to a symptom afterwards via [`attach_to_symptom`].
#[instrument(skip(pool, image))]
pub async fn save_symptom_image(pool: &DbPool, image: &SymptomImage) -> Result<SymptomImage> {
    let conn = pool
        .lock()
        .map_err(|_| Error::InvalidState("Store handle no longer available".to_string()))?;
    conn.execute(
        "INSERT INTO symptom_images (id, original_path, thumbnail_path, created_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
            original_path = excluded.original_path,
            thumbnail_path = excluded.thumbnail_path,
            created_at = excluded.created_at",
        params![
            image.id,
            image.original_path,
            image.thumbnail_path,
            image.created_at,
        ],
    )
    .map_err(|e| Error::Storage(format!("Failed to save symptom image {}: {}", image.id, e)))?;
    info!("Saved symptom image {}", image.id);
    Ok(image.clone())
}

/// Appends an already-saved image to a symptom's ordered image list.
///
/// Both rows must already exist; attaching to an id that no longer resolves
/// is a `NotFound`, not a constraint failure.
#[instrument(skip(pool))]
pub async fn attach_to_symptom(pool: &DbPool, image_id: &str, symptom_id: &str) -> Result<()> {
    let conn = pool
        .lock()
        .map_err(|_| Error::InvalidState("Store handle no longer available".to_string()))?;

    let symptom_exists: bool = {
        let mut stmt = conn.prepare_cached("SELECT 1 FROM symptoms WHERE id = ?1")?;
        stmt.exists(params![symptom_id])?
    };
    if !symptom_exists {
        return Err(Error::NotFound(format!(
            "Symptom {} does not exist",
            symptom_id
        )));
    }
    let image_exists: bool = {
        let mut stmt = conn.prepare_cached("SELECT 1 FROM symptom_images WHERE id = ?1")?;
        stmt.exists(params![image_id])?
    };
    if !image_exists {
        return Err(Error::NotFound(format!(
            "Symptom image {} does not exist",
            image_id
        )));
    }

    conn.execute(
        "INSERT INTO symptom_image_links (symptom_id, image_id, position)
         VALUES (?1, ?2,
            (SELECT COALESCE(MAX(position) + 1, 0) FROM symptom_image_links WHERE symptom_id = ?1))
         ON CONFLICT(symptom_id, image_id) DO NOTHING",
        params![symptom_id, image_id],
    )?;
    debug!("Attached image {} to symptom {}", image_id, symptom_id);
    Ok(())
}

#[instrument(skip(pool))]
pub async fn get_symptom_image(pool: &DbPool, id: &str) -> Result<Option<SymptomImage>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::InvalidState("Store handle no longer available".to_string()))?;
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {SYMPTOM_IMAGE_COLUMNS} FROM symptom_images WHERE id = ?1"
    ))?;
    let image = stmt
        .query_row(params![id], map_symptom_image_row)
        .optional()?;
    Ok(image)
}

/// All symptom images, newest first.
#[instrument(skip(pool))]
pub async fn get_all_symptom_images(pool: &DbPool) -> Result<Vec<SymptomImage>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::InvalidState("Store handle no longer available".to_string()))?;
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {SYMPTOM_IMAGE_COLUMNS} FROM symptom_images ORDER BY created_at DESC"
    ))?;
    let images = stmt
        .query_map([], map_symptom_image_row)?
        .collect::<rusqlite::Result<Vec<SymptomImage>>>()?;
    debug!("Fetched {} symptom images", images.len());
    Ok(images)
}

/// Deletes a symptom image: the owning symptom's link and the row go in one
/// transaction, then the backing files are removed best-effort from paths
/// captured before the mutation. The database delete is the authoritative
/// success signal; filesystem failures are logged only.
#[instrument(skip(pool, images, image))]
pub async fn delete_symptom_image(
    pool: &DbPool,
    images: &dyn ImageFileManager,
    image: &SymptomImage,
) -> Result<()> {
    let original_path = image.original_path.clone();
    let thumbnail_path = image.thumbnail_path.clone();

    {
        let mut conn = pool
            .lock()
            .map_err(|_| Error::InvalidState("Store handle no longer available".to_string()))?;
        let tx = conn
            .transaction()
            .map_err(|e| Error::Storage(format!("Failed to start transaction: {}", e)))?;

        tx.execute(
            "DELETE FROM symptom_image_links WHERE image_id = ?1",
            params![image.id],
        )?;
        let deleted = tx.execute("DELETE FROM symptom_images WHERE id = ?1", params![image.id])?;
        if deleted == 0 {
            return Err(Error::NotFound(format!(
                "Symptom image {} does not exist",
                image.id
            )));
        }

        tx.commit().map_err(|e| {
            Error::Storage(format!(
                "Failed to commit delete of symptom image {}: {}",
                image.id, e
            ))
        })?;
    }

    info!("Deleted symptom image {}", image.id);
    if let Some(path) = original_path {
        images.delete_image_file(&path, true);
    }
    if let Some(path) = thumbnail_path {
        images.delete_image_file(&path, false);
    }
    Ok(())
}
