use crate::db::DbPool;
use crate::errors::{Error, Result};
use rusqlite::{OptionalExtension, params};
use tracing::{debug, info, instrument};

/// Retrieves a value from the key-value `shared_prefs` table.
///
/// This table holds out-of-band state shared with other processes, such as
/// the JSON schedule snapshot the home-screen widget reads.
///
/// Returns `Ok(None)` if the key does not exist.
#[instrument(skip(pool))]
pub async fn get_value(pool: &DbPool, key: &str) -> Result<Option<String>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::InvalidState("Store handle no longer available".to_string()))?;
    let mut stmt = conn.prepare_cached("SELECT value FROM shared_prefs WHERE key = ?1")?;
    let value_result: Option<String> = stmt.query_row(params![key], |row| row.get(0)).optional()?;
    debug!("Shared pref for key '{}': {:?}", key, value_result);
    Ok(value_result)
}

/// Sets or updates a value in the key-value `shared_prefs` table (UPSERT).
#[instrument(skip(pool, value))]
pub async fn set_value(pool: &DbPool, key: &str, value: &str) -> Result<()> {
    let conn = pool
        .lock()
        .map_err(|_| Error::InvalidState("Store handle no longer available".to_string()))?;
    conn.execute(
        "INSERT INTO shared_prefs (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    info!("Set shared pref: {}", key);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{init_test_tracing, setup_test_db};
    use crate::errors::Result;

    #[tokio::test]
    async fn set_and_get_new_key() -> Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;

        set_value(&db_pool, "widget.theme", "dark").await?;
        let retrieved = get_value(&db_pool, "widget.theme").await?;
        assert_eq!(retrieved, Some("dark".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn set_updates_existing_key() -> Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;

        set_value(&db_pool, "widget.theme", "dark").await?;
        set_value(&db_pool, "widget.theme", "light").await?;

        let retrieved = get_value(&db_pool, "widget.theme").await?;
        assert_eq!(retrieved, Some("light".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn get_non_existent_key_is_none() -> Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;

        let retrieved = get_value(&db_pool, "never_set").await?;
        assert!(retrieved.is_none());
        Ok(())
    }
}
