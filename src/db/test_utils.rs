#![allow(dead_code)]
use crate::db::{DbPool, schema};
use crate::errors::{Error, Result};
use crate::images::ImageFileManager;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

pub(crate) fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer() // Crucial for `cargo test` output
        .try_init(); // Use try_init to avoid panic if already initialized
}

// Helper to create an in-memory DbPool for testing; sets up the schema too.
pub(crate) async fn setup_test_db() -> Result<DbPool> {
    let conn = Connection::open_in_memory()
        .map_err(|e| Error::Storage(format!("Test DB: Failed to open in-memory: {}", e)))?;
    conn.execute("PRAGMA foreign_keys = ON;", [])
        .map_err(|e| Error::Storage(format!("Test DB: Failed to enable foreign keys: {}", e)))?;
    schema::create_tables(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// Image-file manager stub that records delete attempts instead of touching
/// the filesystem, for verifying best-effort cleanup.
#[derive(Debug, Default)]
pub(crate) struct RecordingImageManager {
    calls: Mutex<Vec<(String, bool)>>,
}

impl RecordingImageManager {
    pub(crate) fn deleted(&self) -> Vec<(String, bool)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ImageFileManager for RecordingImageManager {
    fn delete_image_file(&self, path: &str, is_original: bool) {
        self.calls.lock().unwrap().push((path.to_string(), is_original));
    }
}
