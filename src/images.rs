use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Capability for removing attachment files once their database row is gone.
///
/// The database row is the authoritative existence signal, so deletion here
/// is fire-and-forget: failures are logged, never surfaced to the caller.
pub trait ImageFileManager: Send + Sync {
    fn delete_image_file(&self, path: &str, is_original: bool);
}

/// Filesystem-backed image-file manager. Relative paths are resolved against
/// `base_dir` when one is configured.
#[derive(Debug, Clone, Default)]
pub struct FsImageManager {
    base_dir: Option<PathBuf>,
}

impl FsImageManager {
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        Self { base_dir }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        match &self.base_dir {
            Some(base) if Path::new(path).is_relative() => base.join(path),
            _ => PathBuf::from(path),
        }
    }
}

impl ImageFileManager for FsImageManager {
    fn delete_image_file(&self, path: &str, is_original: bool) {
        let resolved = self.resolve(path);
        let kind = if is_original { "original" } else { "thumbnail" };
        match fs::remove_file(&resolved) {
            Ok(()) => debug!("Deleted {} image file {:?}", kind, resolved),
            Err(e) => warn!(
                "Failed to delete {} image file {:?}: {} (row already removed, continuing)",
                kind, resolved, e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn deletes_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("photo.jpg");
        let mut file = fs::File::create(&file_path).unwrap();
        file.write_all(b"jpeg bytes").unwrap();

        let manager = FsImageManager::new(None);
        manager.delete_image_file(file_path.to_str().unwrap(), true);

        assert!(!file_path.exists());
    }

    #[test]
    fn missing_file_is_logged_not_fatal() {
        let manager = FsImageManager::new(None);
        // Must not panic or return an error channel; the row is gone either way.
        manager.delete_image_file("/nonexistent/path/photo.jpg", false);
    }

    #[test]
    fn relative_paths_resolve_against_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("thumb.jpg");
        fs::File::create(&file_path).unwrap();

        let manager = FsImageManager::new(Some(dir.path().to_path_buf()));
        manager.delete_image_file("thumb.jpg", false);

        assert!(!file_path.exists());
    }
}
