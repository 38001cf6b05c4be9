//! Catalog snapshot persistence

use crate::model::{Course, Enrollment, Instructor, Student};
use crate::store::MemoryStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Data directory: .pensum/
pub const DATA_DIR: &str = ".pensum";

/// Catalog snapshot file
pub const CATALOG_FILE: &str = "catalog.json";

/// Serialized image of the whole catalog, id sequences included so a
/// reloaded store keeps assigning fresh ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub saved_at: String,
    pub courses: Vec<Course>,
    pub instructors: Vec<Instructor>,
    pub students: Vec<Student>,
    pub enrollments: Vec<Enrollment>,
    pub sequences: Sequences,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Sequences {
    pub courses: i64,
    pub instructors: i64,
    pub students: i64,
    pub enrollments: i64,
}

/// Get data directory path
pub fn data_dir(root: &Path) -> PathBuf {
    root.join(DATA_DIR)
}

/// Get catalog snapshot file path
pub fn catalog_path(root: &Path) -> PathBuf {
    root.join(DATA_DIR).join(CATALOG_FILE)
}

/// Ensure data directory exists
pub fn ensure_data_dir(root: &Path) -> std::io::Result<()> {
    let dir = data_dir(root);
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(())
}

/// Serialize the catalog to the snapshot file.
pub fn save_catalog(store: &MemoryStore, root: &Path) -> anyhow::Result<()> {
    ensure_data_dir(root)?;
    let path = catalog_path(root);

    let mut snapshot = store.snapshot();
    snapshot.saved_at = chrono::Utc::now().to_rfc3339();

    let json = serde_json::to_string_pretty(&snapshot)?;
    std::fs::write(&path, json)?;

    tracing::debug!("catalog snapshot saved: {}", path.display());
    Ok(())
}

/// Load the catalog from the snapshot file, if one exists.
pub fn load_catalog(root: &Path) -> anyhow::Result<Option<MemoryStore>> {
    let path = catalog_path(root);
    if !path.exists() {
        return Ok(None);
    }

    let json = std::fs::read_to_string(&path)?;
    let snapshot: CatalogSnapshot = serde_json::from_str(&json)?;

    tracing::debug!("catalog snapshot loaded from: {}", path.display());
    Ok(Some(MemoryStore::from_snapshot(snapshot)))
}

/// Remove the data directory and everything in it.
pub fn clear_data(root: &Path) -> std::io::Result<()> {
    let dir = data_dir(root);
    if dir.exists() {
        std::fs::remove_dir_all(&dir)?;
    }
    Ok(())
}
