//! Backup and restore of the whole tracker state.
//!
//! A snapshot is serialized to JSON, gzip-compressed, and base64-encoded
//! behind a short format marker so it can travel as a single string (pasted
//! into a chat, stored in a spreadsheet cell). Blobs without the marker are
//! read as the older uncompressed JSON export.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{BackupError, Result};
use crate::model::{FieldTable, Project, WorkRecord, Worker};
use crate::store::Database;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 2;

/// Prefix of compressed blobs.
const BLOB_MARKER: &str = "FT1:";

fn legacy_version() -> u32 {
    1
}

/// Full copy of persisted state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default = "legacy_version")]
    pub version: u32,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub workers: Vec<Worker>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub field_tables: Vec<FieldTable>,
    #[serde(default)]
    pub work_records: Vec<WorkRecord>,
}

/// How an import treats rows already in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    /// Wipe everything first.
    Replace,
    /// Upsert by id; rows absent from the snapshot survive.
    Merge,
}

/// Row counts written by an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub mode: ImportMode,
    pub workers: usize,
    pub projects: usize,
    pub field_tables: usize,
    pub work_records: usize,
}

/// Encode a snapshot as a compressed, base64 blob.
pub fn encode(snapshot: &Snapshot) -> Result<String> {
    let json = serde_json::to_vec(snapshot).map_err(|e| BackupError::Encode(e.to_string()))?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json).map_err(BackupError::Io)?;
    let compressed = encoder.finish().map_err(BackupError::Io)?;

    debug!(
        json_bytes = json.len(),
        compressed_bytes = compressed.len(),
        "Snapshot encoded"
    );
    Ok(format!("{BLOB_MARKER}{}", STANDARD.encode(compressed)))
}

/// Decode a blob produced by [`encode`] or a legacy plain-JSON export.
pub fn decode(blob: &str) -> Result<Snapshot> {
    let blob = blob.trim();
    let json = match blob.strip_prefix(BLOB_MARKER) {
        Some(payload) => {
            let compressed = STANDARD
                .decode(payload)
                .map_err(|e| BackupError::Decode(format!("base64: {e}")))?;
            let mut json = String::new();
            GzDecoder::new(compressed.as_slice())
                .read_to_string(&mut json)
                .map_err(|e| BackupError::Decode(format!("gzip: {e}")))?;
            json
        }
        None => {
            debug!("Blob has no format marker, reading as legacy JSON");
            blob.to_string()
        }
    };

    let snapshot: Snapshot =
        serde_json::from_str(&json).map_err(|e| BackupError::Decode(format!("json: {e}")))?;

    if snapshot.version > SNAPSHOT_VERSION {
        return Err(BackupError::UnsupportedVersion {
            found: snapshot.version,
            supported: SNAPSHOT_VERSION,
        }
        .into());
    }
    Ok(snapshot)
}

/// Export the database to a blob.
pub async fn export(db: &dyn Database) -> Result<String> {
    let snapshot = db.export_snapshot().await?;
    info!(
        workers = snapshot.workers.len(),
        projects = snapshot.projects.len(),
        field_tables = snapshot.field_tables.len(),
        work_records = snapshot.work_records.len(),
        "Snapshot exported"
    );
    encode(&snapshot)
}

/// Restore a blob into the database.
pub async fn import(db: &dyn Database, blob: &str, mode: ImportMode) -> Result<ImportSummary> {
    let snapshot = decode(blob)?;
    Ok(db.import_snapshot(&snapshot, mode).await?)
}

/// Write a timestamped backup file into `dir` and return its path.
pub async fn export_to_file(db: &dyn Database, dir: &Path) -> Result<PathBuf> {
    let blob = export(db).await?;
    tokio::fs::create_dir_all(dir).await.map_err(BackupError::Io)?;

    let name = format!("field-tracker-{}.bak", Utc::now().format("%Y%m%d_%H%M%S"));
    let path = dir.join(name);
    tokio::fs::write(&path, blob).await.map_err(BackupError::Io)?;
    info!(path = %path.display(), "Backup written");
    Ok(path)
}

/// Restore from a backup file.
pub async fn import_from_file(db: &dyn Database, path: &Path, mode: ImportMode) -> Result<ImportSummary> {
    let blob = tokio::fs::read_to_string(path).await.map_err(BackupError::Io)?;
    import(db, &blob, mode).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::TableStatus;
    use crate::store::LibSqlBackend;

    async fn seeded_db() -> LibSqlBackend {
        let db = LibSqlBackend::new_memory().await.unwrap();
        let w = db.create_worker("Jana", Some("#00aa00"), Some("JA")).await.unwrap();
        let p = db.create_project("Kadaň", Some("sever")).await.unwrap();
        db.create_field_table(p.id, "28.1", Some("28")).await.unwrap();
        db.create_field_table(p.id, "IT42-5", None).await.unwrap();
        db.apply_table_completions(w.id, p.id, &["28.1".to_string()], 2)
            .await
            .unwrap();
        db
    }

    #[test]
    fn encoded_blob_has_marker_and_decodes() {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            created_at: Utc::now(),
            workers: vec![Worker::new(1, "Jana").with_initials("JA")],
            projects: vec![Project::new(1, "Kadaň")],
            field_tables: vec![FieldTable::new(1, 1, "A-1")],
            work_records: vec![],
        };
        let blob = encode(&snapshot).unwrap();
        assert!(blob.starts_with(BLOB_MARKER));
        assert_eq!(decode(&blob).unwrap(), snapshot);
    }

    #[test]
    fn legacy_json_without_new_fields() {
        let legacy = r#"{
            "workers": [{"id": 1, "name": "Jana", "created_at": "2025-05-01T08:00:00Z"}],
            "projects": [{"id": 3, "name": "Kadaň", "created_at": "2025-05-01T08:00:00Z"}],
            "field_tables": [{"id": 9, "project_id": 3, "table_number": "TR36", "status": "completed"}]
        }"#;
        let snapshot = decode(legacy).unwrap();
        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.field_tables[0].status, TableStatus::Completed);
        assert!(snapshot.field_tables[0].assigned_workers.is_empty());
        assert!(snapshot.field_tables[0].completed_by.is_none());
        assert!(snapshot.work_records.is_empty());
    }

    #[test]
    fn rejects_newer_version() {
        let err = decode(r#"{"version": 99}"#).unwrap_err();
        assert!(matches!(
            err,
            Error::Backup(BackupError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn rejects_corrupt_blob() {
        assert!(matches!(
            decode("FT1:not base64!!").unwrap_err(),
            Error::Backup(BackupError::Decode(_))
        ));
        assert!(matches!(
            decode("{ truncated").unwrap_err(),
            Error::Backup(BackupError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn replace_restores_exact_state() {
        let source = seeded_db().await;
        let blob = export(&source).await.unwrap();

        let target = LibSqlBackend::new_memory().await.unwrap();
        target.create_worker("Stray", None, None).await.unwrap();

        let summary = import(&target, &blob, ImportMode::Replace).await.unwrap();
        assert_eq!(summary.workers, 1);
        assert_eq!(summary.field_tables, 2);

        let workers = target.list_workers().await.unwrap();
        assert_eq!(workers.len(), 1);
        assert_eq!(workers[0].name, "Jana");

        let project_id = target.list_projects().await.unwrap()[0].id;
        let done = target.find_field_table(project_id, "28.1").await.unwrap().unwrap();
        assert_eq!(done.status, TableStatus::Completed);
        assert_eq!(done.assigned_workers, vec![workers[0].id]);
    }

    #[tokio::test]
    async fn merge_keeps_rows_absent_from_snapshot() {
        let source = seeded_db().await;
        let blob = export(&source).await.unwrap();

        let target = LibSqlBackend::new_memory().await.unwrap();
        target.create_worker("First", None, None).await.unwrap();
        target.create_worker("Second", None, None).await.unwrap();

        import(&target, &blob, ImportMode::Merge).await.unwrap();

        let workers = target.list_workers().await.unwrap();
        assert_eq!(workers.len(), 2);
        // id 1 overwritten by the snapshot, id 2 untouched
        assert_eq!(workers[0].name, "Jana");
        assert_eq!(workers[1].name, "Second");
    }

    #[tokio::test]
    async fn file_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let source = seeded_db().await;
        let path = export_to_file(&source, &tmp.path().join("backups")).await.unwrap();
        assert!(path.exists());

        let target = LibSqlBackend::new_memory().await.unwrap();
        let summary = import_from_file(&target, &path, ImportMode::Replace).await.unwrap();
        assert_eq!(summary.projects, 1);
        assert_eq!(target.export_snapshot().await.unwrap().field_tables.len(), 2);
    }
}
