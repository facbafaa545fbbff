//! The `Database` trait, a single async interface for all persistence.

use async_trait::async_trait;

use crate::backup::{ImportMode, ImportSummary, Snapshot};
use crate::completion::CompletionReport;
use crate::error::DatabaseError;
use crate::model::{FieldTable, FieldTablePatch, Project, WorkRecord, Worker};

/// Backend-agnostic database trait covering the tracker's entities.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    // ── Workers ─────────────────────────────────────────────────────

    /// Insert a worker and return it with its assigned id.
    async fn create_worker(
        &self,
        name: &str,
        color: Option<&str>,
        initials: Option<&str>,
    ) -> Result<Worker, DatabaseError>;

    async fn get_worker(&self, id: i64) -> Result<Option<Worker>, DatabaseError>;

    async fn list_workers(&self) -> Result<Vec<Worker>, DatabaseError>;

    // ── Projects ────────────────────────────────────────────────────

    /// Insert a project and return it with its assigned id.
    async fn create_project(
        &self,
        name: &str,
        location: Option<&str>,
    ) -> Result<Project, DatabaseError>;

    async fn get_project(&self, id: i64) -> Result<Option<Project>, DatabaseError>;

    async fn list_projects(&self) -> Result<Vec<Project>, DatabaseError>;

    // ── Field tables ────────────────────────────────────────────────

    /// Insert a pending table. Table numbers are unique per project.
    async fn create_field_table(
        &self,
        project_id: i64,
        table_number: &str,
        table_size: Option<&str>,
    ) -> Result<FieldTable, DatabaseError>;

    async fn get_field_table(&self, id: i64) -> Result<Option<FieldTable>, DatabaseError>;

    /// Look up a table by its on-site number within a project.
    async fn find_field_table(
        &self,
        project_id: i64,
        table_number: &str,
    ) -> Result<Option<FieldTable>, DatabaseError>;

    async fn list_field_tables(&self, project_id: i64) -> Result<Vec<FieldTable>, DatabaseError>;

    /// Apply a partial update. Returns `NotFound` if the table is missing.
    async fn update_field_table(
        &self,
        id: i64,
        patch: &FieldTablePatch,
    ) -> Result<FieldTable, DatabaseError>;

    /// Mark the named tables of a project completed by `worker_id`, all in
    /// one transaction. Missing and already-completed tables are skipped.
    async fn apply_table_completions(
        &self,
        worker_id: i64,
        project_id: i64,
        table_numbers: &[String],
        max_assigned: usize,
    ) -> Result<CompletionReport, DatabaseError>;

    // ── Work records ────────────────────────────────────────────────

    async fn insert_work_record(&self, record: &WorkRecord) -> Result<(), DatabaseError>;

    /// Work records of a worker, most recent first.
    async fn list_work_records_by_worker(
        &self,
        worker_id: i64,
    ) -> Result<Vec<WorkRecord>, DatabaseError>;

    /// Work records of a project, most recent first.
    async fn list_work_records_by_project(
        &self,
        project_id: i64,
    ) -> Result<Vec<WorkRecord>, DatabaseError>;

    // ── Backup ──────────────────────────────────────────────────────

    /// Read every persisted entity into a snapshot.
    async fn export_snapshot(&self) -> Result<Snapshot, DatabaseError>;

    /// Write a snapshot back in one transaction.
    async fn import_snapshot(
        &self,
        snapshot: &Snapshot,
        mode: ImportMode,
    ) -> Result<ImportSummary, DatabaseError>;
}
