//! libSQL backend — async `Database` trait implementation.
//!
//! Supports local file and in-memory databases. Multi-row writes
//! (completion batches, snapshot imports) run inside a single transaction.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backup::{ImportMode, ImportSummary, SNAPSHOT_VERSION, Snapshot};
use crate::completion::{CompletionReport, SkipReason};
use crate::error::DatabaseError;
use crate::model::{FieldTable, FieldTablePatch, Project, TableStatus, WorkRecord, Worker};
use crate::store::migrations;
use crate::store::traits::Database;

const WORKER_COLUMNS: &str = "id, name, color, initials, created_at";
const PROJECT_COLUMNS: &str = "id, name, location, created_at";
const TABLE_COLUMNS: &str = "id, project_id, table_number, table_size, status, completed_at, completed_by, assigned_workers, created_at, updated_at";
const RECORD_COLUMNS: &str = "id, worker_id, project_id, description, tables, start_time, end_time, duration_minutes, created_at";

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.run_migrations().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.run_migrations().await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn column_err(entity: &str, column: &str, e: libsql::Error) -> DatabaseError {
    DatabaseError::Query(format!("{entity}.{column}: {e}"))
}

fn row_to_worker(row: &libsql::Row) -> Result<Worker, DatabaseError> {
    let id: i64 = row.get(0).map_err(|e| column_err("worker", "id", e))?;
    let name: String = row.get(1).map_err(|e| column_err("worker", "name", e))?;
    let created_str: String = row.get(4).map_err(|e| column_err("worker", "created_at", e))?;

    Ok(Worker {
        id,
        name,
        color: row.get::<String>(2).ok(),
        initials: row.get::<String>(3).ok(),
        created_at: parse_datetime(&created_str),
    })
}

fn row_to_project(row: &libsql::Row) -> Result<Project, DatabaseError> {
    let id: i64 = row.get(0).map_err(|e| column_err("project", "id", e))?;
    let name: String = row.get(1).map_err(|e| column_err("project", "name", e))?;
    let created_str: String = row.get(3).map_err(|e| column_err("project", "created_at", e))?;

    Ok(Project {
        id,
        name,
        location: row.get::<String>(2).ok(),
        created_at: parse_datetime(&created_str),
    })
}

/// Column order matches TABLE_COLUMNS.
fn row_to_table(row: &libsql::Row) -> Result<FieldTable, DatabaseError> {
    let id: i64 = row.get(0).map_err(|e| column_err("field_table", "id", e))?;
    let project_id: i64 = row.get(1).map_err(|e| column_err("field_table", "project_id", e))?;
    let table_number: String = row
        .get(2)
        .map_err(|e| column_err("field_table", "table_number", e))?;

    let status_str: String = row.get(4).unwrap_or_else(|_| "pending".to_string());
    let status: TableStatus = status_str.parse().unwrap_or_default();

    let assigned_str: String = row.get(7).unwrap_or_else(|_| "[]".to_string());
    let assigned_workers: Vec<i64> = serde_json::from_str(&assigned_str)
        .map_err(|e| DatabaseError::Serialization(format!("field_table.assigned_workers: {e}")))?;

    let created_str: String = row.get(8).map_err(|e| column_err("field_table", "created_at", e))?;
    let updated_str: String = row.get(9).map_err(|e| column_err("field_table", "updated_at", e))?;

    Ok(FieldTable {
        id,
        project_id,
        table_number,
        table_size: row.get::<String>(3).ok(),
        status,
        completed_at: row
            .get::<String>(5)
            .ok()
            .filter(|s| !s.is_empty())
            .map(|s| parse_datetime(&s)),
        completed_by: row.get::<i64>(6).ok(),
        assigned_workers,
        created_at: parse_datetime(&created_str),
        updated_at: parse_datetime(&updated_str),
    })
}

/// Column order matches RECORD_COLUMNS.
fn row_to_record(row: &libsql::Row) -> Result<WorkRecord, DatabaseError> {
    let id_str: String = row.get(0).map_err(|e| column_err("work_record", "id", e))?;
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| DatabaseError::Query(format!("work_record.id parse: {e}")))?;

    let tables_str: String = row.get(4).unwrap_or_else(|_| "[]".to_string());
    let tables: Vec<String> = serde_json::from_str(&tables_str)
        .map_err(|e| DatabaseError::Serialization(format!("work_record.tables: {e}")))?;

    let start_str: String = row.get(5).map_err(|e| column_err("work_record", "start_time", e))?;
    let end_str: String = row.get(6).map_err(|e| column_err("work_record", "end_time", e))?;
    let created_str: String = row.get(8).map_err(|e| column_err("work_record", "created_at", e))?;

    Ok(WorkRecord {
        id,
        worker_id: row.get(1).map_err(|e| column_err("work_record", "worker_id", e))?,
        project_id: row.get(2).map_err(|e| column_err("work_record", "project_id", e))?,
        description: row.get(3).unwrap_or_default(),
        tables,
        start_time: parse_datetime(&start_str),
        end_time: parse_datetime(&end_str),
        duration_minutes: row.get(7).unwrap_or(0),
        created_at: parse_datetime(&created_str),
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::Serialization(e.to_string()))
}

fn map_write_err(context: &str, e: libsql::Error) -> DatabaseError {
    let msg = e.to_string();
    if msg.contains("UNIQUE") {
        DatabaseError::Constraint(format!("{context}: {msg}"))
    } else {
        DatabaseError::Query(format!("{context}: {msg}"))
    }
}

// ── Connection-level queries (usable inside a transaction) ───────────

async fn query_tables(
    conn: &Connection,
    sql: &str,
    params: impl libsql::params::IntoParams,
    context: &str,
) -> Result<Vec<FieldTable>, DatabaseError> {
    let mut rows = conn
        .query(sql, params)
        .await
        .map_err(|e| DatabaseError::Query(format!("{context}: {e}")))?;

    let mut tables = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| DatabaseError::Query(format!("{context} row: {e}")))?
    {
        tables.push(row_to_table(&row)?);
    }
    Ok(tables)
}

async fn query_records(
    conn: &Connection,
    sql: &str,
    params: impl libsql::params::IntoParams,
    context: &str,
) -> Result<Vec<WorkRecord>, DatabaseError> {
    let mut rows = conn
        .query(sql, params)
        .await
        .map_err(|e| DatabaseError::Query(format!("{context}: {e}")))?;

    let mut records = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| DatabaseError::Query(format!("{context} row: {e}")))?
    {
        records.push(row_to_record(&row)?);
    }
    Ok(records)
}

async fn find_table_in(
    conn: &Connection,
    project_id: i64,
    table_number: &str,
) -> Result<Option<FieldTable>, DatabaseError> {
    let tables = query_tables(
        conn,
        &format!("SELECT {TABLE_COLUMNS} FROM field_tables WHERE project_id = ?1 AND table_number = ?2"),
        params![project_id, table_number],
        "find_field_table",
    )
    .await?;
    Ok(tables.into_iter().next())
}

async fn write_table_state(conn: &Connection, table: &FieldTable) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE field_tables SET status = ?1, completed_at = ?2, completed_by = ?3, assigned_workers = ?4, updated_at = ?5 WHERE id = ?6",
        params![
            table.status.as_str(),
            table.completed_at.map(|d| d.to_rfc3339()),
            table.completed_by,
            to_json(&table.assigned_workers)?,
            table.updated_at.to_rfc3339(),
            table.id,
        ],
    )
    .await
    .map_err(|e| map_write_err("update_field_table", e))?;
    Ok(())
}

async fn complete_tables_in(
    conn: &Connection,
    worker_id: i64,
    project_id: i64,
    table_numbers: &[String],
    max_assigned: usize,
) -> Result<CompletionReport, DatabaseError> {
    let now = Utc::now();
    let mut report = CompletionReport::default();

    for number in table_numbers {
        let Some(mut table) = find_table_in(conn, project_id, number).await? else {
            info!(table = %number, project_id, "Table not found in project, skipping");
            report.skip(number, SkipReason::NotFound);
            continue;
        };

        if table.is_completed() {
            info!(table = %number, project_id, "Table already completed, skipping");
            report.skip(number, SkipReason::AlreadyCompleted);
            continue;
        }

        let patch = FieldTablePatch::completion(&table, worker_id, now, max_assigned);
        table.apply(&patch);
        write_table_state(conn, &table).await?;
        debug!(table = %number, worker_id, "Table marked completed");
        report.completed.push(number.clone());
    }

    Ok(report)
}

async fn insert_worker_row(conn: &Connection, w: &Worker, upsert: bool) -> Result<(), DatabaseError> {
    let verb = if upsert { "INSERT OR REPLACE" } else { "INSERT" };
    conn.execute(
        &format!("{verb} INTO workers ({WORKER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
        params![
            w.id,
            w.name.as_str(),
            w.color.as_deref(),
            w.initials.as_deref(),
            w.created_at.to_rfc3339(),
        ],
    )
    .await
    .map_err(|e| map_write_err("insert_worker", e))?;
    Ok(())
}

async fn insert_project_row(conn: &Connection, p: &Project, upsert: bool) -> Result<(), DatabaseError> {
    let verb = if upsert { "INSERT OR REPLACE" } else { "INSERT" };
    conn.execute(
        &format!("{verb} INTO projects ({PROJECT_COLUMNS}) VALUES (?1, ?2, ?3, ?4)"),
        params![
            p.id,
            p.name.as_str(),
            p.location.as_deref(),
            p.created_at.to_rfc3339(),
        ],
    )
    .await
    .map_err(|e| map_write_err("insert_project", e))?;
    Ok(())
}

async fn insert_table_row(conn: &Connection, t: &FieldTable, upsert: bool) -> Result<(), DatabaseError> {
    let verb = if upsert { "INSERT OR REPLACE" } else { "INSERT" };
    conn.execute(
        &format!("{verb} INTO field_tables ({TABLE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
        params![
            t.id,
            t.project_id,
            t.table_number.as_str(),
            t.table_size.as_deref(),
            t.status.as_str(),
            t.completed_at.map(|d| d.to_rfc3339()),
            t.completed_by,
            to_json(&t.assigned_workers)?,
            t.created_at.to_rfc3339(),
            t.updated_at.to_rfc3339(),
        ],
    )
    .await
    .map_err(|e| map_write_err("insert_field_table", e))?;
    Ok(())
}

async fn insert_record_row(conn: &Connection, r: &WorkRecord, upsert: bool) -> Result<(), DatabaseError> {
    let verb = if upsert { "INSERT OR REPLACE" } else { "INSERT" };
    conn.execute(
        &format!("{verb} INTO work_records ({RECORD_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
        params![
            r.id.to_string(),
            r.worker_id,
            r.project_id,
            r.description.as_str(),
            to_json(&r.tables)?,
            r.start_time.to_rfc3339(),
            r.end_time.to_rfc3339(),
            r.duration_minutes,
            r.created_at.to_rfc3339(),
        ],
    )
    .await
    .map_err(|e| map_write_err("insert_work_record", e))?;
    Ok(())
}

async fn import_in(
    conn: &Connection,
    snapshot: &Snapshot,
    mode: ImportMode,
) -> Result<ImportSummary, DatabaseError> {
    if mode == ImportMode::Replace {
        conn.execute_batch(
            "DELETE FROM work_records;
             DELETE FROM field_tables;
             DELETE FROM projects;
             DELETE FROM workers;",
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("import_snapshot clear: {e}")))?;
    }

    let upsert = mode == ImportMode::Merge;
    for w in &snapshot.workers {
        insert_worker_row(conn, w, upsert).await?;
    }
    for p in &snapshot.projects {
        insert_project_row(conn, p, upsert).await?;
    }
    for t in &snapshot.field_tables {
        insert_table_row(conn, t, upsert).await?;
    }
    for r in &snapshot.work_records {
        insert_record_row(conn, r, upsert).await?;
    }

    Ok(ImportSummary {
        mode,
        workers: snapshot.workers.len(),
        projects: snapshot.projects.len(),
        field_tables: snapshot.field_tables.len(),
        work_records: snapshot.work_records.len(),
    })
}

/// Commit on success, roll back on failure.
async fn finish_transaction<T>(
    tx: libsql::Transaction,
    outcome: Result<T, DatabaseError>,
    context: &str,
) -> Result<T, DatabaseError> {
    match outcome {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|e| DatabaseError::Query(format!("{context} commit: {e}")))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(e) = tx.rollback().await {
                warn!(context, error = %e, "Rollback failed");
            }
            Err(err)
        }
    }
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl Database for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Workers ─────────────────────────────────────────────────────

    async fn create_worker(
        &self,
        name: &str,
        color: Option<&str>,
        initials: Option<&str>,
    ) -> Result<Worker, DatabaseError> {
        let conn = self.conn();
        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO workers (name, color, initials, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![name, color, initials, created_at.to_rfc3339()],
        )
        .await
        .map_err(|e| map_write_err("create_worker", e))?;

        let worker = Worker {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            color: color.map(String::from),
            initials: initials.map(String::from),
            created_at,
        };
        debug!(id = worker.id, name = %worker.name, "Worker created");
        Ok(worker)
    }

    async fn get_worker(&self, id: i64) -> Result<Option<Worker>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {WORKER_COLUMNS} FROM workers WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_worker: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_worker(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_worker row: {e}"))),
        }
    }

    async fn list_workers(&self) -> Result<Vec<Worker>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(&format!("SELECT {WORKER_COLUMNS} FROM workers ORDER BY id ASC"), ())
            .await
            .map_err(|e| DatabaseError::Query(format!("list_workers: {e}")))?;

        let mut workers = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_workers row: {e}")))?
        {
            workers.push(row_to_worker(&row)?);
        }
        Ok(workers)
    }

    // ── Projects ────────────────────────────────────────────────────

    async fn create_project(
        &self,
        name: &str,
        location: Option<&str>,
    ) -> Result<Project, DatabaseError> {
        let conn = self.conn();
        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO projects (name, location, created_at) VALUES (?1, ?2, ?3)",
            params![name, location, created_at.to_rfc3339()],
        )
        .await
        .map_err(|e| map_write_err("create_project", e))?;

        let project = Project {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            location: location.map(String::from),
            created_at,
        };
        debug!(id = project.id, name = %project.name, "Project created");
        Ok(project)
    }

    async fn get_project(&self, id: i64) -> Result<Option<Project>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_project: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_project(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_project row: {e}"))),
        }
    }

    async fn list_projects(&self) -> Result<Vec<Project>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(&format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY id ASC"), ())
            .await
            .map_err(|e| DatabaseError::Query(format!("list_projects: {e}")))?;

        let mut projects = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_projects row: {e}")))?
        {
            projects.push(row_to_project(&row)?);
        }
        Ok(projects)
    }

    // ── Field tables ────────────────────────────────────────────────

    async fn create_field_table(
        &self,
        project_id: i64,
        table_number: &str,
        table_size: Option<&str>,
    ) -> Result<FieldTable, DatabaseError> {
        let conn = self.conn();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO field_tables (project_id, table_number, table_size, status, assigned_workers, created_at, updated_at) VALUES (?1, ?2, ?3, 'pending', '[]', ?4, ?4)",
            params![project_id, table_number, table_size, now.to_rfc3339()],
        )
        .await
        .map_err(|e| map_write_err("create_field_table", e))?;

        let mut table = FieldTable::new(conn.last_insert_rowid(), project_id, table_number);
        table.table_size = table_size.map(String::from);
        table.created_at = now;
        table.updated_at = now;
        debug!(id = table.id, project_id, table = %table.table_number, "Field table created");
        Ok(table)
    }

    async fn get_field_table(&self, id: i64) -> Result<Option<FieldTable>, DatabaseError> {
        let tables = query_tables(
            self.conn(),
            &format!("SELECT {TABLE_COLUMNS} FROM field_tables WHERE id = ?1"),
            params![id],
            "get_field_table",
        )
        .await?;
        Ok(tables.into_iter().next())
    }

    async fn find_field_table(
        &self,
        project_id: i64,
        table_number: &str,
    ) -> Result<Option<FieldTable>, DatabaseError> {
        find_table_in(self.conn(), project_id, table_number).await
    }

    async fn list_field_tables(&self, project_id: i64) -> Result<Vec<FieldTable>, DatabaseError> {
        query_tables(
            self.conn(),
            &format!("SELECT {TABLE_COLUMNS} FROM field_tables WHERE project_id = ?1 ORDER BY id ASC"),
            params![project_id],
            "list_field_tables",
        )
        .await
    }

    async fn update_field_table(
        &self,
        id: i64,
        patch: &FieldTablePatch,
    ) -> Result<FieldTable, DatabaseError> {
        let mut table = self
            .get_field_table(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound {
                entity: "field_table".into(),
                id: id.to_string(),
            })?;

        if patch.is_empty() {
            return Ok(table);
        }

        table.apply(patch);
        write_table_state(self.conn(), &table).await?;
        debug!(id, status = table.status.as_str(), "Field table updated");
        Ok(table)
    }

    async fn apply_table_completions(
        &self,
        worker_id: i64,
        project_id: i64,
        table_numbers: &[String],
        max_assigned: usize,
    ) -> Result<CompletionReport, DatabaseError> {
        let tx = self
            .conn()
            .transaction()
            .await
            .map_err(|e| DatabaseError::Query(format!("apply_table_completions begin: {e}")))?;

        let outcome = complete_tables_in(&tx, worker_id, project_id, table_numbers, max_assigned).await;
        finish_transaction(tx, outcome, "apply_table_completions").await
    }

    // ── Work records ────────────────────────────────────────────────

    async fn insert_work_record(&self, record: &WorkRecord) -> Result<(), DatabaseError> {
        insert_record_row(self.conn(), record, false).await?;
        debug!(id = %record.id, worker_id = record.worker_id, "Work record inserted");
        Ok(())
    }

    async fn list_work_records_by_worker(
        &self,
        worker_id: i64,
    ) -> Result<Vec<WorkRecord>, DatabaseError> {
        query_records(
            self.conn(),
            &format!("SELECT {RECORD_COLUMNS} FROM work_records WHERE worker_id = ?1 ORDER BY start_time DESC"),
            params![worker_id],
            "list_work_records_by_worker",
        )
        .await
    }

    async fn list_work_records_by_project(
        &self,
        project_id: i64,
    ) -> Result<Vec<WorkRecord>, DatabaseError> {
        query_records(
            self.conn(),
            &format!("SELECT {RECORD_COLUMNS} FROM work_records WHERE project_id = ?1 ORDER BY start_time DESC"),
            params![project_id],
            "list_work_records_by_project",
        )
        .await
    }

    // ── Backup ──────────────────────────────────────────────────────

    async fn export_snapshot(&self) -> Result<Snapshot, DatabaseError> {
        let conn = self.conn();
        let workers = self.list_workers().await?;
        let projects = self.list_projects().await?;
        let field_tables = query_tables(
            conn,
            &format!("SELECT {TABLE_COLUMNS} FROM field_tables ORDER BY id ASC"),
            (),
            "export_snapshot tables",
        )
        .await?;
        let work_records = query_records(
            conn,
            &format!("SELECT {RECORD_COLUMNS} FROM work_records ORDER BY start_time ASC"),
            (),
            "export_snapshot records",
        )
        .await?;

        Ok(Snapshot {
            version: SNAPSHOT_VERSION,
            created_at: Utc::now(),
            workers,
            projects,
            field_tables,
            work_records,
        })
    }

    async fn import_snapshot(
        &self,
        snapshot: &Snapshot,
        mode: ImportMode,
    ) -> Result<ImportSummary, DatabaseError> {
        let tx = self
            .conn()
            .transaction()
            .await
            .map_err(|e| DatabaseError::Query(format!("import_snapshot begin: {e}")))?;

        let outcome = import_in(&tx, snapshot, mode).await;
        let summary = finish_transaction(tx, outcome, "import_snapshot").await?;
        info!(
            mode = ?summary.mode,
            workers = summary.workers,
            projects = summary.projects,
            field_tables = summary.field_tables,
            work_records = summary.work_records,
            "Snapshot imported"
        );
        Ok(summary)
    }
}
