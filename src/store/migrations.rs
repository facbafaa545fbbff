//! Version-tracked database migrations for the libSQL backend.
//!
//! Each migration has a version number and SQL. `run_migrations()` checks
//! the current version and applies only the new ones sequentially.

use libsql::Connection;

use crate::error::DatabaseError;

/// A single migration step.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order. Add new versions to the end.
static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "workers_and_projects",
        sql: r#"
            CREATE TABLE IF NOT EXISTS workers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                color TEXT,
                initials TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                location TEXT,
                created_at TEXT NOT NULL
            );
        "#,
    },
    Migration {
        version: 2,
        name: "field_tables",
        sql: r#"
            CREATE TABLE IF NOT EXISTS field_tables (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                table_number TEXT NOT NULL,
                table_size TEXT,
                status TEXT NOT NULL DEFAULT 'pending',
                completed_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (project_id, table_number)
            );
            CREATE INDEX IF NOT EXISTS idx_field_tables_project ON field_tables(project_id);
        "#,
    },
    Migration {
        version: 3,
        name: "work_records",
        sql: r#"
            CREATE TABLE IF NOT EXISTS work_records (
                id TEXT PRIMARY KEY,
                worker_id INTEGER NOT NULL,
                project_id INTEGER NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                tables TEXT NOT NULL DEFAULT '[]',
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                duration_minutes INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_work_records_worker ON work_records(worker_id);
            CREATE INDEX IF NOT EXISTS idx_work_records_project ON work_records(project_id);
        "#,
    },
    Migration {
        version: 4,
        name: "table_completion_credit",
        sql: r#"
            ALTER TABLE field_tables ADD COLUMN completed_by INTEGER;
            ALTER TABLE field_tables ADD COLUMN assigned_workers TEXT NOT NULL DEFAULT '[]';
            CREATE INDEX IF NOT EXISTS idx_field_tables_status ON field_tables(status);
        "#,
    },
];

/// Run all pending migrations against the given connection.
///
/// Creates the `_migrations` table if it doesn't exist.
pub async fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("Failed to create _migrations table: {e}")))?;

    let current_version = get_current_version(conn).await?;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            conn.execute_batch(migration.sql).await.map_err(|e| {
                DatabaseError::Migration(format!(
                    "Migration V{} ({}) failed: {e}",
                    migration.version, migration.name
                ))
            })?;
            seed_version(conn, migration.version, migration.name).await?;
        }
    }

    let version = get_current_version(conn).await?;
    tracing::info!(version, "Database migrations complete");

    Ok(())
}

/// Highest version known to this build.
pub fn latest_version() -> i64 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

/// Get the highest applied migration version, or 0 if none.
pub async fn get_current_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(|e| DatabaseError::Migration(format!("Failed to query migration version: {e}")))?;

    let row = rows
        .next()
        .await
        .map_err(|e| DatabaseError::Migration(format!("Failed to read migration version: {e}")))?;

    match row {
        Some(row) => {
            let version: i64 = row.get(0).map_err(|e| {
                DatabaseError::Migration(format!("Failed to parse migration version: {e}"))
            })?;
            Ok(version)
        }
        None => Ok(0),
    }
}

/// Insert a version record into `_migrations`.
async fn seed_version(conn: &Connection, version: i64, name: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT OR IGNORE INTO _migrations (version, name) VALUES (?1, ?2)",
        libsql::params![version, name],
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("Failed to record migration V{version}: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_conn() -> Connection {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .unwrap();
        db.connect().unwrap()
    }

    async fn table_exists(conn: &Connection, table: &str) -> bool {
        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                libsql::params![table],
            )
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let count: i64 = row.get(0).unwrap();
        count == 1
    }

    #[tokio::test]
    async fn migrations_create_all_tables() {
        let conn = test_conn().await;
        run_migrations(&conn).await.unwrap();

        for table in &["workers", "projects", "field_tables", "work_records", "_migrations"] {
            assert!(table_exists(&conn, table).await, "Table '{}' should exist", table);
        }
    }

    fn assert_send<T: Send>(_: &T) {}

    #[tokio::test]
    async fn migration_future_is_send() {
        let conn = test_conn().await;
        let fut = run_migrations(&conn);
        assert_send(&fut);
        fut.await.unwrap();
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let conn = test_conn().await;
        run_migrations(&conn).await.unwrap();
        run_migrations(&conn).await.unwrap();

        let version = get_current_version(&conn).await.unwrap();
        assert_eq!(version, latest_version());
        assert_eq!(version, 4);
    }

    #[tokio::test]
    async fn partially_migrated_db_catches_up() {
        let conn = test_conn().await;
        conn.execute(
            "CREATE TABLE _migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            (),
        )
        .await
        .unwrap();
        conn.execute_batch(MIGRATIONS[0].sql).await.unwrap();
        conn.execute_batch(MIGRATIONS[1].sql).await.unwrap();
        seed_version(&conn, 1, MIGRATIONS[0].name).await.unwrap();
        seed_version(&conn, 2, MIGRATIONS[1].name).await.unwrap();

        // A V2-era row must survive the column additions of V4.
        conn.execute(
            "INSERT INTO projects (name, created_at) VALUES ('Žatec', '2026-01-01T00:00:00Z')",
            (),
        )
        .await
        .unwrap();
        conn.execute(
            "INSERT INTO field_tables (project_id, table_number, created_at, updated_at) VALUES (1, '28.1', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
            (),
        )
        .await
        .unwrap();

        run_migrations(&conn).await.unwrap();
        assert_eq!(get_current_version(&conn).await.unwrap(), 4);

        let mut rows = conn
            .query("SELECT assigned_workers, completed_by IS NULL FROM field_tables", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let assigned: String = row.get(0).unwrap();
        assert_eq!(assigned, "[]");
        let completed_by_null: i64 = row.get(1).unwrap();
        assert_eq!(completed_by_null, 1);
    }

    #[tokio::test]
    async fn version_tracking() {
        let conn = test_conn().await;
        run_migrations(&conn).await.unwrap();

        let mut rows = conn
            .query("SELECT version, name FROM _migrations ORDER BY version", ())
            .await
            .unwrap();
        let mut seen = Vec::new();
        while let Some(row) = rows.next().await.unwrap() {
            let v: i64 = row.get(0).unwrap();
            let n: String = row.get(1).unwrap();
            seen.push((v, n));
        }
        assert_eq!(
            seen,
            vec![
                (1, "workers_and_projects".to_string()),
                (2, "field_tables".to_string()),
                (3, "work_records".to_string()),
                (4, "table_completion_credit".to_string()),
            ]
        );
    }
}
