//! Tracking data model: workers, projects, field tables, and work records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default cap on how many workers are credited on one table.
pub const MAX_ASSIGNED_WORKERS: usize = 2;

/// A person doing field work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub id: i64,
    pub name: String,
    /// Display color as a hex string (e.g. `#ff8800`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initials: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Worker {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: None,
            initials: None,
            created_at: Utc::now(),
        }
    }

    /// Builder: set display color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Builder: set initials.
    pub fn with_initials(mut self, initials: impl Into<String>) -> Self {
        self.initials = Some(initials.into());
        self
    }
}

/// An installation site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            location: None,
            created_at: Utc::now(),
        }
    }

    /// Builder: set location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Lifecycle of a mounting table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    #[default]
    Pending,
    Completed,
    Defect,
}

impl TableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableStatus::Pending => "pending",
            TableStatus::Completed => "completed",
            TableStatus::Defect => "defect",
        }
    }
}

impl std::str::FromStr for TableStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TableStatus::Pending),
            "completed" => Ok(TableStatus::Completed),
            "defect" => Ok(TableStatus::Defect),
            other => Err(format!("unknown table status: {other}")),
        }
    }
}

/// A physical mounting structure in a solar field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldTable {
    pub id: i64,
    pub project_id: i64,
    /// Opaque code as written on site ("28.1", "IT42-5", "TABLE_001").
    pub table_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_size: Option<String>,
    #[serde(default)]
    pub status: TableStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<i64>,
    #[serde(default)]
    pub assigned_workers: Vec<i64>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl FieldTable {
    pub fn new(id: i64, project_id: i64, table_number: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            project_id,
            table_number: table_number.into(),
            table_size: None,
            status: TableStatus::Pending,
            completed_at: None,
            completed_by: None,
            assigned_workers: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder: set table size.
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.table_size = Some(size.into());
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == TableStatus::Completed
    }

    /// Apply a patch in place; unset patch fields leave the table untouched.
    pub fn apply(&mut self, patch: &FieldTablePatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(at) = patch.completed_at {
            self.completed_at = Some(at);
        }
        if let Some(by) = patch.completed_by {
            self.completed_by = Some(by);
        }
        if let Some(ref workers) = patch.assigned_workers {
            self.assigned_workers = workers.clone();
        }
        self.updated_at = Utc::now();
    }
}

/// Partial update of a [`FieldTable`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldTablePatch {
    pub status: Option<TableStatus>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<i64>,
    pub assigned_workers: Option<Vec<i64>>,
}

impl FieldTablePatch {
    /// Patch marking `table` finished by `worker_id` at `at`.
    ///
    /// The worker joins the assigned set unless already present or the set
    /// already holds `max_assigned` workers.
    pub fn completion(table: &FieldTable, worker_id: i64, at: DateTime<Utc>, max_assigned: usize) -> Self {
        Self {
            status: Some(TableStatus::Completed),
            completed_at: Some(at),
            completed_by: Some(worker_id),
            assigned_workers: Some(merge_assigned(&table.assigned_workers, worker_id, max_assigned)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.completed_at.is_none()
            && self.completed_by.is_none()
            && self.assigned_workers.is_none()
    }
}

/// Deduplicated worker set with `worker_id` appended while fewer than `max`
/// workers are assigned. Existing members are kept even above the cap.
pub fn merge_assigned(current: &[i64], worker_id: i64, max: usize) -> Vec<i64> {
    let mut merged: Vec<i64> = Vec::with_capacity(current.len() + 1);
    for &id in current {
        if !merged.contains(&id) {
            merged.push(id);
        }
    }
    if merged.len() < max && !merged.contains(&worker_id) {
        merged.push(worker_id);
    }
    merged
}

/// A logged block of work, with the worker's free-text note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkRecord {
    pub id: Uuid,
    pub worker_id: i64,
    pub project_id: i64,
    pub description: String,
    /// Tables picked explicitly; when empty the note is parsed instead.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i64,
    pub created_at: DateTime<Utc>,
}

/// Input for logging work; id and duration are derived.
#[derive(Debug, Clone)]
pub struct NewWorkRecord {
    pub worker_id: i64,
    pub project_id: i64,
    pub description: String,
    pub tables: Vec<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl NewWorkRecord {
    pub fn into_record(self) -> WorkRecord {
        let duration_minutes = (self.end_time - self.start_time).num_minutes();
        WorkRecord {
            id: Uuid::new_v4(),
            worker_id: self.worker_id,
            project_id: self.project_id,
            description: self.description,
            tables: self.tables,
            start_time: self.start_time,
            end_time: self.end_time,
            duration_minutes,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn merge_appends_new_worker() {
        assert_eq!(merge_assigned(&[1], 2, 2), vec![1, 2]);
    }

    #[test]
    fn merge_skips_duplicate() {
        assert_eq!(merge_assigned(&[1, 2], 1, 2), vec![1, 2]);
        assert_eq!(merge_assigned(&[3], 3, 2), vec![3]);
    }

    #[test]
    fn merge_respects_cap() {
        assert_eq!(merge_assigned(&[1, 2], 3, 2), vec![1, 2]);
        assert_eq!(merge_assigned(&[], 9, 2), vec![9]);
    }

    #[test]
    fn merge_keeps_members_above_cap() {
        assert_eq!(merge_assigned(&[1, 2, 3], 4, 2), vec![1, 2, 3]);
        assert_eq!(merge_assigned(&[1, 1, 2], 2, 2), vec![1, 2]);
    }

    #[test]
    fn merge_with_huge_cap_does_not_preallocate() {
        assert_eq!(merge_assigned(&[], 1, usize::MAX), vec![1]);
        assert_eq!(merge_assigned(&[1], 2, usize::MAX), vec![1, 2]);
    }

    #[test]
    fn completion_patch_marks_table_done() {
        let mut table = FieldTable::new(1, 10, "28.1");
        let at = Utc::now();
        let patch = FieldTablePatch::completion(&table, 5, at, MAX_ASSIGNED_WORKERS);
        table.apply(&patch);

        assert!(table.is_completed());
        assert_eq!(table.completed_by, Some(5));
        assert_eq!(table.completed_at, Some(at));
        assert_eq!(table.assigned_workers, vec![5]);
    }

    #[test]
    fn empty_patch_keeps_fields() {
        let mut table = FieldTable::new(1, 10, "A-1");
        table.assigned_workers = vec![4];
        let patch = FieldTablePatch::default();
        assert!(patch.is_empty());
        table.apply(&patch);
        assert_eq!(table.status, TableStatus::Pending);
        assert_eq!(table.assigned_workers, vec![4]);
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [TableStatus::Pending, TableStatus::Completed, TableStatus::Defect] {
            assert_eq!(status.as_str().parse::<TableStatus>().unwrap(), status);
        }
        assert!("done".parse::<TableStatus>().is_err());
    }

    #[test]
    fn new_record_derives_duration() {
        let start = Utc::now();
        let record = NewWorkRecord {
            worker_id: 1,
            project_id: 2,
            description: "hotový stůl 5".into(),
            tables: vec![],
            start_time: start,
            end_time: start + Duration::minutes(90),
        }
        .into_record();
        assert_eq!(record.duration_minutes, 90);
    }
}
