//! Turns logged work into table completions.
//!
//! A work record either names its tables explicitly or carries a free-text
//! note; in the latter case the note is scanned with
//! [`parse_table_completion_patterns`]. The resulting tables of the record's
//! project are marked completed in a single store transaction.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Result, ValidationError};
use crate::model::{MAX_ASSIGNED_WORKERS, NewWorkRecord, WorkRecord};
use crate::parser::parse_table_completion_patterns;
use crate::store::Database;

/// Why a mentioned table was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No table with that number in the record's project.
    NotFound,
    AlreadyCompleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTable {
    pub table_number: String,
    pub reason: SkipReason,
}

/// Outcome of one completion batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompletionReport {
    /// Table numbers newly marked completed, in processing order.
    pub completed: Vec<String>,
    pub skipped: Vec<SkippedTable>,
}

impl CompletionReport {
    pub(crate) fn skip(&mut self, table_number: &str, reason: SkipReason) {
        self.skipped.push(SkippedTable {
            table_number: table_number.to_string(),
            reason,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty() && self.skipped.is_empty()
    }
}

/// Applies table completions derived from work records.
pub struct CompletionApplicator {
    db: Arc<dyn Database>,
    max_assigned: usize,
}

impl CompletionApplicator {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            db,
            max_assigned: MAX_ASSIGNED_WORKERS,
        }
    }

    /// Override how many workers a table may credit.
    pub fn with_max_assigned(mut self, max: usize) -> Self {
        self.max_assigned = max;
        self
    }

    /// Table numbers a record refers to: the explicit list if present,
    /// otherwise whatever the note mentions.
    pub fn table_numbers(record: &WorkRecord) -> Vec<String> {
        if !record.tables.is_empty() {
            let mut numbers: Vec<String> = Vec::with_capacity(record.tables.len());
            for t in &record.tables {
                if !numbers.contains(t) {
                    numbers.push(t.clone());
                }
            }
            return numbers;
        }
        parse_table_completion_patterns(&record.description)
    }

    /// Mark every table the record refers to as completed by its worker.
    pub async fn apply(&self, record: &WorkRecord) -> Result<CompletionReport> {
        let numbers = Self::table_numbers(record);
        if numbers.is_empty() {
            debug!(record = %record.id, "No tables referenced by work record");
            return Ok(CompletionReport::default());
        }

        let report = self
            .db
            .apply_table_completions(
                record.worker_id,
                record.project_id,
                &numbers,
                self.max_assigned,
            )
            .await?;

        info!(
            record = %record.id,
            worker_id = record.worker_id,
            project_id = record.project_id,
            completed = report.completed.len(),
            skipped = report.skipped.len(),
            "Table completions applied"
        );
        Ok(report)
    }

    /// Validate and persist a new work record, then apply its completions.
    ///
    /// The record is stored before the completion batch runs. If the batch
    /// fails it is rolled back on its own and the record stays, so the
    /// completions can be re-applied later with [`Self::apply`].
    pub async fn log_work(&self, new: NewWorkRecord) -> Result<(WorkRecord, CompletionReport)> {
        if new.end_time <= new.start_time {
            return Err(ValidationError::InvalidTimeRange {
                start: new.start_time.to_rfc3339(),
                end: new.end_time.to_rfc3339(),
            }
            .into());
        }
        if self.db.get_worker(new.worker_id).await?.is_none() {
            return Err(ValidationError::UnknownWorker(new.worker_id).into());
        }
        if self.db.get_project(new.project_id).await?.is_none() {
            return Err(ValidationError::UnknownProject(new.project_id).into());
        }

        let record = new.into_record();
        self.db.insert_work_record(&record).await?;
        let report = self.apply(&record).await?;
        Ok((record, report))
    }
}
