//! Configuration types.

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::model::MAX_ASSIGNED_WORKERS;

/// Upper bound accepted for `FIELD_TRACKER_MAX_ASSIGNED`.
const MAX_ASSIGNED_LIMIT: usize = 16;

/// Tracker configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// Directory backup files are written to.
    pub backup_dir: PathBuf,
    /// How many workers are credited on a completed table.
    pub max_assigned_workers: usize,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/field-tracker.db"),
            backup_dir: PathBuf::from("./data/backups"),
            max_assigned_workers: MAX_ASSIGNED_WORKERS,
            log_filter: "info".to_string(),
        }
    }
}

impl TrackerConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let max_assigned_workers = match get("FIELD_TRACKER_MAX_ASSIGNED") {
            Some(raw) => {
                let value: usize = raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
                    key: "FIELD_TRACKER_MAX_ASSIGNED".into(),
                    message: format!("{raw:?}: {e}"),
                })?;
                if !(1..=MAX_ASSIGNED_LIMIT).contains(&value) {
                    return Err(ConfigError::InvalidValue {
                        key: "FIELD_TRACKER_MAX_ASSIGNED".into(),
                        message: format!("{value} is outside 1..={MAX_ASSIGNED_LIMIT}"),
                    });
                }
                value
            }
            None => defaults.max_assigned_workers,
        };

        Ok(Self {
            db_path: get("FIELD_TRACKER_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            backup_dir: get("FIELD_TRACKER_BACKUP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.backup_dir),
            max_assigned_workers,
            log_filter: get("FIELD_TRACKER_LOG").unwrap_or(defaults.log_filter),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = TrackerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.db_path, PathBuf::from("./data/field-tracker.db"));
        assert_eq!(config.max_assigned_workers, 2);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn reads_overrides() {
        let config = TrackerConfig::from_lookup(lookup(&[
            ("FIELD_TRACKER_DB_PATH", "/tmp/ft.db"),
            ("FIELD_TRACKER_BACKUP_DIR", "/tmp/bak"),
            ("FIELD_TRACKER_MAX_ASSIGNED", " 3 "),
            ("FIELD_TRACKER_LOG", "field_tracker=debug"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/ft.db"));
        assert_eq!(config.backup_dir, PathBuf::from("/tmp/bak"));
        assert_eq!(config.max_assigned_workers, 3);
        assert_eq!(config.log_filter, "field_tracker=debug");
    }

    #[test]
    fn rejects_bad_number() {
        let err = TrackerConfig::from_lookup(lookup(&[("FIELD_TRACKER_MAX_ASSIGNED", "two")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn rejects_out_of_range_cap() {
        for raw in ["0", "17", "1000000000"] {
            let err = TrackerConfig::from_lookup(lookup(&[("FIELD_TRACKER_MAX_ASSIGNED", raw)]))
                .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { .. }), "{raw} accepted");
        }
        let config =
            TrackerConfig::from_lookup(lookup(&[("FIELD_TRACKER_MAX_ASSIGNED", "16")])).unwrap();
        assert_eq!(config.max_assigned_workers, 16);
    }
}
