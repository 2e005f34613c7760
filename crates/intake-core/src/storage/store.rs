//! Time-partitioned record store.
//!
//! One file per live record at `<root>/<YYYY>/<MM>/<run_id>.json`. Duplicate
//! run_ids are resolved so that only the chronologically newest submission
//! survives, wherever in the partition tree the older copies were filed.

use crate::errors::StoreError;
use crate::record::get_str;
use crate::timestamp;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

pub struct Store {
    root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreReport {
    pub success: bool,
    /// Path relative to the store root's parent, for stable report output.
    pub file_path: String,
    pub absolute_path: String,
    pub run_id: String,
    pub partition_year: i32,
    pub partition_month: u32,
    pub duplicate_removed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed_file: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a validated record envelope into its partition, resolving any
    /// duplicates by submission timestamp. Stale incoming records are
    /// rejected without touching the store; write failures leave the store
    /// in its pre-write state.
    pub fn store(&self, envelope: &Value) -> Result<StoreReport, StoreError> {
        let run_id = required_str(envelope, "result_data.run_identity.run_id")?;
        let submitted = required_str(envelope, "result_data.submission.submitted_timestamp")?;

        let incoming = timestamp::parse_utc(&submitted).map_err(|e| {
            StoreError::TimestampUnparseable {
                timestamp: submitted.clone(),
                detail: e.to_string(),
            }
        })?;
        let (year, month) = (incoming.year(), incoming.month());

        let duplicates = self.find_duplicates(&run_id);
        if let Some((path, existing, existing_ts)) = newest_existing(&duplicates) {
            if existing > incoming {
                return Err(StoreError::StaleSubmission {
                    run_id,
                    incoming_timestamp: submitted,
                    existing_timestamp: existing_ts,
                    existing_file: path.display().to_string(),
                });
            }
        }

        // The incoming record supersedes every existing copy. Removal
        // failures are warnings; the new write still proceeds.
        let mut warnings = Vec::new();
        let mut removed_file = None;
        for path in &duplicates {
            match fs::remove_file(path) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), run_id = %run_id, "removed stale duplicate");
                    if removed_file.is_none() {
                        removed_file = Some(path.display().to_string());
                    }
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to remove duplicate file");
                    warnings.push(format!(
                        "Failed to remove duplicate file {}: {}",
                        path.display(),
                        e
                    ));
                }
            }
        }

        let partition_dir = self.root.join(year.to_string()).join(format!("{:02}", month));
        fs::create_dir_all(&partition_dir).map_err(|e| StoreError::StorageIo {
            path: partition_dir.display().to_string(),
            detail: format!("failed to create partition directory: {}", e),
        })?;

        let dest = partition_dir.join(format!("{}.json", run_id));
        let payload =
            serde_json::to_string_pretty(envelope).map_err(|e| StoreError::StorageIo {
                path: dest.display().to_string(),
                detail: format!("failed to serialize record: {}", e),
            })?;

        // Commit via temp file + rename so a failed write never leaves a
        // partial record behind.
        let tmp = partition_dir.join(format!(".{}.json.tmp", run_id));
        if let Err(e) = fs::write(&tmp, &payload) {
            let _ = fs::remove_file(&tmp);
            return Err(StoreError::StorageIo {
                path: tmp.display().to_string(),
                detail: format!("failed to write record: {}", e),
            });
        }
        if let Err(e) = fs::rename(&tmp, &dest) {
            let _ = fs::remove_file(&tmp);
            return Err(StoreError::StorageIo {
                path: dest.display().to_string(),
                detail: format!("failed to commit record: {}", e),
            });
        }

        let absolute_path = fs::canonicalize(&dest)
            .unwrap_or_else(|_| dest.clone())
            .display()
            .to_string();
        let file_path = self
            .root
            .parent()
            .and_then(|parent| dest.strip_prefix(parent).ok())
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| dest.display().to_string());

        tracing::debug!(path = %absolute_path, run_id = %run_id, "stored record");

        Ok(StoreReport {
            success: true,
            file_path,
            absolute_path,
            run_id,
            partition_year: year,
            partition_month: month,
            duplicate_removed: removed_file.is_some(),
            removed_file,
            warnings,
        })
    }

    /// Exhaustive, partition-agnostic scan for `<run_id>.json` anywhere under
    /// the root. Tolerates historical misfilings into the wrong partition.
    pub fn find_duplicates(&self, run_id: &str) -> Vec<PathBuf> {
        let mut found = Vec::new();
        let target = format!("{}.json", run_id);
        let Ok(years) = fs::read_dir(&self.root) else {
            return found;
        };
        for year in years.flatten() {
            let year_path = year.path();
            if !year_path.is_dir() {
                continue;
            }
            let Ok(months) = fs::read_dir(&year_path) else {
                continue;
            };
            for month in months.flatten() {
                let month_path = month.path();
                if !month_path.is_dir() {
                    continue;
                }
                let candidate = month_path.join(&target);
                if candidate.is_file() {
                    found.push(candidate);
                }
            }
        }
        found.sort();
        found
    }
}

fn required_str(envelope: &Value, path: &str) -> Result<String, StoreError> {
    get_str(envelope, path)
        .map(str::to_string)
        .ok_or_else(|| StoreError::MissingField {
            field_path: path.to_string(),
        })
}

/// The latest submission timestamp among existing duplicates. Files that
/// cannot be read or parsed count as older and are skipped.
fn newest_existing(paths: &[PathBuf]) -> Option<(PathBuf, DateTime<Utc>, String)> {
    let mut newest: Option<(PathBuf, DateTime<Utc>, String)> = None;
    for path in paths {
        let Some((ts, dt)) = read_submitted_timestamp(path) else {
            continue;
        };
        if newest.as_ref().map_or(true, |(_, best, _)| dt > *best) {
            newest = Some((path.clone(), dt, ts));
        }
    }
    newest
}

fn read_submitted_timestamp(path: &Path) -> Option<(String, DateTime<Utc>)> {
    let raw = fs::read_to_string(path).ok()?;
    let envelope: Value = serde_json::from_str(&raw).ok()?;
    let ts = get_str(&envelope, "result_data.submission.submitted_timestamp")?;
    let dt = timestamp::parse_utc(ts).ok()?;
    Some((ts.to_string(), dt))
}
