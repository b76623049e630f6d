//! Batch manifest and an offline task vendor.
//!
//! The manifest is the vendor input file: a header line `id` followed by one
//! batch id per line. Submission outcomes go to `<manifest>.success` and
//! `<manifest>.failure` next to it.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::batcher::BatchSettings;
use crate::error::{Error, Result};
use crate::traits::{SubmissionRecord, TaskVendor, WorkItem};
use crate::types::BatchId;

const MANIFEST_HEADER: &str = "id";

pub fn write_manifest(path: &Path, ids: &[BatchId]) -> Result<()> {
    let mut out = String::from(MANIFEST_HEADER);
    out.push('\n');
    for id in ids {
        let _ = writeln!(out, "{id}");
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::write(path, out).map_err(|e| Error::io(path, e))
}

pub fn read_manifest(path: &Path) -> Result<Vec<BatchId>> {
    let raw = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let mut lines = raw.lines().map(str::trim).filter(|l| !l.is_empty());
    match lines.next() {
        Some(MANIFEST_HEADER) => {}
        other => {
            return Err(Error::Operation(format!(
                "manifest {} must start with '{}', found {:?}",
                path.display(),
                MANIFEST_HEADER,
                other
            )))
        }
    }
    lines
        .map(|l| l.parse::<BatchId>().map_err(|e| Error::Operation(format!("bad batch id '{l}' in {}: {e}", path.display()))))
        .collect()
}

/// One work item per manifest id, pointing at its rendered artifact.
pub fn work_items(ids: &[BatchId], settings: &BatchSettings) -> Vec<WorkItem> {
    ids.iter().map(|&batch_id| WorkItem { batch_id, artifact: settings.artifact_name(batch_id) }).collect()
}

/// Offline vendor: an item succeeds when its artifact exists on disk.
#[derive(Debug, Clone)]
pub struct ManifestVendor {
    artifact_dir: PathBuf,
    budget: f64,
}

impl ManifestVendor {
    pub fn new(artifact_dir: impl Into<PathBuf>, budget: f64) -> Self {
        Self { artifact_dir: artifact_dir.into(), budget }
    }
}

impl TaskVendor for ManifestVendor {
    fn balance(&self) -> anyhow::Result<f64> {
        Ok(self.budget)
    }

    fn submit_batch(&mut self, items: &[WorkItem]) -> anyhow::Result<Vec<SubmissionRecord>> {
        let records = items
            .iter()
            .map(|item| {
                if self.artifact_dir.join(&item.artifact).is_file() {
                    SubmissionRecord { success: true, batch_id: item.batch_id, reason: None }
                } else {
                    SubmissionRecord {
                        success: false,
                        batch_id: item.batch_id,
                        reason: Some(format!("artifact {} not found", item.artifact)),
                    }
                }
            })
            .collect();
        Ok(records)
    }
}

/// Writes `<manifest>.success` and `<manifest>.failure`; each only when it has entries.
pub fn write_submission_log(manifest: &Path, records: &[SubmissionRecord]) -> Result<(usize, usize)> {
    let mut success = String::new();
    let mut failure = String::new();
    for r in records {
        if r.success {
            let _ = writeln!(success, "{}", r.batch_id);
        } else {
            let _ = writeln!(failure, "{}\t{}", r.batch_id, r.reason.as_deref().unwrap_or("unknown"));
        }
    }
    let ok = records.iter().filter(|r| r.success).count();
    let failed = records.len() - ok;
    for (suffix, body, count) in [("success", success, ok), ("failure", failure, failed)] {
        if count == 0 { continue; }
        let path = with_suffix(manifest, suffix);
        fs::write(&path, body).map_err(|e| Error::io(&path, e))?;
    }
    info!("Submission log: {} succeeded, {} failed", ok, failed);
    Ok((ok, failed))
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

pub fn submit_all(vendor: &mut dyn TaskVendor, items: &[WorkItem]) -> anyhow::Result<Vec<SubmissionRecord>> {
    let balance = vendor.balance()?;
    if balance <= 0.0 {
        anyhow::bail!("insufficient vendor balance: {balance:.2}");
    }
    info!("Vendor balance {:.2}; submitting {} item(s)", balance, items.len());
    vendor.submit_batch(items)
}
