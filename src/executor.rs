use std::{
    fs, io,
    path::{Path, PathBuf},
};
use same_file::is_same_file;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::plan::RenamePlanEntry;

/// Whether to open the folder in the system file browser once a batch is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reveal {
    Open,
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameFailure {
    pub source: String,
    pub reason: String,
}

/// Outcome of a batch. No failures means every entry was renamed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameReport {
    pub renamed: Vec<(String, String)>,
    pub failures: Vec<RenameFailure>,
}

impl RenameReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

fn commit(old: &Path, new: &Path) -> io::Result<()> {
    if old == new {
        return Ok(());
    }

    if new.symlink_metadata().is_ok() {
        // A case-only change may resolve to the source itself on
        // case-insensitive systems; any other existing file is kept.
        let same_name_ignoring_case = old
            .file_name()
            .zip(new.file_name())
            .and_then(|(a, b)| Some(a.to_str()?.to_lowercase() == b.to_str()?.to_lowercase()))
            .unwrap_or(false);
        let same_file = same_name_ignoring_case && is_same_file(old, new).unwrap_or(false);

        if !same_file {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "destination already exists",
            ));
        }
    }

    fs::rename(old, new)
}

/// Renames every entry of `plan` inside `folder`, in order.
///
/// A failing entry is recorded and the remaining entries are still attempted.
pub fn apply(folder: &Path, plan: &[RenamePlanEntry], reveal: Reveal) -> RenameReport {
    let mut report = RenameReport::default();

    for entry in plan {
        let old = folder.join(&entry.source);
        let new = folder.join(&entry.target);

        match commit(&old, &new) {
            Ok(()) => {
                debug!(source = %entry.source, target = %entry.target, "Renamed");
                report
                    .renamed
                    .push((entry.source.clone(), entry.target.clone()));
            }
            Err(e) => {
                warn!(source = %entry.source, target = %entry.target, error = %e, "Rename failed");
                report.failures.push(RenameFailure {
                    source: entry.source.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        folder = %folder.display(),
        renamed = report.renamed.len(),
        failed = report.failures.len(),
        "Batch finished"
    );

    if reveal == Reveal::Open {
        reveal_folder(folder);
    }

    report
}

/// Runs [`apply`] on the blocking pool; await the handle to get the report.
pub fn spawn_apply(
    folder: PathBuf,
    plan: Vec<RenamePlanEntry>,
    reveal: Reveal,
) -> JoinHandle<RenameReport> {
    tokio::task::spawn_blocking(move || apply(&folder, &plan, reveal))
}

fn reveal_folder(folder: &Path) {
    if let Err(e) = open::that_detached(folder) {
        debug!(folder = %folder.display(), error = %e, "Could not open folder");
    }
}
