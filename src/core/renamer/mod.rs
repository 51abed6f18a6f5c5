//! # Renamer Module
//!
//! Executes planned renames without ever losing or overwriting a photo.
//!
//! Renaming in place is the dangerous case: record A's planned name may be
//! record B's current name. Instead of working out a move order, every
//! source is first parked under a fresh temporary name, and only when all
//! records hold temporary names are they renamed to their final ones. A
//! crash between the phases leaves files under temporary names; re-running
//! the tool recovers them, and the CSV index retains the mapping.
//!
//! Cross-directory renames go straight to the destination, with a
//! copy-verify-delete fallback for destinations on another filesystem.

use crate::core::records::PhotoRecord;
use crate::error::RenameError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Executes the planned renames for a batch of records
pub struct AtomicRenamer {
    destination_dir: PathBuf,
    dry_run: bool,
}

impl AtomicRenamer {
    pub fn new(destination_dir: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            destination_dir: destination_dir.into(),
            dry_run,
        }
    }

    /// Move every record's file to `destination_dir/new_name`, updating
    /// `source_path` along the way. In dry-run mode nothing is touched.
    pub fn execute(&self, records: &mut [PhotoRecord]) -> Result<(), RenameError> {
        self.execute_with_progress(records, |_, _, _| {})
    }

    /// Like [`AtomicRenamer::execute`] with a progress callback
    /// `(files_done, total_files, current_file_name)`.
    pub fn execute_with_progress<F>(
        &self,
        records: &mut [PhotoRecord],
        mut on_progress: F,
    ) -> Result<(), RenameError>
    where
        F: FnMut(usize, usize, &str),
    {
        if self.dry_run {
            info!(records = records.len(), "dry run, skipping renames");
            return Ok(());
        }
        if records.is_empty() {
            return Ok(());
        }

        fs::create_dir_all(&self.destination_dir).map_err(|e| RenameError::CreateDirectory {
            path: self.destination_dir.clone(),
            source: e,
        })?;

        let destination = normalize_dir(&self.destination_dir);
        let in_place = records.iter().all(|r| {
            r.source_path
                .parent()
                .map(|p| normalize_dir(p) == destination)
                .unwrap_or(false)
        });

        let total = records.len();
        if in_place {
            self.rename_in_place(records, &mut on_progress)?;
        } else {
            for (i, record) in records.iter_mut().enumerate() {
                let target = self.destination_dir.join(&record.new_name);
                move_file(&record.source_path, &target)?;
                record.source_path = target;
                on_progress(i + 1, total, &record.new_name);
            }
        }

        info!(records = total, in_place, "renamed photo batch");
        Ok(())
    }

    /// Two-phase shuffle: park everything under temporary names first, then
    /// rename to final names. No planned name can collide with a
    /// not-yet-moved source once phase one is complete.
    fn rename_in_place<F>(
        &self,
        records: &mut [PhotoRecord],
        on_progress: &mut F,
    ) -> Result<(), RenameError>
    where
        F: FnMut(usize, usize, &str),
    {
        let total = records.len();

        for record in records.iter_mut() {
            let temp = self.fresh_temp_path(&record.source_path);
            rename_file(&record.source_path, &temp)?;
            debug!(from = %record.original_name, to = %temp.display(), "parked under temporary name");
            record.source_path = temp;
        }

        for (i, record) in records.iter_mut().enumerate() {
            let target = self.destination_dir.join(&record.new_name);
            rename_file(&record.source_path, &target)?;
            record.source_path = target;
            on_progress(i + 1, total, &record.new_name);
        }

        Ok(())
    }

    /// A temporary name guaranteed not to exist in the destination yet.
    fn fresh_temp_path(&self, source: &Path) -> PathBuf {
        let extension = source
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();
        loop {
            let name = format!(".tmp_ren_{}{extension}", Uuid::new_v4().simple());
            let candidate = self.destination_dir.join(name);
            if !candidate.exists() {
                return candidate;
            }
        }
    }
}

fn rename_file(from: &Path, to: &Path) -> Result<(), RenameError> {
    fs::rename(from, to).map_err(|e| RenameError::RenameFailed {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source: e,
    })
}

/// Rename, falling back to copy + size verification + delete when the
/// destination is on a different filesystem.
fn move_file(from: &Path, to: &Path) -> Result<(), RenameError> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }

    let io_err = |source| RenameError::RenameFailed {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    let source_size = fs::metadata(from).map_err(io_err)?.len();
    fs::copy(from, to).map_err(io_err)?;

    let dest_size = fs::metadata(to).map_err(io_err)?.len();
    if dest_size != source_size {
        // Incomplete copy: remove it and keep the source untouched
        let _ = fs::remove_file(to);
        return Err(RenameError::CopyVerification {
            path: to.to_path_buf(),
            expected: source_size,
            found: dest_size,
        });
    }

    fs::remove_file(from).map_err(io_err)
}

/// Canonical form of a directory for identity comparison.
fn normalize_dir(dir: &Path) -> PathBuf {
    dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf())
}
