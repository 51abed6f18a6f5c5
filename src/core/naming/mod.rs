//! # Naming Module
//!
//! Derives each record's new filename and resolves collisions.
//!
//! Template: `<prefix>_<sequence>[-<duplicate>]_<slug><ext>`, the duplicate
//! suffix omitted at index 0, the extension lowercased from the source file.
//!
//! Collisions are checked against two explicit sets threaded through the
//! planning loop: names claimed earlier in this batch, and names of foreign
//! files already present in the destination directory (the batch's own
//! source files living there are exempt, so a photo never "collides" with
//! itself when renaming in place). A colliding name gets `_dup1`, `_dup2`,
//! ... appended to its stem until it is free. Planned names are unique
//! batch-wide by construction.

use crate::core::records::PhotoRecord;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default zero-padding width for sequence numbers
pub const DEFAULT_SEQUENCE_DIGITS: usize = 2;

/// Plans collision-free filenames for a batch of records
pub struct NamePlanner {
    prefix: String,
    digits: usize,
}

impl NamePlanner {
    pub fn new(prefix: impl Into<String>, digits: usize) -> Self {
        Self {
            prefix: prefix.into(),
            digits,
        }
    }

    /// Fill in `new_name` for every record, in batch order.
    ///
    /// `destination_dir` does not have to exist yet; a missing directory
    /// simply means there are no pre-existing names to avoid.
    pub fn plan(&self, records: &mut [PhotoRecord], destination_dir: &Path) {
        let reserved = reserved_names(records, destination_dir);
        let mut planned: HashSet<String> = HashSet::new();

        for record in records.iter_mut() {
            let extension = lowercase_extension(&record.source_path);
            let candidate = self.build_filename(record, &extension);

            let final_name = if planned.contains(&candidate) || reserved.contains(&candidate) {
                let resolved = resolve_collision(&candidate, &extension, &planned, &reserved);
                debug!(
                    original = %candidate,
                    resolved = %resolved,
                    "name collision resolved"
                );
                resolved
            } else {
                candidate
            };

            planned.insert(final_name.clone());
            record.new_name = final_name;
        }
    }

    fn build_filename(&self, record: &PhotoRecord, extension: &str) -> String {
        let mut base = format!(
            "{}_{:0width$}",
            self.prefix,
            record.location_sequence,
            width = self.digits
        );
        if record.duplicate_index > 0 {
            base = format!("{base}-{}", record.duplicate_index);
        }
        format!("{base}_{}{extension}", record.place_slug)
    }
}

/// Force a caller-chosen place slug onto every record, or onto the first
/// `first_n` records in batch order. Applied after geocoding; does not
/// trigger another lookup.
pub fn apply_slug_override(records: &mut [PhotoRecord], slug: &str, first_n: Option<usize>) {
    let limit = match first_n {
        Some(n) => n.min(records.len()),
        None => records.len(),
    };
    for record in records.iter_mut().take(limit) {
        record.place_slug = slug.to_string();
    }
}

/// Names already present in the destination directory, minus the batch's own
/// source files located there.
fn reserved_names(records: &[PhotoRecord], destination_dir: &Path) -> HashSet<String> {
    let destination = normalize_dir(destination_dir);

    let own_sources: HashSet<String> = records
        .iter()
        .filter(|r| {
            r.source_path
                .parent()
                .map(|p| normalize_dir(p) == destination)
                .unwrap_or(false)
        })
        .map(|r| r.original_name.clone())
        .collect();

    let Ok(entries) = std::fs::read_dir(destination_dir) else {
        return HashSet::new();
    };

    entries
        .flatten()
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| !own_sources.contains(name))
        .collect()
}

/// Append `_dupN` to the stem until the name is free in both sets.
fn resolve_collision(
    candidate: &str,
    extension: &str,
    planned: &HashSet<String>,
    reserved: &HashSet<String>,
) -> String {
    let stem = candidate
        .strip_suffix(extension)
        .unwrap_or(candidate);

    let mut n = 1;
    loop {
        let next = format!("{stem}_dup{n}{extension}");
        if !planned.contains(&next) && !reserved.contains(&next) {
            return next;
        }
        n += 1;
    }
}

/// Extension with leading dot, lowercased; empty for extension-less files.
fn lowercase_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// Canonical form of a directory for identity comparison; directories that
/// do not exist yet fall back to their lexical form.
fn normalize_dir(dir: &Path) -> PathBuf {
    dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf())
}
