//! # Records Module
//!
//! Turns a directory of photos into an ordered list of [`PhotoRecord`]s.
//!
//! Only files with a complete GPS coordinate are admitted; everything else
//! is silently skipped (a large share of real photo collections carries no
//! geotag at all). The output order - capture time ascending, untimed
//! records last, ties broken by name - is what the clusterer's greedy group
//! discovery depends on.

use crate::core::metadata::{self, GeoTag};
use crate::error::ScanError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Photo file extensions considered for renaming
const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

/// One geotagged photo moving through the rename pipeline.
///
/// Created by [`RecordBuilder`], enriched additively by each later stage.
/// No stage reassigns a field written by an earlier one; after renaming,
/// `source_path` holds the file's final location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoRecord {
    /// Current on-disk location; updated as renames happen
    pub source_path: PathBuf,
    /// Filename at discovery time, never changed
    pub original_name: String,
    /// Original capture date/time; absence is a common, valid state
    pub capture_time: Option<DateTime<Utc>>,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Free-text address from reverse geocoding (empty until resolved)
    pub address: String,
    /// Filesystem-safe place identifier (set once per location group)
    pub place_slug: String,
    /// Location group this record belongs to (creation-order index)
    pub location_group: usize,
    /// 1-based rank of the group among all groups
    pub location_sequence: usize,
    /// 0-based rank within the group, used to disambiguate filenames
    pub duplicate_index: usize,
    /// Planned filename; equals the on-disk name after renaming
    pub new_name: String,
}

impl PhotoRecord {
    fn new(path: PathBuf, tag: GeoTag) -> Self {
        let original_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            source_path: path,
            original_name,
            capture_time: tag.capture_time,
            latitude: tag.latitude,
            longitude: tag.longitude,
            address: String::new(),
            place_slug: String::new(),
            location_group: 0,
            location_sequence: 0,
            duplicate_index: 0,
            new_name: String::new(),
        }
    }

    /// Sort key shared by record building and within-group ordering:
    /// capture time ascending, records without one after all timed records.
    pub fn time_sort_key(&self) -> (DateTime<Utc>, &str) {
        (
            self.capture_time.unwrap_or(DateTime::<Utc>::MAX_UTC),
            self.original_name.as_str(),
        )
    }
}

/// Outcome of scanning a directory for geotagged photos
#[derive(Debug)]
pub struct ScanResult {
    /// Admitted records, in pipeline order
    pub records: Vec<PhotoRecord>,
    /// Photo files examined, including those without coordinates
    pub files_considered: usize,
}

/// Builds the ordered record set from an input directory
pub struct RecordBuilder;

impl RecordBuilder {
    /// Scan `input_dir` (non-recursive) and build records for every photo
    /// file carrying GPS coordinates.
    pub fn build(input_dir: &Path) -> Result<ScanResult, ScanError> {
        Self::build_with_progress(input_dir, |_, _| {})
    }

    /// Like [`RecordBuilder::build`] with a progress callback
    /// `(files_examined, current_file_name)`.
    pub fn build_with_progress<F>(input_dir: &Path, mut on_progress: F) -> Result<ScanResult, ScanError>
    where
        F: FnMut(usize, &str),
    {
        if !input_dir.exists() {
            return Err(ScanError::DirectoryNotFound {
                path: input_dir.to_path_buf(),
            });
        }
        if !input_dir.is_dir() {
            return Err(ScanError::NotADirectory {
                path: input_dir.to_path_buf(),
            });
        }

        // Deterministic discovery order before any metadata is read
        let mut files: Vec<PathBuf> = Vec::new();
        for entry in WalkDir::new(input_dir).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| ScanError::ReadDirectory {
                path: input_dir.to_path_buf(),
                source: e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("walk error")),
            })?;
            if entry.file_type().is_file() && Self::is_photo_file(entry.path()) {
                files.push(entry.into_path());
            }
        }

        let mut records = Vec::new();
        let files_considered = files.len();

        for (i, path) in files.into_iter().enumerate() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            on_progress(i + 1, &name);

            match metadata::extract_geotag(&path) {
                Some(tag) => records.push(PhotoRecord::new(path, tag)),
                None => {
                    // Not an error: untagged photos are simply left alone
                    debug!(path = %path.display(), "skipping photo without GPS coordinates");
                }
            }
        }

        records.sort_by(|a, b| a.time_sort_key().cmp(&b.time_sort_key()));

        Ok(ScanResult {
            records,
            files_considered,
        })
    }

    /// Check if a file's extension marks it as a photo
    pub fn is_photo_file(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| PHOTO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false)
    }
}
