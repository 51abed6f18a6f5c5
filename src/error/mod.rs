//! # Error Module
//!
//! Error types for the geotag renamer.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Fail soft at the edges** - missing EXIF data and geocoding failures
//!   are recovered locally and never reach these types; only filesystem
//!   problems are fatal

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum GeotagRenamerError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Rename error: {0}")]
    Rename(#[from] RenameError),

    #[error("Report generation error: {0}")]
    Report(#[from] ReportError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that occur while building photo records from a directory
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while renaming files
#[derive(Error, Debug)]
pub enum RenameError {
    #[error("Failed to create destination directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to rename {from} to {to}: {source}")]
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Copy verification failed for {path}: expected {expected} bytes, found {found}")]
    CopyVerification {
        path: PathBuf,
        expected: u64,
        found: u64,
    },
}

/// Errors that occur while writing the CSV index
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report to {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, GeotagRenamerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_error_includes_path() {
        let error = ScanError::DirectoryNotFound {
            path: PathBuf::from("/photos/vacation"),
        };
        let message = error.to_string();
        assert!(message.contains("/photos/vacation"));
    }

    #[test]
    fn rename_error_includes_both_paths() {
        let error = RenameError::RenameFailed {
            from: PathBuf::from("/photos/a.jpg"),
            to: PathBuf::from("/photos/b.jpg"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let message = error.to_string();
        assert!(message.contains("/photos/a.jpg"));
        assert!(message.contains("/photos/b.jpg"));
    }

    #[test]
    fn copy_verification_reports_sizes() {
        let error = RenameError::CopyVerification {
            path: PathBuf::from("/dest/photo.jpg"),
            expected: 1024,
            found: 512,
        };
        let message = error.to_string();
        assert!(message.contains("1024"));
        assert!(message.contains("512"));
    }
}
