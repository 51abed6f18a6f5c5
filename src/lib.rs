//! # Geotag Renamer
//!
//! Assigns stable, human-readable names to geotagged photos by clustering
//! them into locations and renaming the files without ever losing one.
//!
//! ## Core Philosophy
//! - **Never lose a photo** - renames are planned collision-free and
//!   executed in two phases when shuffling a directory in place
//! - **Deterministic** - the same photos produce the same names, run after
//!   run, even once capture times only survive inside the files
//! - **Fail soft at the edges** - missing GPS tags and geocoding outages
//!   degrade the output, never abort the run
//!
//! ## Architecture
//! The library is split into a core engine (GUI-agnostic) and presentation
//! layers:
//! - `core` - The clustering and rename engine
//! - `error` - Error types
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;

// Re-export commonly used types at the crate root
pub use error::{GeotagRenamerError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point (CLI or GUI).
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
