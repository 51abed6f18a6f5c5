//! # Core Module
//!
//! The GUI-agnostic rename engine.
//!
//! ## Modules
//! - `metadata` - Extracts GPS coordinates and capture time from EXIF
//! - `records` - Builds the ordered record set from a directory
//! - `cluster` - Groups records by location and fixes the rename order
//! - `geocode` - Resolves a place name and slug per location group
//! - `naming` - Plans collision-free filenames
//! - `renamer` - Executes renames without losing a photo
//! - `reporter` - Writes the CSV index
//! - `pipeline` - Orchestrates the full workflow

pub mod cluster;
pub mod geocode;
pub mod metadata;
pub mod naming;
pub mod pipeline;
pub mod records;
pub mod renamer;
pub mod reporter;

// Re-export commonly used types
pub use cluster::LocationClusterer;
pub use geocode::{NominatimGeocoder, NullGeocoder, PlaceResolver, ResolvedPlace, ReverseGeocoder};
pub use metadata::GeoTag;
pub use naming::NamePlanner;
pub use pipeline::{Pipeline, RenameOutcome};
pub use records::{PhotoRecord, RecordBuilder};
pub use renamer::AtomicRenamer;
