//! # Reporter Module
//!
//! Writes the final record set as a CSV index.
//!
//! The index is the durable mapping between original and new filenames; if a
//! run is interrupted mid-rename, it is what lets a user trace which photo
//! ended up where.

mod export;

pub use export::{write_csv, write_csv_file};
