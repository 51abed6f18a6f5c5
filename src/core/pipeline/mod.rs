//! # Pipeline Module
//!
//! Orchestrates the full rename workflow.
//!
//! ## Pipeline Stages
//! 1. **Build records** - Scan the input directory, keep geotagged photos
//! 2. **Cluster** - Assign location groups, sequences, duplicate indices
//! 3. **Resolve places** - One reverse-geocoding lookup per group
//! 4. **Plan names** - Template plus collision-free `_dupN` resolution
//! 5. **Rename** - Two-phase in place, or straight moves across directories
//!
//! The pipeline is deliberately sequential: the bottleneck is the
//! rate-limited geocoding service, not CPU.

mod executor;

pub use executor::{Pipeline, PipelineBuilder, RenameOutcome, StageProgress};
