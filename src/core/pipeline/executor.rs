//! Pipeline execution implementation.

use crate::core::cluster::{LocationClusterer, DEFAULT_SAME_SPOT_METERS};
use crate::core::geocode::{NullGeocoder, PlaceResolver, ReverseGeocoder};
use crate::core::naming::{apply_slug_override, NamePlanner, DEFAULT_SEQUENCE_DIGITS};
use crate::core::records::{PhotoRecord, RecordBuilder};
use crate::core::renamer::AtomicRenamer;
use crate::error::GeotagRenamerError;
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

/// Progress notifications emitted while the pipeline runs
#[derive(Debug, Clone)]
pub enum StageProgress {
    /// Scanning photo files: (files examined, current file name)
    Scanning(usize, String),
    /// Geocoding groups: (groups done, total groups)
    Geocoding(usize, usize),
    /// Renaming files: (files done, total files, current new name)
    Renaming(usize, usize, String),
}

/// Result of a full pipeline run
#[derive(Debug, Serialize)]
pub struct RenameOutcome {
    /// Final records with every field populated, in pipeline order
    pub records: Vec<PhotoRecord>,
    /// Photo files examined, including those without coordinates
    pub files_considered: usize,
    /// Location groups formed
    pub groups_formed: usize,
    /// Groups whose reverse-geocoding lookup produced a real place
    pub groups_geocoded: usize,
    /// Whether the filesystem was left untouched
    pub dry_run: bool,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Configuration for the rename pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory containing the photos to rename
    pub input_dir: PathBuf,
    /// Where renamed photos go; `None` renames in place
    pub output_dir: Option<PathBuf>,
    /// Filename prefix, e.g. a district name
    pub prefix: String,
    /// Zero-padding width for sequence numbers
    pub digits: usize,
    /// Distance threshold in meters for same-spot grouping
    pub threshold_meters: f64,
    /// Delay after each geocoding lookup
    pub geocode_delay: Duration,
    /// Forced place slug, replacing geocoded slugs
    pub forced_slug: Option<String>,
    /// Apply the forced slug only to the first N records
    pub forced_slug_first_n: Option<usize>,
    /// Compute names without touching the filesystem
    pub dry_run: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::new(),
            output_dir: None,
            prefix: "Photo".to_string(),
            digits: DEFAULT_SEQUENCE_DIGITS,
            threshold_meters: DEFAULT_SAME_SPOT_METERS,
            geocode_delay: Duration::from_secs(1),
            forced_slug: None,
            forced_slug_first_n: None,
            dry_run: false,
        }
    }
}

/// Builder for the rename pipeline
pub struct PipelineBuilder {
    config: PipelineConfig,
    geocoder: Option<Box<dyn ReverseGeocoder>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            geocoder: None,
        }
    }

    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = Some(dir.into());
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.prefix = prefix.into();
        self
    }

    pub fn digits(mut self, digits: usize) -> Self {
        self.config.digits = digits;
        self
    }

    pub fn threshold_meters(mut self, meters: f64) -> Self {
        self.config.threshold_meters = meters;
        self
    }

    pub fn geocode_delay(mut self, delay: Duration) -> Self {
        self.config.geocode_delay = delay;
        self
    }

    pub fn forced_slug(mut self, slug: impl Into<String>) -> Self {
        self.config.forced_slug = Some(slug.into());
        self
    }

    pub fn forced_slug_first_n(mut self, n: usize) -> Self {
        self.config.forced_slug_first_n = Some(n);
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.dry_run = dry_run;
        self
    }

    /// Set the reverse geocoder. Defaults to [`NullGeocoder`]; the CLI
    /// passes a Nominatim client unless `--no-geocode` is given.
    pub fn geocoder(mut self, geocoder: Box<dyn ReverseGeocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            config: self.config,
            geocoder: self.geocoder.unwrap_or_else(|| Box::new(NullGeocoder)),
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The rename pipeline
pub struct Pipeline {
    config: PipelineConfig,
    geocoder: Box<dyn ReverseGeocoder>,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Run the pipeline without progress reporting.
    pub fn run(&self) -> Result<RenameOutcome, GeotagRenamerError> {
        self.run_with_progress(|_| {})
    }

    /// Run the full pipeline, reporting progress through the callback.
    pub fn run_with_progress<F>(&self, mut on_progress: F) -> Result<RenameOutcome, GeotagRenamerError>
    where
        F: FnMut(StageProgress),
    {
        let start = Instant::now();
        let destination = self
            .config
            .output_dir
            .clone()
            .unwrap_or_else(|| self.config.input_dir.clone());

        // Stage 1: build records
        let scan = RecordBuilder::build_with_progress(&self.config.input_dir, |done, name| {
            on_progress(StageProgress::Scanning(done, name.to_string()));
        })?;
        let mut records = scan.records;
        info!(
            admitted = records.len(),
            considered = scan.files_considered,
            "built photo records"
        );

        // Stage 2: cluster into location groups
        let clusterer = LocationClusterer::new(self.config.threshold_meters);
        let reference_points = clusterer.assign_groups(&mut records);
        let groups_formed = reference_points.len();

        // Stage 3: resolve places, one lookup per group
        let resolver = PlaceResolver::new(self.geocoder.as_ref(), self.config.geocode_delay);
        let groups_geocoded = resolver.resolve_groups(&mut records, |done, total| {
            on_progress(StageProgress::Geocoding(done, total));
        });

        // Caller-forced slug replaces the geocoded one, no second lookup
        if let Some(slug) = &self.config.forced_slug {
            apply_slug_override(&mut records, slug, self.config.forced_slug_first_n);
        }

        // Stage 4: plan collision-free names
        let planner = NamePlanner::new(&self.config.prefix, self.config.digits);
        planner.plan(&mut records, &destination);

        // Stage 5: rename
        let renamer = AtomicRenamer::new(&destination, self.config.dry_run);
        renamer.execute_with_progress(&mut records, |done, total, name| {
            on_progress(StageProgress::Renaming(done, total, name.to_string()));
        })?;

        Ok(RenameOutcome {
            records,
            files_considered: scan.files_considered,
            groups_formed,
            groups_geocoded,
            dry_run: self.config.dry_run,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}
