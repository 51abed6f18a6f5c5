//! # CLI Module
//!
//! Command-line interface for the geotag renamer.
//!
//! ## Usage
//! ```bash
//! # Rename photos in place and write the CSV index
//! geotag-rename rename ~/Photos/Leppävaara --prefix Leppävaara
//!
//! # Preview only
//! geotag-rename rename ~/Photos --prefix Espoo --dry-run
//!
//! # Move renamed photos to a different directory
//! geotag-rename rename ~/Photos --prefix Espoo --output-dir ~/Renamed
//!
//! # Skip the network entirely
//! geotag-rename rename ~/Photos --prefix Espoo --no-geocode
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use geotag_renamer::core::geocode::{slugify_place, NominatimGeocoder, NullGeocoder, ReverseGeocoder};
use geotag_renamer::core::pipeline::{Pipeline, RenameOutcome, StageProgress};
use geotag_renamer::core::reporter;
use geotag_renamer::error::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

/// Geotag Renamer - Stable location-based names for geotagged photos
#[derive(Parser, Debug)]
#[command(name = "geotag-rename")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rename geotagged photos by location and export a CSV index
    Rename {
        /// Directory that contains JPG/JPEG photos with GPS EXIF metadata
        input_dir: PathBuf,

        /// Where to write renamed photos (default: rename in place)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Filename prefix, e.g. a district name
        #[arg(short, long, default_value = "Photo")]
        prefix: String,

        /// Zero-padding for location sequence numbers
        #[arg(long, default_value = "2")]
        digits: usize,

        /// Distance threshold in meters to treat photos as the same location
        #[arg(long, default_value = "12.0")]
        same_spot_m: f64,

        /// CSV index output path
        #[arg(long, default_value = "photo_index.csv")]
        csv_out: PathBuf,

        /// Skip reverse geocoding (place slugs become unknown_place)
        #[arg(long)]
        no_geocode: bool,

        /// Delay in milliseconds between reverse geocoding requests
        #[arg(long, default_value = "1000")]
        geocode_delay_ms: u64,

        /// HTTP timeout in seconds for reverse geocoding requests
        #[arg(long, default_value = "20")]
        geocode_timeout_s: u64,

        /// User-Agent string for Nominatim requests
        #[arg(long, default_value = "geotag-renamer/0.1 (contact: local-tool)")]
        user_agent: String,

        /// Force this place name instead of geocoded ones
        #[arg(long)]
        place_name: Option<String>,

        /// Apply --place-name only to the first N photos
        #[arg(long)]
        place_name_first_n: Option<usize>,

        /// Compute names and CSV only, do not rename files
        #[arg(long)]
        dry_run: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    geotag_renamer::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Rename {
            input_dir,
            output_dir,
            prefix,
            digits,
            same_spot_m,
            csv_out,
            no_geocode,
            geocode_delay_ms,
            geocode_timeout_s,
            user_agent,
            place_name,
            place_name_first_n,
            dry_run,
            output,
        } => {
            let geocoder: Box<dyn ReverseGeocoder> = if no_geocode {
                Box::new(NullGeocoder)
            } else {
                Box::new(NominatimGeocoder::with_options(
                    &user_agent,
                    Duration::from_secs(geocode_timeout_s),
                ))
            };

            let mut builder = Pipeline::builder()
                .input_dir(&input_dir)
                .prefix(prefix)
                .digits(digits)
                .threshold_meters(same_spot_m)
                .geocode_delay(Duration::from_millis(geocode_delay_ms))
                .dry_run(dry_run)
                .geocoder(geocoder);

            if let Some(dir) = &output_dir {
                builder = builder.output_dir(dir);
            }
            if let Some(name) = &place_name {
                builder = builder.forced_slug(slugify_place(name));
            }
            if let Some(n) = place_name_first_n {
                builder = builder.forced_slug_first_n(n);
            }

            run_rename(builder.build(), &csv_out, no_geocode, output)
        }
    }
}

fn run_rename(
    pipeline: Pipeline,
    csv_out: &PathBuf,
    no_geocode: bool,
    output: OutputFormat,
) -> Result<()> {
    let term = Term::stderr();

    if matches!(output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("Geotag Renamer").bold().cyan(),
            style("v0.1.0").dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    // Progress bar for pretty output
    let progress = if matches!(output, OutputFormat::Pretty) {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let outcome = pipeline.run_with_progress(|stage| {
        if let Some(ref pb) = progress {
            match stage {
                StageProgress::Scanning(done, name) => {
                    pb.set_message(format!("scanning {name}"));
                    pb.set_length(done as u64);
                    pb.set_position(done as u64);
                }
                StageProgress::Geocoding(done, total) => {
                    pb.set_message("geocoding location groups");
                    pb.set_length(total as u64);
                    pb.set_position(done as u64);
                }
                StageProgress::Renaming(done, total, name) => {
                    pb.set_message(format!("renaming to {name}"));
                    pb.set_length(total as u64);
                    pb.set_position(done as u64);
                }
            }
        }
    })?;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    reporter::write_csv_file(&outcome.records, csv_out)?;

    match output {
        OutputFormat::Pretty => print_pretty_results(&term, &outcome, csv_out, no_geocode),
        OutputFormat::Json => print_json_results(&outcome, csv_out),
    }

    Ok(())
}

fn print_pretty_results(term: &Term, outcome: &RenameOutcome, csv_out: &PathBuf, no_geocode: bool) {
    for line in pretty_lines(outcome, csv_out, no_geocode) {
        term.write_line(&line).ok();
    }
}

fn pretty_lines(outcome: &RenameOutcome, csv_out: &PathBuf, no_geocode: bool) -> Vec<String> {
    let mut lines = vec![String::new()];

    if outcome.records.is_empty() {
        lines.push(format!(
            "{} {}",
            style("!").yellow().bold(),
            style("No JPG/JPEG files with GPS EXIF metadata found.").yellow()
        ));
        lines.push(format!(
            "  {} photo files considered, {} with GPS coordinates",
            style(outcome.files_considered).cyan(),
            style(0).cyan()
        ));
        return lines;
    }

    lines.push(format!("{} Rename Complete", style("✓").green().bold()));
    lines.push(String::new());

    lines.push(format!(
        "  {} photo files considered, {} with GPS coordinates",
        style(outcome.files_considered).cyan(),
        style(outcome.records.len()).cyan()
    ));

    lines.push(format!(
        "  {} location groups formed",
        style(outcome.groups_formed).cyan()
    ));

    if !no_geocode {
        lines.push(format!(
            "  {} of {} groups geocoded",
            style(outcome.groups_geocoded).cyan(),
            outcome.groups_formed
        ));
    }

    lines.push(format!(
        "  CSV index written to {}",
        style(csv_out.display()).yellow()
    ));

    lines.push(format!(
        "  {:.1}s elapsed",
        outcome.duration_ms as f64 / 1000.0
    ));

    lines.push(String::new());
    if outcome.dry_run {
        lines.push(format!(
            "{}",
            style("DRY RUN: no files were renamed. Re-run without --dry-run to apply.").yellow()
        ));
    }
    // The planned mapping is printed in dry-run mode too, it is the preview
    for record in &outcome.records {
        lines.push(format!(
            "  {} {} {}",
            style(&record.original_name).dim(),
            style("→").dim(),
            record.new_name
        ));
    }

    lines
}

fn print_json_results(outcome: &RenameOutcome, csv_out: &PathBuf) {
    let output = serde_json::json!({
        "files_considered": outcome.files_considered,
        "records": outcome.records,
        "groups_formed": outcome.groups_formed,
        "groups_geocoded": outcome.groups_geocoded,
        "dry_run": outcome.dry_run,
        "duration_ms": outcome.duration_ms,
        "csv_out": csv_out.display().to_string(),
    });

    println!("{}", serde_json::to_string_pretty(&output).unwrap());
}

#[cfg(test)]
mod tests {
    use super::*;
    use geotag_renamer::core::records::PhotoRecord;

    fn outcome_with(records: Vec<PhotoRecord>, files_considered: usize, dry_run: bool) -> RenameOutcome {
        RenameOutcome {
            groups_formed: records.len().min(1),
            groups_geocoded: 0,
            duration_ms: 120,
            records,
            files_considered,
            dry_run,
        }
    }

    fn record(original: &str, new_name: &str) -> PhotoRecord {
        PhotoRecord {
            source_path: PathBuf::from(format!("/photos/{original}")),
            original_name: original.to_string(),
            capture_time: None,
            latitude: 60.17,
            longitude: 24.93,
            address: String::new(),
            place_slug: "park".to_string(),
            location_group: 0,
            location_sequence: 1,
            duplicate_index: 0,
            new_name: new_name.to_string(),
        }
    }

    #[test]
    fn empty_scan_prints_a_warning_instead_of_a_summary() {
        let outcome = outcome_with(Vec::new(), 3, false);
        let lines = pretty_lines(&outcome, &PathBuf::from("out.csv"), false);

        assert!(lines.iter().any(|l| l.contains("No JPG/JPEG files with GPS EXIF metadata found")));
        assert!(!lines.iter().any(|l| l.contains("Rename Complete")));
    }

    #[test]
    fn dry_run_prints_the_planned_mapping() {
        let outcome = outcome_with(vec![record("a.jpg", "Espoo_01_park.jpg")], 1, true);
        let lines = pretty_lines(&outcome, &PathBuf::from("out.csv"), true);

        assert!(lines.iter().any(|l| l.contains("DRY RUN")));
        assert!(lines
            .iter()
            .any(|l| l.contains("a.jpg") && l.contains("→") && l.contains("Espoo_01_park.jpg")));
    }
}
