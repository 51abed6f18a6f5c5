//! # Metadata Module
//!
//! Extracts the geotag from a photo file's EXIF metadata.
//!
//! ## Extracted Fields
//! - GPS latitude/longitude (decimal degrees)
//! - Original capture date/time (DateTimeOriginal)
//!
//! ## Failure Model
//! Everything fails soft: a file without EXIF data, without a GPS IFD, or
//! with malformed values simply yields no geotag. Missing metadata is an
//! everyday state for photos, not an error.

use chrono::{DateTime, NaiveDateTime, Utc};
use exif::{Exif, In, Reader, Tag, Value};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Geotag extracted from a photo file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoTag {
    /// Latitude in decimal degrees (south negative)
    pub latitude: f64,
    /// Longitude in decimal degrees (west negative)
    pub longitude: f64,
    /// Original capture date/time, when present
    pub capture_time: Option<DateTime<Utc>>,
}

/// Extract the geotag from a photo file.
///
/// Returns `None` when the file has no readable EXIF container or no
/// complete GPS coordinate. A coordinate without a capture time is still a
/// valid geotag.
pub fn extract_geotag(path: &Path) -> Option<GeoTag> {
    let file = File::open(path).ok()?;
    let mut bufreader = BufReader::new(&file);
    let exif = Reader::new().read_from_container(&mut bufreader).ok()?;

    let (latitude, longitude) = extract_coordinates(&exif)?;
    let capture_time = extract_capture_time(&exif);

    Some(GeoTag {
        latitude,
        longitude,
        capture_time,
    })
}

fn extract_coordinates(exif: &Exif) -> Option<(f64, f64)> {
    let lat_dms = exif.get_field(Tag::GPSLatitude, In::PRIMARY)?;
    let lat_ref = exif.get_field(Tag::GPSLatitudeRef, In::PRIMARY)?;
    let lon_dms = exif.get_field(Tag::GPSLongitude, In::PRIMARY)?;
    let lon_ref = exif.get_field(Tag::GPSLongitudeRef, In::PRIMARY)?;

    let latitude = dms_to_decimal(&lat_dms.value, ref_is_negative(&lat_ref.value, b'S')?)?;
    let longitude = dms_to_decimal(&lon_dms.value, ref_is_negative(&lon_ref.value, b'W')?)?;
    Some((latitude, longitude))
}

fn extract_capture_time(exif: &Exif) -> Option<DateTime<Utc>> {
    let field = exif.get_field(Tag::DateTimeOriginal, In::PRIMARY)?;
    if let Value::Ascii(ref vec) = field.value {
        let bytes = vec.first()?;
        let s = std::str::from_utf8(bytes).ok()?;
        // EXIF date format: "YYYY:MM:DD HH:MM:SS", possibly NUL-terminated
        let trimmed = s.trim_end_matches('\0').trim();
        let naive = NaiveDateTime::parse_from_str(trimmed, "%Y:%m:%d %H:%M:%S").ok()?;
        return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
    }
    None
}

/// Convert a GPS degrees/minutes/seconds rational triple to decimal degrees.
fn dms_to_decimal(value: &Value, negative: bool) -> Option<f64> {
    if let Value::Rational(ref parts) = value {
        if parts.len() < 3 {
            return None;
        }
        let degrees = parts[0].to_f64();
        let minutes = parts[1].to_f64();
        let seconds = parts[2].to_f64();
        let mut decimal = degrees + minutes / 60.0 + seconds / 3600.0;
        if negative {
            decimal = -decimal;
        }
        return Some(decimal);
    }
    None
}

/// Check whether a GPS reference field ("N"/"S"/"E"/"W") marks the negative
/// hemisphere. `None` when the field is not a readable ASCII value.
fn ref_is_negative(value: &Value, negative_marker: u8) -> Option<bool> {
    if let Value::Ascii(ref vec) = value {
        let bytes = vec.first()?;
        let first = bytes.first()?;
        return Some(first.to_ascii_uppercase() == negative_marker);
    }
    None
}
