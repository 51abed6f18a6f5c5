//! CSV export of the photo index.

use crate::core::records::PhotoRecord;
use crate::error::ReportError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const CSV_HEADER: &str = "original_name,new_name,latitude,longitude,address,place_slug,\
location_group_id,location_sequence,duplicate_index,capture_datetime";

/// Write the photo index CSV to `path`, creating parent directories.
pub fn write_csv_file(records: &[PhotoRecord], path: &Path) -> Result<(), ReportError> {
    let report_err = |source| ReportError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(report_err)?;
        }
    }

    let file = File::create(path).map_err(report_err)?;
    let mut writer = BufWriter::new(file);
    write_csv(records, &mut writer).map_err(report_err)?;
    writer.flush().map_err(report_err)
}

/// Write the photo index CSV to any writer.
pub fn write_csv<W: Write>(records: &[PhotoRecord], mut writer: W) -> std::io::Result<()> {
    writeln!(writer, "{CSV_HEADER}")?;

    for record in records {
        let capture = record
            .capture_time
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();

        writeln!(
            writer,
            "{},{},{:.8},{:.8},{},{},{},{},{},{}",
            escape_field(&record.original_name),
            escape_field(&record.new_name),
            record.latitude,
            record.longitude,
            escape_field(&record.address),
            escape_field(&record.place_slug),
            record.location_group,
            record.location_sequence,
            record.duplicate_index,
            capture
        )?;
    }

    Ok(())
}

/// Quote a field when it contains a comma, quote or newline; embedded quotes
/// are doubled per RFC 4180. Addresses routinely contain commas.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    fn record(name: &str, new_name: &str, address: &str) -> PhotoRecord {
        PhotoRecord {
            source_path: PathBuf::from(format!("/photos/{name}")),
            original_name: name.to_string(),
            capture_time: Some(Utc.with_ymd_and_hms(2023, 6, 10, 14, 30, 0).unwrap()),
            latitude: 60.16990001,
            longitude: 24.93840002,
            address: address.to_string(),
            place_slug: "park".to_string(),
            location_group: 0,
            location_sequence: 1,
            duplicate_index: 0,
            new_name: new_name.to_string(),
        }
    }

    #[test]
    fn csv_has_header_and_one_row_per_record() {
        let records = vec![
            record("a.jpg", "Espoo_01_park.jpg", "Park"),
            record("b.jpg", "Espoo_01-1_park.jpg", "Park"),
        ];
        let mut buffer = Vec::new();
        write_csv(&records, &mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("original_name,new_name,latitude"));
        assert!(lines[1].starts_with("a.jpg,Espoo_01_park.jpg,60.16990001,24.93840002"));
        assert!(lines[1].ends_with("2023-06-10 14:30:00"));
    }

    #[test]
    fn address_with_commas_is_quoted() {
        let records = vec![record("a.jpg", "x.jpg", "Hatsinanpuisto, Leppävaara, Espoo")];
        let mut buffer = Vec::new();
        write_csv(&records, &mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("\"Hatsinanpuisto, Leppävaara, Espoo\""));
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        assert_eq!(escape_field(r#"The "Old" Market"#), r#""The ""Old"" Market""#);
        assert_eq!(escape_field("plain"), "plain");
    }

    #[test]
    fn missing_capture_time_is_empty_field() {
        let mut r = record("a.jpg", "x.jpg", "Park");
        r.capture_time = None;
        let mut buffer = Vec::new();
        write_csv(&[r], &mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert!(text.lines().nth(1).unwrap().ends_with(",0,"));
    }

    #[test]
    fn write_csv_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Data").join("index.csv");
        write_csv_file(&[record("a.jpg", "x.jpg", "Park")], &path).unwrap();
        assert!(path.exists());
    }
}
