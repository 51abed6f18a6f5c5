//! # Cluster Module
//!
//! Partitions photo records into location groups and fixes the rename order.
//!
//! ## Grouping
//! Greedy single pass over the records in builder order: each record joins
//! the first existing group whose reference point (the coordinate of the
//! group's founding record) lies within the distance threshold, or founds a
//! new group. The guarantee is therefore asymmetric: every member is within
//! the threshold of its group's reference point, but two members of the same
//! group can be up to twice the threshold apart. Downstream sequence numbers
//! depend on this exact behavior, so it must not be "fixed" into a mutual
//! clustering.
//!
//! ## Within-group ordering
//! Records with a capture time come first. Records whose filename still
//! carries a previous run's `_<seq>[-<dup>]_<place>` pattern (with a matching
//! sequence number) keep their old relative order, which makes re-running the
//! tool on an already-renamed directory idempotent. Everything else sorts
//! last by name.

use crate::core::records::PhotoRecord;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

/// Default distance threshold for treating two photos as the same spot
pub const DEFAULT_SAME_SPOT_METERS: f64 = 12.0;

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance in meters between two WGS84 coordinates.
pub fn haversine_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_METERS * c
}

/// Parse `<anything>_<seq>[-<dup>]_<place>` out of a filename stem left by a
/// previous run. Returns `(sequence, duplicate)` with duplicate defaulting
/// to 0 when the `-<dup>` part is absent.
pub fn parse_legacy_name(filename: &str) -> Option<(usize, usize)> {
    let stem = filename.rsplit_once('.').map(|(s, _)| s).unwrap_or(filename);
    let pattern = Regex::new(r"^.*_(\d+)(?:-(\d+))?_(.+)$").unwrap();
    let captures = pattern.captures(stem)?;
    let sequence: usize = captures.get(1)?.as_str().parse().ok()?;
    let duplicate: usize = captures
        .get(2)
        .map(|m| m.as_str().parse().ok())
        .unwrap_or(Some(0))?;
    Some((sequence, duplicate))
}

/// A group's reference point: the coordinate of its first record
#[derive(Debug, Clone, Copy)]
pub struct ReferencePoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Assigns location groups, sequence numbers and duplicate indices
pub struct LocationClusterer {
    threshold_meters: f64,
}

impl LocationClusterer {
    pub fn new(threshold_meters: f64) -> Self {
        Self { threshold_meters }
    }

    /// Cluster `records` in place. Records must already be in builder order;
    /// group discovery order (and so every sequence number) follows from it.
    /// Returns the reference points, indexed by group id.
    pub fn assign_groups(&self, records: &mut [PhotoRecord]) -> Vec<ReferencePoint> {
        let mut reference_points: Vec<ReferencePoint> = Vec::new();

        for record in records.iter_mut() {
            let matched = reference_points.iter().position(|point| {
                haversine_meters(
                    record.latitude,
                    record.longitude,
                    point.latitude,
                    point.longitude,
                ) <= self.threshold_meters
            });

            let group = match matched {
                Some(index) => index,
                None => {
                    reference_points.push(ReferencePoint {
                        latitude: record.latitude,
                        longitude: record.longitude,
                    });
                    reference_points.len() - 1
                }
            };
            record.location_group = group;
            // Groups are discovered in record order, so the creation rank
            // doubles as the 1-based sequence number
            record.location_sequence = group + 1;
        }

        debug!(
            groups = reference_points.len(),
            records = records.len(),
            "assigned location groups"
        );

        self.assign_duplicate_indices(records);
        reference_points
    }

    /// Decide `duplicate_index` inside every group.
    fn assign_duplicate_indices(&self, records: &mut [PhotoRecord]) {
        let mut by_group: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, record) in records.iter().enumerate() {
            by_group.entry(record.location_group).or_default().push(i);
        }

        for (_, member_indices) in by_group {
            let mut ordered = member_indices;
            ordered.sort_by_cached_key(|&i| within_group_sort_key(&records[i]));
            for (rank, index) in ordered.into_iter().enumerate() {
                records[index].duplicate_index = rank;
            }
        }
    }
}

impl Default for LocationClusterer {
    fn default() -> Self {
        Self::new(DEFAULT_SAME_SPOT_METERS)
    }
}

/// Three-tier ordering: timed records, then legacy-named records whose
/// embedded sequence matches the group, then the rest.
fn within_group_sort_key(record: &PhotoRecord) -> (u8, chrono::DateTime<chrono::Utc>, usize, String) {
    if let Some(time) = record.capture_time {
        return (0, time, 0, record.original_name.clone());
    }
    if let Some((sequence, duplicate)) = parse_legacy_name(&record.original_name) {
        if sequence == record.location_sequence {
            return (
                1,
                chrono::DateTime::<chrono::Utc>::MIN_UTC,
                duplicate,
                record.original_name.clone(),
            );
        }
    }
    (
        2,
        chrono::DateTime::<chrono::Utc>::MIN_UTC,
        0,
        record.original_name.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::records::PhotoRecord;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    fn record(name: &str, lat: f64, lon: f64, hour: Option<u32>) -> PhotoRecord {
        PhotoRecord {
            source_path: PathBuf::from(format!("/photos/{name}")),
            original_name: name.to_string(),
            capture_time: hour.map(|h| Utc.with_ymd_and_hms(2023, 6, 10, h, 0, 0).unwrap()),
            latitude: lat,
            longitude: lon,
            address: String::new(),
            place_slug: String::new(),
            location_group: 0,
            location_sequence: 0,
            duplicate_index: 0,
            new_name: String::new(),
        }
    }

    #[test]
    fn haversine_known_distance() {
        // Helsinki cathedral to Senate Square corner, roughly 100 m scale
        let d = haversine_meters(60.1699, 24.9384, 60.1699, 24.9385);
        assert!(d > 4.0 && d < 7.0, "expected ~5.5 m, got {d}");

        let far = haversine_meters(60.1699, 24.9384, 60.1800, 24.9500);
        assert!(far > 1_000.0 && far < 1_500.0, "expected ~1.3 km, got {far}");
    }

    #[test]
    fn haversine_zero_for_identical_points() {
        assert_eq!(haversine_meters(60.0, 24.0, 60.0, 24.0), 0.0);
    }

    #[test]
    fn nearby_photos_share_group_distant_photo_does_not() {
        // Two photos ~5 m apart and one ~1.3 km away
        let mut records = vec![
            record("a.jpg", 60.1699, 24.9384, Some(9)),
            record("b.jpg", 60.1699, 24.9385, Some(10)),
            record("c.jpg", 60.1800, 24.9500, Some(11)),
        ];
        let points = LocationClusterer::default().assign_groups(&mut records);

        assert_eq!(points.len(), 2);
        assert_eq!(records[0].location_sequence, 1);
        assert_eq!(records[1].location_sequence, 1);
        assert_eq!(records[2].location_sequence, 2);
        assert_eq!(records[0].duplicate_index, 0);
        assert_eq!(records[1].duplicate_index, 1);
        assert_eq!(records[2].duplicate_index, 0);
    }

    #[test]
    fn members_stay_within_threshold_of_reference_point() {
        let mut records = vec![
            record("a.jpg", 60.17000, 24.93840, Some(9)),
            record("b.jpg", 60.17005, 24.93840, Some(10)),
            record("c.jpg", 60.17010, 24.93840, Some(11)),
        ];
        let points = LocationClusterer::default().assign_groups(&mut records);

        for r in &records {
            let p = points[r.location_group];
            let d = haversine_meters(r.latitude, r.longitude, p.latitude, p.longitude);
            assert!(d <= DEFAULT_SAME_SPOT_METERS, "{} is {d} m from reference", r.original_name);
        }
    }

    #[test]
    fn chained_members_can_exceed_threshold_pairwise() {
        // b is ~8 m from a (the reference point), c is ~8 m from a on the
        // other side: all one group even though b and c are ~16 m apart.
        // 0.0001 deg latitude is about 11.1 m.
        let mut records = vec![
            record("a.jpg", 60.17000, 24.93840, Some(9)),
            record("b.jpg", 60.17007, 24.93840, Some(10)),
            record("c.jpg", 60.16993, 24.93840, Some(11)),
        ];
        let points = LocationClusterer::default().assign_groups(&mut records);

        assert_eq!(points.len(), 1);
        let pairwise = haversine_meters(
            records[1].latitude,
            records[1].longitude,
            records[2].latitude,
            records[2].longitude,
        );
        assert!(
            pairwise > DEFAULT_SAME_SPOT_METERS,
            "chain members expected further apart than the threshold, got {pairwise}"
        );
    }

    #[test]
    fn first_matching_group_wins_over_closer_later_group() {
        // Order-dependent greedy assignment: d is within threshold of both
        // group reference points, and joins the one created first.
        let mut records = vec![
            record("a.jpg", 60.17000, 24.93840, Some(9)),
            record("b.jpg", 60.17018, 24.93840, Some(10)), // ~20 m away, new group
            record("c.jpg", 60.17009, 24.93840, Some(11)), // within 12 m of both
        ];
        LocationClusterer::default().assign_groups(&mut records);

        assert_eq!(records[2].location_group, records[0].location_group);
    }

    #[test]
    fn duplicate_indices_are_contiguous_from_zero() {
        let mut records = vec![
            record("d.jpg", 60.17, 24.93, Some(12)),
            record("a.jpg", 60.17, 24.93, None),
            record("b.jpg", 60.17, 24.93, Some(9)),
            record("c.jpg", 60.17, 24.93, None),
        ];
        LocationClusterer::default().assign_groups(&mut records);

        let mut indices: Vec<usize> = records.iter().map(|r| r.duplicate_index).collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        // Timed records outrank untimed ones
        assert_eq!(
            records.iter().find(|r| r.original_name == "b.jpg").unwrap().duplicate_index,
            0
        );
        assert_eq!(
            records.iter().find(|r| r.original_name == "d.jpg").unwrap().duplicate_index,
            1
        );
    }

    #[test]
    fn parse_legacy_name_variants() {
        assert_eq!(parse_legacy_name("Espoo_03_keskuspuisto.jpg"), Some((3, 0)));
        assert_eq!(parse_legacy_name("Espoo_03-2_keskuspuisto.jpg"), Some((3, 2)));
        assert_eq!(parse_legacy_name("IMG_1234.jpg"), None);
        assert_eq!(parse_legacy_name("holiday.jpg"), None);
    }

    #[test]
    fn legacy_names_preserve_prior_order_when_untimed() {
        // Re-run scenario: capture times no longer present, filenames carry
        // the previous run's sequence and duplicate numbers.
        let mut records = vec![
            record("Espoo_01-2_park.jpg", 60.17, 24.93, None),
            record("Espoo_01_park.jpg", 60.17, 24.93, None),
            record("Espoo_01-1_park.jpg", 60.17, 24.93, None),
        ];
        LocationClusterer::default().assign_groups(&mut records);

        let by_index: Vec<&str> = {
            let mut pairs: Vec<(usize, &str)> = records
                .iter()
                .map(|r| (r.duplicate_index, r.original_name.as_str()))
                .collect();
            pairs.sort_unstable();
            pairs.into_iter().map(|(_, n)| n).collect()
        };
        assert_eq!(
            by_index,
            vec!["Espoo_01_park.jpg", "Espoo_01-1_park.jpg", "Espoo_01-2_park.jpg"]
        );
    }

    #[test]
    fn legacy_name_with_wrong_sequence_loses_priority() {
        let mut records = vec![
            record("Espoo_07_park.jpg", 60.17, 24.93, None), // sequence 7 != 1
            record("aaa.jpg", 60.17, 24.93, None),
            record("Espoo_01_park.jpg", 60.17, 24.93, None),
        ];
        LocationClusterer::default().assign_groups(&mut records);

        assert_eq!(
            records.iter().find(|r| r.original_name == "Espoo_01_park.jpg").unwrap().duplicate_index,
            0
        );
        // The mismatched legacy name falls into the final tier alongside
        // plain names, ordered by raw filename ('E' < 'a' in byte order)
        let wrong = records.iter().find(|r| r.original_name == "Espoo_07_park.jpg").unwrap();
        let plain = records.iter().find(|r| r.original_name == "aaa.jpg").unwrap();
        assert_eq!(wrong.duplicate_index, 1);
        assert_eq!(plain.duplicate_index, 2);
    }
}
