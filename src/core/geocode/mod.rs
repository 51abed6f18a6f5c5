//! # Geocode Module
//!
//! Reverse geocoding of location groups and place-slug derivation.
//!
//! One lookup is made per location group (the founding record's coordinate),
//! strictly one group at a time with a fixed delay between calls - Nominatim
//! asks for at most one request per second. Every failure mode, from network
//! timeouts to malformed bodies, collapses into the `unknown_place` fallback;
//! nothing here ever aborts a run.

mod nominatim;

pub use nominatim::NominatimGeocoder;

use crate::core::records::PhotoRecord;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Fallback slug when geocoding fails or yields nothing usable
pub const UNKNOWN_PLACE: &str = "unknown_place";

/// A resolved place: free-text address plus a filesystem-safe slug
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlace {
    pub address: String,
    pub slug: String,
}

impl ResolvedPlace {
    /// The "nothing found" value: empty address, `unknown_place` slug
    pub fn unknown() -> Self {
        Self {
            address: String::new(),
            slug: UNKNOWN_PLACE.to_string(),
        }
    }
}

/// Reverse-geocoding seam. Implementations must fail soft: any error is
/// reported as [`ResolvedPlace::unknown`], never as an `Err`.
pub trait ReverseGeocoder {
    fn resolve(&self, latitude: f64, longitude: f64) -> ResolvedPlace;

    /// Whether lookups hit a rate-limited remote service. Local
    /// implementations return `false` and skip the inter-lookup delay.
    fn throttled(&self) -> bool {
        true
    }
}

/// Geocoder for the `--no-geocode` path: every lookup is "unknown"
pub struct NullGeocoder;

impl ReverseGeocoder for NullGeocoder {
    fn resolve(&self, _latitude: f64, _longitude: f64) -> ResolvedPlace {
        ResolvedPlace::unknown()
    }

    fn throttled(&self) -> bool {
        false
    }
}

/// Turn a free-text place name into a filesystem-safe slug.
///
/// Lowercases, maps whitespace and anything outside Unicode letters, digits
/// and underscore to `_`, collapses runs of `_` and trims them from the
/// ends. An empty result falls back to `unknown_place`.
pub fn slugify_place(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut last_was_underscore = false;

    for c in text.trim().to_lowercase().chars() {
        let mapped = if c.is_alphanumeric() { Some(c) } else { None };
        match mapped {
            Some(keep) => {
                slug.push(keep);
                last_was_underscore = false;
            }
            None => {
                if !last_was_underscore && !slug.is_empty() {
                    slug.push('_');
                    last_was_underscore = true;
                }
            }
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }

    if slug.is_empty() {
        UNKNOWN_PLACE.to_string()
    } else {
        slug
    }
}

/// Attaches addresses and place slugs to every record, one lookup per group
pub struct PlaceResolver<'a> {
    geocoder: &'a dyn ReverseGeocoder,
    delay: Duration,
}

impl<'a> PlaceResolver<'a> {
    pub fn new(geocoder: &'a dyn ReverseGeocoder, delay: Duration) -> Self {
        Self { geocoder, delay }
    }

    /// Resolve every location group in ascending group order and copy the
    /// result to all members. Returns the number of groups that resolved to
    /// a real place. The progress callback receives
    /// `(groups_done, total_groups)` after each lookup.
    pub fn resolve_groups<F>(&self, records: &mut [PhotoRecord], mut on_progress: F) -> usize
    where
        F: FnMut(usize, usize),
    {
        let mut by_group: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, record) in records.iter().enumerate() {
            by_group.entry(record.location_group).or_default().push(i);
        }
        let total_groups = by_group.len();

        let mut resolved_count = 0;
        for (done, (group, members)) in by_group.into_iter().enumerate() {
            // Lookup uses the first member's coordinate only
            let first = members[0];
            let place = self
                .geocoder
                .resolve(records[first].latitude, records[first].longitude);

            if place.slug != UNKNOWN_PLACE {
                resolved_count += 1;
                debug!(group, slug = %place.slug, "resolved location group");
            } else {
                warn!(group, "reverse geocoding yielded no place, using fallback");
            }

            for index in members {
                // Copied by value so later overrides on one record leave
                // its siblings untouched
                records[index].address = place.address.clone();
                records[index].place_slug = place.slug.clone();
            }

            on_progress(done + 1, total_groups);

            if self.geocoder.throttled() && !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
        }

        resolved_count
    }
}
