//! Nominatim reverse-geocoding client.

use super::{slugify_place, ResolvedPlace, ReverseGeocoder, UNKNOWN_PLACE};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/reverse";
const DEFAULT_USER_AGENT: &str = "geotag-renamer/0.1 (contact: local-tool)";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Subset of the Nominatim `jsonv2` reverse response we care about
#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: AddressDetails,
}

#[derive(Debug, Default, Deserialize)]
struct AddressDetails {
    park: Option<String>,
    road: Option<String>,
    pedestrian: Option<String>,
    suburb: Option<String>,
    neighbourhood: Option<String>,
    city_district: Option<String>,
    city: Option<String>,
}

impl ReverseResponse {
    /// Pick the most specific usable place name: park beats road beats the
    /// broader district levels, with the feature's own name as last resort.
    fn place_candidate(&self) -> Option<&str> {
        [
            self.address.park.as_deref(),
            self.address.road.as_deref(),
            self.address.pedestrian.as_deref(),
            self.address.suburb.as_deref(),
            self.address.neighbourhood.as_deref(),
            self.address.city_district.as_deref(),
            self.address.city.as_deref(),
            self.name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .find(|candidate| !candidate.trim().is_empty())
    }
}

/// Reverse geocoder backed by the public Nominatim service
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    /// Build a client with the default User-Agent and timeout.
    pub fn new() -> Self {
        Self::with_options(DEFAULT_USER_AGENT, DEFAULT_TIMEOUT)
    }

    /// Build a client with an explicit User-Agent and request timeout.
    /// Nominatim's usage policy requires an identifying User-Agent.
    pub fn with_options(user_agent: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(user_agent.to_string())
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url: NOMINATIM_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint (self-hosted Nominatim,
    /// or a local test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request(&self, latitude: f64, longitude: f64) -> Option<ReverseResponse> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("format", "jsonv2".to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .ok()?
            .error_for_status()
            .ok()?;
        response.json::<ReverseResponse>().ok()
    }
}

impl Default for NominatimGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReverseGeocoder for NominatimGeocoder {
    fn resolve(&self, latitude: f64, longitude: f64) -> ResolvedPlace {
        let Some(body) = self.request(latitude, longitude) else {
            warn!(latitude, longitude, "reverse geocoding request failed");
            return ResolvedPlace::unknown();
        };

        let slug = body
            .place_candidate()
            .map(slugify_place)
            .unwrap_or_else(|| UNKNOWN_PLACE.to_string());

        ResolvedPlace {
            address: body.display_name,
            slug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ReverseResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn candidate_prefers_park_over_road() {
        let response = parse(
            r#"{
                "display_name": "Hatsinanpuisto, Leppävaara, Espoo, Finland",
                "address": {"park": "Hatsinanpuisto", "road": "Läkkisepänkuja", "city": "Espoo"}
            }"#,
        );
        assert_eq!(response.place_candidate(), Some("Hatsinanpuisto"));
    }

    #[test]
    fn candidate_falls_through_to_city() {
        let response = parse(
            r#"{"display_name": "Espoo, Finland", "address": {"city": "Espoo"}}"#,
        );
        assert_eq!(response.place_candidate(), Some("Espoo"));
    }

    #[test]
    fn candidate_uses_top_level_name_last() {
        let response = parse(
            r#"{"display_name": "Somewhere", "name": "Iso Omena", "address": {}}"#,
        );
        assert_eq!(response.place_candidate(), Some("Iso Omena"));
    }

    #[test]
    fn candidate_skips_empty_strings() {
        let response = parse(
            r#"{"display_name": "x", "address": {"park": "  ", "road": "Main Street"}}"#,
        );
        assert_eq!(response.place_candidate(), Some("Main Street"));
    }

    #[test]
    fn empty_response_has_no_candidate() {
        let response = parse(r#"{"display_name": ""}"#);
        assert_eq!(response.place_candidate(), None);
    }
}
