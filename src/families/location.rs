//! Locations (ports, depots, inland terminals) from the location registry.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::warn;

use super::FamilyCache;
use crate::cache::{EntityCache, Family};
use crate::upstream::normalize::{number, required, text};
use crate::upstream::{Endpoint, Entity, NormalizeError, RawRecord, UpstreamClient};

const ALL_LOCATIONS: &[&str] = &["locations"];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub code: String,
    pub name: String,
    pub location_type: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Entity for Location {
    const FAMILY: Family = Family::Location;

    fn id(&self) -> &str {
        &self.code
    }

    /// UN/LOCODE-style codes are matched case-insensitively.
    fn matches_key(&self, key: &str) -> bool {
        self.code.eq_ignore_ascii_case(key.trim())
    }

    fn from_raw(raw: &mut RawRecord) -> Result<Self, NormalizeError> {
        let code = required(raw.take(&["code", "locationCode", "location_code", "unlocode"]), "code")?;
        let name = required(raw.take(&["name", "locationName", "location_name"]), "name")?;

        // Coordinates may come flat or nested under `coordinates`.
        let mut coordinates = raw.take_object(&["coordinates", "geo"]).unwrap_or_default();
        let latitude = raw
            .take(&["latitude", "lat"])
            .or_else(|| coordinates.take(&["latitude", "lat"]));
        let longitude = raw
            .take(&["longitude", "lng", "lon"])
            .or_else(|| coordinates.take(&["longitude", "lng", "lon"]));

        Ok(Self {
            name,
            location_type: text(raw.take(&["type", "locationType", "location_type"])),
            country: text(raw.take(&["country", "countryCode", "country_code"])),
            city: text(raw.take(&["city"])),
            address: text(raw.take(&["address"])),
            latitude: coordinate(&code, latitude, 90.0, "latitude"),
            longitude: coordinate(&code, longitude, 180.0, "longitude"),
            code: code.to_uppercase(),
        })
    }
}

/// An unusable coordinate is dropped; the location itself is kept.
fn coordinate(code: &str, value: Option<serde_json::Value>, limit: f64, field: &'static str) -> Option<f64> {
    let value = value?;
    match number(Some(value.clone())) {
        Some(n) if n.abs() <= limit => Some(n),
        _ => {
            warn!(code, field, %value, "Ignoring invalid coordinate");
            None
        }
    }
}

/// Location orchestrator. The registry has no owner-scoped listing.
pub type LocationRegistry = FamilyCache<Location>;

impl LocationRegistry {
    /// Wire the registry to the location service client.
    pub fn connect(cache: EntityCache, client: UpstreamClient, ttl: Duration) -> Self {
        let endpoint = Endpoint::new(client, ALL_LOCATIONS, None);
        Self::new(cache, Arc::new(endpoint), ttl)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::families::testing::StubSource;
    use crate::upstream::normalize::normalize;

    #[test]
    fn test_nested_coordinates() {
        let location: Location = normalize(json!({
            "locationCode": "vnsgn",
            "locationName": "Ho Chi Minh City",
            "coordinates": { "lat": "10.76", "lng": 106.66 }
        }))
        .unwrap();

        assert_eq!(location.code, "VNSGN");
        assert_eq!(location.latitude, Some(10.76));
        assert_eq!(location.longitude, Some(106.66));
    }

    #[test]
    fn test_invalid_coordinate_keeps_record() {
        let location: Location = normalize(json!({
            "code": "X",
            "name": "Y",
            "lat": 123.0,
            "lng": "east"
        }))
        .unwrap();

        assert_eq!(location.code, "X");
        assert_eq!(location.latitude, None);
        assert_eq!(location.longitude, None);
    }

    #[tokio::test]
    async fn test_get_by_code_is_case_insensitive() {
        let source = StubSource::new();
        source.push(Ok(vec![
            json!({ "code": "VNHPH", "name": "Hai Phong" }),
            json!({ "code": "VNSGN", "name": "Ho Chi Minh City" }),
        ]));
        let registry = LocationRegistry::new(
            EntityCache::new(Duration::from_secs(5)),
            source.clone(),
            Duration::from_secs(900),
        );

        let found = registry.get_by_key("vnsgn").await.unwrap();
        assert_eq!(found.data.map(|l| l.name), Some("Ho Chi Minh City".to_string()));
        assert_eq!(source.calls(), 1);
    }
}
