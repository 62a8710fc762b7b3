//! Drivers from the driver-management service.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::{CacheError, FamilyCache, Snapshot};
use crate::cache::{EntityCache, Family};
use crate::upstream::normalize::{required, text};
use crate::upstream::{Endpoint, Entity, NormalizeError, RawRecord, SCOPE_SEGMENT, UpstreamClient};

const ALL_DRIVERS: &[&str] = &["drivers"];
const COMPANY_DRIVERS: &[&str] = &["transport-companies", SCOPE_SEGMENT, "drivers"];

/// A truck driver. The owning transport company is referenced by id only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: String,
    pub name: String,
    pub transport_company_id: Option<String>,
    pub phone: Option<String>,
    pub id_number: Option<String>,
    pub license_number: Option<String>,
    pub license_class: Option<String>,
    pub license_expiry: Option<String>,
    pub vehicle_plate: Option<String>,
    pub status: Option<String>,
}

impl Entity for Driver {
    const FAMILY: Family = Family::Driver;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_raw(raw: &mut RawRecord) -> Result<Self, NormalizeError> {
        Ok(Self {
            id: required(raw.take(&["id", "driverId", "driver_id", "_id"]), "id")?,
            name: required(raw.take(&["name", "fullName", "full_name", "driverName"]), "name")?,
            transport_company_id: text(raw.take(&[
                "transportCompanyId",
                "transport_company_id",
                "companyId",
            ])),
            phone: text(raw.take(&["phone", "phoneNumber", "mobile"])),
            id_number: text(raw.take(&["idNumber", "id_number", "identityCard"])),
            license_number: text(raw.take(&["licenseNumber", "license_number", "licenseNo"])),
            license_class: text(raw.take(&["licenseClass", "license_class"])),
            license_expiry: text(raw.take(&["licenseExpiry", "license_expiry", "licenseExpiredDate"])),
            vehicle_plate: text(raw.take(&["vehiclePlate", "vehicle_plate", "truckNo", "plateNumber"])),
            status: text(raw.take(&["status"])),
        })
    }
}

/// Driver orchestrator.
pub type DriverRoster = FamilyCache<Driver>;

impl DriverRoster {
    /// Wire the roster to the driver-management client.
    pub fn connect(cache: EntityCache, client: UpstreamClient, ttl: Duration) -> Self {
        let endpoint = Endpoint::new(client, ALL_DRIVERS, Some(COMPANY_DRIVERS));
        Self::new(cache, Arc::new(endpoint), ttl)
    }

    /// Drivers employed by one transport company.
    pub async fn list_for_company(
        &self,
        transport_company_id: &str,
    ) -> Result<Snapshot<Arc<Vec<Driver>>>, CacheError> {
        self.get_by_scope(transport_company_id).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, Utc};
    use serde_json::{Value, json};

    use super::*;
    use crate::cache::ManualClock;
    use crate::families::testing::StubSource;
    use crate::upstream::FetchError;

    fn five_drivers_one_nameless() -> Vec<Value> {
        vec![
            json!({ "id": "D1", "name": "Nguyen Van A", "transportCompanyId": "C123" }),
            json!({ "id": "D2", "fullName": "Tran Van B", "transportCompanyId": "C123" }),
            json!({ "id": "D3", "transportCompanyId": "C123" }),
            json!({ "driverId": "D4", "name": "Le Van C", "truckNo": "51C-12345" }),
            json!({ "id": "D5", "name": "Pham Van D", "status": "ACTIVE" }),
        ]
    }

    fn roster(source: Arc<StubSource>, clock: &ManualClock) -> DriverRoster {
        let cache = EntityCache::with_clock(Duration::from_secs(5), Arc::new(clock.clone()));
        DriverRoster::new(cache, source, Duration::from_secs(300))
    }

    #[tokio::test]
    async fn test_company_drivers_lifecycle() {
        let clock = ManualClock::new(Utc::now());
        let source = StubSource::new();
        source.push(Ok(five_drivers_one_nameless()));
        source.push(Err(FetchError::Timeout));
        let roster = roster(source.clone(), &clock);

        // t=0: miss, one fetch, the nameless record is dropped.
        let first = roster.list_for_company("C123").await.unwrap();
        assert_eq!(first.data.len(), 4);
        assert!(!first.stale);
        let stats = roster.stats();
        assert_eq!(stats.entries.len(), 1);
        assert_eq!(stats.entries[0].age_seconds, 0);
        assert_eq!(stats.entries[0].size, 4);

        // t=200: still fresh, no new fetch.
        clock.advance(TimeDelta::seconds(200));
        let second = roster.list_for_company("C123").await.unwrap();
        assert_eq!(source.calls(), 1);
        assert_eq!(second.data, first.data);

        // t=400: stale, upstream fails, old snapshot is served.
        clock.advance(TimeDelta::seconds(200));
        let third = roster.list_for_company("C123").await.unwrap();
        assert_eq!(source.calls(), 2);
        assert!(third.stale);
        assert_eq!(third.data, first.data);
    }

    #[tokio::test]
    async fn test_list_all_is_idempotent_within_ttl() {
        let clock = ManualClock::new(Utc::now());
        let source = StubSource::new();
        source.push(Ok(five_drivers_one_nameless()));
        let roster = roster(source.clone(), &clock);

        let a = roster.list_all().await.unwrap();
        let b = roster.list_all().await.unwrap();

        assert_eq!(a.data, b.data);
        let ids: Vec<&str> = a.data.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["D1", "D2", "D4", "D5"]);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_get_by_key_filters_the_global_list() {
        let clock = ManualClock::new(Utc::now());
        let source = StubSource::new();
        source.push(Ok(five_drivers_one_nameless()));
        let roster = roster(source.clone(), &clock);

        let found = roster.get_by_key("D4").await.unwrap();
        assert_eq!(found.data.unwrap().vehicle_plate.as_deref(), Some("51C-12345"));

        let missing = roster.get_by_key("D3").await.unwrap();
        assert!(missing.data.is_none());

        assert_eq!(source.calls(), 1);
        assert_eq!(roster.stats().entries.len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_failure_is_reported() {
        let clock = ManualClock::new(Utc::now());
        let source = StubSource::new();
        source.push(Ok(five_drivers_one_nameless()));
        source.push(Err(FetchError::Http { status: 503, body: String::new() }));
        let roster = roster(source.clone(), &clock);

        roster.list_all().await.unwrap();
        clock.advance(TimeDelta::seconds(400));

        let err = roster.refresh(None).await.unwrap_err();
        assert!(matches!(err, CacheError::Fetch(FetchError::Http { status: 503, .. })));

        // The old snapshot is still there.
        source.push(Err(FetchError::Timeout));
        let served = roster.list_all().await.unwrap();
        assert!(served.stale);
        assert_eq!(served.data.len(), 4);
    }
}
