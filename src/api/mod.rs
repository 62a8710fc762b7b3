//! HTTP surface.
//!
//! - `error` - `ApiError` and its JSON rendering
//! - `response` - success envelope
//! - `routes` - handlers per resource

pub mod error;
pub mod response;
mod routes;

use std::sync::Arc;

use axum::Router;
use axum::extract::FromRef;
use axum::routing::{delete, get, post};

use crate::cache::{CacheRegistry, EntityCache};
use crate::database::models::{OrderStatus, ShippingLine};
use crate::database::{ContainerRepository, Database, DepotRepository, LookupRepository};
use crate::families::{Company, CompanyDirectory, Driver, DriverRoster, Location, LocationRegistry};

use routes::{cache, containers, depots, families, health, lookups};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Arc<Database>,

    /// Registry of the moka record caches.
    pub registry: CacheRegistry,

    /// Entity cache shared by the three upstream families.
    pub entities: EntityCache,

    pub companies: CompanyDirectory,
    pub drivers: DriverRoster,
    pub locations: LocationRegistry,

    pub containers: Arc<ContainerRepository>,
    pub depots: Arc<DepotRepository>,
    pub shipping_lines: Arc<LookupRepository<ShippingLine>>,
    pub order_statuses: Arc<LookupRepository<OrderStatus>>,
}

impl FromRef<AppState> for CompanyDirectory {
    fn from_ref(state: &AppState) -> Self {
        state.companies.clone()
    }
}

impl FromRef<AppState> for DriverRoster {
    fn from_ref(state: &AppState) -> Self {
        state.drivers.clone()
    }
}

impl FromRef<AppState> for LocationRegistry {
    fn from_ref(state: &AppState) -> Self {
        state.locations.clone()
    }
}

impl FromRef<AppState> for Arc<LookupRepository<ShippingLine>> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.shipping_lines)
    }
}

impl FromRef<AppState> for Arc<LookupRepository<OrderStatus>> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.order_statuses)
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        // Companies (HR/ERP)
        .route("/api/companies", get(families::list::<Company>))
        .route("/api/companies/refresh", post(families::refresh::<Company>))
        .route("/api/companies/:id", get(families::get::<Company>))
        .route("/api/users/:profile_id/companies", get(families::companies_for_user))
        // Drivers
        .route("/api/drivers", get(families::list::<Driver>))
        .route("/api/drivers/refresh", post(families::refresh::<Driver>))
        .route("/api/drivers/:id", get(families::get::<Driver>))
        .route(
            "/api/transport-companies/:company_id/drivers",
            get(families::drivers_for_company),
        )
        // Locations
        .route("/api/locations", get(families::list::<Location>))
        .route("/api/locations/refresh", post(families::refresh::<Location>))
        .route("/api/locations/:code", get(families::get::<Location>))
        // Cache
        .route("/api/cache", delete(cache::clear))
        .route("/api/cache/stats", get(cache::stats))
        .route("/api/cache/:family", delete(cache::invalidate))
        // Local records
        .route("/api/containers", get(containers::list).post(containers::create))
        .route(
            "/api/containers/:container_no",
            get(containers::get)
                .put(containers::replace)
                .delete(containers::delete),
        )
        .route("/api/depots", get(depots::list).post(depots::create))
        .route(
            "/api/depots/:code",
            get(depots::get).put(depots::replace).delete(depots::delete),
        )
        .route("/api/shipping-lines", get(lookups::list::<ShippingLine>))
        .route("/api/shipping-lines/:code", get(lookups::get::<ShippingLine>))
        .route("/api/order-statuses", get(lookups::list::<OrderStatus>))
        .route("/api/order-statuses/:code", get(lookups::get::<OrderStatus>))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::handler::Handler;

    use super::*;

    fn servable<H, T>(_: H)
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
    }

    #[test]
    fn test_shared_listings_are_servable() {
        servable(families::list::<Company>);
        servable(families::list::<Driver>);
        servable(families::list::<Location>);
        servable(families::refresh::<Location>);
        servable(families::companies_for_user);
        servable(families::drivers_for_company);
        servable(depots::list);
        servable(lookups::list::<ShippingLine>);
        servable(lookups::list::<OrderStatus>);
    }
}
