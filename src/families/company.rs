//! Companies from the HR/ERP user-profile service.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::{CacheError, FamilyCache, Snapshot};
use crate::cache::{EntityCache, Family};
use crate::upstream::normalize::{flag, required, text};
use crate::upstream::{Endpoint, Entity, NormalizeError, RawRecord, SCOPE_SEGMENT, UpstreamClient};

const ALL_COMPANIES: &[&str] = &["companies"];
const USER_COMPANIES: &[&str] = &["user-profiles", SCOPE_SEGMENT, "companies"];

/// A company known to the HR/ERP system (transport companies, shipping
/// agents, consignees...).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: String,
    pub name: String,
    pub code: Option<String>,
    pub short_name: Option<String>,
    pub company_type: Option<String>,
    pub tax_code: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub active: Option<bool>,
}

impl Entity for Company {
    const FAMILY: Family = Family::Company;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_raw(raw: &mut RawRecord) -> Result<Self, NormalizeError> {
        Ok(Self {
            id: required(raw.take(&["id", "companyId", "company_id", "_id"]), "id")?,
            name: required(raw.take(&["name", "companyName", "company_name"]), "name")?,
            code: text(raw.take(&["code", "companyCode", "company_code"])),
            short_name: text(raw.take(&["shortName", "short_name", "abbreviation"])),
            company_type: text(raw.take(&["type", "companyType", "company_type"])),
            tax_code: text(raw.take(&["taxCode", "tax_code", "vatNumber"])),
            address: text(raw.take(&["address", "fullAddress"])),
            phone: text(raw.take(&["phone", "phoneNumber", "phone_number"])),
            email: text(raw.take(&["email", "mail"])),
            active: flag(raw.take(&["active", "isActive", "status"])),
        })
    }
}

/// Company orchestrator.
pub type CompanyDirectory = FamilyCache<Company>;

impl CompanyDirectory {
    /// Wire the directory to the HR/ERP client.
    pub fn connect(cache: EntityCache, client: UpstreamClient, ttl: Duration) -> Self {
        let endpoint = Endpoint::new(client, ALL_COMPANIES, Some(USER_COMPANIES));
        Self::new(cache, Arc::new(endpoint), ttl)
    }

    /// Companies linked to one user profile.
    pub async fn list_for_user(&self, profile_id: &str) -> Result<Snapshot<Arc<Vec<Company>>>, CacheError> {
        self.get_by_scope(profile_id).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::cache::Scope;
    use crate::families::testing::StubSource;
    use crate::upstream::normalize::normalize;

    #[test]
    fn test_normalize_accepts_erp_field_names() {
        let company: Company = normalize(json!({
            "companyId": 17,
            "companyName": " Saigon Trucking ",
            "companyType": "TRANSPORT",
            "isActive": 1
        }))
        .unwrap();

        assert_eq!(company.id, "17");
        assert_eq!(company.name, "Saigon Trucking");
        assert_eq!(company.company_type.as_deref(), Some("TRANSPORT"));
        assert_eq!(company.active, Some(true));
        assert_eq!(company.email, None);
    }

    #[test]
    fn test_normalize_requires_name() {
        let err = normalize::<Company>(json!({ "id": "C1", "name": "" })).unwrap_err();
        assert_eq!(err, NormalizeError::MissingField("name"));
    }

    #[tokio::test]
    async fn test_user_scope_is_cached_separately() {
        let source = StubSource::new();
        source.push(Ok(vec![json!({ "id": "C1", "name": "A" }), json!({ "id": "C2", "name": "B" })]));
        source.push(Ok(vec![json!({ "id": "C2", "name": "B" })]));

        let directory = CompanyDirectory::new(
            EntityCache::new(Duration::from_secs(5)),
            source.clone(),
            Duration::from_secs(900),
        );

        assert_eq!(directory.list_all().await.unwrap().data.len(), 2);
        let mine = directory.list_for_user("U42").await.unwrap();
        assert_eq!(mine.data.len(), 1);
        assert_eq!(mine.data[0].id, "C2");

        assert_eq!(source.scopes(), vec![Scope::All, Scope::Owner("U42".into())]);
        assert_eq!(directory.stats().entries.len(), 2);
    }
}
