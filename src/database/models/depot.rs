//! Depot records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A container depot / yard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Depot {
    pub code: String,
    pub name: String,

    #[serde(default)]
    pub address: Option<String>,

    /// Code of the matching entry in the location registry.
    #[serde(default)]
    pub location_code: Option<String>,

    /// Yard capacity in TEU.
    #[serde(default)]
    pub capacity_teu: Option<u32>,

    #[serde(default = "default_active")]
    pub active: bool,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

/// Body of create/replace requests.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepotInput {
    #[serde(default)]
    pub code: Option<String>,
    pub name: String,
    pub address: Option<String>,
    pub location_code: Option<String>,
    pub capacity_teu: Option<u32>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl DepotInput {
    /// Validate and build the record stored under `code`.
    pub fn into_depot(self, code: &str) -> Result<Depot, String> {
        let code = code.trim().to_uppercase();
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(format!("'{}' is not a valid depot code", code));
        }
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err("depot name is required".to_string());
        }

        Ok(Depot {
            code,
            name,
            address: self.address.filter(|a| !a.trim().is_empty()),
            location_code: self
                .location_code
                .map(|c| c.trim().to_uppercase())
                .filter(|c| !c.is_empty()),
            capacity_teu: self.capacity_teu,
            active: self.active,
            updated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str) -> DepotInput {
        DepotInput {
            code: None,
            name: name.to_string(),
            address: None,
            location_code: Some(" vnsgn ".into()),
            capacity_teu: Some(1_200),
            active: true,
        }
    }

    #[test]
    fn test_into_depot_normalizes_codes() {
        let depot = input("Cat Lai Depot").into_depot(" dp-01 ").unwrap();
        assert_eq!(depot.code, "DP-01");
        assert_eq!(depot.location_code.as_deref(), Some("VNSGN"));
    }

    #[test]
    fn test_into_depot_rejects_blank_name_and_bad_code() {
        assert!(input("  ").into_depot("DP01").is_err());
        assert!(input("X").into_depot("DP 01").is_err());
    }
}
