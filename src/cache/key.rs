//! Cache keys: an entity family plus an optional owner scope.

use std::fmt;

use serde::{Serialize, Serializer};

/// A named category of cached upstream entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Company,
    Driver,
    Location,
}

impl Family {
    pub const ALL: [Family; 3] = [Family::Company, Family::Driver, Family::Location];

    pub fn as_str(self) -> &'static str {
        match self {
            Family::Company => "companies",
            Family::Driver => "drivers",
            Family::Location => "locations",
        }
    }

    /// Parse a family from its route segment (`companies`, `drivers`, ...).
    /// Singular forms are accepted too.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "companies" | "company" => Some(Family::Company),
            "drivers" | "driver" => Some(Family::Driver),
            "locations" | "location" => Some(Family::Location),
            _ => None,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialized under its route name, the same one the key display uses.
impl Serialize for Family {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Narrows a family's key: the whole collection, or one owner's slice of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    All,
    Owner(String),
}

impl Scope {
    /// `None` or a blank id means the global scope.
    pub fn from_option(scope: Option<&str>) -> Self {
        match scope.map(str::trim) {
            Some(id) if !id.is_empty() => Scope::Owner(id.to_string()),
            _ => Scope::All,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::All => f.write_str("all"),
            Scope::Owner(id) => f.write_str(id),
        }
    }
}

/// Composite key of the entity cache. Equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub family: Family,
    pub scope: Scope,
}

impl CacheKey {
    pub fn new(family: Family, scope: Scope) -> Self {
        Self { family, scope }
    }

    #[allow(dead_code)]
    pub fn all(family: Family) -> Self {
        Self::new(family, Scope::All)
    }

    #[allow(dead_code)]
    pub fn owned(family: Family, owner: impl Into<String>) -> Self {
        Self::new(family, Scope::Owner(owner.into()))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.family, self.scope)
    }
}
