//! Reference lists: shipping lines and order statuses.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A small, code-keyed reference list stored in its own collection.
pub trait LookupRecord:
    Serialize + DeserializeOwned + Clone + Unpin + Send + Sync + 'static
{
    const COLLECTION: &'static str;

    fn code(&self) -> &str;

    /// Position in listings; ties and `None` fall back to code order.
    fn sequence(&self) -> Option<i32> {
        None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingLine {
    pub code: String,
    pub name: String,

    /// Standard Carrier Alpha Code.
    #[serde(default)]
    pub scac: Option<String>,

    #[serde(default)]
    pub country: Option<String>,

    #[serde(default = "default_true")]
    pub active: bool,
}

impl LookupRecord for ShippingLine {
    const COLLECTION: &'static str = "shipping_lines";

    fn code(&self) -> &str {
        &self.code
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatus {
    pub code: String,
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub sequence: Option<i32>,

    /// No transitions out of a final status.
    #[serde(default)]
    pub is_final: bool,
}

impl LookupRecord for OrderStatus {
    const COLLECTION: &'static str = "order_statuses";

    fn code(&self) -> &str {
        &self.code
    }

    fn sequence(&self) -> Option<i32> {
        self.sequence
    }
}

fn default_true() -> bool {
    true
}

/// Sort a lookup list: by sequence first (unsequenced last), then by code.
pub fn sort_lookup<T: LookupRecord>(records: &mut [T]) {
    records.sort_by(|a, b| {
        let seq = |r: &T| r.sequence().unwrap_or(i32::MAX);
        seq(a).cmp(&seq(b)).then_with(|| a.code().cmp(b.code()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: &str, sequence: Option<i32>) -> OrderStatus {
        OrderStatus {
            code: code.to_string(),
            name: code.to_string(),
            description: None,
            sequence,
            is_final: false,
        }
    }

    #[test]
    fn test_sort_by_sequence_then_code() {
        let mut statuses = vec![
            status("GATE_OUT", None),
            status("RELEASED", Some(2)),
            status("BOOKED", Some(1)),
            status("CANCELLED", None),
        ];
        sort_lookup(&mut statuses);

        let codes: Vec<&str> = statuses.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, ["BOOKED", "RELEASED", "CANCELLED", "GATE_OUT"]);
    }
}
