//! Container records.

use chrono::{DateTime, Utc};
use mongodb::bson::{Document, doc};
use serde::{Deserialize, Serialize};

/// A shipping container tracked by the back-office.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    /// ISO 6346 number, e.g. `MSCU1234565`.
    pub container_no: String,

    /// ISO size/type code, e.g. `22G1`, `45R1`.
    #[serde(default)]
    pub iso_code: Option<String>,

    /// Owning shipping line code.
    #[serde(default)]
    pub shipping_line: Option<String>,

    /// Depot currently holding the container.
    #[serde(default)]
    pub depot_code: Option<String>,

    /// Order status code.
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub gross_weight_kg: Option<f64>,

    #[serde(default)]
    pub tare_weight_kg: Option<f64>,

    #[serde(default)]
    pub remarks: Option<String>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// Body of create/replace requests.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerInput {
    #[serde(default)]
    pub container_no: Option<String>,
    pub iso_code: Option<String>,
    pub shipping_line: Option<String>,
    pub depot_code: Option<String>,
    pub status: Option<String>,
    pub gross_weight_kg: Option<f64>,
    pub tare_weight_kg: Option<f64>,
    pub remarks: Option<String>,
}

impl ContainerInput {
    /// Validate and build the record stored under `container_no`.
    pub fn into_container(self, container_no: &str) -> Result<Container, String> {
        let container_no = normalize_container_no(container_no)?;

        if let (Some(gross), Some(tare)) = (self.gross_weight_kg, self.tare_weight_kg)
            && gross < tare
        {
            return Err(format!(
                "gross weight {} kg is below tare weight {} kg",
                gross, tare
            ));
        }
        if self.gross_weight_kg.is_some_and(|w| w < 0.0) || self.tare_weight_kg.is_some_and(|w| w < 0.0) {
            return Err("weights must not be negative".to_string());
        }

        Ok(Container {
            container_no,
            iso_code: upper(self.iso_code),
            shipping_line: upper(self.shipping_line),
            depot_code: upper(self.depot_code),
            status: upper(self.status),
            gross_weight_kg: self.gross_weight_kg,
            tare_weight_kg: self.tare_weight_kg,
            remarks: self.remarks.filter(|r| !r.trim().is_empty()),
            updated_at: Utc::now(),
        })
    }
}

fn upper(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_uppercase())
        .filter(|v| !v.is_empty())
}

/// Normalize and validate an ISO 6346 container number: owner code (3
/// letters), category (`U`, `J` or `Z`), 6-digit serial and check digit.
pub fn normalize_container_no(raw: &str) -> Result<String, String> {
    let number: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_uppercase();

    let bytes = number.as_bytes();
    let well_formed = bytes.len() == 11
        && bytes[..3].iter().all(u8::is_ascii_uppercase)
        && matches!(bytes[3], b'U' | b'J' | b'Z')
        && bytes[4..].iter().all(u8::is_ascii_digit);
    if !well_formed {
        return Err(format!("'{}' is not a valid container number", raw.trim()));
    }

    let expected = check_digit(&bytes[..10]);
    let actual = u32::from(bytes[10] - b'0');
    if expected != actual {
        return Err(format!(
            "'{}' has check digit {}, expected {}",
            number, actual, expected
        ));
    }

    Ok(number)
}

/// ISO 6346 check digit over the first ten characters.
fn check_digit(chars: &[u8]) -> u32 {
    let sum: u32 = chars
        .iter()
        .enumerate()
        .map(|(i, &c)| letter_value(c) * (1 << i))
        .sum();
    (sum % 11) % 10
}

/// Letters skip multiples of 11: A=10, B=12 ... K=21, L=23 ...
fn letter_value(c: u8) -> u32 {
    if c.is_ascii_digit() {
        return u32::from(c - b'0');
    }
    let mut value = 10;
    for _ in b'A'..c {
        value += 1;
        if value % 11 == 0 {
            value += 1;
        }
    }
    value
}

/// Query filters for container listings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerFilter {
    pub depot: Option<String>,
    pub status: Option<String>,
    pub shipping_line: Option<String>,
}

impl ContainerFilter {
    pub fn to_document(&self) -> Document {
        let mut filter = doc! {};
        if let Some(depot) = upper(self.depot.clone()) {
            filter.insert("depotCode", depot);
        }
        if let Some(status) = upper(self.status.clone()) {
            filter.insert("status", status);
        }
        if let Some(line) = upper(self.shipping_line.clone()) {
            filter.insert("shippingLine", line);
        }
        filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_digit_accepts_valid_numbers() {
        assert_eq!(normalize_container_no("CSQU3054383").unwrap(), "CSQU3054383");
        assert_eq!(normalize_container_no(" msku 907032-3 ").unwrap(), "MSKU9070323");
    }

    #[test]
    fn test_check_digit_rejects_typos() {
        assert!(normalize_container_no("CSQU3054384").is_err());
        assert!(normalize_container_no("CSQX3054383").is_err());
        assert!(normalize_container_no("CSQU305438").is_err());
    }

    #[test]
    fn test_letter_values_skip_multiples_of_eleven() {
        assert_eq!(letter_value(b'A'), 10);
        assert_eq!(letter_value(b'B'), 12);
        assert_eq!(letter_value(b'K'), 21);
        assert_eq!(letter_value(b'L'), 23);
        assert_eq!(letter_value(b'V'), 34);
        assert_eq!(letter_value(b'Z'), 38);
    }

    #[test]
    fn test_input_rejects_gross_below_tare() {
        let input = ContainerInput {
            container_no: None,
            iso_code: Some("22g1".into()),
            shipping_line: None,
            depot_code: None,
            status: None,
            gross_weight_kg: Some(1_000.0),
            tare_weight_kg: Some(2_200.0),
            remarks: None,
        };
        assert!(input.into_container("CSQU3054383").is_err());
    }

    #[test]
    fn test_filter_document() {
        let filter = ContainerFilter {
            depot: Some("dp01".into()),
            status: None,
            shipping_line: Some(" ".into()),
        };
        assert_eq!(filter.to_document(), doc! { "depotCode": "DP01" });
    }
}
