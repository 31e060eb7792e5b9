//! Core types for stock observations

use bigdecimal::BigDecimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Add;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A point-in-time stock quantity read from the ERP.
///
/// Backed by an exact decimal so that `19` and `19.00` compare equal and
/// no rounding ever happens between the read side and the expected value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quantity(BigDecimal);

impl Quantity {
    pub fn zero() -> Self {
        Self(BigDecimal::from(0))
    }

    /// Interpret a JSON value as a quantity. Numbers and numeric strings are accepted.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Number(n) => n.to_string().parse(),
            serde_json::Value::String(s) => s.parse(),
            other => Err(Error::InvalidQuantity(format!("not a number: {}", other))),
        }
    }

    pub fn is_negative(&self) -> bool {
        self.0 < BigDecimal::from(0)
    }

    pub fn as_decimal(&self) -> &BigDecimal {
        &self.0
    }
}

impl From<i64> for Quantity {
    fn from(value: i64) -> Self {
        Self(BigDecimal::from(value))
    }
}

impl From<BigDecimal> for Quantity {
    fn from(value: BigDecimal) -> Self {
        Self(value)
    }
}

impl FromStr for Quantity {
    type Err = Error;

    /// Parses quantities as the ERP renders them: digit groups may be split
    /// by spaces (including non-breaking ones) and a single `,` with no `.`
    /// is the decimal separator.
    fn from_str(s: &str) -> Result<Self> {
        let cleaned: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '\u{a0}' | '\u{202f}' | '_'))
            .collect();

        if cleaned.is_empty() {
            return Err(Error::InvalidQuantity("empty value".to_string()));
        }

        let normalized = if !cleaned.contains('.') && cleaned.matches(',').count() == 1 {
            cleaned.replace(',', ".")
        } else {
            cleaned
        };

        BigDecimal::from_str(&normalized)
            .map(Self)
            .map_err(|_| Error::InvalidQuantity(s.to_string()))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Quantity {
        Quantity(self.0 + rhs.0)
    }
}

impl<'a> Add<&'a Quantity> for &'a Quantity {
    type Output = Quantity;

    fn add(self, rhs: &'a Quantity) -> Quantity {
        Quantity(&self.0 + &rhs.0)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Quantity::from_json(&value).map_err(serde::de::Error::custom)
    }
}

/// The quantity a receiving operation should leave behind.
pub fn expected_after(before: &Quantity, delta: &Quantity) -> Quantity {
    before + delta
}

/// Warehouse category a stock entry lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Part,
    Assembly,
    Product,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Part => "part",
            EntityKind::Assembly => "assembly",
            EntityKind::Product => "product",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "part" => Ok(EntityKind::Part),
            "assembly" => Ok(EntityKind::Assembly),
            "product" => Ok(EntityKind::Product),
            other => Err(Error::InvalidConfig(format!("unknown entity kind: {}", other))),
        }
    }
}

/// Identifies one stock entry: entity name within a warehouse category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub name: String,
    pub kind: EntityKind,
}

impl StockKey {
    pub fn new(name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

impl fmt::Display for StockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("19", 19 ; "plain integer")]
    #[test_case("  19 ", 19 ; "surrounding whitespace")]
    #[test_case("1 234", 1234 ; "space grouping")]
    #[test_case("1\u{a0}234", 1234 ; "nbsp grouping")]
    #[test_case("19.00", 19 ; "trailing zero decimals")]
    #[test_case("19,00", 19 ; "comma decimal separator")]
    fn test_parse_whole_quantities(input: &str, expected: i64) {
        let parsed: Quantity = input.parse().unwrap();
        assert_eq!(parsed, Quantity::from(expected));
    }

    #[test_case("" ; "empty")]
    #[test_case("   " ; "blank")]
    #[test_case("n/a" ; "text")]
    #[test_case("1,2,3" ; "several commas")]
    fn test_parse_rejects(input: &str) {
        assert!(matches!(
            input.parse::<Quantity>(),
            Err(Error::InvalidQuantity(_))
        ));
    }

    #[test]
    fn test_fractional_quantity_is_exact() {
        let a: Quantity = "0.1".parse().unwrap();
        let b: Quantity = "0.2".parse().unwrap();
        assert_eq!(&a + &b, "0.3".parse::<Quantity>().unwrap());
    }

    #[test]
    fn test_expected_after_receiving() {
        let before = Quantity::from(10);
        let delta = Quantity::from(9);
        assert_eq!(expected_after(&before, &delta), Quantity::from(19));
    }

    #[test]
    fn test_from_json() {
        assert_eq!(
            Quantity::from_json(&serde_json::json!(19)).unwrap(),
            Quantity::from(19)
        );
        assert_eq!(
            Quantity::from_json(&serde_json::json!("19.5")).unwrap(),
            "19.5".parse::<Quantity>().unwrap()
        );
        assert!(Quantity::from_json(&serde_json::json!(null)).is_err());
    }

    #[test]
    fn test_quantity_serializes_as_string() {
        let q: Quantity = "12.50".parse().unwrap();
        let json = serde_json::to_string(&q).unwrap();
        assert_eq!(json, "\"12.50\"");

        let back: Quantity = serde_json::from_str("12.5").unwrap();
        assert_eq!(back, q);
    }

    #[test]
    fn test_negative_detection() {
        assert!(Quantity::from(-1).is_negative());
        assert!(!Quantity::zero().is_negative());
    }

    #[test]
    fn test_entity_kind_round_trip_names() {
        for kind in [EntityKind::Part, EntityKind::Assembly, EntityKind::Product] {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
        }
        let key = StockKey::new("Bolt M8", EntityKind::Part);
        assert_eq!(key.to_string(), "part 'Bolt M8'");
    }
}
