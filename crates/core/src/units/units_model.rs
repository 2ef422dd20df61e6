//! Ledger base-unit amounts.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An integer amount in the ledger's smallest fixed-point unit.
///
/// Serialized as a decimal string so that values above 2^53 survive
/// JSON consumers; deserializes from either a string or a JSON integer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BaseUnits(pub u128);

impl BaseUnits {
    pub const ZERO: BaseUnits = BaseUnits(0);

    pub const fn new(value: u128) -> Self {
        BaseUnits(value)
    }

    pub const fn value(&self) -> u128 {
        self.0
    }

    /// Integer subtraction; `None` when `other` is larger than `self`.
    pub fn checked_sub(self, other: BaseUnits) -> Option<BaseUnits> {
        self.0.checked_sub(other.0).map(BaseUnits)
    }
}

impl From<u128> for BaseUnits {
    fn from(value: u128) -> Self {
        BaseUnits(value)
    }
}

impl From<u64> for BaseUnits {
    fn from(value: u64) -> Self {
        BaseUnits(value as u128)
    }
}

impl fmt::Display for BaseUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for BaseUnits {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

struct BaseUnitsVisitor;

impl<'de> Visitor<'de> for BaseUnitsVisitor {
    type Value = BaseUnits;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a non-negative integer or an integer string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<BaseUnits, E> {
        Ok(BaseUnits(v as u128))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<BaseUnits, E> {
        Ok(BaseUnits(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<BaseUnits, E> {
        u128::try_from(v)
            .map(BaseUnits)
            .map_err(|_| E::custom(format!("base units cannot be negative: {}", v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<BaseUnits, E> {
        v.trim()
            .parse::<u128>()
            .map(BaseUnits)
            .map_err(|e| E::custom(format!("invalid base-unit amount '{}': {}", v, e)))
    }
}

impl<'de> Deserialize<'de> for BaseUnits {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<BaseUnits, D::Error> {
        deserializer.deserialize_any(BaseUnitsVisitor)
    }
}
