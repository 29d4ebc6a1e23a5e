//! The closed set of inventory services that own compartments.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Which downstream service owns a compartment.
///
/// The wire carries this as a string tag. Values other than the two known
/// services decode to [`InventoryType::Unknown`] instead of failing the whole
/// message: a transfer naming an unknown inventory is accepted but
/// non-actionable.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum InventoryType {
    Character,
    CashShop,
    Unknown,
}

impl InventoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryType::Character => "CHARACTER",
            InventoryType::CashShop => "CASH_SHOP",
            InventoryType::Unknown => "UNKNOWN",
        }
    }
}

impl core::fmt::Display for InventoryType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for InventoryType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for InventoryType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(match tag.as_str() {
            "CHARACTER" => InventoryType::Character,
            "CASH_SHOP" => InventoryType::CashShop,
            _ => InventoryType::Unknown,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tags_round_trip() {
        for (tag, expected) in [
            ("CHARACTER", InventoryType::Character),
            ("CASH_SHOP", InventoryType::CashShop),
        ] {
            let decoded: InventoryType =
                serde_json::from_value(serde_json::Value::String(tag.into())).unwrap();
            assert_eq!(decoded, expected);
            assert_eq!(serde_json::to_value(decoded).unwrap(), serde_json::json!(tag));
        }
    }

    #[test]
    fn unrecognised_tag_decodes_to_unknown() {
        let decoded: InventoryType = serde_json::from_value(serde_json::json!("EQUIP")).unwrap();
        assert_eq!(decoded, InventoryType::Unknown);
    }
}
