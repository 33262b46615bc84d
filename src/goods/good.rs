//! Good identifiers and quantities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::SimError;

/// Broad category of a good
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GoodCategory {
    Food,
    Material,
    Tool,
    Craft,
    Building,
}

impl GoodCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoodCategory::Food => "food",
            GoodCategory::Material => "material",
            GoodCategory::Tool => "tool",
            GoodCategory::Craft => "craft",
            GoodCategory::Building => "building",
        }
    }
}

impl FromStr for GoodCategory {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "food" => Ok(GoodCategory::Food),
            "material" => Ok(GoodCategory::Material),
            "tool" => Ok(GoodCategory::Tool),
            "craft" => Ok(GoodCategory::Craft),
            "building" => Ok(GoodCategory::Building),
            _ => Err(SimError::InvalidGoodId(s.to_string())),
        }
    }
}

/// Food subcategories
pub const FOOD_GRAIN: u8 = 0;
pub const FOOD_RAW: u8 = 1;
pub const FOOD_PREPARED: u8 = 2;

/// Material subcategories
pub const MATERIAL_RAW: u8 = 0;
pub const MATERIAL_PROCESSED: u8 = 1;

/// Identifier of a good: category + subcategory + numeric key
///
/// Serializes as `category:subcategory:key` so it can key JSON maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GoodId {
    pub category: GoodCategory,
    pub subcategory: u8,
    pub key: u16,
}

impl GoodId {
    pub const fn new(category: GoodCategory, subcategory: u8, key: u16) -> Self {
        Self { category, subcategory, key }
    }

    /// Food that can be eaten as-is (grain must be milled and baked first)
    pub fn is_edible(&self) -> bool {
        self.category == GoodCategory::Food && self.subcategory != FOOD_GRAIN
    }

    /// Raw food that a cook can turn into a meal
    pub fn is_cookable(&self) -> bool {
        self.category == GoodCategory::Food && self.subcategory == FOOD_RAW
    }

    pub fn is_tool(&self) -> bool {
        self.category == GoodCategory::Tool
    }

    pub fn is_building(&self) -> bool {
        self.category == GoodCategory::Building
    }
}

impl fmt::Display for GoodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.category.as_str(), self.subcategory, self.key)
    }
}

impl FromStr for GoodId {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SimError::InvalidGoodId(s.to_string());
        let mut parts = s.split(':');
        let (Some(category), Some(subcategory), Some(key), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };
        Ok(GoodId {
            category: category.parse()?,
            subcategory: subcategory.trim().parse().map_err(|_| invalid())?,
            key: key.trim().parse().map_err(|_| invalid())?,
        })
    }
}

impl TryFrom<String> for GoodId {
    type Error = SimError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GoodId> for String {
    fn from(id: GoodId) -> Self {
        id.to_string()
    }
}

// Well-known goods used by the default catalog

pub const WHEAT: GoodId = GoodId::new(GoodCategory::Food, FOOD_GRAIN, 0);
pub const FLOUR: GoodId = GoodId::new(GoodCategory::Food, FOOD_GRAIN, 1);
pub const FISH: GoodId = GoodId::new(GoodCategory::Food, FOOD_RAW, 0);
pub const VEGETABLES: GoodId = GoodId::new(GoodCategory::Food, FOOD_RAW, 1);
pub const BREAD: GoodId = GoodId::new(GoodCategory::Food, FOOD_PREPARED, 0);
pub const STEW: GoodId = GoodId::new(GoodCategory::Food, FOOD_PREPARED, 1);
pub const MEAL: GoodId = GoodId::new(GoodCategory::Food, FOOD_PREPARED, 2);

pub const LOGS: GoodId = GoodId::new(GoodCategory::Material, MATERIAL_RAW, 0);
pub const STONE: GoodId = GoodId::new(GoodCategory::Material, MATERIAL_RAW, 1);
pub const ORE: GoodId = GoodId::new(GoodCategory::Material, MATERIAL_RAW, 2);
pub const PLANKS: GoodId = GoodId::new(GoodCategory::Material, MATERIAL_PROCESSED, 0);
pub const IRON: GoodId = GoodId::new(GoodCategory::Material, MATERIAL_PROCESSED, 1);

pub const HOE: GoodId = GoodId::new(GoodCategory::Tool, 0, 0);
pub const AXE: GoodId = GoodId::new(GoodCategory::Tool, 0, 1);
pub const PICKAXE: GoodId = GoodId::new(GoodCategory::Tool, 0, 2);
pub const HAMMER: GoodId = GoodId::new(GoodCategory::Tool, 0, 3);
pub const FISHING_ROD: GoodId = GoodId::new(GoodCategory::Tool, 0, 4);

pub const FURNITURE: GoodId = GoodId::new(GoodCategory::Craft, 0, 0);

pub const HOUSE: GoodId = GoodId::new(GoodCategory::Building, 0, 0);

/// A quantity of one good
///
/// Goods are values: splitting off a quantity for a trade or a requirement
/// takes a copy. Quantities are real-valued so food can spoil fractionally
/// and tools can wear down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Good {
    pub id: GoodId,
    pub quantity: f32,
}

impl Good {
    pub fn new(id: GoodId, quantity: f32) -> Self {
        Self { id, quantity }
    }

    /// Copy of this good with a different quantity
    pub fn with_quantity(&self, quantity: f32) -> Self {
        Self { id: self.id, quantity }
    }

    pub fn is_edible(&self) -> bool {
        self.id.is_edible()
    }

    pub fn is_cookable(&self) -> bool {
        self.id.is_cookable()
    }

    pub fn is_tool(&self) -> bool {
        self.id.is_tool()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_good_id_predicates() {
        assert!(BREAD.is_edible());
        assert!(!BREAD.is_cookable());
        assert!(FISH.is_edible());
        assert!(FISH.is_cookable());
        assert!(!WHEAT.is_edible());
        assert!(!WHEAT.is_cookable());
        assert!(AXE.is_tool());
        assert!(!PLANKS.is_tool());
        assert!(HOUSE.is_building());
    }

    #[test]
    fn test_good_id_string_form() {
        assert_eq!(BREAD.to_string(), "food:2:0");
        assert_eq!("food:2:0".parse::<GoodId>().unwrap(), BREAD);
        assert_eq!("TOOL:0:1".parse::<GoodId>().unwrap(), AXE);
    }

    #[test]
    fn test_good_id_rejects_malformed() {
        assert!("food:2".parse::<GoodId>().is_err());
        assert!("food:2:0:1".parse::<GoodId>().is_err());
        assert!("mana:0:0".parse::<GoodId>().is_err());
        assert!("food:x:0".parse::<GoodId>().is_err());
    }

    #[test]
    fn test_good_id_as_json_map_key() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(FLOUR, 2.5_f32);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"food:0:1":2.5}"#);
        let back: std::collections::BTreeMap<GoodId, f32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(&FLOUR), Some(&2.5));
    }

    #[test]
    fn test_good_split_is_a_copy() {
        let mut held = Good::new(LOGS, 10.0);
        let split = held.with_quantity(4.0);
        held.quantity -= split.quantity;
        assert_eq!(split.id, LOGS);
        assert!((held.quantity - 6.0).abs() < 0.0001);
        assert!((split.quantity - 4.0).abs() < 0.0001);
    }
}
