//! Goods layer - identifiers, production requirements, and storage

pub mod catalog;
pub mod good;
pub mod stockpile;

pub use catalog::{
    BuildingRequirement, GoodsCatalog, Ingredients, ProductionRequirement, SkillRequirement,
};
pub use good::{Good, GoodCategory, GoodId};
pub use stockpile::Stockpile;
