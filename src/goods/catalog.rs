//! Goods catalog - production requirements for every good and building
//!
//! Requirements specify the skill, tool, location and ingredients needed
//! to make one unit of a good, plus its base production time and price.
//! The catalog is immutable once built and shared by every agent.

use ahash::AHashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::city::building::BuildingType;
use crate::core::error::{Result, SimError};
use crate::entity::skills::Skill;
use crate::goods::good::*;
use crate::world::tiles::TileType;

/// Minimum skill needed to produce a good
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRequirement {
    pub skill: Skill,
    pub min_level: u32,
}

/// Building an agent must work in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingRequirement {
    pub building_type: BuildingType,
    /// `None` accepts any subtype
    pub subtype: Option<u8>,
}

impl BuildingRequirement {
    pub fn accepts(&self, building_type: BuildingType, subtype: u8) -> bool {
        self.building_type == building_type && self.subtype.map_or(true, |s| s == subtype)
    }
}

/// Ingredients consumed per unit of output
///
/// Each listed good's quantity is the amount needed for one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Ingredients {
    /// Every listed good, in fixed proportion
    All(Vec<Good>),
    /// Exactly one of the listed alternatives, chosen at resolution time
    OneOf(Vec<Good>),
}

impl Ingredients {
    /// Concrete ingredient quantities for producing `quantity` units
    ///
    /// A one-of requirement picks its alternative here; callers must keep
    /// the returned list so the same ingredients are consumed later.
    pub fn resolve<R: Rng>(&self, quantity: f32, rng: &mut R) -> Vec<Good> {
        match self {
            Ingredients::All(goods) => goods
                .iter()
                .map(|g| g.with_quantity(g.quantity * quantity))
                .collect(),
            Ingredients::OneOf(goods) => {
                if goods.is_empty() {
                    return Vec::new();
                }
                let pick = &goods[rng.gen_range(0..goods.len())];
                vec![pick.with_quantity(pick.quantity * quantity)]
            }
        }
    }

    pub fn goods(&self) -> &[Good] {
        match self {
            Ingredients::All(goods) | Ingredients::OneOf(goods) => goods,
        }
    }
}

/// Everything needed to produce one good or building
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRequirement {
    pub good: GoodId,
    pub name: String,
    pub skill: Option<SkillRequirement>,
    pub tool: Option<GoodId>,
    pub building: Option<BuildingRequirement>,
    pub tile: Option<TileType>,
    pub ingredients: Option<Ingredients>,
    /// Seconds to produce one unit at skill level 0
    pub base_time: f32,
    /// Catalog price of one unit before tax
    pub base_price: f32,
    /// Hunger removed per unit eaten (0.0 for inedible goods)
    pub nutrition: f32,
}

impl ProductionRequirement {
    fn new(good: GoodId, name: &str, base_time: f32, base_price: f32) -> Self {
        Self {
            good,
            name: name.into(),
            skill: None,
            tool: None,
            building: None,
            tile: None,
            ingredients: None,
            base_time,
            base_price,
            nutrition: 0.0,
        }
    }

    fn skill(mut self, skill: Skill, min_level: u32) -> Self {
        self.skill = Some(SkillRequirement { skill, min_level });
        self
    }

    fn tool(mut self, tool: GoodId) -> Self {
        self.tool = Some(tool);
        self
    }

    fn building(mut self, building_type: BuildingType, subtype: Option<u8>) -> Self {
        self.building = Some(BuildingRequirement { building_type, subtype });
        self
    }

    fn tile(mut self, tile: TileType) -> Self {
        self.tile = Some(tile);
        self
    }

    fn all_of(mut self, goods: &[(GoodId, f32)]) -> Self {
        self.ingredients = Some(Ingredients::All(
            goods.iter().map(|(id, q)| Good::new(*id, *q)).collect(),
        ));
        self
    }

    fn one_of(mut self, goods: &[(GoodId, f32)]) -> Self {
        self.ingredients = Some(Ingredients::OneOf(
            goods.iter().map(|(id, q)| Good::new(*id, *q)).collect(),
        ));
        self
    }

    fn nutrition(mut self, nutrition: f32) -> Self {
        self.nutrition = nutrition;
        self
    }
}

/// Catalog of all known goods
#[derive(Debug, Clone, Default)]
pub struct GoodsCatalog {
    requirements: Vec<ProductionRequirement>,
    index: AHashMap<GoodId, usize>,
}

impl GoodsCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in settlement economy
    pub fn with_defaults() -> Self {
        use BuildingType::*;

        let mut catalog = Self::new();

        // Raw food
        catalog.add(
            ProductionRequirement::new(WHEAT, "wheat", 3.0, 1.0)
                .skill(Skill::Farming, 0)
                .tool(HOE)
                .tile(TileType::Farmland),
        );
        catalog.add(
            ProductionRequirement::new(VEGETABLES, "vegetables", 3.0, 1.5)
                .skill(Skill::Farming, 0)
                .tool(HOE)
                .tile(TileType::Farmland)
                .nutrition(0.15),
        );
        catalog.add(
            ProductionRequirement::new(FISH, "fish", 4.0, 2.0)
                .skill(Skill::Fishing, 0)
                .tool(FISHING_ROD)
                .tile(TileType::Water)
                .nutrition(0.2),
        );

        // Prepared food
        catalog.add(
            ProductionRequirement::new(FLOUR, "flour", 2.0, 2.5)
                .skill(Skill::Baking, 0)
                .building(Mill, None)
                .all_of(&[(WHEAT, 2.0)]),
        );
        catalog.add(
            ProductionRequirement::new(BREAD, "bread", 3.0, 4.0)
                .skill(Skill::Baking, 1)
                .building(Bakery, None)
                .all_of(&[(FLOUR, 1.0)])
                .nutrition(0.35),
        );
        catalog.add(
            ProductionRequirement::new(STEW, "stew", 3.0, 5.0)
                .skill(Skill::Cooking, 1)
                .building(Kitchen, None)
                .one_of(&[(FISH, 1.0), (VEGETABLES, 2.0)])
                .nutrition(0.5),
        );
        catalog.add(
            ProductionRequirement::new(MEAL, "meal", 2.0, 3.5)
                .skill(Skill::Cooking, 0)
                .one_of(&[(FISH, 1.0), (VEGETABLES, 1.0)])
                .nutrition(0.4),
        );

        // Materials
        catalog.add(
            ProductionRequirement::new(LOGS, "logs", 3.0, 1.0)
                .skill(Skill::Forestry, 0)
                .tool(AXE)
                .tile(TileType::Forest),
        );
        catalog.add(
            ProductionRequirement::new(STONE, "stone", 4.0, 1.0)
                .skill(Skill::Mining, 0)
                .tool(PICKAXE)
                .tile(TileType::Mountain),
        );
        catalog.add(
            ProductionRequirement::new(ORE, "ore", 5.0, 2.0)
                .skill(Skill::Mining, 1)
                .tool(PICKAXE)
                .tile(TileType::Mountain),
        );
        catalog.add(
            ProductionRequirement::new(PLANKS, "planks", 2.0, 2.0)
                .skill(Skill::Carpentry, 0)
                .building(Workshop, Some(WORKSHOP_SAWMILL))
                .all_of(&[(LOGS, 1.0)]),
        );
        catalog.add(
            ProductionRequirement::new(IRON, "iron", 4.0, 5.0)
                .skill(Skill::Smithing, 0)
                .building(Smithy, None)
                .all_of(&[(ORE, 2.0)]),
        );

        // Tools
        for (id, name) in [(HOE, "hoe"), (AXE, "axe"), (PICKAXE, "pickaxe")] {
            catalog.add(
                ProductionRequirement::new(id, name, 6.0, 12.0)
                    .skill(Skill::Smithing, 1)
                    .building(Smithy, None)
                    .all_of(&[(IRON, 1.0), (PLANKS, 1.0)]),
            );
        }
        catalog.add(
            ProductionRequirement::new(HAMMER, "hammer", 5.0, 10.0)
                .skill(Skill::Smithing, 0)
                .building(Smithy, None)
                .all_of(&[(IRON, 1.0), (LOGS, 1.0)]),
        );
        catalog.add(
            ProductionRequirement::new(FISHING_ROD, "fishing rod", 4.0, 6.0)
                .skill(Skill::Carpentry, 0)
                .building(Workshop, Some(WORKSHOP_CARPENTRY))
                .all_of(&[(PLANKS, 1.0)]),
        );

        // Crafts and buildings
        catalog.add(
            ProductionRequirement::new(FURNITURE, "furniture", 8.0, 15.0)
                .skill(Skill::Carpentry, 1)
                .tool(HAMMER)
                .building(Workshop, Some(WORKSHOP_CARPENTRY))
                .all_of(&[(PLANKS, 3.0)]),
        );
        catalog.add(
            ProductionRequirement::new(HOUSE, "house", 30.0, 80.0)
                .skill(Skill::Construction, 0)
                .tool(HAMMER)
                .all_of(&[(PLANKS, 6.0), (STONE, 4.0)]),
        );

        catalog
    }

    /// Add a requirement, replacing any existing entry for the same good
    pub fn add(&mut self, requirement: ProductionRequirement) {
        if let Some(&idx) = self.index.get(&requirement.good) {
            self.requirements[idx] = requirement;
        } else {
            self.index.insert(requirement.good, self.requirements.len());
            self.requirements.push(requirement);
        }
    }

    pub fn get(&self, good: GoodId) -> Option<&ProductionRequirement> {
        self.index.get(&good).map(|&idx| &self.requirements[idx])
    }

    pub fn contains(&self, good: GoodId) -> bool {
        self.index.contains_key(&good)
    }

    /// All requirements in insertion order
    pub fn all(&self) -> &[ProductionRequirement] {
        &self.requirements
    }

    pub fn name(&self, good: GoodId) -> &str {
        self.get(good).map_or("unknown", |r| r.name.as_str())
    }

    pub fn base_price(&self, good: GoodId) -> f32 {
        self.get(good).map_or(0.0, |r| r.base_price)
    }

    pub fn nutrition(&self, good: GoodId) -> f32 {
        self.get(good).map_or(0.0, |r| r.nutrition)
    }

    /// Goods whose requirement uses `skill` (in catalog order)
    pub fn produced_with(&self, skill: Skill) -> impl Iterator<Item = &ProductionRequirement> {
        self.requirements
            .iter()
            .filter(move |r| r.skill.map_or(false, |s| s.skill == skill))
    }

    /// Load a catalog from a TOML file
    pub fn load_from_toml(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse a catalog from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self> {
        let data: TomlCatalog = toml::from_str(content)?;

        let mut catalog = Self::new();
        for good in data.goods {
            catalog.add(good.into_requirement()?);
        }
        Ok(catalog)
    }
}

/// Workshop subtypes
pub const WORKSHOP_CARPENTRY: u8 = 0;
pub const WORKSHOP_SAWMILL: u8 = 1;

/// TOML representation of a catalog file
#[derive(Debug, Deserialize)]
struct TomlCatalog {
    goods: Vec<TomlGood>,
}

/// TOML representation of a single good
#[derive(Debug, Deserialize)]
struct TomlGood {
    id: GoodId,
    name: String,
    base_time: f32,
    base_price: f32,
    #[serde(default)]
    nutrition: f32,
    skill: Option<TomlSkill>,
    tool: Option<GoodId>,
    building: Option<TomlBuilding>,
    tile: Option<String>,
    ingredients: Option<TomlIngredients>,
}

#[derive(Debug, Deserialize)]
struct TomlSkill {
    name: String,
    #[serde(default)]
    level: u32,
}

#[derive(Debug, Deserialize)]
struct TomlBuilding {
    #[serde(rename = "type")]
    building_type: String,
    subtype: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct TomlIngredients {
    #[serde(default)]
    all: Vec<TomlAmount>,
    #[serde(default)]
    one_of: Vec<TomlAmount>,
}

#[derive(Debug, Deserialize)]
struct TomlAmount {
    good: GoodId,
    amount: f32,
}

impl TomlGood {
    fn into_requirement(self) -> Result<ProductionRequirement> {
        let skill = self
            .skill
            .map(|s| {
                Ok::<_, SimError>(SkillRequirement {
                    skill: s.name.parse()?,
                    min_level: s.level,
                })
            })
            .transpose()?;

        let building = self
            .building
            .map(|b| {
                Ok::<_, SimError>(BuildingRequirement {
                    building_type: b.building_type.parse()?,
                    subtype: b.subtype,
                })
            })
            .transpose()?;

        let tile = self.tile.map(|t| t.parse::<TileType>()).transpose()?;

        let ingredients = match self.ingredients {
            None => None,
            Some(ing) => {
                let to_goods = |list: Vec<TomlAmount>| {
                    list.into_iter()
                        .map(|a| Good::new(a.good, a.amount))
                        .collect::<Vec<_>>()
                };
                match (ing.all.is_empty(), ing.one_of.is_empty()) {
                    (false, true) => Some(Ingredients::All(to_goods(ing.all))),
                    (true, false) => Some(Ingredients::OneOf(to_goods(ing.one_of))),
                    (true, true) => None,
                    (false, false) => {
                        return Err(SimError::Catalog(format!(
                            "{}: ingredients must be either `all` or `one_of`, not both",
                            self.name
                        )))
                    }
                }
            }
        };

        if self.base_time < 0.0 || self.base_price <= 0.0 {
            return Err(SimError::Catalog(format!(
                "{}: base_time must be >= 0 and base_price > 0",
                self.name
            )));
        }

        Ok(ProductionRequirement {
            good: self.id,
            name: self.name,
            skill,
            tool: self.tool,
            building,
            tile,
            ingredients,
            base_time: self.base_time,
            base_price: self.base_price,
            nutrition: self.nutrition,
        })
    }
}
