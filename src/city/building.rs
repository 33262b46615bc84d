//! Building archetype with SoA layout

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::core::error::SimError;
use crate::core::types::{AgentId, BuildingId, Tick, Vec2};
use crate::goods::good::HOUSE;
use crate::goods::{GoodId, Stockpile};

/// Type of building
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingType {
    House,
    Mill,
    Bakery,
    Kitchen,
    Smithy,
    Workshop,
    Market,
    Barracks,
}

impl BuildingType {
    /// Building raised by constructing a catalog building good
    pub fn from_good(good: GoodId) -> Option<Self> {
        (good == HOUSE).then_some(BuildingType::House)
    }

    /// Housing capacity for residential buildings
    ///
    /// Workplaces house their keeper, so a baker can live in a bakery.
    pub fn housing_capacity(&self) -> u32 {
        match self {
            BuildingType::House => 4,
            BuildingType::Market | BuildingType::Barracks => 0,
            _ => 1,
        }
    }
}

impl FromStr for BuildingType {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "house" => Ok(BuildingType::House),
            "mill" => Ok(BuildingType::Mill),
            "bakery" => Ok(BuildingType::Bakery),
            "kitchen" => Ok(BuildingType::Kitchen),
            "smithy" => Ok(BuildingType::Smithy),
            "workshop" => Ok(BuildingType::Workshop),
            "market" => Ok(BuildingType::Market),
            "barracks" => Ok(BuildingType::Barracks),
            _ => Err(SimError::Catalog(format!("Invalid building type: {}", s))),
        }
    }
}

/// Structure of Arrays for buildings
///
/// Ids are assigned in spawn order and equal the building's index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildingArchetype {
    pub ids: Vec<BuildingId>,
    pub building_types: Vec<BuildingType>,
    /// Specialization within a type (e.g. carpentry vs. sawmill workshop)
    pub subtypes: Vec<u8>,
    pub positions: Vec<Vec2>,
    /// Agents who live here
    pub residents: Vec<Vec<AgentId>>,
    /// Goods stored in the building (the home stockpile of its residents)
    pub stockpiles: Vec<Stockpile>,
    pub built_ticks: Vec<Tick>,
}

impl BuildingArchetype {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.ids.len()
    }

    pub fn spawn(
        &mut self,
        building_type: BuildingType,
        subtype: u8,
        position: Vec2,
        tick: Tick,
    ) -> BuildingId {
        let id = BuildingId(self.ids.len() as u32);
        self.ids.push(id);
        self.building_types.push(building_type);
        self.subtypes.push(subtype);
        self.positions.push(position);
        self.residents.push(Vec::new());
        self.stockpiles.push(Stockpile::new());
        self.built_ticks.push(tick);
        id
    }

    pub fn index_of(&self, id: BuildingId) -> Option<usize> {
        (id.index() < self.count()).then_some(id.index())
    }

    pub fn position(&self, id: BuildingId) -> Option<Vec2> {
        self.index_of(id).map(|idx| self.positions[idx])
    }

    pub fn vacancies(&self, idx: usize) -> u32 {
        self.building_types[idx]
            .housing_capacity()
            .saturating_sub(self.residents[idx].len() as u32)
    }

    /// Move an agent in; returns false when the building is full
    pub fn add_resident(&mut self, id: BuildingId, agent: AgentId) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        if self.residents[idx].contains(&agent) {
            return true;
        }
        if self.vacancies(idx) == 0 {
            return false;
        }
        self.residents[idx].push(agent);
        true
    }

    pub fn remove_resident(&mut self, id: BuildingId, agent: AgentId) {
        if let Some(idx) = self.index_of(id) {
            self.residents[idx].retain(|a| *a != agent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_building_archetype_spawn() {
        let mut arch = BuildingArchetype::new();
        assert_eq!(arch.count(), 0);

        let id = arch.spawn(BuildingType::House, 0, Vec2::new(10.0, 20.0), 100);

        assert_eq!(arch.count(), 1);
        assert_eq!(id, BuildingId(0));
        assert_eq!(arch.building_types[0], BuildingType::House);
        assert_eq!(arch.built_ticks[0], 100);
        assert!(arch.stockpiles[0].is_empty());
    }

    #[test]
    fn test_building_archetype_index_of() {
        let mut arch = BuildingArchetype::new();
        let id1 = arch.spawn(BuildingType::House, 0, Vec2::new(0.0, 0.0), 0);
        let id2 = arch.spawn(BuildingType::Bakery, 0, Vec2::new(10.0, 0.0), 0);

        assert_eq!(arch.index_of(id1), Some(0));
        assert_eq!(arch.index_of(id2), Some(1));
        assert_eq!(arch.index_of(BuildingId(99)), None);
    }

    #[test]
    fn test_house_fills_up() {
        let mut arch = BuildingArchetype::new();
        let house = arch.spawn(BuildingType::House, 0, Vec2::default(), 0);

        for i in 0..4 {
            assert!(arch.add_resident(house, AgentId(i)));
        }
        assert_eq!(arch.vacancies(0), 0);
        assert!(!arch.add_resident(house, AgentId(4)));

        // Re-adding an existing resident is a no-op success
        assert!(arch.add_resident(house, AgentId(0)));

        arch.remove_resident(house, AgentId(2));
        assert_eq!(arch.vacancies(0), 1);
    }

    #[test]
    fn test_market_houses_nobody() {
        let mut arch = BuildingArchetype::new();
        let market = arch.spawn(BuildingType::Market, 0, Vec2::default(), 0);
        assert!(!arch.add_resident(market, AgentId(0)));
    }

    #[test]
    fn test_building_type_parse() {
        assert_eq!("BAKERY".parse::<BuildingType>().unwrap(), BuildingType::Bakery);
        assert!("castle".parse::<BuildingType>().is_err());
    }
}
