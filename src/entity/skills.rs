//! Skills, experience, and professions

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::core::error::SimError;

/// A trade an agent can practice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Skill {
    Farming,
    Fishing,
    Forestry,
    Mining,
    Baking,
    Cooking,
    Smithing,
    Carpentry,
    Construction,
}

impl Skill {
    /// Every skill, in a fixed order used wherever a choice must be deterministic
    pub const ALL: [Skill; 9] = [
        Skill::Farming,
        Skill::Fishing,
        Skill::Forestry,
        Skill::Mining,
        Skill::Baking,
        Skill::Cooking,
        Skill::Smithing,
        Skill::Carpentry,
        Skill::Construction,
    ];
}

impl FromStr for Skill {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "farming" => Ok(Skill::Farming),
            "fishing" => Ok(Skill::Fishing),
            "forestry" => Ok(Skill::Forestry),
            "mining" => Ok(Skill::Mining),
            "baking" => Ok(Skill::Baking),
            "cooking" => Ok(Skill::Cooking),
            "smithing" => Ok(Skill::Smithing),
            "carpentry" => Ok(Skill::Carpentry),
            "construction" => Ok(Skill::Construction),
            _ => Err(SimError::Catalog(format!("Invalid skill: {}", s))),
        }
    }
}

/// Level and accumulated experience in one skill
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillLevel {
    pub level: u32,
    pub experience: f32,
}

/// Per-agent skill levels
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillTable {
    levels: AHashMap<Skill, SkillLevel>,
}

impl SkillTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, skill: Skill, level: u32) -> Self {
        self.set_level(skill, level);
        self
    }

    pub fn level(&self, skill: Skill) -> u32 {
        self.levels.get(&skill).map_or(0, |s| s.level)
    }

    pub fn experience(&self, skill: Skill) -> f32 {
        self.levels.get(&skill).map_or(0.0, |s| s.experience)
    }

    pub fn set_level(&mut self, skill: Skill, level: u32) {
        self.levels.entry(skill).or_default().level = level;
    }

    pub fn meets(&self, skill: Skill, min_level: u32) -> bool {
        self.level(skill) >= min_level
    }

    /// Add experience, levelling up as thresholds are crossed
    ///
    /// Level n -> n+1 costs `(n + 1) * per_level` experience.
    /// Returns the number of levels gained.
    pub fn grant_experience(&mut self, skill: Skill, amount: f32, per_level: f32) -> u32 {
        let entry = self.levels.entry(skill).or_default();
        entry.experience += amount.max(0.0);

        let mut gained = 0;
        loop {
            let cost = (entry.level + 1) as f32 * per_level;
            if per_level <= 0.0 || entry.experience < cost {
                break;
            }
            entry.experience -= cost;
            entry.level += 1;
            gained += 1;
        }
        gained
    }
}

/// What an agent does for a living
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Profession {
    Farmer,
    Fisher,
    Woodcutter,
    Miner,
    Baker,
    Cook,
    Smith,
    Carpenter,
    Builder,
    Soldier,
    Laborer,
}

impl Profession {
    /// The skill this profession favors when choosing work
    pub fn skill(&self) -> Option<Skill> {
        match self {
            Profession::Farmer => Some(Skill::Farming),
            Profession::Fisher => Some(Skill::Fishing),
            Profession::Woodcutter => Some(Skill::Forestry),
            Profession::Miner => Some(Skill::Mining),
            Profession::Baker => Some(Skill::Baking),
            Profession::Cook => Some(Skill::Cooking),
            Profession::Smith => Some(Skill::Smithing),
            Profession::Carpenter => Some(Skill::Carpentry),
            Profession::Builder => Some(Skill::Construction),
            Profession::Soldier | Profession::Laborer => None,
        }
    }
}
