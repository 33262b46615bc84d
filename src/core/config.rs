//! Simulation configuration with documented constants
//!
//! All tuning numbers are collected here with a note on what they drive.
//! A config can be loaded from TOML; any field left out keeps its default.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{Result, SimError};

/// Configuration for the simulation systems
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === MAP & MOVEMENT ===
    /// Width of one map tile (world units)
    pub tile_width: f32,

    /// Height of one map tile (world units)
    ///
    /// A move completes once the remaining distance drops below
    /// one-eighth of this value.
    pub tile_height: f32,

    /// Agent walking speed (world units per second)
    pub agent_speed: f32,

    // === MARKET ===
    /// Sales tax rate applied to every trade
    ///
    /// Tax is taken out of the buyer's payment: `cost * (1 - 1/(1+rate))`.
    /// Catalog prices are converted to market prices by `base * (1+rate)`.
    pub tax_rate: f32,

    /// Proportional gain of the price walk
    ///
    /// Each tick: `price *= 1 + price_adjust_rate * demand * dt`.
    pub price_adjust_rate: f32,

    /// Lowest price as a multiple of the good's default market price
    pub price_floor_ratio: f32,

    /// Highest price as a multiple of the good's default market price
    pub price_ceiling_ratio: f32,

    /// Orders whose remaining quantity falls below this are purged
    pub order_epsilon: f32,

    // === PRODUCTION ===
    /// Speed bonus per skill level
    ///
    /// Production time is multiplied by `1 / (1 + level * skill_speed_bonus)`.
    pub skill_speed_bonus: f32,

    /// Experience granted per unit produced
    pub experience_per_unit: f32,

    /// Experience needed per level (level n -> n+1 needs `(n+1) * this`)
    pub experience_per_level: f32,

    /// Fraction of a tool consumed by one production run
    pub tool_wear_per_use: f32,

    /// Tile resource consumed per unit harvested from farmland, forest or mine
    pub tile_depletion_per_unit: f32,

    /// Maximum nesting of source-goods -> produce-goods decomposition
    ///
    /// Guards against recipe cycles (tools needed to make their own inputs).
    pub max_source_depth: u32,

    // === NEEDS ===
    /// Hunger gained per second (0.0 = fed, 1.0 = starving)
    pub hunger_rate: f32,

    /// Hunger above which an urgent eat task is queued
    pub eat_threshold: f32,

    /// Fraction of held edible food lost per second
    pub spoilage_rate: f32,

    /// Seconds spent cooking a batch
    pub cook_time: f32,

    // === GOAL SELECTION ===
    /// Weight multiplier for the agent's profession skill
    pub profession_bias: f32,

    /// Cooking weight added per unit of hunger
    pub hunger_cooking_bias: f32,

    /// Probability of picking the most lucrative good instead of a random one
    pub profit_seek_chance: f32,

    /// Units produced by a default production goal
    pub production_batch: f32,

    /// Non-tool goods carried before the agent goes home to deposit
    pub carry_limit: f32,

    /// Seconds spent idling at home when nothing else is possible
    pub idle_duration: f32,

    /// Money paid from the treasury to a deployed soldier per second
    pub soldier_wage: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            // Map
            tile_width: 16.0,
            tile_height: 16.0,
            agent_speed: 32.0,

            // Market
            tax_rate: 0.1,
            price_adjust_rate: 0.00001,
            price_floor_ratio: 0.25,
            price_ceiling_ratio: 4.0,
            order_epsilon: 0.001,

            // Production
            skill_speed_bonus: 0.1,
            experience_per_unit: 10.0,
            experience_per_level: 100.0,
            tool_wear_per_use: 0.05,
            tile_depletion_per_unit: 0.01,
            max_source_depth: 4,

            // Needs
            hunger_rate: 0.002,
            eat_threshold: 0.6,
            spoilage_rate: 0.0005,
            cook_time: 3.0,

            // Goals
            profession_bias: 3.0,
            hunger_cooking_bias: 4.0,
            profit_seek_chance: 0.1,
            production_batch: 2.0,
            carry_limit: 20.0,
            idle_duration: 5.0,
            soldier_wage: 0.05,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from a TOML file, falling back to defaults per field
    pub fn load_from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse a config from a TOML string and validate it
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate().map_err(SimError::InvalidConfig)?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.tile_width <= 0.0 || self.tile_height <= 0.0 {
            return Err("Tile dimensions must be positive".into());
        }

        if self.agent_speed <= 0.0 {
            return Err(format!("agent_speed ({}) must be positive", self.agent_speed));
        }

        if self.tax_rate < 0.0 {
            return Err(format!("tax_rate ({}) must not be negative", self.tax_rate));
        }

        // The clamp band must contain the default price
        if !(self.price_floor_ratio > 0.0
            && self.price_floor_ratio <= 1.0
            && self.price_ceiling_ratio >= 1.0)
        {
            return Err(format!(
                "price band [{}, {}] must contain 1.0 and stay positive",
                self.price_floor_ratio, self.price_ceiling_ratio
            ));
        }

        if self.order_epsilon <= 0.0 {
            return Err("order_epsilon must be positive".into());
        }

        if !(0.0..=1.0).contains(&self.profit_seek_chance) {
            return Err(format!(
                "profit_seek_chance ({}) must be a probability",
                self.profit_seek_chance
            ));
        }

        if self.production_batch <= 0.0 {
            return Err("production_batch must be positive".into());
        }

        Ok(())
    }

    /// Multiplier applied to production time for a given skill level
    pub fn skill_speed_factor(&self, level: u32) -> f32 {
        1.0 / (1.0 + level as f32 * self.skill_speed_bonus)
    }

    /// Distance under which a move counts as arrived
    pub fn arrival_radius(&self) -> f32 {
        self.tile_height / 8.0
    }
}
