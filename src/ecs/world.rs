//! ECS World - all mutable session state
//!
//! Agents, buildings, the tile map, the exchange, the treasury and the RNG
//! live here and serialize together, so a saved session resumes with every
//! in-flight task, standing order and price exactly where it was.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::city::building::{BuildingArchetype, BuildingType};
use crate::core::config::SimulationConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::{AgentId, BuildingId, Tick, Vec2};
use crate::entity::agents::AgentArchetype;
use crate::entity::skills::Profession;
use crate::goods::{GoodId, GoodsCatalog};
use crate::market::exchange::{Exchange, Ledger};
use crate::tasks::task::TaskKind;
use crate::world::spatial::{self, BuildingView, Site, SpatialQuery};
use crate::world::tiles::{Tile, TileCoord, TileMap};

/// The simulation world containing all agents and buildings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub current_tick: Tick,
    pub session: Uuid,
    pub agents: AgentArchetype,
    pub buildings: BuildingArchetype,
    pub tiles: TileMap,
    pub exchange: Exchange,
    /// Collected sales tax; pays soldiers
    pub treasury: f32,
    pub rng: ChaCha8Rng,
}

impl World {
    pub fn new(tiles: TileMap, catalog: &GoodsCatalog, config: &SimulationConfig, seed: u64) -> Self {
        Self {
            current_tick: 0,
            session: Uuid::new_v4(),
            agents: AgentArchetype::new(),
            buildings: BuildingArchetype::new(),
            tiles,
            exchange: Exchange::new(catalog, config),
            treasury: 0.0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn spawn_agent(&mut self, name: String, position: Vec2, profession: Profession) -> AgentId {
        self.agents.spawn(name, position, profession)
    }

    pub fn spawn_building(&mut self, building_type: BuildingType, subtype: u8, position: Vec2) -> BuildingId {
        self.buildings
            .spawn(building_type, subtype, position, self.current_tick)
    }

    pub fn agent_count(&self) -> usize {
        self.agents.count()
    }

    pub fn tick(&mut self) {
        self.current_tick += 1;
    }

    /// Make `home` the agent's residence, leaving any previous one
    ///
    /// Returns false when the building is full or unknown.
    pub fn move_into(&mut self, agent: AgentId, home: BuildingId) -> bool {
        let Some(idx) = self.agents.index_of(agent) else {
            return false;
        };
        if !self.buildings.add_resident(home, agent) {
            return false;
        }
        if let Some(previous) = self.agents.homes[idx].replace(home) {
            if previous != home {
                self.buildings.remove_resident(previous, agent);
            }
        }
        true
    }

    /// Position of the market nearest to `origin`
    pub fn nearest_market(&self, origin: Vec2) -> Option<Vec2> {
        self.nearest_building(origin, &|b| b.building_type == BuildingType::Market)
            .and_then(|id| self.buildings.position(id))
    }

    /// Exchange plus a ledger over agent balances, borrowed together
    pub fn market(&mut self) -> (&mut Exchange, Accounts<'_>) {
        (
            &mut self.exchange,
            Accounts {
                agents: &mut self.agents,
                treasury: &mut self.treasury,
            },
        )
    }

    /// Relieve a soldier of duty
    ///
    /// The soldier becomes a laborer and an active deployment at the top of
    /// its queue is abandoned; the queue itself is left for the agent loop
    /// to drain. Returns true if a deployment was abandoned.
    pub fn dismiss_soldier(&mut self, agent: AgentId) -> Result<bool> {
        let idx = self
            .agents
            .index_of(agent)
            .ok_or(SimError::AgentNotFound(agent))?;
        self.agents.professions[idx] = Profession::Laborer;

        let Some(top) = self.agents.task_queues[idx].peek_mut() else {
            return Ok(false);
        };
        if matches!(top.kind, TaskKind::Deploy(_)) && !top.is_complete() {
            top.abandon();
            tracing::info!("{} dismissed from duty", agent);
            return Ok(true);
        }
        Ok(false)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl SpatialQuery for World {
    fn nearest_building(
        &self,
        origin: Vec2,
        pred: &dyn Fn(&BuildingView) -> bool,
    ) -> Option<BuildingId> {
        spatial::scan_buildings(&self.buildings, origin, pred)
    }

    fn nearest_tile(&self, origin: Vec2, pred: &dyn Fn(&Tile) -> bool) -> Option<TileCoord> {
        spatial::scan_tiles(&self.tiles, origin, pred)
    }

    fn site_position(&self, site: Site) -> Option<Vec2> {
        match site {
            Site::Building(id) => self.buildings.position(id),
            Site::Tile(coord) => self.tiles.get(coord).map(|_| self.tiles.center(coord)),
        }
    }
}

/// Ledger over agent money, personal stockpiles and the treasury
pub struct Accounts<'a> {
    agents: &'a mut AgentArchetype,
    treasury: &'a mut f32,
}

impl Ledger for Accounts<'_> {
    fn money(&self, agent: AgentId) -> f32 {
        self.agents.money.get(agent.index()).copied().unwrap_or(0.0)
    }

    fn held(&self, agent: AgentId, good: GoodId) -> f32 {
        self.agents
            .stockpiles
            .get(agent.index())
            .map_or(0.0, |s| s.get(good))
    }

    fn withdraw(&mut self, agent: AgentId, amount: f32) {
        if let Some(money) = self.agents.money.get_mut(agent.index()) {
            *money -= amount;
        }
    }

    fn deposit(&mut self, agent: AgentId, amount: f32) {
        if let Some(money) = self.agents.money.get_mut(agent.index()) {
            *money += amount;
        }
    }

    fn move_goods(&mut self, from: AgentId, to: AgentId, good: GoodId, quantity: f32) -> f32 {
        let count = self.agents.count();
        if from.index() >= count || to.index() >= count {
            return 0.0;
        }
        let moved = self.agents.stockpiles[from.index()].remove(good, quantity);
        self.agents.stockpiles[to.index()].add(good, moved);
        moved
    }

    fn credit_treasury(&mut self, amount: f32) {
        *self.treasury += amount;
    }
}
