//! Mutable view handed to a task while it steps

use crate::core::config::SimulationConfig;
use crate::core::types::{AgentId, BuildingId, Vec2};
use crate::ecs::world::World;
use crate::entity::skills::SkillTable;
use crate::goods::{GoodsCatalog, Stockpile};

/// Everything a task may read or change during one step
///
/// The acting agent's own task queue is detached from the world for the
/// duration of the step, so tasks never see or touch it here.
pub struct TaskContext<'a> {
    pub agent: AgentId,
    pub world: &'a mut World,
    pub catalog: &'a GoodsCatalog,
    pub config: &'a SimulationConfig,
    /// Seconds elapsed since the previous tick
    pub dt: f32,
}

impl<'a> TaskContext<'a> {
    pub fn new(
        agent: AgentId,
        world: &'a mut World,
        catalog: &'a GoodsCatalog,
        config: &'a SimulationConfig,
        dt: f32,
    ) -> Self {
        Self {
            agent,
            world,
            catalog,
            config,
            dt,
        }
    }

    fn idx(&self) -> usize {
        self.agent.index()
    }

    pub fn position(&self) -> Vec2 {
        self.world.agents.positions[self.idx()]
    }

    pub fn set_position(&mut self, position: Vec2) {
        let idx = self.idx();
        self.world.agents.positions[idx] = position;
    }

    pub fn stockpile(&self) -> &Stockpile {
        &self.world.agents.stockpiles[self.idx()]
    }

    pub fn stockpile_mut(&mut self) -> &mut Stockpile {
        let idx = self.idx();
        &mut self.world.agents.stockpiles[idx]
    }

    pub fn skills(&self) -> &SkillTable {
        &self.world.agents.skills[self.idx()]
    }

    pub fn skills_mut(&mut self) -> &mut SkillTable {
        let idx = self.idx();
        &mut self.world.agents.skills[idx]
    }

    pub fn money(&self) -> f32 {
        self.world.agents.money[self.idx()]
    }

    pub fn hunger(&self) -> f32 {
        self.world.agents.hunger[self.idx()]
    }

    pub fn set_hunger(&mut self, hunger: f32) {
        let idx = self.idx();
        self.world.agents.hunger[idx] = hunger.clamp(0.0, 1.0);
    }

    pub fn home(&self) -> Option<BuildingId> {
        self.world.agents.homes[self.idx()]
    }

    pub fn home_position(&self) -> Option<Vec2> {
        self.home().and_then(|h| self.world.buildings.position(h))
    }

    /// Personal stockpile and home stockpile, borrowed together
    pub fn stockpile_and_home(&mut self) -> Option<(&mut Stockpile, &mut Stockpile)> {
        let idx = self.idx();
        let home = self.world.agents.homes[idx]?;
        let home_idx = self.world.buildings.index_of(home)?;
        Some((
            &mut self.world.agents.stockpiles[idx],
            &mut self.world.buildings.stockpiles[home_idx],
        ))
    }
}
