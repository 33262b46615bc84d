//! Agent archetype with SoA layout

use serde::{Deserialize, Serialize};

use crate::core::types::{AgentId, BuildingId, Vec2};
use crate::entity::skills::{Profession, SkillTable};
use crate::goods::Stockpile;
use crate::tasks::queue::TaskQueue;

/// Structure of Arrays for agents
///
/// Agents are never removed, so `ids[i] == AgentId(i)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentArchetype {
    pub ids: Vec<AgentId>,
    pub names: Vec<String>,
    pub positions: Vec<Vec2>,
    pub money: Vec<f32>,
    /// Goods carried on the agent's person
    pub stockpiles: Vec<Stockpile>,
    pub skills: Vec<SkillTable>,
    /// 0.0 = fed, 1.0 = starving
    pub hunger: Vec<f32>,
    /// Assigned home (None = homeless)
    pub homes: Vec<Option<BuildingId>>,
    pub professions: Vec<Profession>,
    pub task_queues: Vec<TaskQueue>,
}

impl AgentArchetype {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.ids.len()
    }

    pub fn spawn(&mut self, name: String, position: Vec2, profession: Profession) -> AgentId {
        let id = AgentId(self.ids.len() as u32);
        self.ids.push(id);
        self.names.push(name);
        self.positions.push(position);
        self.money.push(0.0);
        self.stockpiles.push(Stockpile::new());
        self.skills.push(SkillTable::new());
        self.hunger.push(0.0);
        self.homes.push(None);
        self.professions.push(profession);
        self.task_queues.push(TaskQueue::new());
        id
    }

    pub fn index_of(&self, id: AgentId) -> Option<usize> {
        (id.index() < self.count()).then_some(id.index())
    }

    pub fn iter_homeless(&self) -> impl Iterator<Item = usize> + '_ {
        self.homes
            .iter()
            .enumerate()
            .filter(|(_, home)| home.is_none())
            .map(|(i, _)| i)
    }

    pub fn iter_profession(&self, profession: Profession) -> impl Iterator<Item = usize> + '_ {
        self.professions
            .iter()
            .enumerate()
            .filter(move |(_, p)| **p == profession)
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_archetype_spawn() {
        let mut agents = AgentArchetype::new();
        let a = agents.spawn("Ada".into(), Vec2::new(1.0, 2.0), Profession::Baker);
        let b = agents.spawn("Bram".into(), Vec2::default(), Profession::Soldier);

        assert_eq!(agents.count(), 2);
        assert_eq!(a, AgentId(0));
        assert_eq!(b, AgentId(1));
        assert_eq!(agents.index_of(b), Some(1));
        assert_eq!(agents.index_of(AgentId(5)), None);
        assert!(agents.task_queues[0].is_empty());
        assert_eq!(agents.money[1], 0.0);
    }

    #[test]
    fn test_iter_homeless() {
        let mut agents = AgentArchetype::new();
        agents.spawn("A".into(), Vec2::default(), Profession::Farmer);
        agents.spawn("B".into(), Vec2::default(), Profession::Farmer);
        agents.homes[0] = Some(BuildingId(0));

        let homeless: Vec<usize> = agents.iter_homeless().collect();
        assert_eq!(homeless, vec![1]);
    }

    #[test]
    fn test_iter_profession() {
        let mut agents = AgentArchetype::new();
        agents.spawn("A".into(), Vec2::default(), Profession::Soldier);
        agents.spawn("B".into(), Vec2::default(), Profession::Farmer);
        agents.spawn("C".into(), Vec2::default(), Profession::Soldier);

        let soldiers: Vec<usize> = agents.iter_profession(Profession::Soldier).collect();
        assert_eq!(soldiers, vec![0, 2]);
    }
}
