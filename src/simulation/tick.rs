//! Tick system - the agent execution loop
//!
//! Each tick, every agent in index order gets hungrier, loses some food to
//! spoilage, maybe queues an urgent meal or a fresh goal, and then steps
//! exactly one task. The market walks its prices once at the end.
//!
//! Agents run strictly one after another; that order decides who wins a
//! scarce good within a tick.

use serde::Serialize;

use crate::core::config::SimulationConfig;
use crate::core::types::{AgentId, BuildingId, Tick};
use crate::ecs::world::World;
use crate::goods::stockpile::EMPTY;
use crate::goods::{Good, GoodsCatalog};
use crate::market::Side;
use crate::simulation::goals;
use crate::tasks::context::TaskContext;
use crate::tasks::continuation::Continuation;
use crate::tasks::queue::TaskQueue;
use crate::tasks::status::TaskValue;
use crate::tasks::task::Task;

/// Events generated during a simulation tick
#[derive(Debug, Clone, Serialize)]
pub enum SimulationEvent {
    /// An idle agent picked new top-level work
    GoalChosen {
        agent: AgentId,
        description: String,
        tick: Tick,
    },
    /// A top-level task finished successfully
    TaskCompleted {
        agent: AgentId,
        description: String,
        tick: Tick,
    },
    /// A top-level task failed
    TaskFailed {
        agent: AgentId,
        description: String,
        tick: Tick,
    },
    MovedIn {
        agent: AgentId,
        home: BuildingId,
    },
    BuildingRaised {
        agent: AgentId,
        building: BuildingId,
    },
}

/// World plus the immutable rules it runs under
pub struct Simulation {
    pub world: World,
    pub catalog: GoodsCatalog,
    pub config: SimulationConfig,
}

impl Simulation {
    pub fn new(world: World, catalog: GoodsCatalog, config: SimulationConfig) -> Self {
        Self {
            world,
            catalog,
            config,
        }
    }

    /// Advance the whole simulation by `dt` seconds
    pub fn step(&mut self, dt: f32) -> Vec<SimulationEvent> {
        let mut events = Vec::new();

        for idx in 0..self.world.agents.count() {
            self.update_needs(idx, dt);
            self.run_agent(idx, dt, &mut events);
        }

        self.world.exchange.update_prices(dt);
        self.world.tick();
        events
    }

    fn update_needs(&mut self, idx: usize, dt: f32) {
        let agents = &mut self.world.agents;
        agents.hunger[idx] = (agents.hunger[idx] + self.config.hunger_rate * dt).min(1.0);
        agents.stockpiles[idx].spoil(self.config.spoilage_rate * dt);
    }

    fn run_agent(&mut self, idx: usize, dt: f32, events: &mut Vec<SimulationEvent>) {
        let agent = AgentId(idx as u32);
        let tick = self.world.current_tick;

        // Detach the queue so tasks can borrow the rest of the world freely
        let mut queue = std::mem::take(&mut self.world.agents.task_queues[idx]);

        let hungry = self.world.agents.hunger[idx] >= self.config.eat_threshold;
        let has_food = self.world.agents.stockpiles[idx].total_where(|id| id.is_edible()) > EMPTY;
        if hungry && has_food && !queue.has_priority_task() {
            queue.enqueue_with_priority(Task::eat(), 0);
        }

        if queue.is_empty() {
            for goal in goals::synthesize(agent, &mut self.world, &self.catalog, &self.config) {
                tracing::debug!("{} chose goal: {}", agent, goal.describe());
                events.push(SimulationEvent::GoalChosen {
                    agent,
                    description: goal.describe(),
                    tick,
                });
                queue.enqueue(goal);
            }
        }

        let complete = match queue.peek_mut() {
            Some(task) => {
                let mut ctx =
                    TaskContext::new(agent, &mut self.world, &self.catalog, &self.config, dt);
                task.step(&mut ctx).complete
            }
            None => false,
        };

        if complete {
            if let Some(task) = queue.dequeue() {
                self.finish(agent, task, &mut queue, events);
            }
        }

        self.world.agents.task_queues[idx] = queue;
    }

    /// Report a dequeued top-level task and run its continuation
    fn finish(
        &mut self,
        agent: AgentId,
        task: Task,
        queue: &mut TaskQueue,
        events: &mut Vec<SimulationEvent>,
    ) {
        let tick = self.world.current_tick;
        let status = task.status();
        if status.failed {
            events.push(SimulationEvent::TaskFailed {
                agent,
                description: task.describe(),
                tick,
            });
        } else {
            events.push(SimulationEvent::TaskCompleted {
                agent,
                description: task.describe(),
                tick,
            });
            if let TaskValue::Building(building) = &status.value {
                events.push(SimulationEvent::BuildingRaised {
                    agent,
                    building: *building,
                });
            }
        }

        if let Some(continuation) = task.continuation() {
            self.resolve(agent, continuation, &status.value, queue, events);
        }
    }

    fn resolve(
        &mut self,
        agent: AgentId,
        continuation: Continuation,
        value: &TaskValue,
        queue: &mut TaskQueue,
        events: &mut Vec<SimulationEvent>,
    ) {
        let idx = agent.index();
        match continuation {
            Continuation::SellResult => {
                let goods: Vec<Good> = value
                    .goods()
                    .iter()
                    .copied()
                    .filter(|g| g.quantity > EMPTY)
                    .collect();
                if goods.is_empty() {
                    return;
                }
                let position = self.world.agents.positions[idx];
                if let Some(market) = self.world.nearest_market(position) {
                    queue.enqueue(Task::move_to(market));
                }
                queue.enqueue(Task::sell(goods));
            }
            Continuation::EatResult => queue.enqueue(Task::eat()),
            Continuation::MoveIntoHome => {
                let Some(home) = value.building() else {
                    return;
                };
                if self.world.move_into(agent, home) {
                    tracing::debug!("{} moved into {}", agent, home);
                    events.push(SimulationEvent::MovedIn { agent, home });
                }
            }
            Continuation::ReleaseOrders => {
                self.world.exchange.cancel_all_orders(agent, Side::Buy);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::building::BuildingType;
    use crate::core::types::Vec2;
    use crate::entity::skills::Profession;
    use crate::goods::good::{BREAD, WHEAT};
    use crate::market::Order;
    use crate::world::tiles::TileMap;

    fn sim() -> Simulation {
        let catalog = GoodsCatalog::with_defaults();
        let config = SimulationConfig::default();
        let world = World::new(TileMap::new(4, 4, 16.0, 16.0), &catalog, &config, 9);
        Simulation::new(world, catalog, config)
    }

    #[test]
    fn test_step_raises_hunger_and_advances_tick() {
        let mut sim = sim();
        sim.world.spawn_agent("A".into(), Vec2::default(), Profession::Laborer);
        sim.step(10.0);
        assert!((sim.world.agents.hunger[0] - sim.config.hunger_rate * 10.0).abs() < 1e-5);
        assert_eq!(sim.world.current_tick, 1);
    }

    #[test]
    fn test_idle_agent_gets_a_goal() {
        let mut sim = sim();
        sim.world.spawn_agent("A".into(), Vec2::default(), Profession::Laborer);
        let events = sim.step(0.1);
        assert!(events
            .iter()
            .any(|e| matches!(e, SimulationEvent::GoalChosen { .. })));
    }

    #[test]
    fn test_sell_result_queues_trip_to_market() {
        let mut sim = sim();
        sim.world
            .spawn_building(BuildingType::Market, 0, Vec2::new(48.0, 0.0));
        let agent = sim.world.spawn_agent("A".into(), Vec2::default(), Profession::Farmer);
        let mut queue = TaskQueue::new();
        let mut events = Vec::new();

        let value = TaskValue::Goods(vec![Good::new(WHEAT, 2.0), Good::new(BREAD, 0.0)]);
        sim.resolve(agent, Continuation::SellResult, &value, &mut queue, &mut events);

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.dequeue().map(|t| t.describe()), Some("move to (48.0, 0.0)".into()));
        let sell = queue.dequeue().map(|t| t.describe()).unwrap_or_default();
        assert!(sell.contains(&WHEAT.to_string()));
        assert!(!sell.contains(&BREAD.to_string()));
    }

    #[test]
    fn test_release_orders_cancels_resting_buys() {
        let mut sim = sim();
        let agent = sim.world.spawn_agent("A".into(), Vec2::default(), Profession::Baker);
        sim.world.agents.money[0] = 10.0;
        {
            let (exchange, mut accounts) = sim.world.market();
            exchange.attempt_transact(Order::buy(agent, WHEAT, 2.0), &mut accounts);
        }
        assert_eq!(sim.world.exchange.standing_orders(WHEAT, Side::Buy).count(), 1);

        let mut queue = TaskQueue::new();
        let mut events = Vec::new();
        sim.resolve(
            agent,
            Continuation::ReleaseOrders,
            &TaskValue::None,
            &mut queue,
            &mut events,
        );
        assert_eq!(sim.world.exchange.standing_orders(WHEAT, Side::Buy).count(), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_move_into_home_continuation() {
        let mut sim = sim();
        let home = sim
            .world
            .spawn_building(BuildingType::House, 0, Vec2::default());
        let agent = sim.world.spawn_agent("A".into(), Vec2::default(), Profession::Laborer);
        let mut queue = TaskQueue::new();
        let mut events = Vec::new();

        sim.resolve(
            agent,
            Continuation::MoveIntoHome,
            &TaskValue::Building(home),
            &mut queue,
            &mut events,
        );
        assert_eq!(sim.world.agents.homes[0], Some(home));
        assert!(matches!(events[..], [SimulationEvent::MovedIn { .. }]));
    }
}
