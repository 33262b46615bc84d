//! Task step protocol tests
//!
//! Every task variant shares one step contract:
//! - A failed task is always complete
//! - Stepping a complete task changes nothing
//! - Completion and failure climb the tree one level per tick

use guildhall::city::building::BuildingType;
use guildhall::core::config::SimulationConfig;
use guildhall::core::types::{AgentId, Vec2};
use guildhall::ecs::world::World;
use guildhall::entity::skills::{Profession, Skill};
use guildhall::goods::good::{BREAD, WHEAT};
use guildhall::goods::GoodsCatalog;
use guildhall::tasks::{Task, TaskContext, TaskKind, TaskValue};
use guildhall::world::tiles::TileMap;

struct Harness {
    world: World,
    catalog: GoodsCatalog,
    config: SimulationConfig,
    agent: AgentId,
}

impl Harness {
    fn new() -> Self {
        let catalog = GoodsCatalog::with_defaults();
        let config = SimulationConfig::default();
        let mut world = World::new(TileMap::new(8, 8, 16.0, 16.0), &catalog, &config, 3);
        let agent = world.spawn_agent("Tester".into(), Vec2::default(), Profession::Baker);
        Self {
            world,
            catalog,
            config,
            agent,
        }
    }

    fn step(&mut self, task: &mut Task, dt: f32) {
        let mut ctx = TaskContext::new(self.agent, &mut self.world, &self.catalog, &self.config, dt);
        task.step(&mut ctx);
    }
}

// ============================================================================
// Status invariants
// ============================================================================

#[test]
fn test_failed_task_is_complete() {
    let mut h = Harness::new();
    let mut eat = Task::eat();
    h.step(&mut eat, 0.1);

    let status = eat.status();
    assert!(status.failed);
    assert!(status.complete);
}

#[test]
fn test_stepping_complete_task_is_idempotent() {
    let mut h = Harness::new();
    h.world.agents.stockpiles[0].add(WHEAT, 3.0);

    let mut source = Task::source_goods(WHEAT, 2.0);
    h.step(&mut source, 0.1);
    assert!(source.status().succeeded());
    let first = source.status().clone();

    h.world.agents.stockpiles[0].remove(WHEAT, 3.0);
    for _ in 0..5 {
        h.step(&mut source, 0.1);
    }
    assert_eq!(source.status(), &first);
    assert_eq!(source.status().value.goods()[0].quantity, 2.0);
}

#[test]
fn test_abandoned_task_stays_failed() {
    let mut h = Harness::new();
    let barracks = h
        .world
        .spawn_building(BuildingType::Barracks, 0, Vec2::new(160.0, 0.0));
    let mut deploy = Task::deploy(barracks);
    h.step(&mut deploy, 0.1);
    assert!(!deploy.is_complete());

    deploy.abandon();
    let before = h.world.agents.positions[0];
    h.step(&mut deploy, 0.1);
    assert!(deploy.status().complete && deploy.status().failed);
    assert_eq!(h.world.agents.positions[0], before);
    assert_eq!(deploy.children().count(), 0);
}

// ============================================================================
// One level per tick
// ============================================================================

/// Sourcing bread with no bakery anywhere: the production leaf fails on
/// the first tick and its parent only notices on the second.
#[test]
fn test_failure_climbs_one_level_per_tick() {
    let mut h = Harness::new();
    h.world.agents.skills[0].set_level(Skill::Baking, 1);

    let mut source = Task::source_goods(BREAD, 1.0);
    h.step(&mut source, 0.1);
    assert!(!source.is_complete());
    let leaf = source.active_leaf();
    assert!(matches!(leaf.kind, TaskKind::SourceGoods(_)));
    let child = source.children().next().map(|c| (c.is_complete(), c.status().failed));
    assert_eq!(child, Some((true, true)));

    h.step(&mut source, 0.1);
    assert!(source.status().complete && source.status().failed);
}

/// A walk finishes on the tick the agent arrives; the parent collects it
/// on the following tick.
#[test]
fn test_success_climbs_one_level_per_tick() {
    let mut h = Harness::new();
    h.world.agents.stockpiles[0].add(WHEAT, 1.0);
    let home = h.world.spawn_building(BuildingType::House, 0, Vec2::new(4.0, 0.0));
    assert!(h.world.move_into(h.agent, home));
    h.world.buildings.stockpiles[0].add(WHEAT, 5.0);

    // Held 1, home has the rest: take 2 from home and walk back
    let mut source = Task::source_goods(WHEAT, 3.0);
    h.step(&mut source, 1.0);
    assert!(!source.is_complete());
    assert!((h.world.agents.stockpiles[0].get(WHEAT) - 3.0).abs() < 1e-4);
    assert!(source.children().all(Task::is_complete));

    h.step(&mut source, 1.0);
    assert!(source.status().succeeded());
    assert_eq!(h.world.agents.positions[0], Vec2::new(4.0, 0.0));
    match &source.status().value {
        TaskValue::Goods(goods) => assert!((goods[0].quantity - 3.0).abs() < 1e-4),
        other => panic!("unexpected value {:?}", other),
    }
}

/// Only the deepest pending task does work on a tick.
#[test]
fn test_only_active_leaf_moves_agent() {
    let mut h = Harness::new();
    let mut walk = Task::move_to(Vec2::new(320.0, 0.0));
    h.step(&mut walk, 1.0);
    let after_one = h.world.agents.positions[0].x;
    assert!((after_one - h.config.agent_speed).abs() < 1e-3);
    assert!(std::ptr::eq(walk.active_leaf(), &walk));

    h.step(&mut walk, 1.0);
    assert!((h.world.agents.positions[0].x - 2.0 * h.config.agent_speed).abs() < 1e-3);
    assert!(!walk.is_complete());
}
