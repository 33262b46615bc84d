//! Guildhall - Entry Point
//!
//! Builds a small settlement, runs it headless for a number of ticks and
//! prints a JSON summary of the economy.

use clap::Parser;
use serde::Serialize;

use guildhall::city::building::BuildingType;
use guildhall::core::config::SimulationConfig;
use guildhall::core::error::Result;
use guildhall::core::types::Vec2;
use guildhall::ecs::world::World;
use guildhall::entity::skills::{Profession, Skill};
use guildhall::goods::catalog::{WORKSHOP_CARPENTRY, WORKSHOP_SAWMILL};
use guildhall::goods::good::{AXE, FISHING_ROD, HAMMER, HOE, PICKAXE, PLANKS, STONE};
use guildhall::goods::GoodsCatalog;
use guildhall::simulation::{Simulation, SimulationEvent};
use guildhall::world::tiles::{Tile, TileCoord, TileMap, TileType};

/// Guildhall - run a headless settlement economy
#[derive(Parser, Debug)]
#[command(name = "guildhall")]
#[command(about = "Run an agent-driven settlement economy and report the outcome")]
struct Args {
    /// Random seed for reproducible runs
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 2000)]
    ticks: u64,

    /// Seconds of simulated time per tick
    #[arg(long, default_value_t = 0.5)]
    dt: f32,

    /// Population size
    #[arg(long, default_value_t = 24)]
    agents: usize,

    /// Optional TOML file overriding simulation parameters
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Optional TOML goods catalog replacing the built-in one
    #[arg(long)]
    catalog: Option<std::path::PathBuf>,
}

#[derive(Debug, Default, Serialize)]
struct Summary {
    ticks: u64,
    agents: usize,
    buildings: usize,
    homeless: usize,
    soldiers: usize,
    treasury: f32,
    total_money: f32,
    goals_chosen: usize,
    tasks_completed: usize,
    tasks_failed: usize,
    moved_in: usize,
    buildings_raised: usize,
    prices: Vec<(String, f32)>,
}

const MAP_SIZE: u32 = 24;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "guildhall=info".into()),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SimulationConfig::load_from_toml(path)?,
        None => SimulationConfig::default(),
    };
    let catalog = match &args.catalog {
        Some(path) => GoodsCatalog::load_from_toml(path)?,
        None => GoodsCatalog::with_defaults(),
    };

    let world = build_settlement(&catalog, &config, args.seed, args.agents);
    tracing::info!(
        "Settlement {} ready: {} agents, {} buildings",
        world.session,
        world.agent_count(),
        world.buildings.count()
    );

    let mut sim = Simulation::new(world, catalog, config);
    let mut summary = Summary::default();

    for _ in 0..args.ticks {
        for event in sim.step(args.dt) {
            match event {
                SimulationEvent::GoalChosen { .. } => summary.goals_chosen += 1,
                SimulationEvent::TaskCompleted { .. } => summary.tasks_completed += 1,
                SimulationEvent::TaskFailed { .. } => summary.tasks_failed += 1,
                SimulationEvent::MovedIn { .. } => summary.moved_in += 1,
                SimulationEvent::BuildingRaised { agent, building } => {
                    tracing::info!("{} raised {}", agent, building);
                    summary.buildings_raised += 1;
                }
            }
        }
    }

    summary.ticks = sim.world.current_tick;
    summary.agents = sim.world.agent_count();
    summary.buildings = sim.world.buildings.count();
    summary.homeless = sim.world.agents.iter_homeless().count();
    summary.soldiers = sim.world.agents.iter_profession(Profession::Soldier).count();
    summary.treasury = sim.world.treasury;
    summary.total_money = sim.world.agents.money.iter().sum();
    summary.prices = sim
        .catalog
        .all()
        .iter()
        .filter_map(|req| {
            sim.world
                .exchange
                .price(req.good)
                .map(|p| (req.name.clone(), p))
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Lay out terrain bands, a town centre and a mixed population
fn build_settlement(
    catalog: &GoodsCatalog,
    config: &SimulationConfig,
    seed: u64,
    population: usize,
) -> World {
    let mut tiles = TileMap::new(MAP_SIZE, MAP_SIZE, config.tile_width, config.tile_height);
    for y in 0..MAP_SIZE {
        for x in 0..MAP_SIZE {
            let tile = match (x, y) {
                (0..=5, _) => Tile::new(TileType::Farmland).with_soil(0.6 + (y % 4) as f32 * 0.1),
                (18.., 0..=11) => Tile::new(TileType::Forest).with_resources(40.0),
                (18.., _) => Tile::new(TileType::Mountain).with_resources(60.0),
                (_, 20..) => Tile::new(TileType::Water),
                _ => continue,
            };
            tiles.set(TileCoord::new(x, y), tile);
        }
    }

    let mut world = World::new(tiles, catalog, config, seed);
    let at = |x: u32, y: u32| Vec2::new(x as f32 * config.tile_width, y as f32 * config.tile_height);

    world.spawn_building(BuildingType::Market, 0, at(12, 12));
    world.spawn_building(BuildingType::Mill, 0, at(8, 10));
    world.spawn_building(BuildingType::Bakery, 0, at(10, 8));
    world.spawn_building(BuildingType::Kitchen, 0, at(14, 8));
    world.spawn_building(BuildingType::Smithy, 0, at(15, 14));
    world.spawn_building(BuildingType::Workshop, WORKSHOP_SAWMILL, at(16, 10));
    world.spawn_building(BuildingType::Workshop, WORKSHOP_CARPENTRY, at(16, 12));
    world.spawn_building(BuildingType::Barracks, 0, at(12, 16));
    for i in 0..3 {
        world.spawn_building(BuildingType::House, 0, at(9 + i * 2, 14));
    }
    world.treasury = 50.0;

    const ROSTER: [(Profession, Skill); 10] = [
        (Profession::Farmer, Skill::Farming),
        (Profession::Farmer, Skill::Farming),
        (Profession::Baker, Skill::Baking),
        (Profession::Cook, Skill::Cooking),
        (Profession::Fisher, Skill::Fishing),
        (Profession::Woodcutter, Skill::Forestry),
        (Profession::Miner, Skill::Mining),
        (Profession::Carpenter, Skill::Carpentry),
        (Profession::Smith, Skill::Smithing),
        (Profession::Builder, Skill::Construction),
    ];

    for i in 0..population {
        let (profession, skill) = if i > 0 && i % 11 == 0 {
            (Profession::Soldier, None)
        } else {
            let (profession, skill) = ROSTER[i % ROSTER.len()];
            (profession, Some(skill))
        };
        let name = format!("{:?} {}", profession, i);
        let id = world.spawn_agent(name, at(12, 12), profession);
        let idx = id.index();

        world.agents.money[idx] = 20.0;
        if let Some(skill) = skill {
            world.agents.skills[idx].set_level(skill, 2);
        }
        let stock = &mut world.agents.stockpiles[idx];
        match profession {
            Profession::Farmer => stock.add(HOE, 1.0),
            Profession::Fisher => stock.add(FISHING_ROD, 1.0),
            Profession::Woodcutter => stock.add(AXE, 1.0),
            Profession::Miner => stock.add(PICKAXE, 1.0),
            Profession::Builder | Profession::Carpenter => {
                stock.add(HAMMER, 1.0);
                stock.add(PLANKS, 6.0);
                stock.add(STONE, 4.0);
            }
            _ => {}
        }
    }

    world
}
