//! Top-level goal synthesis for idle agents
//!
//! Needs come first (a home, soldier duty, emptying full pockets). After
//! that an agent either chases the most profitable good it can make or
//! rolls a skill, weighted toward its profession and, when hungry, toward
//! cooking.

use ordered_float::OrderedFloat;
use rand::Rng;

use crate::city::building::BuildingType;
use crate::core::config::SimulationConfig;
use crate::core::types::AgentId;
use crate::ecs::world::World;
use crate::entity::skills::{Profession, Skill};
use crate::goods::good::HOUSE;
use crate::goods::stockpile::EMPTY;
use crate::goods::{GoodId, GoodsCatalog, Ingredients, ProductionRequirement};
use crate::tasks::continuation::Continuation;
use crate::tasks::task::Task;
use crate::world::spatial::SpatialQuery;

/// Tasks to queue, in order, for an agent with an empty queue
pub fn synthesize(
    agent: AgentId,
    world: &mut World,
    catalog: &GoodsCatalog,
    config: &SimulationConfig,
) -> Vec<Task> {
    let idx = agent.index();
    let position = world.agents.positions[idx];

    if world.agents.homes[idx].is_none() {
        let vacancy = world.nearest_building(position, &|b| {
            b.building_type == BuildingType::House && b.vacancies > 0
        });
        if vacancy.is_some() {
            return vec![Task::find_new_home().on_success(Continuation::MoveIntoHome)];
        }
        if can_build(agent, world) {
            return vec![Task::build(HOUSE)
                .on_success(Continuation::MoveIntoHome)
                .on_failure(Continuation::ReleaseOrders)];
        }
    }

    if world.agents.professions[idx] == Profession::Soldier {
        let barracks = world.nearest_building(position, &|b| {
            b.building_type == BuildingType::Barracks
        });
        if let Some(post) = barracks {
            return vec![Task::deploy(post)];
        }
    }

    let carried = world.agents.stockpiles[idx].total_where(|id| !id.is_tool());
    if carried > config.carry_limit {
        if let Some(home) = world.agents.homes[idx].and_then(|h| world.buildings.position(h)) {
            return vec![Task::move_to(home), Task::deposit_inventory()];
        }
    }

    let roll: f32 = world.rng.gen();
    if roll < config.profit_seek_chance {
        if let Some(good) = most_lucrative(agent, world, catalog) {
            return vec![production_goal(good, catalog, config)];
        }
    }

    if let Some(skill) = pick_skill(agent, world, catalog, config) {
        let holds_cookable = world.agents.stockpiles[idx].total_where(|id| id.is_cookable()) > EMPTY;
        if skill == Skill::Cooking && holds_cookable {
            return vec![Task::cook().on_success(Continuation::EatResult)];
        }
        let candidates = producible_with(skill, agent, world, catalog);
        if !candidates.is_empty() {
            let good = candidates[world.rng.gen_range(0..candidates.len())];
            return vec![production_goal(good, catalog, config)];
        }
    }

    vec![Task::idle_at_home(config.idle_duration)]
}

/// Produce a batch; cooked dishes are eaten, everything else is sold
fn production_goal(good: GoodId, catalog: &GoodsCatalog, config: &SimulationConfig) -> Task {
    let cooked = catalog
        .get(good)
        .and_then(|r| r.skill)
        .map_or(false, |s| s.skill == Skill::Cooking);
    let follow_up = if cooked {
        Continuation::EatResult
    } else {
        Continuation::SellResult
    };
    Task::produce_goods(good, config.production_batch)
        .on_success(follow_up)
        .on_failure(Continuation::ReleaseOrders)
}

fn can_build(agent: AgentId, world: &World) -> bool {
    let idx = agent.index();
    world.agents.professions[idx] == Profession::Builder
        || world.agents.skills[idx].level(Skill::Construction) > 0
}

/// Whether the agent could start producing this good right now
fn can_produce(requirement: &ProductionRequirement, agent: AgentId, world: &World) -> bool {
    let idx = agent.index();
    if requirement.good.is_building() {
        return false;
    }
    if let Some(skill) = requirement.skill {
        if !world.agents.skills[idx].meets(skill.skill, skill.min_level) {
            return false;
        }
    }

    let position = world.agents.positions[idx];
    if let Some(building) = requirement.building {
        return world
            .nearest_building(position, &|b| building.accepts(b.building_type, b.subtype))
            .is_some();
    }
    if let Some(tile_type) = requirement.tile {
        return world
            .nearest_tile(position, &|t| t.tile_type == tile_type && t.is_harvestable())
            .is_some();
    }
    true
}

fn producible_with(skill: Skill, agent: AgentId, world: &World, catalog: &GoodsCatalog) -> Vec<GoodId> {
    catalog
        .produced_with(skill)
        .filter(|r| can_produce(r, agent, world))
        .map(|r| r.good)
        .collect()
}

/// Market value of one unit's ingredients; one-of picks the cheapest
fn ingredient_cost(requirement: &ProductionRequirement, world: &World) -> f32 {
    let price = |id: GoodId| world.exchange.price(id).unwrap_or(0.0);
    match &requirement.ingredients {
        None => 0.0,
        Some(Ingredients::All(goods)) => goods.iter().map(|g| g.quantity * price(g.id)).sum(),
        Some(Ingredients::OneOf(goods)) => goods
            .iter()
            .map(|g| g.quantity * price(g.id))
            .min_by_key(|c| OrderedFloat(*c))
            .unwrap_or(0.0),
    }
}

/// Producible good with the widest margin of market price over inputs
pub fn most_lucrative(agent: AgentId, world: &World, catalog: &GoodsCatalog) -> Option<GoodId> {
    catalog
        .all()
        .iter()
        .filter(|r| can_produce(r, agent, world))
        .filter_map(|r| {
            let price = world.exchange.price(r.good)?;
            Some((r.good, price - ingredient_cost(r, world)))
        })
        .max_by_key(|(_, margin)| OrderedFloat(*margin))
        .map(|(good, _)| good)
}

/// Weighted roll over skills the agent can currently put to use
///
/// Weight is `level + 1`, multiplied for the profession's skill; cooking
/// gains weight with hunger.
pub fn pick_skill(
    agent: AgentId,
    world: &mut World,
    catalog: &GoodsCatalog,
    config: &SimulationConfig,
) -> Option<Skill> {
    let idx = agent.index();
    let profession_skill = world.agents.professions[idx].skill();
    let hunger = world.agents.hunger[idx];
    let holds_cookable = world.agents.stockpiles[idx].total_where(|id| id.is_cookable()) > EMPTY;

    let weights: Vec<(Skill, f32)> = Skill::ALL
        .iter()
        .filter_map(|&skill| {
            let usable = !producible_with(skill, agent, world, catalog).is_empty()
                || (skill == Skill::Cooking && holds_cookable);
            if !usable {
                return None;
            }
            let mut weight = world.agents.skills[idx].level(skill) as f32 + 1.0;
            if profession_skill == Some(skill) {
                weight *= config.profession_bias;
            }
            if skill == Skill::Cooking {
                weight += hunger * config.hunger_cooking_bias;
            }
            Some((skill, weight))
        })
        .collect();

    let total: f32 = weights.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return None;
    }
    let mut roll = world.rng.gen::<f32>() * total;
    for (skill, weight) in &weights {
        if roll < *weight {
            return Some(*skill);
        }
        roll -= weight;
    }
    weights.last().map(|(skill, _)| *skill)
}
