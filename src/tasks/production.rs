//! Producing goods from a catalog requirement
//!
//! Init turns the requirement into prerequisites: the tool, each
//! ingredient, and the workplace. The output is scaled by the scarcest
//! ingredient, so a short delivery shrinks the yield instead of failing.

use serde::{Deserialize, Serialize};

use crate::goods::stockpile::EMPTY;
use crate::goods::{Good, GoodCategory, GoodId};
use crate::tasks::context::TaskContext;
use crate::tasks::sourcing::SourceGoods;
use crate::tasks::status::TaskValue;
use crate::tasks::task::{Plan, Progress, Task, TaskBehavior, TaskKind};
use crate::world::spatial::{Site, SpatialQuery};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProduceGoods {
    pub good: GoodId,
    pub quantity: f32,
    pub depth: u32,
    /// Ingredient quantities for the whole batch, fixed at init
    ingredients: Vec<Good>,
    /// What the sourcing children reported
    sourced: Vec<Good>,
    site: Option<Site>,
    elapsed: f32,
    duration: Option<f32>,
}

impl ProduceGoods {
    pub fn new(good: GoodId, quantity: f32, depth: u32) -> Self {
        Self {
            good,
            quantity,
            depth,
            ingredients: Vec::new(),
            sourced: Vec::new(),
            site: None,
            elapsed: 0.0,
            duration: None,
        }
    }

    pub fn ingredients(&self) -> &[Good] {
        &self.ingredients
    }

    pub fn site(&self) -> Option<Site> {
        self.site
    }

    fn sourced_quantity(&self, good: GoodId) -> f32 {
        self.sourced
            .iter()
            .filter(|g| g.id == good)
            .map(|g| g.quantity)
            .sum()
    }

    fn source(&self, good: GoodId, quantity: f32) -> Task {
        Task::new(TaskKind::SourceGoods(SourceGoods::new(good, quantity, self.depth)))
    }

    fn compute_duration(&self, ctx: &TaskContext) -> f32 {
        let Some(requirement) = ctx.catalog.get(self.good) else {
            return 0.0;
        };
        let level = requirement
            .skill
            .map_or(0, |s| ctx.skills().level(s.skill));
        let mut duration =
            requirement.base_time * self.quantity * ctx.config.skill_speed_factor(level);

        // Poor soil slows food harvesting
        if self.good.category == GoodCategory::Food {
            if let Some(Site::Tile(coord)) = self.site {
                if let Some(tile) = ctx.world.tiles.get(coord) {
                    duration /= tile.soil_quality.max(0.05);
                }
            }
        }
        duration
    }

    /// Apply the result of a finished production run
    fn complete(&mut self, ctx: &mut TaskContext) -> Progress {
        let catalog = ctx.catalog;
        let config = ctx.config;
        let Some(requirement) = catalog.get(self.good) else {
            return Progress::Failed;
        };

        let mut ratio: f32 = 1.0;
        for ingredient in &self.ingredients {
            if ingredient.quantity <= 0.0 {
                continue;
            }
            let sourced = self.sourced_quantity(ingredient.id);
            let held = ctx.stockpile().get(ingredient.id);
            if held + EMPTY < sourced {
                tracing::warn!(
                    "{}: {:.3} of {} went missing before producing {}",
                    ctx.agent,
                    sourced - held,
                    ingredient.id,
                    requirement.name
                );
            }
            ratio = ratio.min(sourced.min(held) / ingredient.quantity);
        }
        let ratio = ratio.clamp(0.0, 1.0);
        let produced = self.quantity * ratio;

        if let Some(skill) = requirement.skill {
            let gained = ctx.skills_mut().grant_experience(
                skill.skill,
                config.experience_per_unit * produced,
                config.experience_per_level,
            );
            if gained > 0 {
                tracing::debug!("{} gained {} level(s) in {:?}", ctx.agent, gained, skill.skill);
            }
        }

        if let Some(Site::Tile(coord)) = self.site {
            if let Some(tile) = ctx.world.tiles.get_mut(coord) {
                if tile.tile_type.depletes() {
                    tile.deplete(config.tile_depletion_per_unit * produced);
                }
            }
        }

        let stockpile = ctx.stockpile_mut();
        for ingredient in &self.ingredients {
            stockpile.remove(ingredient.id, ingredient.quantity * ratio);
        }
        if let Some(tool) = requirement.tool {
            stockpile.remove(tool, config.tool_wear_per_use);
        }
        stockpile.add(self.good, produced);

        tracing::debug!(
            "{} produced {:.3} {} (ratio {:.2})",
            ctx.agent,
            produced,
            requirement.name,
            ratio
        );
        Progress::Done(TaskValue::Goods(vec![Good::new(self.good, produced)]))
    }
}

impl TaskBehavior for ProduceGoods {
    fn init(&mut self, ctx: &mut TaskContext) -> Plan {
        let catalog = ctx.catalog;
        let Some(requirement) = catalog.get(self.good) else {
            return Plan::Fail;
        };
        if let Some(skill) = requirement.skill {
            if !ctx.skills().meets(skill.skill, skill.min_level) {
                return Plan::Fail;
            }
        }

        // Probe the workplace first so an impossible goal fails at once
        let origin = ctx.position();
        let mut locate = None;
        if let Some(building) = requirement.building {
            let home_fits = ctx.home().filter(|&home| {
                ctx.world.buildings.index_of(home).map_or(false, |idx| {
                    building.accepts(
                        ctx.world.buildings.building_types[idx],
                        ctx.world.buildings.subtypes[idx],
                    )
                })
            });
            if let Some(home) = home_fits {
                self.site = Some(Site::Building(home));
            } else {
                let reachable = ctx.world.nearest_building(origin, &|b| {
                    building.accepts(b.building_type, b.subtype)
                });
                if reachable.is_none() {
                    return Plan::Fail;
                }
                locate = Some(Task::find_building(building.building_type, building.subtype));
            }
        } else if let Some(tile_type) = requirement.tile {
            let reachable = ctx
                .world
                .nearest_tile(origin, &|t| t.tile_type == tile_type && t.is_harvestable());
            if reachable.is_none() {
                return Plan::Fail;
            }
            locate = Some(Task::find_tile(tile_type));
        }

        self.ingredients = match &requirement.ingredients {
            Some(ingredients) => ingredients.resolve(self.quantity, &mut ctx.world.rng),
            None => Vec::new(),
        };

        let mut children = Vec::new();
        if let Some(tool) = requirement.tool {
            children.push(self.source(tool, 1.0));
        }
        for ingredient in &self.ingredients {
            children.push(self.source(ingredient.id, ingredient.quantity));
        }
        if let Some(find) = locate {
            children.push(find);
        } else if let Some(site) = self.site {
            if let Some(position) = ctx.world.site_position(site) {
                children.push(Task::move_to(position));
            }
        }
        Plan::Then(children)
    }

    fn adopt(&mut self, child: &Task, ctx: &mut TaskContext) -> Plan {
        match &child.kind {
            TaskKind::SourceGoods(_) => {
                self.sourced.extend_from_slice(child.status().value.goods());
                Plan::proceed()
            }
            TaskKind::FindBuilding(_) | TaskKind::FindTile(_) => {
                let TaskValue::Site(site) = child.status().value else {
                    return Plan::Fail;
                };
                self.site = Some(site);
                match ctx.world.site_position(site) {
                    Some(position) => Plan::Then(vec![Task::move_to(position)]),
                    None => Plan::Fail,
                }
            }
            _ => Plan::proceed(),
        }
    }

    fn terminal(&mut self, ctx: &mut TaskContext) -> Progress {
        let duration = match self.duration {
            Some(duration) => duration,
            None => {
                let duration = self.compute_duration(ctx);
                self.duration = Some(duration);
                duration
            }
        };

        self.elapsed += ctx.dt;
        if self.elapsed < duration {
            return Progress::Pending;
        }
        self.complete(ctx)
    }

    fn describe(&self) -> String {
        format!("produce {:.2} of {}", self.quantity, self.good)
    }
}
