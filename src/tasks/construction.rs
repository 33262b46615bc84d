//! Raising new buildings

use serde::{Deserialize, Serialize};

use crate::city::building::BuildingType;
use crate::core::types::Vec2;
use crate::goods::{Good, GoodId};
use crate::tasks::context::TaskContext;
use crate::tasks::sourcing::SourceGoods;
use crate::tasks::status::TaskValue;
use crate::tasks::task::{Plan, Progress, Task, TaskBehavior, TaskKind};

/// Construct a catalog building good where the agent stood when it decided
///
/// Materials and the tool are sourced first; the agent then walks back to
/// the site and works for the building's base time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Build {
    pub building: GoodId,
    site: Option<Vec2>,
    materials: Vec<Good>,
    elapsed: f32,
    duration: Option<f32>,
}

impl Build {
    pub fn new(building: GoodId) -> Self {
        Self {
            building,
            site: None,
            materials: Vec::new(),
            elapsed: 0.0,
            duration: None,
        }
    }

    pub fn site(&self) -> Option<Vec2> {
        self.site
    }
}

impl TaskBehavior for Build {
    fn init(&mut self, ctx: &mut TaskContext) -> Plan {
        let catalog = ctx.catalog;
        let Some(requirement) = catalog.get(self.building) else {
            return Plan::Fail;
        };
        if BuildingType::from_good(self.building).is_none() {
            return Plan::Fail;
        }
        if let Some(skill) = requirement.skill {
            if !ctx.skills().meets(skill.skill, skill.min_level) {
                return Plan::Fail;
            }
        }

        let site = ctx.position();
        self.site = Some(site);
        self.materials = match &requirement.ingredients {
            Some(ingredients) => ingredients.resolve(1.0, &mut ctx.world.rng),
            None => Vec::new(),
        };

        let mut children = Vec::new();
        if let Some(tool) = requirement.tool {
            children.push(Task::new(TaskKind::SourceGoods(SourceGoods::new(tool, 1.0, 0))));
        }
        for material in &self.materials {
            children.push(Task::new(TaskKind::SourceGoods(SourceGoods::new(
                material.id,
                material.quantity,
                0,
            ))));
        }
        children.push(Task::move_to(site));
        Plan::Then(children)
    }

    fn terminal(&mut self, ctx: &mut TaskContext) -> Progress {
        let catalog = ctx.catalog;
        let config = ctx.config;
        let (Some(requirement), Some(building_type), Some(site)) = (
            catalog.get(self.building),
            BuildingType::from_good(self.building),
            self.site,
        ) else {
            return Progress::Failed;
        };

        let duration = *self.duration.get_or_insert_with(|| {
            let level = requirement
                .skill
                .map_or(0, |s| ctx.skills().level(s.skill));
            requirement.base_time * config.skill_speed_factor(level)
        });
        self.elapsed += ctx.dt;
        if self.elapsed < duration {
            return Progress::Pending;
        }

        if !ctx.stockpile().has_all(&self.materials) {
            tracing::warn!(
                "{}: materials for {} went missing before completion",
                ctx.agent,
                requirement.name
            );
            return Progress::Failed;
        }
        let stockpile = ctx.stockpile_mut();
        for material in &self.materials {
            stockpile.remove(material.id, material.quantity);
        }
        if let Some(tool) = requirement.tool {
            stockpile.remove(tool, config.tool_wear_per_use);
        }
        if let Some(skill) = requirement.skill {
            ctx.skills_mut().grant_experience(
                skill.skill,
                config.experience_per_unit,
                config.experience_per_level,
            );
        }

        let id = ctx.world.spawn_building(building_type, 0, site);
        tracing::info!("{} built {} at {}", ctx.agent, requirement.name, id);
        Progress::Done(TaskValue::Building(id))
    }

    fn describe(&self) -> String {
        format!("build {}", self.building)
    }
}
