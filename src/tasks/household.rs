//! Terminal-only household chores

use serde::{Deserialize, Serialize};

use crate::entity::skills::Skill;
use crate::goods::good::{FOOD_PREPARED, MEAL};
use crate::goods::stockpile::EMPTY;
use crate::goods::{Good, GoodId};
use crate::market::Side;
use crate::tasks::context::TaskContext;
use crate::tasks::status::TaskValue;
use crate::tasks::task::{Progress, TaskBehavior};

/// Turn every raw cookable good into meals, one for one
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cook {
    elapsed: f32,
}

impl TaskBehavior for Cook {
    fn terminal(&mut self, ctx: &mut TaskContext) -> Progress {
        if ctx.stockpile().total_where(|id| id.is_cookable()) < EMPTY {
            return Progress::Failed;
        }
        self.elapsed += ctx.dt;
        if self.elapsed < ctx.config.cook_time {
            return Progress::Pending;
        }

        let stockpile = ctx.stockpile_mut();
        let raw: Vec<Good> = stockpile.iter().filter(|g| g.is_cookable()).collect();
        let mut cooked = 0.0;
        for good in raw {
            cooked += stockpile.take_all(good.id);
        }
        stockpile.add(MEAL, cooked);

        let (per_unit, per_level) = (ctx.config.experience_per_unit, ctx.config.experience_per_level);
        ctx.skills_mut()
            .grant_experience(Skill::Cooking, per_unit * cooked, per_level);
        Progress::Done(TaskValue::Goods(vec![Good::new(MEAL, cooked)]))
    }

    fn describe(&self) -> String {
        "cook".to_string()
    }
}

/// Eat held food, prepared dishes first, until no longer hungry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Eat {}

impl TaskBehavior for Eat {
    fn terminal(&mut self, ctx: &mut TaskContext) -> Progress {
        let catalog = ctx.catalog;
        let mut food: Vec<Good> = ctx
            .stockpile()
            .iter()
            .filter(|g| g.is_edible() && catalog.nutrition(g.id) > 0.0)
            .collect();
        if food.is_empty() {
            return Progress::Failed;
        }
        // Stable sort keeps id order within each group
        food.sort_by_key(|g| g.id.subcategory != FOOD_PREPARED);

        let mut hunger = ctx.hunger();
        let mut eaten = Vec::new();
        for good in food {
            if hunger <= 0.0 {
                break;
            }
            let nutrition = catalog.nutrition(good.id);
            let amount = ctx
                .stockpile_mut()
                .remove(good.id, (hunger / nutrition).min(good.quantity));
            hunger -= amount * nutrition;
            eaten.push(Good::new(good.id, amount));
        }
        ctx.set_hunger(hunger.max(0.0));
        Progress::Done(TaskValue::Goods(eaten))
    }

    fn describe(&self) -> String {
        "eat".to_string()
    }
}

/// Store every carried good except tools at home
///
/// Goods put away are no longer for sale, so their listings are withdrawn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepositInventory {}

impl TaskBehavior for DepositInventory {
    fn terminal(&mut self, ctx: &mut TaskContext) -> Progress {
        let agent = ctx.agent;
        let Some((personal, home)) = ctx.stockpile_and_home() else {
            return Progress::Failed;
        };
        let stored: Vec<GoodId> = personal
            .iter()
            .map(|g| g.id)
            .filter(|id| !id.is_tool())
            .collect();
        personal.transfer_where(home, |id| !id.is_tool());

        for good in stored {
            ctx.world.exchange.cancel_orders(agent, good, Side::Sell);
        }
        Progress::Done(TaskValue::None)
    }

    fn describe(&self) -> String {
        "deposit inventory".to_string()
    }
}

/// Wait at home; homeless agents wait where they stand
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdleAtHome {
    pub duration: f32,
    elapsed: f32,
}

impl IdleAtHome {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            elapsed: 0.0,
        }
    }
}

impl TaskBehavior for IdleAtHome {
    fn terminal(&mut self, ctx: &mut TaskContext) -> Progress {
        if self.elapsed == 0.0 {
            if let Some(home) = ctx.home_position() {
                ctx.set_position(home);
            }
        }
        self.elapsed += ctx.dt;
        if self.elapsed < self.duration {
            Progress::Pending
        } else {
            Progress::Done(TaskValue::None)
        }
    }

    fn describe(&self) -> String {
        format!("idle at home for {:.1}s", self.duration)
    }
}
