//! Getting hold of goods
//!
//! Sourcing tries the cheapest option first: what the agent already
//! carries, then its home, then the market, and only then making the good
//! itself.

use serde::{Deserialize, Serialize};

use crate::goods::stockpile::EMPTY;
use crate::goods::{Good, GoodId};
use crate::tasks::context::TaskContext;
use crate::tasks::production::ProduceGoods;
use crate::tasks::status::TaskValue;
use crate::tasks::task::{Plan, Progress, Task, TaskBehavior, TaskKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceGoods {
    pub good: GoodId,
    pub quantity: f32,
    /// Nesting below the top-level goal; bounds recursive production
    pub depth: u32,
}

impl SourceGoods {
    pub fn new(good: GoodId, quantity: f32, depth: u32) -> Self {
        Self {
            good,
            quantity,
            depth,
        }
    }

    /// Tools are usable at any remaining durability
    fn satisfied_by(&self, held: f32) -> bool {
        if self.good.is_tool() {
            held > EMPTY
        } else {
            held + EMPTY >= self.quantity
        }
    }

    fn obtained(&self, held: f32) -> TaskValue {
        TaskValue::Goods(vec![Good::new(self.good, held.min(self.quantity))])
    }

    /// Take the shortfall from home now and walk there
    ///
    /// Goods move at decision time so nobody else can claim them first.
    fn from_home(&self, need: f32, ctx: &mut TaskContext) -> Option<Plan> {
        let tool = self.good.is_tool();
        let (personal, home) = ctx.stockpile_and_home()?;
        let at_home = home.get(self.good);
        let enough = if tool { at_home > EMPTY } else { at_home + EMPTY >= need };
        if !enough {
            return None;
        }
        let moved = home.remove(self.good, need);
        personal.add(self.good, moved);

        let home_position = ctx.home_position()?;
        Some(Plan::Then(vec![Task::move_to(home_position)]))
    }

    /// Buy only when sellers can deliver the whole shortfall right now
    fn from_market(&self, need: f32, ctx: &mut TaskContext) -> Option<Plan> {
        let agent = ctx.agent;
        let (exchange, accounts) = ctx.world.market();
        let price = exchange.price(self.good)?;
        let supply = exchange.available_backed(self.good, agent, &accounts);
        if supply + EMPTY < need || price * need > ctx.money() {
            return None;
        }

        let mut children = Vec::new();
        if let Some(market) = ctx.world.nearest_market(ctx.position()) {
            children.push(Task::move_to(market));
        }
        children.push(Task::buy(self.good, need));
        Some(Plan::Then(children))
    }

    fn from_production(&self, need: f32, ctx: &mut TaskContext) -> Option<Plan> {
        if self.depth >= ctx.config.max_source_depth || self.good.is_building() {
            return None;
        }
        let requirement = ctx.catalog.get(self.good)?;
        if let Some(skill) = requirement.skill {
            if !ctx.skills().meets(skill.skill, skill.min_level) {
                return None;
            }
        }
        let produce = ProduceGoods::new(self.good, need, self.depth + 1);
        Some(Plan::Then(vec![Task::new(TaskKind::ProduceGoods(produce))]))
    }
}

impl TaskBehavior for SourceGoods {
    fn init(&mut self, ctx: &mut TaskContext) -> Plan {
        let held = ctx.stockpile().get(self.good);
        if self.satisfied_by(held) {
            return Plan::Done(self.obtained(held));
        }

        let need = if self.good.is_tool() {
            self.quantity
        } else {
            self.quantity - held
        };

        self.from_home(need, ctx)
            .or_else(|| self.from_market(need, ctx))
            .or_else(|| self.from_production(need, ctx))
            .unwrap_or(Plan::Fail)
    }

    fn terminal(&mut self, ctx: &mut TaskContext) -> Progress {
        let held = ctx.stockpile().get(self.good);
        if held < EMPTY {
            return Progress::Failed;
        }
        Progress::Done(self.obtained(held))
    }

    fn describe(&self) -> String {
        format!("source {:.2} of {}", self.quantity, self.good)
    }
}
