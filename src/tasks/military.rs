//! Soldier duty

use serde::{Deserialize, Serialize};

use crate::core::types::BuildingId;
use crate::tasks::context::TaskContext;
use crate::tasks::task::{Plan, Progress, Task, TaskBehavior};

/// Walk to a post and stand guard for a wage
///
/// Never finishes on its own; dismissal abandons it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deploy {
    pub post: BuildingId,
    on_duty: bool,
}

impl Deploy {
    pub fn new(post: BuildingId) -> Self {
        Self {
            post,
            on_duty: false,
        }
    }

    pub fn on_duty(&self) -> bool {
        self.on_duty
    }
}

impl TaskBehavior for Deploy {
    fn init(&mut self, ctx: &mut TaskContext) -> Plan {
        match ctx.world.buildings.position(self.post) {
            Some(position) => Plan::Then(vec![Task::move_to(position)]),
            None => Plan::Fail,
        }
    }

    fn terminal(&mut self, ctx: &mut TaskContext) -> Progress {
        self.on_duty = true;
        let wage = (ctx.config.soldier_wage * ctx.dt).min(ctx.world.treasury).max(0.0);
        ctx.world.treasury -= wage;
        ctx.world.agents.money[ctx.agent.index()] += wage;
        Progress::Pending
    }

    fn describe(&self) -> String {
        format!("deploy to {}", self.post)
    }
}
