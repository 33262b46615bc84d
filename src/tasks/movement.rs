//! Straight-line movement

use serde::{Deserialize, Serialize};

use crate::core::types::Vec2;
use crate::tasks::context::TaskContext;
use crate::tasks::status::TaskValue;
use crate::tasks::task::{Progress, TaskBehavior};

/// Walk toward a fixed point at constant speed
///
/// The heading is fixed on the first step and never replanned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveTo {
    pub target: Vec2,
    direction: Option<Vec2>,
}

impl MoveTo {
    pub fn new(target: Vec2) -> Self {
        Self {
            target,
            direction: None,
        }
    }
}

impl TaskBehavior for MoveTo {
    fn terminal(&mut self, ctx: &mut TaskContext) -> Progress {
        let position = ctx.position();
        let radius = ctx.config.arrival_radius();
        let remaining = position.distance(&self.target);
        if remaining < radius {
            ctx.set_position(self.target);
            return Progress::Done(TaskValue::None);
        }

        let direction = *self
            .direction
            .get_or_insert_with(|| (self.target - position).normalize());
        let stride = ctx.config.agent_speed * ctx.dt;

        // Arrival snaps onto the target instead of overshooting
        if stride >= remaining {
            ctx.set_position(self.target);
            return Progress::Done(TaskValue::None);
        }

        let next = position + direction * stride;
        if next.distance(&self.target) < radius {
            ctx.set_position(self.target);
            return Progress::Done(TaskValue::None);
        }
        ctx.set_position(next);
        Progress::Pending
    }

    fn describe(&self) -> String {
        format!("move to ({:.1}, {:.1})", self.target.x, self.target.y)
    }
}
