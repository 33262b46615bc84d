//! Task nodes and the step protocol
//!
//! A task is one node of a goal tree. Every variant obeys the same step:
//!
//! 1. A complete task returns its status untouched.
//! 2. On the first step the variant's `init` runs; it may queue children
//!    (prerequisites) or settle the task outright.
//! 3. A finished front child is reaped: a failed child fails the parent,
//!    a successful one is handed to the variant's `adopt`.
//! 4. A pending front child is stepped and the parent waits.
//! 5. With no children left the variant's `terminal` behavior runs.
//!
//! Reaping happens on the step after a child finishes, so failure and
//! completion climb exactly one level per tick and only one leaf works
//! per agent per tick.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::city::building::BuildingType;
use crate::core::types::{BuildingId, Vec2};
use crate::goods::{Good, GoodId};
use crate::tasks::construction::Build;
use crate::tasks::context::TaskContext;
use crate::tasks::continuation::Continuation;
use crate::tasks::household::{Cook, DepositInventory, Eat, IdleAtHome};
use crate::tasks::locate::{FindBuilding, FindNewHome, FindTile};
use crate::tasks::military::Deploy;
use crate::tasks::movement::MoveTo;
use crate::tasks::production::ProduceGoods;
use crate::tasks::sourcing::SourceGoods;
use crate::tasks::status::{TaskStatus, TaskValue};
use crate::tasks::trade::{Buy, Sell};
use crate::world::tiles::TileType;

/// Outcome of `init` or `adopt`
#[derive(Debug)]
pub enum Plan {
    /// Queue these children (possibly none) and carry on
    Then(Vec<Task>),
    /// Finish successfully right away
    Done(TaskValue),
    /// Fail right away
    Fail,
}

impl Plan {
    pub fn proceed() -> Self {
        Plan::Then(Vec::new())
    }
}

/// Outcome of one terminal step
#[derive(Debug)]
pub enum Progress {
    Pending,
    Done(TaskValue),
    Failed,
}

/// Hooks a variant plugs into the step protocol
pub trait TaskBehavior {
    fn init(&mut self, _ctx: &mut TaskContext) -> Plan {
        Plan::proceed()
    }

    /// A child finished successfully and has been removed
    fn adopt(&mut self, _child: &Task, _ctx: &mut TaskContext) -> Plan {
        Plan::proceed()
    }

    /// Work performed once no children remain
    fn terminal(&mut self, ctx: &mut TaskContext) -> Progress;

    fn describe(&self) -> String;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TaskKind {
    MoveTo(MoveTo),
    SourceGoods(SourceGoods),
    ProduceGoods(ProduceGoods),
    Buy(Buy),
    Sell(Sell),
    FindBuilding(FindBuilding),
    FindTile(FindTile),
    FindNewHome(FindNewHome),
    Build(Build),
    Cook(Cook),
    Eat(Eat),
    DepositInventory(DepositInventory),
    IdleAtHome(IdleAtHome),
    Deploy(Deploy),
}

impl TaskKind {
    fn behavior(&self) -> &dyn TaskBehavior {
        match self {
            TaskKind::MoveTo(t) => t,
            TaskKind::SourceGoods(t) => t,
            TaskKind::ProduceGoods(t) => t,
            TaskKind::Buy(t) => t,
            TaskKind::Sell(t) => t,
            TaskKind::FindBuilding(t) => t,
            TaskKind::FindTile(t) => t,
            TaskKind::FindNewHome(t) => t,
            TaskKind::Build(t) => t,
            TaskKind::Cook(t) => t,
            TaskKind::Eat(t) => t,
            TaskKind::DepositInventory(t) => t,
            TaskKind::IdleAtHome(t) => t,
            TaskKind::Deploy(t) => t,
        }
    }

    fn behavior_mut(&mut self) -> &mut dyn TaskBehavior {
        match self {
            TaskKind::MoveTo(t) => t,
            TaskKind::SourceGoods(t) => t,
            TaskKind::ProduceGoods(t) => t,
            TaskKind::Buy(t) => t,
            TaskKind::Sell(t) => t,
            TaskKind::FindBuilding(t) => t,
            TaskKind::FindTile(t) => t,
            TaskKind::FindNewHome(t) => t,
            TaskKind::Build(t) => t,
            TaskKind::Cook(t) => t,
            TaskKind::Eat(t) => t,
            TaskKind::DepositInventory(t) => t,
            TaskKind::IdleAtHome(t) => t,
            TaskKind::Deploy(t) => t,
        }
    }
}

/// A node in an agent's goal tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub kind: TaskKind,
    children: VecDeque<Task>,
    status: TaskStatus,
    initialized: bool,
    on_success: Option<Continuation>,
    on_failure: Option<Continuation>,
}

impl Task {
    pub fn new(kind: TaskKind) -> Self {
        Self {
            kind,
            children: VecDeque::new(),
            status: TaskStatus::default(),
            initialized: false,
            on_success: None,
            on_failure: None,
        }
    }

    pub fn on_success(mut self, continuation: Continuation) -> Self {
        self.on_success = Some(continuation);
        self
    }

    pub fn on_failure(mut self, continuation: Continuation) -> Self {
        self.on_failure = Some(continuation);
        self
    }

    pub fn status(&self) -> &TaskStatus {
        &self.status
    }

    pub fn is_complete(&self) -> bool {
        self.status.complete
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Pending children, front first
    pub fn children(&self) -> impl Iterator<Item = &Task> + '_ {
        self.children.iter()
    }

    /// Innermost pending descendant (the node that will do work next)
    pub fn active_leaf(&self) -> &Task {
        match self.children.front() {
            Some(child) if !child.is_complete() => child.active_leaf(),
            _ => self,
        }
    }

    pub fn describe(&self) -> String {
        self.kind.behavior().describe()
    }

    /// The continuation matching how this task ended
    pub fn continuation(&self) -> Option<Continuation> {
        if !self.status.complete {
            return None;
        }
        if self.status.failed {
            self.on_failure
        } else {
            self.on_success
        }
    }

    /// Mark the task failed from outside, e.g. when a soldier is dismissed
    ///
    /// The owning queue sees the task complete on its next step.
    pub fn abandon(&mut self) {
        self.children.clear();
        self.status.fail();
    }

    /// Advance this task by one tick
    pub fn step(&mut self, ctx: &mut TaskContext) -> &TaskStatus {
        if self.status.complete {
            return &self.status;
        }

        if !self.initialized {
            self.initialized = true;
            let plan = self.kind.behavior_mut().init(ctx);
            if self.apply(plan) {
                self.log_outcome(ctx);
                return &self.status;
            }
        }

        while self.children.front().map_or(false, Task::is_complete) {
            let Some(child) = self.children.pop_front() else {
                break;
            };
            if child.status.failed {
                self.status.fail();
                self.log_outcome(ctx);
                return &self.status;
            }
            let plan = self.kind.behavior_mut().adopt(&child, ctx);
            if self.apply(plan) {
                self.log_outcome(ctx);
                return &self.status;
            }
        }

        if let Some(child) = self.children.front_mut() {
            child.step(ctx);
            return &self.status;
        }

        match self.kind.behavior_mut().terminal(ctx) {
            Progress::Pending => return &self.status,
            Progress::Done(value) => self.status.succeed(value),
            Progress::Failed => self.status.fail(),
        }
        self.log_outcome(ctx);
        &self.status
    }

    /// Apply a plan; returns true when the task settled
    fn apply(&mut self, plan: Plan) -> bool {
        match plan {
            Plan::Then(children) => {
                self.children.extend(children);
                false
            }
            Plan::Done(value) => {
                self.status.succeed(value);
                true
            }
            Plan::Fail => {
                self.status.fail();
                true
            }
        }
    }

    fn log_outcome(&self, ctx: &TaskContext) {
        if self.status.failed {
            tracing::debug!("{} failed: {}", ctx.agent, self.describe());
        } else {
            tracing::debug!("{} finished: {}", ctx.agent, self.describe());
        }
    }

    // === CONSTRUCTORS ===

    pub fn move_to(target: Vec2) -> Self {
        Self::new(TaskKind::MoveTo(MoveTo::new(target)))
    }

    pub fn source_goods(good: GoodId, quantity: f32) -> Self {
        Self::new(TaskKind::SourceGoods(SourceGoods::new(good, quantity, 0)))
    }

    pub fn produce_goods(good: GoodId, quantity: f32) -> Self {
        Self::new(TaskKind::ProduceGoods(ProduceGoods::new(good, quantity, 0)))
    }

    pub fn buy(good: GoodId, quantity: f32) -> Self {
        Self::new(TaskKind::Buy(Buy::new(good, quantity)))
    }

    pub fn sell(goods: Vec<Good>) -> Self {
        Self::new(TaskKind::Sell(Sell::new(goods)))
    }

    pub fn find_building(building_type: BuildingType, subtype: Option<u8>) -> Self {
        Self::new(TaskKind::FindBuilding(FindBuilding::new(building_type, subtype)))
    }

    pub fn find_tile(tile_type: TileType) -> Self {
        Self::new(TaskKind::FindTile(FindTile::new(tile_type)))
    }

    pub fn find_new_home() -> Self {
        Self::new(TaskKind::FindNewHome(FindNewHome::default()))
    }

    pub fn build(building: GoodId) -> Self {
        Self::new(TaskKind::Build(Build::new(building)))
    }

    pub fn cook() -> Self {
        Self::new(TaskKind::Cook(Cook::default()))
    }

    pub fn eat() -> Self {
        Self::new(TaskKind::Eat(Eat::default()))
    }

    pub fn deposit_inventory() -> Self {
        Self::new(TaskKind::DepositInventory(DepositInventory::default()))
    }

    pub fn idle_at_home(duration: f32) -> Self {
        Self::new(TaskKind::IdleAtHome(IdleAtHome::new(duration)))
    }

    pub fn deploy(post: BuildingId) -> Self {
        Self::new(TaskKind::Deploy(Deploy::new(post)))
    }
}
