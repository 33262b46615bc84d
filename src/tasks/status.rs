//! Task status and result values

use serde::{Deserialize, Serialize};

use crate::core::types::BuildingId;
use crate::goods::Good;
use crate::world::spatial::Site;

/// What a finished task hands back to its parent or continuation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum TaskValue {
    #[default]
    None,
    Goods(Vec<Good>),
    Site(Site),
    Building(BuildingId),
}

impl TaskValue {
    pub fn goods(&self) -> &[Good] {
        match self {
            TaskValue::Goods(goods) => goods,
            _ => &[],
        }
    }

    /// Building referenced by this value, either directly or as a site
    pub fn building(&self) -> Option<BuildingId> {
        match self {
            TaskValue::Building(id) | TaskValue::Site(Site::Building(id)) => Some(*id),
            _ => None,
        }
    }
}

/// Invariant: `failed` implies `complete`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub complete: bool,
    pub failed: bool,
    pub value: TaskValue,
}

impl TaskStatus {
    pub fn succeed(&mut self, value: TaskValue) {
        self.complete = true;
        self.failed = false;
        self.value = value;
    }

    pub fn fail(&mut self) {
        self.complete = true;
        self.failed = true;
    }

    pub fn succeeded(&self) -> bool {
        self.complete && !self.failed
    }
}
