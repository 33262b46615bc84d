//! Finding places through the spatial query

use serde::{Deserialize, Serialize};

use crate::city::building::BuildingType;
use crate::tasks::context::TaskContext;
use crate::tasks::status::TaskValue;
use crate::tasks::task::{Progress, TaskBehavior};
use crate::world::spatial::{Site, SpatialQuery};
use crate::world::tiles::TileType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindBuilding {
    pub building_type: BuildingType,
    /// `None` accepts any subtype
    pub subtype: Option<u8>,
}

impl FindBuilding {
    pub fn new(building_type: BuildingType, subtype: Option<u8>) -> Self {
        Self {
            building_type,
            subtype,
        }
    }
}

impl TaskBehavior for FindBuilding {
    fn terminal(&mut self, ctx: &mut TaskContext) -> Progress {
        let (building_type, subtype) = (self.building_type, self.subtype);
        let found = ctx.world.nearest_building(ctx.position(), &|b| {
            b.building_type == building_type && subtype.map_or(true, |s| s == b.subtype)
        });
        match found {
            Some(id) => Progress::Done(TaskValue::Site(Site::Building(id))),
            None => Progress::Failed,
        }
    }

    fn describe(&self) -> String {
        match self.subtype {
            Some(subtype) => format!("find {:?}/{}", self.building_type, subtype),
            None => format!("find {:?}", self.building_type),
        }
    }
}

/// Nearest tile of a type that still has something to harvest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindTile {
    pub tile_type: TileType,
}

impl FindTile {
    pub fn new(tile_type: TileType) -> Self {
        Self { tile_type }
    }
}

impl TaskBehavior for FindTile {
    fn terminal(&mut self, ctx: &mut TaskContext) -> Progress {
        let tile_type = self.tile_type;
        let found = ctx.world.nearest_tile(ctx.position(), &|t| {
            t.tile_type == tile_type && t.is_harvestable()
        });
        match found {
            Some(coord) => Progress::Done(TaskValue::Site(Site::Tile(coord))),
            None => Progress::Failed,
        }
    }

    fn describe(&self) -> String {
        format!("find {:?} tile", self.tile_type)
    }
}

/// Nearest house with room, other than the current home
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindNewHome {}

impl TaskBehavior for FindNewHome {
    fn terminal(&mut self, ctx: &mut TaskContext) -> Progress {
        let current = ctx.home();
        let found = ctx.world.nearest_building(ctx.position(), &|b| {
            b.building_type == BuildingType::House && b.vacancies > 0 && Some(b.id) != current
        });
        match found {
            Some(id) => Progress::Done(TaskValue::Building(id)),
            None => Progress::Failed,
        }
    }

    fn describe(&self) -> String {
        "find a new home".to_string()
    }
}
