//! Spatial queries - nearest building or tile from an origin
//!
//! Tasks never search the world themselves; they ask a [`SpatialQuery`].
//! The provided implementation is a straight-line nearest scan, which is
//! all the stub movement model needs.

use serde::{Deserialize, Serialize};

use crate::city::building::{BuildingArchetype, BuildingType};
use crate::core::types::{BuildingId, Vec2};
use crate::world::tiles::{Tile, TileCoord, TileMap};

/// A resolved location an agent can travel to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Site {
    Building(BuildingId),
    Tile(TileCoord),
}

/// Borrowed view of one building, passed to query predicates
#[derive(Debug, Clone, Copy)]
pub struct BuildingView {
    pub id: BuildingId,
    pub building_type: BuildingType,
    pub subtype: u8,
    pub vacancies: u32,
}

pub trait SpatialQuery {
    /// Nearest building satisfying `pred`, or `None`
    fn nearest_building(
        &self,
        origin: Vec2,
        pred: &dyn Fn(&BuildingView) -> bool,
    ) -> Option<BuildingId>;

    /// Nearest tile satisfying `pred`, or `None`
    fn nearest_tile(&self, origin: Vec2, pred: &dyn Fn(&Tile) -> bool) -> Option<TileCoord>;

    /// World position of a site
    fn site_position(&self, site: Site) -> Option<Vec2>;
}

/// Linear nearest-building scan; ties go to the lower index
pub fn scan_buildings(
    buildings: &BuildingArchetype,
    origin: Vec2,
    pred: &dyn Fn(&BuildingView) -> bool,
) -> Option<BuildingId> {
    let mut best: Option<(f32, BuildingId)> = None;
    for idx in 0..buildings.count() {
        let view = BuildingView {
            id: buildings.ids[idx],
            building_type: buildings.building_types[idx],
            subtype: buildings.subtypes[idx],
            vacancies: buildings.vacancies(idx),
        };
        if !pred(&view) {
            continue;
        }
        let dist = origin.distance(&buildings.positions[idx]);
        if best.map_or(true, |(d, _)| dist < d) {
            best = Some((dist, view.id));
        }
    }
    best.map(|(_, id)| id)
}

/// Linear nearest-tile scan; ties go to the earlier tile in row-major order
pub fn scan_tiles(map: &TileMap, origin: Vec2, pred: &dyn Fn(&Tile) -> bool) -> Option<TileCoord> {
    let mut best: Option<(f32, TileCoord)> = None;
    for (coord, tile) in map.iter() {
        if !pred(tile) {
            continue;
        }
        let dist = origin.distance(&map.center(coord));
        if best.map_or(true, |(d, _)| dist < d) {
            best = Some((dist, coord));
        }
    }
    best.map(|(_, coord)| coord)
}
