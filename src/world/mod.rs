//! World substrate - tile map and spatial queries

pub mod spatial;
pub mod tiles;

pub use spatial::{BuildingView, Site, SpatialQuery};
pub use tiles::{Tile, TileCoord, TileMap, TileType};
