//! Tile map - terrain, soil, and harvestable resources
//!
//! The map is a plain grid. Agents never path through it; it only answers
//! "what is at this tile" and "where is the nearest tile of this kind".

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::core::error::SimError;
use crate::core::types::Vec2;

/// Terrain type of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileType {
    Grass,
    Farmland,
    Forest,
    Mountain,
    Water,
}

impl TileType {
    /// Harvesting here (farming, forestry, mining) uses up the tile's resources
    pub fn depletes(&self) -> bool {
        matches!(self, TileType::Farmland | TileType::Forest | TileType::Mountain)
    }
}

impl FromStr for TileType {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "grass" => Ok(TileType::Grass),
            "farmland" => Ok(TileType::Farmland),
            "forest" => Ok(TileType::Forest),
            "mountain" => Ok(TileType::Mountain),
            "water" => Ok(TileType::Water),
            _ => Err(SimError::Catalog(format!("Invalid tile type: {}", s))),
        }
    }
}

/// Grid coordinate of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub tile_type: TileType,
    /// 0.0 (barren) to 1.0 (rich); scales food harvesting speed
    pub soil_quality: f32,
    /// Remaining harvestable resource; depleting tiles are exhausted at 0
    pub resources: f32,
}

impl Tile {
    pub fn new(tile_type: TileType) -> Self {
        Self {
            tile_type,
            soil_quality: 1.0,
            resources: 1.0,
        }
    }

    pub fn with_soil(mut self, soil_quality: f32) -> Self {
        self.soil_quality = soil_quality.clamp(0.05, 1.0);
        self
    }

    pub fn with_resources(mut self, resources: f32) -> Self {
        self.resources = resources.max(0.0);
        self
    }

    /// Whether anything can still be harvested here
    pub fn is_harvestable(&self) -> bool {
        !self.tile_type.depletes() || self.resources > 0.0
    }

    /// Remove resources, returns amount actually removed
    pub fn deplete(&mut self, amount: f32) -> f32 {
        let removed = amount.max(0.0).min(self.resources);
        self.resources -= removed;
        removed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileMap {
    pub width: u32,
    pub height: u32,
    pub tile_width: f32,
    pub tile_height: f32,
    tiles: Vec<Tile>,
}

impl TileMap {
    /// A map of grass tiles
    pub fn new(width: u32, height: u32, tile_width: f32, tile_height: f32) -> Self {
        Self {
            width,
            height,
            tile_width,
            tile_height,
            tiles: vec![Tile::new(TileType::Grass); (width * height) as usize],
        }
    }

    fn offset(&self, coord: TileCoord) -> Option<usize> {
        (coord.x < self.width && coord.y < self.height)
            .then(|| (coord.y * self.width + coord.x) as usize)
    }

    pub fn get(&self, coord: TileCoord) -> Option<&Tile> {
        self.offset(coord).map(|i| &self.tiles[i])
    }

    pub fn get_mut(&mut self, coord: TileCoord) -> Option<&mut Tile> {
        self.offset(coord).map(move |i| &mut self.tiles[i])
    }

    pub fn set(&mut self, coord: TileCoord, tile: Tile) {
        if let Some(i) = self.offset(coord) {
            self.tiles[i] = tile;
        }
    }

    /// World position of a tile's center
    pub fn center(&self, coord: TileCoord) -> Vec2 {
        Vec2::new(
            (coord.x as f32 + 0.5) * self.tile_width,
            (coord.y as f32 + 0.5) * self.tile_height,
        )
    }

    /// Tile containing a world position, if on the map
    pub fn coord_at(&self, pos: Vec2) -> Option<TileCoord> {
        if pos.x < 0.0 || pos.y < 0.0 {
            return None;
        }
        let coord = TileCoord::new(
            (pos.x / self.tile_width).floor() as u32,
            (pos.y / self.tile_height).floor() as u32,
        );
        self.offset(coord).map(|_| coord)
    }

    /// Iterate over every tile in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (TileCoord, &Tile)> + '_ {
        let width = self.width;
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, t)| (TileCoord::new(i as u32 % width, i as u32 / width), t))
    }
}
