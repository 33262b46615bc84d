//! City layer - buildings and the stockpiles they hold

pub mod building;

pub use building::{BuildingArchetype, BuildingType};
