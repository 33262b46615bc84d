//! Guildhall - agent-driven settlement economy
//!
//! Agents pursue hierarchical tasks (sourcing, production, trade, housing)
//! against a shared world with a central order-book market.

pub mod city;
pub mod core;
pub mod ecs;
pub mod entity;
pub mod goods;
pub mod market;
pub mod simulation;
pub mod tasks;
pub mod world;
