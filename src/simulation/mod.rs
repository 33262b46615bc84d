pub mod goals;
pub mod tick;

pub use tick::{Simulation, SimulationEvent};
