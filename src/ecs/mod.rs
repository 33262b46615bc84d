pub mod world;

pub use world::{Accounts, World};
