//! Turn-based dungeon simulation core: flow-field steering, speed-based
//! initiative, d20 combat and experience, on top of a `specs` world.

pub mod ai;
pub mod combat;
pub mod config;
pub mod data;
pub mod ecs;
pub mod error;
pub mod flow;
pub mod items;
pub mod map;
pub mod render;
pub mod scripted_input;
pub mod turn;

pub use config::Tuning;
pub use ecs::World;
pub use error::{Result, SimError};
