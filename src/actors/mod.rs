//! Objects that change the scene every frame

pub mod light_actor;

pub use light_actor::{LightActor, LightMode, Patrol, PatrolConfig};
