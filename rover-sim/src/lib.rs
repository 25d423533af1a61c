#![warn(missing_docs)]
//! A simulated 2D environment for a small robot car.
//!
//! The car lives in a rectangular arena bounded by walls and cluttered with
//! randomly placed rectangular obstacles. It senses the world through three
//! ray-cast distance readings (left, center, right) and acts through a
//! discrete command set: drive forward, rotate in place, or select one of
//! five speed levels.
//!
//! [`SimEnv`] composes the pieces into an implementation of
//! [`rover_core::Env`]:
//!
//! - [`Layout`]: seeded obstacle layout generation;
//! - [`RayCastSensor`]: discretized ray marching against the layout;
//! - [`PhysicsWorld`]: car pose, kinematics, collision and episode
//!   termination bookkeeping;
//! - [`RewardModel`]: the shaped reward over step outcomes.
//!
//! With the `candle` feature enabled, the observation and action types
//! convert to and from [`candle_core::Tensor`], which lets a neural agent
//! consume them directly.
mod env;
mod layout;
mod rect;
mod reward;
mod sensor;
mod world;

#[cfg(feature = "candle")]
mod candle;

pub use env::{CarAct, CarObs, SimEnv, SimEnvConfig};
pub use layout::{Layout, LayoutConfig};
pub use rect::Rect;
pub use reward::{RewardConfig, RewardModel};
pub use sensor::{RayCastSensor, SensorConfig, N_RAYS};
pub use world::{CarPose, PhysicsWorld, StepOutcome, WorldConfig, N_ACTIONS};
