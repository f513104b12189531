//! Pure grid delivery logic crate.
//! - Config with serde defaults
//! - Action encoding and clamped movement
//! - Pickup/delivery reward shaping and episode termination
//! - Owned, reseedable RNG for random starts

mod config;
mod engine;
mod error;
mod types;

pub use config::DeliveryConfig;
pub use engine::DeliveryEnv;
pub use error::DeliveryError;
pub use types::{Action, GridObservation, StepInfo, StepResult, Transition};
