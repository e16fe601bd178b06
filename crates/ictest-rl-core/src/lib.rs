//! Core reinforcement learning contract for sequential IC testing
//!
//! This crate provides the environment abstractions the IC-testing
//! simulator plugs into: the [`Environment`] trait, action and
//! observation spaces, step records and an episode-tracking wrapper.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod environment;
pub mod error;
pub mod observation;
pub mod reward;

// Re-export core traits and types
pub use action::{Action, ActionSpace, DiscreteAction, DiscreteSpace};
pub use environment::{
    Environment, EnvironmentConfig, Episode, ResetOptions, Step, StepInfo, TrackedEnvironment,
};
pub use error::{RLError, Result};
pub use observation::{BoxObservationSpace, Observation, ObservationSpace, VectorObservation};
pub use reward::Reward;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Action, ActionSpace, DiscreteAction, Environment, Observation, ObservationSpace, Result,
        Reward, Step, StepInfo, VectorObservation,
    };
}
