//! Sequential IC-testing reinforcement learning environment
//!
//! An agent watches the test results of one device under test accumulate
//! and decides, step by step, whether to run the next test or stop and
//! classify the device. The environment replays a table of historical
//! results and is registered as [`IC_TESTING_ID`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod condition;
pub mod config;
pub mod ic_testing;
pub mod registry;
pub mod reward;
pub mod table;
pub mod wrappers;

pub use condition::{Condition, PREDICTED_CONDITION_KEY, TRUE_CONDITION_KEY};
pub use config::{DataSource, IcTestConfig, RenderMode};
pub use ic_testing::{EpisodeState, IcTestEnv, TestAction, ABORT_PLACEHOLDER, PENDING_SENTINEL};
pub use registry::{
    list_envs, make_env, register_env, BoxedEnv, EnvRegistry, IC_TESTING_ID,
    IC_TESTING_MAX_EPISODE_STEPS,
};
pub use reward::TerminalReward;
pub use table::{TableError, TestTable};
pub use wrappers::TimeLimit;

// Re-export core types
pub use ictest_rl_core::{
    Action, ActionSpace, DiscreteAction, Environment, EnvironmentConfig, Episode, Observation,
    ObservationSpace, RLError, Reward, Step, StepInfo, TrackedEnvironment, VectorObservation,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{make_env, Condition, IcTestEnv, TestAction, TimeLimit, IC_TESTING_ID};
    pub use ictest_rl_core::prelude::*;
}
