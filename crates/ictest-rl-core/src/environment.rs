//! Environment traits and types

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{Action, ActionSpace, Observation, ObservationSpace, Reward};

/// Free-form options passed to [`Environment::reset`]
pub type ResetOptions = serde_json::Map<String, serde_json::Value>;

/// Result of a single environment step
#[derive(Debug, Clone)]
pub struct Step<O> {
    /// Observation from the environment
    pub observation: O,
    /// Reward signal
    pub reward: Reward,
    /// Whether the episode reached a terminal state
    pub terminated: bool,
    /// Whether the episode was cut short from outside (e.g., time limit)
    pub truncated: bool,
    /// Additional info from the environment
    pub info: StepInfo,
}

impl<O> Step<O> {
    /// Whether the caller should reset before stepping again
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// Additional information from a step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    /// Custom fields
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl StepInfo {
    /// Store a serializable value under `key`
    pub fn insert<T: Serialize>(&mut self, key: impl Into<String>, value: &T) -> crate::Result<()> {
        self.fields.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Read `key` back as `T`; `None` when absent or of another shape
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.fields
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Whether no fields are set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Episode information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    /// Episode ID
    pub id: String,
    /// Total reward
    pub total_reward: f64,
    /// Number of steps
    pub steps: usize,
    /// Whether the episode ended by reaching a terminal state
    pub terminated: bool,
    /// Whether episode was truncated
    pub truncated: bool,
    /// Start time
    pub start_time: chrono::DateTime<chrono::Utc>,
    /// End time
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
}

/// Configuration for environments
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Random seed
    pub seed: Option<u64>,
    /// Maximum episode steps
    pub max_steps: Option<usize>,
    /// Render mode
    pub render_mode: Option<String>,
    /// Additional parameters
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl EnvironmentConfig {
    /// Set a string-valued parameter
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Read a string-valued parameter
    #[must_use]
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(serde_json::Value::as_str)
    }
}

/// Core environment trait
///
/// Calls are synchronous: one caller drives `reset`, then any number of
/// `step`s, then `reset` again.
pub trait Environment: Send + Sync {
    /// Observation type
    type Observation: Observation;
    /// Action type
    type Action: Action;

    /// Get the observation space
    fn observation_space(&self) -> Box<dyn ObservationSpace<Observation = Self::Observation>>;

    /// Get the action space
    fn action_space(&self) -> Box<dyn ActionSpace<Action = Self::Action>>;

    /// Reset the environment
    fn reset(
        &mut self,
        seed: Option<u64>,
        options: Option<&ResetOptions>,
    ) -> crate::Result<(Self::Observation, StepInfo)>;

    /// Take a step in the environment
    fn step(&mut self, action: Self::Action) -> crate::Result<Step<Self::Observation>>;

    /// Render the environment (optional)
    fn render(&self) -> crate::Result<()> {
        Ok(())
    }

    /// Close the environment
    fn close(&mut self) -> crate::Result<()> {
        Ok(())
    }

    /// Get current episode info
    fn episode_info(&self) -> Option<Episode> {
        None
    }
}

impl<E> Environment for Box<E>
where
    E: Environment + ?Sized,
{
    type Observation = E::Observation;
    type Action = E::Action;

    fn observation_space(&self) -> Box<dyn ObservationSpace<Observation = Self::Observation>> {
        (**self).observation_space()
    }

    fn action_space(&self) -> Box<dyn ActionSpace<Action = Self::Action>> {
        (**self).action_space()
    }

    fn reset(
        &mut self,
        seed: Option<u64>,
        options: Option<&ResetOptions>,
    ) -> crate::Result<(Self::Observation, StepInfo)> {
        (**self).reset(seed, options)
    }

    fn step(&mut self, action: Self::Action) -> crate::Result<Step<Self::Observation>> {
        (**self).step(action)
    }

    fn render(&self) -> crate::Result<()> {
        (**self).render()
    }

    fn close(&mut self) -> crate::Result<()> {
        (**self).close()
    }

    fn episode_info(&self) -> Option<Episode> {
        (**self).episode_info()
    }
}

/// Wrapper for environments that tracks episodes
pub struct TrackedEnvironment<E> {
    /// Inner environment
    pub env: E,
    /// Current episode
    pub episode: Option<Episode>,
    /// Step counter
    pub step_count: usize,
}

impl<E> TrackedEnvironment<E> {
    /// Create a new tracked environment
    pub fn new(env: E) -> Self {
        Self {
            env,
            episode: None,
            step_count: 0,
        }
    }
}

impl<E> Environment for TrackedEnvironment<E>
where
    E: Environment,
{
    type Observation = E::Observation;
    type Action = E::Action;

    fn observation_space(&self) -> Box<dyn ObservationSpace<Observation = Self::Observation>> {
        self.env.observation_space()
    }

    fn action_space(&self) -> Box<dyn ActionSpace<Action = Self::Action>> {
        self.env.action_space()
    }

    fn reset(
        &mut self,
        seed: Option<u64>,
        options: Option<&ResetOptions>,
    ) -> crate::Result<(Self::Observation, StepInfo)> {
        let reset = self.env.reset(seed, options)?;

        self.episode = Some(Episode {
            id: uuid::Uuid::new_v4().to_string(),
            total_reward: 0.0,
            steps: 0,
            terminated: false,
            truncated: false,
            start_time: chrono::Utc::now(),
            end_time: None,
        });
        self.step_count = 0;

        Ok(reset)
    }

    fn step(&mut self, action: Self::Action) -> crate::Result<Step<Self::Observation>> {
        let step = self.env.step(action)?;

        self.step_count += 1;
        if let Some(ref mut episode) = self.episode {
            episode.total_reward += f64::from(step.reward);
            episode.steps = self.step_count;

            if step.is_done() && episode.end_time.is_none() {
                episode.terminated = step.terminated;
                episode.truncated = step.truncated;
                episode.end_time = Some(chrono::Utc::now());
                tracing::debug!(
                    episode = %episode.id,
                    steps = episode.steps,
                    total_reward = episode.total_reward,
                    truncated = episode.truncated,
                    "episode finished"
                );
            }
        }

        Ok(step)
    }

    fn render(&self) -> crate::Result<()> {
        self.env.render()
    }

    fn close(&mut self) -> crate::Result<()> {
        self.env.close()
    }

    fn episode_info(&self) -> Option<Episode> {
        self.episode.clone()
    }
}
