//! Environment registry for easy environment creation

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use ictest_rl_core::{
    DiscreteAction, Environment, EnvironmentConfig, RLError, Result, VectorObservation,
};

use crate::ic_testing::IcTestEnv;
use crate::wrappers::TimeLimit;

/// Identifier of the IC-testing environment
pub const IC_TESTING_ID: &str = "ICTesting-v0";
/// Step cap registered for [`IC_TESTING_ID`]
pub const IC_TESTING_MAX_EPISODE_STEPS: usize = 2749;

/// Type-erased environment handed out by the registry
pub type BoxedEnv = Box<dyn Environment<Observation = VectorObservation, Action = DiscreteAction>>;

type EnvConstructor = Box<dyn Fn(&EnvironmentConfig) -> Result<BoxedEnv> + Send + Sync>;

lazy_static::lazy_static! {
    static ref REGISTRY: Mutex<EnvRegistry> = Mutex::new(EnvRegistry::with_builtins());
}

/// Registered environment: constructor plus episode cap
pub struct EnvSpec {
    /// Environment identifier
    pub id: String,
    /// Steps after which [`TimeLimit`] truncates an episode
    pub max_episode_steps: Option<usize>,
    constructor: EnvConstructor,
}

/// Environment registry
pub struct EnvRegistry {
    /// Registered environments
    envs: HashMap<String, EnvSpec>,
}

impl Default for EnvRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            envs: HashMap::new(),
        }
    }

    /// Create a registry holding the built-in environments
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(
            IC_TESTING_ID,
            Some(IC_TESTING_MAX_EPISODE_STEPS),
            |config| Ok(Box::new(IcTestEnv::from_environment_config(config)?) as BoxedEnv),
        );
        registry
    }

    /// Register an environment, replacing any previous entry with the same id
    pub fn register<F>(&mut self, id: impl Into<String>, max_episode_steps: Option<usize>, constructor: F)
    where
        F: Fn(&EnvironmentConfig) -> Result<BoxedEnv> + Send + Sync + 'static,
    {
        let id = id.into();
        if self.envs.contains_key(&id) {
            tracing::warn!(%id, "overriding environment already in registry");
        }
        self.envs.insert(
            id.clone(),
            EnvSpec {
                id,
                max_episode_steps,
                constructor: Box::new(constructor),
            },
        );
    }

    /// Look up a registered environment
    #[must_use]
    pub fn spec(&self, id: &str) -> Option<&EnvSpec> {
        self.envs.get(id)
    }

    /// Create an environment by id
    ///
    /// `config.max_steps` overrides the registered cap. With a cap the
    /// environment comes wrapped in [`TimeLimit`].
    pub fn make(&self, id: &str, config: &EnvironmentConfig) -> Result<BoxedEnv> {
        let spec = self
            .envs
            .get(id)
            .ok_or_else(|| RLError::Environment(format!("Unknown environment: {id}")))?;
        let env = (spec.constructor)(config)?;

        match config.max_steps.or(spec.max_episode_steps) {
            Some(max_steps) => Ok(Box::new(TimeLimit::new(env, max_steps))),
            None => Ok(env),
        }
    }

    /// List registered environments, sorted by id
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.envs.keys().cloned().collect();
        ids.sort();
        ids
    }
}

fn global() -> MutexGuard<'static, EnvRegistry> {
    REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Register an environment globally
pub fn register_env<F>(id: impl Into<String>, max_episode_steps: Option<usize>, constructor: F)
where
    F: Fn(&EnvironmentConfig) -> Result<BoxedEnv> + Send + Sync + 'static,
{
    global().register(id, max_episode_steps, constructor);
}

/// Create an environment by id from the global registry
pub fn make_env(id: &str, config: &EnvironmentConfig) -> Result<BoxedEnv> {
    global().make(id, config)
}

/// List all registered environments
#[must_use]
pub fn list_envs() -> Vec<String> {
    global().list()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DATA_PATH_PARAM;

    #[test]
    fn builtins_include_ic_testing_with_cap() {
        let registry = EnvRegistry::with_builtins();
        let spec = registry.spec(IC_TESTING_ID).unwrap();
        assert_eq!(spec.max_episode_steps, Some(2749));
        assert!(list_envs().contains(&IC_TESTING_ID.to_string()));
    }

    #[test]
    fn unknown_id_is_an_error() {
        let registry = EnvRegistry::new();
        let err = registry
            .make("Missing-v0", &EnvironmentConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, RLError::Environment(_)));
    }

    #[test]
    fn construction_failure_propagates() {
        let config = EnvironmentConfig::default()
            .with_param(DATA_PATH_PARAM, "/nonexistent/ictest/table.csv");
        assert!(make_env(IC_TESTING_ID, &config).is_err());
    }
}
