//! Environment wrappers

use ictest_rl_core::{
    ActionSpace, Environment, Episode, ObservationSpace, ResetOptions, Step, StepInfo,
};

/// Time limit wrapper
///
/// Flags `truncated` on the step that reaches `max_steps` unless the inner
/// environment terminated on that same step.
pub struct TimeLimit<E> {
    /// Inner environment
    pub env: E,
    /// Maximum steps
    pub max_steps: usize,
    /// Current step count
    pub steps: usize,
}

impl<E> TimeLimit<E> {
    /// Create a new time limit wrapper
    pub fn new(env: E, max_steps: usize) -> Self {
        Self {
            env,
            max_steps,
            steps: 0,
        }
    }
}

impl<E> Environment for TimeLimit<E>
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
    ) -> ictest_rl_core::Result<(Self::Observation, StepInfo)> {
        self.steps = 0;
        self.env.reset(seed, options)
    }

    fn step(&mut self, action: Self::Action) -> ictest_rl_core::Result<Step<Self::Observation>> {
        self.steps += 1;
        let mut step = self.env.step(action)?;

        if self.steps >= self.max_steps && !step.terminated {
            step.truncated = true;
        }

        Ok(step)
    }

    fn render(&self) -> ictest_rl_core::Result<()> {
        self.env.render()
    }

    fn close(&mut self) -> ictest_rl_core::Result<()> {
        self.env.close()
    }

    fn episode_info(&self) -> Option<Episode> {
        self.env.episode_info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ic_testing::{IcTestEnv, TestAction};
    use crate::table::TestTable;
    use ndarray::Array2;
    use std::sync::Arc;

    fn long_env() -> IcTestEnv {
        let table = TestTable::new(ndarray::array![1.0], Array2::zeros((1, 50))).unwrap();
        IcTestEnv::from_table(Arc::new(table))
    }

    #[test]
    fn truncates_when_limit_reached() {
        let mut env = TimeLimit::new(long_env(), 3);
        env.reset(None, None).unwrap();
        assert!(!env.step(TestAction::Continue.into()).unwrap().truncated);
        assert!(!env.step(TestAction::Continue.into()).unwrap().truncated);
        let step = env.step(TestAction::Continue.into()).unwrap();
        assert!(step.truncated);
        assert!(!step.terminated);
        assert!(step.is_done());
    }

    #[test]
    fn terminal_step_at_limit_is_not_truncated() {
        let mut env = TimeLimit::new(long_env(), 2);
        env.reset(None, None).unwrap();
        env.step(TestAction::Continue.into()).unwrap();
        let step = env.step(TestAction::AbortGood.into()).unwrap();
        assert!(step.terminated);
        assert!(!step.truncated);
    }

    #[test]
    fn reset_clears_step_counter() {
        let mut env = TimeLimit::new(long_env(), 2);
        env.reset(None, None).unwrap();
        env.step(TestAction::Continue.into()).unwrap();
        env.reset(None, None).unwrap();
        assert_eq!(env.steps, 0);
        assert!(!env.step(TestAction::Continue.into()).unwrap().truncated);
    }
}
