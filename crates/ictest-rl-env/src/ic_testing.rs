//! Sequential IC-testing environment
//!
//! Each episode replays the recorded test sequence of one device under test
//! (DUT). At every step the agent either asks for the next test result or
//! stops testing and declares the device good or bad. Episodes sweep the
//! table cyclically: DUT 0, 1, ..., n - 1, then DUT 0 again.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use ictest_rl_core::{
    ActionSpace, BoxObservationSpace, DiscreteAction, DiscreteSpace, Environment,
    EnvironmentConfig, ObservationSpace, RLError, ResetOptions, Result, Reward, Step, StepInfo,
    VectorObservation,
};

use crate::condition::{Condition, PREDICTED_CONDITION_KEY, TRUE_CONDITION_KEY};
use crate::config::{IcTestConfig, RenderMode, METADATA_RENDER_FPS};
use crate::reward::TerminalReward;
use crate::table::TestTable;

/// Observation value of a test that has not been run yet
pub const PENDING_SENTINEL: f64 = 1.0;
/// Observation value written where the agent aborted
pub const ABORT_PLACEHOLDER: f64 = 0.0;

/// Agent decision at one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestAction {
    /// Stop testing and declare the device good
    AbortGood = 0,
    /// Stop testing and declare the device bad
    AbortBad = 1,
    /// Run the next test
    Continue = 2,
}

impl TestAction {
    /// Every action, ordered by discrete index
    pub const ALL: [Self; 3] = [Self::AbortGood, Self::AbortBad, Self::Continue];

    /// Condition declared by this action, if it is a verdict
    #[must_use]
    pub fn verdict(self) -> Option<Condition> {
        match self {
            Self::AbortGood => Some(Condition::Good),
            Self::AbortBad => Some(Condition::Bad),
            Self::Continue => None,
        }
    }
}

impl TryFrom<DiscreteAction> for TestAction {
    type Error = RLError;

    fn try_from(action: DiscreteAction) -> Result<Self> {
        Self::ALL.get(action.0).copied().ok_or_else(|| {
            RLError::InvalidAction(format!(
                "{} ({}) invalid",
                action.0,
                std::any::type_name::<DiscreteAction>()
            ))
        })
    }
}

impl From<TestAction> for DiscreteAction {
    fn from(action: TestAction) -> Self {
        DiscreteAction(action as usize)
    }
}

/// Mutable record of the episode in progress
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeState {
    /// Row of the DUT under test
    pub dut_index: usize,
    /// Index of the most recently revealed observation slot
    pub test_index: usize,
    /// Results revealed so far, pending slots hold [`PENDING_SENTINEL`]
    pub observation: Vec<f64>,
    /// Condition declared by the agent
    pub predicted: Condition,
    /// Condition from the label column, resolved at termination
    pub truth: Condition,
    /// `None` until termination, then the number of steps taken past it
    pub steps_beyond_terminated: Option<usize>,
}

impl EpisodeState {
    fn new(table: &TestTable, dut_index: usize) -> Self {
        let mut observation = vec![PENDING_SENTINEL; table.number_of_tests()];
        observation[0] = table.result(dut_index, 0).unwrap_or(PENDING_SENTINEL);
        Self {
            dut_index,
            test_index: 0,
            observation,
            predicted: Condition::Unknown,
            truth: Condition::Unknown,
            steps_beyond_terminated: None,
        }
    }

    /// Whether the episode has already terminated
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.steps_beyond_terminated.is_some()
    }

    fn info(&self) -> Result<StepInfo> {
        let mut info = StepInfo::default();
        info.insert(PREDICTED_CONDITION_KEY, &self.predicted)?;
        info.insert(TRUE_CONDITION_KEY, &self.truth)?;
        Ok(info)
    }
}

/// IC-testing environment over a fixed table of historical results
#[derive(Debug, Clone)]
pub struct IcTestEnv {
    table: Arc<TestTable>,
    render_mode: RenderMode,
    reward: TerminalReward,
    observation_space: BoxObservationSpace,
    last_dut: Option<usize>,
    episode: Option<EpisodeState>,
}

impl IcTestEnv {
    /// Create the environment, loading the table the configuration points at
    pub fn new(config: IcTestConfig) -> Result<Self> {
        let table = config.resolve_table()?;
        Ok(Self::from_table(table).with_render_mode(config.render_mode))
    }

    /// Create the environment from a generic configuration
    pub fn from_environment_config(config: &EnvironmentConfig) -> Result<Self> {
        Self::new(IcTestConfig::from_environment_config(config)?)
    }

    /// Create the environment over an already loaded table
    #[must_use]
    pub fn from_table(table: Arc<TestTable>) -> Self {
        let bound = f64::from(f32::MAX);
        let tests = table.number_of_tests();
        let observation_space = BoxObservationSpace {
            low: vec![-bound; tests],
            high: vec![bound; tests],
            shape: vec![tests],
        };
        Self {
            table,
            render_mode: RenderMode::None,
            reward: TerminalReward::default(),
            observation_space,
            last_dut: None,
            episode: None,
        }
    }

    /// Replace the render mode
    #[must_use]
    pub fn with_render_mode(mut self, render_mode: RenderMode) -> Self {
        self.render_mode = render_mode;
        self
    }

    /// Replace the reward model
    #[must_use]
    pub fn with_reward(mut self, reward: TerminalReward) -> Self {
        self.reward = reward;
        self
    }

    /// Shared test table
    #[must_use]
    pub fn table(&self) -> &Arc<TestTable> {
        &self.table
    }

    /// Length of every observation
    #[must_use]
    pub fn number_of_tests(&self) -> usize {
        self.table.number_of_tests()
    }

    /// Number of DUTs in the sweep
    #[must_use]
    pub fn number_of_duts(&self) -> usize {
        self.table.number_of_duts()
    }

    /// Requested render mode
    #[must_use]
    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    /// Reward model in use
    #[must_use]
    pub fn reward_model(&self) -> &TerminalReward {
        &self.reward
    }

    /// Episode in progress, `None` before the first reset
    #[must_use]
    pub fn state(&self) -> Option<&EpisodeState> {
        self.episode.as_ref()
    }

    /// Condition declared by the agent in the current episode
    #[must_use]
    pub fn predicted_condition(&self) -> Condition {
        self.episode.as_ref().map_or(Condition::Unknown, |e| e.predicted)
    }

    /// True condition, known once the current episode terminated
    #[must_use]
    pub fn true_condition(&self) -> Condition {
        self.episode.as_ref().map_or(Condition::Unknown, |e| e.truth)
    }

    fn next_dut(&self) -> usize {
        match self.last_dut {
            Some(dut) => (dut + 1) % self.table.number_of_duts(),
            None => 0,
        }
    }
}

impl Environment for IcTestEnv {
    type Observation = VectorObservation;
    type Action = DiscreteAction;

    fn observation_space(&self) -> Box<dyn ObservationSpace<Observation = Self::Observation>> {
        Box::new(self.observation_space.clone())
    }

    fn action_space(&self) -> Box<dyn ActionSpace<Action = Self::Action>> {
        Box::new(DiscreteSpace::new(TestAction::ALL.len()))
    }

    fn reset(
        &mut self,
        seed: Option<u64>,
        _options: Option<&ResetOptions>,
    ) -> Result<(Self::Observation, StepInfo)> {
        let dut = self.next_dut();
        let episode = EpisodeState::new(&self.table, dut);
        let observation = VectorObservation::new(episode.observation.clone());

        tracing::debug!(dut, ?seed, "reset to next DUT");
        self.last_dut = Some(dut);
        self.episode = Some(episode);

        Ok((observation, StepInfo::default()))
    }

    fn step(&mut self, action: Self::Action) -> Result<Step<Self::Observation>> {
        let action = TestAction::try_from(action)?;
        let episode = self.episode.as_mut().ok_or(RLError::ResetNeeded)?;

        if let Some(extra) = episode.steps_beyond_terminated.as_mut() {
            if *extra == 0 {
                tracing::warn!(
                    "You are calling 'step()' even though this environment has already returned \
                     terminated = True. You should always call 'reset()' once you receive \
                     'terminated = True' -- any further steps are undefined behavior."
                );
            }
            *extra += 1;
            return Ok(Step {
                observation: VectorObservation::new(episode.observation.clone()),
                reward: Reward(0.0),
                terminated: true,
                truncated: false,
                info: episode.info()?,
            });
        }

        episode.test_index += 1;
        let index = episode.test_index;

        let revealed = match action.verdict() {
            Some(verdict) => {
                episode.predicted = verdict;
                Some(ABORT_PLACEHOLDER)
            }
            None => self.table.result(episode.dut_index, index),
        };
        if let (Some(value), Some(slot)) = (revealed, episode.observation.get_mut(index)) {
            *slot = value;
        }

        let exhausted = index + 1 >= self.table.number_of_tests();
        let terminated = action != TestAction::Continue || exhausted;

        let reward = if terminated {
            episode.steps_beyond_terminated = Some(0);
            episode.truth = self.table.true_condition(episode.dut_index);
            tracing::debug!(
                dut = episode.dut_index,
                test_index = index,
                predicted = %episode.predicted,
                truth = %episode.truth,
                exhausted,
                "DUT testing finished"
            );
            self.reward.terminal(episode.predicted, episode.truth, index)
        } else {
            self.reward.per_step()
        };

        Ok(Step {
            observation: VectorObservation::new(episode.observation.clone()),
            reward: Reward(reward),
            terminated,
            truncated: false,
            info: episode.info()?,
        })
    }

    fn render(&self) -> Result<()> {
        tracing::trace!(
            mode = ?self.render_mode,
            fps = METADATA_RENDER_FPS,
            "render is a no-op for IC testing"
        );
        Ok(())
    }
}
