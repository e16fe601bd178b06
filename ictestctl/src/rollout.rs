// Sampled-action rollouts over a registered environment

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::PathBuf;

use ictest_rl_env::config::DATA_PATH_PARAM;
use ictest_rl_env::{
    make_env, Condition, Environment, EnvironmentConfig, TrackedEnvironment,
    PREDICTED_CONDITION_KEY, TRUE_CONDITION_KEY,
};

pub struct RolloutOptions {
    pub env_id: String,
    pub data: Option<PathBuf>,
    pub episodes: usize,
    pub max_steps: Option<usize>,
    pub seed: u64,
}

#[derive(Debug, Default, Serialize)]
pub struct RolloutSummary {
    pub env_id: String,
    pub episodes: usize,
    pub mean_reward: f64,
    pub mean_length: f64,
    pub truncated: usize,
    /// Episodes ended by an explicit good/bad verdict
    pub decisions: usize,
    /// Verdicts that matched the label
    pub correct: usize,
}

impl RolloutSummary {
    #[allow(clippy::cast_precision_loss)]
    pub fn accuracy(&self) -> Option<f64> {
        (self.decisions > 0).then(|| self.correct as f64 / self.decisions as f64)
    }

    pub fn print(&self) {
        println!("Rollout on {}", self.env_id);
        println!("   Episodes:     {}", self.episodes);
        println!("   Mean reward:  {:.3}", self.mean_reward);
        println!("   Mean length:  {:.1}", self.mean_length);
        println!("   Truncated:    {}", self.truncated);
        println!("   Decisions:    {}", self.decisions);
        match self.accuracy() {
            Some(accuracy) => println!("   Accuracy:     {:.1}%", accuracy * 100.0),
            None => println!("   Accuracy:     n/a"),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
pub fn run(options: &RolloutOptions) -> Result<RolloutSummary> {
    let mut config = EnvironmentConfig {
        seed: Some(options.seed),
        max_steps: options.max_steps,
        ..EnvironmentConfig::default()
    };
    if let Some(path) = &options.data {
        config = config.with_param(DATA_PATH_PARAM, path.to_string_lossy().into_owned());
    }

    let env = make_env(&options.env_id, &config)
        .with_context(|| format!("Failed to create environment {}", options.env_id))?;
    let mut env = TrackedEnvironment::new(env);
    let action_space = env.action_space();
    let mut rng = StdRng::seed_from_u64(options.seed);

    let mut summary = RolloutSummary {
        env_id: options.env_id.clone(),
        ..RolloutSummary::default()
    };
    let mut total_reward = 0.0;
    let mut total_steps = 0;

    for episode in 0..options.episodes {
        env.reset(Some(options.seed), None)?;

        let last = loop {
            let step = env.step(action_space.sample_from(&mut rng))?;
            if step.is_done() {
                break step;
            }
        };

        if last.truncated {
            summary.truncated += 1;
        }
        let predicted = Condition::from_info(&last.info, PREDICTED_CONDITION_KEY)
            .unwrap_or_default();
        let truth = Condition::from_info(&last.info, TRUE_CONDITION_KEY).unwrap_or_default();
        if predicted.is_known() {
            summary.decisions += 1;
            if predicted == truth {
                summary.correct += 1;
            }
        }

        if let Some(info) = env.episode_info() {
            tracing::debug!(
                episode,
                id = %info.id,
                steps = info.steps,
                reward = info.total_reward,
                %predicted,
                %truth,
                "episode complete"
            );
            total_reward += info.total_reward;
            total_steps += info.steps;
        }
    }

    env.close()?;

    summary.episodes = options.episodes;
    if options.episodes > 0 {
        summary.mean_reward = total_reward / options.episodes as f64;
        summary.mean_length = total_steps as f64 / options.episodes as f64;
    }
    Ok(summary)
}
