//! Reward signals

use serde::{Deserialize, Serialize};

/// Reward signal from the environment
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Reward(pub f64);

impl From<Reward> for f64 {
    fn from(reward: Reward) -> Self {
        reward.0
    }
}

impl std::ops::Add for Reward {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self(self.0 + other.0)
    }
}

impl std::iter::Sum for Reward {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, r| acc + r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn episode_return_is_the_sum_of_step_rewards() {
        let total: Reward = [Reward(-0.1), Reward(-0.1), Reward(250.0)].into_iter().sum();
        assert!((f64::from(total) - 249.8).abs() < 1e-9);
        assert_eq!(std::iter::empty::<Reward>().sum::<Reward>(), Reward(0.0));
    }
}
