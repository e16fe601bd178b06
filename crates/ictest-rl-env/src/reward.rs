//! Reward model for sequential IC testing

use serde::{Deserialize, Serialize};

use crate::condition::Condition;

/// Piecewise reward paid while testing and once at the verdict
///
/// The terminal branches share the squashing term
/// `tanh(slope * test_index - shift)`, so both the payout for a correct call
/// and the penalty for a wrong one grow with the number of tests consumed
/// before saturating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerminalReward {
    /// Reward for every non-terminal step
    pub time_based: f64,
    /// Reward when the tests run out before the agent decides
    pub undecided: f64,
    /// Scale of the correct-verdict term
    pub correct_scale: f64,
    /// Offset of the correct-verdict term
    pub correct_offset: f64,
    /// Scale of the misclassification term
    pub wrong_scale: f64,
    /// Offset of the misclassification term
    pub wrong_offset: f64,
    /// Slope applied to the test index inside `tanh`
    pub slope: f64,
    /// Shift subtracted inside `tanh`
    pub shift: f64,
}

impl Default for TerminalReward {
    fn default() -> Self {
        Self {
            time_based: -0.1,
            undecided: -800.0,
            correct_scale: 250.0,
            correct_offset: 250.0,
            wrong_scale: -300.0,
            wrong_offset: -400.0,
            slope: 2e-3,
            shift: 1.5,
        }
    }
}

impl TerminalReward {
    /// Reward for a step that does not end the episode
    #[must_use]
    pub fn per_step(&self) -> f64 {
        self.time_based
    }

    /// Reward for the step that ends the episode at `test_index`
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn terminal(&self, predicted: Condition, truth: Condition, test_index: usize) -> f64 {
        let squash = (self.slope * test_index as f64 - self.shift).tanh();
        match predicted {
            Condition::Unknown => self.undecided,
            declared if declared == truth => self.correct_scale * squash + self.correct_offset,
            _ => self.wrong_scale * squash + self.wrong_offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn correct_verdicts_share_one_curve() {
        let model = TerminalReward::default();
        let expected = 250.0 * (0.002 * 4.0 - 1.5_f64).tanh() + 250.0;
        assert_relative_eq!(model.terminal(Condition::Good, Condition::Good, 4), expected);
        assert_relative_eq!(model.terminal(Condition::Bad, Condition::Bad, 4), expected);
        assert_relative_eq!(expected, 24.076_978, epsilon = 1e-5);
    }

    #[test]
    fn misclassification_is_penalised() {
        let model = TerminalReward::default();
        let expected = -300.0 * (0.002 * 1.0 - 1.5_f64).tanh() - 400.0;
        assert_relative_eq!(model.terminal(Condition::Bad, Condition::Good, 1), expected);
        assert_relative_eq!(model.terminal(Condition::Good, Condition::Bad, 1), expected);
        assert_relative_eq!(expected, -128.564_144, epsilon = 1e-5);
    }

    #[test]
    fn undecided_is_flat_regardless_of_truth() {
        let model = TerminalReward::default();
        assert_eq!(model.terminal(Condition::Unknown, Condition::Good, 9), -800.0);
        assert_eq!(model.terminal(Condition::Unknown, Condition::Bad, 2000), -800.0);
        assert_eq!(model.per_step(), -0.1);
    }

    #[test]
    fn curves_saturate_towards_their_limits() {
        let model = TerminalReward::default();
        let late_correct = model.terminal(Condition::Good, Condition::Good, 100_000);
        let late_wrong = model.terminal(Condition::Good, Condition::Bad, 100_000);
        assert_relative_eq!(late_correct, 500.0, epsilon = 1e-6);
        assert_relative_eq!(late_wrong, -700.0, epsilon = 1e-6);

        let early = model.terminal(Condition::Good, Condition::Good, 1);
        let later = model.terminal(Condition::Good, Condition::Good, 500);
        assert!(later > early);
    }

    #[test]
    fn terminal_reward_is_bit_reproducible() {
        let model = TerminalReward::default();
        for index in [0, 1, 17, 2748] {
            for (predicted, truth) in [
                (Condition::Good, Condition::Good),
                (Condition::Bad, Condition::Good),
                (Condition::Unknown, Condition::Bad),
            ] {
                let first = model.terminal(predicted, truth, index);
                let second = model.terminal(predicted, truth, index);
                assert_eq!(first.to_bits(), second.to_bits());
            }
        }
    }
}
