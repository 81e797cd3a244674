use std::fmt::Display;

use more_asserts::debug_assert_ge;

use crate::{
    error::{
        CfrError,
        Result,
    },
    game::{
        Action,
        Card,
        History,
        Player,
    },
};

/// A probability distribution over `Action::VALUES`.
pub type Strategy = [f64; Action::COUNT];

/// Actions whose average probability falls below this are dropped before
/// reporting. Tunable; not derived from the game.
pub const PURIFICATION_THRESHOLD: f64 = 0.001;

pub fn uniform_strategy() -> Strategy {
    [1.0 / Action::COUNT as f64; Action::COUNT]
}

/// Regret matching: play actions in proportion to their positive regret,
/// uniformly if no action has any.
pub fn regret_matching_strategy(regret_sum: &Strategy) -> Strategy {
    let positive_regret = regret_sum.map(|r| r.max(0.0));
    let normalizing_sum: f64 = positive_regret.iter().sum();
    if normalizing_sum > 0.0 {
        positive_regret.map(|r| r / normalizing_sum)
    } else {
        uniform_strategy()
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct InfoSetKey {
    pub card: Card,
    pub history: History,
}

impl InfoSetKey {
    pub fn new(card: Card, history: History) -> Self {
        Self {
            card,
            history,
        }
    }

    pub fn player(&self) -> Player {
        self.history.next_player()
    }
}

impl Display for InfoSetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.card, self.history)
    }
}

#[derive(Debug, Clone)]
pub struct InfoSet {
    key: InfoSetKey,

    regret_sum: Strategy,
    strategy: Strategy,
    reach_probability: f64,

    strategy_sum: Strategy,
    reach_probability_sum: f64,
    visit_count: u64,
}

impl InfoSet {
    pub fn new(key: InfoSetKey) -> Self {
        Self {
            key,
            regret_sum: [0.0; Action::COUNT],
            strategy: uniform_strategy(),
            reach_probability: 0.0,
            strategy_sum: [0.0; Action::COUNT],
            reach_probability_sum: 0.0,
            visit_count: 0,
        }
    }

    pub fn key(&self) -> &InfoSetKey {
        &self.key
    }

    pub fn current_strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn regret_sum(&self) -> &Strategy {
        &self.regret_sum
    }

    pub fn reach_probability(&self) -> f64 {
        self.reach_probability
    }

    pub fn reach_probability_sum(&self) -> f64 {
        self.reach_probability_sum
    }

    pub fn visit_count(&self) -> u64 {
        self.visit_count
    }

    pub fn accumulate_reach(&mut self, probability: f64) {
        debug_assert_ge!(probability, 0.0);
        self.reach_probability += probability;
    }

    /// `counterfactual_weight` must exclude the acting player's own reach.
    pub fn accumulate_regret(
        &mut self,
        counterfactual_weight: f64,
        action_utils: &[f64; Action::COUNT],
        node_util: f64,
    ) {
        for (regret, action_util) in self.regret_sum.iter_mut().zip(action_utils) {
            *regret += counterfactual_weight * (action_util - node_util);
        }
    }

    /// Folds this iteration's reach into the average-strategy accumulators
    /// and switches to the regret-matching strategy for the next iteration.
    pub fn advance_iteration(&mut self) {
        for (sum, s) in self.strategy_sum.iter_mut().zip(self.strategy) {
            *sum += self.reach_probability * s;
        }
        self.strategy = regret_matching_strategy(&self.regret_sum);
        for s in self.strategy {
            debug_assert_ge!(s, 0.0);
        }
        self.reach_probability_sum += self.reach_probability;
        self.reach_probability = 0.0;
        self.visit_count += 1;
    }

    pub fn average_strategy(&self) -> Result<Strategy> {
        self.average_strategy_with_threshold(PURIFICATION_THRESHOLD)
    }

    /// Reach-weighted average strategy, with components below `threshold`
    /// zeroed and the remainder renormalized.
    pub fn average_strategy_with_threshold(&self, threshold: f64) -> Result<Strategy> {
        if self.reach_probability_sum <= 0.0 {
            return Err(CfrError::DegenerateAverageStrategy {
                key: self.key.to_string(),
            });
        }
        let average = self.strategy_sum.map(|s| s / self.reach_probability_sum);
        let purified = average.map(|p| if p < threshold { 0.0 } else { p });
        let normalizing_sum: f64 = purified.iter().sum();
        if normalizing_sum <= 0.0 {
            // Every action fell under the threshold; keep the raw average.
            return Ok(average);
        }
        Ok(purified.map(|p| p / normalizing_sum))
    }

    /// Key, mean reach probability and average strategy on one line.
    pub fn describe(&self, threshold: f64) -> String {
        let mut line =
            format!("{:7} {:.2}", self.key.to_string(), self.average_reach_probability());
        match self.average_strategy_with_threshold(threshold) {
            Ok(avg_strategy) => {
                line.push_str(" Avg Strategy[");
                for (act, prob) in Action::VALUES.iter().zip(avg_strategy) {
                    line.push_str(&format!("{}: {:.3}, ", act, prob));
                }
                line.push(']');
            }
            Err(_) => line.push_str(" Avg Strategy[unreached]"),
        }
        line
    }

    /// Mean reach probability per visited iteration.
    pub fn average_reach_probability(&self) -> f64 {
        if self.visit_count == 0 {
            return 0.0;
        }
        self.reach_probability_sum / self.visit_count as f64
    }
}

impl Display for InfoSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe(PURIFICATION_THRESHOLD))
    }
}
