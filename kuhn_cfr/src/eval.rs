use std::collections::HashMap;

use log::debug;
use more_asserts::debug_assert_ge;

use crate::{
    error::{
        CfrError,
        Result,
    },
    game::{
        deals,
        terminal_utility,
        Action,
        Card,
        History,
        NodeKind,
        Player,
        CHANCE_PROBABILITY,
    },
    info_set::{
        uniform_strategy,
        InfoSetKey,
        Strategy,
        PURIFICATION_THRESHOLD,
    },
    store::InfoSetStore,
};

/// A behavior strategy for both players, looked up per info set.
pub trait StrategyProfile {
    fn get_strategy(&self, key: &InfoSetKey) -> Result<Option<Strategy>>;

    /// Info sets the profile knows nothing about are played uniformly.
    fn strategy_or_uniform(&self, key: &InfoSetKey) -> Result<Strategy> {
        Ok(self.get_strategy(key)?.unwrap_or_else(uniform_strategy))
    }
}

impl StrategyProfile for HashMap<InfoSetKey, Strategy> {
    fn get_strategy(&self, key: &InfoSetKey) -> Result<Option<Strategy>> {
        Ok(self.get(key).copied())
    }
}

impl StrategyProfile for InfoSetStore {
    fn get_strategy(&self, key: &InfoSetKey) -> Result<Option<Strategy>> {
        PurifiedAverage::new(self, PURIFICATION_THRESHOLD).get_strategy(key)
    }
}

/// Average strategies of a store, purified with a custom threshold.
pub struct PurifiedAverage<'a> {
    store: &'a InfoSetStore,
    threshold: f64,
}

impl<'a> PurifiedAverage<'a> {
    pub fn new(store: &'a InfoSetStore, threshold: f64) -> Self {
        Self {
            store,
            threshold,
        }
    }
}

impl StrategyProfile for PurifiedAverage<'_> {
    fn get_strategy(&self, key: &InfoSetKey) -> Result<Option<Strategy>> {
        self.store
            .get(key)
            .map(|info_set| info_set.average_strategy_with_threshold(self.threshold))
            .transpose()
    }
}

fn utility_for(player: Player, history: &History, cards: [Card; 2]) -> Result<f64> {
    let util = terminal_utility(history, cards)?;
    if history.next_player() == player {
        Ok(util)
    } else {
        Ok(-util)
    }
}

fn deal_for(player: Player, own: Card, opponent: Card) -> [Card; 2] {
    match player {
        Player::One => [own, opponent],
        Player::Two => [opponent, own],
    }
}

fn chance_node_error(history: &History) -> CfrError {
    CfrError::InvalidHistory(format!("chance node {:?} below the deal", history.to_string()))
}

fn player_one_value<P: StrategyProfile>(
    profile: &P,
    history: &History,
    cards: [Card; 2],
) -> Result<f64> {
    match history.node_kind() {
        NodeKind::Chance => Err(chance_node_error(history)),
        NodeKind::Terminal(_) => utility_for(Player::One, history, cards),
        NodeKind::Decision(player) => {
            let key = InfoSetKey::new(cards[player.index()], *history);
            let strategy = profile.strategy_or_uniform(&key)?;
            let mut value = 0.0;
            for (act, prob) in Action::VALUES.iter().zip(strategy) {
                value += prob * player_one_value(profile, &history.with_action(*act)?, cards)?;
            }
            Ok(value)
        }
    }
}

/// Player 1's expected value when both players follow `profile`.
pub fn expected_value<P: StrategyProfile>(profile: &P) -> Result<f64> {
    let mut value = 0.0;
    for cards in deals() {
        value += CHANCE_PROBABILITY * player_one_value(profile, &History::dealt(), cards)?;
    }
    Ok(value)
}

/// `beliefs[c]` is the probability that chance and the opponent's play bring
/// the game here with the opponent holding `c`.
fn best_response<P: StrategyProfile>(
    profile: &P,
    br_player: Player,
    br_card: Card,
    history: &History,
    beliefs: [f64; 3],
) -> Result<f64> {
    match history.node_kind() {
        NodeKind::Chance => Err(chance_node_error(history)),
        NodeKind::Terminal(_) => {
            let mut value = 0.0;
            for opponent_card in Card::VALUES {
                let belief = beliefs[opponent_card as usize];
                if belief > 0.0 {
                    let cards = deal_for(br_player, br_card, opponent_card);
                    value += belief * utility_for(br_player, history, cards)?;
                }
            }
            Ok(value)
        }
        NodeKind::Decision(player) if player == br_player => {
            let mut best = f64::NEG_INFINITY;
            for act in Action::VALUES {
                let next_history = history.with_action(act)?;
                let value = best_response(profile, br_player, br_card, &next_history, beliefs)?;
                best = best.max(value);
            }
            Ok(best)
        }
        NodeKind::Decision(_) => {
            let mut value = 0.0;
            for act in Action::VALUES {
                let mut next_beliefs = beliefs;
                for opponent_card in Card::VALUES {
                    let belief = &mut next_beliefs[opponent_card as usize];
                    if *belief > 0.0 {
                        let key = InfoSetKey::new(opponent_card, *history);
                        *belief *= profile.strategy_or_uniform(&key)?[act.index()];
                    }
                }
                let next_history = history.with_action(act)?;
                value += best_response(profile, br_player, br_card, &next_history, next_beliefs)?;
            }
            Ok(value)
        }
    }
}

/// Value `player` obtains by best-responding to the other player's part of
/// `profile`.
pub fn best_response_value<P: StrategyProfile>(profile: &P, player: Player) -> Result<f64> {
    let mut value = 0.0;
    for br_card in Card::VALUES {
        let beliefs = Card::VALUES.map(|c| if c == br_card { 0.0 } else { CHANCE_PROBABILITY });
        value += best_response(profile, player, br_card, &History::dealt(), beliefs)?;
    }
    Ok(value)
}

/// Mean gain of the two best responses over the game value. Zero exactly at
/// a Nash equilibrium.
pub fn compute_exploitability<P: StrategyProfile>(profile: &P) -> Result<f64> {
    let br0 = best_response_value(profile, Player::One)?;
    let br1 = best_response_value(profile, Player::Two)?;
    debug!("util_0(br0): {}, util_1(br1): {}", br0, br1);
    let exploitability = (br0 + br1) / 2.0;
    debug_assert_ge!(exploitability, -1e-9, "Exploitability must not be negative.");
    Ok(exploitability)
}

#[cfg(test)]
mod tests {
    use more_asserts::{
        assert_ge,
        assert_gt,
        assert_le,
    };

    use super::*;

    fn profile(entries: &[(Card, &str, f64)]) -> HashMap<InfoSetKey, Strategy> {
        entries
            .iter()
            .map(|(card, history, bet)| {
                (InfoSetKey::new(*card, history.parse().unwrap()), [1.0 - bet, *bet])
            })
            .collect()
    }

    /// The equilibrium family member in which player 1 never bets first.
    fn nash_profile() -> HashMap<InfoSetKey, Strategy> {
        profile(&[
            (Card::Jack, "rr", 0.0),
            (Card::Queen, "rr", 0.0),
            (Card::King, "rr", 0.0),
            (Card::Jack, "rrcb", 0.0),
            (Card::Queen, "rrcb", 1.0 / 3.0),
            (Card::King, "rrcb", 1.0),
            (Card::Jack, "rrb", 0.0),
            (Card::Queen, "rrb", 1.0 / 3.0),
            (Card::King, "rrb", 1.0),
            (Card::Jack, "rrc", 1.0 / 3.0),
            (Card::Queen, "rrc", 0.0),
            (Card::King, "rrc", 1.0),
        ])
    }

    #[test]
    fn test_nash_profile_value() {
        let value = expected_value(&nash_profile()).unwrap();
        assert_le!((value - -1.0 / 18.0).abs(), 1e-12);
    }

    #[test]
    fn test_nash_profile_is_unexploitable() {
        let profile = nash_profile();
        assert_le!(compute_exploitability(&profile).unwrap().abs(), 1e-12);
        let br0 = best_response_value(&profile, Player::One).unwrap();
        let br1 = best_response_value(&profile, Player::Two).unwrap();
        assert_le!((br0 - -1.0 / 18.0).abs(), 1e-12);
        assert_le!((br1 - 1.0 / 18.0).abs(), 1e-12);
    }

    #[test]
    fn test_uniform_profile_is_exploitable() {
        let uniform: HashMap<InfoSetKey, Strategy> = HashMap::new();
        assert_le!((expected_value(&uniform).unwrap() - 0.125).abs(), 1e-12);
        assert_gt!(compute_exploitability(&uniform).unwrap(), 0.1);
    }

    #[test]
    fn test_best_response_beats_profile_value() {
        // Player 2 always folds, so betting with anything wins the ante.
        let mut folding = nash_profile();
        for card in Card::VALUES {
            folding.insert(InfoSetKey::new(card, "rrb".parse().unwrap()), [1.0, 0.0]);
        }
        assert_ge!(best_response_value(&folding, Player::One).unwrap(), 1.0 - 1e-12);
        assert_gt!(compute_exploitability(&folding).unwrap(), 0.0);
    }

    #[test]
    fn test_unreached_store_entry_is_degenerate() {
        let mut store = InfoSetStore::new();
        store.get_or_create(Card::King, History::dealt());
        assert!(matches!(
            expected_value(&store),
            Err(CfrError::DegenerateAverageStrategy { .. })
        ));
    }
}
