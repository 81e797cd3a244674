use std::{
    fmt::Display,
    str::FromStr,
};

use itertools::Itertools;

use crate::error::{
    CfrError,
    Result,
};

/// Number of distinct two-card deals.
pub const DEAL_COUNT: usize = 6;

/// Probability of each deal at the chance node.
pub const CHANCE_PROBABILITY: f64 = 1.0 / DEAL_COUNT as f64;

/// The betting round never exceeds check, bet, call/fold.
pub const MAX_BETTING_ACTIONS: usize = 3;

/// Prefix standing for the two forced actions (antes and deal).
const DEAL_PREFIX: &str = "rr";

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Card {
    Jack = 0,
    Queen = 1,
    King = 2,
}

impl Card {
    pub const VALUES: [Card; 3] = [Card::Jack, Card::Queen, Card::King];
}

impl Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = match self {
            Card::Jack => 'J',
            Card::Queen => 'Q',
            Card::King => 'K',
        };
        write!(f, "{}", c)
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Action {
    /// Check, or fold when facing a bet.
    Pass,
    /// Bet, or call when facing a bet.
    Bet,
}

impl Action {
    pub const VALUES: [Action; 2] = [Action::Pass, Action::Bet];
    pub const COUNT: usize = Action::VALUES.len();

    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Pass => write!(f, "c"),
            Action::Bet => write!(f, "b"),
        }
    }
}

impl TryFrom<char> for Action {
    type Error = CfrError;

    fn try_from(c: char) -> Result<Self> {
        match c {
            'c' => Ok(Action::Pass),
            'b' => Ok(Action::Bet),
            _ => Err(CfrError::InvalidHistory(c.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub const VALUES: [Player; 2] = [Player::One, Player::Two];

    /// Player 1 acts at even history lengths, player 2 at odd ones.
    pub fn from_history_len(len: usize) -> Self {
        if len % 2 == 0 {
            Player::One
        } else {
            Player::Two
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }

    pub fn opponent(&self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }
}

impl Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "player {}", self.index() + 1)
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Terminal {
    /// Both players checked.
    Showdown,
    /// A bet was called.
    CalledShowdown,
    /// A bet was folded to.
    Fold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Chance,
    Decision(Player),
    Terminal(Terminal),
}

/// Public action history. Before the deal it is empty; afterwards it is the
/// forced `rr` prefix followed by up to three betting actions.
#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq)]
pub struct History {
    dealt: bool,
    actions: [Option<Action>; MAX_BETTING_ACTIONS],
}

impl History {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn dealt() -> Self {
        Self {
            dealt: true,
            actions: [None; MAX_BETTING_ACTIONS],
        }
    }

    pub fn is_dealt(&self) -> bool {
        self.dealt
    }

    pub fn betting_actions(&self) -> impl Iterator<Item = Action> + '_ {
        self.actions.iter().map_while(|a| *a)
    }

    pub fn len(&self) -> usize {
        if !self.dealt {
            return 0;
        }
        DEAL_PREFIX.len() + self.betting_actions().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn next_player(&self) -> Player {
        Player::from_history_len(self.len())
    }

    pub fn terminal(&self) -> Option<Terminal> {
        use Action::*;
        match self.actions {
            [Some(Pass), Some(Pass), None] => Some(Terminal::Showdown),
            [Some(Bet), Some(Bet), None] | [Some(Pass), Some(Bet), Some(Bet)] => {
                Some(Terminal::CalledShowdown)
            }
            [Some(Bet), Some(Pass), None] | [Some(Pass), Some(Bet), Some(Pass)] => {
                Some(Terminal::Fold)
            }
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal().is_some()
    }

    pub fn node_kind(&self) -> NodeKind {
        if !self.dealt {
            return NodeKind::Chance;
        }
        match self.terminal() {
            Some(terminal) => NodeKind::Terminal(terminal),
            None => NodeKind::Decision(self.next_player()),
        }
    }

    pub fn with_action(&self, action: Action) -> Result<Self> {
        let invalid = || CfrError::InvalidHistory(format!("{}{}", self, action));
        if !self.dealt || self.is_terminal() {
            return Err(invalid());
        }
        let slot = self.actions.iter().position(|a| a.is_none()).ok_or_else(invalid)?;
        let mut next = *self;
        next.actions[slot] = Some(action);
        Ok(next)
    }
}

impl Display for History {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.dealt {
            return Ok(());
        }
        write!(f, "{}", DEAL_PREFIX)?;
        for action in self.betting_actions() {
            write!(f, "{}", action)?;
        }
        Ok(())
    }
}

impl FromStr for History {
    type Err = CfrError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(History::root());
        }
        let invalid = || CfrError::InvalidHistory(s.to_string());
        let betting = s.strip_prefix(DEAL_PREFIX).ok_or_else(invalid)?;
        betting.chars().try_fold(History::dealt(), |history, c| {
            let action = Action::try_from(c).map_err(|_| invalid())?;
            history.with_action(action).map_err(|_| invalid())
        })
    }
}

/// All ordered pairs of distinct cards: `[player 1 card, player 2 card]`.
pub fn deals() -> impl Iterator<Item = [Card; 2]> {
    Card::VALUES
        .into_iter()
        .cartesian_product(Card::VALUES)
        .filter(|(c1, c2)| c1 != c2)
        .map(|(c1, c2)| [c1, c2])
}

/// Payoff at a terminal history, from the perspective of the player whose
/// turn it would be at that history length.
pub fn terminal_utility(history: &History, cards: [Card; 2]) -> Result<f64> {
    let terminal =
        history.terminal().ok_or_else(|| CfrError::InvalidHistory(history.to_string()))?;
    let player = history.next_player();
    let wins = cards[player.index()] > cards[player.opponent().index()];
    let utility = match terminal {
        // The player to move is the one who bet; the opponent just folded.
        Terminal::Fold => 1.0,
        Terminal::Showdown => {
            if wins {
                1.0
            } else {
                -1.0
            }
        }
        Terminal::CalledShowdown => {
            if wins {
                2.0
            } else {
                -2.0
            }
        }
    };
    Ok(utility)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(s: &str) -> History {
        s.parse().unwrap()
    }

    const KING_VS_JACK: [Card; 2] = [Card::King, Card::Jack];

    #[test]
    fn test_terminal_payoffs() {
        assert_eq!(1.0, terminal_utility(&history("rrcc"), KING_VS_JACK).unwrap());
        assert_eq!(1.0, terminal_utility(&history("rrbc"), KING_VS_JACK).unwrap());
        assert_eq!(2.0, terminal_utility(&history("rrbb"), KING_VS_JACK).unwrap());
        assert_eq!(1.0, terminal_utility(&history("rrcbc"), KING_VS_JACK).unwrap());
    }

    #[test]
    fn test_terminal_payoffs_for_weaker_hand() {
        let cards = [Card::Jack, Card::Queen];
        assert_eq!(-1.0, terminal_utility(&history("rrcc"), cards).unwrap());
        assert_eq!(-2.0, terminal_utility(&history("rrbb"), cards).unwrap());
        // Player 2 is to move at length 5 and holds the queen.
        assert_eq!(2.0, terminal_utility(&history("rrcbb"), cards).unwrap());
        // Folds pay the bettor regardless of cards.
        assert_eq!(1.0, terminal_utility(&history("rrbc"), cards).unwrap());
        assert_eq!(1.0, terminal_utility(&history("rrcbc"), cards).unwrap());
    }

    #[test]
    fn test_terminal_utility_rejects_non_terminal() {
        for s in ["", "rr", "rrc", "rrb", "rrcb"] {
            let err = terminal_utility(&history(s), KING_VS_JACK).unwrap_err();
            assert!(matches!(err, CfrError::InvalidHistory(_)), "{}", s);
        }
    }

    #[test]
    fn test_node_kinds() {
        assert_eq!(NodeKind::Chance, history("").node_kind());
        assert_eq!(NodeKind::Decision(Player::One), history("rr").node_kind());
        assert_eq!(NodeKind::Decision(Player::Two), history("rrc").node_kind());
        assert_eq!(NodeKind::Decision(Player::Two), history("rrb").node_kind());
        assert_eq!(NodeKind::Decision(Player::One), history("rrcb").node_kind());
        assert_eq!(NodeKind::Terminal(Terminal::Showdown), history("rrcc").node_kind());
        assert_eq!(NodeKind::Terminal(Terminal::CalledShowdown), history("rrcbb").node_kind());
        assert_eq!(NodeKind::Terminal(Terminal::Fold), history("rrcbc").node_kind());
    }

    #[test]
    fn test_history_len_and_display() {
        let h = History::dealt()
            .with_action(Action::Pass)
            .and_then(|h| h.with_action(Action::Bet))
            .unwrap();
        assert_eq!(4, h.len());
        assert_eq!("rrcb", h.to_string());
        assert_eq!(0, History::root().len());
        assert_eq!("", History::root().to_string());
        assert_eq!(2, History::dealt().len());
    }

    #[test]
    fn test_invalid_histories() {
        for s in ["r", "rc", "xx", "rrx", "rrcbcc", "rrbbc", "rrcca", "rrr"] {
            assert!(
                matches!(s.parse::<History>(), Err(CfrError::InvalidHistory(_))),
                "{:?} should be rejected",
                s
            );
        }
        assert!(History::root().with_action(Action::Bet).is_err());
        assert!(history("rrbc").with_action(Action::Pass).is_err());
    }

    #[test]
    fn test_deals() {
        let deals: Vec<[Card; 2]> = deals().collect();
        assert_eq!(DEAL_COUNT, deals.len());
        assert!(deals.iter().all(|[c1, c2]| c1 != c2));
        assert_eq!(DEAL_COUNT, deals.iter().unique().count());
    }

    #[test]
    fn test_player_parity() {
        assert_eq!(Player::One, Player::from_history_len(4));
        assert_eq!(Player::Two, Player::from_history_len(5));
        assert_eq!(Player::One, Player::Two.opponent());
    }
}
