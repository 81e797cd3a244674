use std::{
    fs::File,
    io::{
        BufWriter,
        Write,
    },
    path::PathBuf,
    time::{
        Duration,
        Instant,
    },
};

use clap::{
    Args,
    ValueHint,
};
use log::{
    debug,
    info,
};

use crate::{
    error::{
        CfrError,
        Result,
    },
    eval::{
        compute_exploitability,
        PurifiedAverage,
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
        DEAL_COUNT,
    },
    info_set::PURIFICATION_THRESHOLD,
    store::InfoSetStore,
};

#[derive(Args, Debug, Clone)]
pub struct TrainingArgs {
    #[clap(
        long,
        short,
        value_parser = clap::value_parser!(u64).range(1..),
        default_value_t = 10_000
    )]
    iterations: u64,

    /// CSV file receiving periodic progress rows.
    #[clap(long, short, value_parser, value_hint(ValueHint::FilePath))]
    log_path: Option<PathBuf>,

    /// Average-strategy probabilities below this are reported as zero.
    #[clap(long, value_parser, default_value_t = PURIFICATION_THRESHOLD)]
    purification_threshold: f64,

    /// Seconds between progress reports.
    #[clap(long, value_parser, default_value_t = 5)]
    report_interval: u64,
}

impl TrainingArgs {
    pub fn new(iterations: u64) -> Self {
        TrainingArgs {
            iterations,
            log_path: None,
            purification_threshold: PURIFICATION_THRESHOLD,
            report_interval: 5,
        }
    }

    pub fn with_log_path(mut self, log_path: PathBuf) -> Self {
        self.log_path = Some(log_path);
        self
    }

    pub fn with_purification_threshold(mut self, threshold: f64) -> Self {
        self.purification_threshold = threshold;
        self
    }

    pub fn with_report_interval(mut self, seconds: u64) -> Self {
        self.report_interval = seconds;
        self
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }
}

/// Utility flips sign every ply: what is good for the child's mover is bad
/// for the parent's.
pub fn negate_for_parent_perspective(child_util: f64) -> f64 {
    -child_util
}

/// Probability that everyone except `player` brings play to the node.
pub fn counterfactual_weight(player: Player, pr1: f64, pr2: f64, prc: f64) -> f64 {
    match player {
        Player::One => pr2 * prc,
        Player::Two => pr1 * prc,
    }
}

/// Expected utility of `history` for the player to move there, accumulating
/// regret into `store` along the way.
///
/// `cards` is `[player 1, player 2]` and is ignored at the chance node, which
/// deals every combination itself.
pub fn cfr(
    store: &mut InfoSetStore,
    history: &History,
    cards: Option<[Card; 2]>,
    reach: [f64; 2],
    chance_reach: f64,
) -> Result<f64> {
    let (player, cards) = match (history.node_kind(), cards) {
        (NodeKind::Chance, _) => return chance_util(store),
        (_, None) => {
            return Err(CfrError::InvalidHistory(format!("{} reached without a deal", history)));
        }
        (NodeKind::Terminal(_), Some(cards)) => return terminal_utility(history, cards),
        (NodeKind::Decision(player), Some(cards)) => (player, cards),
    };
    let card = cards[player.index()];
    debug!("CFR history: {} {} reach: {:?} chance: {}", history, player, reach, chance_reach);

    let info_set = store.get_or_create(card, *history);
    info_set.accumulate_reach(reach[player.index()]);
    let strategy = *info_set.current_strategy();

    let mut action_utils = [0.0; Action::COUNT];
    for (i, act) in Action::VALUES.iter().enumerate() {
        let next_history = history.with_action(*act)?;
        let mut next_reach = reach;
        next_reach[player.index()] *= strategy[i];
        let child_util = cfr(store, &next_history, Some(cards), next_reach, chance_reach)?;
        action_utils[i] = negate_for_parent_perspective(child_util);
    }
    let node_util: f64 = strategy.iter().zip(&action_utils).map(|(p, u)| p * u).sum();

    let weight = counterfactual_weight(player, reach[0], reach[1], chance_reach);
    store.get_or_create(card, *history).accumulate_regret(weight, &action_utils, node_util);

    Ok(node_util)
}

fn chance_util(store: &mut InfoSetStore) -> Result<f64> {
    let mut expected_value = 0.0;
    for cards in deals() {
        expected_value +=
            cfr(store, &History::dealt(), Some(cards), [1.0, 1.0], CHANCE_PROBABILITY)?;
    }
    Ok(expected_value / DEAL_COUNT as f64)
}

/// One full traversal from the deal. Returns player 1's expected value under
/// the current strategies.
pub fn run_iteration(store: &mut InfoSetStore) -> Result<f64> {
    cfr(store, &History::root(), None, [1.0, 1.0], 1.0)
}

pub fn advance_all(store: &mut InfoSetStore) {
    store.advance_all();
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingSummary {
    pub iterations: u64,
    /// Player 1's value averaged over all iterations.
    pub game_value: f64,
    pub exploitability: f64,
}

pub struct Trainer {
    store: InfoSetStore,
    args: TrainingArgs,
}

impl Trainer {
    pub fn new(args: TrainingArgs) -> Self {
        Trainer {
            store: InfoSetStore::new(),
            args,
        }
    }

    pub fn store(&self) -> &InfoSetStore {
        &self.store
    }

    fn profile(&self) -> PurifiedAverage<'_> {
        PurifiedAverage::new(&self.store, self.args.purification_threshold)
    }

    pub fn train(&mut self) -> Result<TrainingSummary> {
        let mut log_writer = match &self.args.log_path {
            Some(path) => {
                let mut w = BufWriter::new(File::create(path)?);
                writeln!(w, "epoch,elapsed_seconds,game_value,exploitability")?;
                Some(w)
            }
            None => None,
        };

        let report_interval = Duration::from_secs(self.args.report_interval);
        let mut util = 0.0;
        let start_t = Instant::now();
        let mut timer = Instant::now();
        for i in 1..=self.args.iterations {
            util += run_iteration(&mut self.store)?;
            advance_all(&mut self.store);

            if timer.elapsed() > report_interval {
                let exploitability = compute_exploitability(&self.profile())?;
                info!("epoch {:10}: exploitability: {}", i, exploitability);
                info!("Average game value: {}", util / i as f64);

                if let Some(w) = &mut log_writer {
                    writeln!(
                        w,
                        "{},{},{:.12},{:.12}",
                        i,
                        start_t.elapsed().as_secs(),
                        util / i as f64,
                        exploitability
                    )?;
                    w.flush()?;
                }
                timer = Instant::now();
            }
        }
        info!("Training has finished");

        let summary = TrainingSummary {
            iterations: self.args.iterations,
            game_value: util / self.args.iterations as f64,
            exploitability: compute_exploitability(&self.profile())?,
        };
        self.report(&summary);
        Ok(summary)
    }

    fn report(&self, summary: &TrainingSummary) {
        info!("player 1 expected value: {}", summary.game_value);
        info!("player 2 expected value: {}", -summary.game_value);
        for player in Player::VALUES {
            info!("{} strategies [", player);
            for info_set in self.store.for_player(player) {
                info!("    {}", info_set.describe(self.args.purification_threshold));
            }
            info!("]");
        }
        info!("# of infoset: {}", self.store.len());
        info!("exploitability: {}", summary.exploitability);
    }
}
