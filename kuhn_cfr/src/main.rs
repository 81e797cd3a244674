use clap::Parser;
use log::error;

use kuhn_cfr::{
    Trainer,
    TrainingArgs,
};

/// Solves three-card Kuhn poker with vanilla counterfactual regret minimization.
#[derive(Parser)]
struct AppArgs {
    #[clap(flatten)]
    training_args: TrainingArgs,
}

fn main() {
    // Initialize env_logger with a default log level of INFO.
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    let args = AppArgs::parse();
    let mut trainer = Trainer::new(args.training_args);
    if let Err(err) = trainer.train() {
        error!("Training failed: {}", err);
        std::process::exit(1);
    }
}
