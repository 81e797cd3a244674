pub mod error;
pub mod eval;
pub mod game;
pub mod info_set;
pub mod store;
pub mod trainer;

pub use error::{
    CfrError,
    Result,
};
pub use info_set::{
    InfoSet,
    InfoSetKey,
    Strategy,
};
pub use store::InfoSetStore;
pub use trainer::{
    advance_all,
    run_iteration,
    Trainer,
    TrainingArgs,
};
