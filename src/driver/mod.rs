//! Training and prediction orchestration (§4.5, §4.6, §7).

mod learner;
mod likelihood;
mod predictor;

pub use learner::{Learner, LearnerConfig};
pub use predictor::Predictor;
