pub mod dataset;
pub mod engine;

pub use dataset::{Dataset, MatchLog};
pub use engine::LocalLogEngine;
