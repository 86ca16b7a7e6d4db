pub mod config;
pub mod engine;
pub mod error;
pub mod persistence;
pub mod plenos;
pub mod scoring;
pub mod stabilizer;
pub mod stake;
pub mod state;
pub mod stats;

pub use config::EngineConfig;
pub use engine::{EngineSnapshot, PredictionEngine};
pub use error::EngineError;
