use serde::{Deserialize, Serialize};

use rouledict_db::models::{BotStats, PredictionRecord};
use crate::config::EngineConfig;
use crate::stabilizer::StabilizerState;

/// Agrégat mutable unique possédé par le moteur ; c'est aussi le blob persisté.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineState {
    /// Ordre chronologique, le plus récent en dernier.
    pub log: Vec<u8>,
    pub predictions: Vec<PredictionRecord>,
    pub bot_stats: BotStats,
    pub stake_index: usize,
    pub window_size: usize,
    pub alternate_mode: bool,
    pub current: StabilizerState,
    /// État du stabilisateur avant chaque tirage ; le sommet correspond au dernier tirage.
    pub previous: Vec<StabilizerState>,
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl EngineState {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            log: Vec::new(),
            predictions: Vec::new(),
            bot_stats: BotStats::default(),
            stake_index: 0,
            window_size: config.default_window_size,
            alternate_mode: config.default_alternate_mode,
            current: StabilizerState::NoPrediction,
            previous: Vec::new(),
        }
    }

    pub fn pending_index(&self) -> Option<usize> {
        self.predictions.iter().rposition(|p| p.is_pending())
    }

    pub fn pending_count(&self) -> usize {
        self.predictions.iter().filter(|p| p.is_pending()).count()
    }

    pub fn next_prediction_id(&self) -> u64 {
        self.predictions.iter().map(|p| p.id).max().map_or(1, |id| id + 1)
    }
}
