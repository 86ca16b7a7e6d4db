use serde::{Deserialize, Serialize};

use rouledict_db::models::{CurrentPrediction, Dozen, PredictionRecord, PredictionResult};
use crate::config::StabilizerConfig;
use crate::scoring::Scores;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum StabilizerState {
    #[default]
    NoPrediction,
    Active(CurrentPrediction),
}

impl StabilizerState {
    pub fn current(&self) -> Option<&CurrentPrediction> {
        match self {
            StabilizerState::NoPrediction => None,
            StabilizerState::Active(prediction) => Some(prediction),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Historique trop court, rien ne bouge.
    Waiting,
    Entered,
    /// Même meilleure douzaine : score et alternative rafraîchis.
    Refreshed,
    Switched,
    Held,
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transition::Waiting => write!(f, "waiting"),
            Transition::Entered => write!(f, "entered"),
            Transition::Refreshed => write!(f, "refreshed"),
            Transition::Switched => write!(f, "switched"),
            Transition::Held => write!(f, "held"),
        }
    }
}

/// Vrai si les deux dernières prédictions résolues sont gagnantes et portaient sur `primary`.
pub fn last_two_wins_for(history: &[PredictionRecord], primary: Dozen) -> bool {
    let resolved: Vec<&PredictionRecord> = history
        .iter()
        .rev()
        .filter(|p| p.result.is_resolved())
        .take(2)
        .collect();
    resolved.len() == 2
        && resolved
            .iter()
            .all(|p| p.result == PredictionResult::Win && p.predicted == primary)
}

pub struct Stabilizer {
    config: StabilizerConfig,
}

impl Stabilizer {
    pub fn new(config: StabilizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StabilizerConfig {
        &self.config
    }

    /// Réévalue la prédiction courante après un changement de statistiques.
    pub fn step(
        &self,
        state: &mut StabilizerState,
        scores: &Scores,
        history_len: usize,
        alternate_mode: bool,
        history: &[PredictionRecord],
    ) -> Transition {
        if history_len < self.config.min_history {
            return Transition::Waiting;
        }

        let ranked = scores.ranked();
        let (best, best_score) = ranked[0];
        let alternate = alternate_mode.then_some(ranked[1].0);
        let fresh = CurrentPrediction {
            primary: best,
            alternate,
            score: best_score,
            rounds_held: 1,
        };

        let current = match state {
            StabilizerState::NoPrediction => {
                *state = StabilizerState::Active(fresh);
                return Transition::Entered;
            }
            StabilizerState::Active(current) => current,
        };

        if best == current.primary {
            current.score = best_score;
            current.alternate = alternate;
            current.rounds_held += 1;
            return Transition::Refreshed;
        }

        let threshold = current.score * self.config.switch_ratio;
        if best_score >= threshold {
            *current = fresh;
            Transition::Switched
        } else if last_two_wins_for(history, current.primary)
            && best_score < current.score * self.config.hold_ratio
        {
            current.rounds_held += 1;
            Transition::Held
        } else if current.rounds_held >= self.config.min_rounds_held {
            *current = fresh;
            Transition::Switched
        } else {
            current.rounds_held += 1;
            Transition::Held
        }
    }
}
