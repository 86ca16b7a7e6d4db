use rouledict_db::models::MAX_OUTCOME;
use rouledict_db::store::StateStore;

use crate::config::{EngineConfig, is_valid_window_size};
use crate::error::{EngineError, EngineResult};
use crate::stabilizer::StabilizerState;
use crate::stake::MAX_STAKE_INDEX;
use crate::state::EngineState;

pub fn encode_state(key: &str, state: &EngineState) -> EngineResult<String> {
    serde_json::to_string(state).map_err(|e| EngineError::PersistenceSave {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Décode et assainit un blob. Un numéro hors bornes ou plusieurs prédictions
/// en attente rendent le blob inutilisable ; le reste est corrigé sur place.
pub fn decode_state(key: &str, json: &str, config: &EngineConfig) -> EngineResult<EngineState> {
    let corrupt = |reason: String| EngineError::PersistenceLoad {
        key: key.to_string(),
        reason,
    };

    let mut state: EngineState = serde_json::from_str(json).map_err(|e| corrupt(e.to_string()))?;

    if let Some(&bad) = state.log.iter().find(|&&n| n > MAX_OUTCOME) {
        return Err(corrupt(format!("numéro hors bornes dans l'historique : {bad}")));
    }
    if state.pending_count() > 1 {
        return Err(corrupt(format!("{} prédictions en attente", state.pending_count())));
    }

    if !is_valid_window_size(state.window_size) {
        tracing::warn!(
            window = state.window_size,
            fallback = config.default_window_size,
            "fenêtre persistée invalide, valeur par défaut utilisée"
        );
        state.window_size = config.default_window_size;
    }
    state.stake_index = state.stake_index.min(MAX_STAKE_INDEX);
    let excess = state.previous.len().saturating_sub(state.log.len());
    state.previous.drain(..excess);
    if state.log.len() < config.stabilizer.min_history {
        state.current = StabilizerState::NoPrediction;
    }

    Ok(state)
}

/// Charge l'état ; toute erreur retombe sur l'état initial vide.
pub fn load_state(store: &dyn StateStore, config: &EngineConfig) -> EngineState {
    let key = config.storage_key.as_str();
    let loaded = store
        .load(key)
        .map_err(|e| EngineError::PersistenceLoad {
            key: key.to_string(),
            reason: format!("{e:#}"),
        })
        .and_then(|blob| blob.map(|json| decode_state(key, &json, config)).transpose());

    match loaded {
        Ok(Some(state)) => {
            tracing::debug!(store = store.name(), outcomes = state.log.len(), "état chargé");
            state
        }
        Ok(None) => EngineState::new(config),
        Err(e) => {
            tracing::warn!(store = store.name(), error = %e, "état illisible, démarrage à vide");
            EngineState::new(config)
        }
    }
}

pub fn save_state(store: &dyn StateStore, key: &str, state: &EngineState) -> EngineResult<()> {
    let json = encode_state(key, state)?;
    store.save(key, &json).map_err(|e| EngineError::PersistenceSave {
        key: key.to_string(),
        reason: format!("{e:#}"),
    })
}
