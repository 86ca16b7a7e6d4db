use chrono::Utc;
use serde::Serialize;

use rouledict_db::models::{
    BotStats, CurrentPrediction, Dozen, METHOD_LABEL, PredictionRecord, PredictionResult, Strength,
    is_valid_outcome,
};
use rouledict_db::store::StateStore;

use crate::config::{EngineConfig, is_valid_window_size};
use crate::error::{EngineError, EngineResult};
use crate::persistence::{load_state, save_state};
use crate::plenos::recommend_plenos;
use crate::scoring::{Scores, compute_scores};
use crate::stabilizer::{Stabilizer, StabilizerState, Transition};
use crate::stake::{next_stake_index, stake_amount};
use crate::state::EngineState;
use crate::stats::{WindowStats, compute_window_stats};

/// Vue figée de l'état du moteur, destinée à l'affichage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub log: Vec<u8>,
    pub stats: WindowStats,
    pub scores: Scores,
    pub current_prediction: StabilizerState,
    pub prediction_history: Vec<PredictionRecord>,
    pub bot_stats: BotStats,
    pub stake_index: usize,
    pub stake_amount: u32,
    pub window_size: usize,
    pub alternate_mode: bool,
}

/// Accepte un entier, ou un flottant sans partie décimale (« 7.0 »).
pub fn parse_outcome(input: &str) -> EngineResult<i64> {
    let trimmed = input.trim();
    let invalid = || EngineError::InvalidOutcome { input: trimmed.to_string() };
    if let Ok(n) = trimmed.parse::<i64>() {
        return Ok(n);
    }
    match trimmed.parse::<f64>() {
        Ok(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < i64::MAX as f64 => Ok(x as i64),
        _ => Err(invalid()),
    }
}

pub struct PredictionEngine {
    config: EngineConfig,
    stabilizer: Stabilizer,
    state: EngineState,
    stats: WindowStats,
    scores: Scores,
    store: Option<Box<dyn StateStore>>,
}

impl PredictionEngine {
    /// Moteur sans persistance.
    pub fn new(config: EngineConfig) -> Self {
        let state = EngineState::new(&config);
        Self::from_parts(config, state, None)
    }

    /// Charge l'état depuis `store` (état vide en cas d'échec) et y sauvegarde
    /// après chaque mutation.
    pub fn with_store(config: EngineConfig, store: Box<dyn StateStore>) -> Self {
        let state = load_state(store.as_ref(), &config);
        Self::from_parts(config, state, Some(store))
    }

    fn from_parts(config: EngineConfig, state: EngineState, store: Option<Box<dyn StateStore>>) -> Self {
        let stats = compute_window_stats(&state.log, state.window_size);
        let scores = compute_scores(&stats);
        Self {
            stabilizer: Stabilizer::new(config.stabilizer.clone()),
            config,
            state,
            stats,
            scores,
            store,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn log(&self) -> &[u8] {
        &self.state.log
    }

    pub fn stats(&self) -> &WindowStats {
        &self.stats
    }

    pub fn scores(&self) -> &Scores {
        &self.scores
    }

    pub fn current_prediction(&self) -> Option<&CurrentPrediction> {
        self.state.current.current()
    }

    pub fn stabilizer_state(&self) -> &StabilizerState {
        &self.state.current
    }

    pub fn predictions(&self) -> &[PredictionRecord] {
        &self.state.predictions
    }

    pub fn pending_prediction(&self) -> Option<&PredictionRecord> {
        self.state.pending_index().map(|i| &self.state.predictions[i])
    }

    pub fn bot_stats(&self) -> BotStats {
        self.state.bot_stats
    }

    pub fn stake_index(&self) -> usize {
        self.state.stake_index
    }

    pub fn stake_amount(&self) -> u32 {
        stake_amount(self.state.stake_index)
    }

    pub fn window_size(&self) -> usize {
        self.state.window_size
    }

    pub fn alternate_mode(&self) -> bool {
        self.state.alternate_mode
    }

    pub fn parse_and_accept(&mut self, input: &str) -> EngineResult<Option<PredictionRecord>> {
        let n = parse_outcome(input)?;
        self.accept_outcome(n)
    }

    /// Enregistre un nouveau tirage.
    ///
    /// L'ordre est imposé : la prédiction en attente est jugée sur l'état
    /// précédent, puis le tirage est ajouté et les statistiques, scores et
    /// stabilisateur recalculés, et enfin la nouvelle prédiction en attente est
    /// créée à partir de l'état recalculé. Retourne la prédiction résolue.
    pub fn accept_outcome(&mut self, n: i64) -> EngineResult<Option<PredictionRecord>> {
        if !is_valid_outcome(n) {
            return Err(EngineError::InvalidOutcome { input: n.to_string() });
        }
        let outcome = n as u8;

        let resolved = self.resolve_pending(outcome);

        self.state.previous.push(self.state.current.clone());
        self.state.log.push(outcome);
        let transition = self.recompute();
        tracing::debug!(outcome, %transition, "tirage enregistré");

        self.push_pending();
        self.persist();

        Ok(resolved)
    }

    fn resolve_pending(&mut self, outcome: u8) -> Option<PredictionRecord> {
        let index = self.state.pending_index()?;
        let actual = Dozen::from_outcome(outcome)?;
        let record = &mut self.state.predictions[index];

        let won = record.covers(actual);
        record.result = if won { PredictionResult::Win } else { PredictionResult::Loss };
        record.resolved_by = Some(outcome);

        if won {
            self.state.bot_stats.won += 1;
        } else {
            self.state.bot_stats.lost += 1;
        }
        let previous_index = self.state.stake_index;
        self.state.stake_index = next_stake_index(previous_index, won, record.score);

        tracing::debug!(
            id = record.id,
            predicted = %record.predicted,
            actual = %actual,
            won,
            stake_index = self.state.stake_index,
            "prédiction résolue"
        );
        Some(record.clone())
    }

    fn push_pending(&mut self) {
        let ranked = self.scores.ranked();
        let (predicted, alternate) = match self.state.current.current() {
            Some(current) => (current.primary, current.alternate),
            // pas encore de prédiction stabilisée : meilleur score brut
            None => (ranked[0].0, self.state.alternate_mode.then_some(ranked[1].0)),
        };

        let score = self.scores.get(predicted);
        let analyzed = self.stats.analyzed.max(1);
        let probability = self.stats.get(predicted).frequency as f64 / analyzed as f64 * 100.0;

        let record = PredictionRecord {
            id: self.state.next_prediction_id(),
            created_at: Utc::now(),
            predicted,
            alternate,
            method: METHOD_LABEL.to_string(),
            score,
            strength: Strength::from_score(score),
            probability,
            result: PredictionResult::Pending,
            resolved_by: None,
        };
        self.state.predictions.push(record);
    }

    fn refresh_scores(&mut self) {
        self.stats = compute_window_stats(&self.state.log, self.state.window_size);
        self.scores = compute_scores(&self.stats);
    }

    fn recompute(&mut self) -> Transition {
        self.refresh_scores();
        self.stabilizer.step(
            &mut self.state.current,
            &self.scores,
            self.state.log.len(),
            self.state.alternate_mode,
            &self.state.predictions,
        )
    }

    /// Retire le dernier tirage et la prédiction en attente créée après lui.
    /// Le stabilisateur revient à son état d'avant ce tirage, sans compter de tour.
    pub fn delete_last_outcome(&mut self) {
        let Some(removed) = self.state.log.pop() else {
            return;
        };
        if self.state.predictions.last().is_some_and(|p| p.is_pending()) {
            self.state.predictions.pop();
        }

        // pile absente (ancien blob) : la prédiction courante est conservée
        if let Some(previous) = self.state.previous.pop() {
            self.state.current = previous;
        }
        if self.state.log.len() < self.stabilizer.config().min_history {
            self.state.current = StabilizerState::NoPrediction;
        }
        self.refresh_scores();
        self.align_alternate();
        tracing::debug!(removed, remaining = self.state.log.len(), "dernier tirage supprimé");
        self.persist();
    }

    pub fn reset_all(&mut self) {
        let window_size = self.state.window_size;
        let alternate_mode = self.state.alternate_mode;
        self.state = EngineState {
            window_size,
            alternate_mode,
            ..EngineState::new(&self.config)
        };
        self.recompute();
        tracing::info!("moteur réinitialisé");
        self.persist();
    }

    pub fn set_window_size(&mut self, n: usize) -> EngineResult<()> {
        if !is_valid_window_size(n) {
            return Err(EngineError::InvalidWindowSize { value: n });
        }
        if n == self.state.window_size {
            return Ok(());
        }
        self.state.window_size = n;
        let transition = self.recompute();
        tracing::info!(window = n, %transition, "fenêtre d'analyse modifiée");
        self.persist();
        Ok(())
    }

    /// Active ou désactive la douzaine alternative. La prédiction courante est
    /// mise à jour sans compter de tour supplémentaire.
    pub fn set_alternate_mode(&mut self, enabled: bool) {
        self.state.alternate_mode = enabled;
        self.align_alternate();
        tracing::info!(enabled, "douzaine alternative");
        self.persist();
    }

    /// Met l'alternative de la prédiction courante en accord avec le mode :
    /// retirée si le mode est coupé, meilleure autre douzaine si elle manque.
    fn align_alternate(&mut self) {
        let enabled = self.state.alternate_mode;
        let ranked = self.scores.ranked();
        if let StabilizerState::Active(current) = &mut self.state.current {
            if !enabled {
                current.alternate = None;
            } else if current.alternate.is_none() {
                let primary = current.primary;
                current.alternate = ranked.iter().map(|(d, _)| *d).find(|d| *d != primary);
            }
        }
    }

    pub fn recommend_plenos(&self, dozen: Dozen, take: usize) -> Vec<u8> {
        recommend_plenos(&self.state.log, dozen, take)
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            log: self.state.log.clone(),
            stats: self.stats.clone(),
            scores: self.scores,
            current_prediction: self.state.current.clone(),
            prediction_history: self.state.predictions.clone(),
            bot_stats: self.state.bot_stats,
            stake_index: self.state.stake_index,
            stake_amount: self.stake_amount(),
            window_size: self.state.window_size,
            alternate_mode: self.state.alternate_mode,
        }
    }

    fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(e) = save_state(store.as_ref(), &self.config.storage_key, &self.state) {
            tracing::warn!(store = store.name(), error = %e, "sauvegarde impossible, état non persisté");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rouledict_db::store::MemoryStore;

    fn engine() -> PredictionEngine {
        PredictionEngine::new(EngineConfig::default())
    }

    fn feed(engine: &mut PredictionEngine, outcomes: &[i64]) {
        for &n in outcomes {
            engine.accept_outcome(n).unwrap();
        }
    }

    #[test]
    fn test_parse_outcome() {
        assert_eq!(parse_outcome(" 7 ").unwrap(), 7);
        assert_eq!(parse_outcome("12.0").unwrap(), 12);
        assert_eq!(parse_outcome("-3").unwrap(), -3);
        assert!(parse_outcome("7.5").is_err());
        assert!(parse_outcome("abc").is_err());
        assert!(parse_outcome("").is_err());
    }

    #[test]
    fn test_invalid_outcome_changes_nothing() {
        let mut engine = engine();
        feed(&mut engine, &[1, 2, 3]);
        let before = engine.snapshot();

        let err = engine.accept_outcome(37).unwrap_err();
        assert!(matches!(err, EngineError::InvalidOutcome { .. }));
        assert!(engine.accept_outcome(-1).is_err());
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn test_parse_and_accept_rejects_text() {
        let mut engine = engine();
        assert!(matches!(
            engine.parse_and_accept("douze"),
            Err(EngineError::InvalidOutcome { .. })
        ));
        assert!(engine.log().is_empty());
        engine.parse_and_accept("12").unwrap();
        assert_eq!(engine.log(), &[12]);
    }

    #[test]
    fn test_first_outcome_creates_pending_only() {
        let mut engine = engine();
        let resolved = engine.accept_outcome(5).unwrap();
        assert!(resolved.is_none());
        assert_eq!(engine.predictions().len(), 1);
        let pending = engine.pending_prediction().unwrap();
        // 1ère : fréquence 1, absence 0, les autres jamais vues -> score 0.6 contre 0.0
        assert_eq!(pending.predicted, Dozen::First);
        assert_eq!(pending.alternate, Some(Dozen::Second));
        assert!((pending.probability - 100.0).abs() < 1e-9);
        assert_eq!(engine.bot_stats(), BotStats::default());
    }

    #[test]
    fn test_pending_resolved_on_next_outcome() {
        let mut engine = engine();
        engine.accept_outcome(5).unwrap();
        let resolved = engine.accept_outcome(7).unwrap().unwrap();
        assert_eq!(resolved.result, PredictionResult::Win);
        assert_eq!(resolved.resolved_by, Some(7));
        assert_eq!(engine.bot_stats().won, 1);
        assert_eq!(engine.predictions().len(), 2);
        assert_eq!(engine.predictions()[0].result, PredictionResult::Win);
        assert!(engine.predictions()[1].is_pending());
    }

    #[test]
    fn test_alternate_counts_as_win() {
        let mut engine = engine();
        engine.accept_outcome(5).unwrap();
        // prédiction : 1ère + 2e
        let resolved = engine.accept_outcome(20).unwrap().unwrap();
        assert_eq!(resolved.result, PredictionResult::Win);
    }

    #[test]
    fn test_zero_is_a_loss() {
        let mut engine = engine();
        engine.accept_outcome(5).unwrap();
        let resolved = engine.accept_outcome(0).unwrap().unwrap();
        assert_eq!(resolved.result, PredictionResult::Loss);
        assert_eq!(engine.bot_stats().lost, 1);
    }

    #[test]
    fn test_single_pending_invariant() {
        let mut engine = engine();
        for n in [3, 15, 27, 0, 8, 8, 33, 21, 1, 36, 14, 14, 2] {
            engine.accept_outcome(n).unwrap();
            let pending = engine.predictions().iter().filter(|p| p.is_pending()).count();
            assert_eq!(pending, 1);
        }
        assert_eq!(engine.bot_stats().total() as usize, engine.log().len() - 1);
    }

    #[test]
    fn test_ten_ones_activates_first_dozen() {
        let mut engine = engine();
        for i in 0..10 {
            assert!(engine.current_prediction().is_none(), "prédiction trop tôt ({} tirages)", i);
            engine.accept_outcome(1).unwrap();
        }
        let current = engine.current_prediction().unwrap();
        assert_eq!(current.primary, Dozen::First);
        assert_eq!(current.rounds_held, 1);
        assert_eq!(engine.stats().get(Dozen::First).frequency, 10);
        assert_eq!(engine.stats().get(Dozen::First).streak, 10);
    }

    #[test]
    fn test_pending_uses_post_recompute_prediction() {
        let mut engine = engine();
        feed(&mut engine, &[1; 10]);
        let pending = engine.pending_prediction().unwrap();
        let current = engine.current_prediction().unwrap();
        assert_eq!(pending.predicted, current.primary);
        assert_eq!(pending.alternate, current.alternate);
        assert!((pending.score - engine.scores().get(current.primary)).abs() < 1e-12);
    }

    #[test]
    fn test_strong_loss_advances_stake() {
        let mut engine = engine();
        feed(&mut engine, &[1; 10]);
        // pending : 1ère (0.8, forte) + 2e -> la 3e la fait perdre
        assert_eq!(engine.pending_prediction().unwrap().strength, Strength::Strong);
        engine.accept_outcome(30).unwrap();
        assert_eq!(engine.stake_index(), 1);
        assert_eq!(engine.stake_amount(), 1);
    }

    #[test]
    fn test_win_resets_stake() {
        let mut engine = engine();
        feed(&mut engine, &[1; 10]);
        engine.accept_outcome(30).unwrap();
        assert_eq!(engine.stake_index(), 1);
        // nouvelle prédiction : 1ère reste en tête
        let pending = engine.pending_prediction().unwrap().clone();
        let winning = if pending.predicted == Dozen::First { 2 } else { 30 };
        engine.accept_outcome(winning).unwrap();
        assert_eq!(engine.stake_index(), 0);
    }

    #[test]
    fn test_delete_last_on_single_outcome() {
        let mut engine = engine();
        engine.accept_outcome(5).unwrap();
        assert_eq!(engine.predictions().len(), 1);
        engine.delete_last_outcome();
        assert!(engine.log().is_empty());
        assert!(engine.predictions().is_empty());
    }

    #[test]
    fn test_delete_on_empty_log_is_noop() {
        let mut engine = engine();
        engine.delete_last_outcome();
        assert!(engine.log().is_empty());
        assert_eq!(engine.snapshot().prediction_history.len(), 0);
    }

    #[test]
    fn test_delete_keeps_resolved_records() {
        let mut engine = engine();
        feed(&mut engine, &[5, 7]);
        engine.delete_last_outcome();
        assert_eq!(engine.log(), &[5]);
        assert_eq!(engine.predictions().len(), 1);
        assert_eq!(engine.predictions()[0].result, PredictionResult::Win);
        assert!(engine.pending_prediction().is_none());
        // le prochain tirage ne résout rien
        assert!(engine.accept_outcome(9).unwrap().is_none());
    }

    #[test]
    fn test_delete_below_min_history_clears_prediction() {
        let mut engine = engine();
        feed(&mut engine, &[1; 10]);
        assert!(engine.current_prediction().is_some());
        engine.delete_last_outcome();
        assert_eq!(engine.log().len(), 9);
        assert_eq!(*engine.stabilizer_state(), StabilizerState::NoPrediction);
    }

    #[test]
    fn test_delete_restores_stabilizer_state() {
        let mut engine = engine();
        feed(&mut engine, &[1; 10]);
        let before = engine.current_prediction().cloned();
        let scores = *engine.scores();

        engine.accept_outcome(2).unwrap();
        engine.delete_last_outcome();

        assert_eq!(engine.current_prediction().cloned(), before);
        assert_eq!(engine.current_prediction().unwrap().rounds_held, 1);
        assert_eq!(*engine.scores(), scores);
    }

    #[test]
    fn test_repeated_deletes_walk_back() {
        let mut engine = engine();
        feed(&mut engine, &[1; 10]);
        let entered = engine.current_prediction().cloned();
        feed(&mut engine, &[2, 3, 4]);
        assert_eq!(engine.current_prediction().unwrap().rounds_held, 4);

        for _ in 0..3 {
            engine.delete_last_outcome();
        }
        assert_eq!(engine.current_prediction().cloned(), entered);
    }

    #[test]
    fn test_delete_follows_alternate_mode() {
        let mut engine = engine();
        feed(&mut engine, &[1; 11]);
        engine.set_alternate_mode(false);
        engine.delete_last_outcome();
        assert_eq!(engine.current_prediction().unwrap().alternate, None);
    }

    #[test]
    fn test_delete_without_saved_states_keeps_prediction() {
        let mut engine = engine();
        feed(&mut engine, &[1; 12]);
        engine.state.previous.clear();
        let before = engine.current_prediction().cloned();
        engine.delete_last_outcome();
        assert_eq!(engine.current_prediction().cloned(), before);
    }

    #[test]
    fn test_reset_all() {
        let mut engine = engine();
        feed(&mut engine, &[1; 12]);
        engine.set_window_size(50).unwrap();
        engine.reset_all();
        let snap = engine.snapshot();
        assert!(snap.log.is_empty());
        assert!(snap.prediction_history.is_empty());
        assert_eq!(snap.bot_stats, BotStats::default());
        assert_eq!(snap.stake_index, 0);
        assert_eq!(snap.current_prediction, StabilizerState::NoPrediction);
        // préférences conservées
        assert_eq!(snap.window_size, 50);
    }

    #[test]
    fn test_set_window_size_validation() {
        let mut engine = engine();
        assert!(matches!(
            engine.set_window_size(15),
            Err(EngineError::InvalidWindowSize { value: 15 })
        ));
        assert!(engine.set_window_size(110).is_err());
        engine.set_window_size(10).unwrap();
        assert_eq!(engine.window_size(), 10);
    }

    #[test]
    fn test_window_size_changes_frequency() {
        let mut engine = engine();
        let mut outcomes = vec![30i64; 10];
        outcomes.extend([1i64; 10]);
        feed(&mut engine, &outcomes);
        assert_eq!(engine.stats().get(Dozen::Third).frequency, 10);
        engine.set_window_size(10).unwrap();
        assert_eq!(engine.stats().get(Dozen::Third).frequency, 0);
        assert_eq!(engine.stats().analyzed, 10);
    }

    #[test]
    fn test_set_alternate_mode() {
        let mut engine = engine();
        feed(&mut engine, &[1; 10]);
        assert_eq!(engine.current_prediction().unwrap().alternate, Some(Dozen::Second));
        engine.set_alternate_mode(false);
        assert_eq!(engine.current_prediction().unwrap().alternate, None);
        assert_eq!(engine.current_prediction().unwrap().rounds_held, 1);
        engine.accept_outcome(2).unwrap();
        assert_eq!(engine.pending_prediction().unwrap().alternate, None);
        engine.set_alternate_mode(true);
        assert_eq!(engine.current_prediction().unwrap().alternate, Some(Dozen::Second));
    }

    #[test]
    fn test_plenos_through_engine() {
        let mut engine = engine();
        feed(&mut engine, &[1, 2, 3]);
        assert_eq!(engine.recommend_plenos(Dozen::First, 3), vec![4, 5, 6]);
        assert_eq!(engine.recommend_plenos(Dozen::Zero, 3), vec![0]);
    }

    #[test]
    fn test_state_persisted_and_reloaded() {
        let store = MemoryStore::new();
        let config = EngineConfig::default();
        {
            let mut engine = PredictionEngine::with_store(config.clone(), Box::new(store.clone()));
            feed(&mut engine, &[1; 11]);
            engine.set_alternate_mode(false);
        }
        assert!(store.get(&config.storage_key).is_some());

        let engine = PredictionEngine::with_store(config, Box::new(store));
        assert_eq!(engine.log().len(), 11);
        assert!(!engine.alternate_mode());
        assert_eq!(engine.current_prediction().unwrap().primary, Dozen::First);
        assert_eq!(engine.predictions().len(), 11);
        assert!((engine.scores().get(Dozen::First) - 0.8).abs() < 1e-12);
    }
}
