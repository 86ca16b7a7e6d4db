use serde::{Deserialize, Serialize};

use rouledict_db::models::Dozen;
use crate::stats::{DozenStats, WindowStats};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub frequency: f64,
    pub absence: f64,
}

impl Weights {
    pub const fn new(frequency: f64, absence: f64) -> Self {
        Self { frequency, absence }
    }

    pub fn normalized(self) -> Self {
        let total = self.frequency + self.absence;
        if total > 0.0 {
            Self::new(self.frequency / total, self.absence / total)
        } else {
            self
        }
    }
}

pub const BASE_WEIGHTS: Weights = Weights::new(0.6, 0.4);

/// Surcharge des poids de base. Les règles sont évaluées dans l'ordre et la
/// dernière qui s'applique l'emporte.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightRule {
    /// Série en cours : la fréquence domine.
    HotStreak { min_streak: u32, weights: Weights },
    /// Absence prolongée : le retard domine.
    LongAbsence { min_absence: u32, weights: Weights },
}

impl WeightRule {
    pub fn applies(&self, stats: &DozenStats) -> bool {
        match *self {
            WeightRule::HotStreak { min_streak, .. } => stats.streak >= min_streak,
            WeightRule::LongAbsence { min_absence, .. } => {
                stats.absence.is_some_and(|gap| gap >= min_absence)
            }
        }
    }

    pub fn weights(&self) -> Weights {
        match *self {
            WeightRule::HotStreak { weights, .. } | WeightRule::LongAbsence { weights, .. } => weights,
        }
    }
}

pub const WEIGHT_RULES: [WeightRule; 2] = [
    WeightRule::HotStreak { min_streak: 2, weights: Weights::new(0.8, 0.2) },
    WeightRule::LongAbsence { min_absence: 5, weights: Weights::new(0.3, 0.7) },
];

pub fn select_weights(stats: &DozenStats, rules: &[WeightRule]) -> Weights {
    rules
        .iter()
        .fold(BASE_WEIGHTS, |current, rule| {
            if rule.applies(stats) { rule.weights() } else { current }
        })
        .normalized()
}

/// Scores des trois douzaines jouables, dans l'ordre 1ère, 2e, 3e.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    values: [f64; 3],
}

impl Scores {
    pub fn new(first: f64, second: f64, third: f64) -> Self {
        Self { values: [first, second, third] }
    }

    /// Le zéro n'est jamais scoré.
    pub fn get(&self, dozen: Dozen) -> f64 {
        match dozen {
            Dozen::Zero => 0.0,
            other => self.values[other.index() - 1],
        }
    }

    pub fn entries(&self) -> [(Dozen, f64); 3] {
        Dozen::SCORED.map(|d| (d, self.get(d)))
    }

    /// Tri décroissant stable : à score égal, l'ordre 1ère, 2e, 3e est conservé.
    pub fn ranked(&self) -> [(Dozen, f64); 3] {
        let mut entries = self.entries();
        entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        entries
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

pub fn compute_scores(stats: &WindowStats) -> Scores {
    compute_scores_with_rules(stats, &WEIGHT_RULES)
}

pub fn compute_scores_with_rules(stats: &WindowStats, rules: &[WeightRule]) -> Scores {
    let total_analyzed = stats.analyzed.max(1);

    // fenêtre vide : scores nuls
    if total_analyzed == 0 {
        return Scores::default();
    }

    let max_absence = Dozen::SCORED
        .iter()
        .filter_map(|&d| stats.get(d).absence)
        .max()
        .unwrap_or(0);

    let score_of = |dozen: Dozen| -> f64 {
        let s = stats.get(dozen);
        let freq_norm = s.frequency as f64 / total_analyzed as f64;
        let absence_norm = if max_absence > 0 {
            match s.absence {
                Some(gap) => gap as f64 / max_absence as f64,
                None => 1.0,
            }
        } else {
            0.0
        };
        let w = select_weights(s, rules);
        round3(freq_norm * w.frequency + absence_norm * w.absence)
    };

    Scores::new(
        score_of(Dozen::First),
        score_of(Dozen::Second),
        score_of(Dozen::Third),
    )
}
