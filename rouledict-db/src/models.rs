use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Plus grand numéro de la roulette (européenne, un seul zéro).
pub const MAX_OUTCOME: u8 = 36;

/// Progression de mise utilisée après les pertes.
pub const FIBONACCI: [u32; 8] = [1, 1, 2, 3, 5, 8, 13, 21];

pub const METHOD_LABEL: &str = "hybrid-analytic v2.1";

pub fn is_valid_outcome(n: i64) -> bool {
    (0..=MAX_OUTCOME as i64).contains(&n)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dozen {
    Zero,
    First,
    Second,
    Third,
}

impl Dozen {
    pub const ALL: [Dozen; 4] = [Dozen::Zero, Dozen::First, Dozen::Second, Dozen::Third];

    /// Douzaines en compétition pour la recommandation (le zéro n'est jamais scoré).
    pub const SCORED: [Dozen; 3] = [Dozen::First, Dozen::Second, Dozen::Third];

    pub fn from_outcome(n: u8) -> Option<Dozen> {
        match n {
            0 => Some(Dozen::Zero),
            1..=12 => Some(Dozen::First),
            13..=24 => Some(Dozen::Second),
            25..=36 => Some(Dozen::Third),
            _ => None,
        }
    }

    pub fn numbers(&self) -> std::ops::RangeInclusive<u8> {
        match self {
            Dozen::Zero => 0..=0,
            Dozen::First => 1..=12,
            Dozen::Second => 13..=24,
            Dozen::Third => 25..=36,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Dozen::Zero => 0,
            Dozen::First => 1,
            Dozen::Second => 2,
            Dozen::Third => 3,
        }
    }

    pub fn range_label(&self) -> &'static str {
        match self {
            Dozen::Zero => "0",
            Dozen::First => "1–12",
            Dozen::Second => "13–24",
            Dozen::Third => "25–36",
        }
    }
}

impl std::fmt::Display for Dozen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dozen::Zero => write!(f, "Zéro (0)"),
            Dozen::First => write!(f, "1ère"),
            Dozen::Second => write!(f, "2e"),
            Dozen::Third => write!(f, "3e"),
        }
    }
}

impl std::str::FromStr for Dozen {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "0" | "zero" | "zéro" => Ok(Dozen::Zero),
            "1" | "d1" | "first" => Ok(Dozen::First),
            "2" | "d2" | "second" => Ok(Dozen::Second),
            "3" | "d3" | "third" => Ok(Dozen::Third),
            other => anyhow::bail!("Douzaine inconnue : '{}' (attendu 0, 1, 2 ou 3)", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strength {
    Strong,
    Moderate,
    Weak,
}

impl Strength {
    pub fn from_score(score: f64) -> Strength {
        if score > 0.65 {
            Strength::Strong
        } else if score > 0.45 {
            Strength::Moderate
        } else {
            Strength::Weak
        }
    }
}

impl std::fmt::Display for Strength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strength::Strong => write!(f, "Forte"),
            Strength::Moderate => write!(f, "Modérée"),
            Strength::Weak => write!(f, "Faible"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionResult {
    Pending,
    Win,
    Loss,
}

impl PredictionResult {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, PredictionResult::Pending)
    }
}

impl std::fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictionResult::Pending => write!(f, "⏳"),
            PredictionResult::Win => write!(f, "✅"),
            PredictionResult::Loss => write!(f, "❌"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    pub predicted: Dozen,
    pub alternate: Option<Dozen>,
    pub method: String,
    pub score: f64,
    pub strength: Strength,
    /// Fréquence observée de la douzaine prédite dans la fenêtre, en pourcentage.
    pub probability: f64,
    pub result: PredictionResult,
    pub resolved_by: Option<u8>,
}

impl PredictionRecord {
    pub fn is_pending(&self) -> bool {
        self.result == PredictionResult::Pending
    }

    pub fn covers(&self, dozen: Dozen) -> bool {
        self.predicted == dozen || self.alternate == Some(dozen)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotStats {
    pub won: u32,
    pub lost: u32,
}

impl BotStats {
    pub fn total(&self) -> u32 {
        self.won + self.lost
    }

    /// Taux de réussite en pourcentage, arrondi au dixième.
    pub fn effectiveness(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.won as f64 / total as f64 * 1000.0).round() / 10.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentPrediction {
    pub primary: Dozen,
    pub alternate: Option<Dozen>,
    pub score: f64,
    pub rounds_held: u32,
}

impl CurrentPrediction {
    pub fn strength(&self) -> Strength {
        Strength::from_score(self.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dozen_from_outcome() {
        assert_eq!(Dozen::from_outcome(0), Some(Dozen::Zero));
        assert_eq!(Dozen::from_outcome(1), Some(Dozen::First));
        assert_eq!(Dozen::from_outcome(12), Some(Dozen::First));
        assert_eq!(Dozen::from_outcome(13), Some(Dozen::Second));
        assert_eq!(Dozen::from_outcome(24), Some(Dozen::Second));
        assert_eq!(Dozen::from_outcome(25), Some(Dozen::Third));
        assert_eq!(Dozen::from_outcome(36), Some(Dozen::Third));
        assert_eq!(Dozen::from_outcome(37), None);
    }

    #[test]
    fn test_dozen_numbers_match_mapping() {
        for dozen in Dozen::ALL {
            for n in dozen.numbers() {
                assert_eq!(Dozen::from_outcome(n), Some(dozen));
            }
        }
    }

    #[test]
    fn test_valid_outcome_bounds() {
        assert!(is_valid_outcome(0));
        assert!(is_valid_outcome(36));
        assert!(!is_valid_outcome(-1));
        assert!(!is_valid_outcome(37));
    }

    #[test]
    fn test_dozen_parse() {
        assert_eq!("1".parse::<Dozen>().unwrap(), Dozen::First);
        assert_eq!("D3".parse::<Dozen>().unwrap(), Dozen::Third);
        assert_eq!("zéro".parse::<Dozen>().unwrap(), Dozen::Zero);
        assert!("4".parse::<Dozen>().is_err());
    }

    #[test]
    fn test_strength_thresholds() {
        assert_eq!(Strength::from_score(0.66), Strength::Strong);
        assert_eq!(Strength::from_score(0.65), Strength::Moderate);
        assert_eq!(Strength::from_score(0.46), Strength::Moderate);
        assert_eq!(Strength::from_score(0.45), Strength::Weak);
        assert_eq!(Strength::from_score(0.0), Strength::Weak);
    }

    #[test]
    fn test_effectiveness() {
        assert_eq!(BotStats::default().effectiveness(), 0.0);
        let stats = BotStats { won: 2, lost: 1 };
        assert!((stats.effectiveness() - 66.7).abs() < 1e-9);
    }

    #[test]
    fn test_record_covers_alternate() {
        let record = PredictionRecord {
            id: 1,
            created_at: Utc::now(),
            predicted: Dozen::First,
            alternate: Some(Dozen::Third),
            method: METHOD_LABEL.to_string(),
            score: 0.5,
            strength: Strength::Moderate,
            probability: 40.0,
            result: PredictionResult::Pending,
            resolved_by: None,
        };
        assert!(record.covers(Dozen::First));
        assert!(record.covers(Dozen::Third));
        assert!(!record.covers(Dozen::Second));
        assert!(!record.covers(Dozen::Zero));
    }
}
