use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const WINDOW_SIZE_MIN: usize = 10;
pub const WINDOW_SIZE_MAX: usize = 100;
pub const WINDOW_SIZE_STEP: usize = 10;

pub fn is_valid_window_size(n: usize) -> bool {
    (WINDOW_SIZE_MIN..=WINDOW_SIZE_MAX).contains(&n) && n % WINDOW_SIZE_STEP == 0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizerConfig {
    /// Nombre de tirages requis avant la première prédiction.
    pub min_history: usize,
    /// Un challenger remplace immédiatement la prédiction s'il la dépasse de ce facteur.
    pub switch_ratio: f64,
    /// Après deux victoires, on garde la prédiction tant que le challenger reste sous ce facteur.
    pub hold_ratio: f64,
    pub min_rounds_held: u32,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            min_history: 10,
            switch_ratio: 1.2,
            hold_ratio: 1.1,
            min_rounds_held: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub default_window_size: usize,
    pub default_alternate_mode: bool,
    pub storage_key: String,
    pub stabilizer: StabilizerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_window_size: 30,
            default_alternate_mode: true,
            storage_key: "rouledict_state_v2_1".to_string(),
            stabilizer: StabilizerConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Impossible de lire la configuration {:?}", path))?;
        let config: EngineConfig = serde_json::from_str(&json)
            .with_context(|| format!("Configuration invalide {:?}", path))?;
        if !is_valid_window_size(config.default_window_size) {
            anyhow::bail!(
                "Fenêtre par défaut invalide : {} (attendu {}-{} par pas de {})",
                config.default_window_size, WINDOW_SIZE_MIN, WINDOW_SIZE_MAX, WINDOW_SIZE_STEP
            );
        }
        Ok(config)
    }

    /// Charge `path` s'il existe, sinon la configuration par défaut.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.default_window_size, 30);
        assert!(config.default_alternate_mode);
        assert_eq!(config.stabilizer.min_history, 10);
        assert!((config.stabilizer.switch_ratio - 1.2).abs() < 1e-12);
        assert!((config.stabilizer.hold_ratio - 1.1).abs() < 1e-12);
        assert_eq!(config.stabilizer.min_rounds_held, 3);
    }

    #[test]
    fn test_window_size_validation() {
        assert!(is_valid_window_size(10));
        assert!(is_valid_window_size(100));
        assert!(is_valid_window_size(50));
        assert!(!is_valid_window_size(0));
        assert!(!is_valid_window_size(15));
        assert!(!is_valid_window_size(110));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"default_window_size": 50}"#).unwrap();
        assert_eq!(config.default_window_size, 50);
        assert_eq!(config.storage_key, "rouledict_state_v2_1");
        assert_eq!(config.stabilizer, StabilizerConfig::default());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = EngineConfig::load_or_default(Path::new("/nonexistent/rouledict.json")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
