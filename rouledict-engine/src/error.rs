/// Erreurs du moteur de prédiction.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("numéro invalide : '{input}' (attendu un entier entre 0 et 36)")]
    InvalidOutcome { input: String },

    #[error("fenêtre invalide : {value} (attendu 10 à 100 par pas de 10)")]
    InvalidWindowSize { value: usize },

    #[error("échec du chargement de '{key}' : {reason}")]
    PersistenceLoad { key: String, reason: String },

    #[error("échec de la sauvegarde de '{key}' : {reason}")]
    PersistenceSave { key: String, reason: String },
}

pub type EngineResult<T> = Result<T, EngineError>;
