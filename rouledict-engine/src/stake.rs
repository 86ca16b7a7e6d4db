use rouledict_db::models::{FIBONACCI, Strength};

pub const MAX_STAKE_INDEX: usize = FIBONACCI.len() - 1;

/// Index de mise après résolution d'une prédiction de score `score`.
///
/// Une victoire remet l'index à zéro. Seules les pertes sur une prédiction forte
/// avancent la progression ; les pertes modérées ou faibles la laissent en place.
pub fn next_stake_index(index: usize, won: bool, score: f64) -> usize {
    if won {
        return 0;
    }
    match Strength::from_score(score) {
        Strength::Strong => (index + 1).min(MAX_STAKE_INDEX),
        // TODO: confirmer avec le produit si les pertes modérées doivent aussi avancer
        Strength::Moderate | Strength::Weak => index,
    }
}

pub fn stake_amount(index: usize) -> u32 {
    FIBONACCI[index.min(MAX_STAKE_INDEX)]
}
