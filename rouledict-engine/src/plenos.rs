use rouledict_db::models::Dozen;

/// Classe les numéros de `dozen` du plus en retard au plus récent.
///
/// Un numéro jamais sorti est considéré comme infiniment en retard. À retard égal,
/// le plus petit numéro passe en premier.
pub fn recommend_plenos(log: &[u8], dozen: Dozen, take: usize) -> Vec<u8> {
    if dozen == Dozen::Zero {
        return vec![0];
    }

    let mut ranked: Vec<(u8, Option<usize>)> = dozen
        .numbers()
        .map(|n| (n, log.iter().rev().position(|&x| x == n)))
        .collect();

    // None (jamais vu) doit passer devant tout retard connu
    ranked.sort_by(|a, b| {
        let gap_a = a.1.unwrap_or(usize::MAX);
        let gap_b = b.1.unwrap_or(usize::MAX);
        gap_b.cmp(&gap_a).then(a.0.cmp(&b.0))
    });

    ranked.into_iter().take(take).map(|(n, _)| n).collect()
}
