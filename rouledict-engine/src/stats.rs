use serde::{Deserialize, Serialize};

use rouledict_db::models::Dozen;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DozenStats {
    pub dozen: Dozen,
    /// Occurrences dans les N derniers tirages.
    pub frequency: u32,
    /// Tirages écoulés depuis la dernière apparition (historique complet), `None` si jamais vue.
    pub absence: Option<u32>,
    /// Apparitions consécutives en fin d'historique.
    pub streak: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    pub window: usize,
    /// min(fenêtre, taille de l'historique)
    pub analyzed: usize,
    pub dozens: [DozenStats; 4],
}

impl WindowStats {
    pub fn get(&self, dozen: Dozen) -> &DozenStats {
        &self.dozens[dozen.index()]
    }

    pub fn total_frequency(&self) -> u32 {
        self.dozens.iter().map(|d| d.frequency).sum()
    }
}

/// `log` est chronologique : le dernier élément est le tirage le plus récent.
pub fn compute_window_stats(log: &[u8], window: usize) -> WindowStats {
    let start = log.len().saturating_sub(window);
    let recent = &log[start..];

    let dozens = Dozen::ALL.map(|dozen| DozenStats {
        dozen,
        frequency: frequency(recent, dozen),
        absence: absence(log, dozen),
        streak: streak(log, dozen),
    });

    WindowStats {
        window,
        analyzed: recent.len(),
        dozens,
    }
}

fn frequency(recent: &[u8], dozen: Dozen) -> u32 {
    recent
        .iter()
        .filter(|&&n| Dozen::from_outcome(n) == Some(dozen))
        .count() as u32
}

fn absence(log: &[u8], dozen: Dozen) -> Option<u32> {
    log.iter()
        .rev()
        .position(|&n| Dozen::from_outcome(n) == Some(dozen))
        .map(|gap| gap as u32)
}

fn streak(log: &[u8], dozen: Dozen) -> u32 {
    log.iter()
        .rev()
        .take_while(|&&n| Dozen::from_outcome(n) == Some(dozen))
        .count() as u32
}
