use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL, Cell, Color};

use crate::import::ImportResult;
use rouledict_db::models::{Dozen, PredictionRecord, PredictionResult};
use rouledict_engine::PredictionEngine;
use rouledict_engine::stake::MAX_STAKE_INDEX;

fn dozen_color(dozen: Dozen) -> Color {
    match dozen {
        Dozen::Zero => Color::Green,
        Dozen::First => Color::Cyan,
        Dozen::Second => Color::Yellow,
        Dozen::Third => Color::Magenta,
    }
}

fn dozen_pair(predicted: Dozen, alternate: Option<Dozen>) -> String {
    match alternate {
        Some(alt) => format!("{} + {}", predicted, alt),
        None => predicted.to_string(),
    }
}

fn pills(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" · ")
}

pub fn display_analysis(engine: &PredictionEngine) {
    let stats = engine.stats();
    let scores = engine.scores();
    let primary = engine.current_prediction().map(|p| p.primary);

    println!(
        "\n📊 Analyse des {} derniers tirages (fenêtre {})\n",
        stats.analyzed, stats.window
    );

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Douzaine", "Plage", "Fréquence", "Absence", "Série", "Score", ""]);

    for dozen in Dozen::SCORED {
        let s = stats.get(dozen);
        let score = scores.get(dozen);
        let label = if primary == Some(dozen) {
            Cell::new(format!("▶ {}", dozen)).fg(Color::Green)
        } else {
            Cell::new(dozen.to_string())
        };
        let dash = |v: u32| if v == 0 { "—".to_string() } else { v.to_string() };
        table.add_row(vec![
            label,
            Cell::new(dozen.range_label()),
            Cell::new(dash(s.frequency)),
            Cell::new(s.absence.map_or("—".to_string(), |gap| gap.to_string())),
            Cell::new(dash(s.streak)),
            Cell::new(format!("{:.3}", score)),
            Cell::new("█".repeat((score * 30.0).round() as usize)).fg(dozen_color(dozen)),
        ]);
    }
    println!("{table}");
}

pub fn display_prediction(engine: &PredictionEngine) {
    println!("\n🎯 Prédiction actuelle\n");

    let Some(current) = engine.current_prediction() else {
        println!(
            "  En attente d'au moins {} tirages pour prédire ({} enregistrés)...",
            engine.config().stabilizer.min_history,
            engine.log().len()
        );
        return;
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let last_result = engine
        .predictions()
        .iter()
        .rev()
        .find(|p| p.result.is_resolved())
        .map(|p| p.result);
    let color = match last_result {
        Some(PredictionResult::Win) => Color::Green,
        Some(PredictionResult::Loss) => Color::Red,
        _ => Color::White,
    };

    table.add_row(vec![
        Cell::new("Douzaine"),
        Cell::new(dozen_pair(current.primary, current.alternate)).fg(color),
    ]);
    table.add_row(vec!["Score".to_string(), format!("{:.1} %", current.score * 100.0)]);
    table.add_row(vec!["Force".to_string(), current.strength().to_string()]);
    table.add_row(vec!["Tours retenus".to_string(), current.rounds_held.to_string()]);
    table.add_row(vec![
        "Plenos".to_string(),
        pills(&engine.recommend_plenos(current.primary, 6)),
    ]);
    if let Some(alt) = current.alternate {
        table.add_row(vec![
            "Plenos alt.".to_string(),
            pills(&engine.recommend_plenos(alt, 4)),
        ]);
    }
    println!("{table}");
}

pub fn display_bot_stats(engine: &PredictionEngine) {
    let stats = engine.bot_stats();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Gagnées", "Perdues", "Efficacité", "Tour Fibo", "Mise"]);

    table.add_row(vec![
        Cell::new(stats.won).fg(Color::Green),
        Cell::new(stats.lost).fg(Color::Red),
        Cell::new(format!("{:.1} %", stats.effectiveness())),
        Cell::new(format!("{}/{}", engine.stake_index() + 1, MAX_STAKE_INDEX + 1)),
        Cell::new(engine.stake_amount()),
    ]);
    println!("{table}");
}

pub fn display_log(log: &[u8], last: usize) {
    println!("\n── Historique des numéros (le plus récent à gauche) ──");
    if log.is_empty() {
        println!("  Aucun numéro pour l'instant.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let cells: Vec<Cell> = log
        .iter()
        .rev()
        .take(last)
        .map(|&n| {
            let cell = Cell::new(format!("{:2}", n));
            match Dozen::from_outcome(n) {
                Some(d) => cell.fg(dozen_color(d)),
                None => cell,
            }
        })
        .collect();
    for row in cells.chunks(15) {
        table.add_row(row.to_vec());
    }
    println!("{table}");
}

pub fn display_prediction_history(records: &[PredictionRecord], last: usize) {
    println!("\n── Historique des prédictions ──");
    if records.is_empty() {
        println!("  Aucune prédiction.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Heure", "Prédiction", "Méthode", "Force", "Score", "Prob.", "Numéro", "Résultat"]);

    for record in records.iter().rev().take(last) {
        let color = match record.result {
            PredictionResult::Win => Color::Green,
            PredictionResult::Loss => Color::Red,
            PredictionResult::Pending => Color::White,
        };
        table.add_row(vec![
            Cell::new(record.id),
            Cell::new(record.created_at.format("%H:%M:%S")),
            Cell::new(dozen_pair(record.predicted, record.alternate)),
            Cell::new(&record.method),
            Cell::new(record.strength),
            Cell::new(format!("{:.1} %", record.score * 100.0)),
            Cell::new(format!("{:.1} %", record.probability)),
            Cell::new(record.resolved_by.map_or("—".to_string(), |n| n.to_string())),
            Cell::new(record.result).fg(color),
        ]);
    }
    println!("{table}");
}

pub fn display_resolution(resolved: Option<&PredictionRecord>) {
    let Some(record) = resolved else {
        return;
    };
    let verdict = match record.result {
        PredictionResult::Win => "gagnée",
        PredictionResult::Loss => "perdue",
        PredictionResult::Pending => "en attente",
    };
    println!(
        "{} Prédiction #{} ({}) {} sur le {}",
        record.result,
        record.id,
        dozen_pair(record.predicted, record.alternate),
        verdict,
        record.resolved_by.map_or("—".to_string(), |n| n.to_string()),
    );
}

pub fn display_plenos(dozen: Dozen, plenos: &[u8]) {
    println!("Plenos {} ({}) : {}", dozen, dozen.range_label(), pills(plenos));
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Acceptés          : {}", result.accepted);
    if result.rejected > 0 {
        println!("  Rejetés           : {}", result.rejected);
    }
}

pub fn display_status(engine: &PredictionEngine) {
    display_analysis(engine);
    display_prediction(engine);
    display_bot_stats(engine);
    display_log(engine.log(), 30);
}
