use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Read;
use std::path::Path;

use rouledict_engine::PredictionEngine;

pub struct ImportResult {
    pub total_records: u32,
    pub accepted: u32,
    pub rejected: u32,
}

fn parse_record(record: &csv::StringRecord) -> Result<String> {
    record
        .get(0)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .context("Champ numéro manquant")
}

/// Rejoue un fichier CSV (un numéro par ligne, premier champ) dans le moteur.
pub fn import_csv(engine: &mut PredictionEngine, path: &Path) -> Result<ImportResult> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;
    import_from_reader(engine, file)
}

pub fn import_from_reader<R: Read>(engine: &mut PredictionEngine, source: R) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(source);

    let records: Vec<_> = reader.records().collect();

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/blue} {pos}/{len} tirages")?
            .progress_chars("█▓░"),
    );

    let mut result = ImportResult {
        total_records: 0,
        accepted: 0,
        rejected: 0,
    };

    for record_result in records {
        result.total_records += 1;
        let line = result.total_records;
        let outcome = record_result
            .context("Erreur de lecture")
            .and_then(|record| parse_record(&record));
        match outcome {
            Ok(raw) => match engine.parse_and_accept(&raw) {
                Ok(_) => result.accepted += 1,
                Err(e) => {
                    pb.suspend(|| eprintln!("Ligne {} ignorée : {}", line, e));
                    result.rejected += 1;
                }
            },
            Err(e) => {
                pb.suspend(|| eprintln!("Ligne {} ignorée : {:#}", line, e));
                result.rejected += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    tracing::info!(
        accepted = result.accepted,
        rejected = result.rejected,
        "import terminé"
    );
    Ok(result)
}
