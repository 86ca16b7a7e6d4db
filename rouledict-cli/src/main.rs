mod display;
mod import;
mod interactive;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use rouledict_db::db::db_path;
use rouledict_db::models::Dozen;
use rouledict_db::store::{JsonFileStore, SqliteStore, StateStore};
use rouledict_engine::{EngineConfig, PredictionEngine};
use crate::display::{
    display_analysis, display_import_summary, display_log, display_plenos, display_prediction,
    display_prediction_history, display_resolution, display_status,
};

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
enum StoreKind {
    Sqlite,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

#[derive(Parser)]
#[command(name = "rouledict", about = "Prédicteur de douzaines pour la roulette")]
struct Cli {
    /// Chemin de la base SQLite (défaut : data/rouledict.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Stockage de la session (json : `<clé>.json` dans le répertoire de --db)
    #[arg(long, global = true, value_enum, default_value = "sqlite")]
    store: StoreKind,

    /// Fichier de configuration JSON
    #[arg(long, global = true, default_value = "rouledict.json")]
    config: PathBuf,

    /// Traces détaillées sur stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Enregistrer un ou plusieurs numéros sortis (0-36)
    Add {
        /// Numéros, du plus ancien au plus récent
        #[arg(required = true, allow_hyphen_values = true)]
        numbers: Vec<String>,
    },

    /// Supprimer le dernier numéro enregistré
    Undo,

    /// Effacer l'historique, les prédictions et les statistiques
    Reset {
        /// Ne pas demander de confirmation
        #[arg(long)]
        yes: bool,
    },

    /// Changer la taille de la fenêtre d'analyse (10-100, par pas de 10)
    Window {
        size: usize,
    },

    /// Activer ou désactiver le mode alternance
    Alt {
        mode: Toggle,
    },

    /// Afficher l'analyse, la prédiction et les statistiques du bot
    Status {
        /// Sortie JSON de l'état complet
        #[arg(long)]
        json: bool,
    },

    /// Afficher l'historique des prédictions
    History {
        /// Nombre de prédictions à afficher
        #[arg(short, long, default_value = "20")]
        last: usize,
    },

    /// Numéros pleins recommandés pour une douzaine
    Plenos {
        /// Douzaine (1, 2 ou 3)
        dozen: Dozen,

        /// Nombre de numéros
        #[arg(short, long, default_value = "6")]
        take: usize,
    },

    /// Rejouer un historique de numéros depuis un fichier CSV
    Import {
        /// Chemin vers le fichier CSV (un numéro par ligne)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Mode interactif
    Interactive,

    /// Afficher l'emplacement du stockage
    DbPath,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn json_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

fn store_location(kind: StoreKind, path: &Path, config: &EngineConfig) -> PathBuf {
    match kind {
        StoreKind::Sqlite => path.to_path_buf(),
        StoreKind::Json => json_dir(path).join(format!("{}.json", config.storage_key)),
    }
}

fn open_store(kind: StoreKind, path: &Path) -> Result<Box<dyn StateStore>> {
    let store: Box<dyn StateStore> = match kind {
        StoreKind::Sqlite => Box::new(SqliteStore::open(path)?),
        StoreKind::Json => Box::new(JsonFileStore::new(json_dir(path))),
    };
    Ok(store)
}

fn open_engine(config: EngineConfig, kind: StoreKind, path: &Path) -> PredictionEngine {
    match open_store(kind, path) {
        Ok(store) => PredictionEngine::with_store(config, store),
        Err(e) => {
            tracing::warn!(path = %path.display(), "base indisponible, session non persistée : {e:#}");
            PredictionEngine::new(config)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let path = cli.db.unwrap_or_else(db_path);
    let config = EngineConfig::load_or_default(&cli.config)?;
    if let Command::DbPath = cli.command {
        println!("{}", store_location(cli.store, &path, &config).display());
        return Ok(());
    }

    let mut engine = open_engine(config, cli.store, &path);

    match cli.command {
        Command::Add { numbers } => cmd_add(&mut engine, &numbers),
        Command::Undo => cmd_undo(&mut engine),
        Command::Reset { yes } => cmd_reset(&mut engine, yes),
        Command::Window { size } => cmd_window(&mut engine, size),
        Command::Alt { mode } => cmd_alt(&mut engine, mode),
        Command::Status { json } => cmd_status(&engine, json),
        Command::History { last } => cmd_history(&engine, last),
        Command::Plenos { dozen, take } => cmd_plenos(&engine, dozen, take),
        Command::Import { file } => cmd_import(&mut engine, &file),
        Command::Interactive => interactive::run_interactive(&mut engine),
        Command::DbPath => Ok(()),
    }
}

fn cmd_add(engine: &mut PredictionEngine, numbers: &[String]) -> Result<()> {
    for raw in numbers {
        let resolved = engine
            .parse_and_accept(raw)
            .with_context(|| format!("Numéro '{}' refusé", raw))?;
        display_resolution(resolved.as_ref());
    }
    display_prediction(engine);
    Ok(())
}

fn cmd_undo(engine: &mut PredictionEngine) -> Result<()> {
    let Some(&last) = engine.log().last() else {
        println!("Historique vide, rien à supprimer.");
        return Ok(());
    };
    engine.delete_last_outcome();
    println!("Numéro {} supprimé.", last);
    display_log(engine.log(), 15);
    display_prediction(engine);
    Ok(())
}

fn cmd_reset(engine: &mut PredictionEngine, yes: bool) -> Result<()> {
    if !yes {
        let confirm = interactive::prompt("Effacer tout l'historique et les statistiques ? (o/n) : ")?;
        if confirm.to_lowercase() != "o" {
            println!("Réinitialisation annulée.");
            return Ok(());
        }
    }
    engine.reset_all();
    println!("Session réinitialisée.");
    Ok(())
}

fn cmd_window(engine: &mut PredictionEngine, size: usize) -> Result<()> {
    engine.set_window_size(size)?;
    display_analysis(engine);
    display_prediction(engine);
    Ok(())
}

fn cmd_alt(engine: &mut PredictionEngine, mode: Toggle) -> Result<()> {
    let enabled = matches!(mode, Toggle::On);
    engine.set_alternate_mode(enabled);
    println!("Mode alternance : {}", if enabled { "activé" } else { "désactivé" });
    display_prediction(engine);
    Ok(())
}

fn cmd_status(engine: &PredictionEngine, json: bool) -> Result<()> {
    if json {
        let output = serde_json::to_string_pretty(&engine.snapshot())
            .context("Échec de la sérialisation de l'état")?;
        println!("{}", output);
    } else {
        display_status(engine);
    }
    Ok(())
}

fn cmd_history(engine: &PredictionEngine, last: usize) -> Result<()> {
    display_prediction_history(engine.predictions(), last);
    Ok(())
}

fn cmd_plenos(engine: &PredictionEngine, dozen: Dozen, take: usize) -> Result<()> {
    display_plenos(dozen, &engine.recommend_plenos(dozen, take));
    Ok(())
}

fn cmd_import(engine: &mut PredictionEngine, file: &Path) -> Result<()> {
    let result = import::import_csv(engine, file)?;
    display_import_summary(&result);
    display_prediction(engine);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_flag_parsing() {
        let cli = Cli::try_parse_from(["rouledict", "status", "--store", "json"]).unwrap();
        assert_eq!(cli.store, StoreKind::Json);
        let cli = Cli::try_parse_from(["rouledict", "status"]).unwrap();
        assert_eq!(cli.store, StoreKind::Sqlite);
        assert!(Cli::try_parse_from(["rouledict", "--store", "csv", "status"]).is_err());
    }

    #[test]
    fn test_store_location() {
        let config = EngineConfig::default();
        let path = Path::new("data/rouledict.db");
        assert_eq!(store_location(StoreKind::Sqlite, path, &config), PathBuf::from("data/rouledict.db"));
        assert_eq!(
            store_location(StoreKind::Json, path, &config),
            PathBuf::from("data/rouledict_state_v2_1.json")
        );
    }

    #[test]
    fn test_json_store_keeps_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rouledict.db");
        let config = EngineConfig::default();
        {
            let mut engine = open_engine(config.clone(), StoreKind::Json, &path);
            for n in [3, 14, 0] {
                engine.accept_outcome(n).unwrap();
            }
        }
        assert!(store_location(StoreKind::Json, &path, &config).exists());
        assert!(!path.exists());

        let engine = open_engine(config, StoreKind::Json, &path);
        assert_eq!(engine.log(), &[3, 14, 0]);
    }
}
