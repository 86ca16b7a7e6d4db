use std::io::{self, Write};

use anyhow::{Context, Result};
use rouledict_db::models::Dozen;
use rouledict_engine::PredictionEngine;

use crate::display;

#[derive(Debug, PartialEq)]
enum InteractiveCommand {
    Add(Vec<String>),
    Undo,
    Reset,
    Window(Option<usize>),
    Alternate(Option<bool>),
    Status,
    History,
    Plenos(Option<Dozen>),
    Help,
    Quit,
}

fn parse_toggle(arg: &str) -> Option<bool> {
    match arg.to_lowercase().as_str() {
        "on" | "oui" | "o" | "1" => Some(true),
        "off" | "non" | "n" | "0" => Some(false),
        _ => None,
    }
}

fn parse_command(input: &str) -> Option<InteractiveCommand> {
    let input = input.trim();
    let mut words = input.split_whitespace();
    let head = words.next()?.to_lowercase();
    let args: Vec<&str> = words.collect();

    // une saisie qui commence par un chiffre est une suite de numéros
    if head.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
        return Some(InteractiveCommand::Add(
            input.split_whitespace().map(str::to_string).collect(),
        ));
    }

    match head.as_str() {
        "ajouter" | "add" | "a" if !args.is_empty() => Some(InteractiveCommand::Add(
            args.iter().map(|s| s.to_string()).collect(),
        )),
        "annuler" | "undo" | "u" | "suppr" if args.is_empty() => Some(InteractiveCommand::Undo),
        "reset" | "reinitialiser" | "réinitialiser" if args.is_empty() => {
            Some(InteractiveCommand::Reset)
        }
        "fenetre" | "fenêtre" | "window" | "w" => match args.as_slice() {
            [] => Some(InteractiveCommand::Window(None)),
            [n] => n.parse().ok().map(|n| InteractiveCommand::Window(Some(n))),
            _ => None,
        },
        "alt" | "alternance" | "alternate" => match args.as_slice() {
            [] => Some(InteractiveCommand::Alternate(None)),
            [mode] => parse_toggle(mode).map(|m| InteractiveCommand::Alternate(Some(m))),
            _ => None,
        },
        "etat" | "état" | "status" | "s" if args.is_empty() => Some(InteractiveCommand::Status),
        "historique" | "history" | "hist" if args.is_empty() => Some(InteractiveCommand::History),
        "plenos" | "p" => match args.as_slice() {
            [] => Some(InteractiveCommand::Plenos(None)),
            [d] => d.parse().ok().map(|d| InteractiveCommand::Plenos(Some(d))),
            _ => None,
        },
        "aide" | "help" | "h" | "?" if args.is_empty() => Some(InteractiveCommand::Help),
        "quitter" | "quit" | "q" | "exit" if args.is_empty() => Some(InteractiveCommand::Quit),
        _ => None,
    }
}

fn display_menu() {
    println!();
    println!("── Mode interactif ──");
    println!("  <numéros>       Enregistrer un ou plusieurs tirages (ex: 17 ou 4 22 0)");
    println!("  annuler         Supprimer le dernier numéro");
    println!("  reset           Tout réinitialiser");
    println!("  fenetre [n]     Taille de la fenêtre d'analyse (10-100)");
    println!("  alt [on|off]    Mode alternance (deux douzaines)");
    println!("  etat            Analyse et prédiction");
    println!("  historique      Historique des prédictions");
    println!("  plenos [d]      Numéros pleins d'une douzaine");
    println!("  aide            Afficher ce menu");
    println!("  quitter         Quitter");
    println!();
}

pub(crate) fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    let read = io::stdin()
        .read_line(&mut input)
        .context("Erreur de lecture")?;
    if read == 0 {
        anyhow::bail!("Fin de l'entrée");
    }
    Ok(input.trim().to_string())
}

fn prompt_with_default(msg: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}] : ", msg, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

fn cmd_add_interactive(engine: &mut PredictionEngine, inputs: &[String]) -> Result<()> {
    for raw in inputs {
        let resolved = engine
            .parse_and_accept(raw)
            .with_context(|| format!("Numéro '{}' refusé", raw))?;
        display::display_resolution(resolved.as_ref());
    }
    display::display_prediction(engine);
    Ok(())
}

fn cmd_undo_interactive(engine: &mut PredictionEngine) -> Result<()> {
    match engine.log().last().copied() {
        Some(n) => {
            engine.delete_last_outcome();
            println!("Numéro {} supprimé.", n);
            display::display_prediction(engine);
        }
        None => println!("Historique vide, rien à supprimer."),
    }
    Ok(())
}

fn cmd_reset_interactive(engine: &mut PredictionEngine) -> Result<()> {
    let confirm = prompt("Effacer tout l'historique et les statistiques ? (o/n) : ")?;
    if confirm.to_lowercase() == "o" {
        engine.reset_all();
        println!("Session réinitialisée.");
    } else {
        println!("Réinitialisation annulée.");
    }
    Ok(())
}

fn cmd_window_interactive(engine: &mut PredictionEngine, size: Option<usize>) -> Result<()> {
    let size = match size {
        Some(n) => n,
        None => prompt_with_default("Taille de la fenêtre", &engine.window_size().to_string())?
            .parse()
            .context("Taille invalide")?,
    };
    engine.set_window_size(size)?;
    display::display_analysis(engine);
    Ok(())
}

fn cmd_plenos_interactive(engine: &PredictionEngine, dozen: Option<Dozen>) -> Result<()> {
    let dozen = match dozen.or_else(|| engine.current_prediction().map(|p| p.primary)) {
        Some(d) => d,
        None => prompt("Douzaine (1, 2 ou 3) : ")?.parse()?,
    };
    display::display_plenos(dozen, &engine.recommend_plenos(dozen, 6));
    Ok(())
}

pub fn run_interactive(engine: &mut PredictionEngine) -> Result<()> {
    println!("Bienvenue dans le mode interactif de rouledict !");
    display_menu();
    display::display_prediction(engine);

    loop {
        let input = match prompt("> ") {
            Ok(s) => s,
            Err(_) => break, // EOF / Ctrl+D
        };

        if input.is_empty() {
            continue;
        }

        let outcome = match parse_command(&input) {
            Some(InteractiveCommand::Quit) => {
                println!("Au revoir !");
                break;
            }
            Some(InteractiveCommand::Add(inputs)) => cmd_add_interactive(engine, &inputs),
            Some(InteractiveCommand::Undo) => cmd_undo_interactive(engine),
            Some(InteractiveCommand::Reset) => cmd_reset_interactive(engine),
            Some(InteractiveCommand::Window(size)) => cmd_window_interactive(engine, size),
            Some(InteractiveCommand::Alternate(mode)) => {
                let enabled = mode.unwrap_or(!engine.alternate_mode());
                engine.set_alternate_mode(enabled);
                println!("Mode alternance : {}", if enabled { "activé" } else { "désactivé" });
                Ok(())
            }
            Some(InteractiveCommand::Status) => {
                display::display_status(engine);
                Ok(())
            }
            Some(InteractiveCommand::History) => {
                display::display_prediction_history(engine.predictions(), 20);
                Ok(())
            }
            Some(InteractiveCommand::Plenos(dozen)) => cmd_plenos_interactive(engine, dozen),
            Some(InteractiveCommand::Help) => {
                display_menu();
                Ok(())
            }
            None => {
                println!("Commande inconnue : '{}'. Tapez 'aide' pour la liste des commandes.", input);
                Ok(())
            }
        };

        if let Err(e) = outcome {
            println!("Erreur: {e:#}");
        }
    }

    Ok(())
}
