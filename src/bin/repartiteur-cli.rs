#![forbid(unsafe_code)]
use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser, Subcommand};
use repartiteur::{
    conflicts::detecter_conflits_planning,
    io,
    model::{SourceId, Traducteur},
    repartition::{AllocationPlan, TranslatorProfile},
    storage::{JsonStorage, Storage},
    suggestions::{Changement, SuggestionEngine},
    window::WorkingWindow,
    Config, Planning,
};
use std::path::PathBuf;
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de répartition des heures de traduction (sans base de données)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON du planning
    #[arg(long, global = true, default_value = "planning.json")]
    planning: String,

    /// Fichier JSON de configuration (optionnel)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Importer des traducteurs depuis un CSV
    ImportTraducteurs {
        #[arg(long)]
        csv: String,
    },

    /// Importer des segments (tâches, blocages) depuis un CSV
    ImportSegments {
        #[arg(long)]
        csv: String,
    },

    /// Répartition équilibrée sur les jours ouvrables d'une période
    Equilibre {
        #[arg(long)]
        heures: f64,
        /// AAAA-MM-JJ
        #[arg(long)]
        debut: String,
        /// AAAA-MM-JJ
        #[arg(long)]
        fin: String,
        /// ex. "9h-17h"
        #[arg(long)]
        horaire: String,
        #[arg(long)]
        capacite: Option<f64>,
        #[arg(long)]
        out_csv: Option<String>,
    },

    /// Répartition juste-à-temps pour un traducteur du planning
    Jat {
        /// Nom du traducteur
        #[arg(long)]
        traducteur: String,
        #[arg(long)]
        heures: f64,
        /// AAAA-MM-JJTHH:MM
        #[arg(long)]
        echeance: String,
        /// L'heure de l'échéance compte (sinon fin de fenêtre)
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        timestamp: bool,
        #[arg(long)]
        debug: bool,
        /// Aucun jour antérieur (AAAA-MM-JJ)
        #[arg(long)]
        date_min: Option<String>,
        /// Enregistre le plan dans le planning sous cet identifiant
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        out_csv: Option<String>,
    },

    /// Vérifier les conflits
    Verifier {
        #[arg(long)]
        traducteur: Option<String>,
        /// Date de référence pour la proximité des échéances (AAAA-MM-JJ)
        #[arg(long)]
        reference: Option<String>,
        /// Export CSV des conflits (optionnel)
        #[arg(long)]
        report: Option<String>,
    },

    /// Proposer des remèdes classés par impact
    Suggerer {
        #[arg(long)]
        traducteur: Option<String>,
        #[arg(long)]
        reference: Option<String>,
        #[arg(long)]
        out_json: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let config = Config::load(cli.config.as_deref())?;
    let feries = config.feries();
    let repartiteur = config.repartiteur(&feries);

    let storage = JsonStorage::open(&cli.planning);
    let mut planning = storage.load_or_default()?;

    let code = match cli.cmd {
        Commands::ImportTraducteurs { csv } => {
            let traducteurs = io::import_traducteurs_csv(csv)?;
            println!("{} traducteur(s) importé(s)", traducteurs.len());
            planning.traducteurs.extend(traducteurs);
            storage.save(&planning)?;
            0
        }
        Commands::ImportSegments { csv } => {
            let segments = io::import_segments_csv(csv, &planning)?;
            println!("{} segment(s) importé(s)", segments.len());
            planning.segments.extend(segments);
            storage.save(&planning)?;
            0
        }
        Commands::Equilibre {
            heures,
            debut,
            fin,
            horaire,
            capacite,
            out_csv,
        } => {
            let fenetre = WorkingWindow::parse(&horaire, capacite)?;
            let plan = repartiteur.equilibre(heures, io::parse_date(&debut)?, io::parse_date(&fin)?, &fenetre)?;
            afficher_plan(&plan);
            if let Some(path) = out_csv {
                io::export_plan_csv(path, &plan)?;
            }
            0
        }
        Commands::Jat {
            traducteur,
            heures,
            echeance,
            timestamp,
            debug,
            date_min,
            source,
            out_csv,
        } => {
            let tr = trouver(&planning, &traducteur)?.clone();
            let profil = TranslatorProfile::new(tr.id.clone(), tr.fenetre()?)
                .avec_occupes(planning.segments_de(&tr.id, None).cloned().collect());
            let mut opts = repartiteur.options();
            opts.debug = debug;
            opts.mode_timestamp = timestamp;
            opts.date_min = date_min.as_deref().map(io::parse_date).transpose()?;

            let plan = repartiteur.juste_a_temps(&profil, heures, io::parse_echeance(&echeance)?, &opts)?;
            afficher_plan(&plan);
            if let Some(path) = out_csv {
                io::export_plan_csv(path, &plan)?;
            }
            if let Some(id) = source {
                let segments = plan.to_segments(&tr.id, &SourceId::new(id))?;
                planning.segments.extend(segments);
                storage.save(&planning)?;
            }
            0
        }
        Commands::Verifier {
            traducteur,
            reference,
            report,
        } => {
            let id = traducteur
                .as_deref()
                .map(|nom| trouver(&planning, nom).map(|t| t.id.clone()))
                .transpose()?;
            let reference = reference.as_deref().map(io::parse_date).transpose()?;
            let conflits = detecter_conflits_planning(&planning, id.as_ref(), reference)?;
            if conflits.is_empty() {
                println!("OK: aucun conflit");
                0
            } else {
                eprintln!("{} conflit(s) détecté(s)", conflits.len());
                for c in &conflits {
                    println!(
                        "{} | {} | {} | {}",
                        c.date,
                        c.severite,
                        c.type_conflit.as_str(),
                        c.explication
                    );
                }
                if let Some(path) = report {
                    io::export_conflicts_csv(path, &conflits)?;
                }
                // Code 2 = WARNING/INCOMPLETE
                2
            }
        }
        Commands::Suggerer {
            traducteur,
            reference,
            out_json,
        } => {
            let id = traducteur
                .as_deref()
                .map(|nom| trouver(&planning, nom).map(|t| t.id.clone()))
                .transpose()?;
            let reference = reference.as_deref().map(io::parse_date).transpose()?;
            let conflits = detecter_conflits_planning(&planning, id.as_ref(), reference)?;
            let engine = SuggestionEngine::pour_planning(&planning, &feries)
                .avec_poids(config.impact)
                .avec_reference(reference);
            let suggestions = engine.generer_suggestions(&conflits);
            if suggestions.is_empty() {
                println!("OK: aucune suggestion");
            }
            for s in &suggestions {
                println!(
                    "{:>6.2} {:<8} | {} {} {} | {}",
                    s.impact.total,
                    s.impact.niveau.as_str(),
                    s.type_suggestion.as_str(),
                    s.segment_cible.source,
                    decrire(&planning, &s.changement),
                    s.impact.justification
                );
            }
            if let Some(path) = out_json {
                io::export_suggestions_json(path, &suggestions)?;
            }
            0
        }
    };

    std::process::exit(code);
}

fn trouver<'a>(planning: &'a Planning, nom: &str) -> Result<&'a Traducteur> {
    planning
        .find_traducteur_by_nom(nom)
        .ok_or_else(|| anyhow!("unknown translator: {}", nom))
}

fn afficher_plan(plan: &AllocationPlan) {
    for e in plan {
        let plages: Vec<String> = e.plages.iter().map(|p| p.to_string()).collect();
        println!("{} | {:.4}h | {}", e.date, e.heures, plages.join(", "));
    }
    println!("total: {:.4}h sur {} jour(s)", plan.total(), plan.len());
}

fn decrire(planning: &Planning, changement: &Changement) -> String {
    match changement {
        Changement::Deplacer { date, plage } => format!("→ {date} {plage}"),
        Changement::Scinder {
            conserve,
            date_report,
            plage_report,
            ..
        } => format!("garde {conserve}, reporte {date_report} {plage_report}"),
        Changement::Reassigner { traducteur: Some(id), nom } => {
            let nom = nom
                .clone()
                .or_else(|| planning.find_traducteur_by_id(id).map(|t| t.nom.clone()))
                .unwrap_or_else(|| id.to_string());
            format!("→ {nom}")
        }
        Changement::Reassigner { traducteur: None, .. } => "→ ?".to_string(),
        Changement::Reduire {
            heures_retirees,
            redistribution,
            ..
        } => format!(
            "-{:.2}h sur {} jour(s)",
            heures_retirees,
            redistribution.len()
        ),
    }
}
