use crate::model::{TimeSegment, TraducteurId};
use crate::niveau::Niveau;
use crate::repartition::AllocationPlan;
use crate::window::{Plage, WorkingWindow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// L'ordre des variantes départage les suggestions de même score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeSuggestion {
    Deplacer,
    Scinder,
    Reduire,
    Reassigner,
}

impl TypeSuggestion {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeSuggestion::Deplacer => "deplacer",
            TypeSuggestion::Scinder => "scinder",
            TypeSuggestion::Reduire => "reduire",
            TypeSuggestion::Reassigner => "reassigner",
        }
    }
}

/// Modification proposée ; jamais appliquée par le moteur.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Changement {
    Deplacer {
        date: NaiveDate,
        plage: Plage,
    },
    Scinder {
        conserve: Plage,
        heures_conservees: f64,
        date_report: NaiveDate,
        plage_report: Plage,
        heures_reportees: f64,
    },
    /// `traducteur` absent : intervention manuelle requise.
    Reassigner {
        traducteur: Option<TraducteurId>,
        nom: Option<String>,
    },
    Reduire {
        heures_retirees: f64,
        heures_restantes: f64,
        redistribution: AllocationPlan,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreImpact {
    pub total: f64,
    pub niveau: Niveau,
    pub justification: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: Uuid,
    pub type_suggestion: TypeSuggestion,
    pub segment_cible: TimeSegment,
    pub changement: Changement,
    pub impact: ScoreImpact,
}

/// Pondérations du score d'impact (plus bas = moins perturbant).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactWeights {
    #[serde(default = "default_heures")]
    pub heures: f64,
    #[serde(default = "default_jours")]
    pub jours: f64,
    #[serde(default = "default_echeance")]
    pub echeance: f64,
    #[serde(default = "default_traducteur")]
    pub traducteur: f64,
}

fn default_heures() -> f64 {
    1.0
}
fn default_jours() -> f64 {
    1.5
}
fn default_echeance() -> f64 {
    3.0
}
fn default_traducteur() -> f64 {
    6.0
}

impl Default for ImpactWeights {
    fn default() -> Self {
        Self {
            heures: default_heures(),
            jours: default_jours(),
            echeance: default_echeance(),
            traducteur: default_traducteur(),
        }
    }
}

/// Traducteur de remplacement possible, avec ses segments du jour visé.
#[derive(Debug, Clone)]
pub struct Candidat {
    pub traducteur: TraducteurId,
    pub nom: String,
    pub fenetre: WorkingWindow,
    pub segments: Vec<TimeSegment>,
}

/// Bassin de candidats pour les réassignations (collaborateur externe).
pub trait CandidatePool {
    fn candidats(&self, segment: &TimeSegment) -> Vec<Candidat>;
}

/// Aucun remplaçant disponible.
#[derive(Debug, Default, Clone, Copy)]
pub struct AucunCandidat;

impl CandidatePool for AucunCandidat {
    fn candidats(&self, _segment: &TimeSegment) -> Vec<Candidat> {
        Vec::new()
    }
}
