use crate::model::{InvalidSegment, SourceId, TimeSegment, TraducteurId};
use crate::niveau::{Bandes, Niveau};
use crate::window::WorkingWindow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeConflit {
    ChevauchementTacheTache,
    ChevauchementTacheBlocage,
    ChevauchementBlocageBlocage,
    CapaciteDepassee,
}

impl TypeConflit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeConflit::ChevauchementTacheTache => "chevauchement_tache_tache",
            TypeConflit::ChevauchementTacheBlocage => "chevauchement_tache_blocage",
            TypeConflit::ChevauchementBlocageBlocage => "chevauchement_blocage_blocage",
            TypeConflit::CapaciteDepassee => "capacite_depassee",
        }
    }
}

/// Conflit détecté sur une journée d'un traducteur. Jamais persisté par le cœur.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub type_conflit: TypeConflit,
    pub traducteur: TraducteurId,
    pub date: NaiveDate,
    /// Pour un chevauchement tâche/blocage, toujours la tâche.
    pub segment_a: TimeSegment,
    /// Absent pour un dépassement de capacité.
    pub segment_b: Option<TimeSegment>,
    /// Heures de chevauchement, ou heures en excès pour la capacité.
    pub chevauchement_heures: f64,
    pub severite: Niveau,
    pub explication: String,
}

impl Conflict {
    /// Le conflit touche-t-il un segment issu de `source` ?
    pub fn implique(&self, source: &SourceId) -> bool {
        &self.segment_a.source == source
            || self.segment_b.as_ref().is_some_and(|b| &b.source == source)
    }

    pub fn segments(&self) -> impl Iterator<Item = &TimeSegment> {
        std::iter::once(&self.segment_a).chain(self.segment_b.as_ref())
    }
}

/// Paramètres de détection : fenêtres (pour la capacité) et date de référence.
#[derive(Debug, Clone)]
pub struct DetectionOptions {
    pub fenetres: HashMap<TraducteurId, WorkingWindow>,
    /// Fenêtre utilisée pour les traducteurs absents de `fenetres`.
    pub fenetre_defaut: Option<WorkingWindow>,
    /// « Aujourd'hui » : une échéance au plus tard le lendemain aggrave la sévérité.
    pub reference: Option<NaiveDate>,
    pub bandes_chevauchement: Bandes,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            fenetres: HashMap::new(),
            fenetre_defaut: None,
            reference: None,
            bandes_chevauchement: Bandes::chevauchement(),
        }
    }
}

impl DetectionOptions {
    pub fn avec_fenetre(mut self, fenetre: WorkingWindow) -> Self {
        self.fenetre_defaut = Some(fenetre);
        self
    }

    pub fn avec_fenetre_pour(mut self, traducteur: TraducteurId, fenetre: WorkingWindow) -> Self {
        self.fenetres.insert(traducteur, fenetre);
        self
    }

    pub fn avec_reference(mut self, reference: Option<NaiveDate>) -> Self {
        self.reference = reference;
        self
    }

    pub fn fenetre_de(&self, traducteur: &TraducteurId) -> Option<&WorkingWindow> {
        self.fenetres.get(traducteur).or(self.fenetre_defaut.as_ref())
    }
}

#[derive(Error, Debug)]
pub enum ConflictError {
    #[error(transparent)]
    InvalidSegment(#[from] InvalidSegment),
    #[error("unknown allocation: {0}")]
    UnknownAllocation(String),
    #[error("unknown blocage: {0}")]
    UnknownBlocage(String),
}
