use crate::model::{InvalidSegment, SourceId, TimeSegment, TraducteurId};
use crate::window::{Plage, WorkingWindow};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tolérance sur les sommes d'heures.
pub const TOLERANCE: f64 = 1e-4;

/// Borne par défaut du recul juste-à-temps, en jours ouvrables.
pub const MAX_JOURS_RECUL: u32 = 30;

/// Une journée du plan d'allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub date: NaiveDate,
    pub heures: f64,
    pub debut: NaiveTime,
    pub fin: NaiveTime,
    /// Plages contiguës réellement utilisées, triées.
    pub plages: Vec<Plage>,
}

/// Plan jour par jour pour une tâche, trié par date.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub entrees: Vec<AllocationEntry>,
}

impl AllocationPlan {
    pub fn total(&self) -> f64 {
        self.entrees.iter().map(|e| e.heures).sum()
    }

    pub fn len(&self) -> usize {
        self.entrees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entrees.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AllocationEntry> {
        self.entrees.iter()
    }

    /// Segments TACHE correspondant au plan, un par plage.
    pub fn to_segments(
        &self,
        traducteur: &TraducteurId,
        source: &SourceId,
    ) -> Result<Vec<TimeSegment>, InvalidSegment> {
        let mut out = Vec::new();
        for e in &self.entrees {
            let unique = e.plages.len() == 1;
            for p in &e.plages {
                let seg = TimeSegment::tache(traducteur.clone(), e.date, *p, source.clone())?;
                // l'arrondi à la seconde peut raccourcir la plage
                let seg = if unique {
                    let heures = e.heures.min(seg.heures);
                    seg.avec_heures(heures)?
                } else {
                    seg
                };
                out.push(seg);
            }
        }
        Ok(out)
    }
}

impl<'a> IntoIterator for &'a AllocationPlan {
    type Item = &'a AllocationEntry;
    type IntoIter = std::slice::Iter<'a, AllocationEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entrees.iter()
    }
}

/// Profil de capacité d'un traducteur pour un calcul donné.
#[derive(Debug, Clone)]
pub struct TranslatorProfile {
    pub id: TraducteurId,
    pub fenetre: WorkingWindow,
    /// Segments déjà en place (tâches, blocages) ; réduisent la capacité offerte.
    pub occupes: Vec<TimeSegment>,
}

impl TranslatorProfile {
    pub fn new(id: TraducteurId, fenetre: WorkingWindow) -> Self {
        Self { id, fenetre, occupes: Vec::new() }
    }

    pub fn avec_occupes(mut self, occupes: Vec<TimeSegment>) -> Self {
        self.occupes = occupes;
        self
    }

    pub(crate) fn occupes_du_jour(&self, date: NaiveDate) -> impl Iterator<Item = &TimeSegment> + '_ {
        self.occupes
            .iter()
            .filter(move |s| s.date == date && s.est_occupant())
    }
}

/// Options du mode juste-à-temps (et PEPS).
#[derive(Debug, Clone, Copy)]
pub struct JatOptions {
    pub debug: bool,
    /// L'heure de l'échéance compte ; sinon l'échéance tombe en fin de fenêtre.
    pub mode_timestamp: bool,
    pub max_jours_recul: u32,
    /// Aucun jour antérieur à cette date (typiquement aujourd'hui).
    pub date_min: Option<NaiveDate>,
    pub inclure_fins_de_semaine: bool,
}

impl Default for JatOptions {
    fn default() -> Self {
        Self {
            debug: false,
            mode_timestamp: true,
            max_jours_recul: MAX_JOURS_RECUL,
            date_min: None,
            inclure_fins_de_semaine: false,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepartitionError {
    #[error("total hours must be a positive number (got {0})")]
    InvalidHours(f64),
    #[error("invalid date range: {debut} is after {fin}")]
    InvalidRange { debut: NaiveDate, fin: NaiveDate },
    #[error("no business day between {debut} and {fin}")]
    NoBusinessDay { debut: NaiveDate, fin: NaiveDate },
    /// `manque` : heures qui ne tiennent pas dans la plage demandée.
    #[error("capacity exceeded on {date}: {heures:.4}h requested for {capacite}h available (short by {manque:.4}h)")]
    CapacityExceeded {
        date: NaiveDate,
        heures: f64,
        capacite: f64,
        manque: f64,
    },
    #[error("{total}h cannot be spread over {jours} day(s) without empty days")]
    HoursTooSmall { total: f64, jours: usize },
    #[error("deadline unreachable: {restant:.4}h left unplaced after {jours_examines} day(s)")]
    DeadlineUnreachable { restant: f64, jours_examines: u32 },
}
