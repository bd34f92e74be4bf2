use crate::window::{Plage, WindowError, WorkingWindow};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Identifiant fort pour un traducteur
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TraducteurId(String);

impl TraducteurId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TraducteurId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifiant de l'objet d'origine d'un segment (allocation de tâche ou blocage).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceId(String);

impl SourceId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Traducteur : horaire textuel persisté + capacité quotidienne.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Traducteur {
    pub id: TraducteurId,
    pub nom: String,
    /// Horaire textuel, ex. `"9h-17h"`.
    pub horaire: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacite: Option<f64>,
    /// Paires linguistiques maîtrisées, ex. `"EN>FR"`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paires: Vec<String>,
}

impl Traducteur {
    pub fn new<N: Into<String>, H: Into<String>>(nom: N, horaire: H, capacite: Option<f64>) -> Self {
        Self {
            id: TraducteurId::random(),
            nom: nom.into(),
            horaire: horaire.into(),
            capacite,
            paires: Vec::new(),
        }
    }

    /// Fenêtre de travail recalculée depuis l'horaire textuel.
    pub fn fenetre(&self) -> Result<WorkingWindow, WindowError> {
        WorkingWindow::parse(&self.horaire, self.capacite)
    }

    pub fn maitrise(&self, paire: &str) -> bool {
        self.paires.iter().any(|p| p.eq_ignore_ascii_case(paire))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NatureSegment {
    Tache,
    Blocage,
    /// Capacité inoccupée (dérivée, jamais en conflit).
    Libre,
}

impl NatureSegment {
    pub fn as_str(&self) -> &'static str {
        match self {
            NatureSegment::Tache => "tache",
            NatureSegment::Blocage => "blocage",
            NatureSegment::Libre => "libre",
        }
    }
}

impl std::str::FromStr for NatureSegment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tache" | "tâche" | "task" => Ok(NatureSegment::Tache),
            "blocage" | "blackout" => Ok(NatureSegment::Blocage),
            "libre" | "idle" => Ok(NatureSegment::Libre),
            other => Err(format!("nature de segment inconnue: {other}")),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("segment {id} invalide: {raison}")]
pub struct InvalidSegment {
    pub id: String,
    pub raison: &'static str,
}

/// Intervalle `[debut, fin)` d'une journée pour un traducteur.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSegment {
    pub traducteur: TraducteurId,
    pub date: NaiveDate,
    pub debut: NaiveTime,
    pub fin: NaiveTime,
    pub heures: f64,
    pub nature: NatureSegment,
    pub source: SourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub echeance: Option<NaiveDateTime>,
    #[serde(default)]
    pub priorite: u8,
    #[serde(default = "default_true")]
    pub fractionnable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paire: Option<String>,
}

fn default_true() -> bool {
    true
}

impl TimeSegment {
    /// Crée un segment en validant que `fin > debut` ; `heures` = longueur de la plage.
    pub fn new(
        traducteur: TraducteurId,
        date: NaiveDate,
        debut: NaiveTime,
        fin: NaiveTime,
        nature: NatureSegment,
        source: SourceId,
    ) -> Result<Self, InvalidSegment> {
        let seg = Self {
            heures: Plage::new(debut, fin).heures(),
            traducteur,
            date,
            debut,
            fin,
            nature,
            source,
            echeance: None,
            priorite: 0,
            fractionnable: true,
            paire: None,
        };
        seg.validate()?;
        Ok(seg)
    }

    pub fn tache(
        traducteur: TraducteurId,
        date: NaiveDate,
        plage: Plage,
        source: SourceId,
    ) -> Result<Self, InvalidSegment> {
        Self::new(traducteur, date, plage.debut, plage.fin, NatureSegment::Tache, source)
    }

    pub fn blocage(
        traducteur: TraducteurId,
        date: NaiveDate,
        plage: Plage,
        source: SourceId,
    ) -> Result<Self, InvalidSegment> {
        Self::new(traducteur, date, plage.debut, plage.fin, NatureSegment::Blocage, source)
    }

    pub fn avec_echeance(mut self, echeance: NaiveDateTime) -> Self {
        self.echeance = Some(echeance);
        self
    }

    pub fn avec_priorite(mut self, priorite: u8) -> Self {
        self.priorite = priorite;
        self
    }

    pub fn non_fractionnable(mut self) -> Self {
        self.fractionnable = false;
        self
    }

    pub fn avec_paire<S: Into<String>>(mut self, paire: S) -> Self {
        self.paire = Some(paire.into());
        self
    }

    /// Effort partiel : moins d'heures que la longueur de la plage.
    pub fn avec_heures(mut self, heures: f64) -> Result<Self, InvalidSegment> {
        self.heures = heures;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), InvalidSegment> {
        let invalid = |raison| InvalidSegment {
            id: self.source.as_str().to_string(),
            raison,
        };
        if self.fin <= self.debut {
            return Err(invalid("end must be strictly after start"));
        }
        if !self.heures.is_finite() || self.heures < 0.0 {
            return Err(invalid("hours must be a non-negative number"));
        }
        if self.heures > self.plage().heures() + 1e-6 {
            return Err(invalid("hours exceed the clock range"));
        }
        Ok(())
    }

    pub fn plage(&self) -> Plage {
        Plage::new(self.debut, self.fin)
    }

    pub fn est_occupant(&self) -> bool {
        self.nature != NatureSegment::Libre
    }

    /// Même segment déplacé sur une autre plage (heures = longueur de la plage).
    pub fn deplace(&self, date: NaiveDate, plage: Plage) -> Self {
        Self {
            date,
            debut: plage.debut,
            fin: plage.fin,
            heures: plage.heures(),
            ..self.clone()
        }
    }
}

/// Instantané complet : traducteurs et segments (tâches + blocages).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Planning {
    pub traducteurs: Vec<Traducteur>,
    pub segments: Vec<TimeSegment>,
}

impl Planning {
    pub fn find_traducteur_by_nom<'a>(&'a self, nom: &str) -> Option<&'a Traducteur> {
        self.traducteurs.iter().find(|t| t.nom == nom)
    }
    pub fn find_traducteur_by_id<'a>(&'a self, id: &TraducteurId) -> Option<&'a Traducteur> {
        self.traducteurs.iter().find(|t| &t.id == id)
    }

    /// Segments d'un traducteur, optionnellement restreints à une date.
    pub fn segments_de<'a>(
        &'a self,
        traducteur: &'a TraducteurId,
        date: Option<NaiveDate>,
    ) -> impl Iterator<Item = &'a TimeSegment> + 'a {
        self.segments
            .iter()
            .filter(move |s| &s.traducteur == traducteur && date.map_or(true, |d| s.date == d))
    }
}
