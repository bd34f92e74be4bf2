//! Configuration JSON du répartiteur ; chaque champ absent prend sa valeur par défaut.

use crate::calendar::JoursFeries;
use crate::repartition::{Repartiteur, MAX_JOURS_RECUL};
use crate::suggestions::ImpactWeights;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub repartition: RepartitionConfig,
    #[serde(default)]
    pub calendrier: CalendrierConfig,
    #[serde(default)]
    pub impact: ImpactWeights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepartitionConfig {
    /// Borne du recul juste-à-temps, en jours ouvrables.
    #[serde(default = "default_max_jours_recul")]
    pub max_jours_recul: u32,
    #[serde(default)]
    pub inclure_fins_de_semaine: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalendrierConfig {
    #[serde(default)]
    pub feries_quebec: bool,
    #[serde(default)]
    pub jours_feries: Vec<NaiveDate>,
}

fn default_max_jours_recul() -> u32 {
    MAX_JOURS_RECUL
}

impl Default for RepartitionConfig {
    fn default() -> Self {
        Self {
            max_jours_recul: default_max_jours_recul(),
            inclure_fins_de_semaine: false,
        }
    }
}

impl Config {
    /// Fichier absent (ou chemin non fourni) : configuration par défaut.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            debug!(path = %path.display(), "config absente, valeurs par défaut");
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = serde_json::from_str(&data)
            .with_context(|| format!("failed parsing JSON config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn feries(&self) -> JoursFeries {
        let feries = JoursFeries::new(self.calendrier.jours_feries.iter().copied());
        if self.calendrier.feries_quebec {
            feries.avec_quebec()
        } else {
            feries
        }
    }

    /// Répartiteur configuré sur le calendrier fourni (en général `self.feries()`).
    pub fn repartiteur<'a>(&self, feries: &'a JoursFeries) -> Repartiteur<'a> {
        Repartiteur::new(feries)
            .max_jours_recul(self.repartition.max_jours_recul)
            .inclure_fins_de_semaine(self.repartition.inclure_fins_de_semaine)
    }
}
