//! Moteur de répartition : équilibré, juste-à-temps (recul depuis l'échéance) et PEPS.
//!
//! Toutes les fonctions sont pures : elles reçoivent la fenêtre, les segments
//! occupés et le calendrier, et rendent un [`AllocationPlan`] ou une erreur.

mod equilibre;
mod jat;
mod types;
mod util;

pub use types::{
    AllocationEntry, AllocationPlan, JatOptions, RepartitionError, TranslatorProfile,
    MAX_JOURS_RECUL, TOLERANCE,
};
pub use util::{capacite_libre, verifier_plan};

pub(crate) use equilibre::repartir_sur_jours;
pub(crate) use util::round4;

use crate::calendar::{HolidayCalendar, SansFeries};
use crate::window::WorkingWindow;
use chrono::{NaiveDate, NaiveDateTime};

/// Répartition égale de `total` heures sur les jours ouvrables de `[date_debut, date_fin]`.
pub fn repartition_equilibree(
    total: f64,
    date_debut: NaiveDate,
    date_fin: NaiveDate,
    fenetre: &WorkingWindow,
    feries: &dyn HolidayCalendar,
) -> Result<AllocationPlan, RepartitionError> {
    equilibre::repartition_equilibree(total, date_debut, date_fin, fenetre, feries, false)
}

/// Répartition juste-à-temps : les jours les plus proches de l'échéance d'abord.
pub fn repartition_juste_a_temps(
    profil: &TranslatorProfile,
    total: f64,
    echeance: NaiveDateTime,
    opts: &JatOptions,
    feries: &dyn HolidayCalendar,
) -> Result<AllocationPlan, RepartitionError> {
    jat::repartition_juste_a_temps(profil, total, echeance, opts, feries)
}

/// Répartition PEPS : les jours les plus tôt d'abord, jusqu'à l'échéance.
pub fn repartition_peps(
    profil: &TranslatorProfile,
    total: f64,
    date_debut: NaiveDate,
    echeance: NaiveDateTime,
    opts: &JatOptions,
    feries: &dyn HolidayCalendar,
) -> Result<AllocationPlan, RepartitionError> {
    jat::repartition_peps(profil, total, date_debut, echeance, opts, feries)
}

/// Répartiteur configuré une fois (calendrier + politique), réutilisable d'un appel à l'autre.
pub struct Repartiteur<'a> {
    feries: &'a dyn HolidayCalendar,
    inclure_fins_de_semaine: bool,
    max_jours_recul: u32,
}

impl Default for Repartiteur<'static> {
    fn default() -> Self {
        Self {
            feries: &SansFeries,
            inclure_fins_de_semaine: false,
            max_jours_recul: MAX_JOURS_RECUL,
        }
    }
}

impl<'a> Repartiteur<'a> {
    pub fn new(feries: &'a dyn HolidayCalendar) -> Self {
        Self {
            feries,
            inclure_fins_de_semaine: false,
            max_jours_recul: MAX_JOURS_RECUL,
        }
    }

    pub fn inclure_fins_de_semaine(mut self, oui: bool) -> Self {
        self.inclure_fins_de_semaine = oui;
        self
    }

    pub fn max_jours_recul(mut self, jours: u32) -> Self {
        self.max_jours_recul = jours;
        self
    }

    pub fn feries(&self) -> &'a dyn HolidayCalendar {
        self.feries
    }

    /// Options juste-à-temps par défaut pour cette politique.
    pub fn options(&self) -> JatOptions {
        JatOptions {
            max_jours_recul: self.max_jours_recul,
            inclure_fins_de_semaine: self.inclure_fins_de_semaine,
            ..JatOptions::default()
        }
    }

    pub fn equilibre(
        &self,
        total: f64,
        date_debut: NaiveDate,
        date_fin: NaiveDate,
        fenetre: &WorkingWindow,
    ) -> Result<AllocationPlan, RepartitionError> {
        equilibre::repartition_equilibree(
            total,
            date_debut,
            date_fin,
            fenetre,
            self.feries,
            self.inclure_fins_de_semaine,
        )
    }

    pub fn juste_a_temps(
        &self,
        profil: &TranslatorProfile,
        total: f64,
        echeance: NaiveDateTime,
        opts: &JatOptions,
    ) -> Result<AllocationPlan, RepartitionError> {
        jat::repartition_juste_a_temps(profil, total, echeance, opts, self.feries)
    }

    pub fn peps(
        &self,
        profil: &TranslatorProfile,
        total: f64,
        date_debut: NaiveDate,
        echeance: NaiveDateTime,
        opts: &JatOptions,
    ) -> Result<AllocationPlan, RepartitionError> {
        jat::repartition_peps(profil, total, date_debut, echeance, opts, self.feries)
    }
}
