use super::types::{AllocationEntry, AllocationPlan, RepartitionError, TranslatorProfile, TOLERANCE};
use crate::model::TimeSegment;
use crate::window::{duree_heures, plages_libres, Plage, WorkingWindow};
use chrono::{NaiveDate, NaiveTime};

pub(crate) fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// Troncature à 4 décimales (l'epsilon absorbe le bruit binaire, ex. 0.3 * 1e4).
pub(super) fn floor4(v: f64) -> f64 {
    (v * 10_000.0 + 1e-7).floor() / 10_000.0
}

pub(super) fn valider_total(total: f64) -> Result<(), RepartitionError> {
    if !total.is_finite() || total <= 0.0 {
        return Err(RepartitionError::InvalidHours(total));
    }
    Ok(())
}

/// Sens du remplissage d'une journée.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Sens {
    /// Collé contre la fin de la fenêtre (ou l'heure d'échéance).
    Recul,
    /// Collé contre le début de la fenêtre.
    Avance,
}

/// Capacité encore offerte par la journée, en heures.
pub fn capacite_libre(fenetre: &WorkingWindow, segments_du_jour: &[TimeSegment]) -> f64 {
    let occupe: f64 = segments_du_jour
        .iter()
        .filter(|s| s.est_occupant())
        .map(|s| s.heures)
        .sum();
    (fenetre.capacite_jour() - occupe).max(0.0)
}

/// Vérifie qu'aucune entrée ne dépasse la capacité et que les dates sont croissantes.
pub fn verifier_plan(plan: &AllocationPlan, fenetre: &WorkingWindow) -> Result<(), RepartitionError> {
    let capacite = fenetre.capacite_jour();
    for e in plan {
        if e.heures > capacite + TOLERANCE {
            return Err(RepartitionError::CapacityExceeded {
                date: e.date,
                heures: e.heures,
                capacite,
                manque: round4(e.heures - capacite),
            });
        }
    }
    if let Some(w) = plan.entrees.windows(2).find(|w| w[0].date >= w[1].date) {
        return Err(RepartitionError::InvalidRange {
            debut: w[0].date,
            fin: w[1].date,
        });
    }
    Ok(())
}

/// Alloue au plus `restant` heures sur `date` pour le profil.
///
/// L'allocation est bornée par la capacité résiduelle (capacité quotidienne moins
/// les heures déjà occupées) et par le temps d'horloge libre avant `limite`.
pub(super) fn allouer_jour(
    profil: &TranslatorProfile,
    date: NaiveDate,
    restant: f64,
    limite: Option<NaiveTime>,
    sens: Sens,
) -> Option<AllocationEntry> {
    let fenetre = &profil.fenetre;
    let occupes: Vec<&TimeSegment> = profil.occupes_du_jour(date).collect();
    let heures_occupees: f64 = occupes.iter().map(|s| s.heures).sum();
    let capacite = (fenetre.capacite_jour() - heures_occupees).max(0.0);

    let mut cadre = fenetre.plage();
    if let Some(l) = limite {
        cadre.fin = cadre.fin.min(l);
        if cadre.fin <= cadre.debut {
            return None;
        }
    }
    let plages_occupees: Vec<Plage> = occupes.iter().map(|s| s.plage()).collect();
    let libres = plages_libres(cadre, &plages_occupees);
    let temps_libre: f64 = libres.iter().map(Plage::heures).sum();

    let plafond = capacite.min(temps_libre);
    let heures = if restant <= plafond + TOLERANCE {
        restant
    } else {
        round4(plafond)
    };
    if heures <= TOLERANCE {
        return None;
    }

    let plages = remplir(&libres, heures, sens);
    let debut = plages.first()?.debut;
    let fin = plages.last()?.fin;
    Some(AllocationEntry { date, heures, debut, fin, plages })
}

fn remplir(libres: &[Plage], heures: f64, sens: Sens) -> Vec<Plage> {
    let mut reste = heures;
    let mut out = Vec::new();
    let ordre: Vec<&Plage> = match sens {
        Sens::Recul => libres.iter().rev().collect(),
        Sens::Avance => libres.iter().collect(),
    };
    for p in ordre {
        if reste <= TOLERANCE {
            break;
        }
        let pris = reste.min(p.heures());
        let plage = match sens {
            Sens::Recul if pris >= p.heures() => *p,
            Sens::Recul => Plage::new(p.fin - duree_heures(pris), p.fin),
            Sens::Avance if pris >= p.heures() => *p,
            Sens::Avance => Plage::new(p.debut, p.debut + duree_heures(pris)),
        };
        out.push(plage);
        reste -= pris;
    }
    out.sort_by_key(|p| p.debut);
    out
}
