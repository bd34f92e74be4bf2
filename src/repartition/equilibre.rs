use super::types::{AllocationEntry, AllocationPlan, RepartitionError, TOLERANCE};
use super::util::{floor4, round4, valider_total};
use crate::calendar::{jours_admissibles, HolidayCalendar};
use crate::window::WorkingWindow;
use chrono::NaiveDate;
use tracing::debug;

pub(super) fn repartition_equilibree(
    total: f64,
    date_debut: NaiveDate,
    date_fin: NaiveDate,
    fenetre: &WorkingWindow,
    feries: &dyn HolidayCalendar,
    inclure_fins_de_semaine: bool,
) -> Result<AllocationPlan, RepartitionError> {
    valider_total(total)?;
    if date_debut > date_fin {
        return Err(RepartitionError::InvalidRange {
            debut: date_debut,
            fin: date_fin,
        });
    }

    let jours = jours_admissibles(date_debut, date_fin, feries, inclure_fins_de_semaine);
    if jours.is_empty() {
        return Err(RepartitionError::NoBusinessDay {
            debut: date_debut,
            fin: date_fin,
        });
    }

    repartir_sur_jours(total, &jours, fenetre)
}

/// Répartit `total` également sur `jours` (déjà triés) ; le dernier jour absorbe le résidu.
///
/// Si l'arrondi de la part laisse un résidu nul ou négatif, la part est tronquée
/// au lieu d'être arrondie. Chaque entrée porte strictement plus de `TOLERANCE` heures.
pub(crate) fn repartir_sur_jours(
    total: f64,
    jours: &[NaiveDate],
    fenetre: &WorkingWindow,
) -> Result<AllocationPlan, RepartitionError> {
    let n = jours.len();
    let capacite = fenetre.capacite_jour();
    let mut part = round4(total / n as f64);
    if total - part * (n - 1) as f64 <= TOLERANCE {
        part = floor4(total / n as f64);
    }
    if part <= TOLERANCE {
        return Err(RepartitionError::HoursTooSmall { total, jours: n });
    }

    let mut entrees = Vec::with_capacity(n);
    let mut cumul = 0.0;
    for (idx, date) in jours.iter().enumerate() {
        let heures = if idx + 1 == n { total - cumul } else { part };
        if heures > capacite + TOLERANCE {
            return Err(RepartitionError::CapacityExceeded {
                date: *date,
                heures,
                capacite,
                manque: round4(total - capacite * n as f64).max(round4(heures - capacite)),
            });
        }
        let plage = fenetre.plage_depuis_debut(heures);
        entrees.push(AllocationEntry {
            date: *date,
            heures,
            debut: plage.debut,
            fin: plage.fin,
            plages: vec![plage],
        });
        cumul += heures;
    }

    debug!(total, jours = n, part, "répartition équilibrée");
    Ok(AllocationPlan { entrees })
}
