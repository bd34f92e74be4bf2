use super::types::{AllocationPlan, JatOptions, RepartitionError, TranslatorProfile, TOLERANCE};
use super::util::{allouer_jour, round4, valider_total, Sens};
use crate::calendar::{est_jour_admissible, HolidayCalendar};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, warn};

/// Remonte depuis l'échéance, jour admissible par jour admissible, en remplissant
/// chaque journée jusqu'à sa capacité libre.
pub(super) fn repartition_juste_a_temps(
    profil: &TranslatorProfile,
    total: f64,
    echeance: NaiveDateTime,
    opts: &JatOptions,
    feries: &dyn HolidayCalendar,
) -> Result<AllocationPlan, RepartitionError> {
    valider_total(total)?;

    let jour_echeance = echeance.date();
    let limite = limite_echeance(echeance, opts);
    // garde-fou sur les jours civils parcourus (fériés en série)
    let max_civils = opts.max_jours_recul.saturating_mul(2).saturating_add(7);

    let mut restant = total;
    let mut entrees = Vec::new();
    let mut examines = 0u32;
    let mut civils = 0u32;
    let mut date = jour_echeance;

    while restant > TOLERANCE && examines < opts.max_jours_recul && civils < max_civils {
        if opts.date_min.is_some_and(|min| date < min) {
            break;
        }
        civils += 1;
        if est_jour_admissible(date, feries, opts.inclure_fins_de_semaine) {
            examines += 1;
            let borne = if date == jour_echeance { limite } else { None };
            if let Some(entree) = allouer_jour(profil, date, restant, borne, Sens::Recul) {
                if opts.debug {
                    debug!(
                        traducteur = %profil.id,
                        date = %date,
                        heures = entree.heures,
                        debut = %entree.debut,
                        fin = %entree.fin,
                        "jat: journée allouée"
                    );
                }
                restant -= entree.heures;
                entrees.push(entree);
            } else if opts.debug {
                debug!(traducteur = %profil.id, date = %date, "jat: aucune capacité libre");
            }
        }
        date = match date.pred_opt() {
            Some(d) => d,
            None => break,
        };
    }

    if restant > TOLERANCE {
        warn!(
            traducteur = %profil.id,
            restant,
            examines,
            "jat: échéance inatteignable"
        );
        return Err(RepartitionError::DeadlineUnreachable {
            restant: round4(restant),
            jours_examines: examines,
        });
    }

    entrees.reverse();
    Ok(AllocationPlan { entrees })
}

/// Pendant « premier entré, premier sorti » : avance depuis `date_debut`
/// jusqu'au jour de l'échéance en remplissant dès le début de la fenêtre.
pub(super) fn repartition_peps(
    profil: &TranslatorProfile,
    total: f64,
    date_debut: NaiveDate,
    echeance: NaiveDateTime,
    opts: &JatOptions,
    feries: &dyn HolidayCalendar,
) -> Result<AllocationPlan, RepartitionError> {
    valider_total(total)?;

    let jour_echeance = echeance.date();
    let debut = opts.date_min.map_or(date_debut, |min| date_debut.max(min));
    if debut > jour_echeance {
        return Err(RepartitionError::InvalidRange {
            debut,
            fin: jour_echeance,
        });
    }
    let limite = limite_echeance(echeance, opts);

    let mut restant = total;
    let mut entrees = Vec::new();
    let mut examines = 0u32;

    for date in debut.iter_days().take_while(|d| *d <= jour_echeance) {
        if restant <= TOLERANCE {
            break;
        }
        if !est_jour_admissible(date, feries, opts.inclure_fins_de_semaine) {
            continue;
        }
        examines += 1;
        let borne = if date == jour_echeance { limite } else { None };
        if let Some(entree) = allouer_jour(profil, date, restant, borne, Sens::Avance) {
            if opts.debug {
                debug!(traducteur = %profil.id, date = %date, heures = entree.heures, "peps: journée allouée");
            }
            restant -= entree.heures;
            entrees.push(entree);
        }
    }

    if restant > TOLERANCE {
        return Err(RepartitionError::DeadlineUnreachable {
            restant: round4(restant),
            jours_examines: examines,
        });
    }
    Ok(AllocationPlan { entrees })
}

fn limite_echeance(echeance: NaiveDateTime, opts: &JatOptions) -> Option<NaiveTime> {
    opts.mode_timestamp.then(|| echeance.time())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{JoursFeries, SansFeries};
    use crate::model::{SourceId, TimeSegment, TraducteurId};
    use crate::window::{Plage, WorkingWindow};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn profil() -> TranslatorProfile {
        let fenetre = WorkingWindow::parse("08:00-16:00", Some(7.0)).unwrap();
        TranslatorProfile::new(TraducteurId::new("t1"), fenetre)
    }

    #[test]
    fn back_loads_against_deadline() {
        let echeance = date(2025, 12, 23).and_time(t(16, 0));
        let plan =
            repartition_juste_a_temps(&profil(), 14.0, echeance, &JatOptions::default(), &SansFeries)
                .unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.entrees[0].date, date(2025, 12, 22));
        assert_eq!(plan.entrees[1].date, date(2025, 12, 23));
        assert_eq!(plan.entrees[1].fin, t(16, 0));
        assert_eq!(plan.entrees[1].debut, t(9, 0));
        assert!(plan.iter().all(|e| e.heures <= 7.0 + TOLERANCE));
        assert!((plan.total() - 14.0).abs() < TOLERANCE);
    }

    #[test]
    fn same_day_deadline_clock_is_honoured() {
        let echeance = date(2025, 12, 23).and_time(t(11, 0));
        let plan =
            repartition_juste_a_temps(&profil(), 5.0, echeance, &JatOptions::default(), &SansFeries)
                .unwrap();
        // 3h avant 11h le 23, le reste le 22
        assert_eq!(plan.entrees[1].plages, vec![Plage::new(t(8, 0), t(11, 0))]);
        assert!((plan.entrees[0].heures - 2.0).abs() < TOLERANCE);
        assert_eq!(plan.entrees[0].fin, t(16, 0));
    }

    #[test]
    fn without_timestamp_mode_deadline_is_end_of_day() {
        let echeance = date(2025, 12, 23).and_time(t(11, 0));
        let opts = JatOptions { mode_timestamp: false, ..JatOptions::default() };
        let plan = repartition_juste_a_temps(&profil(), 5.0, echeance, &opts, &SansFeries).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.entrees[0].fin, t(16, 0));
    }

    #[test]
    fn weekend_deadline_starts_on_friday() {
        let echeance = date(2025, 12, 14).and_time(t(12, 0));
        let plan =
            repartition_juste_a_temps(&profil(), 3.0, echeance, &JatOptions::default(), &SansFeries)
                .unwrap();
        assert_eq!(plan.entrees[0].date, date(2025, 12, 12));
        assert_eq!(plan.entrees[0].fin, t(16, 0));
    }

    #[test]
    fn blackout_reduces_day_capacity() {
        let d = date(2025, 12, 23);
        let blocage = TimeSegment::blocage(
            TraducteurId::new("t1"),
            d,
            Plage::new(t(8, 0), t(12, 0)),
            SourceId::new("b1"),
        )
        .unwrap();
        let p = profil().avec_occupes(vec![blocage]);
        let plan = repartition_juste_a_temps(&p, 7.0, d.and_time(t(16, 0)), &JatOptions::default(), &SansFeries)
            .unwrap();
        assert_eq!(plan.len(), 2);
        assert!((plan.entrees[1].heures - 3.0).abs() < TOLERANCE);
        assert!((plan.entrees[0].heures - 4.0).abs() < TOLERANCE);
    }

    #[test]
    fn lookback_bound_is_enforced() {
        let opts = JatOptions { max_jours_recul: 2, ..JatOptions::default() };
        let echeance = date(2025, 12, 23).and_time(t(16, 0));
        let err = repartition_juste_a_temps(&profil(), 20.0, echeance, &opts, &SansFeries).unwrap_err();
        assert_eq!(
            err,
            RepartitionError::DeadlineUnreachable { restant: 6.0, jours_examines: 2 }
        );
    }

    #[test]
    fn min_date_stops_the_walk() {
        let opts = JatOptions { date_min: Some(date(2025, 12, 23)), ..JatOptions::default() };
        let echeance = date(2025, 12, 23).and_time(t(16, 0));
        let err = repartition_juste_a_temps(&profil(), 10.0, echeance, &opts, &SansFeries).unwrap_err();
        assert!(matches!(err, RepartitionError::DeadlineUnreachable { jours_examines: 1, .. }));
    }

    #[test]
    fn holidays_are_skipped_backward() {
        let feries = JoursFeries::new([date(2025, 12, 22)]);
        let echeance = date(2025, 12, 23).and_time(t(16, 0));
        let plan =
            repartition_juste_a_temps(&profil(), 14.0, echeance, &JatOptions::default(), &feries).unwrap();
        assert_eq!(plan.entrees[0].date, date(2025, 12, 19));
    }

    #[test]
    fn peps_front_loads() {
        let echeance = date(2025, 12, 23).and_time(t(16, 0));
        let plan = repartition_peps(
            &profil(),
            10.0,
            date(2025, 12, 18),
            echeance,
            &JatOptions::default(),
            &SansFeries,
        )
        .unwrap();
        assert_eq!(plan.entrees[0].date, date(2025, 12, 18));
        assert_eq!(plan.entrees[0].debut, t(8, 0));
        assert!((plan.entrees[0].heures - 7.0).abs() < TOLERANCE);
        assert_eq!(plan.entrees[1].date, date(2025, 12, 19));
        assert!((plan.total() - 10.0).abs() < TOLERANCE);
    }
}
