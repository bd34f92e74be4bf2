//! Jours ouvrables : fins de semaine et jours fériés.
//!
//! Tout est en dates civiles (`NaiveDate`) ; le fuseau est l'affaire de l'appelant.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Source de jours fériés (collaborateur externe).
pub trait HolidayCalendar {
    fn est_ferie(&self, date: NaiveDate) -> bool;
}

/// Aucun jour férié.
#[derive(Debug, Default, Clone, Copy)]
pub struct SansFeries;

impl HolidayCalendar for SansFeries {
    fn est_ferie(&self, _date: NaiveDate) -> bool {
        false
    }
}

/// Liste explicite de jours fériés, éventuellement combinée au calendrier québécois.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoursFeries {
    #[serde(default)]
    pub dates: BTreeSet<NaiveDate>,
    #[serde(default)]
    pub feries_quebec: bool,
}

impl JoursFeries {
    pub fn new<I: IntoIterator<Item = NaiveDate>>(dates: I) -> Self {
        Self {
            dates: dates.into_iter().collect(),
            feries_quebec: false,
        }
    }

    pub fn avec_quebec(mut self) -> Self {
        self.feries_quebec = true;
        self
    }
}

impl HolidayCalendar for JoursFeries {
    fn est_ferie(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date) || (self.feries_quebec && FeriesQuebec.est_ferie(date))
    }
}

/// Jours fériés statutaires du Québec, calculés pour n'importe quelle année.
#[derive(Debug, Default, Clone, Copy)]
pub struct FeriesQuebec;

impl FeriesQuebec {
    pub fn pour_annee(annee: i32) -> Vec<NaiveDate> {
        let mut out = Vec::with_capacity(10);
        let fixe = |m, d| NaiveDate::from_ymd_opt(annee, m, d);

        out.extend(fixe(1, 1));
        if let Some(paques) = dimanche_de_paques(annee) {
            out.push(paques - Duration::days(2));
            out.push(paques + Duration::days(1));
        }
        // Patriotes : lundi précédant le 25 mai
        if let Some(mut d) = fixe(5, 24) {
            while d.weekday() != Weekday::Mon {
                d = d - Duration::days(1);
            }
            out.push(d);
        }
        out.extend(fixe(6, 24));
        out.extend(fixe(7, 1));
        out.extend(NaiveDate::from_weekday_of_month_opt(annee, 9, Weekday::Mon, 1));
        out.extend(NaiveDate::from_weekday_of_month_opt(annee, 10, Weekday::Mon, 2));
        out.extend(fixe(12, 25));
        out.sort();
        out
    }
}

impl HolidayCalendar for FeriesQuebec {
    fn est_ferie(&self, date: NaiveDate) -> bool {
        Self::pour_annee(date.year()).contains(&date)
    }
}

/// Dimanche de Pâques (algorithme grégorien anonyme).
fn dimanche_de_paques(annee: i32) -> Option<NaiveDate> {
    let a = annee % 19;
    let b = annee / 100;
    let c = annee % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let mois = (h + l - 7 * m + 114) / 31;
    let jour = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(annee, mois as u32, jour as u32)
}

pub fn est_fin_de_semaine(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn est_jour_ouvrable(date: NaiveDate, feries: &dyn HolidayCalendar) -> bool {
    !est_fin_de_semaine(date) && !feries.est_ferie(date)
}

/// Jour admissible à une allocation : ouvrable, ou simplement non férié si
/// les fins de semaine sont permises.
pub fn est_jour_admissible(
    date: NaiveDate,
    feries: &dyn HolidayCalendar,
    inclure_fins_de_semaine: bool,
) -> bool {
    if inclure_fins_de_semaine {
        !feries.est_ferie(date)
    } else {
        est_jour_ouvrable(date, feries)
    }
}

/// Jours ouvrables de `[debut, fin]`, en ordre croissant. Vide si `fin < debut`.
pub fn jours_ouvrables(
    debut: NaiveDate,
    fin: NaiveDate,
    feries: &dyn HolidayCalendar,
) -> Vec<NaiveDate> {
    jours_admissibles(debut, fin, feries, false)
}

pub fn jours_admissibles(
    debut: NaiveDate,
    fin: NaiveDate,
    feries: &dyn HolidayCalendar,
    inclure_fins_de_semaine: bool,
) -> Vec<NaiveDate> {
    debut
        .iter_days()
        .take_while(|d| *d <= fin)
        .filter(|d| est_jour_admissible(*d, feries, inclure_fins_de_semaine))
        .collect()
}

/// Premier jour ouvrable strictement avant `date`, en remontant au plus `limite` jours civils.
pub fn jour_ouvrable_precedent(
    date: NaiveDate,
    feries: &dyn HolidayCalendar,
    limite: u32,
) -> Option<NaiveDate> {
    let mut d = date;
    for _ in 0..limite {
        d = d.pred_opt()?;
        if est_jour_ouvrable(d, feries) {
            return Some(d);
        }
    }
    None
}

/// Premier jour ouvrable strictement après `date`.
pub fn jour_ouvrable_suivant(
    date: NaiveDate,
    feries: &dyn HolidayCalendar,
    limite: u32,
) -> Option<NaiveDate> {
    let mut d = date;
    for _ in 0..limite {
        d = d.succ_opt()?;
        if est_jour_ouvrable(d, feries) {
            return Some(d);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn business_days_skip_weekend() {
        let jours = jours_ouvrables(date(2025, 12, 8), date(2025, 12, 16), &SansFeries);
        assert_eq!(jours.len(), 7);
        assert!(jours.iter().all(|d| !est_fin_de_semaine(*d)));
        assert_eq!(jours.first(), Some(&date(2025, 12, 8)));
        assert_eq!(jours.last(), Some(&date(2025, 12, 16)));
    }

    #[test]
    fn reversed_range_is_empty() {
        assert!(jours_ouvrables(date(2025, 12, 12), date(2025, 12, 8), &SansFeries).is_empty());
    }

    #[test]
    fn explicit_holidays_are_removed() {
        let feries = JoursFeries::new([date(2025, 12, 10)]);
        let jours = jours_ouvrables(date(2025, 12, 8), date(2025, 12, 12), &feries);
        assert_eq!(jours.len(), 4);
        assert!(!jours.contains(&date(2025, 12, 10)));
    }

    #[test]
    fn quebec_holidays_2025() {
        let f = FeriesQuebec::pour_annee(2025);
        assert!(f.contains(&date(2025, 4, 18)));
        assert!(f.contains(&date(2025, 4, 21)));
        assert!(f.contains(&date(2025, 5, 19)));
        assert!(f.contains(&date(2025, 9, 1)));
        assert!(f.contains(&date(2025, 10, 13)));
        assert!(f.contains(&date(2025, 12, 25)));
        assert!(!FeriesQuebec.est_ferie(date(2025, 12, 23)));
    }

    #[test]
    fn previous_business_day_crosses_weekend() {
        // lundi 2025-12-08 -> vendredi 2025-12-05
        assert_eq!(
            jour_ouvrable_precedent(date(2025, 12, 8), &SansFeries, 10),
            Some(date(2025, 12, 5))
        );
        assert_eq!(
            jour_ouvrable_suivant(date(2025, 12, 12), &SansFeries, 10),
            Some(date(2025, 12, 15))
        );
    }
}
