//! Fenêtre de travail quotidienne d'un traducteur.
//!
//! L'horaire textuel (`"9h-17h"`, `"8h30-16h30"`, `"08:00-16:00"`, `"9h à 17h"`)
//! est analysé une seule fois ; le reste du code manipule des [`WorkingWindow`].

use chrono::{Duration, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WindowError {
    #[error("horaire illisible: {0:?}")]
    Malformed(String),
    #[error("heure invalide: {0:?}")]
    InvalidClock(String),
    #[error("window end must be after start")]
    EndBeforeStart,
    #[error("daily capacity {capacite}h must be > 0 and <= window length {duree}h")]
    InvalidCapacity { capacite: f64, duree: f64 },
}

/// Intervalle d'horloge semi-ouvert `[debut, fin)` sur une même journée.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plage {
    pub debut: NaiveTime,
    pub fin: NaiveTime,
}

impl Plage {
    pub fn new(debut: NaiveTime, fin: NaiveTime) -> Self {
        Self { debut, fin }
    }

    pub fn heures(&self) -> f64 {
        heures_entre(self.debut, self.fin)
    }

    pub fn chevauche(&self, autre: &Plage) -> bool {
        self.debut < autre.fin && autre.debut < self.fin
    }

    pub fn intersection(&self, autre: &Plage) -> Option<Plage> {
        let debut = self.debut.max(autre.debut);
        let fin = self.fin.min(autre.fin);
        (debut < fin).then_some(Plage { debut, fin })
    }
}

impl fmt::Display for Plage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.debut.format("%H:%M"), self.fin.format("%H:%M"))
    }
}

/// Heures décimales entre deux heures d'horloge (négatif si `b < a`).
pub fn heures_entre(a: NaiveTime, b: NaiveTime) -> f64 {
    (b - a).num_seconds() as f64 / 3600.0
}

/// Durée chrono arrondie à la seconde.
pub fn duree_heures(heures: f64) -> Duration {
    Duration::seconds((heures * 3600.0).round() as i64)
}

/// Retire de `cadre` les plages occupées ; résultat trié et disjoint.
pub fn plages_libres(cadre: Plage, occupees: &[Plage]) -> Vec<Plage> {
    let mut occ: Vec<Plage> = occupees.iter().filter_map(|p| p.intersection(&cadre)).collect();
    occ.sort_by_key(|p| p.debut);

    let mut libres = Vec::new();
    let mut curseur = cadre.debut;
    for p in occ {
        if p.debut > curseur {
            libres.push(Plage::new(curseur, p.debut));
        }
        curseur = curseur.max(p.fin);
    }
    if curseur < cadre.fin {
        libres.push(Plage::new(curseur, cadre.fin));
    }
    libres
}

/// Horaire quotidien et capacité d'un traducteur. Immuable une fois construit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FenetreBrute", into = "FenetreBrute")]
pub struct WorkingWindow {
    debut: NaiveTime,
    fin: NaiveTime,
    capacite_jour: f64,
}

impl WorkingWindow {
    /// `capacite` absente : la capacité vaut la longueur de la fenêtre.
    pub fn new(debut: NaiveTime, fin: NaiveTime, capacite: Option<f64>) -> Result<Self, WindowError> {
        if fin <= debut {
            return Err(WindowError::EndBeforeStart);
        }
        let duree = heures_entre(debut, fin);
        let capacite_jour = capacite.unwrap_or(duree);
        if !capacite_jour.is_finite() || capacite_jour <= 0.0 || capacite_jour > duree + 1e-9 {
            return Err(WindowError::InvalidCapacity { capacite: capacite_jour, duree });
        }
        Ok(Self { debut, fin, capacite_jour })
    }

    pub fn parse(horaire: &str, capacite: Option<f64>) -> Result<Self, WindowError> {
        let (debut, fin) = parse_horaire(horaire)?;
        Self::new(debut, fin, capacite)
    }

    /// Même fenêtre, capacité différente (bornée à la longueur de la fenêtre).
    pub fn avec_capacite(&self, capacite: f64) -> Result<Self, WindowError> {
        Self::new(self.debut, self.fin, Some(capacite))
    }

    pub fn debut(&self) -> NaiveTime {
        self.debut
    }

    pub fn fin(&self) -> NaiveTime {
        self.fin
    }

    pub fn capacite_jour(&self) -> f64 {
        self.capacite_jour
    }

    pub fn duree(&self) -> f64 {
        heures_entre(self.debut, self.fin)
    }

    pub fn plage(&self) -> Plage {
        Plage::new(self.debut, self.fin)
    }

    /// `heures` à partir du début de la fenêtre (bornées à la fin).
    pub fn plage_depuis_debut(&self, heures: f64) -> Plage {
        let fin = (self.debut + duree_heures(heures)).min(self.fin);
        Plage::new(self.debut, fin)
    }

    /// `heures` se terminant à `fin` (bornées au début de la fenêtre).
    pub fn plage_avant(&self, fin: NaiveTime, heures: f64) -> Plage {
        let fin = fin.min(self.fin);
        let debut = if heures_entre(self.debut, fin) <= heures {
            self.debut
        } else {
            fin - duree_heures(heures)
        };
        Plage::new(debut, fin)
    }
}

impl FromStr for WorkingWindow {
    type Err = WindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, None)
    }
}

impl fmt::Display for WorkingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}h/jour)", self.plage(), self.capacite_jour)
    }
}

#[derive(Serialize, Deserialize)]
struct FenetreBrute {
    debut: NaiveTime,
    fin: NaiveTime,
    #[serde(default)]
    capacite_jour: Option<f64>,
}

impl TryFrom<FenetreBrute> for WorkingWindow {
    type Error = WindowError;

    fn try_from(b: FenetreBrute) -> Result<Self, Self::Error> {
        WorkingWindow::new(b.debut, b.fin, b.capacite_jour)
    }
}

impl From<WorkingWindow> for FenetreBrute {
    fn from(w: WorkingWindow) -> Self {
        Self {
            debut: w.debut,
            fin: w.fin,
            capacite_jour: Some(w.capacite_jour),
        }
    }
}

fn parse_horaire(raw: &str) -> Result<(NaiveTime, NaiveTime), WindowError> {
    let norm = raw.trim().to_lowercase();
    let (a, b) = norm
        .split_once('-')
        .or_else(|| norm.split_once(" à "))
        .or_else(|| norm.split_once(" a "))
        .ok_or_else(|| WindowError::Malformed(raw.to_string()))?;
    Ok((parse_heure(a.trim())?, parse_heure(b.trim())?))
}

/// `9h`, `9h30`, `09:00`, `17h00`, `9`.
pub fn parse_heure(raw: &str) -> Result<NaiveTime, WindowError> {
    let invalid = || WindowError::InvalidClock(raw.to_string());
    let (h, m) = match raw.split_once(['h', ':']) {
        Some((h, m)) => (h, if m.is_empty() { "0" } else { m }),
        None => (raw, "0"),
    };
    let h: u32 = h.trim().parse().map_err(|_| invalid())?;
    let m: u32 = m.trim().parse().map_err(|_| invalid())?;
    if h == 24 && m == 0 {
        // 24h : dernière seconde représentable de la journée
        return NaiveTime::from_hms_opt(23, 59, 59).ok_or_else(invalid);
    }
    NaiveTime::from_hms_opt(h, m, 0).ok_or_else(invalid)
}

/// Heure d'horloge au format `HH:MM`.
pub fn format_heure(t: NaiveTime) -> String {
    if t.second() == 0 {
        t.format("%H:%M").to_string()
    } else {
        t.format("%H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn parses_french_and_clock_notations() {
        let w = WorkingWindow::parse("9h-17h", Some(7.0)).unwrap();
        assert_eq!((w.debut(), w.fin()), (t(9, 0), t(17, 0)));
        assert_eq!(w.capacite_jour(), 7.0);

        let w: WorkingWindow = "8h30-16h30".parse().unwrap();
        assert_eq!(w.debut(), t(8, 30));
        assert_eq!(w.capacite_jour(), 8.0);

        let w: WorkingWindow = "08:00 - 16:00".parse().unwrap();
        assert_eq!(w.fin(), t(16, 0));

        let w: WorkingWindow = "9h à 17h".parse().unwrap();
        assert_eq!(w.debut(), t(9, 0));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!("neuf heures".parse::<WorkingWindow>(), Err(WindowError::Malformed(_))));
        assert!(matches!("25h-26h".parse::<WorkingWindow>(), Err(WindowError::InvalidClock(_))));
        assert_eq!("17h-9h".parse::<WorkingWindow>(), Err(WindowError::EndBeforeStart));
        assert!(matches!(
            WorkingWindow::parse("9h-12h", Some(4.0)),
            Err(WindowError::InvalidCapacity { .. })
        ));
    }

    #[test]
    fn clock_ranges_are_clamped_to_window() {
        let w = WorkingWindow::parse("8h-16h", Some(7.0)).unwrap();
        assert_eq!(w.plage_avant(t(16, 0), 7.0), Plage::new(t(9, 0), t(16, 0)));
        assert_eq!(w.plage_avant(t(10, 0), 5.0), Plage::new(t(8, 0), t(10, 0)));
        assert_eq!(w.plage_depuis_debut(4.0), Plage::new(t(8, 0), t(12, 0)));
    }

    #[test]
    fn free_ranges_subtract_occupied() {
        let cadre = Plage::new(t(8, 0), t(16, 0));
        let libres = plages_libres(
            cadre,
            &[Plage::new(t(12, 0), t(13, 0)), Plage::new(t(7, 0), t(9, 0))],
        );
        assert_eq!(
            libres,
            vec![Plage::new(t(9, 0), t(12, 0)), Plage::new(t(13, 0), t(16, 0))]
        );
    }

    #[test]
    fn serde_validates_on_the_way_in() {
        let ok: WorkingWindow =
            serde_json::from_str(r#"{"debut":"09:00:00","fin":"17:00:00","capacite_jour":7.0}"#)
                .unwrap();
        assert_eq!(ok.capacite_jour(), 7.0);
        let bad = serde_json::from_str::<WorkingWindow>(r#"{"debut":"17:00:00","fin":"09:00:00"}"#);
        assert!(bad.is_err());
    }
}
