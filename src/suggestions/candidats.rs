use super::score::Effet;
use super::types::{Candidat, Changement, Suggestion, TypeSuggestion};
use super::SuggestionEngine;
use crate::calendar::{jour_ouvrable_precedent, jour_ouvrable_suivant};
use crate::model::TimeSegment;
use crate::repartition::{capacite_libre, repartir_sur_jours, round4, verifier_plan, TOLERANCE};
use crate::window::{duree_heures, plages_libres, Plage, WorkingWindow};
use chrono::{NaiveDate, NaiveTime};
use std::cmp::Ordering;

/// Recherche d'un jour ouvrable voisin, en jours civils.
const LIMITE_JOURS: u32 = 14;

impl SuggestionEngine<'_> {
    /// Déplace `cible` vers le créneau libre le plus proche : même jour, puis
    /// jour ouvrable suivant, puis précédent.
    pub(super) fn deplacer(&self, cible: &TimeSegment, fenetre: &WorkingWindow) -> Option<Suggestion> {
        let duree = cible.plage().heures();
        let mut jours = vec![cible.date];
        jours.extend(self.jours_voisins(cible.date));

        for date in jours {
            let Some(cadre) = self.cadre(fenetre, cible, date) else {
                continue;
            };
            let autres = self.autres_segments(cible, date);
            if capacite_libre(fenetre, &autres) + TOLERANCE < cible.heures {
                continue;
            }
            let libres = plages_libres(cadre, &plages_occupees(&autres));
            if let Some(plage) = meilleur_creneau(&libres, duree, cible.debut) {
                let effet = Effet {
                    heures: cible.heures,
                    jours: if date == cible.date { 1 } else { 2 },
                    marge_reduite: marge_reduite(cible, date, plage.fin),
                    autre_traducteur: false,
                };
                return Some(self.suggestion(
                    TypeSuggestion::Deplacer,
                    cible,
                    Changement::Deplacer { date, plage },
                    effet,
                ));
            }
        }
        None
    }

    /// Garde `conserve` sur la journée d'origine et reporte le reste sur un jour voisin.
    pub(super) fn scinder(
        &self,
        cible: &TimeSegment,
        fenetre: &WorkingWindow,
        conserve: Plage,
        heures_conservees: f64,
    ) -> Option<Suggestion> {
        if !cible.fractionnable {
            return None;
        }
        let heures_reportees = round4(cible.heures - heures_conservees);
        if heures_reportees <= TOLERANCE || heures_conservees <= TOLERANCE {
            return None;
        }

        for date in self.jours_voisins(cible.date) {
            let Some(cadre) = self.cadre(fenetre, cible, date) else {
                continue;
            };
            let autres = self.autres_segments(cible, date);
            if capacite_libre(fenetre, &autres) + TOLERANCE < heures_reportees {
                continue;
            }
            let libres = plages_libres(cadre, &plages_occupees(&autres));
            // plus tôt possible après, plus tard possible avant
            let vise = if date > cible.date { cadre.debut } else { cadre.fin };
            if let Some(plage_report) = meilleur_creneau(&libres, heures_reportees, vise) {
                let effet = Effet {
                    heures: heures_reportees,
                    jours: 2,
                    marge_reduite: marge_reduite(cible, date, plage_report.fin),
                    autre_traducteur: false,
                };
                return Some(self.suggestion(
                    TypeSuggestion::Scinder,
                    cible,
                    Changement::Scinder {
                        conserve,
                        heures_conservees,
                        date_report: date,
                        plage_report,
                        heures_reportees,
                    },
                    effet,
                ));
            }
        }
        None
    }

    /// Un traducteur du bassin libre sur la même plage, avec la capacité voulue.
    pub(super) fn reassigner(&self, cible: &TimeSegment) -> Vec<Suggestion> {
        self.candidats
            .candidats(cible)
            .into_iter()
            .filter(|c| c.traducteur != cible.traducteur && candidat_convient(c, cible))
            .map(|c| {
                let effet = Effet {
                    heures: cible.heures,
                    jours: 1,
                    marge_reduite: false,
                    autre_traducteur: true,
                };
                self.suggestion(
                    TypeSuggestion::Reassigner,
                    cible,
                    Changement::Reassigner {
                        traducteur: Some(c.traducteur),
                        nom: Some(c.nom),
                    },
                    effet,
                )
            })
            .collect()
    }

    /// Retire `heures` de la journée de `cible` et les répartit également sur
    /// les deux jours ouvrables voisins qui ont de la capacité.
    pub(super) fn reduire(
        &self,
        cible: &TimeSegment,
        fenetre: &WorkingWindow,
        heures: f64,
    ) -> Option<Suggestion> {
        let retirees = round4(heures.min(cible.heures));
        if retirees <= TOLERANCE {
            return None;
        }

        let jours = self.jours_de_report(cible, fenetre, retirees)?;
        let capacite = jours.iter().map(|(_, c)| *c).fold(f64::INFINITY, f64::min);
        let fenetre_report = fenetre.avec_capacite(capacite).ok()?;
        let dates: Vec<NaiveDate> = jours.iter().map(|(d, _)| *d).collect();
        let mut plan = repartir_sur_jours(retirees, &dates, &fenetre_report).ok()?;

        for e in plan.entrees.iter_mut() {
            let cadre = self.cadre(fenetre, cible, e.date)?;
            let autres = self.autres_segments(cible, e.date);
            let libres = plages_libres(cadre, &plages_occupees(&autres));
            let plage = meilleur_creneau(&libres, e.heures, cadre.debut)?;
            e.debut = plage.debut;
            e.fin = plage.fin;
            e.plages = vec![plage];
        }
        verifier_plan(&plan, &fenetre_report).ok()?;

        let marge = cible.echeance.is_some() && plan.iter().any(|e| e.date > cible.date);
        let effet = Effet {
            heures: retirees,
            jours: 1 + plan.len() as u32,
            marge_reduite: marge,
            autre_traducteur: false,
        };
        Some(self.suggestion(
            TypeSuggestion::Reduire,
            cible,
            Changement::Reduire {
                heures_retirees: retirees,
                heures_restantes: round4(cible.heures - retirees),
                redistribution: plan,
            },
            effet,
        ))
    }

    /// Jusqu'à deux jours ouvrables consécutifs, après puis avant la journée de `cible`,
    /// dont la capacité libre suffit à absorber `heures`.
    fn jours_de_report(
        &self,
        cible: &TimeSegment,
        fenetre: &WorkingWindow,
        heures: f64,
    ) -> Option<Vec<(NaiveDate, f64)>> {
        type Pas = fn(NaiveDate, &dyn crate::calendar::HolidayCalendar, u32) -> Option<NaiveDate>;
        let sens: [Pas; 2] = [jour_ouvrable_suivant, jour_ouvrable_precedent];

        for pas in sens {
            let mut out = Vec::new();
            let mut d = cible.date;
            for _ in 0..2 {
                let Some(suivant) = pas(d, self.feries, LIMITE_JOURS) else {
                    break;
                };
                d = suivant;
                if self.cadre(fenetre, cible, d).is_none() {
                    break;
                }
                let libre = capacite_libre(fenetre, &self.autres_segments(cible, d));
                if libre > TOLERANCE {
                    out.push((d, libre));
                }
            }
            if out.is_empty() {
                continue;
            }
            let min = out.iter().map(|(_, c)| *c).fold(f64::INFINITY, f64::min);
            if min * out.len() as f64 + TOLERANCE >= heures {
                out.sort_by_key(|(d, _)| *d);
                return Some(out);
            }
        }
        None
    }

    fn jours_voisins(&self, date: NaiveDate) -> Vec<NaiveDate> {
        [
            jour_ouvrable_suivant(date, self.feries, LIMITE_JOURS),
            jour_ouvrable_precedent(date, self.feries, LIMITE_JOURS),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Fenêtre utilisable pour `cible` le jour `date` : bornée par son échéance
    /// et par la date de référence.
    fn cadre(&self, fenetre: &WorkingWindow, cible: &TimeSegment, date: NaiveDate) -> Option<Plage> {
        if self.reference.is_some_and(|r| date < r) {
            return None;
        }
        let mut cadre = fenetre.plage();
        if let Some(e) = cible.echeance {
            if date > e.date() {
                return None;
            }
            if date == e.date() {
                cadre.fin = cadre.fin.min(e.time());
            }
        }
        (cadre.debut < cadre.fin).then_some(cadre)
    }

    /// Segments de la journée, la cible exclue.
    fn autres_segments(&self, cible: &TimeSegment, date: NaiveDate) -> Vec<TimeSegment> {
        self.lookup
            .segments_du_jour(&cible.traducteur, date)
            .into_iter()
            .filter(|s| !meme_segment(s, cible))
            .collect()
    }
}

pub(super) fn meme_segment(a: &TimeSegment, b: &TimeSegment) -> bool {
    a.source == b.source && a.date == b.date && a.debut == b.debut && a.fin == b.fin
}

/// Le moins prioritaire d'abord : priorité basse, puis échéance la plus lointaine.
pub(super) fn moins_prioritaire(a: &TimeSegment, b: &TimeSegment) -> Ordering {
    a.priorite
        .cmp(&b.priorite)
        .then_with(|| match (a.echeance, b.echeance) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => y.cmp(&x),
        })
        .then_with(|| a.source.cmp(&b.source))
}

fn plages_occupees(segments: &[TimeSegment]) -> Vec<Plage> {
    segments
        .iter()
        .filter(|s| s.est_occupant())
        .map(TimeSegment::plage)
        .collect()
}

/// Créneau de `duree` heures dont le début est le plus proche de `vise`.
fn meilleur_creneau(libres: &[Plage], duree: f64, vise: NaiveTime) -> Option<Plage> {
    let d = duree_heures(duree);
    libres
        .iter()
        .filter_map(|g| {
            let dernier_debut = g.fin - d;
            if dernier_debut < g.debut || g.heures() + 1e-9 < duree {
                return None;
            }
            let debut = vise.clamp(g.debut, dernier_debut);
            Some(Plage::new(debut, debut + d))
        })
        .min_by_key(|p| (p.debut - vise).num_seconds().abs())
}

fn marge_reduite(cible: &TimeSegment, date: NaiveDate, fin: NaiveTime) -> bool {
    cible.echeance.is_some() && date.and_time(fin) > cible.date.and_time(cible.fin)
}

fn candidat_convient(c: &Candidat, cible: &TimeSegment) -> bool {
    let plage = cible.plage();
    if plage.debut < c.fenetre.debut() || plage.fin > c.fenetre.fin() {
        return false;
    }
    let jour: Vec<TimeSegment> = c
        .segments
        .iter()
        .filter(|s| s.date == cible.date && s.est_occupant())
        .cloned()
        .collect();
    jour.iter().all(|s| !s.plage().chevauche(&plage))
        && capacite_libre(&c.fenetre, &jour) + TOLERANCE >= cible.heures
}
