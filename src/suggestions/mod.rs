//! Moteur de suggestions : pour chaque conflit, des remèdes classés par impact.
//!
//! Le moteur ne fait que proposer ; l'application d'une suggestion revient à
//! l'appelant, qui doit relire les segments avant d'écrire.

mod candidats;
mod score;
mod types;

pub use types::{
    AucunCandidat, Candidat, CandidatePool, Changement, ImpactWeights, ScoreImpact, Suggestion,
    TypeSuggestion,
};

use crate::calendar::HolidayCalendar;
use crate::conflicts::{Conflict, SegmentLookup, TypeConflit};
use crate::model::{NatureSegment, Planning, TimeSegment};
use crate::niveau::{Bandes, Niveau};
use crate::repartition::TOLERANCE;
use crate::window::{duree_heures, plages_libres, Plage};
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{debug, warn};
use uuid::Uuid;

/// Raccourci sans configuration : pondérations et bandes par défaut.
pub fn generer_suggestions(
    conflits: &[Conflict],
    lookup: &dyn SegmentLookup,
    candidats: &dyn CandidatePool,
    feries: &dyn HolidayCalendar,
) -> Vec<Suggestion> {
    SuggestionEngine::new(lookup, candidats, feries).generer_suggestions(conflits)
}

pub struct SuggestionEngine<'a> {
    lookup: &'a dyn SegmentLookup,
    candidats: &'a dyn CandidatePool,
    feries: &'a dyn HolidayCalendar,
    poids: ImpactWeights,
    bandes: Bandes,
    reference: Option<NaiveDate>,
}

impl<'a> SuggestionEngine<'a> {
    pub fn new(
        lookup: &'a dyn SegmentLookup,
        candidats: &'a dyn CandidatePool,
        feries: &'a dyn HolidayCalendar,
    ) -> Self {
        Self {
            lookup,
            candidats,
            feries,
            poids: ImpactWeights::default(),
            bandes: Bandes::impact(),
            reference: None,
        }
    }

    /// Le planning sert à la fois de source de segments et de bassin de candidats.
    pub fn pour_planning(planning: &'a Planning, feries: &'a dyn HolidayCalendar) -> Self {
        Self::new(planning, planning, feries)
    }

    pub fn avec_poids(mut self, poids: ImpactWeights) -> Self {
        self.poids = poids;
        self
    }

    pub fn avec_bandes(mut self, bandes: Bandes) -> Self {
        self.bandes = bandes;
        self
    }

    /// Aucun créneau proposé avant cette date.
    pub fn avec_reference(mut self, reference: Option<NaiveDate>) -> Self {
        self.reference = reference;
        self
    }

    /// Suggestions triées par impact croissant (la moins perturbante d'abord).
    ///
    /// Un conflit CRITIQUE sans remède réalisable produit une unique suggestion
    /// de réassignation marquée « intervention manuelle requise ».
    pub fn generer_suggestions(&self, conflits: &[Conflict]) -> Vec<Suggestion> {
        let mut out = Vec::new();
        let mut vus = HashSet::new();

        for conflit in conflits {
            let mut props = self.pour_conflit(conflit);
            if props.is_empty() && conflit.severite == Niveau::Critique {
                props.push(self.intervention_manuelle(conflit));
            }
            debug!(
                type_conflit = conflit.type_conflit.as_str(),
                date = %conflit.date,
                suggestions = props.len(),
                "conflit traité"
            );
            out.extend(props.into_iter().filter(|s| vus.insert(s.id)));
        }

        out.sort_by(|a, b| {
            a.impact
                .total
                .total_cmp(&b.impact.total)
                .then(a.type_suggestion.cmp(&b.type_suggestion))
                .then(a.id.cmp(&b.id))
        });
        out
    }

    fn pour_conflit(&self, conflit: &Conflict) -> Vec<Suggestion> {
        let fenetre = self.lookup.fenetre(&conflit.traducteur);
        if fenetre.is_none() {
            warn!(traducteur = %conflit.traducteur, "fenêtre inconnue: seules les réassignations sont évaluées");
        }
        let mut out = Vec::new();

        match conflit.type_conflit {
            TypeConflit::ChevauchementTacheTache => {
                let Some(b) = conflit.segment_b.as_ref() else {
                    return out;
                };
                let mut cibles = [&conflit.segment_a, b];
                cibles.sort_by(|x, y| candidats::moins_prioritaire(x, y));
                for (cible, autre) in [(cibles[0], cibles[1]), (cibles[1], cibles[0])] {
                    if let Some(f) = &fenetre {
                        out.extend(self.deplacer(cible, f));
                        if let Some((conserve, heures)) = hors_chevauchement(cible, autre) {
                            out.extend(self.scinder(cible, f, conserve, heures));
                        }
                    }
                    out.extend(self.reassigner(cible));
                }
                if let Some(f) = &fenetre {
                    out.extend(self.reduire(cibles[0], f, conflit.chevauchement_heures));
                }
            }
            TypeConflit::ChevauchementTacheBlocage => {
                let cible = &conflit.segment_a;
                if let Some(f) = &fenetre {
                    out.extend(self.deplacer(cible, f));
                    if let Some((conserve, heures)) = conflit
                        .segment_b
                        .as_ref()
                        .and_then(|blocage| hors_chevauchement(cible, blocage))
                    {
                        out.extend(self.scinder(cible, f, conserve, heures));
                    }
                }
                out.extend(self.reassigner(cible));
            }
            TypeConflit::CapaciteDepassee => {
                let cible = self.tache_a_alleger(conflit);
                let exces = conflit.chevauchement_heures;
                if let Some(f) = &fenetre {
                    if let Some((conserve, heures)) = raccourcie(&cible, exces) {
                        out.extend(self.scinder(&cible, f, conserve, heures));
                    }
                    out.extend(self.reduire(&cible, f, exces));
                    out.extend(self.deplacer(&cible, f));
                }
                out.extend(self.reassigner(&cible));
            }
            TypeConflit::ChevauchementBlocageBlocage => {}
        }
        out
    }

    /// Tâche la moins prioritaire de la journée en surcharge.
    fn tache_a_alleger(&self, conflit: &Conflict) -> TimeSegment {
        let mut taches: Vec<TimeSegment> = self
            .lookup
            .segments_du_jour(&conflit.traducteur, conflit.date)
            .into_iter()
            .filter(|s| s.nature == NatureSegment::Tache)
            .collect();
        taches.sort_by(candidats::moins_prioritaire);
        taches
            .into_iter()
            .next()
            .unwrap_or_else(|| conflit.segment_a.clone())
    }

    fn intervention_manuelle(&self, conflit: &Conflict) -> Suggestion {
        let cible = &conflit.segment_a;
        let effet = score::Effet {
            heures: cible.heures,
            jours: 1,
            marge_reduite: false,
            autre_traducteur: true,
        };
        let changement = types::Changement::Reassigner {
            traducteur: None,
            nom: None,
        };
        Suggestion {
            id: suggestion_id(TypeSuggestion::Reassigner, cible, &changement),
            type_suggestion: TypeSuggestion::Reassigner,
            segment_cible: cible.clone(),
            changement,
            impact: score::evaluer_manuel(effet, &self.poids, &self.bandes),
        }
    }

    fn suggestion(
        &self,
        type_suggestion: TypeSuggestion,
        cible: &TimeSegment,
        changement: Changement,
        effet: score::Effet,
    ) -> Suggestion {
        Suggestion {
            id: suggestion_id(type_suggestion, cible, &changement),
            type_suggestion,
            segment_cible: cible.clone(),
            changement,
            impact: score::evaluer(effet, &self.poids, &self.bandes),
        }
    }
}

/// Identifiant stable : même conflit, même remède, même id.
fn suggestion_id(type_suggestion: TypeSuggestion, cible: &TimeSegment, changement: &Changement) -> Uuid {
    let cle = format!(
        "{}|{}|{}|{}|{}|{:?}",
        type_suggestion.as_str(),
        cible.traducteur,
        cible.source,
        cible.date,
        cible.debut,
        changement
    );
    Uuid::new_v5(&Uuid::NAMESPACE_OID, cle.as_bytes())
}

/// Plus longue portion de `cible` hors de `autre`, et les heures qu'elle porte.
fn hors_chevauchement(cible: &TimeSegment, autre: &TimeSegment) -> Option<(Plage, f64)> {
    let reste = plages_libres(cible.plage(), &[autre.plage()]);
    let plus_longue = reste
        .into_iter()
        .max_by(|a, b| a.heures().total_cmp(&b.heures()))?;
    let heures = plus_longue.heures().min(cible.heures);
    (heures > TOLERANCE).then_some((plus_longue, heures))
}

/// `cible` amputée de `exces` heures en fin de plage.
fn raccourcie(cible: &TimeSegment, exces: f64) -> Option<(Plage, f64)> {
    let heures = cible.heures - exces;
    if heures <= TOLERANCE || exces >= cible.plage().heures() {
        return None;
    }
    let conserve = Plage::new(cible.debut, cible.fin - duree_heures(exces));
    Some((conserve, heures))
}

impl CandidatePool for Planning {
    fn candidats(&self, segment: &TimeSegment) -> Vec<Candidat> {
        self.traducteurs
            .iter()
            .filter(|t| t.id != segment.traducteur)
            .filter(|t| segment.paire.as_deref().map_or(true, |p| t.maitrise(p)))
            .filter_map(|t| {
                let fenetre = t.fenetre().ok()?;
                Some(Candidat {
                    traducteur: t.id.clone(),
                    nom: t.nom.clone(),
                    fenetre,
                    segments: self.segments_du_jour(&t.id, segment.date),
                })
            })
            .collect()
    }
}
