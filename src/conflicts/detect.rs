use super::types::{Conflict, ConflictError, DetectionOptions, TypeConflit};
use crate::model::{NatureSegment, TimeSegment, TraducteurId};
use crate::niveau::Niveau;
use crate::repartition::{round4, TOLERANCE};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use tracing::debug;

pub(super) fn detecter_conflits(
    segments: &[TimeSegment],
    opts: &DetectionOptions,
) -> Result<Vec<Conflict>, ConflictError> {
    for s in segments {
        s.validate()?;
    }

    let mut jours: BTreeMap<(&TraducteurId, NaiveDate), Vec<&TimeSegment>> = BTreeMap::new();
    for s in segments.iter().filter(|s| s.est_occupant()) {
        jours.entry((&s.traducteur, s.date)).or_default().push(s);
    }

    let mut out = Vec::new();
    for ((traducteur, date), mut jour) in jours {
        jour.sort_by(|a, b| {
            a.debut
                .cmp(&b.debut)
                .then(a.fin.cmp(&b.fin))
                .then_with(|| a.source.cmp(&b.source))
        });

        // balayage : seuls les successeurs qui démarrent avant la fin de `a` peuvent chevaucher
        for (idx, a) in jour.iter().enumerate() {
            for b in jour.iter().skip(idx + 1).take_while(|b| b.debut < a.fin) {
                out.push(classer_chevauchement(a, b, opts));
            }
        }

        if let Some(fenetre) = opts.fenetre_de(traducteur) {
            if let Some(c) = verifier_capacite(&jour, fenetre.capacite_jour()) {
                out.push(c);
            }
        }

        debug!(traducteur = %traducteur, date = %date, segments = jour.len(), "journée analysée");
    }

    Ok(out)
}

fn classer_chevauchement(a: &TimeSegment, b: &TimeSegment, opts: &DetectionOptions) -> Conflict {
    let commun = a
        .plage()
        .intersection(&b.plage())
        .map(|p| p.heures())
        .unwrap_or(0.0);

    let (type_conflit, severite, premier, second) = match (a.nature, b.nature) {
        (NatureSegment::Tache, NatureSegment::Tache) => {
            let ratio = (commun / a.plage().heures()).max(commun / b.plage().heures());
            let mut severite = opts.bandes_chevauchement.classer(ratio);
            if sous_pression(a, opts.reference) || sous_pression(b, opts.reference) {
                severite = severite.escalader();
            }
            (TypeConflit::ChevauchementTacheTache, severite, a, b)
        }
        (NatureSegment::Tache, _) => (TypeConflit::ChevauchementTacheBlocage, Niveau::Critique, a, b),
        (_, NatureSegment::Tache) => (TypeConflit::ChevauchementTacheBlocage, Niveau::Critique, b, a),
        _ => (TypeConflit::ChevauchementBlocageBlocage, Niveau::Faible, a, b),
    };

    let explication = match type_conflit {
        TypeConflit::ChevauchementTacheBlocage => format!(
            "la tâche {} ({}) empiète de {:.2}h sur le blocage {} ({}) le {}",
            premier.source,
            premier.plage(),
            commun,
            second.source,
            second.plage(),
            premier.date
        ),
        TypeConflit::ChevauchementBlocageBlocage => format!(
            "les blocages {} et {} se recouvrent de {:.2}h le {}",
            premier.source, second.source, commun, premier.date
        ),
        _ => format!(
            "les tâches {} ({}) et {} ({}) se chevauchent de {:.2}h le {}",
            premier.source,
            premier.plage(),
            second.source,
            second.plage(),
            commun,
            premier.date
        ),
    };

    Conflict {
        type_conflit,
        traducteur: premier.traducteur.clone(),
        date: premier.date,
        segment_a: premier.clone(),
        segment_b: Some(second.clone()),
        chevauchement_heures: round4(commun),
        severite,
        explication,
    }
}

/// Échéance dépassée ou au plus tard le lendemain du segment (ou de la référence).
fn sous_pression(seg: &TimeSegment, reference: Option<NaiveDate>) -> bool {
    let Some(echeance) = seg.echeance.map(|e| e.date()) else {
        return false;
    };
    let lendemain = |d: NaiveDate| d + Duration::days(1);
    echeance <= lendemain(seg.date) || reference.is_some_and(|r| echeance <= lendemain(r))
}

fn verifier_capacite(jour: &[&TimeSegment], capacite: f64) -> Option<Conflict> {
    let plus_grosse_tache = jour
        .iter()
        .filter(|s| s.nature == NatureSegment::Tache)
        .max_by(|a, b| a.heures.total_cmp(&b.heures).then(b.debut.cmp(&a.debut)))?;

    let occupe: f64 = jour.iter().map(|s| s.heures).sum();
    let exces = occupe - capacite;
    if exces <= TOLERANCE {
        return None;
    }

    Some(Conflict {
        type_conflit: TypeConflit::CapaciteDepassee,
        traducteur: plus_grosse_tache.traducteur.clone(),
        date: plus_grosse_tache.date,
        segment_a: (*plus_grosse_tache).clone(),
        segment_b: None,
        chevauchement_heures: round4(exces),
        severite: Niveau::Eleve,
        explication: format!(
            "{:.2}h occupées le {} pour une capacité de {}h (excès {:.2}h)",
            occupe, plus_grosse_tache.date, capacite, exces
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceId;
    use crate::window::{Plage, WorkingWindow};
    use chrono::NaiveTime;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn jour() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 8).unwrap()
    }

    fn tache(src: &str, a: (u32, u32), b: (u32, u32)) -> TimeSegment {
        TimeSegment::tache(
            TraducteurId::new("t1"),
            jour(),
            Plage::new(t(a.0, a.1), t(b.0, b.1)),
            SourceId::new(src),
        )
        .unwrap()
    }

    fn blocage(src: &str, a: (u32, u32), b: (u32, u32)) -> TimeSegment {
        TimeSegment::blocage(
            TraducteurId::new("t1"),
            jour(),
            Plage::new(t(a.0, a.1), t(b.0, b.1)),
            SourceId::new(src),
        )
        .unwrap()
    }

    #[test]
    fn one_hour_task_overlap() {
        let segs = vec![tache("a", (9, 0), (11, 0)), tache("b", (10, 0), (12, 0))];
        let c = detecter_conflits(&segs, &DetectionOptions::default()).unwrap();
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].type_conflit, TypeConflit::ChevauchementTacheTache);
        assert!((c[0].chevauchement_heures - 1.0).abs() < TOLERANCE);
        // exactement 50 % de chaque segment
        assert_eq!(c[0].severite, Niveau::Moyen);
    }

    #[test]
    fn large_overlap_is_high() {
        let segs = vec![tache("a", (9, 0), (12, 0)), tache("b", (9, 30), (11, 0))];
        let c = detecter_conflits(&segs, &DetectionOptions::default()).unwrap();
        assert_eq!(c[0].severite, Niveau::Eleve);
    }

    #[test]
    fn near_deadline_escalates() {
        let echeance = NaiveDate::from_ymd_opt(2025, 12, 9).unwrap().and_time(t(12, 0));
        let segs = vec![
            tache("a", (9, 0), (11, 0)).avec_echeance(echeance),
            tache("b", (10, 0), (12, 0)),
        ];
        let c = detecter_conflits(&segs, &DetectionOptions::default()).unwrap();
        assert_eq!(c[0].severite, Niveau::Eleve);
    }

    #[test]
    fn task_inside_blackout_is_critical_and_task_first() {
        let segs = vec![blocage("b1", (8, 0), (17, 0)), tache("a", (10, 0), (11, 0))];
        let c = detecter_conflits(&segs, &DetectionOptions::default()).unwrap();
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].type_conflit, TypeConflit::ChevauchementTacheBlocage);
        assert_eq!(c[0].severite, Niveau::Critique);
        assert_eq!(c[0].segment_a.source.as_str(), "a");
    }

    #[test]
    fn overlapping_blackouts_are_low() {
        let segs = vec![blocage("b1", (8, 0), (10, 0)), blocage("b2", (9, 0), (11, 0))];
        let c = detecter_conflits(&segs, &DetectionOptions::default()).unwrap();
        assert_eq!(c[0].type_conflit, TypeConflit::ChevauchementBlocageBlocage);
        assert_eq!(c[0].severite, Niveau::Faible);
    }

    #[test]
    fn touching_endpoints_do_not_conflict() {
        let segs = vec![tache("a", (9, 0), (11, 0)), tache("b", (11, 0), (12, 0))];
        assert!(detecter_conflits(&segs, &DetectionOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn sweep_finds_every_pair_covered_by_a_long_segment() {
        let segs = vec![
            tache("long", (8, 0), (16, 0)),
            tache("x", (9, 0), (10, 0)),
            tache("y", (13, 0), (14, 0)),
        ];
        let c = detecter_conflits(&segs, &DetectionOptions::default()).unwrap();
        assert_eq!(c.len(), 2);
        assert!(c.iter().all(|c| c.segment_a.source.as_str() == "long"));
    }

    #[test]
    fn capacity_exceeded_without_overlap() {
        let fenetre = WorkingWindow::parse("8h-17h", Some(7.0)).unwrap();
        let segs = vec![
            tache("a", (8, 0), (12, 0)),
            tache("b", (12, 0), (16, 0)),
            tache("c", (16, 0), (16, 30)).avec_heures(0.25).unwrap(),
        ];
        let c = detecter_conflits(&segs, &DetectionOptions::default().avec_fenetre(fenetre)).unwrap();
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].type_conflit, TypeConflit::CapaciteDepassee);
        assert_eq!(c[0].severite, Niveau::Eleve);
        assert!((c[0].chevauchement_heures - 1.25).abs() < TOLERANCE);
        assert!(c[0].segment_b.is_none());
    }

    #[test]
    fn blackout_only_day_never_exceeds_capacity() {
        let fenetre = WorkingWindow::parse("8h-17h", Some(7.0)).unwrap();
        let segs = vec![blocage("conge", (8, 0), (17, 0))];
        let c = detecter_conflits(&segs, &DetectionOptions::default().avec_fenetre(fenetre)).unwrap();
        assert!(c.is_empty());
    }

    #[test]
    fn idle_segments_are_ignored() {
        let mut libre = tache("idle", (9, 0), (12, 0));
        libre.nature = NatureSegment::Libre;
        let segs = vec![libre, tache("a", (10, 0), (11, 0))];
        assert!(detecter_conflits(&segs, &DetectionOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn different_days_or_translators_do_not_conflict() {
        let mut autre = tache("b", (9, 0), (11, 0));
        autre.traducteur = TraducteurId::new("t2");
        let mut lendemain = tache("c", (9, 0), (11, 0));
        lendemain.date = jour() + Duration::days(1);
        let segs = vec![tache("a", (9, 0), (11, 0)), autre, lendemain];
        assert!(detecter_conflits(&segs, &DetectionOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn malformed_segment_is_rejected_before_sweep() {
        let mut bad = tache("bad", (9, 0), (11, 0));
        bad.fin = t(8, 0);
        let err = detecter_conflits(&[bad], &DetectionOptions::default()).unwrap_err();
        assert!(matches!(err, ConflictError::InvalidSegment(_)));
    }

    #[test]
    fn inputs_are_untouched_and_result_is_deterministic() {
        let segs = vec![tache("b", (10, 0), (12, 0)), tache("a", (9, 0), (11, 0))];
        let avant = segs.clone();
        let un = detecter_conflits(&segs, &DetectionOptions::default()).unwrap();
        let deux = detecter_conflits(&segs, &DetectionOptions::default()).unwrap();
        assert_eq!(segs, avant);
        assert_eq!(un, deux);
        assert_eq!(un[0].segment_a.source.as_str(), "a");
    }
}
