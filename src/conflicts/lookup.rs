use super::detect;
use super::types::{Conflict, ConflictError, DetectionOptions, TypeConflit};
use crate::model::{NatureSegment, Planning, SourceId, TimeSegment, TraducteurId};
use crate::window::WorkingWindow;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use tracing::warn;

/// Accès aux segments persistés (collaborateur externe).
pub trait SegmentLookup {
    /// Tous les segments issus d'une allocation ou d'un blocage.
    fn segments_source(&self, source: &SourceId) -> Vec<TimeSegment>;
    /// Instantané des segments d'un traducteur pour une journée.
    fn segments_du_jour(&self, traducteur: &TraducteurId, date: NaiveDate) -> Vec<TimeSegment>;
    fn fenetre(&self, traducteur: &TraducteurId) -> Option<WorkingWindow>;
}

impl SegmentLookup for Planning {
    fn segments_source(&self, source: &SourceId) -> Vec<TimeSegment> {
        self.segments
            .iter()
            .filter(|s| &s.source == source)
            .cloned()
            .collect()
    }

    fn segments_du_jour(&self, traducteur: &TraducteurId, date: NaiveDate) -> Vec<TimeSegment> {
        self.segments_de(traducteur, Some(date)).cloned().collect()
    }

    fn fenetre(&self, traducteur: &TraducteurId) -> Option<WorkingWindow> {
        let tr = self.find_traducteur_by_id(traducteur)?;
        match tr.fenetre() {
            Ok(f) => Some(f),
            Err(err) => {
                warn!(traducteur = %tr.nom, horaire = %tr.horaire, %err, "horaire illisible, capacité ignorée");
                None
            }
        }
    }
}

pub(super) fn detecter_conflits_pour_allocation(
    lookup: &dyn SegmentLookup,
    allocation: &SourceId,
    reference: Option<NaiveDate>,
) -> Result<Vec<Conflict>, ConflictError> {
    let segments: Vec<TimeSegment> = lookup
        .segments_source(allocation)
        .into_iter()
        .filter(|s| s.nature == NatureSegment::Tache)
        .collect();
    if segments.is_empty() {
        return Err(ConflictError::UnknownAllocation(allocation.as_str().to_string()));
    }
    detecter_pour_source(lookup, &segments, allocation, reference)
}

pub(super) fn detecter_conflits_pour_blocage(
    lookup: &dyn SegmentLookup,
    blocage: &SourceId,
    reference: Option<NaiveDate>,
) -> Result<Vec<Conflict>, ConflictError> {
    let segments: Vec<TimeSegment> = lookup
        .segments_source(blocage)
        .into_iter()
        .filter(|s| s.nature == NatureSegment::Blocage)
        .collect();
    if segments.is_empty() {
        return Err(ConflictError::UnknownBlocage(blocage.as_str().to_string()));
    }
    detecter_pour_source(lookup, &segments, blocage, reference)
}

/// Rejoue la détection sur chaque journée touchée par la source et ne garde que
/// les conflits qui l'impliquent, plus le dépassement de capacité de la journée.
fn detecter_pour_source(
    lookup: &dyn SegmentLookup,
    segments: &[TimeSegment],
    source: &SourceId,
    reference: Option<NaiveDate>,
) -> Result<Vec<Conflict>, ConflictError> {
    let jours: BTreeSet<(TraducteurId, NaiveDate)> = segments
        .iter()
        .map(|s| (s.traducteur.clone(), s.date))
        .collect();

    let mut out = Vec::new();
    for (traducteur, date) in jours {
        let jour = lookup.segments_du_jour(&traducteur, date);
        let mut opts = DetectionOptions::default().avec_reference(reference);
        if let Some(fenetre) = lookup.fenetre(&traducteur) {
            opts = opts.avec_fenetre_pour(traducteur.clone(), fenetre);
        }
        let conflits = detect::detecter_conflits(&jour, &opts)?;
        out.extend(
            conflits
                .into_iter()
                .filter(|c| c.implique(source) || c.type_conflit == TypeConflit::CapaciteDepassee),
        );
    }
    Ok(out)
}

/// Détection sur tout un planning (ou un seul traducteur), fenêtres comprises.
pub(super) fn detecter_conflits_planning(
    planning: &Planning,
    traducteur: Option<&TraducteurId>,
    reference: Option<NaiveDate>,
) -> Result<Vec<Conflict>, ConflictError> {
    let mut opts = DetectionOptions::default().avec_reference(reference);
    for tr in &planning.traducteurs {
        if let Some(f) = planning.fenetre(&tr.id) {
            opts = opts.avec_fenetre_pour(tr.id.clone(), f);
        }
    }
    let segments: Vec<TimeSegment> = planning
        .segments
        .iter()
        .filter(|s| traducteur.map_or(true, |t| &s.traducteur == t))
        .cloned()
        .collect();
    detect::detecter_conflits(&segments, &opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Traducteur;
    use chrono::NaiveTime;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, d).unwrap()
    }

    fn seg(src: &str, d: u32, a: u32, b: u32, nature: NatureSegment) -> TimeSegment {
        TimeSegment::new(
            TraducteurId::new("t1"),
            date(d),
            NaiveTime::from_hms_opt(a, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(b, 0, 0).unwrap(),
            nature,
            SourceId::new(src),
        )
        .unwrap()
    }

    fn planning() -> Planning {
        let mut tr = Traducteur::new("Ana", "8h-16h", Some(7.0));
        tr.id = TraducteurId::new("t1");
        Planning {
            traducteurs: vec![tr],
            segments: vec![
                seg("b", 8, 9, 10, NatureSegment::Blocage),
                seg("b", 9, 8, 9, NatureSegment::Blocage),
                seg("a", 8, 9, 11, NatureSegment::Tache),
                seg("a", 9, 13, 15, NatureSegment::Tache),
                seg("a", 10, 8, 10, NatureSegment::Tache),
                seg("c", 9, 14, 16, NatureSegment::Tache),
                seg("d", 10, 10, 16, NatureSegment::Tache),
                // sans rapport avec `a` ni `b`
                seg("x", 11, 9, 12, NatureSegment::Tache),
                seg("y", 11, 10, 11, NatureSegment::Tache),
            ],
        }
    }

    fn resume(conflits: &[Conflict]) -> Vec<(NaiveDate, TypeConflit)> {
        conflits.iter().map(|c| (c.date, c.type_conflit)).collect()
    }

    #[test]
    fn allocation_keeps_its_overlaps_and_day_capacity() {
        let planning = planning();
        let conflits = detecter_conflits_pour_allocation(&planning, &SourceId::new("a"), None).unwrap();
        assert_eq!(
            resume(&conflits),
            vec![
                (date(8), TypeConflit::ChevauchementTacheBlocage),
                (date(9), TypeConflit::ChevauchementTacheTache),
                (date(10), TypeConflit::CapaciteDepassee),
            ]
        );
        assert_eq!(conflits[1].segments().filter(|s| s.source.as_str() == "c").count(), 1);
        // le dépassement ne nomme que la plus grosse tâche
        assert_eq!(conflits[2].segment_a.source.as_str(), "d");
        assert!((conflits[2].chevauchement_heures - 1.0).abs() < 1e-4);
    }

    #[test]
    fn blocage_ignores_overlaps_between_other_tasks() {
        let planning = planning();
        let conflits = detecter_conflits_pour_blocage(&planning, &SourceId::new("b"), None).unwrap();
        assert_eq!(resume(&conflits), vec![(date(8), TypeConflit::ChevauchementTacheBlocage)]);
        assert!(conflits[0].implique(&SourceId::new("b")));
    }

    #[test]
    fn unknown_or_mismatched_sources_are_errors() {
        let planning = planning();
        assert!(matches!(
            detecter_conflits_pour_allocation(&planning, &SourceId::new("zzz"), None),
            Err(ConflictError::UnknownAllocation(id)) if id == "zzz"
        ));
        assert!(matches!(
            detecter_conflits_pour_allocation(&planning, &SourceId::new("b"), None),
            Err(ConflictError::UnknownAllocation(_))
        ));
        assert!(matches!(
            detecter_conflits_pour_blocage(&planning, &SourceId::new("a"), None),
            Err(ConflictError::UnknownBlocage(id)) if id == "a"
        ));
    }

    #[test]
    fn planning_scan_can_target_one_translator() {
        let mut planning = planning();
        let mut autre = Traducteur::new("Ben", "8h-16h", Some(7.0));
        autre.id = TraducteurId::new("t2");
        let mut s = seg("z", 8, 9, 11, NatureSegment::Tache);
        s.traducteur = autre.id.clone();
        planning.traducteurs.push(autre);
        planning.segments.push(s);

        let tous = detecter_conflits_planning(&planning, None, None).unwrap();
        let t2 = detecter_conflits_planning(&planning, Some(&TraducteurId::new("t2")), None).unwrap();
        let t1 = detecter_conflits_planning(&planning, Some(&TraducteurId::new("t1")), None).unwrap();
        assert!(t2.is_empty());
        assert_eq!(t1, tous);
        assert!(tous.iter().all(|c| c.traducteur.as_str() == "t1"));
        assert!(tous.iter().any(|c| c.date == date(11)));
    }
}
