//! Détection des conflits d'horaire : chevauchements et dépassements de capacité.
//!
//! La fonction pure [`detecter_conflits`] travaille sur une liste de segments ;
//! les variantes par identifiant assemblent d'abord les journées concernées via
//! un [`SegmentLookup`].

mod detect;
mod lookup;
mod types;

pub use lookup::SegmentLookup;
pub use types::{Conflict, ConflictError, DetectionOptions, TypeConflit};

use crate::model::{Planning, SourceId, TimeSegment, TraducteurId};
use chrono::NaiveDate;

/// Chevauchements (intervalles semi-ouverts) et dépassements de capacité, par
/// traducteur et par journée. Pure : n'altère jamais `segments`.
pub fn detecter_conflits(
    segments: &[TimeSegment],
    opts: &DetectionOptions,
) -> Result<Vec<Conflict>, ConflictError> {
    detect::detecter_conflits(segments, opts)
}

pub fn detecter_conflits_pour_allocation(
    lookup: &dyn SegmentLookup,
    allocation: &SourceId,
    reference: Option<NaiveDate>,
) -> Result<Vec<Conflict>, ConflictError> {
    lookup::detecter_conflits_pour_allocation(lookup, allocation, reference)
}

pub fn detecter_conflits_pour_blocage(
    lookup: &dyn SegmentLookup,
    blocage: &SourceId,
    reference: Option<NaiveDate>,
) -> Result<Vec<Conflict>, ConflictError> {
    lookup::detecter_conflits_pour_blocage(lookup, blocage, reference)
}

pub fn detecter_conflits_planning(
    planning: &Planning,
    traducteur: Option<&TraducteurId>,
    reference: Option<NaiveDate>,
) -> Result<Vec<Conflict>, ConflictError> {
    lookup::detecter_conflits_planning(planning, traducteur, reference)
}
