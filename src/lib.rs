#![forbid(unsafe_code)]
//! Répartiteur : répartition des heures de traduction et résolution des conflits d'horaire.
//!
//! - Répartition équilibrée, juste-à-temps (recul depuis l'échéance) et PEPS.
//! - Détection des chevauchements et dépassements de capacité, par traducteur et par jour.
//! - Suggestions de remèdes classées par impact ; jamais appliquées.
//! - Dates civiles (`NaiveDate`/`NaiveTime`) ; le fuseau horaire reste hors de la lib.

pub mod calendar;
pub mod config;
pub mod conflicts;
pub mod io;
pub mod model;
pub mod niveau;
pub mod repartition;
pub mod storage;
pub mod suggestions;
pub mod window;

pub use calendar::{FeriesQuebec, HolidayCalendar, JoursFeries, SansFeries};
pub use config::Config;
pub use conflicts::{
    detecter_conflits, detecter_conflits_planning, detecter_conflits_pour_allocation,
    detecter_conflits_pour_blocage, Conflict, ConflictError, DetectionOptions, SegmentLookup,
    TypeConflit,
};
pub use model::{NatureSegment, Planning, SourceId, TimeSegment, Traducteur, TraducteurId};
pub use niveau::{Bande, Bandes, Niveau};
pub use repartition::{
    repartition_equilibree, repartition_juste_a_temps, repartition_peps, AllocationEntry,
    AllocationPlan, JatOptions, Repartiteur, RepartitionError, TranslatorProfile,
};
pub use storage::{JsonStorage, Storage};
pub use suggestions::{
    generer_suggestions, CandidatePool, Changement, ImpactWeights, Suggestion, SuggestionEngine,
    TypeSuggestion,
};
pub use window::{Plage, WindowError, WorkingWindow};
