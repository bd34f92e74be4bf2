use super::types::{ImpactWeights, ScoreImpact};
use crate::niveau::{Bandes, Niveau};
use crate::repartition::round4;

/// Ce que la suggestion dérange.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct Effet {
    pub heures: f64,
    pub jours: u32,
    pub marge_reduite: bool,
    pub autre_traducteur: bool,
}

pub(super) fn evaluer(effet: Effet, poids: &ImpactWeights, bandes: &Bandes) -> ScoreImpact {
    let total = round4(total_brut(effet, poids));
    ScoreImpact {
        total,
        niveau: bandes.classer(total),
        justification: justifier(effet),
    }
}

/// Score forcé au niveau CRITIQUE quand aucune option n'est réalisable.
pub(super) fn evaluer_manuel(effet: Effet, poids: &ImpactWeights, bandes: &Bandes) -> ScoreImpact {
    let total = round4(total_brut(effet, poids) + bandes.plancher(Niveau::Critique));
    ScoreImpact {
        total,
        niveau: Niveau::Critique,
        justification: format!(
            "intervention manuelle requise: aucun créneau, découpage ni traducteur disponible ({})",
            justifier(effet)
        ),
    }
}

fn total_brut(effet: Effet, poids: &ImpactWeights) -> f64 {
    let mut total = poids.heures * effet.heures + poids.jours * f64::from(effet.jours);
    if effet.marge_reduite {
        total += poids.echeance;
    }
    if effet.autre_traducteur {
        total += poids.traducteur;
    }
    total
}

fn justifier(effet: Effet) -> String {
    let mut parts = vec![
        format!("{:.2}h déplacées", effet.heures),
        format!("{} jour(s) touché(s)", effet.jours),
    ];
    if effet.marge_reduite {
        parts.push("marge avant échéance réduite".to_string());
    }
    if effet.autre_traducteur {
        parts.push("autre traducteur".to_string());
    }
    parts.join(", ")
}
