use serde::{Deserialize, Serialize};
use std::fmt;

/// Niveau de gravité partagé par les conflits et les scores d'impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Niveau {
    Faible,
    Moyen,
    Eleve,
    Critique,
}

impl Niveau {
    /// Niveau immédiatement supérieur (CRITIQUE reste CRITIQUE).
    pub fn escalader(self) -> Self {
        match self {
            Niveau::Faible => Niveau::Moyen,
            Niveau::Moyen => Niveau::Eleve,
            Niveau::Eleve | Niveau::Critique => Niveau::Critique,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Niveau::Faible => "FAIBLE",
            Niveau::Moyen => "MOYEN",
            Niveau::Eleve => "ELEVE",
            Niveau::Critique => "CRITIQUE",
        }
    }
}

impl fmt::Display for Niveau {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Une bande : toute valeur `<= plafond` tombe dans `niveau`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bande {
    pub niveau: Niveau,
    pub plafond: f64,
}

/// Table ordonnée de bandes. La dernière bande capte tout ce qui dépasse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Bande>", into = "Vec<Bande>")]
pub struct Bandes(Vec<Bande>);

impl TryFrom<Vec<Bande>> for Bandes {
    type Error = &'static str;

    fn try_from(bandes: Vec<Bande>) -> Result<Self, Self::Error> {
        Self::new(bandes)
    }
}

impl From<Bandes> for Vec<Bande> {
    fn from(b: Bandes) -> Self {
        b.0
    }
}

impl Bandes {
    /// Construit une table ; les plafonds doivent être croissants.
    pub fn new(bandes: Vec<Bande>) -> Result<Self, &'static str> {
        if bandes.is_empty() {
            return Err("at least one band is required");
        }
        if bandes.windows(2).any(|w| w[0].plafond >= w[1].plafond) {
            return Err("band ceilings must be strictly increasing");
        }
        Ok(Self(bandes))
    }

    pub fn classer(&self, valeur: f64) -> Niveau {
        self.0
            .iter()
            .find(|b| valeur <= b.plafond)
            .or_else(|| self.0.last())
            .map(|b| b.niveau)
            .unwrap_or(Niveau::Critique)
    }

    /// Plancher d'un niveau : plafond de la bande précédente, 0 pour la première.
    pub fn plancher(&self, niveau: Niveau) -> f64 {
        let mut precedent = 0.0;
        for b in &self.0 {
            if b.niveau == niveau {
                return precedent;
            }
            precedent = b.plafond;
        }
        precedent
    }

    pub fn bandes(&self) -> &[Bande] {
        &self.0
    }

    /// Ratio de chevauchement (0..=1) entre deux tâches.
    pub fn chevauchement() -> Self {
        Self(vec![
            Bande { niveau: Niveau::Moyen, plafond: 0.5 },
            Bande { niveau: Niveau::Eleve, plafond: f64::INFINITY },
        ])
    }

    /// Score d'impact total d'une suggestion.
    pub fn impact() -> Self {
        Self(vec![
            Bande { niveau: Niveau::Faible, plafond: 3.0 },
            Bande { niveau: Niveau::Moyen, plafond: 6.0 },
            Bande { niveau: Niveau::Eleve, plafond: 10.0 },
            Bande { niveau: Niveau::Critique, plafond: f64::INFINITY },
        ])
    }
}

impl Default for Bandes {
    fn default() -> Self {
        Self::impact()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impact_bands_are_inclusive_ceilings() {
        let b = Bandes::impact();
        assert_eq!(b.classer(0.0), Niveau::Faible);
        assert_eq!(b.classer(3.0), Niveau::Faible);
        assert_eq!(b.classer(3.01), Niveau::Moyen);
        assert_eq!(b.classer(10.0), Niveau::Eleve);
        assert_eq!(b.classer(42.0), Niveau::Critique);
    }

    #[test]
    fn overlap_band_splits_at_half() {
        let b = Bandes::chevauchement();
        assert_eq!(b.classer(0.5), Niveau::Moyen);
        assert_eq!(b.classer(0.51), Niveau::Eleve);
    }

    #[test]
    fn floor_is_previous_ceiling() {
        let b = Bandes::impact();
        assert_eq!(b.plancher(Niveau::Faible), 0.0);
        assert_eq!(b.plancher(Niveau::Critique), 10.0);
    }

    #[test]
    fn rejects_unordered_table() {
        let err = Bandes::new(vec![
            Bande { niveau: Niveau::Faible, plafond: 5.0 },
            Bande { niveau: Niveau::Moyen, plafond: 2.0 },
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn deserialization_validates_the_table() {
        let desordre = r#"[{"niveau":"FAIBLE","plafond":5.0},{"niveau":"MOYEN","plafond":2.0}]"#;
        let err = serde_json::from_str::<Bandes>(desordre).unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
        assert!(serde_json::from_str::<Bandes>("[]").is_err());

        let ok: Bandes =
            serde_json::from_str(r#"[{"niveau":"FAIBLE","plafond":1.0},{"niveau":"ELEVE","plafond":4.0}]"#).unwrap();
        assert_eq!(ok.classer(2.0), Niveau::Eleve);
        let json = serde_json::to_string(&ok).unwrap();
        assert_eq!(serde_json::from_str::<Bandes>(&json).unwrap(), ok);
    }

    #[test]
    fn escalation_saturates() {
        assert_eq!(Niveau::Moyen.escalader(), Niveau::Eleve);
        assert_eq!(Niveau::Critique.escalader(), Niveau::Critique);
    }
}
