//! Energy source categories.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// The source of the energy a certificate represents.
///
/// Parsing never fails: labels other than the four recognised ones are kept
/// verbatim in [`EnergyCategory::Other`] and priced with the fallback factor.
/// Matching is exact on the lowercase labels, so `"Solar"` is `Other`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EnergyCategory {
    Solar,
    Wind,
    Hydro,
    Biomass,
    /// Any unrecognised label.
    Other(String),
}

impl EnergyCategory {
    pub fn from_label(label: &str) -> Self {
        match label {
            "solar" => Self::Solar,
            "wind" => Self::Wind,
            "hydro" => Self::Hydro,
            "biomass" => Self::Biomass,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Solar => "solar",
            Self::Wind => "wind",
            Self::Hydro => "hydro",
            Self::Biomass => "biomass",
            Self::Other(label) => label,
        }
    }

    /// Whether the label matched one of the recognised categories.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for EnergyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EnergyCategory {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_label(s))
    }
}

impl From<String> for EnergyCategory {
    fn from(label: String) -> Self {
        match Self::from_label(&label) {
            Self::Other(_) => Self::Other(label),
            known => known,
        }
    }
}

impl From<EnergyCategory> for String {
    fn from(category: EnergyCategory) -> Self {
        match category {
            EnergyCategory::Other(label) => label,
            known => known.label().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognised_labels() {
        assert_eq!(EnergyCategory::from_label("solar"), EnergyCategory::Solar);
        assert_eq!(EnergyCategory::from_label("wind"), EnergyCategory::Wind);
        assert_eq!(EnergyCategory::from_label("hydro"), EnergyCategory::Hydro);
        assert_eq!(EnergyCategory::from_label("biomass"), EnergyCategory::Biomass);
    }

    #[test]
    fn unknown_label_is_preserved() {
        let cat: EnergyCategory = "geothermal".parse().unwrap();
        assert_eq!(cat, EnergyCategory::Other("geothermal".into()));
        assert_eq!(cat.label(), "geothermal");
        assert!(!cat.is_recognized());
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(
            EnergyCategory::from_label("Solar"),
            EnergyCategory::Other("Solar".into())
        );
    }

    #[test]
    fn serializes_as_label() {
        let json = serde_json::to_string(&EnergyCategory::Wind).unwrap();
        assert_eq!(json, "\"wind\"");
        let back: EnergyCategory = serde_json::from_str("\"tidal\"").unwrap();
        assert_eq!(back, EnergyCategory::Other("tidal".into()));
    }
}
