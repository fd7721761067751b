pub mod catalog;
pub mod params;
pub mod planner;

use std::fmt;

pub use params::Params;
pub use planner::{Planner, PostProcess, QueryPlan};

use crate::error::EpidataError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Fluview,
    FluviewClinical,
    Flusurv,
    PahoDengue,
    NidssFlu,
    NidssDengue,
    Gft,
    Ght,
    Twitter,
    Wiki,
    Quidel,
    Cdc,
    Sensors,
    DengueSensors,
    Nowcast,
    DengueNowcast,
    Delphi,
    Norostat,
    MetaNorostat,
}

impl Source {
    pub const ALL: [Source; 19] = [
        Source::Fluview,
        Source::FluviewClinical,
        Source::Flusurv,
        Source::PahoDengue,
        Source::NidssFlu,
        Source::NidssDengue,
        Source::Gft,
        Source::Ght,
        Source::Twitter,
        Source::Wiki,
        Source::Quidel,
        Source::Cdc,
        Source::Sensors,
        Source::DengueSensors,
        Source::Nowcast,
        Source::DengueNowcast,
        Source::Delphi,
        Source::Norostat,
        Source::MetaNorostat,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Source::Fluview => "fluview",
            Source::FluviewClinical => "fluview_clinical",
            Source::Flusurv => "flusurv",
            Source::PahoDengue => "paho_dengue",
            Source::NidssFlu => "nidss_flu",
            Source::NidssDengue => "nidss_dengue",
            Source::Gft => "gft",
            Source::Ght => "ght",
            Source::Twitter => "twitter",
            Source::Wiki => "wiki",
            Source::Quidel => "quidel",
            Source::Cdc => "cdc",
            Source::Sensors => "sensors",
            Source::DengueSensors => "dengue_sensors",
            Source::Nowcast => "nowcast",
            Source::DengueNowcast => "dengue_nowcast",
            Source::Delphi => "delphi",
            Source::Norostat => "norostat",
            Source::MetaNorostat => "meta_norostat",
        }
    }

    /// Resolve the `source` parameter, case-insensitively. Retired names
    /// answer with the source that replaced them.
    pub fn from_name(name: Option<&str>) -> Result<Source, EpidataError> {
        let name = name.map(str::to_lowercase).ok_or(EpidataError::NoSource)?;
        match name.as_str() {
            "ilinet" | "stateili" => return Err(EpidataError::Retired("use fluview instead")),
            "signals" => return Err(EpidataError::Retired("use sensors instead")),
            _ => {}
        }
        Source::ALL
            .into_iter()
            .find(|source| source.name() == name)
            .ok_or(EpidataError::NoSource)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_names_case_insensitively() {
        assert_eq!(Source::from_name(Some("FluView")).unwrap(), Source::Fluview);
        assert_eq!(Source::from_name(Some("dengue_nowcast")).unwrap(), Source::DengueNowcast);
        assert_eq!(Source::from_name(Some("Wiki")).unwrap(), Source::Wiki);
        assert_eq!(Source::from_name(Some("meta_norostat")).unwrap(), Source::MetaNorostat);
        for source in Source::ALL {
            assert_eq!(Source::from_name(Some(source.name())).unwrap(), source);
        }
    }

    #[test]
    fn retired_and_unknown_sources() {
        assert!(matches!(Source::from_name(Some("stateili")), Err(EpidataError::Retired("use fluview instead"))));
        assert!(matches!(Source::from_name(Some("signals")), Err(EpidataError::Retired("use sensors instead"))));
        assert!(matches!(Source::from_name(Some("meta")), Err(EpidataError::NoSource)));
        assert!(matches!(Source::from_name(Some("wikipedia")), Err(EpidataError::NoSource)));
        assert!(matches!(Source::from_name(None), Err(EpidataError::NoSource)));
    }
}
