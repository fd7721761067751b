use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::RollupError;

pub const NATIONAL: &str = "nat";

/// One classification scheme (HHS regions, census divisions). Within a
/// scheme every member location belongs to at most one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionScheme {
    pub name: String,
    pub regions: BTreeMap<String, Vec<String>>,
}

/// On-disk layout of a region file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionMapFile {
    #[serde(default = "default_national")]
    pub national: String,
    pub schemes: Vec<RegionScheme>,
}

fn default_national() -> String {
    NATIONAL.to_string()
}

/// Aggregate region code to member locations. Codes are lower-case;
/// members are kept in the store's upper-case form.
#[derive(Debug, Clone)]
pub struct RegionMap {
    national: String,
    schemes: Vec<RegionScheme>,
    members: HashMap<String, Vec<String>>,
}

impl RegionMap {
    pub fn new(national: impl Into<String>, schemes: Vec<RegionScheme>) -> Result<Self, RollupError> {
        let national = national.into().to_lowercase();
        let schemes: Vec<RegionScheme> = schemes
            .into_iter()
            .map(|scheme| RegionScheme {
                name: scheme.name,
                regions: scheme
                    .regions
                    .into_iter()
                    .map(|(code, members)| {
                        (code.to_lowercase(), members.into_iter().map(|m| m.to_uppercase()).collect())
                    })
                    .collect(),
            })
            .collect();

        let mut seen_codes = vec![national.clone()];
        for scheme in &schemes {
            let mut owner: HashMap<&str, &str> = HashMap::new();
            for (code, members) in &scheme.regions {
                if seen_codes.contains(code) {
                    return Err(RollupError::DuplicateRegion(code.clone()));
                }
                seen_codes.push(code.clone());
                if members.is_empty() {
                    return Err(RollupError::EmptyRegion(code.clone()));
                }
                for member in members {
                    if let Some(first) = owner.insert(member.as_str(), code.as_str()) {
                        return Err(RollupError::OverlappingMember {
                            scheme: scheme.name.clone(),
                            member: member.clone(),
                            first: first.to_string(),
                            second: code.clone(),
                        });
                    }
                }
            }
        }

        Ok(Self::build(national, schemes))
    }

    fn build(national: String, schemes: Vec<RegionScheme>) -> Self {
        let members = schemes
            .iter()
            .flat_map(|scheme| scheme.regions.iter())
            .map(|(code, members)| (code.clone(), members.clone()))
            .collect();
        Self { national, schemes, members }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, RollupError> {
        let file: RegionMapFile = serde_yaml::from_str(yaml)?;
        Self::new(file.national, file.schemes)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RollupError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let map = Self::from_yaml_str(&content)?;
        tracing::info!(
            "Loaded {} aggregate regions from {}",
            map.members.len(),
            path.as_ref().display()
        );
        Ok(map)
    }

    /// US HHS regions and census divisions.
    pub fn defaults() -> Self {
        let hhs = scheme(
            "hhs",
            &[
                ("hhs1", &["VT", "CT", "ME", "MA", "NH", "RI"]),
                ("hhs2", &["NJ", "NY"]),
                ("hhs3", &["DE", "DC", "MD", "PA", "VA", "WV"]),
                ("hhs4", &["AL", "FL", "GA", "KY", "MS", "NC", "TN", "SC"]),
                ("hhs5", &["IL", "IN", "MI", "MN", "OH", "WI"]),
                ("hhs6", &["AR", "LA", "NM", "OK", "TX"]),
                ("hhs7", &["IA", "KS", "MO", "NE"]),
                ("hhs8", &["CO", "MT", "ND", "SD", "UT", "WY"]),
                ("hhs9", &["AZ", "CA", "HI", "NV"]),
                ("hhs10", &["AK", "ID", "OR", "WA"]),
            ],
        );
        let census = scheme(
            "census",
            &[
                ("cen1", &["CT", "ME", "MA", "NH", "RI", "VT"]),
                ("cen2", &["NJ", "NY", "PA"]),
                ("cen3", &["IL", "IN", "MI", "OH", "WI"]),
                ("cen4", &["IA", "KS", "MN", "MO", "NE", "ND", "SD"]),
                ("cen5", &["DE", "DC", "FL", "GA", "MD", "NC", "SC", "VA", "WV"]),
                ("cen6", &["AL", "KY", "MS", "TN"]),
                ("cen7", &["AR", "LA", "OK", "TX"]),
                ("cen8", &["AZ", "CO", "ID", "MT", "NV", "NM", "UT", "WY"]),
                ("cen9", &["AK", "CA", "HI", "OR", "WA"]),
            ],
        );
        Self::build(NATIONAL.to_string(), vec![hhs, census])
    }

    pub fn national(&self) -> &str {
        &self.national
    }

    pub fn is_national(&self, code: &str) -> bool {
        self.national == code
    }

    /// True for `nat` and every scheme region. Expects a lower-cased code.
    pub fn is_region(&self, code: &str) -> bool {
        self.is_national(code) || self.members.contains_key(code)
    }

    pub fn members(&self, code: &str) -> Option<&[String]> {
        self.members.get(code).map(Vec::as_slice)
    }

    pub fn schemes(&self) -> &[RegionScheme] {
        &self.schemes
    }
}

fn scheme(name: &str, regions: &[(&str, &[&str])]) -> RegionScheme {
    RegionScheme {
        name: name.to_string(),
        regions: regions
            .iter()
            .map(|(code, members)| (code.to_string(), members.iter().map(|m| m.to_string()).collect()))
            .collect(),
    }
}
