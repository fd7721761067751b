use std::collections::HashMap;

use crate::error::EpidataError;
use crate::filter::parse::{parse_integer, parse_value};
use crate::filter::{extract_values, FilterKind, FilterList, FilterSpec};
use crate::issue::IssueSelector;

/// Raw request parameters. An empty value counts as absent.
#[derive(Debug, Clone, Default)]
pub struct Params {
    values: HashMap<String, String>,
}

impl Params {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self { values: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str).filter(|v| !v.trim().is_empty())
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Every listed parameter must be present; the error names all missing ones.
    pub fn require_all(&self, names: &[&str]) -> Result<(), EpidataError> {
        let missing: Vec<&str> = names.iter().copied().filter(|name| !self.has(name)).collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(EpidataError::missing(&missing))
        }
    }

    /// First present parameter among `names`.
    pub fn require_any<'a>(&self, names: &[&'a str]) -> Result<&'a str, EpidataError> {
        names
            .iter()
            .copied()
            .find(|name| self.has(name))
            .ok_or_else(|| EpidataError::missing(names))
    }

    pub fn list(&self, name: &str, kind: FilterKind) -> Result<FilterList, EpidataError> {
        let raw = self.get(name).ok_or_else(|| EpidataError::missing(&[name]))?;
        Ok(extract_values(raw, kind)?)
    }

    pub fn optional_list(&self, name: &str, kind: FilterKind) -> Result<Option<FilterList>, EpidataError> {
        match self.get(name) {
            Some(raw) => Ok(Some(extract_values(raw, kind)?)),
            None => Ok(None),
        }
    }

    /// A parameter taken verbatim as a single value, commas included.
    pub fn single(&self, name: &str, kind: FilterKind) -> Result<FilterList, EpidataError> {
        let raw = self.get(name).ok_or_else(|| EpidataError::missing(&[name]))?;
        let value = parse_value(raw, kind)?;
        Ok(FilterList::new(kind, vec![FilterSpec::Scalar(value)])?)
    }

    /// Comma-separated strings, possibly none.
    pub fn strings(&self, name: &str) -> Vec<String> {
        self.get(name)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `issues` wins over `lag`; neither means latest.
    pub fn issue_selector(&self) -> Result<IssueSelector, EpidataError> {
        let issues = self.optional_list("issues", FilterKind::Integer)?;
        let lag = self.get("lag").map(parse_integer).transpose()?;
        Ok(IssueSelector::from_request(issues, lag)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_all_lists_every_missing_parameter() {
        let params = Params::from_pairs([("epiweeks", "201501"), ("regions", " ")]);
        match params.require_all(&["epiweeks", "regions", "auth"]) {
            Err(EpidataError::MissingParameters(missing)) => assert_eq!(missing, vec!["regions", "auth"]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn require_any_prefers_earlier_names() {
        let params = Params::from_pairs([("dates", "20150101"), ("epiweeks", "201501")]);
        assert_eq!(params.require_any(&["dates", "epiweeks"]).unwrap(), "dates");
        assert!(Params::default().require_any(&["dates", "epiweeks"]).is_err());
    }

    #[test]
    fn single_keeps_commas() {
        let params = Params::from_pairs([("query", "flu, symptoms")]);
        assert_eq!(params.single("query", FilterKind::String).unwrap().scalar_strings(), vec!["flu, symptoms"]);
    }

    #[test]
    fn issue_selector_from_parameters() {
        let params = Params::from_pairs([("issues", "201505"), ("lag", "1")]);
        assert!(matches!(params.issue_selector().unwrap(), IssueSelector::Explicit(_)));

        let params = Params::from_pairs([("lag", "2")]);
        assert_eq!(params.issue_selector().unwrap(), IssueSelector::Lag(2));

        let params = Params::from_pairs([("lag", "-2")]);
        assert!(matches!(params.issue_selector(), Err(EpidataError::Issue(_))));

        assert_eq!(Params::default().issue_selector().unwrap(), IssueSelector::Latest);
    }

    #[test]
    fn strings_skip_blanks() {
        let params = Params::from_pairs([("auth", "a, ,b")]);
        assert_eq!(params.strings("auth"), vec!["a", "b"]);
        assert!(params.strings("names").is_empty());
    }
}
