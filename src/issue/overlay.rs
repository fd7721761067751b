use crate::filter::FilterList;

use super::error::IssueError;

/// Which physical table of a public/privileged pair a scope reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Privileged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableScope {
    pub access: Access,
    pub locations: FilterList,
}

/// Decide which tables of an overlaid source to read, and for which locations.
///
/// The public table is always read. `exception` names a location whose
/// privileged series is a recombination of public constituents; asking for
/// it grants privileged access for that location alone. This is checked
/// before the privilege itself.
pub fn overlay_scopes(
    locations: &FilterList,
    privileged: bool,
    exception: Option<&str>,
) -> Result<Vec<TableScope>, IssueError> {
    let mut scopes = vec![TableScope { access: Access::Public, locations: locations.clone() }];

    let mut granted = privileged;
    let mut privileged_locations = locations.clone();
    if let Some(exception) = exception {
        let requested = locations.scalar_strings().iter().any(|l| l.eq_ignore_ascii_case(exception));
        if !granted && requested {
            tracing::debug!("Granting privileged access for public recombination '{}'", exception);
            privileged_locations = FilterList::strings([exception])?;
            granted = true;
        }
    }

    if granted {
        scopes.push(TableScope { access: Access::Privileged, locations: privileged_locations });
    }
    Ok(scopes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regions(values: &[&str]) -> FilterList {
        FilterList::strings(values.iter().copied()).unwrap()
    }

    #[test]
    fn unprivileged_reads_public_only() {
        let scopes = overlay_scopes(&regions(&["nat", "pa"]), false, Some("ny")).unwrap();
        assert_eq!(scopes, vec![TableScope { access: Access::Public, locations: regions(&["nat", "pa"]) }]);
    }

    #[test]
    fn privileged_reads_both_tables() {
        let scopes = overlay_scopes(&regions(&["nat", "pa"]), true, Some("ny")).unwrap();
        assert_eq!(scopes.len(), 2);
        assert_eq!(scopes[1], TableScope { access: Access::Privileged, locations: regions(&["nat", "pa"]) });
    }

    #[test]
    fn exception_region_narrows_privileged_scope() {
        let scopes = overlay_scopes(&regions(&["pa", "NY", "jfk"]), false, Some("ny")).unwrap();
        assert_eq!(scopes[0].locations, regions(&["pa", "NY", "jfk"]));
        assert_eq!(scopes[1], TableScope { access: Access::Privileged, locations: regions(&["ny"]) });
    }

    #[test]
    fn exception_does_not_narrow_when_already_privileged() {
        let scopes = overlay_scopes(&regions(&["pa", "ny"]), true, Some("ny")).unwrap();
        assert_eq!(scopes[1].locations, regions(&["pa", "ny"]));
    }

    #[test]
    fn no_exception_configured() {
        let scopes = overlay_scopes(&regions(&["ny"]), false, None).unwrap();
        assert_eq!(scopes.len(), 1);
    }
}
