//! Static descriptions of every served source: tables, output fields,
//! filterable parameters and how result columns are decoded.

use crate::database::ColumnManifest;
use crate::filter::{ColumnRef, FilterKind, SelectExpr, SelectField};
use crate::issue::VersionedTable;
use crate::rollup::RollupSource;

/// One output column of a source's SELECT list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputField {
    Column(&'static str),
    Renamed { column: &'static str, name: &'static str },
    Null(&'static str),
}

impl OutputField {
    pub fn select(&self, alias: &'static str) -> SelectField {
        match *self {
            OutputField::Column(column) => SelectField::column(ColumnRef::qualified(alias, column)),
            OutputField::Renamed { column, name } => {
                SelectField::aliased(SelectExpr::Column(ColumnRef::qualified(alias, column)), name)
            }
            OutputField::Null(name) => SelectField::aliased(SelectExpr::Null, name),
        }
    }
}

pub fn select_fields(alias: &'static str, fields: &[OutputField]) -> Vec<SelectField> {
    fields.iter().map(|f| f.select(alias)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Manifest {
    pub strings: &'static [&'static str],
    pub integers: &'static [&'static str],
    pub floats: &'static [&'static str],
}

impl Manifest {
    pub fn build(&self) -> ColumnManifest {
        ColumnManifest::new()
            .strings(self.strings)
            .integers(self.integers)
            .floats(self.floats)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrivilegedTable {
    pub table: VersionedTable,
    pub fields: &'static [OutputField],
    /// Location readable without the privilege.
    pub exception: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionedSource {
    pub table: VersionedTable,
    pub location_param: &'static str,
    pub location_field: &'static str,
    pub fields: &'static [OutputField],
    pub manifest: Manifest,
    pub privileged: Option<PrivilegedTable>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamFilter {
    pub param: &'static str,
    pub column: &'static str,
    pub kind: FilterKind,
    /// Take the parameter verbatim instead of as a list.
    pub single: bool,
}

impl ParamFilter {
    const fn list(param: &'static str, column: &'static str, kind: FilterKind) -> Self {
        Self { param, column, kind, single: false }
    }

    const fn single(param: &'static str, column: &'static str, kind: FilterKind) -> Self {
        Self { param, column, kind, single: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlainSource {
    pub table: &'static str,
    pub alias: &'static str,
    pub fields: &'static [&'static str],
    pub filters: &'static [ParamFilter],
    pub order: &'static [&'static str],
    pub manifest: Manifest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollupDef {
    pub source: RollupSource,
    pub manifest: Manifest,
}

const EPIWEEKS: ParamFilter = ParamFilter::list("epiweeks", "epiweek", FilterKind::Integer);
const LOCATIONS: ParamFilter = ParamFilter::list("locations", "location", FilterKind::String);
const NAMES: ParamFilter = ParamFilter::list("names", "name", FilterKind::String);

const fn versioned_table(name: &'static str, alias: &'static str, key_fields: &'static [&'static str]) -> VersionedTable {
    VersionedTable {
        name,
        alias,
        key_fields,
        issue_field: "issue",
        lag_field: "lag",
    }
}

pub const FLUVIEW: VersionedSource = VersionedSource {
    table: versioned_table("fluview", "fv", &["epiweek", "region"]),
    location_param: "regions",
    location_field: "region",
    fields: &[
        OutputField::Column("release_date"),
        OutputField::Column("issue"),
        OutputField::Column("epiweek"),
        OutputField::Column("region"),
        OutputField::Column("lag"),
        OutputField::Column("num_ili"),
        OutputField::Column("num_patients"),
        OutputField::Column("num_providers"),
        OutputField::Column("wili"),
        OutputField::Column("ili"),
        OutputField::Column("num_age_0"),
        OutputField::Column("num_age_1"),
        OutputField::Column("num_age_2"),
        OutputField::Column("num_age_3"),
        OutputField::Column("num_age_4"),
        OutputField::Column("num_age_5"),
    ],
    manifest: Manifest {
        strings: &["release_date", "region"],
        integers: &[
            "issue", "epiweek", "lag", "num_ili", "num_patients", "num_providers", "num_age_0", "num_age_1",
            "num_age_2", "num_age_3", "num_age_4", "num_age_5",
        ],
        floats: &["wili", "ili"],
    },
    // Imputed rows have no release date or age groups, and wili equals ili.
    privileged: Some(PrivilegedTable {
        table: versioned_table("fluview_imputed", "fv", &["epiweek", "region"]),
        fields: &[
            OutputField::Null("release_date"),
            OutputField::Column("issue"),
            OutputField::Column("epiweek"),
            OutputField::Column("region"),
            OutputField::Column("lag"),
            OutputField::Column("num_ili"),
            OutputField::Column("num_patients"),
            OutputField::Column("num_providers"),
            OutputField::Renamed { column: "ili", name: "wili" },
            OutputField::Column("ili"),
            OutputField::Null("num_age_0"),
            OutputField::Null("num_age_1"),
            OutputField::Null("num_age_2"),
            OutputField::Null("num_age_3"),
            OutputField::Null("num_age_4"),
            OutputField::Null("num_age_5"),
        ],
        exception: Some("ny"),
    }),
};

pub const FLUVIEW_CLINICAL: VersionedSource = VersionedSource {
    table: versioned_table("fluview_clinical", "fvc", &["epiweek", "region"]),
    location_param: "regions",
    location_field: "region",
    fields: &[
        OutputField::Column("release_date"),
        OutputField::Column("issue"),
        OutputField::Column("epiweek"),
        OutputField::Column("region"),
        OutputField::Column("lag"),
        OutputField::Column("total_specimens"),
        OutputField::Column("total_a"),
        OutputField::Column("total_b"),
        OutputField::Column("percent_positive"),
        OutputField::Column("percent_a"),
        OutputField::Column("percent_b"),
    ],
    manifest: Manifest {
        strings: &["release_date", "region"],
        integers: &["issue", "epiweek", "lag", "total_specimens", "total_a", "total_b"],
        floats: &["percent_positive", "percent_a", "percent_b"],
    },
    privileged: None,
};

pub const FLUSURV: VersionedSource = VersionedSource {
    table: versioned_table("flusurv", "fs", &["epiweek", "location"]),
    location_param: "locations",
    location_field: "location",
    fields: &[
        OutputField::Column("release_date"),
        OutputField::Column("issue"),
        OutputField::Column("epiweek"),
        OutputField::Column("location"),
        OutputField::Column("lag"),
        OutputField::Column("rate_age_0"),
        OutputField::Column("rate_age_1"),
        OutputField::Column("rate_age_2"),
        OutputField::Column("rate_age_3"),
        OutputField::Column("rate_age_4"),
        OutputField::Column("rate_overall"),
    ],
    manifest: Manifest {
        strings: &["release_date", "location"],
        integers: &["issue", "epiweek", "lag"],
        floats: &["rate_age_0", "rate_age_1", "rate_age_2", "rate_age_3", "rate_age_4", "rate_overall"],
    },
    privileged: None,
};

pub const PAHO_DENGUE: VersionedSource = VersionedSource {
    table: versioned_table("paho_dengue", "pd", &["epiweek", "region"]),
    location_param: "regions",
    location_field: "region",
    fields: &[
        OutputField::Column("release_date"),
        OutputField::Column("issue"),
        OutputField::Column("epiweek"),
        OutputField::Column("region"),
        OutputField::Column("lag"),
        OutputField::Column("total_pop"),
        OutputField::Column("serotype"),
        OutputField::Column("num_dengue"),
        OutputField::Column("incidence_rate"),
        OutputField::Column("num_severe"),
        OutputField::Column("num_deaths"),
    ],
    manifest: Manifest {
        strings: &["release_date", "region", "serotype"],
        integers: &["issue", "epiweek", "lag", "total_pop", "num_dengue", "num_severe", "num_deaths"],
        floats: &["incidence_rate"],
    },
    privileged: None,
};

pub const NIDSS_FLU: VersionedSource = VersionedSource {
    table: versioned_table("nidss_flu", "nf", &["epiweek", "region"]),
    location_param: "regions",
    location_field: "region",
    fields: &[
        OutputField::Column("release_date"),
        OutputField::Column("issue"),
        OutputField::Column("epiweek"),
        OutputField::Column("region"),
        OutputField::Column("lag"),
        OutputField::Column("visits"),
        OutputField::Column("ili"),
    ],
    manifest: Manifest {
        strings: &["release_date", "region"],
        integers: &["issue", "epiweek", "lag", "visits"],
        floats: &["ili"],
    },
    privileged: None,
};

pub const GFT: PlainSource = PlainSource {
    table: "gft",
    alias: "g",
    fields: &["epiweek", "location", "num"],
    filters: &[EPIWEEKS, LOCATIONS],
    order: &["epiweek", "location"],
    manifest: Manifest { strings: &["location"], integers: &["epiweek", "num"], floats: &[] },
};

pub const GHT: PlainSource = PlainSource {
    table: "ght",
    alias: "g",
    fields: &["epiweek", "location", "value"],
    filters: &[EPIWEEKS, LOCATIONS, ParamFilter::single("query", "query", FilterKind::String)],
    order: &["epiweek", "location"],
    manifest: Manifest { strings: &["location"], integers: &["epiweek"], floats: &["value"] },
};

pub const QUIDEL: PlainSource = PlainSource {
    table: "quidel",
    alias: "q",
    fields: &["location", "epiweek", "value"],
    filters: &[LOCATIONS, EPIWEEKS],
    order: &["epiweek", "location"],
    manifest: Manifest { strings: &["location"], integers: &["epiweek"], floats: &["value"] },
};

pub const SENSORS: PlainSource = PlainSource {
    table: "sensors",
    alias: "s",
    fields: &["name", "location", "epiweek", "value"],
    filters: &[NAMES, LOCATIONS, EPIWEEKS],
    order: &["epiweek", "name", "location"],
    manifest: Manifest { strings: &["name", "location"], integers: &["epiweek"], floats: &["value"] },
};

pub const DENGUE_SENSORS: PlainSource = PlainSource { table: "dengue_sensors", ..SENSORS };

pub const NOWCAST: PlainSource = PlainSource {
    table: "nowcasts",
    alias: "n",
    fields: &["location", "epiweek", "value", "std"],
    filters: &[LOCATIONS, EPIWEEKS],
    order: &["epiweek", "location"],
    manifest: Manifest { strings: &["location"], integers: &["epiweek"], floats: &["value", "std"] },
};

pub const DENGUE_NOWCAST: PlainSource = PlainSource { table: "dengue_nowcasts", ..NOWCAST };

/// Forecasts are stored as JSON text and decoded after the query.
pub const DELPHI: PlainSource = PlainSource {
    table: "forecasts",
    alias: "f",
    fields: &["system", "epiweek", "json"],
    filters: &[
        ParamFilter::single("system", "system", FilterKind::String),
        ParamFilter::single("epiweek", "epiweek", FilterKind::Integer),
    ],
    order: &[],
    manifest: Manifest { strings: &["system", "json"], integers: &["epiweek"], floats: &[] },
};

pub const CDC: RollupDef = RollupDef {
    source: RollupSource {
        table: "cdc_extract",
        alias: "c",
        period: ColumnRef::qualified("c", "epiweek"),
        period_name: "epiweek",
        location: ColumnRef::qualified("c", "state"),
        measures: &["num1", "num2", "num3", "num4", "num5", "num6", "num7", "num8", "total"],
        derived: &[],
        row_filter: None,
    },
    manifest: Manifest {
        strings: &["location"],
        integers: &["epiweek", "num1", "num2", "num3", "num4", "num5", "num6", "num7", "num8", "total"],
        floats: &[],
    },
};

const TWITTER_PERCENT: (&str, &str) =
    ("round(100.0 * sum(t.\"num\") / NULLIF(sum(t.\"total\"), 0), 8)", "percent");
// Drops the ~2% of rows with the highest num/total, including rows with no total.
const TWITTER_ROW_FILTER: &str = "t.\"total\" > 0 AND t.\"num\" <= 0.019 * t.\"total\"";

pub const TWITTER_DAILY: RollupDef = RollupDef {
    source: RollupSource {
        table: "twitter",
        alias: "t",
        period: ColumnRef::qualified("t", "date"),
        period_name: "date",
        location: ColumnRef::qualified("t", "state"),
        measures: &["num", "total"],
        derived: &[TWITTER_PERCENT],
        row_filter: Some(TWITTER_ROW_FILTER),
    },
    manifest: Manifest { strings: &["location", "date"], integers: &["num", "total"], floats: &["percent"] },
};

pub const TWITTER_WEEKLY: RollupDef = RollupDef {
    source: RollupSource {
        period: ColumnRef::qualified("t", "epiweek"),
        period_name: "epiweek",
        ..TWITTER_DAILY.source
    },
    manifest: Manifest { strings: &["location"], integers: &["epiweek", "num", "total"], floats: &["percent"] },
};

/// Article view counts (`w`) joined per hour with the language's total
/// views (`m`), summed over a day or an epiweek.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WikiDef {
    pub period: ColumnRef,
    pub period_name: &'static str,
    pub manifest: Manifest,
}

pub const WIKI_ARTICLES: &str = "wiki";
pub const WIKI_TOTALS: &str = "wiki_meta";
pub const WIKI_ARTICLE: ColumnRef = ColumnRef::qualified("w", "article");
pub const WIKI_HOUR: ColumnRef = ColumnRef::qualified("m", "hour");
pub const WIKI_HOUR_OF_DAY: &str = "CAST(extract(hour FROM m.\"datetime\") AS BIGINT)";
pub const WIKI_VALUE: &str = "round(sum(w.\"count\") / NULLIF(sum(m.\"total\") * 1e-6, 0), 8)";
// A handful of hourly totals are corrupt and orders of magnitude too large.
pub const WIKI_TOTAL_FILTER: &str = "m.\"total\" < 100000000";

pub const WIKI_DAILY: WikiDef = WikiDef {
    period: ColumnRef::qualified("m", "date"),
    period_name: "date",
    manifest: Manifest { strings: &["date", "article"], integers: &["count", "total", "hour"], floats: &["value"] },
};

pub const WIKI_WEEKLY: WikiDef = WikiDef {
    period: ColumnRef::qualified("m", "epiweek"),
    period_name: "epiweek",
    manifest: Manifest { strings: &["article"], integers: &["epiweek", "count", "total", "hour"], floats: &["value"] },
};

/// Taiwan dengue counts, matched per requested name against a location,
/// its region, or the whole country.
pub const NIDSS_DENGUE: &str = "nidss_dengue";
pub const NIDSS_DENGUE_NATIONWIDE: &str = "nationwide";
pub const NIDSS_DENGUE_MANIFEST: Manifest =
    Manifest { strings: &["location"], integers: &["epiweek", "count"], floats: &[] };

pub const NOROSTAT_POINTS: &str = "norostat_point_diffs";
pub const NOROSTAT_LOCATIONS: &str = "norostat_raw_datatable_location_pool";
pub const NOROSTAT_RELEASES: &str = "norostat_raw_datatable_version_list";
/// A point is current when it has a value and no later parse of the same
/// location and epiweek has one.
pub const NOROSTAT_CURRENT: &str = "latest.\"new_value\" IS NOT NULL AND NOT EXISTS (\
SELECT 1 FROM \"norostat_point_diffs\" later \
WHERE later.\"location_id\" = latest.\"location_id\" AND later.\"epiweek\" = latest.\"epiweek\" \
AND (later.\"release_date\", later.\"parse_time\") > (latest.\"release_date\", latest.\"parse_time\") \
AND later.\"new_value\" IS NOT NULL)";
pub const NOROSTAT_MANIFEST: Manifest =
    Manifest { strings: &["release_date"], integers: &["epiweek", "value"], floats: &[] };
pub const NOROSTAT_META_MANIFEST: Manifest =
    Manifest { strings: &["release_date", "location"], integers: &[], floats: &[] };
/// Output field of each listing and the group it is nested under.
pub const NOROSTAT_META_GROUPS: &[(&str, &str)] = &[("release_date", "releases"), ("location", "locations")];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifests_cover_every_output_field() {
        for source in [FLUVIEW, FLUVIEW_CLINICAL, FLUSURV, PAHO_DENGUE, NIDSS_FLU] {
            let manifest = source.manifest.build();
            for field in source.fields {
                let name = match *field {
                    OutputField::Column(name) | OutputField::Null(name) => name,
                    OutputField::Renamed { name, .. } => name,
                };
                assert!(manifest.field_type(name).is_some(), "{} lacks {}", source.table.name, name);
            }
        }
        for source in [GFT, GHT, QUIDEL, SENSORS, NOWCAST, DELPHI] {
            let manifest = source.manifest.build();
            for field in source.fields {
                assert!(manifest.field_type(field).is_some(), "{} lacks {}", source.table, field);
            }
        }
    }

    #[test]
    fn imputed_fields_line_up_with_public_fields() {
        let privileged = FLUVIEW.privileged.unwrap();
        let names = |fields: &[OutputField]| -> Vec<&'static str> {
            fields
                .iter()
                .map(|f| match *f {
                    OutputField::Column(name) | OutputField::Null(name) => name,
                    OutputField::Renamed { name, .. } => name,
                })
                .collect()
        };
        assert_eq!(names(FLUVIEW.fields), names(privileged.fields));
    }

    #[test]
    fn output_field_renders_select() {
        let field = OutputField::Renamed { column: "ili", name: "wili" }.select("fv");
        assert_eq!(field, SelectField::aliased(SelectExpr::Column(ColumnRef::qualified("fv", "ili")), "wili"));
    }
}
