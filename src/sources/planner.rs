//! Turns a source name plus request parameters into executable statements.
//!
//! Most sources reduce to one of three shapes: a versioned table resolved by
//! issue, a per-state table rolled up into regions, or a plain filtered
//! table. Wiki, nidss_dengue and norostat have their own statements. Gated
//! sources check their credential before anything is compiled.

use std::sync::Arc;

use serde_json::Value;

use crate::auth::{CredentialPresentation, SensorAuthRegistry, SourceCredentials};
use crate::database::{ColumnManifest, Row};
use crate::error::EpidataError;
use crate::filter::{
    compile, ColumnRef, Filter, FilterError, FilterKind, FilterOrderInfo, FilterValue, Predicate, SelectExpr,
    SelectField, TableSource,
};
use crate::issue::{overlay_scopes, resolve, Access, TableScope};
use crate::rollup::{RegionMap, RollupStrategy};

use super::catalog::{self, select_fields, PlainSource, RollupDef, VersionedSource, WikiDef};
use super::params::Params;
use super::Source;

/// Parameter carrying a source credential.
const AUTH: &str = "auth";

/// Work done on fetched rows before they are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostProcess {
    #[default]
    None,
    /// Replace the stored `json` text of a lone forecast with the parsed
    /// `forecast` value. Several rows keep their raw text.
    DecodeForecast,
    /// Fold all rows into one row holding a list per group. A row joins the
    /// group of the first listed field it carries.
    Nest(&'static [(&'static str, &'static str)]),
}

impl PostProcess {
    pub fn apply(&self, rows: &mut Vec<Row>) {
        match self {
            PostProcess::None => {}
            PostProcess::DecodeForecast => {
                if let [row] = rows.as_mut_slice() {
                    if let Some(json) = row.remove("json") {
                        row.insert("forecast".to_string(), decode_forecast(json));
                    }
                }
            }
            PostProcess::Nest(groups) => {
                let mut nested: Row = groups.iter().map(|(_, group)| (group.to_string(), Value::Array(vec![]))).collect();
                for row in rows.drain(..) {
                    let Some((_, group)) = groups.iter().find(|(field, _)| row.contains_key(*field)) else {
                        continue;
                    };
                    if let Some(Value::Array(items)) = nested.get_mut(*group) {
                        items.push(Value::Object(row));
                    }
                }
                rows.push(nested);
            }
        }
    }
}

fn decode_forecast(json: Value) -> Value {
    match json {
        Value::String(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
            tracing::warn!("Undecodable forecast: {}", e);
            Value::Null
        }),
        _ => Value::Null,
    }
}

/// Statements for one request, run in order and concatenated.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub source: Source,
    pub statements: Vec<Filter>,
    pub manifest: ColumnManifest,
    pub post: PostProcess,
}

impl QueryPlan {
    fn new(source: Source, statements: Vec<Filter>, manifest: ColumnManifest) -> Self {
        Self { source, statements, manifest, post: PostProcess::None }
    }

    fn with_post(mut self, post: PostProcess) -> Self {
        self.post = post;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Planner {
    rollup: RollupStrategy,
    sensors: Arc<SensorAuthRegistry>,
    credentials: Arc<SourceCredentials>,
}

impl Planner {
    pub fn new(
        regions: Arc<RegionMap>,
        sensors: Arc<SensorAuthRegistry>,
        credentials: Arc<SourceCredentials>,
    ) -> Self {
        Self { rollup: RollupStrategy::new(regions), sensors, credentials }
    }

    pub fn sensors(&self) -> &SensorAuthRegistry {
        &self.sensors
    }

    pub fn plan(&self, source: Source, params: &Params) -> Result<QueryPlan, EpidataError> {
        match source {
            Source::Fluview => {
                let privileged = self.credentials.verify(source.name(), params.get(AUTH));
                self.versioned(source, &catalog::FLUVIEW, params, privileged)
            }
            Source::FluviewClinical => self.versioned(source, &catalog::FLUVIEW_CLINICAL, params, false),
            Source::Flusurv => self.versioned(source, &catalog::FLUSURV, params, false),
            Source::PahoDengue => self.versioned(source, &catalog::PAHO_DENGUE, params, false),
            Source::NidssFlu => self.versioned(source, &catalog::NIDSS_FLU, params, false),
            Source::NidssDengue => self.nidss_dengue(source, params),
            Source::Gft => self.plain(source, &catalog::GFT, params),
            Source::Ght => {
                self.gated(source.name(), params, &catalog::GHT)?;
                self.plain(source, &catalog::GHT, params)
            }
            Source::Quidel => {
                self.gated(source.name(), params, &catalog::QUIDEL)?;
                self.plain(source, &catalog::QUIDEL, params)
            }
            Source::Cdc => {
                params.require_all(&[AUTH, "epiweeks", "locations"])?;
                self.credentials.require(source.name(), params.get(AUTH))?;
                self.rolled_up(source, &catalog::CDC, params, "epiweeks", FilterKind::Integer)
            }
            Source::Twitter => {
                params.require_all(&[AUTH, "locations"])?;
                let period = params.require_any(&["dates", "epiweeks"])?;
                self.credentials.require(source.name(), params.get(AUTH))?;
                if period == "dates" {
                    self.rolled_up(source, &catalog::TWITTER_DAILY, params, period, FilterKind::Date)
                } else {
                    self.rolled_up(source, &catalog::TWITTER_WEEKLY, params, period, FilterKind::Integer)
                }
            }
            Source::Wiki => {
                params.require_all(&["articles", "language"])?;
                let period = params.require_any(&["dates", "epiweeks"])?;
                if period == "dates" {
                    self.wiki(source, &catalog::WIKI_DAILY, params, period, FilterKind::Date)
                } else {
                    self.wiki(source, &catalog::WIKI_WEEKLY, params, period, FilterKind::Integer)
                }
            }
            Source::Sensors => {
                params.require_all(&required(&catalog::SENSORS))?;
                let presentation = CredentialPresentation::new(params.strings("names"), params.strings(AUTH));
                self.sensors.authorize(&presentation)?;
                self.plain(source, &catalog::SENSORS, params)
            }
            Source::DengueSensors => {
                // Only the global sensor credential opens dengue sensors.
                self.gated(Source::Sensors.name(), params, &catalog::DENGUE_SENSORS)?;
                self.plain(source, &catalog::DENGUE_SENSORS, params)
            }
            Source::Nowcast => self.plain(source, &catalog::NOWCAST, params),
            Source::DengueNowcast => self.plain(source, &catalog::DENGUE_NOWCAST, params),
            Source::Delphi => Ok(self.plain(source, &catalog::DELPHI, params)?.with_post(PostProcess::DecodeForecast)),
            Source::Norostat => {
                params.require_all(&[AUTH, "location", "epiweeks"])?;
                self.credentials.require(source.name(), params.get(AUTH))?;
                self.norostat(source, params)
            }
            Source::MetaNorostat => {
                params.require_all(&[AUTH])?;
                self.credentials.require(Source::Norostat.name(), params.get(AUTH))?;
                Ok(norostat_meta(source))
            }
        }
    }

    /// Missing parameters are reported before the credential is checked.
    fn gated(&self, credential: &str, params: &Params, def: &PlainSource) -> Result<(), EpidataError> {
        let mut names = vec![AUTH];
        names.extend(required(def));
        params.require_all(&names)?;
        Ok(self.credentials.require(credential, params.get(AUTH))?)
    }

    fn versioned(
        &self,
        source: Source,
        def: &VersionedSource,
        params: &Params,
        privileged: bool,
    ) -> Result<QueryPlan, EpidataError> {
        params.require_all(&["epiweeks", def.location_param])?;
        let epiweeks = params.list("epiweeks", FilterKind::Integer)?;
        let locations = params.list(def.location_param, FilterKind::String)?;
        let selector = params.issue_selector()?;

        let scopes = match def.privileged {
            Some(overlay) => overlay_scopes(&locations, privileged, overlay.exception)?,
            None => vec![TableScope { access: Access::Public, locations }],
        };

        let mut statements = Vec::with_capacity(scopes.len());
        for scope in &scopes {
            let (table, fields) = match (scope.access, def.privileged) {
                (Access::Privileged, Some(overlay)) => (overlay.table, overlay.fields),
                _ => (def.table, def.fields),
            };
            let base = Predicate::and([
                compile(table.column("epiweek"), &epiweeks, FilterKind::Integer)?,
                compile(table.column(def.location_field), &scope.locations, FilterKind::String)?,
            ]);
            statements.push(resolve(&table, select_fields(table.alias, fields), base, &selector)?);
        }
        Ok(QueryPlan::new(source, statements, def.manifest.build()))
    }

    fn plain(&self, source: Source, def: &PlainSource, params: &Params) -> Result<QueryPlan, EpidataError> {
        params.require_all(&required(def))?;

        let mut conditions = Vec::with_capacity(def.filters.len());
        for filter in def.filters {
            let list = if filter.single {
                params.single(filter.param, filter.kind)?
            } else {
                params.list(filter.param, filter.kind)?
            };
            conditions.push(compile(ColumnRef::qualified(def.alias, filter.column), &list, filter.kind)?);
        }
        if conditions.is_empty() {
            return Err(FilterError::EmptyFilter.into());
        }

        let column = |name: &'static str| ColumnRef::qualified(def.alias, name);
        let statement = Filter::new(def.table, def.alias)
            .select(def.fields.iter().map(|&f| SelectField::column(column(f))).collect())
            .where_clause(Predicate::and(conditions))
            .order(def.order.iter().map(|&f| FilterOrderInfo::asc(column(f))).collect());
        Ok(QueryPlan::new(source, vec![statement], def.manifest.build()))
    }

    fn rolled_up(
        &self,
        source: Source,
        def: &RollupDef,
        params: &Params,
        period_param: &str,
        kind: FilterKind,
    ) -> Result<QueryPlan, EpidataError> {
        let periods = params.list(period_param, kind)?;
        let locations = params.list("locations", FilterKind::String)?;
        let base = compile(def.source.period, &periods, kind)?;
        let statements = self.rollup.plan(&def.source, &locations, &base)?;
        Ok(QueryPlan::new(source, statements, def.manifest.build()))
    }

    /// Sums over the hours of each period, or per hour when `hours` is given.
    fn wiki(
        &self,
        source: Source,
        def: &WikiDef,
        params: &Params,
        period_param: &str,
        kind: FilterKind,
    ) -> Result<QueryPlan, EpidataError> {
        let articles = params.list("articles", FilterKind::String)?;
        let language = params.single("language", FilterKind::String)?;
        let periods = params.list(period_param, kind)?;
        let hours = params.optional_list("hours", FilterKind::Integer)?;

        let language_of =
            |alias: &'static str| compile(ColumnRef::qualified(alias, "language"), &language, FilterKind::String);
        let counts = Filter::new(catalog::WIKI_ARTICLES, "w").where_clause(language_of("w")?);
        let totals = Filter::new(catalog::WIKI_TOTALS, "m")
            .select(vec![
                SelectField { expr: SelectExpr::Fixed("m.*"), alias: None },
                SelectField::aliased(SelectExpr::Fixed(catalog::WIKI_HOUR_OF_DAY), "hour"),
            ])
            .where_clause(Predicate::and([Predicate::Fixed(catalog::WIKI_TOTAL_FILTER), language_of("m")?]));

        let mut fields = vec![
            SelectField::aliased(SelectExpr::Column(def.period), def.period_name),
            SelectField::column(catalog::WIKI_ARTICLE),
            SelectField::aliased(SelectExpr::Sum(ColumnRef::qualified("w", "count")), "count"),
            SelectField::aliased(SelectExpr::Sum(ColumnRef::qualified("m", "total")), "total"),
            SelectField::aliased(SelectExpr::Fixed(catalog::WIKI_VALUE), "value"),
        ];
        let mut conditions = vec![
            compile(def.period, &periods, kind)?,
            compile(catalog::WIKI_ARTICLE, &articles, FilterKind::String)?,
        ];
        let mut keys = vec![def.period, catalog::WIKI_ARTICLE];
        match hours {
            Some(hours) => {
                fields.push(SelectField::column(catalog::WIKI_HOUR));
                conditions.push(compile(catalog::WIKI_HOUR, &hours, FilterKind::Integer)?);
                keys.push(catalog::WIKI_HOUR);
            }
            None => fields.push(SelectField::aliased(SelectExpr::Fixed("-1"), "hour")),
        }

        let statement = Filter::from_subquery(counts, "w")
            .select(fields)
            .join(
                TableSource::Subquery { filter: Box::new(totals), alias: "m" },
                Predicate::columns_eq(ColumnRef::qualified("m", "datetime"), ColumnRef::qualified("w", "datetime")),
            )
            .where_clause(Predicate::and(conditions))
            .group_by(keys.clone())
            .order(keys.into_iter().map(FilterOrderInfo::asc).collect());
        Ok(QueryPlan::new(source, vec![statement], def.manifest.build()))
    }

    /// One statement per requested name, each labelled with that name.
    fn nidss_dengue(&self, source: Source, params: &Params) -> Result<QueryPlan, EpidataError> {
        params.require_all(&["epiweeks", "locations"])?;
        let epiweeks = params.list("epiweeks", FilterKind::Integer)?;
        let locations = params.list("locations", FilterKind::String)?;

        let column = |name: &'static str| ColumnRef::qualified("nd", name);
        let mut statements = Vec::with_capacity(locations.len());
        for name in locations.scalar_strings() {
            let mut conditions = vec![compile(column("epiweek"), &epiweeks, FilterKind::Integer)?];
            if !name.eq_ignore_ascii_case(catalog::NIDSS_DENGUE_NATIONWIDE) {
                conditions.push(Predicate::Or(vec![
                    Predicate::eq(column("location"), FilterValue::text(name)),
                    Predicate::eq(column("region"), FilterValue::text(name)),
                ]));
            }
            statements.push(
                Filter::new(catalog::NIDSS_DENGUE, "nd")
                    .select(vec![
                        SelectField::column(column("epiweek")),
                        SelectField::aliased(SelectExpr::Label(FilterValue::text(name)), "location"),
                        SelectField::aliased(SelectExpr::Sum(column("count")), "count"),
                    ])
                    .where_clause(Predicate::and(conditions))
                    .group_by(vec![column("epiweek")])
                    .order(vec![FilterOrderInfo::asc(column("epiweek"))]),
            );
        }
        Ok(QueryPlan::new(source, statements, catalog::NIDSS_DENGUE_MANIFEST.build()))
    }

    /// Current value of each epiweek at one location, with the release it came from.
    fn norostat(&self, source: Source, params: &Params) -> Result<QueryPlan, EpidataError> {
        let location = params.single("location", FilterKind::String)?;
        let epiweeks = params.list("epiweeks", FilterKind::Integer)?;

        let latest = |name: &'static str| ColumnRef::qualified("latest", name);
        let pool = |name: &'static str| ColumnRef::qualified("loc", name);
        let statement = Filter::new(catalog::NOROSTAT_POINTS, "latest")
            .select(vec![
                SelectField::column(latest("release_date")),
                SelectField::column(latest("epiweek")),
                SelectField::aliased(SelectExpr::Column(latest("new_value")), "value"),
            ])
            .join(
                TableSource::Table { name: catalog::NOROSTAT_LOCATIONS, alias: "loc" },
                Predicate::columns_eq(pool("location_id"), latest("location_id")),
            )
            .where_clause(Predicate::and([
                compile(pool("location"), &location, FilterKind::String)?,
                compile(latest("epiweek"), &epiweeks, FilterKind::Integer)?,
                Predicate::Fixed(catalog::NOROSTAT_CURRENT),
            ]))
            .order(vec![FilterOrderInfo::asc(latest("epiweek")), FilterOrderInfo::asc(latest("release_date"))]);
        Ok(QueryPlan::new(source, vec![statement], catalog::NOROSTAT_MANIFEST.build()))
    }
}

fn required(def: &PlainSource) -> Vec<&'static str> {
    def.filters.iter().map(|f| f.param).collect()
}

/// Distinct release dates and locations, nested under one row.
fn norostat_meta(source: Source) -> QueryPlan {
    let listing = |table: &'static str, alias: &'static str, name: &'static str| {
        let column = ColumnRef::qualified(alias, name);
        Filter::new(table, alias)
            .select(vec![SelectField::column(column)])
            .group_by(vec![column])
            .order(vec![FilterOrderInfo::asc(column)])
    };
    let statements = vec![
        listing(catalog::NOROSTAT_RELEASES, "v", "release_date"),
        listing(catalog::NOROSTAT_LOCATIONS, "loc", "location"),
    ];
    QueryPlan::new(source, statements, catalog::NOROSTAT_META_MANIFEST.build())
        .with_post(PostProcess::Nest(catalog::NOROSTAT_META_GROUPS))
}
