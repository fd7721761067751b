//! Spatial rollup for sources stored per state.
//!
//! Requested locations split into aggregate regions, each answered by its own
//! grouped query over the region's member states, and raw locations, answered
//! together by one batched query.

pub mod error;
pub mod region_map;

use std::sync::Arc;

pub use error::RollupError;
pub use region_map::{RegionMap, RegionMapFile, RegionScheme, NATIONAL};

use crate::filter::{
    ColumnRef, Filter, FilterList, FilterOrderInfo, FilterValue, Predicate, SelectExpr, SelectField,
};

/// Output column carrying the region code or the state.
pub const LOCATION: &str = "location";

/// Table shape of a per-state source that can be rolled up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollupSource {
    pub table: &'static str,
    pub alias: &'static str,
    /// Time column the sums are grouped by, with its output name.
    pub period: ColumnRef,
    pub period_name: &'static str,
    pub location: ColumnRef,
    /// Columns summed per group, output under their own names.
    pub measures: &'static [&'static str],
    /// Computed aggregate expressions and their output names.
    pub derived: &'static [(&'static str, &'static str)],
    /// Row-level condition applied before aggregation.
    pub row_filter: Option<&'static str>,
}

impl RollupSource {
    fn select_fields(&self, location: SelectExpr) -> Vec<SelectField> {
        let mut fields = vec![
            SelectField::aliased(location, LOCATION),
            SelectField::aliased(SelectExpr::Column(self.period), self.period_name),
        ];
        fields.extend(
            self.measures
                .iter()
                .map(|&m| SelectField::aliased(SelectExpr::Sum(ColumnRef::qualified(self.alias, m)), m)),
        );
        fields.extend(
            self.derived
                .iter()
                .map(|&(sql, name)| SelectField::aliased(SelectExpr::Fixed(sql), name)),
        );
        fields
    }

    fn condition(&self, base: &Predicate, location: Option<Predicate>) -> Predicate {
        let mut parts = Vec::new();
        if let Some(row_filter) = self.row_filter {
            parts.push(Predicate::Fixed(row_filter));
        }
        parts.push(base.clone());
        parts.extend(location);
        Predicate::and(parts)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    pub aggregate_regions: Vec<String>,
    pub raw_locations: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RollupStrategy {
    regions: Arc<RegionMap>,
}

impl RollupStrategy {
    pub fn new(regions: Arc<RegionMap>) -> Self {
        Self { regions }
    }

    pub fn regions(&self) -> &RegionMap {
        &self.regions
    }

    /// Lower-case every location and split by membership in the region map.
    /// Repeated regions are planned once; raw locations keep their order.
    pub fn classify(&self, locations: &FilterList) -> Classification {
        let mut classification = Classification::default();
        for location in locations.scalar_strings() {
            let location = location.to_lowercase();
            if self.regions.is_region(&location) {
                if !classification.aggregate_regions.contains(&location) {
                    classification.aggregate_regions.push(location);
                }
            } else {
                classification.raw_locations.push(location);
            }
        }
        classification
    }

    /// Summed query for one aggregate region, labelled with the region code.
    pub fn plan_region(
        &self,
        source: &RollupSource,
        region: &str,
        base: &Predicate,
    ) -> Result<Filter, RollupError> {
        let location = if self.regions.is_national(region) {
            None
        } else {
            let members = self
                .regions
                .members(region)
                .ok_or_else(|| RollupError::UnknownRegion(region.to_string()))?;
            Some(Predicate::In {
                column: source.location,
                values: members.iter().map(|m| FilterValue::text(m.as_str())).collect(),
            })
        };

        let label = SelectExpr::Label(FilterValue::text(region));
        Ok(Filter::new(source.table, source.alias)
            .select(source.select_fields(label))
            .where_clause(source.condition(base, location))
            .group_by(vec![source.period])
            .order(vec![FilterOrderInfo::asc(source.period)]))
    }

    /// One query for all raw locations, grouped per state. `None` when there
    /// are no raw locations.
    pub fn plan_raw(&self, source: &RollupSource, raw_locations: &[String], base: &Predicate) -> Option<Filter> {
        if raw_locations.is_empty() {
            return None;
        }
        let location = Predicate::In {
            column: source.location,
            values: raw_locations.iter().map(|l| FilterValue::text(l.to_uppercase())).collect(),
        };
        Some(
            Filter::new(source.table, source.alias)
                .select(source.select_fields(SelectExpr::Column(source.location)))
                .where_clause(source.condition(base, Some(location)))
                .group_by(vec![source.period, source.location])
                .order(vec![FilterOrderInfo::asc(source.period), FilterOrderInfo::asc(source.location)]),
        )
    }

    /// Region plans in request order, then the raw plan.
    pub fn plan(
        &self,
        source: &RollupSource,
        locations: &FilterList,
        base: &Predicate,
    ) -> Result<Vec<Filter>, RollupError> {
        let classification = self.classify(locations);
        tracing::debug!(
            "Rollup on {}: regions {:?}, raw {:?}",
            source.table,
            classification.aggregate_regions,
            classification.raw_locations
        );
        let mut plans = Vec::with_capacity(classification.aggregate_regions.len() + 1);
        for region in &classification.aggregate_regions {
            plans.push(self.plan_region(source, region, base)?);
        }
        plans.extend(self.plan_raw(source, &classification.raw_locations, base));
        Ok(plans)
    }
}
