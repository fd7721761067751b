use super::error::FilterError;
use super::types::{ColumnRef, FilterKind, FilterList, FilterOp, FilterSpec, FilterValue};

/// Structured WHERE/ON condition. Values stay typed until rendering, where
/// each one becomes a positional `$n` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare { column: ColumnRef, op: FilterOp, value: FilterValue },
    Between { column: ColumnRef, low: FilterValue, high: FilterValue },
    In { column: ColumnRef, values: Vec<FilterValue> },
    Columns { left: ColumnRef, op: FilterOp, right: ColumnRef },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    /// Constant SQL from the source catalog (never request data).
    Fixed(&'static str),
}

impl Predicate {
    pub fn eq(column: ColumnRef, value: FilterValue) -> Self {
        Predicate::Compare { column, op: FilterOp::Eq, value }
    }

    pub fn columns_eq(left: ColumnRef, right: ColumnRef) -> Self {
        Predicate::Columns { left, op: FilterOp::Eq, right }
    }

    /// Conjunction that flattens nested `And`s.
    pub fn and(parts: impl IntoIterator<Item = Predicate>) -> Self {
        let mut flat = Vec::new();
        for part in parts {
            match part {
                Predicate::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        Predicate::And(flat)
    }
}

/// Compile a filter list against one column into a disjunction of
/// equality and inclusive-range clauses, in list order.
pub fn compile(column: ColumnRef, list: &FilterList, kind: FilterKind) -> Result<Predicate, FilterError> {
    if list.kind() != kind {
        return Err(FilterError::KindMismatch { expected: kind, found: list.kind() });
    }
    let clauses = list
        .specs()
        .iter()
        .map(|spec| match spec {
            FilterSpec::Scalar(value) => Predicate::eq(column, value.clone()),
            FilterSpec::Range(low, high) => Predicate::Between { column, low: low.clone(), high: high.clone() },
        })
        .collect();
    Ok(Predicate::Or(clauses))
}

/// Renders predicates, collecting bound values in placeholder order.
pub struct FilterWhere {
    param_values: Vec<FilterValue>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self { param_values: vec![], param_index: starting_param_index }
    }

    pub fn generate(predicate: &Predicate) -> (String, Vec<FilterValue>) {
        let mut filter_where = Self::new(0);
        let sql = filter_where.render(predicate);
        (sql, filter_where.into_params())
    }

    pub fn render(&mut self, predicate: &Predicate) -> String {
        match predicate {
            Predicate::Compare { column, op, value } => {
                format!("{} {} {}", column.to_sql(), op.to_sql(), self.param(value.clone()))
            }
            Predicate::Between { column, low, high } => {
                let low = self.param(low.clone());
                let high = self.param(high.clone());
                format!("{} BETWEEN {} AND {}", column.to_sql(), low, high)
            }
            Predicate::In { column, values } => {
                if values.is_empty() {
                    return "1=0".to_string();
                }
                let params: Vec<String> = values.iter().map(|v| self.param(v.clone())).collect();
                format!("{} IN ({})", column.to_sql(), params.join(", "))
            }
            Predicate::Columns { left, op, right } => {
                format!("{} {} {}", left.to_sql(), op.to_sql(), right.to_sql())
            }
            Predicate::And(parts) => self.join(parts, " AND ", "1=1"),
            Predicate::Or(parts) => self.join(parts, " OR ", "1=0"),
            Predicate::Fixed(sql) => sql.to_string(),
        }
    }

    pub fn param(&mut self, value: FilterValue) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }

    pub fn into_params(self) -> Vec<FilterValue> {
        self.param_values
    }

    fn join(&mut self, parts: &[Predicate], joiner: &str, empty: &str) -> String {
        if parts.is_empty() {
            return empty.to_string();
        }
        let rendered: Vec<String> = parts.iter().map(|p| format!("({})", self.render(p))).collect();
        rendered.join(joiner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPIWEEK: ColumnRef = ColumnRef::qualified("fv", "epiweek");

    /// Reference evaluator used to check compiled predicates against sample values.
    fn evaluate(predicate: &Predicate, value: &FilterValue) -> bool {
        match predicate {
            Predicate::Compare { op: FilterOp::Eq, value: v, .. } => v == value,
            Predicate::Between { low, high, .. } => low <= value && value <= high,
            Predicate::In { values, .. } => values.contains(value),
            Predicate::And(parts) => parts.iter().all(|p| evaluate(p, value)),
            Predicate::Or(parts) => parts.iter().any(|p| evaluate(p, value)),
            Predicate::Columns { .. } | Predicate::Fixed(_) => unreachable!(),
        }
    }

    #[test]
    fn compiles_scalars_and_ranges_in_order() {
        let list = FilterList::new(
            FilterKind::Integer,
            vec![
                FilterSpec::Scalar(FilterValue::Integer(201440)),
                FilterSpec::Range(FilterValue::Integer(201501), FilterValue::Integer(201510)),
            ],
        )
        .unwrap();

        let predicate = compile(EPIWEEK, &list, FilterKind::Integer).unwrap();
        let (sql, params) = FilterWhere::generate(&predicate);

        assert_eq!(sql, "(fv.\"epiweek\" = $1) OR (fv.\"epiweek\" BETWEEN $2 AND $3)");
        assert_eq!(
            params,
            vec![FilterValue::Integer(201440), FilterValue::Integer(201501), FilterValue::Integer(201510)]
        );
    }

    #[test]
    fn rejects_kind_mismatch() {
        let list = FilterList::strings(["nat"]).unwrap();
        let err = compile(EPIWEEK, &list, FilterKind::Integer).unwrap_err();
        assert_eq!(err, FilterError::KindMismatch { expected: FilterKind::Integer, found: FilterKind::String });
    }

    #[test]
    fn string_values_are_bound_not_inlined() {
        let list = FilterList::strings(["nat'; DROP TABLE fluview; --"]).unwrap();
        let predicate = compile(ColumnRef::new("region"), &list, FilterKind::String).unwrap();
        let (sql, params) = FilterWhere::generate(&predicate);

        assert_eq!(sql, "(\"region\" = $1)");
        assert!(!sql.contains("DROP"));
        assert_eq!(params, vec![FilterValue::text("nat'; DROP TABLE fluview; --")]);
    }

    #[test]
    fn disjunction_stays_parenthesized_under_and() {
        let epiweeks = compile(EPIWEEK, &FilterList::integers([1, 2]).unwrap(), FilterKind::Integer).unwrap();
        let regions = compile(
            ColumnRef::qualified("fv", "region"),
            &FilterList::strings(["nat"]).unwrap(),
            FilterKind::String,
        )
        .unwrap();

        let (sql, _) = FilterWhere::generate(&Predicate::and([epiweeks, regions]));
        assert_eq!(
            sql,
            "((fv.\"epiweek\" = $1) OR (fv.\"epiweek\" = $2)) AND ((fv.\"region\" = $3))"
        );
    }

    #[test]
    fn and_flattens_nested_conjunctions() {
        let inner = Predicate::and([Predicate::Fixed("a"), Predicate::Fixed("b")]);
        let outer = Predicate::and([inner, Predicate::Fixed("c")]);
        assert_eq!(
            outer,
            Predicate::And(vec![Predicate::Fixed("a"), Predicate::Fixed("b"), Predicate::Fixed("c")])
        );
    }

    #[test]
    fn empty_in_matches_nothing() {
        let predicate = Predicate::In { column: EPIWEEK, values: vec![] };
        assert_eq!(FilterWhere::generate(&predicate).0, "1=0");
    }

    #[test]
    fn compile_is_deterministic() {
        let list = FilterList::integers([3, 1, 2]).unwrap();
        let a = compile(EPIWEEK, &list, FilterKind::Integer).unwrap();
        let b = compile(EPIWEEK, &list, FilterKind::Integer).unwrap();
        assert_eq!(FilterWhere::generate(&a), FilterWhere::generate(&b));
    }

    fn spec_strategy() -> impl Strategy<Value = FilterSpec> {
        prop_oneof![
            (0i64..200).prop_map(|v| FilterSpec::Scalar(FilterValue::Integer(v))),
            (0i64..200, 0i64..20).prop_map(|(low, width)| {
                FilterSpec::Range(FilterValue::Integer(low), FilterValue::Integer(low + width))
            }),
        ]
    }

    proptest! {
        #[test]
        fn compiled_predicate_matches_exactly_the_union(
            specs in prop::collection::vec(spec_strategy(), 1..8),
            samples in prop::collection::vec(-10i64..230, 1..50),
        ) {
            let list = FilterList::new(FilterKind::Integer, specs.clone()).unwrap();
            let predicate = compile(EPIWEEK, &list, FilterKind::Integer).unwrap();

            for spec in &specs {
                let member = match spec {
                    FilterSpec::Scalar(v) => v.clone(),
                    FilterSpec::Range(low, _) => low.clone(),
                };
                prop_assert!(evaluate(&predicate, &member));
            }

            for sample in samples {
                let value = FilterValue::Integer(sample);
                let expected = specs.iter().any(|spec| spec.contains(&value));
                prop_assert_eq!(evaluate(&predicate, &value), expected);
            }
        }

        #[test]
        fn placeholders_match_bound_values(specs in prop::collection::vec(spec_strategy(), 1..8)) {
            let list = FilterList::new(FilterKind::Integer, specs.clone()).unwrap();
            let predicate = compile(EPIWEEK, &list, FilterKind::Integer).unwrap();
            let (sql, params) = FilterWhere::generate(&predicate);

            let expected: usize = specs.iter().map(|s| match s {
                FilterSpec::Scalar(_) => 1,
                FilterSpec::Range(_, _) => 2,
            }).sum();
            prop_assert_eq!(params.len(), expected);
            prop_assert_eq!(sql.matches('$').count(), expected);
        }
    }
}
