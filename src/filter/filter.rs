use super::filter_order::FilterOrder;
use super::filter_where::{FilterWhere, Predicate};
use super::types::{ColumnRef, FilterOrderInfo, FilterValue, SqlResult};

/// One expression in the SELECT list.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectExpr {
    Column(ColumnRef),
    Sum(ColumnRef),
    Max(ColumnRef),
    Null,
    /// Constant text label bound as a parameter (region codes in rollups).
    Label(FilterValue),
    /// Constant SQL expression from the source catalog.
    Fixed(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectField {
    pub expr: SelectExpr,
    pub alias: Option<&'static str>,
}

impl SelectField {
    pub fn column(column: ColumnRef) -> Self {
        Self { expr: SelectExpr::Column(column), alias: None }
    }

    pub fn aliased(expr: SelectExpr, alias: &'static str) -> Self {
        Self { expr, alias: Some(alias) }
    }

    fn render(&self, filter_where: &mut FilterWhere) -> String {
        let expr = match &self.expr {
            SelectExpr::Column(c) => c.to_sql(),
            SelectExpr::Sum(c) => format!("sum({})", c.to_sql()),
            SelectExpr::Max(c) => format!("max({})", c.to_sql()),
            SelectExpr::Null => "NULL".to_string(),
            SelectExpr::Label(v) => format!("CAST({} AS TEXT)", filter_where.param(v.clone())),
            SelectExpr::Fixed(sql) => sql.to_string(),
        };
        match self.alias {
            Some(alias) => format!("{} AS \"{}\"", expr, alias),
            None => expr,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableSource {
    Table { name: &'static str, alias: &'static str },
    Subquery { filter: Box<Filter>, alias: &'static str },
}

impl TableSource {
    fn render(&self, filter_where: &mut FilterWhere) -> String {
        match self {
            TableSource::Table { name, alias } => format!("\"{}\" {}", name, alias),
            TableSource::Subquery { filter, alias } => format!("({}) {}", filter.render(filter_where), alias),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub source: TableSource,
    pub on: Predicate,
}

/// SELECT statement builder. Rendering walks the statement in textual order
/// so placeholder numbers and bound values always line up.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    from: TableSource,
    select_fields: Vec<SelectField>,
    joins: Vec<Join>,
    where_data: Option<Predicate>,
    group_by: Vec<ColumnRef>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
}

impl Filter {
    pub fn new(table_name: &'static str, alias: &'static str) -> Self {
        Self::from_source(TableSource::Table { name: table_name, alias })
    }

    /// Select from a derived table instead of a base table.
    pub fn from_subquery(filter: Filter, alias: &'static str) -> Self {
        Self::from_source(TableSource::Subquery { filter: Box::new(filter), alias })
    }

    fn from_source(from: TableSource) -> Self {
        Self {
            from,
            select_fields: vec![],
            joins: vec![],
            where_data: None,
            group_by: vec![],
            order_data: vec![],
            limit: None,
        }
    }

    pub fn select(mut self, fields: Vec<SelectField>) -> Self {
        self.select_fields = fields;
        self
    }

    pub fn join(mut self, source: TableSource, on: Predicate) -> Self {
        self.joins.push(Join { source, on });
        self
    }

    pub fn where_clause(mut self, predicate: Predicate) -> Self {
        self.where_data = Some(predicate);
        self
    }

    pub fn group_by(mut self, columns: Vec<ColumnRef>) -> Self {
        self.group_by = columns;
        self
    }

    pub fn order(mut self, order: Vec<FilterOrderInfo>) -> Self {
        self.order_data = order;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn fields(&self) -> &[SelectField] {
        &self.select_fields
    }

    pub fn where_data(&self) -> Option<&Predicate> {
        self.where_data.as_ref()
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn to_sql(&self) -> SqlResult {
        let mut filter_where = FilterWhere::new(0);
        let query = self.render(&mut filter_where);
        SqlResult { query, params: filter_where.into_params() }
    }

    fn render(&self, filter_where: &mut FilterWhere) -> String {
        let select_clause = if self.select_fields.is_empty() {
            "*".to_string()
        } else {
            self.select_fields
                .iter()
                .map(|f| f.render(filter_where))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let from_clause = self.from.render(filter_where);
        let join_clauses: Vec<String> = self
            .joins
            .iter()
            .map(|j| {
                let source = j.source.render(filter_where);
                format!("JOIN {} ON {}", source, filter_where.render(&j.on))
            })
            .collect();
        let where_clause = match &self.where_data {
            Some(predicate) => format!("WHERE {}", filter_where.render(predicate)),
            None => String::new(),
        };
        let limit_clause = match self.limit {
            Some(l) => format!("LIMIT {}", l),
            None => String::new(),
        };

        [
            format!("SELECT {}", select_clause),
            format!("FROM {}", from_clause),
            join_clauses.join(" "),
            where_clause,
            FilterOrder::generate_group(&self.group_by),
            FilterOrder::generate(&self.order_data),
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPIWEEK: ColumnRef = ColumnRef::qualified("c", "epiweek");

    #[test]
    fn renders_grouped_select_with_label() {
        let filter = Filter::new("cdc_extract", "c")
            .select(vec![
                SelectField::aliased(SelectExpr::Label(FilterValue::text("hhs1")), "location"),
                SelectField::column(EPIWEEK),
                SelectField::aliased(SelectExpr::Sum(ColumnRef::qualified("c", "total")), "total"),
            ])
            .where_clause(Predicate::eq(EPIWEEK, FilterValue::Integer(201501)))
            .group_by(vec![EPIWEEK])
            .order(vec![FilterOrderInfo::asc(EPIWEEK)]);

        let sql = filter.to_sql();
        assert_eq!(
            sql.query,
            "SELECT CAST($1 AS TEXT) AS \"location\", c.\"epiweek\", sum(c.\"total\") AS \"total\" \
             FROM \"cdc_extract\" c WHERE c.\"epiweek\" = $2 GROUP BY c.\"epiweek\" ORDER BY c.\"epiweek\" ASC"
        );
        assert_eq!(sql.params, vec![FilterValue::text("hhs1"), FilterValue::Integer(201501)]);
    }

    #[test]
    fn numbers_subquery_params_before_outer_where() {
        let inner = Filter::new("t", "t").where_clause(Predicate::eq(ColumnRef::new("a"), FilterValue::Integer(1)));
        let filter = Filter::new("t", "t")
            .join(
                TableSource::Subquery { filter: Box::new(inner), alias: "x" },
                Predicate::columns_eq(ColumnRef::qualified("x", "a"), ColumnRef::qualified("t", "a")),
            )
            .where_clause(Predicate::eq(ColumnRef::qualified("t", "b"), FilterValue::Integer(2)))
            .limit(10);

        let sql = filter.to_sql();
        assert_eq!(
            sql.query,
            "SELECT * FROM \"t\" t JOIN (SELECT * FROM \"t\" t WHERE \"a\" = $1) x ON x.\"a\" = t.\"a\" \
             WHERE t.\"b\" = $2 LIMIT 10"
        );
        assert_eq!(sql.params, vec![FilterValue::Integer(1), FilterValue::Integer(2)]);
    }

    #[test]
    fn selects_from_a_derived_table() {
        let inner = Filter::new("wiki", "w").where_clause(Predicate::eq(ColumnRef::qualified("w", "language"), FilterValue::text("en")));
        let filter = Filter::from_subquery(inner, "w")
            .select(vec![SelectField::column(ColumnRef::qualified("w", "article"))])
            .where_clause(Predicate::eq(ColumnRef::qualified("w", "article"), FilterValue::text("influenza")));

        let sql = filter.to_sql();
        assert_eq!(
            sql.query,
            "SELECT w.\"article\" FROM (SELECT * FROM \"wiki\" w WHERE w.\"language\" = $1) w WHERE w.\"article\" = $2"
        );
        assert_eq!(sql.params, vec![FilterValue::text("en"), FilterValue::text("influenza")]);
    }
}
