use super::types::{ColumnRef, FilterOrderInfo};

pub struct FilterOrder;

impl FilterOrder {
    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("{} {}", i.column.to_sql(), i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }

    pub fn generate_group(columns: &[ColumnRef]) -> String {
        if columns.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = columns.iter().map(|c| c.to_sql()).collect();
        format!("GROUP BY {}", parts.join(", "))
    }
}
