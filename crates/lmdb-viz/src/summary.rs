//! Space usage summary of a crawled store.

use serde::Serialize;

use crate::extent::{ExtentIndex, RecordKind};
use crate::palette::{color_for, Color};

/// Space used by one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub id: u16,
    pub name: String,
    pub key_bytes: u64,
    pub value_bytes: u64,
    /// Share of all occupied bytes, in percent.
    pub key_percent: f64,
    pub value_percent: f64,
    pub key_color: Color,
    pub value_color: Color,
}

/// Totals and per-table usage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub tables: Vec<TableSummary>,
    pub total_bytes: u64,
    pub file_size: u64,
    pub map_size: u64,
}

impl Summary {
    pub fn new(index: &ExtentIndex) -> Self {
        let total_bytes = index.total_bytes();
        let tables = index
            .tables()
            .iter()
            .map(|table| {
                let space = index.table_space(table.id).unwrap_or_default();
                TableSummary {
                    id: table.id,
                    name: table.name.clone(),
                    key_bytes: space.key_bytes,
                    value_bytes: space.value_bytes,
                    key_percent: percent(space.key_bytes, total_bytes),
                    value_percent: percent(space.value_bytes, total_bytes),
                    key_color: color_for(table.id, RecordKind::Key),
                    value_color: color_for(table.id, RecordKind::Value),
                }
            })
            .collect();

        Self {
            tables,
            total_bytes,
            file_size: index.file_size(),
            map_size: index.map_size(),
        }
    }
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    100.0 * part as f64 / total as f64
}
