// src/aggregation/table.rs

use super::stats::ColumnStats;
use crate::evaluation::{EvaluationRecord, FieldValue};

pub const STATS_ROWS: [&str; 5] = ["Sum", "Mean", "Std", "Min", "Max"];

/// Row-labelled table of named columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<(String, Vec<FieldValue>)>,
}

impl Table {
    /// Build from labelled `(column, value)` rows. Columns keep their order of
    /// first appearance; cells a row does not carry are missing.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<(String, FieldValue)>)>,
    {
        let rows: Vec<(String, Vec<(String, FieldValue)>)> = rows.into_iter().collect();

        let mut columns: Vec<String> = Vec::new();
        for (_, cells) in &rows {
            for (name, _) in cells {
                if !columns.contains(name) {
                    columns.push(name.clone());
                }
            }
        }

        let rows = rows
            .into_iter()
            .map(|(label, cells)| {
                let values = columns
                    .iter()
                    .map(|c| {
                        cells
                            .iter()
                            .find(|(name, _)| name == c)
                            .map(|(_, v)| v.clone())
                            .unwrap_or(FieldValue::Missing)
                    })
                    .collect();
                (label, values)
            })
            .collect();

        Self { columns, rows }
    }

    /// One row per evaluation record, labelled by trial
    pub fn from_records(records: &[EvaluationRecord]) -> Self {
        Self::from_rows(records.iter().map(|r| (r.trial_label.clone(), r.columns())))
    }

    pub fn column_values(&self, column: usize) -> impl Iterator<Item = &FieldValue> {
        self.rows.iter().map(move |(_, values)| &values[column])
    }

    /// Copy of the table with `Sum, Mean, Std, Min, Max` rows appended.
    /// Text columns stay empty in those rows.
    pub fn with_stats(&self) -> Self {
        let mut per_row: Vec<Vec<FieldValue>> = vec![Vec::new(); STATS_ROWS.len()];

        for col in 0..self.columns.len() {
            let numeric = self
                .column_values(col)
                .any(|v| !matches!(v, FieldValue::Text(_)) && v.as_f64().is_some());
            if !numeric {
                for row in per_row.iter_mut() {
                    row.push(FieldValue::Missing);
                }
                continue;
            }

            let stats = ColumnStats::describe(self.column_values(col).map(|v| v.as_f64()));
            let cells = [
                Some(stats.sum),
                stats.mean,
                stats.std,
                stats.min,
                stats.max,
            ];
            for (row, cell) in per_row.iter_mut().zip(cells) {
                row.push(cell.map_or(FieldValue::Missing, FieldValue::Float));
            }
        }

        let mut table = self.clone();
        for (label, values) in STATS_ROWS.iter().zip(per_row) {
            table.rows.push((label.to_string(), values));
        }
        table
    }
}
