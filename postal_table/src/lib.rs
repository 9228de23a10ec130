//! Alignment of independently sampled series into one wide table.
#![deny(missing_docs)]

pub mod filter;
pub mod merge;

use postal_codec::{Timestamp, Value};
use serde::Serialize;

pub use filter::{filter, FilterAlignmentError};
pub use merge::merge;

/// One table row: a timestamp and one optional value per merged column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    /// Row time.
    pub timestamp: Timestamp,
    /// Column values, `None` where the column has no sample at this time.
    pub values: Vec<Option<Value>>,
}

impl Row {
    /// Row with `columns` empty cells.
    pub fn blank(timestamp: Timestamp, columns: usize) -> Self {
        Self {
            timestamp,
            values: vec![None; columns],
        }
    }

    /// Width counting the timestamp cell.
    #[inline]
    pub fn width(&self) -> usize {
        1 + self.values.len()
    }
}

/// Rows strictly ascending by timestamp, all of width `1 + columns`.
///
/// A fresh table holds a single all-null sentinel row; the first merged
/// series moves that row to its own first timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WideTable {
    rows: Vec<Row>,
    columns: usize,
}

impl Default for WideTable {
    fn default() -> Self {
        Self::new()
    }
}

impl WideTable {
    /// Table with the bootstrap sentinel row and no columns.
    pub fn new() -> Self {
        Self {
            rows: vec![Row::blank(0.0, 0)],
            columns: 0,
        }
    }

    /// Rows in ascending time order.
    #[inline]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows. Never true for a table built by [`WideTable::new`].
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of merged columns.
    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Row width including the timestamp cell.
    #[inline]
    pub fn width(&self) -> usize {
        1 + self.columns
    }

    /// Read column `index` back as `(timestamp, value)` pairs, skipping nulls.
    pub fn column(&self, index: usize) -> Option<Vec<(Timestamp, Value)>> {
        if index >= self.columns {
            return None;
        }
        Some(
            self.rows
                .iter()
                .filter_map(|row| row.values[index].map(|v| (row.timestamp, v)))
                .collect(),
        )
    }

    /// Remove column `index` from every row. Returns `false` if it does not exist.
    ///
    /// Rows left without any value are dropped, so every remaining row
    /// belongs to a timestamp some plotted series produced. A table that
    /// loses all its rows gets the sentinel row back.
    pub fn remove_column(&mut self, index: usize) -> bool {
        if index >= self.columns {
            return false;
        }
        for row in &mut self.rows {
            row.values.remove(index);
        }
        self.columns -= 1;
        self.rows.retain(|row| row.values.iter().any(Option::is_some));
        if self.rows.is_empty() {
            self.rows.push(Row::blank(0.0, self.columns));
        }
        true
    }

    /// Check the ordering and width invariants.
    pub fn is_consistent(&self) -> bool {
        self.rows
            .iter()
            .all(|r| r.values.len() == self.columns && r.timestamp.is_finite())
            && self.rows.windows(2).all(|w| w[0].timestamp < w[1].timestamp)
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Row> {
        &mut self.rows
    }

    pub(crate) fn set_columns(&mut self, columns: usize) {
        self.columns = columns;
    }
}
