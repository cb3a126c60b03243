//! Structural and cell-level comparison of two tables
//!
//! This module provides:
//! - Column set comparison (added / removed / common)
//! - Row identity counts via order-preserving fingerprints
//! - Positional cell-level change detection over common columns

use crate::table::{CellValue, Row, Table};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Write as _;

/// A cell that differs between the two tables at the same row position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangedCell {
    /// Row position (0-based, shared by both tables)
    pub row: usize,
    /// Column name
    pub column: String,
    /// Value in the old table
    pub old_value: CellValue,
    /// Value in the new table
    pub new_value: CellValue,
}

/// Read-only snapshot of the differences between two tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffReport {
    /// Columns present only in the new table, in new-table order
    pub columns_added: Vec<String>,
    /// Columns present only in the old table, in old-table order
    pub columns_removed: Vec<String>,
    /// Columns present in both tables, in old-table order
    pub columns_common: Vec<String>,
    /// Distinct new-table rows absent from the old table
    pub rows_added: usize,
    /// Distinct old-table rows absent from the new table
    pub rows_removed: usize,
    /// Distinct rows present in both tables
    pub rows_common: usize,
    /// Row count of the old table
    pub old_row_count: usize,
    /// Row count of the new table
    pub new_row_count: usize,
    /// Column count of the old table
    pub old_column_count: usize,
    /// Column count of the new table
    pub new_column_count: usize,
    /// In-place edits detected by position over common columns
    pub changed_cells: Vec<ChangedCell>,
}

impl DiffReport {
    /// Whether anything differs between the two tables
    pub fn has_changes(&self) -> bool {
        !self.columns_added.is_empty()
            || !self.columns_removed.is_empty()
            || self.rows_added > 0
            || self.rows_removed > 0
            || !self.changed_cells.is_empty()
    }

    /// Format the report as a human-readable summary
    pub fn render(&self) -> String {
        // Listing caps keep the report readable for wide tables
        const MAX_LISTED: usize = 5;

        let mut out = String::new();
        let _ = writeln!(out, "Table comparison");
        let _ = writeln!(
            out,
            "  old: {} rows, {} columns",
            self.old_row_count, self.old_column_count
        );
        let _ = writeln!(
            out,
            "  new: {} rows, {} columns",
            self.new_row_count, self.new_column_count
        );

        let _ = writeln!(out, "Columns:");
        if self.columns_added.is_empty() {
            let _ = writeln!(out, "  added: none");
        } else {
            let _ = writeln!(out, "  added: {}", self.columns_added.len());
            for col in self.columns_added.iter().take(MAX_LISTED) {
                let _ = writeln!(out, "    - {}", col);
            }
            if self.columns_added.len() > MAX_LISTED {
                let _ = writeln!(
                    out,
                    "    ... and {} more",
                    self.columns_added.len() - MAX_LISTED
                );
            }
        }
        if self.columns_removed.is_empty() {
            let _ = writeln!(out, "  removed: none");
        } else {
            let _ = writeln!(out, "  removed: {}", self.columns_removed.len());
        }
        let _ = writeln!(out, "  common: {}", self.columns_common.len());

        let _ = writeln!(out, "Rows:");
        let _ = writeln!(out, "  added: {}", self.rows_added);
        let _ = writeln!(out, "  removed: {}", self.rows_removed);
        let _ = writeln!(out, "  common: {}", self.rows_common);

        if !self.changed_cells.is_empty() {
            let _ = writeln!(out, "Changed cells: {}", self.changed_cells.len());
        }

        out
    }
}

/// Compare two tables without mutating either
pub fn diff(old: &Table, new: &Table) -> DiffReport {
    tracing::debug!(
        old_rows = old.row_count(),
        new_rows = new.row_count(),
        "analyzing table differences"
    );

    let columns_common = old.common_columns(new);
    let columns_added: Vec<String> = new
        .columns
        .iter()
        .filter(|c| !old.has_column(c))
        .cloned()
        .collect();
    let columns_removed: Vec<String> = old
        .columns
        .iter()
        .filter(|c| !new.has_column(c))
        .cloned()
        .collect();

    // Row identity uses one canonical column order on both sides. With no
    // shared columns there is no identity basis, so every distinct row
    // counts as added or removed.
    let (rows_added, rows_removed, rows_common) = if columns_common.is_empty() {
        let old_distinct = fingerprint_set(old, &old.columns).len();
        let new_distinct = fingerprint_set(new, &new.columns).len();
        (new_distinct, old_distinct, 0)
    } else {
        let old_prints = fingerprint_set(old, &columns_common);
        let new_prints = fingerprint_set(new, &columns_common);
        (
            new_prints.difference(&old_prints).count(),
            old_prints.difference(&new_prints).count(),
            old_prints.intersection(&new_prints).count(),
        )
    };

    let changed_cells = changed_cells(old, new, &columns_common);

    let report = DiffReport {
        columns_added,
        columns_removed,
        columns_common,
        rows_added,
        rows_removed,
        rows_common,
        old_row_count: old.row_count(),
        new_row_count: new.row_count(),
        old_column_count: old.column_count(),
        new_column_count: new.column_count(),
        changed_cells,
    };

    tracing::debug!(
        rows_added = report.rows_added,
        rows_removed = report.rows_removed,
        changed_cells = report.changed_cells.len(),
        "analysis complete"
    );

    report
}

/// Identity fingerprint of a row: its normalized cell strings in the
/// given column order, compared by value
pub(crate) fn fingerprint(row: &Row, columns: &[String]) -> Vec<String> {
    columns.iter().map(|c| row.get(c).to_key_string()).collect()
}

/// All distinct row fingerprints of a table over the given columns
pub(crate) fn fingerprint_set(table: &Table, columns: &[String]) -> HashSet<Vec<String>> {
    table
        .rows
        .iter()
        .map(|row| fingerprint(row, columns))
        .collect()
}

/// Detect in-place edits: same position, common column, differing value
fn changed_cells(old: &Table, new: &Table, common: &[String]) -> Vec<ChangedCell> {
    let mut changes = Vec::new();
    let shared_len = old.row_count().min(new.row_count());

    for pos in 0..shared_len {
        let old_row = &old.rows[pos];
        let new_row = &new.rows[pos];

        for column in common {
            let old_value = old_row.get(column);
            let new_value = new_row.get(column);

            let changed = match (old_value.is_null(), new_value.is_null()) {
                (true, true) => false,
                (true, false) | (false, true) => true,
                (false, false) => old_value != new_value,
            };

            if changed {
                changes.push(ChangedCell {
                    row: pos,
                    column: column.clone(),
                    old_value: old_value.clone(),
                    new_value: new_value.clone(),
                });
            }
        }
    }

    changes
}
