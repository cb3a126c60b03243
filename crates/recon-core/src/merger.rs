//! Merge strategies for reconciling a stored table with a new upload
//!
//! This module provides:
//! - The [`MergeRequest`] describing strategy, row key, and conflict rule
//! - Four merge strategies (append rows, extend columns, full union,
//!   automatic selection)
//! - Shared row-matching and conflict-resolution primitives

use crate::analyzer::fingerprint;
use crate::error::{Error, Result, Side};
use crate::table::{Row, Table};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One of the four merge algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Keep the old structure, append rows new in the upload
    PreserveStructure,
    /// Keep the old rows, extend the structure with new columns
    ExtendStructure,
    /// Full union of columns and rows
    FullMerge,
    /// Pick one of the above from the shape of the change
    Auto,
}

impl Strategy {
    /// Parse the numeric identifier used by external callers
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            1 => Ok(Strategy::PreserveStructure),
            2 => Ok(Strategy::ExtendStructure),
            3 => Ok(Strategy::FullMerge),
            4 => Ok(Strategy::Auto),
            other => Err(Error::UnknownStrategy(other.to_string())),
        }
    }

    /// The numeric identifier of this strategy
    pub fn code(&self) -> u8 {
        match self {
            Strategy::PreserveStructure => 1,
            Strategy::ExtendStructure => 2,
            Strategy::FullMerge => 3,
            Strategy::Auto => 4,
        }
    }
}

/// Policy for a cell present with different values on both sides
///
/// `TakeNew` and `PreferNew` behave identically; both names are kept
/// until product intent distinguishes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictRule {
    /// Rule A: keep the old value
    KeepOld,
    /// Rule B: take the new value when it is non-null
    TakeNew,
    /// Rule C: take the new value when it is non-null
    PreferNew,
}

impl ConflictRule {
    /// Parse the letter identifier used by external callers
    pub fn from_code(code: char) -> Result<Self> {
        match code {
            'A' => Ok(ConflictRule::KeepOld),
            'B' => Ok(ConflictRule::TakeNew),
            'C' => Ok(ConflictRule::PreferNew),
            other => Err(Error::UnknownConflictRule(other.to_string())),
        }
    }

    fn takes_new(&self) -> bool {
        !matches!(self, ConflictRule::KeepOld)
    }
}

/// How rows of the old and new table are matched to each other
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyColumn {
    /// Match by the value of one named column
    Column(String),
    /// Match by fingerprint over all common columns
    AllColumns,
    /// No identity; every uploaded row counts as new
    NoKey,
}

/// A full description of one merge operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeRequest {
    /// Which merge algorithm to run
    pub strategy: Strategy,
    /// How rows are identified across the two tables
    pub key_column: KeyColumn,
    /// How contested cells are resolved
    pub conflict_rule: ConflictRule,
    /// Columns the caller designates as contestable (present on both
    /// sides); other shared columns follow each strategy's own policy
    pub contested_columns: Vec<String>,
}

impl MergeRequest {
    /// Create a request with no contested columns
    pub fn new(strategy: Strategy, key_column: KeyColumn, conflict_rule: ConflictRule) -> Self {
        Self {
            strategy,
            key_column,
            conflict_rule,
            contested_columns: Vec::new(),
        }
    }

    /// Designate columns as contestable
    pub fn with_contested<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contested_columns = columns.into_iter().map(Into::into).collect();
        self
    }
}

/// The result of a merge: the new table plus a summary for the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedTable {
    /// The merged table
    pub table: Table,
    /// Human-readable description of what changed
    pub summary: String,
}

/// Merge two tables according to the request
///
/// Inputs are never mutated; the same `(old, new, request)` always
/// produces the same output.
pub fn merge(old: &Table, new: &Table, request: &MergeRequest) -> Result<MergedTable> {
    if let KeyColumn::Column(name) = &request.key_column {
        if !old.has_column(name) {
            return Err(Error::InvalidKeyColumn {
                column: name.clone(),
                side: Side::Old,
            });
        }
        if !new.has_column(name) {
            return Err(Error::InvalidKeyColumn {
                column: name.clone(),
                side: Side::New,
            });
        }
    }

    tracing::debug!(
        strategy = request.strategy.code(),
        old_rows = old.row_count(),
        new_rows = new.row_count(),
        "applying merge strategy"
    );

    let merged = match request.strategy {
        Strategy::PreserveStructure => apply_preserve_structure(old, new, request),
        Strategy::ExtendStructure => apply_extend_structure(old, new, request),
        Strategy::FullMerge => apply_full_merge(old, new, request),
        Strategy::Auto => apply_auto(old, new, request),
    };

    tracing::info!(
        rows = merged.table.row_count(),
        columns = merged.table.column_count(),
        summary = %merged.summary,
        "merge complete"
    );

    Ok(merged)
}

/// Identity key of a row under the requested matching policy
///
/// `None` means the row has no identity (no-key matching, or
/// all-columns matching with nothing in common).
fn row_key(row: &Row, key: &KeyColumn, common: &[String]) -> Option<Vec<String>> {
    match key {
        KeyColumn::Column(name) => Some(vec![row.get(name).to_key_string()]),
        KeyColumn::AllColumns => {
            if common.is_empty() {
                None
            } else {
                Some(fingerprint(row, common))
            }
        }
        KeyColumn::NoKey => None,
    }
}

/// Index a table's rows by identity key; the first occurrence wins
fn index_by_key(table: &Table, key: &KeyColumn, common: &[String]) -> HashMap<Vec<String>, usize> {
    let mut index = HashMap::new();
    for (idx, row) in table.rows.iter().enumerate() {
        if let Some(k) = row_key(row, key, common) {
            index.entry(k).or_insert(idx);
        }
    }
    index
}

/// Indices of new-table rows with no counterpart in the old table
fn find_new_rows(old: &Table, new: &Table, key: &KeyColumn, common: &[String]) -> Vec<usize> {
    let old_keys = index_by_key(old, key, common);
    new.rows
        .iter()
        .enumerate()
        .filter_map(|(idx, row)| match row_key(row, key, common) {
            Some(k) if old_keys.contains_key(&k) => None,
            _ => Some(idx),
        })
        .collect()
}

/// Copy non-null values of the given columns from a matched new row
fn fill_new_columns(target: &mut Row, new_row: &Row, columns: &[String]) {
    for column in columns {
        let value = new_row.get(column);
        if !value.is_null() {
            target.set(column.clone(), value.clone());
        }
    }
}

/// Apply the conflict rule to the contested columns of a matched row
///
/// Returns the number of cells that actually changed.
fn resolve_conflicts(
    target: &mut Row,
    new_row: &Row,
    rule: ConflictRule,
    contested: &[String],
) -> usize {
    if !rule.takes_new() {
        return 0;
    }

    let mut changed = 0;
    for column in contested {
        let value = new_row.get(column);
        if !value.is_null() && target.get(column) != value {
            target.set(column.clone(), value.clone());
            changed += 1;
        }
    }
    changed
}

/// Contested columns restricted to those both tables actually have
fn effective_contested(request: &MergeRequest, old: &Table, new: &Table) -> Vec<String> {
    request
        .contested_columns
        .iter()
        .filter(|c| old.has_column(c) && new.has_column(c))
        .cloned()
        .collect()
}

/// Strategy 1: keep the old structure, append rows new in the upload
fn apply_preserve_structure(old: &Table, new: &Table, request: &MergeRequest) -> MergedTable {
    let common = old.common_columns(new);
    let mut table = old.clone();

    if common.is_empty() {
        return MergedTable {
            table,
            summary: "No common columns; no rows appended".to_string(),
        };
    }

    let appended = find_new_rows(old, new, &request.key_column, &common);
    for &idx in &appended {
        table.rows.push(new.rows[idx].project(&table.columns));
    }

    // With a take-new rule and an explicit key, matched existing rows
    // also get their contested columns refreshed from the upload
    let mut updated = 0;
    if request.conflict_rule.takes_new() && matches!(request.key_column, KeyColumn::Column(_)) {
        let contested = effective_contested(request, old, new);
        if !contested.is_empty() {
            let new_index = index_by_key(new, &request.key_column, &common);
            for row in table.rows.iter_mut().take(old.row_count()) {
                if let Some(k) = row_key(row, &request.key_column, &common) {
                    if let Some(&m) = new_index.get(&k) {
                        if resolve_conflicts(row, &new.rows[m], request.conflict_rule, &contested)
                            > 0
                        {
                            updated += 1;
                        }
                    }
                }
            }
        }
    }

    let mut summary = if appended.is_empty() {
        "No new rows to append".to_string()
    } else {
        format!("Appended {} new rows", appended.len())
    };
    if updated > 0 {
        summary.push_str(&format!("; updated {} existing rows", updated));
    }

    MergedTable { table, summary }
}

/// Strategy 2: keep the old rows, extend the structure with new columns
fn apply_extend_structure(old: &Table, new: &Table, request: &MergeRequest) -> MergedTable {
    let added: Vec<String> = new
        .columns
        .iter()
        .filter(|c| !old.has_column(c))
        .cloned()
        .collect();
    let common = old.common_columns(new);
    let contested = effective_contested(request, old, new);

    let mut table = old.clone();
    table.columns.extend(added.iter().cloned());

    if !matches!(request.key_column, KeyColumn::NoKey) {
        let new_index = index_by_key(new, &request.key_column, &common);
        for row in table.rows.iter_mut() {
            if let Some(k) = row_key(row, &request.key_column, &common) {
                if let Some(&m) = new_index.get(&k) {
                    fill_new_columns(row, &new.rows[m], &added);
                    resolve_conflicts(row, &new.rows[m], request.conflict_rule, &contested);
                }
            }
        }
    }

    let summary = if added.is_empty() {
        "No new columns to add".to_string()
    } else {
        format!("Added {} new columns", added.len())
    };

    MergedTable { table, summary }
}

/// Strategy 3: full union of columns and rows
fn apply_full_merge(old: &Table, new: &Table, request: &MergeRequest) -> MergedTable {
    let added: Vec<String> = new
        .columns
        .iter()
        .filter(|c| !old.has_column(c))
        .cloned()
        .collect();
    let common = old.common_columns(new);
    let contested = effective_contested(request, old, new);

    let mut table = old.clone();
    table.columns.extend(added);

    // Matched existing rows take the upload's values across every
    // new-table column; only contested columns go through the rule
    let mut matched: HashSet<usize> = HashSet::new();
    if !matches!(request.key_column, KeyColumn::NoKey) {
        let new_index = index_by_key(new, &request.key_column, &common);
        for row in table.rows.iter_mut() {
            let Some(k) = row_key(row, &request.key_column, &common) else {
                continue;
            };
            let Some(&m) = new_index.get(&k) else {
                continue;
            };
            matched.insert(m);
            let new_row = &new.rows[m];
            for column in &new.columns {
                if contested.contains(column) {
                    continue;
                }
                row.set(column.clone(), new_row.get(column).clone());
            }
            resolve_conflicts(row, new_row, request.conflict_rule, &contested);
        }
    }

    for (idx, row) in new.rows.iter().enumerate() {
        if !matched.contains(&idx) {
            table.rows.push(row.project(&table.columns));
        }
    }

    let summary = format!(
        "Merged table has {} rows and {} columns",
        table.row_count(),
        table.column_count()
    );

    MergedTable { table, summary }
}

/// Strategy 4: pick a strategy from the shape of the change
///
/// The dispatch is a pure function of the added-column and added-row
/// counts and must stay reproducible.
fn apply_auto(old: &Table, new: &Table, request: &MergeRequest) -> MergedTable {
    let added_columns = new.columns.iter().filter(|c| !old.has_column(c)).count();
    let common = old.common_columns(new);
    let added_rows = find_new_rows(old, new, &request.key_column, &common).len();

    let chosen = if added_columns >= 2 && added_rows >= 2 {
        Strategy::FullMerge
    } else if added_columns > added_rows {
        Strategy::ExtendStructure
    } else {
        Strategy::PreserveStructure
    };

    tracing::debug!(
        added_columns,
        added_rows,
        strategy = chosen.code(),
        "auto-selected merge strategy"
    );

    let mut merged = match chosen {
        Strategy::PreserveStructure => apply_preserve_structure(old, new, request),
        Strategy::ExtendStructure => apply_extend_structure(old, new, request),
        Strategy::FullMerge => apply_full_merge(old, new, request),
        Strategy::Auto => unreachable!("auto never dispatches to itself"),
    };
    merged.summary = format!("Auto-selected strategy {}: {}", chosen.code(), merged.summary);
    merged
}
