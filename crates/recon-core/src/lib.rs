//! recon-core: Core library for diffing and merging tabular datasets
//!
//! This library provides functionality to:
//! - Represent tables as ordered columns plus rows of nullable scalars
//! - Compute a structural and cell-level diff between two tables
//! - Merge an old and a new table under one of four strategies, with a
//!   caller-chosen row key and conflict-resolution rule
//!
//! Format decoding and persistence are the caller's concern; the engine
//! works on already-decoded in-memory tables and returns new values
//! without mutating its inputs.

pub mod analyzer;
pub mod error;
pub mod merger;
pub mod table;

pub use analyzer::{diff, ChangedCell, DiffReport};
pub use error::{Error, Result, Side};
pub use merger::{merge, ConflictRule, KeyColumn, MergeRequest, MergedTable, Strategy};
pub use table::{CellValue, Row, Table};
