//! Struct-of-arrays tables keyed by an integer id.
//!
//! A table stores one `Vec` per column plus an id→row index. Rows are never
//! allocated individually; bulk updates walk the columns directly.
//!
//! # Invariants
//! - Every column has the same length as the key column.
//! - `index[id] == row` for every row, and ids are unique.
//! - Failed operations leave the table untouched (validation runs before writes).

mod schema;
mod table;

pub use table::{StoreError, Table};

/// Key column type shared by every schema.
pub type Key = i32;

/// Column-major storage for one schema, generated by [`columnar_schema!`].
///
/// `Table` owns the id index; implementors only move values between columns.
pub trait Columns: Clone + Default + PartialEq + std::fmt::Debug {
    /// One row, by value.
    type Row: Copy + PartialEq + std::fmt::Debug;
    /// Partial update for a single row. `None` columns are left alone.
    type Patch: Copy + Default + std::fmt::Debug;
    /// Borrowed column slices for a scatter write across many rows.
    type Bulk<'a>: Copy + Default;

    /// Column names, key column first.
    const NAMES: &'static [&'static str];

    fn len(&self) -> usize;
    fn ids(&self) -> &[Key];
    fn row_key(row: &Self::Row) -> Key;
    fn row(&self, index: usize) -> Self::Row;
    fn push(&mut self, row: Self::Row);
    fn patch(&mut self, index: usize, patch: &Self::Patch);
    /// Name and length of every column present in `bulk`.
    fn bulk_lengths(bulk: &Self::Bulk<'_>) -> Vec<(&'static str, usize)>;
    /// Write entry `source` of every present bulk column into row `index`.
    fn scatter(&mut self, index: usize, bulk: &Self::Bulk<'_>, source: usize);
    fn swap_remove(&mut self, index: usize);
    fn clear(&mut self);
    fn reserve(&mut self, additional: usize);
    /// Overwrite with `other`, reusing existing allocations.
    fn copy_from(&mut self, other: &Self);
}

pub fn crate_info() -> &'static str {
    "playback-soa v0.1.0"
}
