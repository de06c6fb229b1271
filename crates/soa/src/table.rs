use std::collections::{HashMap, HashSet};
use std::ops::Range;

use crate::{Columns, Key};

/// Errors from table operations.
///
/// Each one means the caller handed the table ids or arrays that disagree with
/// its contents; the table itself is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("no row with id {id}")]
    NotFound { id: Key },
    #[error("row with id {id} already exists")]
    DuplicateKey { id: Key },
    #[error("column `{column}` has {actual} entries, expected {expected}")]
    LengthMismatch {
        column: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// A keyed struct-of-arrays table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table<C: Columns> {
    columns: C,
    index: HashMap<Key, usize>,
}

impl<C: Columns> Table<C> {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live rows.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.len() == 0
    }

    /// Whether a row with `id` is present.
    pub fn contains(&self, id: Key) -> bool {
        self.index.contains_key(&id)
    }

    /// Row index of `id`, if present. Indices shift on deletion.
    pub fn index_of(&self, id: Key) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Read-only access to the raw columns, in row order.
    pub fn columns(&self) -> &C {
        &self.columns
    }

    /// Key column, in row order.
    pub fn ids(&self) -> &[Key] {
        self.columns.ids()
    }

    /// Append rows. Returns the row range they occupy.
    ///
    /// Fails with `DuplicateKey` if an id is already stored or repeats within
    /// `rows`; nothing is inserted in that case.
    pub fn insert_bulk<I>(&mut self, rows: I) -> Result<Range<usize>, StoreError>
    where
        I: IntoIterator<Item = C::Row>,
    {
        let rows: Vec<C::Row> = rows.into_iter().collect();
        let mut seen = HashSet::with_capacity(rows.len());
        for row in &rows {
            let id = C::row_key(row);
            if self.index.contains_key(&id) || !seen.insert(id) {
                return Err(StoreError::DuplicateKey { id });
            }
        }

        let start = self.columns.len();
        self.columns.reserve(rows.len());
        self.index.reserve(rows.len());
        for row in rows {
            self.index.insert(C::row_key(&row), self.columns.len());
            self.columns.push(row);
        }
        Ok(start..self.columns.len())
    }

    /// Update the columns set in `patch` for one row.
    pub fn alter(&mut self, id: Key, patch: &C::Patch) -> Result<(), StoreError> {
        let index = self.index_of(id).ok_or(StoreError::NotFound { id })?;
        self.columns.patch(index, patch);
        Ok(())
    }

    /// Scatter-write every column present in `bulk`: entry `i` of each column
    /// goes to the row keyed `ids[i]`.
    pub fn alter_bulk(&mut self, ids: &[Key], bulk: &C::Bulk<'_>) -> Result<(), StoreError> {
        for (column, actual) in C::bulk_lengths(bulk) {
            if actual != ids.len() {
                return Err(StoreError::LengthMismatch {
                    column,
                    expected: ids.len(),
                    actual,
                });
            }
        }
        let indices = ids
            .iter()
            .map(|&id| self.index_of(id).ok_or(StoreError::NotFound { id }))
            .collect::<Result<Vec<_>, _>>()?;
        for (source, index) in indices.into_iter().enumerate() {
            self.columns.scatter(index, bulk, source);
        }
        Ok(())
    }

    /// Full row for `id`.
    pub fn lookup(&self, id: Key) -> Result<C::Row, StoreError> {
        self.get(id).ok_or(StoreError::NotFound { id })
    }

    pub fn get(&self, id: Key) -> Option<C::Row> {
        self.index_of(id).map(|index| self.columns.row(index))
    }

    /// Row index for each id; `None` where the id is absent.
    pub fn lookup_indices(&self, ids: &[Key]) -> Vec<Option<usize>> {
        ids.iter().map(|&id| self.index_of(id)).collect()
    }

    /// Remove rows by swap-removal. Returns the removed rows in `ids` order.
    ///
    /// Every id must be present exactly once; otherwise nothing is removed.
    pub fn delete_bulk(&mut self, ids: &[Key]) -> Result<Vec<C::Row>, StoreError> {
        let mut seen = HashSet::with_capacity(ids.len());
        for &id in ids {
            if !self.index.contains_key(&id) || !seen.insert(id) {
                return Err(StoreError::NotFound { id });
            }
        }

        let mut removed = Vec::with_capacity(ids.len());
        for &id in ids {
            let Some(index) = self.index.remove(&id) else {
                continue;
            };
            removed.push(self.columns.row(index));
            self.columns.swap_remove(index);
            if index < self.columns.len() {
                let moved = self.columns.ids()[index];
                self.index.insert(moved, index);
            }
        }
        Ok(removed)
    }

    /// Truncate to zero rows. Capacity is kept.
    pub fn clear(&mut self) {
        self.columns.clear();
        self.index.clear();
    }

    /// Replace the contents with a deep copy of `other`.
    pub fn copy_from(&mut self, other: &Self) {
        self.columns.copy_from(&other.columns);
        self.index.clone_from(&other.index);
    }

    /// Rows by value, in storage order.
    pub fn iter(&self) -> impl Iterator<Item = C::Row> + '_ {
        (0..self.columns.len()).map(move |index| self.columns.row(index))
    }
}
