//! Chain table data model.

use std::collections::HashSet;

/// One chain as displayed in the ranking table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowRecord {
    /// Displayed ordinal position; the row's identity.
    pub rank: u64,
    pub chain_name: String,
    pub protocol_count: u64,
    /// Display text as rendered (e.g. "$1.2B"), deliberately left unparsed.
    pub total_value_locked: String,
}

/// Rows discovered during one extraction, keyed by rank.
///
/// The first observation of a rank wins; later ones are ignored. Iteration
/// follows insertion order, i.e. discovery order.
#[derive(Debug, Clone, Default)]
pub struct ChainTable {
    rows: Vec<RowRecord>,
    ranks: HashSet<u64>,
}

impl ChainTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row unless its rank was already seen. Returns whether it was inserted.
    pub fn insert(&mut self, record: RowRecord) -> bool {
        if !self.ranks.insert(record.rank) {
            return false;
        }
        self.rows.push(record);
        true
    }

    pub fn contains(&self, rank: u64) -> bool {
        self.ranks.contains(&rank)
    }

    pub fn get(&self, rank: u64) -> Option<&RowRecord> {
        if !self.contains(rank) {
            return None;
        }
        self.rows.iter().find(|r| r.rank == rank)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RowRecord> {
        self.rows.iter()
    }

    pub fn into_rows(self) -> Vec<RowRecord> {
        self.rows
    }
}

impl<'a> IntoIterator for &'a ChainTable {
    type Item = &'a RowRecord;
    type IntoIter = std::slice::Iter<'a, RowRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
