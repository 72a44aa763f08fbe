//! Minimal in-memory table primitives: group-by, join index, pivot.
//!
//! Engines express their joins and aggregations through these helpers
//! instead of hand-rolled loops so that every count is a distinct count
//! and every output is ordered. Only ordered maps are used; no result
//! ever depends on hash iteration order.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::Hash;

/// Group rows into distinct value sets per key.
///
/// `f` returns `None` to drop a row (filter) or `Some((key, value))`.
pub fn group_distinct<R, K, V, I, F>(rows: I, mut f: F) -> BTreeMap<K, BTreeSet<V>>
where
    I: IntoIterator<Item = R>,
    F: FnMut(R) -> Option<(K, V)>,
    K: Ord,
    V: Ord,
{
    let mut groups: BTreeMap<K, BTreeSet<V>> = BTreeMap::new();
    for row in rows {
        if let Some((key, value)) = f(row) {
            groups.entry(key).or_default().insert(value);
        }
    }
    groups
}

/// Collapse distinct sets to their sizes.
pub fn distinct_counts<K: Ord, V>(groups: BTreeMap<K, BTreeSet<V>>) -> BTreeMap<K, usize> {
    groups.into_iter().map(|(k, v)| (k, v.len())).collect()
}

/// Build a join index over a reference table. The first row wins on
/// duplicate keys.
pub fn index_by<R, K, F>(rows: &[R], key: F) -> HashMap<K, &R>
where
    K: Eq + Hash,
    F: Fn(&R) -> K,
{
    let mut index = HashMap::with_capacity(rows.len());
    for row in rows {
        index.entry(key(row)).or_insert(row);
    }
    index
}

/// Dense row × column matrix built from sparse `(row, column) -> count` cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pivot<R, C> {
    pub rows:    Vec<R>,
    pub columns: Vec<C>,
    pub values:  Vec<Vec<usize>>,
}

impl<R: Ord + Clone, C: Ord + Clone> Pivot<R, C> {
    /// Rows and columns come out ascending; absent cells are 0.
    /// `extra_columns` are always present even when no cell names them.
    pub fn from_cells(
        cells: &BTreeMap<(R, C), usize>,
        extra_columns: impl IntoIterator<Item = C>,
    ) -> Self {
        let rows: Vec<R> = cells
            .keys()
            .map(|(r, _)| r.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let columns: Vec<C> = cells
            .keys()
            .map(|(_, c)| c.clone())
            .chain(extra_columns)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let values = rows
            .iter()
            .map(|r| {
                columns
                    .iter()
                    .map(|c| cells.get(&(r.clone(), c.clone())).copied().unwrap_or(0))
                    .collect()
            })
            .collect();

        Self { rows, columns, values }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ── Numeric helpers ──────────────────────────────────────────────────────────

/// Round half away from zero to 2 decimals.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_distinct_dedupes_values_per_key() {
        let rows = [("a", 1), ("a", 1), ("a", 2), ("b", 3)];
        let groups = distinct_counts(group_distinct(rows.iter(), |&(k, v)| Some((k, v))));
        assert_eq!(groups.get("a"), Some(&2));
        assert_eq!(groups.get("b"), Some(&1));
    }

    #[test]
    fn group_distinct_drops_filtered_rows() {
        let rows = [1, 2, 3, 4];
        let groups = group_distinct(rows, |v| (v % 2 == 0).then_some(("even", v)));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups["even"].len(), 2);
    }

    #[test]
    fn index_keeps_first_duplicate() {
        let rows = [(1, "first"), (1, "second"), (2, "other")];
        let index = index_by(&rows, |r| r.0);
        assert_eq!(index[&1].1, "first");
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn pivot_fills_sparse_cells_with_zero() {
        let mut cells = BTreeMap::new();
        cells.insert(("r1", 0), 4);
        cells.insert(("r1", 2), 1);
        cells.insert(("r2", 1), 3);

        let pivot = Pivot::from_cells(&cells, []);
        assert_eq!(pivot.rows, vec!["r1", "r2"]);
        assert_eq!(pivot.columns, vec![0, 1, 2]);
        assert_eq!(pivot.values, vec![vec![4, 0, 1], vec![0, 3, 0]]);
    }

    #[test]
    fn pivot_includes_extra_columns() {
        let mut cells = BTreeMap::new();
        cells.insert(("r", 3), 1);
        let pivot = Pivot::from_cells(&cells, [0]);
        assert_eq!(pivot.columns, vec![0, 3]);
        assert_eq!(pivot.values, vec![vec![0, 1]]);
    }

    #[test]
    fn round2_and_mean() {
        assert_eq!(round2(33.333_33), 33.33);
        assert_eq!(round2(66.666_66), 66.67);
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[10.0, 20.0]), 15.0);
    }
}
