//! Result indexing
//!
//! Every extractor reduces its auxiliary query results to in-memory lookup
//! tables before the primary record loop starts. Two shapes exist: a
//! single-valued index (duplicate keys are silent, last write wins) and a
//! multi-valued index (values kept in encounter order, no deduplication;
//! callers that need deduplication do it downstream).

use std::collections::HashMap;
use std::hash::Hash;

/// Build a single-valued index over one pass of `rows`.
///
/// Duplicate keys are not an error: the value of the last row carrying a
/// key wins. Callers rely on this.
pub fn index_unique<I, R, K, V>(
    rows: I,
    key: impl Fn(&R) -> K,
    value: impl Fn(R) -> V,
) -> HashMap<K, V>
where
    I: IntoIterator<Item = R>,
    K: Eq + Hash,
{
    let mut index = HashMap::new();
    for row in rows {
        let k = key(&row);
        index.insert(k, value(row));
    }
    index
}

/// Build a multi-valued index over one pass of `rows`.
///
/// Values sharing a key are collected in encounter order.
pub fn index_multi<I, R, K, V>(
    rows: I,
    key: impl Fn(&R) -> K,
    value: impl Fn(R) -> V,
) -> HashMap<K, Vec<V>>
where
    I: IntoIterator<Item = R>,
    K: Eq + Hash,
{
    let mut index: HashMap<K, Vec<V>> = HashMap::new();
    for row in rows {
        let k = key(&row);
        index.entry(k).or_default().push(value(row));
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        key: i32,
        note: &'static str,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { key: 1, note: "first" },
            Row { key: 2, note: "other" },
            Row { key: 1, note: "second" },
        ]
    }

    #[test]
    fn test_unique_last_write_wins() {
        let index = index_unique(rows(), |r| r.key, |r| r.note);
        assert_eq!(index.len(), 2);
        assert_eq!(index[&1], "second");
        assert_eq!(index[&2], "other");
    }

    #[test]
    fn test_multi_preserves_order_and_duplicates() {
        let index = index_multi(rows(), |r| r.key, |r| r.note);
        assert_eq!(index[&1], vec!["first", "second"]);
        assert_eq!(index[&2], vec!["other"]);
    }

    #[test]
    fn test_multi_no_dedup() {
        let dup_rows = vec![
            Row { key: 7, note: "same" },
            Row { key: 7, note: "same" },
        ];
        let index = index_multi(dup_rows, |r| r.key, |r| r.note);
        assert_eq!(index[&7], vec!["same", "same"]);
    }

    #[test]
    fn test_value_transform() {
        let index = index_unique(rows(), |r| r.key, |r| r.note.to_uppercase());
        assert_eq!(index[&1], "SECOND");
    }

    #[test]
    fn test_whole_record_values() {
        let index = index_multi(rows(), |r| r.key, |r| r);
        assert_eq!(index[&1].len(), 2);
        assert_eq!(index[&1][0].note, "first");
    }
}
