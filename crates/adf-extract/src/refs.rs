//! Reference identifiers
//!
//! Publications are cited by PubMed ID when one exists, otherwise by the
//! MGI reference ID. `RefIdMap` is built once per run from a reference
//! query and passed to whatever needs it; there is no process-wide cache.

use std::collections::HashMap;

use adf_common::index::index_unique;

/// Pick the external-facing publication CURIE for a reference.
pub fn publication_id(mgi_id: &str, pmid: Option<&str>) -> String {
    match pmid {
        Some(p) if !p.is_empty() => format!("PMID:{}", p),
        _ => mgi_id.to_string(),
    }
}

/// One row of a reference lookup query.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefRow {
    pub refs_key: i32,
    pub mgi_id: String,
    pub pmid: Option<String>,
}

/// Reference key → publication CURIE, built once per run.
#[derive(Debug, Default)]
pub struct RefIdMap {
    map: HashMap<i32, String>,
}

impl RefIdMap {
    pub fn from_rows(rows: Vec<RefRow>) -> Self {
        Self {
            map: index_unique(
                rows,
                |r| r.refs_key,
                |r| publication_id(&r.mgi_id, r.pmid.as_deref()),
            ),
        }
    }

    pub fn get(&self, refs_key: i32) -> Option<&str> {
        self.map.get(&refs_key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pmid_preferred() {
        assert_eq!(publication_id("MGI:123", Some("9876")), "PMID:9876");
    }

    #[test]
    fn test_mgi_id_fallback() {
        assert_eq!(publication_id("MGI:123", None), "MGI:123");
        assert_eq!(publication_id("MGI:123", Some("")), "MGI:123");
    }

    #[test]
    fn test_map_lookup() {
        let map = RefIdMap::from_rows(vec![
            RefRow { refs_key: 1, mgi_id: "MGI:100".into(), pmid: Some("555".into()) },
            RefRow { refs_key: 2, mgi_id: "MGI:200".into(), pmid: None },
        ]);
        assert_eq!(map.get(1), Some("PMID:555"));
        assert_eq!(map.get(2), Some("MGI:200"));
        assert_eq!(map.get(3), None);
        assert_eq!(map.len(), 2);
    }
}
