use std::collections::BTreeMap;

use foundation::{EdgeId, LatLon};

/// Static geometry of one road segment.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    pub id: EdgeId,
    pub from: LatLon,
    pub to: LatLon,
}

/// Session-lifetime store of edge geometry, keyed by edge id.
///
/// Geometry never changes once the backend has sent it, so the first record
/// for an id is kept and later ones are ignored. Entries are never evicted.
#[derive(Debug, Default)]
pub struct EdgeCache {
    entries: BTreeMap<EdgeId, EdgeRecord>,
}

impl EdgeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &EdgeId) -> Option<&EdgeRecord> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &EdgeId) -> bool {
        self.entries.contains_key(id)
    }

    /// Returns `true` if the record was new.
    pub fn insert(&mut self, record: EdgeRecord) -> bool {
        if self.entries.contains_key(&record.id) {
            return false;
        }
        self.entries.insert(record.id.clone(), record);
        true
    }

    /// Inserts every record, returning how many were new.
    pub fn merge<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = EdgeRecord>,
    {
        records.into_iter().filter(|r| self.insert(r.clone())).count()
    }
}
