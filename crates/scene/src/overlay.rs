use std::collections::BTreeSet;

use foundation::EdgeId;

pub const NO_PATH_MESSAGE: &str = "There isn't a path";

/// Result of the most recent successful route query.
///
/// `total_length == None` with no edges is the backend's "no path" answer,
/// which is a valid result rather than a failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathOverlay {
    edge_ids: BTreeSet<EdgeId>,
    total_length: Option<f64>,
}

impl PathOverlay {
    pub fn new(edge_ids: BTreeSet<EdgeId>, total_length: Option<f64>) -> Self {
        Self {
            edge_ids,
            total_length,
        }
    }

    pub fn no_path() -> Self {
        Self::default()
    }

    pub fn edge_ids(&self) -> &BTreeSet<EdgeId> {
        &self.edge_ids
    }

    pub fn total_length(&self) -> Option<f64> {
        self.total_length
    }

    pub fn contains(&self, id: &EdgeId) -> bool {
        self.edge_ids.contains(id)
    }

    /// A reply may omit the length while still listing path edges.
    pub fn has_path(&self) -> bool {
        self.total_length.is_some() || !self.edge_ids.is_empty()
    }

    pub fn status_message(&self) -> String {
        match self.total_length {
            Some(len) => format!("Path length: {len:.3}"),
            None if !self.edge_ids.is_empty() => "Path found".to_string(),
            None => NO_PATH_MESSAGE.to_string(),
        }
    }
}
