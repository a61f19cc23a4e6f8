use std::fmt;

use serde::{Deserialize, Serialize};

/// Backend identifier of a road segment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    pub fn new(id: impl Into<String>) -> Self {
        EdgeId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EdgeId {
    fn from(id: &str) -> Self {
        EdgeId::new(id)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Backend identifier of a graph vertex.
///
/// The backend uses the empty string to mean "no match", so an empty id is
/// never representable here.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() { None } else { Some(NodeId(id)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{EdgeId, NodeId};

    #[test]
    fn empty_node_id_is_no_match() {
        assert!(NodeId::new("").is_none());
        assert_eq!(NodeId::new("n1").map(|n| n.to_string()), Some("n1".to_string()));
    }

    #[test]
    fn edge_ids_order_lexically() {
        let mut ids = vec![EdgeId::from("b"), EdgeId::from("a")];
        ids.sort();
        assert_eq!(ids[0].as_str(), "a");
    }
}
