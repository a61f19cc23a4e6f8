//! Wire contract with the map backend.
//!
//! Every endpoint is a `POST` whose fields travel as query parameters and
//! whose body is JSON. Payloads are loosely typed on the wire, so decoding
//! validates each entry on its own: a malformed edge or suggestion is dropped
//! and counted, and the rest of the batch is kept.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use foundation::{EdgeId, LatLon, NodeId};
use scene::ResolvedPoint;

use crate::cache::EdgeRecord;

/// Number of suggestions a field can display.
pub const SUGGESTION_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    GetEdges { lat: f64, lon: f64, span: f64 },
    NearestNeighbor { lat: f64, lon: f64 },
    FindIntersection { street1: String, street2: String },
    ShortestPath { start_id: NodeId, finish_id: NodeId },
    Clear,
    Auto { street_name: String },
}

impl ApiCall {
    pub fn endpoint(&self) -> &'static str {
        match self {
            ApiCall::GetEdges { .. } => "getEdges",
            ApiCall::NearestNeighbor { .. } => "nearestNeighbor",
            ApiCall::FindIntersection { .. } => "findIntersection",
            ApiCall::ShortestPath { .. } => "shortestPath",
            ApiCall::Clear => "clear",
            ApiCall::Auto { .. } => "auto",
        }
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            ApiCall::GetEdges { lat, lon, span } => vec![
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("span", span.to_string()),
            ],
            ApiCall::NearestNeighbor { lat, lon } => {
                vec![("lat", lat.to_string()), ("lon", lon.to_string())]
            }
            ApiCall::FindIntersection { street1, street2 } => {
                vec![("street1", street1.clone()), ("street2", street2.clone())]
            }
            ApiCall::ShortestPath {
                start_id,
                finish_id,
            } => vec![
                ("start_id", start_id.to_string()),
                ("finish_id", finish_id.to_string()),
            ],
            ApiCall::Clear => Vec::new(),
            ApiCall::Auto { street_name } => vec![("street_name", street_name.clone())],
        }
    }

    /// Decodes a response body according to the shape this call expects.
    pub fn decode(&self, body: &str) -> Result<Reply, ApiError> {
        match self {
            ApiCall::GetEdges { .. } | ApiCall::ShortestPath { .. } | ApiCall::Clear => {
                decode_edges(body).map(Reply::Edges)
            }
            ApiCall::NearestNeighbor { .. } | ApiCall::FindIntersection { .. } => {
                decode_endpoint(body).map(Reply::Endpoint)
            }
            ApiCall::Auto { .. } => decode_suggestions(body).map(Reply::Suggestions),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Network failure, timeout, or an unreadable body.
    Transport(String),
    /// Non-success HTTP status.
    Status(u16),
    /// Body is not the JSON shape the endpoint promises.
    Malformed(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Transport(msg) => write!(f, "transport error: {msg}"),
            ApiError::Status(code) => write!(f, "backend returned HTTP {code}"),
            ApiError::Malformed(msg) => write!(f, "malformed response: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Traffic weight for one visible edge in the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficAnnotation {
    pub edge_id: EdgeId,
    pub weight: f64,
}

/// An edge the backend reports for the first time, with its geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEdge {
    pub weight: f64,
    pub record: EdgeRecord,
}

impl NewEdge {
    pub fn annotation(&self) -> TrafficAnnotation {
        TrafficAnnotation {
            edge_id: self.record.id.clone(),
            weight: self.weight,
        }
    }
}

/// Decoded `getEdges` / `shortestPath` / `clear` reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgesReply {
    pub old_edges: Vec<TrafficAnnotation>,
    pub new_edges: Vec<NewEdge>,
    pub path_edges: BTreeSet<EdgeId>,
    pub length: Option<f64>,
    /// Entries dropped during decoding.
    pub skipped: usize,
}

impl EdgesReply {
    /// `old_edges ∪ new_edges`, first occurrence of each id wins.
    pub fn visible(&self) -> Vec<TrafficAnnotation> {
        let mut seen = BTreeSet::new();
        self.old_edges
            .iter()
            .cloned()
            .chain(self.new_edges.iter().map(NewEdge::annotation))
            .filter(|t| seen.insert(t.edge_id.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Edges(EdgesReply),
    /// `None` is the backend's "no match".
    Endpoint(Option<ResolvedPoint>),
    Suggestions(Vec<String>),
}

impl Reply {
    pub fn kind(&self) -> &'static str {
        match self {
            Reply::Edges(_) => "edges",
            Reply::Endpoint(_) => "endpoint",
            Reply::Suggestions(_) => "suggestions",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EdgesWire {
    #[serde(default)]
    old_edges: Value,
    #[serde(default)]
    new_edges: Value,
    #[serde(default)]
    new_coords: Value,
    #[serde(default)]
    path_edges: Value,
    #[serde(default)]
    length: Value,
}

#[derive(Debug, Deserialize)]
struct EndpointWire {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    lat: Value,
    #[serde(default)]
    lng: Value,
}

/// A section that is `null` or absent is empty. Any other non-array is
/// dropped as one skipped entry.
fn section<'a>(v: &'a Value, name: &str, skipped: &mut usize) -> &'a [Value] {
    match v {
        Value::Array(items) => items.as_slice(),
        Value::Null => &[],
        _ => {
            warn!(section = name, "expected an array; section ignored");
            *skipped += 1;
            &[]
        }
    }
}

fn edge_id(v: &Value) -> Option<EdgeId> {
    match v {
        Value::String(s) if !s.is_empty() => Some(EdgeId::new(s.as_str())),
        Value::Number(n) => Some(EdgeId::new(n.to_string())),
        _ => None,
    }
}

fn finite(v: &Value) -> Option<f64> {
    v.as_f64().filter(|x| x.is_finite())
}

fn traffic(v: &Value) -> Option<TrafficAnnotation> {
    match v.as_array()?.as_slice() {
        [id, weight, ..] => Some(TrafficAnnotation {
            edge_id: edge_id(id)?,
            weight: finite(weight)?,
        }),
        _ => None,
    }
}

fn geometry(id: EdgeId, v: &Value) -> Option<EdgeRecord> {
    match v.as_array()?.as_slice() {
        [lat1, lon1, lat2, lon2] => Some(EdgeRecord {
            id,
            from: LatLon::new(finite(lat1)?, finite(lon1)?),
            to: LatLon::new(finite(lat2)?, finite(lon2)?),
        }),
        _ => None,
    }
}

pub fn decode_edges(body: &str) -> Result<EdgesReply, ApiError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| ApiError::Malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(ApiError::Malformed("edges reply is not an object".to_string()));
    }
    let wire: EdgesWire =
        serde_json::from_value(value).map_err(|e| ApiError::Malformed(e.to_string()))?;

    let mut reply = EdgesReply {
        length: finite(&wire.length),
        ..EdgesReply::default()
    };
    let old_edges = section(&wire.old_edges, "oldEdges", &mut reply.skipped);
    let new_edges = section(&wire.new_edges, "newEdges", &mut reply.skipped);
    let new_coords = section(&wire.new_coords, "newCoords", &mut reply.skipped);

    for v in old_edges {
        match traffic(v) {
            Some(t) => reply.old_edges.push(t),
            None => reply.skipped += 1,
        }
    }

    if new_edges.len() != new_coords.len() {
        warn!(
            new_edges = new_edges.len(),
            new_coords = new_coords.len(),
            "newEdges/newCoords length mismatch"
        );
        reply.skipped += new_edges.len().abs_diff(new_coords.len());
    }
    for (edge, coords) in new_edges.iter().zip(new_coords) {
        let decoded = traffic(edge).and_then(|t| {
            geometry(t.edge_id, coords).map(|record| NewEdge {
                weight: t.weight,
                record,
            })
        });
        match decoded {
            Some(e) => reply.new_edges.push(e),
            None => reply.skipped += 1,
        }
    }

    match &wire.path_edges {
        Value::Object(map) => {
            reply.path_edges = map
                .iter()
                .filter(|(id, on_path)| !id.is_empty() && **on_path == Value::Bool(true))
                .map(|(id, _)| EdgeId::new(id.as_str()))
                .collect();
        }
        Value::Null => {}
        _ => {
            warn!("pathEdges is not an object; ignored");
            reply.skipped += 1;
        }
    }

    if reply.skipped > 0 {
        warn!(skipped = reply.skipped, "dropped malformed edge entries");
    }
    Ok(reply)
}

pub fn decode_endpoint(body: &str) -> Result<Option<ResolvedPoint>, ApiError> {
    let wire: EndpointWire =
        serde_json::from_str(body).map_err(|e| ApiError::Malformed(e.to_string()))?;

    let id = match &wire.id {
        Value::String(s) => NodeId::new(s.as_str()),
        Value::Number(n) => NodeId::new(n.to_string()),
        _ => None,
    };
    let Some(id) = id else {
        return Ok(None);
    };
    match (finite(&wire.lat), finite(&wire.lng)) {
        (Some(lat), Some(lon)) => Ok(Some(ResolvedPoint { id, lat, lon })),
        _ => {
            warn!(%id, "endpoint reply without usable coordinates; treating as no match");
            Ok(None)
        }
    }
}

pub fn decode_suggestions(body: &str) -> Result<Vec<String>, ApiError> {
    let wire: Vec<Value> =
        serde_json::from_str(body).map_err(|e| ApiError::Malformed(e.to_string()))?;
    let Some(first) = wire.first() else {
        return Ok(Vec::new());
    };
    let Some(list) = first.as_array() else {
        warn!("suggestion list is not an array; no suggestions");
        return Ok(Vec::new());
    };

    let mut out = Vec::with_capacity(SUGGESTION_LIMIT);
    let mut skipped = 0usize;
    for v in list {
        if out.len() == SUGGESTION_LIMIT {
            break;
        }
        match v.as_str() {
            Some(s) => out.push(s.to_string()),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(skipped, "dropped non-string suggestions");
    }
    Ok(out)
}
