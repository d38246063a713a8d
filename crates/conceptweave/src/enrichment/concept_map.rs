//! Concept map model and the tolerant parser for model replies.
//!
//! Model output is untrusted: the parser takes the outermost `{...}` of the
//! reply, decodes it loosely and then repairs what it can. Nodes get ids and
//! labels when missing, and edges pointing at unknown nodes are dropped.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::enrichment::error::{EnrichmentError, Result};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[default]
    Concept,
    Detail,
    Example,
}

impl NodeKind {
    /// Case-insensitive; anything unrecognized is a concept.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "detail" => NodeKind::Detail,
            "example" => NodeKind::Example,
            _ => NodeKind::Concept,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConceptNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConceptEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConceptMap {
    pub nodes: Vec<ConceptNode>,
    pub edges: Vec<ConceptEdge>,
}

impl ConceptMap {
    pub fn node(&self, id: &str) -> Option<&ConceptNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// True when every edge references two existing node ids.
    pub fn edges_resolve(&self) -> bool {
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        self.edges
            .iter()
            .all(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()))
    }
}

/// Slice from the first `{` to the last `}` of a reply.
pub fn extract_json_object(reply: &str) -> Result<&str> {
    let start = reply.find('{');
    let end = reply.rfind('}');

    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok(&reply[start..=end]),
        _ => Err(EnrichmentError::ContractViolation(
            "no JSON object boundaries in reply".to_string(),
        )),
    }
}

/// Decodes and repairs a concept map from a raw model reply.
pub fn parse_concept_map(reply: &str) -> Result<ConceptMap> {
    let slice = extract_json_object(reply)?;

    let value: Value = serde_json::from_str(slice)
        .map_err(|e| EnrichmentError::ContractViolation(format!("invalid JSON: {}", e)))?;

    let object = value.as_object().ok_or_else(|| {
        EnrichmentError::ContractViolation("reply is not a JSON object".to_string())
    })?;

    let raw_nodes = object
        .get("nodes")
        .and_then(Value::as_array)
        .ok_or_else(|| EnrichmentError::ContractViolation("missing \"nodes\" array".to_string()))?;

    let nodes = sanitize_nodes(raw_nodes);

    let raw_edges = object
        .get("edges")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let edges = sanitize_edges(raw_edges, &nodes);

    Ok(ConceptMap { nodes, edges })
}

/// A usable identifier: non-empty string, or a number rendered as text.
fn id_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text_of<'a>(entry: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    entry
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn sanitize_nodes(raw_nodes: &[Value]) -> Vec<ConceptNode> {
    let mut seen = HashSet::new();
    let mut nodes = Vec::with_capacity(raw_nodes.len());

    for (i, raw) in raw_nodes.iter().enumerate() {
        let Some(entry) = raw.as_object() else {
            tracing::debug!(index = i, "Skipping concept map node that is not an object");
            continue;
        };

        let id = id_of(entry.get("id")).unwrap_or_else(|| format!("node-{}", i));
        if !seen.insert(id.clone()) {
            tracing::debug!(id = %id, "Dropping duplicate concept map node");
            continue;
        }

        let label = text_of(entry, "label")
            .map(str::to_string)
            .unwrap_or_else(|| format!("Concept {}", i + 1));

        let kind = text_of(entry, "type")
            .map(NodeKind::parse_lenient)
            .unwrap_or_default();

        nodes.push(ConceptNode { id, label, kind });
    }

    nodes
}

fn sanitize_edges(raw_edges: &[Value], nodes: &[ConceptNode]) -> Vec<ConceptEdge> {
    let known: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let mut edges = Vec::with_capacity(raw_edges.len());

    for (i, raw) in raw_edges.iter().enumerate() {
        let Some(entry) = raw.as_object() else {
            continue;
        };

        let source = id_of(entry.get("source")).or_else(|| id_of(entry.get("from")));
        let target = id_of(entry.get("target")).or_else(|| id_of(entry.get("to")));

        let (Some(source), Some(target)) = (source, target) else {
            tracing::debug!(index = i, "Dropping concept map edge without endpoints");
            continue;
        };

        if !known.contains(source.as_str()) || !known.contains(target.as_str()) {
            tracing::debug!(index = i, source = %source, target = %target, "Dropping dangling concept map edge");
            continue;
        }

        let id = id_of(entry.get("id")).unwrap_or_else(|| format!("edge-{}", i));
        let label = entry
            .get("label")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        edges.push(ConceptEdge {
            id,
            source,
            target,
            label,
        });
    }

    edges
}
