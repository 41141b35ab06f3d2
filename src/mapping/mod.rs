//! Mapping from a decoded document to an [`ImportPlan`].
//!
//! A plan is the list of nodes to create, edges between those nodes, and
//! links from them to nodes that already exist in the graph. Mappings are
//! selected in config by `kind`.

mod fields;
mod uniprot;

pub use fields::{FieldMapping, LinkConfig};
pub use uniprot::UniprotMapping;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::graph::validate_identifier;
use crate::xml::XmlDocument;

/// A node to create: one label plus string properties
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRecord {
    pub label: String,
    pub properties: BTreeMap<String, String>,
}

impl NodeRecord {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }
}

/// Edge between two nodes of the same plan, by index into `ImportPlan::nodes`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedEdge {
    pub from: usize,
    pub to: usize,
    pub rel_type: String,
}

/// Which way a link edge points, seen from the newly created node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// (new)-[:TYPE]->(existing)
    #[default]
    Outgoing,
    /// (existing)-[:TYPE]->(new)
    Incoming,
}

/// What to do when the link target matches more than one node.
/// Zero matches always fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultipleMatchPolicy {
    /// Create one edge per matching node
    #[default]
    FanOut,
    /// Refuse to create any edge
    Fail,
}

/// Selects existing nodes by label and one property equality
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchTarget {
    pub label: String,
    pub key: String,
    pub value: String,
}

/// Relationship from a plan node to pre-existing node(s)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedLink {
    pub node: usize,
    pub rel_type: String,
    pub direction: Direction,
    pub target: MatchTarget,
    pub on_multiple: MultipleMatchPolicy,
}

/// Everything one document contributes to the graph
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportPlan {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<PlannedEdge>,
    pub links: Vec<PlannedLink>,
}

impl ImportPlan {
    /// Append a node and return its index
    pub fn add_node(&mut self, node: NodeRecord) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn add_edge(&mut self, from: usize, to: usize, rel_type: &str) {
        self.edges.push(PlannedEdge {
            from,
            to,
            rel_type: rel_type.to_string(),
        });
    }

    /// Check every label, relationship type and property key before anything
    /// is written.
    pub fn validate(&self) -> Result<()> {
        for node in &self.nodes {
            validate_identifier(&node.label)?;
            for key in node.properties.keys() {
                validate_identifier(key)?;
            }
        }
        for edge in &self.edges {
            validate_identifier(&edge.rel_type)?;
        }
        for link in &self.links {
            validate_identifier(&link.rel_type)?;
            validate_identifier(&link.target.label)?;
            validate_identifier(&link.target.key)?;
        }
        Ok(())
    }
}

/// Mapping selected in `[mapping]` by `kind`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MappingConfig {
    /// Fixed field paths into one node, plus an optional link
    Fields(FieldMapping),
    /// UniProt entry: protein with genes, features, references, authors, name, organism
    Uniprot(UniprotMapping),
}

impl MappingConfig {
    pub fn plan(&self, doc: &XmlDocument) -> Result<ImportPlan> {
        let plan = match self {
            MappingConfig::Fields(mapping) => mapping.plan(doc)?,
            MappingConfig::Uniprot(mapping) => mapping.plan(doc)?,
        };
        plan.validate()?;
        Ok(plan)
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            MappingConfig::Fields(mapping) => mapping.validate(),
            MappingConfig::Uniprot(_) => Ok(()),
        }
    }
}
