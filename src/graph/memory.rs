//! In-memory [`GraphSink`] used by tests in place of a live Neo4j server.

use std::collections::BTreeMap;

use super::{GraphSink, NodeRef};
use crate::error::{Result, XmlGraphError};
use crate::mapping::{Direction, MatchTarget, NodeRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEdge {
    pub from: usize,
    pub to: usize,
    pub rel_type: String,
}

#[derive(Debug, Default)]
pub struct MemoryGraph {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<MemoryEdge>,
    /// Number of write calls seen, seeds excluded
    pub writes: usize,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pre-existing node; returns its index
    pub fn seed(&mut self, node: NodeRecord) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn nodes_with_label(&self, label: &str) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.label == label)
            .map(|(idx, _)| idx)
            .collect()
    }

    fn matching(&self, target: &MatchTarget, exclude: &[NodeRef]) -> Result<Vec<usize>> {
        let excluded = exclude
            .iter()
            .map(|node| self.index(node))
            .collect::<Result<Vec<_>>>()?;
        Ok(self
            .nodes
            .iter()
            .enumerate()
            .filter(|(idx, n)| {
                !excluded.contains(idx)
                    && n.label == target.label
                    && n.properties.get(&target.key).map(String::as_str) == Some(target.value.as_str())
            })
            .map(|(idx, _)| idx)
            .collect())
    }

    fn index(&self, node: &NodeRef) -> Result<usize> {
        node.0
            .strip_prefix("mem:")
            .and_then(|idx| idx.parse::<usize>().ok())
            .filter(|idx| *idx < self.nodes.len())
            .ok_or_else(|| XmlGraphError::Config(format!("unknown node {}", node.0)))
    }
}

impl GraphSink for MemoryGraph {
    async fn create_node(&mut self, label: &str, properties: &BTreeMap<String, String>) -> Result<NodeRef> {
        self.writes += 1;
        self.nodes.push(NodeRecord {
            label: label.to_string(),
            properties: properties.clone(),
        });
        Ok(NodeRef(format!("mem:{}", self.nodes.len() - 1)))
    }

    async fn create_edge(&mut self, from: &NodeRef, to: &NodeRef, rel_type: &str) -> Result<()> {
        self.writes += 1;
        let from = self.index(from)?;
        let to = self.index(to)?;
        self.edges.push(MemoryEdge {
            from,
            to,
            rel_type: rel_type.to_string(),
        });
        Ok(())
    }

    async fn count_matches(&mut self, target: &MatchTarget, exclude: &[NodeRef]) -> Result<usize> {
        Ok(self.matching(target, exclude)?.len())
    }

    async fn link(
        &mut self,
        node: &NodeRef,
        target: &MatchTarget,
        rel_type: &str,
        direction: Direction,
        exclude: &[NodeRef],
    ) -> Result<usize> {
        self.writes += 1;
        let node = self.index(node)?;
        let matches = self.matching(target, exclude)?;
        for existing in &matches {
            let (from, to) = match direction {
                Direction::Outgoing => (node, *existing),
                Direction::Incoming => (*existing, node),
            };
            self.edges.push(MemoryEdge {
                from,
                to,
                rel_type: rel_type.to_string(),
            });
        }
        Ok(matches.len())
    }
}
