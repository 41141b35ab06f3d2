//! Graph writer: executes an [`ImportPlan`] against a [`GraphSink`].
//!
//! Writes are sequential and auto-committed one by one. Nothing is rolled
//! back: a node stays in the graph even if a later link step fails, and
//! running the same plan twice creates everything twice.

mod neo4j;

#[cfg(test)]
pub(crate) mod memory;

pub use neo4j::Neo4jStore;

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::error::{Result, XmlGraphError};
use crate::mapping::{Direction, ImportPlan, MatchTarget, MultipleMatchPolicy};

/// Database handle of a node created during this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRef(pub String);

/// A session that can create nodes and relationships.
#[allow(async_fn_in_trait)]
pub trait GraphSink {
    /// Create one node and return its handle
    async fn create_node(&mut self, label: &str, properties: &BTreeMap<String, String>) -> Result<NodeRef>;

    /// Create `(from)-[:rel_type]->(to)` between two nodes of this run
    async fn create_edge(&mut self, from: &NodeRef, to: &NodeRef, rel_type: &str) -> Result<()>;

    /// Number of nodes matching the target, ignoring the `exclude` handles
    async fn count_matches(&mut self, target: &MatchTarget, exclude: &[NodeRef]) -> Result<usize>;

    /// Relate `node` to every node matching `target` except the `exclude`
    /// handles; returns edges created
    async fn link(
        &mut self,
        node: &NodeRef,
        target: &MatchTarget,
        rel_type: &str,
        direction: Direction,
        exclude: &[NodeRef],
    ) -> Result<usize>;
}

/// Counts of what one plan wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub nodes: usize,
    pub edges: usize,
    pub links: usize,
}

/// Write nodes, then edges between them, then links to existing nodes.
///
/// Link targets are matched among nodes that existed before this plan; the
/// plan's own nodes never count. A link whose target matches nothing fails
/// with [`XmlGraphError::NoMatch`]; several matches fan out or fail according
/// to the link's policy.
pub async fn write_plan<S: GraphSink>(sink: &mut S, plan: &ImportPlan) -> Result<WriteSummary> {
    plan.validate()?;
    let mut summary = WriteSummary::default();

    let mut created = Vec::with_capacity(plan.nodes.len());
    for node in &plan.nodes {
        let node_ref = sink.create_node(&node.label, &node.properties).await?;
        log::debug!("Created :{} node {}", node.label, node_ref.0);
        created.push(node_ref);
        summary.nodes += 1;
    }

    for edge in &plan.edges {
        let (from, to) = match (created.get(edge.from), created.get(edge.to)) {
            (Some(from), Some(to)) => (from, to),
            _ => {
                return Err(XmlGraphError::Config(format!(
                    "edge {} references a node outside the plan ({} -> {})",
                    edge.rel_type, edge.from, edge.to
                )))
            }
        };
        sink.create_edge(from, to, &edge.rel_type).await?;
        summary.edges += 1;
    }

    for link in &plan.links {
        let node = created.get(link.node).ok_or_else(|| {
            XmlGraphError::Config(format!(
                "link {} references a node outside the plan ({})",
                link.rel_type, link.node
            ))
        })?;
        let target = &link.target;

        let matches = sink.count_matches(target, &created).await?;
        if matches == 0 {
            return Err(XmlGraphError::NoMatch {
                label: target.label.clone(),
                key: target.key.clone(),
                value: target.value.clone(),
            });
        }
        if matches > 1 {
            if link.on_multiple == MultipleMatchPolicy::Fail {
                return Err(XmlGraphError::AmbiguousMatch {
                    label: target.label.clone(),
                    key: target.key.clone(),
                    value: target.value.clone(),
                    count: matches,
                });
            }
            log::warn!(
                "{} {} nodes match {} = {:?}, linking all of them",
                matches,
                target.label,
                target.key,
                target.value
            );
        }

        let linked = sink
            .link(node, target, &link.rel_type, link.direction, &created)
            .await?;
        summary.links += linked;
    }

    Ok(summary)
}

fn identifier_regex() -> &'static Regex {
    static IDENTIFIER: OnceLock<Regex> = OnceLock::new();
    IDENTIFIER.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid regex pattern"))
}

/// Labels, relationship types and property keys are spliced into Cypher text,
/// so only plain identifiers are accepted.
pub fn validate_identifier(name: &str) -> Result<()> {
    if identifier_regex().is_match(name) {
        Ok(())
    } else {
        Err(XmlGraphError::InvalidIdentifier(name.to_string()))
    }
}
