//! Neo4j session over Bolt.
//!
//! Every statement runs in its own auto-commit transaction. The underlying
//! connection pool is released when the store is dropped.

use neo4rs::{query, ConfigBuilder, Graph, Query, Row};
use std::collections::{BTreeMap, HashMap};

use super::{GraphSink, NodeRef};
use crate::config::Neo4jConfig;
use crate::error::{Result, XmlGraphError};
use crate::mapping::{Direction, MatchTarget};

pub struct Neo4jStore {
    graph: Graph,
}

impl Neo4jStore {
    /// Open the connection pool described by `[neo4j]`.
    ///
    /// The password is read from the environment variable named by
    /// `password_env`.
    pub async fn connect(config: &Neo4jConfig) -> Result<Self> {
        let password = config.password()?;

        let mut builder = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.user.as_str())
            .password(password.as_str());
        if let Some(database) = &config.database {
            builder = builder.db(database.as_str());
        }

        let graph = Graph::connect(builder.build()?).await?;
        log::info!("Connected to Neo4j at {}", config.uri);
        Ok(Self { graph })
    }

    async fn first_row(&self, q: Query) -> Result<Option<Row>> {
        let mut result = self.graph.execute(q).await?;
        Ok(result.next().await?)
    }
}

fn element_ids(nodes: &[NodeRef]) -> Vec<String> {
    nodes.iter().map(|n| n.0.clone()).collect()
}

fn decode<T>(row: &Row, column: &str) -> Result<T>
where
    T: for<'de> serde::Deserialize<'de>,
{
    row.get(column)
        .map_err(|e| XmlGraphError::Decode(format!("column {}: {}", column, e)))
}

/// `CREATE` statement for one node; `label` must already be validated
fn create_node_cypher(label: &str) -> String {
    format!("CREATE (n:{}) SET n = $props RETURN elementId(n) AS id", label)
}

/// `$exclude` holds the element ids of nodes written by the current plan
fn count_cypher(target: &MatchTarget) -> String {
    format!(
        "MATCH (e:{} {{{}: $value}}) \
         WHERE NOT elementId(e) IN $exclude \
         RETURN count(e) AS matches",
        target.label, target.key
    )
}

fn link_cypher(target: &MatchTarget, rel_type: &str, direction: Direction) -> String {
    let pattern = match direction {
        Direction::Outgoing => format!("(new)-[:{}]->(e)", rel_type),
        Direction::Incoming => format!("(e)-[:{}]->(new)", rel_type),
    };
    format!(
        "MATCH (new) WHERE elementId(new) = $id \
         MATCH (e:{} {{{}: $value}}) \
         WHERE NOT elementId(e) IN $exclude \
         CREATE {} \
         RETURN count(*) AS created",
        target.label, target.key, pattern
    )
}

fn edge_cypher(rel_type: &str) -> String {
    format!(
        "MATCH (a) WHERE elementId(a) = $from \
         MATCH (b) WHERE elementId(b) = $to \
         CREATE (a)-[:{}]->(b)",
        rel_type
    )
}

impl GraphSink for Neo4jStore {
    async fn create_node(&mut self, label: &str, properties: &BTreeMap<String, String>) -> Result<NodeRef> {
        let props: HashMap<String, String> = properties
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let q = query(&create_node_cypher(label)).param("props", props);

        let row = self
            .first_row(q)
            .await?
            .ok_or_else(|| XmlGraphError::Decode(format!("CREATE :{} returned no row", label)))?;
        Ok(NodeRef(decode::<String>(&row, "id")?))
    }

    async fn create_edge(&mut self, from: &NodeRef, to: &NodeRef, rel_type: &str) -> Result<()> {
        let q = query(&edge_cypher(rel_type))
            .param("from", from.0.as_str())
            .param("to", to.0.as_str());
        self.graph.run(q).await?;
        Ok(())
    }

    async fn count_matches(&mut self, target: &MatchTarget, exclude: &[NodeRef]) -> Result<usize> {
        let q = query(&count_cypher(target))
            .param("value", target.value.as_str())
            .param("exclude", element_ids(exclude));
        let matches = match self.first_row(q).await? {
            Some(row) => decode::<i64>(&row, "matches")?,
            None => 0,
        };
        Ok(matches.max(0) as usize)
    }

    async fn link(
        &mut self,
        node: &NodeRef,
        target: &MatchTarget,
        rel_type: &str,
        direction: Direction,
        exclude: &[NodeRef],
    ) -> Result<usize> {
        let q = query(&link_cypher(target, rel_type, direction))
            .param("id", node.0.as_str())
            .param("value", target.value.as_str())
            .param("exclude", element_ids(exclude));
        let created = match self.first_row(q).await? {
            Some(row) => decode::<i64>(&row, "created")?,
            None => 0,
        };
        Ok(created.max(0) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protein(value: &str) -> MatchTarget {
        MatchTarget {
            label: "Protein".to_string(),
            key: "id".to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_create_node_cypher() {
        assert_eq!(
            create_node_cypher("Reference"),
            "CREATE (n:Reference) SET n = $props RETURN elementId(n) AS id"
        );
    }

    #[test]
    fn test_count_cypher_binds_value() {
        let cypher = count_cypher(&protein("P1\"}) DETACH DELETE (x"));
        assert_eq!(
            cypher,
            "MATCH (e:Protein {id: $value}) \
             WHERE NOT elementId(e) IN $exclude \
             RETURN count(e) AS matches"
        );
    }

    #[test]
    fn test_link_cypher_directions() {
        let out = link_cypher(&protein("P1"), "REFERENCES", Direction::Outgoing);
        assert!(out.contains("MATCH (e:Protein {id: $value})"));
        assert!(out.contains("CREATE (new)-[:REFERENCES]->(e)"));
        assert!(out.contains("elementId(new) = $id"));
        assert!(out.contains("WHERE NOT elementId(e) IN $exclude"));

        let inc = link_cypher(&protein("P1"), "FROM_GENE", Direction::Incoming);
        assert!(inc.contains("CREATE (e)-[:FROM_GENE]->(new)"));
    }

    #[test]
    fn test_edge_cypher() {
        let cypher = edge_cypher("HAS_AUTHOR");
        assert!(cypher.contains("CREATE (a)-[:HAS_AUTHOR]->(b)"));
        assert!(cypher.contains("$from") && cypher.contains("$to"));
    }

    #[tokio::test]
    async fn test_connect_requires_password() {
        let config = Neo4jConfig {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password_env: "XMLGRAPH_TEST_UNSET_PASSWORD".to_string(),
            database: None,
        };
        std::env::remove_var("XMLGRAPH_TEST_UNSET_PASSWORD");
        let result = Neo4jStore::connect(&config).await;
        assert!(matches!(result, Err(XmlGraphError::Config(_))));
    }

    /// Runs against a live server: `NEO4J_URI`, `NEO4J_PASSWORD` and
    /// optionally `NEO4J_USER` must be set.
    #[tokio::test]
    #[ignore]
    async fn test_live_reference_import() {
        use crate::graph::{write_plan, WriteSummary};
        use crate::mapping::{ImportPlan, MultipleMatchPolicy, NodeRecord, PlannedLink};
        use std::time::{SystemTime, UNIX_EPOCH};

        let Ok(uri) = std::env::var("NEO4J_URI") else {
            eprintln!("NEO4J_URI not set, skipping");
            return;
        };
        if std::env::var("NEO4J_PASSWORD").is_err() {
            eprintln!("NEO4J_PASSWORD not set, skipping");
            return;
        }
        let config = Neo4jConfig {
            uri,
            user: std::env::var("NEO4J_USER").unwrap_or_else(|_| "neo4j".to_string()),
            password_env: "NEO4J_PASSWORD".to_string(),
            database: std::env::var("NEO4J_DATABASE").ok(),
        };
        let mut store = Neo4jStore::connect(&config).await.unwrap();

        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
        let protein_id = format!("xmlgraph-test-{}", nanos);
        store
            .graph
            .run(query("CREATE (:Protein {id: $id})").param("id", protein_id.as_str()))
            .await
            .unwrap();

        let mut plan = ImportPlan::default();
        let node = plan.add_node(
            NodeRecord::new("Reference")
                .with("title", "T")
                .with("author", "A")
                .with("source_id", protein_id.as_str()),
        );
        plan.links.push(PlannedLink {
            node,
            rel_type: "REFERENCES".to_string(),
            direction: Direction::Outgoing,
            target: protein(&protein_id),
            on_multiple: MultipleMatchPolicy::Fail,
        });

        let summary = write_plan(&mut store, &plan).await;

        let linked = store
            .first_row(
                query(
                    "MATCH (r:Reference {source_id: $id})-[:REFERENCES]->(p:Protein {id: $id}) \
                     RETURN count(*) AS linked",
                )
                .param("id", protein_id.as_str()),
            )
            .await
            .unwrap()
            .map(|row| decode::<i64>(&row, "linked").unwrap());

        store
            .graph
            .run(
                query(
                    "MATCH (n) WHERE (n:Protein AND n.id = $id) OR (n:Reference AND n.source_id = $id) \
                     DETACH DELETE n",
                )
                .param("id", protein_id.as_str()),
            )
            .await
            .unwrap();

        assert_eq!(summary.unwrap(), WriteSummary { nodes: 1, edges: 0, links: 1 });
        assert_eq!(linked, Some(1));
    }
}
