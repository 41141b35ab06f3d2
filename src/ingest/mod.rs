pub mod loader;
pub mod walker;

pub use loader::load_document;
pub use walker::discover_xml_files;

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::graph::{write_plan, GraphSink, WriteSummary};
use crate::mapping::{ImportPlan, MappingConfig};

/// Outcome of importing one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub path: PathBuf,
    pub written: WriteSummary,
}

/// Load and map a file without touching the database
pub fn plan_file(path: &Path, mapping: &MappingConfig) -> Result<ImportPlan> {
    let doc = load_document(path)?;
    mapping.plan(&doc)
}

/// Import a single file
///
/// Orchestrates the full pipeline: load → map → write. Load and mapping
/// errors happen before the first database call.
pub async fn import_file<S: GraphSink>(
    sink: &mut S,
    path: &Path,
    mapping: &MappingConfig,
) -> Result<ImportSummary> {
    let plan = plan_file(path, mapping)?;
    log::debug!(
        "{}: {} nodes, {} edges, {} links planned",
        path.display(),
        plan.nodes.len(),
        plan.edges.len(),
        plan.links.len()
    );

    let written = write_plan(sink, &plan).await?;

    Ok(ImportSummary {
        path: path.to_path_buf(),
        written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::XmlGraphError;
    use crate::graph::memory::MemoryGraph;
    use crate::mapping::NodeRecord;
    use std::fs;
    use tempfile::TempDir;

    fn reference_mapping() -> MappingConfig {
        toml::from_str(
            r#"
kind = "fields"
label = "Reference"

[fields]
title = "Reference/title"
author = "Reference/author"

[link]
relationship = "REFERENCES"
target_label = "Protein"
target_key = "id"
value_path = "Reference/id"
"#,
        )
        .unwrap()
    }

    fn write_file(temp_dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = temp_dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_end_to_end_reference() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_file(
            &temp_dir,
            "reference.xml",
            "<Reference><title>T</title><author>A</author><id>P1</id></Reference>",
        );
        let mut graph = MemoryGraph::new();
        let protein = graph.seed(NodeRecord::new("Protein").with("id", "P1"));

        let summary = import_file(&mut graph, &path, &reference_mapping())
            .await
            .unwrap();
        assert_eq!(summary.written, WriteSummary { nodes: 1, edges: 0, links: 1 });

        let refs = graph.nodes_with_label("Reference");
        assert_eq!(refs.len(), 1);
        assert_eq!(
            graph.nodes[refs[0]],
            NodeRecord::new("Reference").with("title", "T").with("author", "A")
        );
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].from, refs[0]);
        assert_eq!(graph.edges[0].to, protein);
    }

    #[tokio::test]
    async fn test_second_run_duplicates() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_file(
            &temp_dir,
            "reference.xml",
            "<Reference><title>T</title><author>A</author><id>P1</id></Reference>",
        );
        let mut graph = MemoryGraph::new();
        graph.seed(NodeRecord::new("Protein").with("id", "P1"));

        import_file(&mut graph, &path, &reference_mapping()).await.unwrap();
        import_file(&mut graph, &path, &reference_mapping()).await.unwrap();

        assert_eq!(graph.nodes_with_label("Reference").len(), 2);
        assert_eq!(graph.edges.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_field_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_file(
            &temp_dir,
            "reference.xml",
            "<Reference><title>T</title><id>P1</id></Reference>",
        );
        let mut graph = MemoryGraph::new();
        graph.seed(NodeRecord::new("Protein").with("id", "P1"));

        let err = import_file(&mut graph, &path, &reference_mapping())
            .await
            .unwrap_err();
        assert!(matches!(err, XmlGraphError::MissingField(_)));
        assert_eq!(graph.writes, 0);
    }

    #[tokio::test]
    async fn test_missing_file_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.xml");
        let mut graph = MemoryGraph::new();

        let err = import_file(&mut graph, &path, &reference_mapping())
            .await
            .unwrap_err();
        assert!(matches!(err, XmlGraphError::NotFound(_)));
        assert_eq!(graph.writes, 0);
    }

    #[tokio::test]
    async fn test_uniprot_import() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_file(
            &temp_dir,
            "Q9Y261.xml",
            r#"<uniprot xmlns="http://uniprot.org/uniprot"><entry>
                <accession>Q9Y261</accession>
                <gene><name type="primary">FOXA2</name></gene>
                <reference key="1"><citation type="journal article" name="J">
                    <authorList><person name="Pan C."/></authorList>
                </citation></reference>
            </entry></uniprot>"#,
        );
        let mapping: MappingConfig = toml::from_str(r#"kind = "uniprot""#).unwrap();
        let mut graph = MemoryGraph::new();

        let summary = import_file(&mut graph, &path, &mapping).await.unwrap();
        assert_eq!(summary.written, WriteSummary { nodes: 4, edges: 3, links: 0 });
        assert_eq!(graph.nodes_with_label("Protein").len(), 1);
        assert!(graph.edges.iter().any(|e| e.rel_type == "HAS_AUTHOR"));
    }

    #[test]
    fn test_plan_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_file(
            &temp_dir,
            "reference.xml",
            "<Reference><title>T</title><author>A</author><id>P1</id></Reference>",
        );
        let plan = plan_file(&path, &reference_mapping()).unwrap();
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["nodes"][0]["label"], "Reference");
        assert_eq!(json["links"][0]["target"]["value"], "P1");
        assert_eq!(json["links"][0]["direction"], "outgoing");
    }
}
