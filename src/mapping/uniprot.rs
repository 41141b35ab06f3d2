//! UniProt entry profile.
//!
//! Builds a protein-centred fragment from the first `entry` of a UniProt XML
//! export. Only the accession is required; absent sections are skipped.

use serde::Deserialize;

use super::{ImportPlan, NodeRecord};
use crate::error::{Result, XmlGraphError};
use crate::xml::{XmlDocument, XmlElement};

#[derive(Debug, Clone, Deserialize)]
pub struct UniprotMapping {
    /// Only import gene names of these types (`primary`, `synonym`, ...); empty imports all
    #[serde(default)]
    pub gene_types: Vec<String>,
    /// Only import features located at this position
    #[serde(default)]
    pub feature_position: Option<String>,
    /// Create Author nodes for reference author lists
    #[serde(default = "default_authors")]
    pub authors: bool,
}

fn default_authors() -> bool {
    true
}

impl Default for UniprotMapping {
    fn default() -> Self {
        Self {
            gene_types: Vec::new(),
            feature_position: None,
            authors: default_authors(),
        }
    }
}

impl UniprotMapping {
    pub fn plan(&self, doc: &XmlDocument) -> Result<ImportPlan> {
        let entry = find_entry(doc)?;
        let accession = entry
            .value("accession")
            .filter(|a| !a.is_empty())
            .ok_or_else(|| XmlGraphError::MissingField("uniprot/entry/accession".to_string()))?;

        let mut plan = ImportPlan::default();
        let protein = plan.add_node(NodeRecord::new("Protein").with("id", accession));

        for name in entry.find_all("gene/name") {
            let gene_type = name.attribute("type").unwrap_or("");
            if !self.gene_types.is_empty() && !self.gene_types.iter().any(|t| t == gene_type) {
                continue;
            }
            let gene = plan.add_node(NodeRecord::new("Gene").with("name", &name.text));
            plan.add_edge(protein, gene, "FROM_GENE");
        }

        for feature in entry.find_all("feature") {
            let Some(description) = feature.attribute("description") else {
                continue;
            };
            if let Some(position) = &self.feature_position {
                if feature.value("location/position/@position") != Some(position.as_str()) {
                    continue;
                }
            }
            let node = NodeRecord::new("Feature")
                .with("name", description)
                .with("type", feature.attribute("type").unwrap_or(""));
            let index = plan.add_node(node);
            plan.add_edge(protein, index, "HAS_FEATURE");
        }

        for reference in entry.find_all("reference") {
            let node = NodeRecord::new("Reference")
                .with("id", reference.attribute("key").unwrap_or(""))
                .with("type", reference.value("citation/@type").unwrap_or(""))
                .with("name", reference.value("citation/@name").unwrap_or(""));
            let index = plan.add_node(node);
            plan.add_edge(protein, index, "HAS_REFERENCE");

            if self.authors {
                for person in reference.find_all("citation/authorList/person") {
                    if let Some(name) = person.attribute("name") {
                        let author = plan.add_node(NodeRecord::new("Author").with("name", name));
                        plan.add_edge(index, author, "HAS_AUTHOR");
                    }
                }
            }
        }

        if let Some(full_name) = entry
            .value("protein/recommendedName/fullName")
            .filter(|n| !n.is_empty())
        {
            let index = plan.add_node(NodeRecord::new("FullName").with("name", full_name));
            plan.add_edge(protein, index, "HAS_FULL_NAME");
        }

        if let Some(organism) = entry.child("organism") {
            if let Some(name) = scientific_name(organism) {
                let taxonomy_id = organism
                    .children_named("dbReference")
                    .find(|r| r.attribute("type") == Some("NCBI Taxonomy"))
                    .and_then(|r| r.attribute("id"))
                    .unwrap_or("");
                let node = NodeRecord::new("Organism")
                    .with("name", name)
                    .with("taxonomy_id", taxonomy_id);
                let index = plan.add_node(node);
                plan.add_edge(protein, index, "IN_ORGANISM");
            }
        }

        log::debug!(
            "UniProt entry {}: {} nodes, {} edges",
            accession,
            plan.nodes.len(),
            plan.edges.len()
        );
        Ok(plan)
    }
}

/// First `entry` of a `uniprot` export, or the root itself when it is an entry
fn find_entry(doc: &XmlDocument) -> Result<&XmlElement> {
    if doc.root.name == "entry" {
        return Ok(&doc.root);
    }
    doc.find_all("uniprot/entry")
        .into_iter()
        .next()
        .ok_or_else(|| XmlGraphError::MissingField("uniprot/entry".to_string()))
}

fn scientific_name(organism: &XmlElement) -> Option<&str> {
    organism
        .children_named("name")
        .find(|n| n.attribute("type") == Some("scientific"))
        .or_else(|| organism.child("name"))
        .map(|n| n.text.as_str())
        .filter(|n| !n.is_empty())
}
