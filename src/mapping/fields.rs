use serde::Deserialize;
use std::collections::BTreeMap;

use super::{Direction, ImportPlan, MatchTarget, MultipleMatchPolicy, NodeRecord, PlannedLink};
use crate::error::{Result, XmlGraphError};
use crate::graph::validate_identifier;
use crate::xml::{XmlDocument, XmlPath};

/// One node built from fixed paths into the document.
///
/// ```toml
/// [mapping]
/// kind = "fields"
/// label = "Reference"
///
/// [mapping.fields]
/// title = "Reference/title"
/// author = "Reference/author"
///
/// [mapping.link]
/// relationship = "REFERENCES"
/// target_label = "Protein"
/// target_key = "id"
/// value_path = "Reference/id"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct FieldMapping {
    pub label: String,
    /// Property name -> absolute path
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub link: Option<LinkConfig>,
}

/// Link from the new node to an existing node matched by one property
#[derive(Debug, Clone, Deserialize)]
pub struct LinkConfig {
    pub relationship: String,
    pub target_label: String,
    pub target_key: String,
    /// Path of the value the target's `target_key` must equal
    pub value_path: String,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub on_multiple: MultipleMatchPolicy,
}

impl FieldMapping {
    pub fn validate(&self) -> Result<()> {
        validate_identifier(&self.label)?;
        if self.fields.is_empty() {
            return Err(XmlGraphError::Config(format!(
                "mapping for {} has no fields",
                self.label
            )));
        }
        for (name, path) in &self.fields {
            validate_identifier(name)?;
            XmlPath::parse(path)?;
        }
        if let Some(link) = &self.link {
            validate_identifier(&link.relationship)?;
            validate_identifier(&link.target_label)?;
            validate_identifier(&link.target_key)?;
            XmlPath::parse(&link.value_path)?;
        }
        Ok(())
    }

    /// Extract every configured field; the first unresolved path fails the mapping
    pub fn plan(&self, doc: &XmlDocument) -> Result<ImportPlan> {
        let mut node = NodeRecord::new(&self.label);
        for (name, raw_path) in &self.fields {
            let value = resolve(doc, raw_path)?;
            node.properties.insert(name.clone(), value);
        }

        let mut plan = ImportPlan::default();
        let index = plan.add_node(node);

        if let Some(link) = &self.link {
            let value = resolve(doc, &link.value_path)?;
            plan.links.push(PlannedLink {
                node: index,
                rel_type: link.relationship.clone(),
                direction: link.direction,
                target: MatchTarget {
                    label: link.target_label.clone(),
                    key: link.target_key.clone(),
                    value,
                },
                on_multiple: link.on_multiple,
            });
        }

        Ok(plan)
    }
}

fn resolve(doc: &XmlDocument, raw_path: &str) -> Result<String> {
    let path = XmlPath::parse(raw_path)?;
    doc.lookup(&path)
        .map(str::to_string)
        .ok_or_else(|| XmlGraphError::MissingField(path.to_string()))
}
