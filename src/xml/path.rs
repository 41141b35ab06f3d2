use std::fmt;

use crate::error::{Result, XmlGraphError};

/// A `/`-separated element path, optionally ending in `@attribute`.
///
/// `Reference/title` addresses element text, `entry/gene/name/@type` an
/// attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlPath {
    raw: String,
    segments: Vec<String>,
    attribute: Option<String>,
}

impl XmlPath {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Err(XmlGraphError::Config(format!("empty XML path: {:?}", raw)));
        }

        let mut segments = Vec::new();
        let mut attribute = None;
        let parts: Vec<&str> = trimmed.split('/').collect();
        for (idx, part) in parts.iter().enumerate() {
            let part = part.trim();
            if part.is_empty() {
                return Err(XmlGraphError::Config(format!("empty segment in XML path: {:?}", raw)));
            }
            if let Some(attr) = part.strip_prefix('@') {
                if idx != parts.len() - 1 || attr.is_empty() {
                    return Err(XmlGraphError::Config(format!(
                        "attribute must be the last segment of XML path: {:?}",
                        raw
                    )));
                }
                attribute = Some(attr.to_string());
            } else {
                segments.push(part.to_string());
            }
        }

        Ok(Self {
            raw: trimmed.to_string(),
            segments,
            attribute,
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Drop the leading root segment, if it names `root`
    pub(crate) fn strip_root(&self, root: &str) -> Option<XmlPath> {
        match self.segments.first() {
            Some(first) if first == root => Some(XmlPath {
                raw: self.raw.clone(),
                segments: self.segments[1..].to_vec(),
                attribute: self.attribute.clone(),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for XmlPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
