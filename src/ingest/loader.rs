use std::io::ErrorKind;
use std::path::Path;

use crate::error::{Result, XmlGraphError};
use crate::xml::{parse_document, XmlDocument};

/// Read a whole file and decode it into an element tree.
///
/// A missing path is reported before any read or parse is attempted.
pub fn load_document(path: &Path) -> Result<XmlDocument> {
    if !path.exists() {
        return Err(XmlGraphError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => XmlGraphError::NotFound(path.to_path_buf()),
        ErrorKind::InvalidData => {
            XmlGraphError::Xml(format!("{} is not valid UTF-8", path.display()))
        }
        _ => XmlGraphError::Io(e),
    })?;

    parse_document(&content).map_err(|e| match e {
        XmlGraphError::Xml(msg) => XmlGraphError::Xml(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}
