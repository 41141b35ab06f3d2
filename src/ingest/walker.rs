use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Result, XmlGraphError};

/// Resolve the import input to a list of XML files.
///
/// A file path is returned as-is whatever its extension. A directory is
/// walked recursively and every `.xml` file (case-insensitive) is returned in
/// path order, so repeated runs import in the same sequence.
pub fn discover_xml_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(XmlGraphError::NotFound(root.to_path_buf()));
    }
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let is_xml = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("xml"))
            .unwrap_or(false);
        if is_xml {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    log::info!("Discovered {} XML files in {}", files.len(), root.display());
    Ok(files)
}
