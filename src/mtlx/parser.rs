//! MaterialX XML parser.
//!
//! Reads .mtlx files into a [`Document`] tree. Every element is kept, including ones the
//! translator does not understand, so the document can be written back losslessly.

use anyhow::{anyhow, Context, Result};
use roxmltree::Node;
use std::path::Path;

use super::error::ErrorHighlight;
use super::types::*;

/// Parse a MaterialX file from disk.
pub fn parse_mtlx_file(path: &Path) -> Result<Document> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read MaterialX file: {}", path.display()))?;
    parse_mtlx(&content).with_context(|| format!("Failed to parse MaterialX file: {}", path.display()))
}

/// Parse MaterialX XML content into a document structure.
pub fn parse_mtlx(content: &str) -> Result<Document> {
    let xml = roxmltree::Document::parse(content).map_err(|err| {
        let pos = err.pos();
        match ErrorHighlight::from_position(content, pos.row as usize, pos.col as usize) {
            Some(highlight) => anyhow!("Failed to parse MaterialX XML: {err}\n{}", highlight.render()),
            None => anyhow!("Failed to parse MaterialX XML: {err}"),
        }
    })?;
    let root = xml.root_element();

    // Verify this is a MaterialX document
    if root.tag_name().name() != "materialx" {
        anyhow::bail!(
            "Not a MaterialX document: root element is '{}'",
            root.tag_name().name()
        );
    }

    let mut doc = Document::new();
    let doc_root = doc.root();
    for attr in root.attributes() {
        doc.set_attribute(doc_root, attr.name(), attr.value());
    }

    for child in root.children().filter(|n| n.is_element()) {
        read_element(&child, &mut doc, doc_root);
    }

    log::debug!(
        "Parsed MaterialX {}: {} top-level elements",
        doc.version(),
        doc.element(doc_root).children().len()
    );

    Ok(doc)
}

/// Copy an XML element and its subtree into the document.
fn read_element(node: &Node, doc: &mut Document, parent: ElementId) {
    let category = node.tag_name().name();
    let Some(name) = node.attribute("name") else {
        log::warn!(
            "Skipping unnamed <{}> element under '{}'",
            category,
            doc.name_path(parent)
        );
        return;
    };

    let id = doc.add_child(parent, category, name);
    for attr in node.attributes().filter(|a| a.name() != "name") {
        doc.set_attribute(id, attr.name(), attr.value());
    }

    for child in node.children().filter(|n| n.is_element()) {
        read_element(&child, doc, id);
    }
}
