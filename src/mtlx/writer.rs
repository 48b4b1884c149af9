//! MaterialX XML writer.

use std::fmt::Write;

use super::types::{Document, ElementId};

const INDENT: &str = "  ";

/// Serialize a document back to MaterialX XML.
pub fn write_mtlx(doc: &Document) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?>\n");
    write_element(doc, doc.root(), 0, &mut out);
    out
}

fn write_element(doc: &Document, id: ElementId, depth: usize, out: &mut String) {
    let element = doc.element(id);
    let indent = INDENT.repeat(depth);

    let _ = write!(out, "{indent}<{}", element.category());
    if id != doc.root() {
        let _ = write!(out, " name=\"{}\"", escape(element.name()));
    }
    for (key, value) in element.attributes() {
        let _ = write!(out, " {key}=\"{}\"", escape(value));
    }

    if element.children().is_empty() {
        out.push_str(" />\n");
        return;
    }

    out.push_str(">\n");
    for &child in element.children() {
        write_element(doc, child, depth + 1, out);
    }
    let _ = writeln!(out, "{indent}</{}>", element.category());
}

/// Escape the XML special characters of an attribute value.
fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
