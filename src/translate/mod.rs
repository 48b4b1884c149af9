//! MaterialX to UsdShade translation.
//!
//! Translation runs in two passes over the document's name paths:
//!
//! 1. every material, node and node graph becomes a Material, Shader or NodeGraph prim,
//!    with its definition ports and instance values,
//! 2. every `nodename`, `nodegraph` and `interfacename` reference becomes a connection.
//!
//! Nothing in either pass is fatal. Problems are collected as [`Diagnostics`] on the
//! returned [`Translation`] and logged as warnings.
//!
//! ```ignore
//! let library = Library::load(&["libraries"], &search_path)?;
//! let translation = convert_mtlx_str_to_usd(&text, &library, TranslateOptions::default())?;
//! println!("{}", translation.usda);
//! ```

mod connections;
mod diagnostics;
mod discovery;
mod emit;
mod values;

use anyhow::Result;

use crate::mtlx::{parse_mtlx, Document, ElementKind, Library};
use crate::shade::Stage;
use crate::usda::write_stage;

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use discovery::find_material_nodes;
pub use values::{
    map_mtlx_to_usd_type, map_mtlx_to_usd_value, map_shader_notation, material_output_name, MATERIAL_OUTPUT_NAMESPACE,
};

/// Translation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslateOptions {
    /// Also author every definition input with its default value, not only the inputs the
    /// instance sets.
    pub emit_all_value_elements: bool,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            emit_all_value_elements: true,
        }
    }
}

/// Result of translating one document.
#[derive(Debug, Clone, Default)]
pub struct Translation {
    /// USDA text; empty when the document had no elements.
    pub usda: String,
    pub stage: Stage,
    pub diagnostics: Diagnostics,
}

impl Translation {
    pub fn is_empty(&self) -> bool {
        self.usda.is_empty()
    }
}

/// Translate MaterialX text to USD.
///
/// Blank input yields an empty [`Translation`]. Only XML errors are returned as `Err`.
pub fn convert_mtlx_str_to_usd(content: &str, library: &Library, options: TranslateOptions) -> Result<Translation> {
    if content.trim().is_empty() {
        return Ok(Translation::default());
    }
    let doc = parse_mtlx(content)?;
    Ok(convert_mtlx_to_usd(&doc, library, options))
}

/// Translate a parsed MaterialX document to USD.
pub fn convert_mtlx_to_usd(doc: &Document, library: &Library, options: TranslateOptions) -> Translation {
    let nodes = find_material_nodes(doc);
    if nodes.is_empty() {
        log::debug!("Document has no elements, nothing to translate");
        return Translation::default();
    }

    let mut translator = Translator::new(doc, library, options, &nodes);
    translator.emit_nodes(&nodes);
    translator.emit_connections(&nodes);

    let usda = write_stage(&translator.stage);
    log::debug!(
        "Translated {} elements into {} prims with {} diagnostics",
        nodes.len(),
        translator.stage.len(),
        translator.diagnostics.len()
    );

    Translation {
        usda,
        stage: translator.stage,
        diagnostics: translator.diagnostics,
    }
}

/// Shared state of both translation passes.
struct Translator<'a> {
    doc: &'a Document,
    library: &'a Library,
    options: TranslateOptions,
    /// Name of the active material, the first material in document order.
    material: Option<String>,
    stage: Stage,
    diagnostics: Diagnostics,
}

impl<'a> Translator<'a> {
    fn new(doc: &'a Document, library: &'a Library, options: TranslateOptions, nodes: &[String]) -> Self {
        let material = nodes
            .iter()
            .filter_map(|path| doc.descendant(path))
            .map(|id| doc.element(id))
            .find(|element| element.kind() == ElementKind::Material)
            .map(|element| element.name().to_string());
        if let Some(material) = &material {
            log::debug!("Active material: {}", material);
        }

        Self {
            doc,
            library,
            options,
            material,
            stage: Stage::new(),
            diagnostics: Diagnostics::default(),
        }
    }
}
