//! MaterialX definition libraries.
//!
//! A [`Library`] gathers `nodedef` elements from the standard data libraries (or any other
//! folder of .mtlx files). It is passed to the translator explicitly; nothing here is
//! loaded behind the caller's back.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::parser::parse_mtlx_file;
use super::types::{Document, ElementId, ElementKind};

/// Library folders loaded when the caller does not name any.
pub const DEFAULT_LIBRARY_FOLDERS: &[&str] = &["libraries"];

/// Environment variable holding the MaterialX data search path.
pub const SEARCH_PATH_ENV: &str = "MATERIALX_SEARCH_PATH";

/// A borrowed node definition together with the document that owns it.
#[derive(Debug, Clone, Copy)]
pub struct NodeDefRef<'a> {
    pub document: &'a Document,
    pub id: ElementId,
}

impl<'a> NodeDefRef<'a> {
    /// Definition name (e.g. `ND_image_color3`).
    pub fn name(&self) -> &'a str {
        self.document.element(self.id).name()
    }

    /// Active inputs and outputs of the definition, including inherited ones.
    pub fn value_elements(&self) -> Vec<ElementId> {
        self.document.active_value_elements(self.id)
    }
}

/// A set of node definitions merged from one or more documents.
#[derive(Debug, Clone, Default)]
pub struct Library {
    definitions: Document,
    files: Vec<PathBuf>,
}

impl Library {
    /// A library without any definitions.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge already parsed documents. Earlier documents win on name clashes.
    pub fn from_documents<'d>(documents: impl IntoIterator<Item = &'d Document>) -> Self {
        let mut definitions = Document::new();
        for doc in documents {
            definitions.import_library(doc);
        }
        Self {
            definitions,
            files: Vec::new(),
        }
    }

    /// Load every .mtlx file under `folders`, resolved against each search path root.
    ///
    /// Folders that do not exist under a root are skipped.
    pub fn load<S: AsRef<str>>(folders: &[S], search_path: &[PathBuf]) -> Result<Self> {
        let mut library = Self::empty();

        for root in search_path {
            for folder in folders {
                let dir = root.join(folder.as_ref());
                if !dir.is_dir() {
                    log::debug!("Library folder not found: {}", dir.display());
                    continue;
                }
                library
                    .load_folder(&dir)
                    .with_context(|| format!("Failed to load library folder: {}", dir.display()))?;
            }
        }

        if library.files.is_empty() {
            log::warn!("No MaterialX library files found on the search path");
        } else {
            log::debug!(
                "Loaded {} library files, {} definitions",
                library.files.len(),
                library.node_def_count()
            );
        }

        Ok(library)
    }

    fn load_folder(&mut self, dir: &Path) -> Result<()> {
        let files = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("mtlx"));

        for file in files {
            let doc = parse_mtlx_file(&file)?;
            self.definitions.import_library(&doc);
            self.files.push(file);
        }

        Ok(())
    }

    /// Files the library was loaded from.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Number of node definitions in the library.
    pub fn node_def_count(&self) -> usize {
        self.definitions.top_level("nodedef").count()
    }

    /// Find the node definition for a node, material or node graph of `doc`.
    ///
    /// The document's own definitions are searched before the library's.
    pub fn node_def<'a>(&'a self, doc: &'a Document, id: ElementId) -> Option<NodeDefRef<'a>> {
        let element = doc.element(id);
        let kind = element.kind();
        if !matches!(kind, ElementKind::Node | ElementKind::Material | ElementKind::NodeGraph) {
            return None;
        }

        if let Some(name) = element.non_empty_attribute("nodedef") {
            return [doc, &self.definitions].into_iter().find_map(|source| {
                source
                    .child(source.root(), name)
                    .filter(|&nd| source.element(nd).kind() == ElementKind::NodeDef)
                    .map(|nd| NodeDefRef { document: source, id: nd })
            });
        }

        // Node graphs only implement a definition when they name it.
        if kind == ElementKind::NodeGraph {
            return None;
        }

        [doc, &self.definitions].into_iter().find_map(|source| {
            source
                .top_level("nodedef")
                .find(|&nd| matches_instance(doc, id, source, nd))
                .map(|nd| NodeDefRef { document: source, id: nd })
        })
    }
}

/// Output type of a definition: its single output's type, `multioutput`, or its `type`.
fn node_def_output_type(doc: &Document, nodedef: ElementId) -> String {
    let outputs: Vec<ElementId> = doc
        .active_value_elements(nodedef)
        .into_iter()
        .filter(|&id| doc.element(id).kind() == ElementKind::Output)
        .collect();
    match outputs.as_slice() {
        [single] => doc.element(*single).element_type().to_string(),
        [] => doc.element(nodedef).element_type().to_string(),
        _ => "multioutput".to_string(),
    }
}

/// A definition matches when category and output type agree and every instance input
/// exists on the definition with the same type.
fn matches_instance(doc: &Document, node: ElementId, defs: &Document, nodedef: ElementId) -> bool {
    let element = doc.element(node);
    if defs.element(nodedef).attribute("node") != Some(element.category()) {
        return false;
    }

    let node_type = element.element_type();
    if !node_type.is_empty() && node_def_output_type(defs, nodedef) != node_type {
        return false;
    }

    let def_inputs = defs.active_value_elements(nodedef);
    element
        .children()
        .iter()
        .map(|&child| doc.element(child))
        .filter(|child| child.kind() == ElementKind::Input)
        .all(|input| {
            def_inputs.iter().any(|&def_input| {
                let def = defs.element(def_input);
                def.kind() == ElementKind::Input
                    && def.name() == input.name()
                    && def.element_type() == input.element_type()
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mtlx::parse_mtlx;
    use std::fs;

    const DEFS: &str = r#"<?xml version="1.0"?>
<materialx version="1.38">
  <nodedef name="ND_image_color3" node="image">
    <input name="file" type="filename" value="" />
    <input name="default" type="color3" value="0, 0, 0" />
    <output name="out" type="color3" />
  </nodedef>
  <nodedef name="ND_image_float" node="image">
    <input name="file" type="filename" value="" />
    <input name="default" type="float" value="0" />
    <output name="out" type="float" />
  </nodedef>
  <nodedef name="ND_mix_color3" node="mix">
    <input name="fg" type="color3" />
    <input name="bg" type="color3" />
    <input name="mix" type="float" value="0" />
    <output name="out" type="color3" />
  </nodedef>
  <nodedef name="ND_mix_color3_color3" node="mix">
    <input name="fg" type="color3" />
    <input name="bg" type="color3" />
    <input name="mix" type="color3" />
    <output name="out" type="color3" />
  </nodedef>
</materialx>"#;

    fn library() -> Library {
        Library::from_documents([&parse_mtlx(DEFS).unwrap()])
    }

    #[test]
    fn test_match_by_category_and_type() {
        let lib = library();
        let doc = parse_mtlx(r#"<materialx><image name="img" type="float"/></materialx>"#).unwrap();
        let img = doc.descendant("img").unwrap();

        let nd = lib.node_def(&doc, img).unwrap();
        assert_eq!(nd.name(), "ND_image_float");
        assert_eq!(nd.value_elements().len(), 3);
    }

    #[test]
    fn test_match_uses_input_types() {
        let lib = library();
        let doc = parse_mtlx(
            r#"<materialx><mix name="m" type="color3"><input name="mix" type="color3" value="0.5,0.5,0.5"/></mix></materialx>"#,
        )
        .unwrap();
        let mix = doc.descendant("m").unwrap();
        assert_eq!(lib.node_def(&doc, mix).unwrap().name(), "ND_mix_color3_color3");
    }

    #[test]
    fn test_unknown_input_prevents_match() {
        let lib = library();
        let doc = parse_mtlx(
            r#"<materialx><image name="img" type="color3"><input name="bogus" type="float"/></image></materialx>"#,
        )
        .unwrap();
        assert!(lib.node_def(&doc, doc.descendant("img").unwrap()).is_none());
    }

    #[test]
    fn test_explicit_nodedef_attribute() {
        let lib = library();
        let doc = parse_mtlx(
            r#"<materialx><nodegraph name="NG" nodedef="ND_mix_color3"/><image name="i" type="color3" nodedef="ND_image_float"/></materialx>"#,
        )
        .unwrap();
        assert_eq!(lib.node_def(&doc, doc.descendant("NG").unwrap()).unwrap().name(), "ND_mix_color3");
        assert_eq!(lib.node_def(&doc, doc.descendant("i").unwrap()).unwrap().name(), "ND_image_float");
    }

    #[test]
    fn test_document_definitions_win() {
        let lib = library();
        let doc = parse_mtlx(
            r#"<materialx>
  <nodedef name="ND_local_image" node="image"><output name="out" type="color3"/></nodedef>
  <image name="img" type="color3"/>
</materialx>"#,
        )
        .unwrap();
        assert_eq!(lib.node_def(&doc, doc.descendant("img").unwrap()).unwrap().name(), "ND_local_image");
    }

    #[test]
    fn test_load_from_search_path() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let stdlib = tmp.path().join("libraries").join("stdlib");
        fs::create_dir_all(&stdlib)?;
        fs::write(stdlib.join("stdlib_defs.mtlx"), DEFS)?;
        fs::write(stdlib.join("README.txt"), "not a library")?;

        let lib = Library::load(DEFAULT_LIBRARY_FOLDERS, &[tmp.path().to_path_buf()])?;
        assert_eq!(lib.files().len(), 1);
        assert_eq!(lib.node_def_count(), 4);
        Ok(())
    }

    #[test]
    fn test_load_missing_folder_is_empty() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let lib = Library::load(&["nope"], &[tmp.path().to_path_buf()])?;
        assert_eq!(lib.node_def_count(), 0);
        Ok(())
    }

    #[test]
    fn test_load_reports_broken_file() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let dir = tmp.path().join("libraries");
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("broken.mtlx"), "<materialx>")?;

        let err = Library::load(DEFAULT_LIBRARY_FOLDERS, &[tmp.path().to_path_buf()]).unwrap_err();
        assert!(format!("{err:#}").contains("broken.mtlx"));
        Ok(())
    }
}
