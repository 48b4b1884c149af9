use std::collections::HashSet;

use crate::mtlx::Document;

/// Find the name paths of all elements in a MaterialX document.
///
/// Paths are returned in document order; a path seen twice is only listed once. The
/// document root (empty name path) is not included.
pub fn find_material_nodes(doc: &Document) -> Vec<String> {
    let mut visited = HashSet::new();
    let mut nodes = Vec::new();

    for id in doc.traverse() {
        if id == doc.root() {
            continue;
        }
        let path = doc.name_path(id);
        if visited.insert(path.clone()) {
            nodes.push(path);
        }
    }

    nodes
}
