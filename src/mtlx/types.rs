//! MaterialX document model.
//!
//! A [`Document`] is an arena of [`Element`]s linked by parent/children ids. Elements keep
//! their XML category, name and attributes in authoring order so documents can be written
//! back out unchanged.

use std::collections::HashSet;

/// Categories that never behave like nodes, even when they appear at node scope.
const NON_NODE_CATEGORIES: &[&str] = &[
    "attributedef",
    "backdrop",
    "collection",
    "geominfo",
    "geompropdef",
    "implementation",
    "look",
    "lookgroup",
    "materialassign",
    "materialx",
    "member",
    "property",
    "propertyassign",
    "propertyset",
    "propertysetassign",
    "targetdef",
    "token",
    "typedef",
    "unitdef",
    "unittypedef",
    "variant",
    "variantassign",
    "variantset",
    "visibility",
];

/// Default MaterialX version stamped on new documents.
pub const DEFAULT_VERSION: &str = "1.38";

/// Index of an element inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

/// The role an element plays in a shading graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// A node whose output type is `material` (e.g. `surfacematerial`).
    Material,
    /// A shader or pattern node instance.
    Node,
    /// A `nodegraph` element.
    NodeGraph,
    /// An `input` value element.
    Input,
    /// An `output` value element.
    Output,
    /// A `nodedef` element.
    NodeDef,
    /// Anything else: the document root, looks, typedefs, tokens, ...
    Other,
}

impl ElementKind {
    /// Returns true for inputs and outputs.
    pub fn is_value_element(self) -> bool {
        matches!(self, ElementKind::Input | ElementKind::Output)
    }
}

/// A single MaterialX element.
#[derive(Debug, Clone)]
pub struct Element {
    category: String,
    name: String,
    /// All attributes except `name`, in authoring order.
    attributes: Vec<(String, String)>,
    /// True when the parent is the document root or a node graph.
    node_scope: bool,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

impl Element {
    /// Element category (the XML tag name).
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `type` attribute, or an empty string.
    pub fn element_type(&self) -> &str {
        self.attribute("type").unwrap_or("")
    }

    /// The `value` attribute, or an empty string.
    pub fn value_string(&self) -> &str {
        self.attribute("value").unwrap_or("")
    }

    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Look up an attribute, treating an empty value as absent.
    pub fn non_empty_attribute(&self, name: &str) -> Option<&str> {
        self.attribute(name).filter(|value| !value.is_empty())
    }

    /// All attributes except `name`, in authoring order.
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Parent element, `None` for the document root.
    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    /// Child elements in document order.
    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    /// Classify the element.
    pub fn kind(&self) -> ElementKind {
        match self.category.as_str() {
            "input" => ElementKind::Input,
            "output" => ElementKind::Output,
            "nodegraph" => ElementKind::NodeGraph,
            "nodedef" => ElementKind::NodeDef,
            category if !self.node_scope || NON_NODE_CATEGORIES.contains(&category) => ElementKind::Other,
            _ if self.element_type() == "material" => ElementKind::Material,
            _ => ElementKind::Node,
        }
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        if let Some(slot) = self.attributes.iter_mut().find(|(key, _)| key == name) {
            slot.1 = value.to_string();
        } else {
            self.attributes.push((name.to_string(), value.to_string()));
        }
    }
}

/// A parsed MaterialX document.
#[derive(Debug, Clone)]
pub struct Document {
    elements: Vec<Element>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a new document holding only a `materialx` root.
    pub fn new() -> Self {
        let root = Element {
            category: "materialx".to_string(),
            name: String::new(),
            attributes: vec![("version".to_string(), DEFAULT_VERSION.to_string())],
            node_scope: false,
            parent: None,
            children: Vec::new(),
        };
        Self { elements: vec![root] }
    }

    /// The `materialx` root element.
    pub fn root(&self) -> ElementId {
        ElementId(0)
    }

    /// True when the root has no children.
    pub fn is_empty(&self) -> bool {
        self.elements[0].children.is_empty()
    }

    /// MaterialX version of the document.
    pub fn version(&self) -> &str {
        self.elements[0].attribute("version").unwrap_or(DEFAULT_VERSION)
    }

    /// Borrow an element.
    ///
    /// Ids are only handed out by the owning document, so lookups cannot miss.
    pub fn element(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }

    /// Append a new child element and return its id.
    pub fn add_child(&mut self, parent: ElementId, category: &str, name: &str) -> ElementId {
        let parent_element = &self.elements[parent.0];
        let node_scope = parent.0 == 0 || parent_element.category == "nodegraph";

        let id = ElementId(self.elements.len());
        self.elements.push(Element {
            category: category.to_string(),
            name: name.to_string(),
            attributes: Vec::new(),
            node_scope,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.elements[parent.0].children.push(id);
        id
    }

    /// Set (or overwrite) an attribute on an element.
    pub fn set_attribute(&mut self, id: ElementId, name: &str, value: &str) {
        self.elements[id.0].set_attribute(name, value);
    }

    /// Find a direct child by name.
    pub fn child(&self, parent: ElementId, name: &str) -> Option<ElementId> {
        self.element(parent)
            .children
            .iter()
            .copied()
            .find(|&child| self.element(child).name == name)
    }

    /// Slash-separated names from the top-level element down to `id`.
    ///
    /// The root itself has an empty name path.
    pub fn name_path(&self, id: ElementId) -> String {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            if cur == self.root() {
                break;
            }
            let element = self.element(cur);
            names.push(element.name.as_str());
            current = element.parent;
        }
        names.reverse();
        names.join("/")
    }

    /// Resolve a name path produced by [`Document::name_path`].
    pub fn descendant(&self, name_path: &str) -> Option<ElementId> {
        let mut current = self.root();
        for segment in name_path.split('/').filter(|s| !s.is_empty()) {
            current = self.child(current, segment)?;
        }
        Some(current)
    }

    /// All elements in pre-order document order, starting with the root.
    pub fn traverse(&self) -> Vec<ElementId> {
        let mut order = Vec::with_capacity(self.elements.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.element(id).children.iter().rev().copied());
        }
        order
    }

    /// Top-level elements of the given category.
    pub fn top_level(&self, category: &str) -> impl Iterator<Item = ElementId> + '_ {
        let category = category.to_string();
        self.element(self.root())
            .children
            .iter()
            .copied()
            .filter(move |&id| self.element(id).category == category)
    }

    /// Input and output children of an element.
    ///
    /// For node definitions the `inherit` chain is followed as well; names already seen
    /// shadow inherited elements.
    pub fn active_value_elements(&self, id: ElementId) -> Vec<ElementId> {
        let mut result = Vec::new();
        let mut seen_names = HashSet::new();
        let mut visited = HashSet::new();
        let mut current = Some(id);

        while let Some(cur) = current {
            if !visited.insert(cur) {
                log::warn!("Inheritance cycle detected at '{}'", self.name_path(cur));
                break;
            }

            let element = self.element(cur);
            for &child in &element.children {
                let child_element = self.element(child);
                if child_element.kind().is_value_element() && seen_names.insert(child_element.name.clone()) {
                    result.push(child);
                }
            }

            current = match element.kind() {
                ElementKind::NodeDef => element
                    .non_empty_attribute("inherit")
                    .and_then(|base| self.child(self.root(), base)),
                _ => None,
            };
        }

        result
    }

    /// Deep-copy `source` (an element of `other`) under `parent` in this document.
    pub fn copy_subtree(&mut self, parent: ElementId, other: &Document, source: ElementId) -> ElementId {
        let src = other.element(source);
        let id = self.add_child(parent, &src.category, &src.name);
        for (key, value) in &src.attributes {
            self.set_attribute(id, key, value);
        }
        for &child in &src.children {
            self.copy_subtree(id, other, child);
        }
        id
    }

    /// Import the top-level elements of `other` whose names are not already present.
    ///
    /// Returns the number of imported elements.
    pub fn import_library(&mut self, other: &Document) -> usize {
        let mut imported = 0;
        for &child in other.element(other.root()).children() {
            let name = other.element(child).name();
            if self.child(self.root(), name).is_some() {
                log::debug!("Skipping duplicate library element: {}", name);
                continue;
            }
            self.copy_subtree(self.root(), other, child);
            imported += 1;
        }
        imported
    }
}
