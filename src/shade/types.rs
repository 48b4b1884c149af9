//! Type definitions for USD shading schemas.

use crate::sdf::{Path as SdfPath, Value, ValueTypeName};

/// Schema type of a shading prim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimKind {
    /// `UsdShadeMaterial`: exposes terminal outputs such as `outputs:mtlx:surface`.
    Material,
    /// `UsdShadeNodeGraph`: a container with interface inputs and outputs.
    NodeGraph,
    /// `UsdShadeShader`: a node identified by `info:id`.
    Shader,
}

impl PrimKind {
    /// The prim type name written in USDA.
    pub fn type_name(self) -> &'static str {
        match self {
            PrimKind::Material => "Material",
            PrimKind::NodeGraph => "NodeGraph",
            PrimKind::Shader => "Shader",
        }
    }
}

/// Whether a port lives in the `inputs:` or `outputs:` namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    Input,
    Output,
}

impl PortKind {
    /// Namespace prefix of the port's attribute name.
    pub fn prefix(self) -> &'static str {
        match self {
            PortKind::Input => "inputs:",
            PortKind::Output => "outputs:",
        }
    }
}

/// The upstream end of a connection: a port on another prim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSource {
    /// Path of the source prim.
    pub prim_path: SdfPath,
    /// Namespace of the source port.
    pub kind: PortKind,
    /// Port name without namespace (e.g. `out`).
    pub name: String,
}

impl ConnectionSource {
    /// Full attribute path, e.g. `/Material/Shader.outputs:out`.
    pub fn target_path(&self) -> String {
        self.prim_path.property(&format!("{}{}", self.kind.prefix(), self.name))
    }
}

/// An input or output attribute of a shading prim.
#[derive(Debug, Clone)]
pub struct Port {
    /// Port name without namespace (e.g. `base_color`, `mtlx:surface`).
    pub name: String,
    pub kind: PortKind,
    pub type_name: ValueTypeName,
    /// Authored default value.
    pub value: Option<Value>,
    /// Authored connection.
    pub connection: Option<ConnectionSource>,
}

impl Port {
    /// Namespaced attribute name, e.g. `inputs:base_color`.
    pub fn full_name(&self) -> String {
        format!("{}{}", self.kind.prefix(), self.name)
    }
}

/// A prim on the stage.
///
/// Prims created implicitly as ancestors of a defined path have no kind.
#[derive(Debug, Clone)]
pub struct Prim {
    /// Absolute prim path.
    pub path: SdfPath,
    /// Schema type, `None` for typeless prims.
    pub kind: Option<PrimKind>,
    /// Shader identifier (`info:id`), only meaningful for shaders.
    pub shader_id: Option<String>,
    /// Ports in authoring order.
    pub ports: Vec<Port>,
    /// Child prim names in authoring order.
    pub children: Vec<String>,
}

impl Prim {
    pub(super) fn new(path: SdfPath) -> Self {
        Self {
            path,
            kind: None,
            shader_id: None,
            ports: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Find a port by namespace and name.
    pub fn port(&self, kind: PortKind, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.kind == kind && p.name == name)
    }

    pub(super) fn port_mut(&mut self, kind: PortKind, name: &str) -> Option<&mut Port> {
        self.ports.iter_mut().find(|p| p.kind == kind && p.name == name)
    }

    pub fn input(&self, name: &str) -> Option<&Port> {
        self.port(PortKind::Input, name)
    }

    pub fn output(&self, name: &str) -> Option<&Port> {
        self.port(PortKind::Output, name)
    }

    pub fn inputs(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(|p| p.kind == PortKind::Input)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(|p| p.kind == PortKind::Output)
    }

    /// Create a port, or retype an existing one. Values and connections are kept.
    pub fn create_port(&mut self, kind: PortKind, name: &str, type_name: ValueTypeName) -> &mut Port {
        let index = match self.ports.iter().position(|p| p.kind == kind && p.name == name) {
            Some(index) => {
                self.ports[index].type_name = type_name;
                index
            }
            None => {
                self.ports.push(Port {
                    name: name.to_string(),
                    kind,
                    type_name,
                    value: None,
                    connection: None,
                });
                self.ports.len() - 1
            }
        };
        &mut self.ports[index]
    }

    pub fn create_input(&mut self, name: &str, type_name: ValueTypeName) -> &mut Port {
        self.create_port(PortKind::Input, name, type_name)
    }

    pub fn create_output(&mut self, name: &str, type_name: ValueTypeName) -> &mut Port {
        self.create_port(PortKind::Output, name, type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdf;

    #[test]
    fn test_create_port_retypes_existing() {
        let mut prim = Prim::new(sdf::path("/S").unwrap());
        prim.create_input("in", ValueTypeName::Float).value = Some(Value::Float(0.5));
        prim.create_input("in", ValueTypeName::Color3f);
        prim.create_output("in", ValueTypeName::Float);

        assert_eq!(prim.ports.len(), 2);
        let input = prim.input("in").unwrap();
        assert_eq!(input.type_name, ValueTypeName::Color3f);
        assert_eq!(input.value, Some(Value::Float(0.5)));
        assert_eq!(input.full_name(), "inputs:in");
        assert_eq!(prim.outputs().count(), 1);
    }
}
