//! Second pass: turn upstream references into UsdShade connections.

use crate::mtlx::{Element, ElementId, ElementKind};
use crate::sdf::Path as SdfPath;
use crate::shade::{ConnectionSource, PortKind};

use super::diagnostics::DiagnosticKind;
use super::values::material_output_name;
use super::Translator;

/// An upstream reference carried by an input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Upstream<'e> {
    /// `nodename`: a sibling node.
    Node(&'e str),
    /// `nodegraph`: a node graph, usually one of its outputs.
    NodeGraph(&'e str),
    /// `interfacename`: an input of the enclosing node graph.
    Interface(&'e str),
}

impl<'e> Upstream<'e> {
    /// Resolve the reference of a value element. Only inputs may use `interfacename`.
    fn of(element: &'e Element, side: PortKind) -> Option<Self> {
        if let Some(name) = element.non_empty_attribute("nodename") {
            Some(Upstream::Node(name))
        } else if let Some(name) = element.non_empty_attribute("nodegraph") {
            Some(Upstream::NodeGraph(name))
        } else if side == PortKind::Input {
            element.non_empty_attribute("interfacename").map(Upstream::Interface)
        } else {
            None
        }
    }

    fn name(self) -> &'e str {
        match self {
            Upstream::Node(name) | Upstream::NodeGraph(name) | Upstream::Interface(name) => name,
        }
    }
}

impl Translator<'_> {
    /// Connect every referencing input and output of materials, nodes and node graphs.
    pub(super) fn emit_connections(&mut self, nodes: &[String]) {
        let doc = self.doc;

        for name_path in nodes {
            let Some(id) = doc.descendant(name_path) else {
                continue;
            };
            let root_path = match doc.element(id).kind() {
                ElementKind::Material => "/".to_string(),
                ElementKind::Node | ElementKind::NodeGraph => match &self.material {
                    Some(material) => format!("/{material}/"),
                    None => "/".to_string(),
                },
                ElementKind::Input | ElementKind::Output | ElementKind::NodeDef | ElementKind::Other => continue,
            };

            for value_id in doc.active_value_elements(id) {
                self.connect_value_element(id, value_id, &root_path);
            }
        }
    }

    fn connect_value_element(&mut self, owner_id: ElementId, value_id: ElementId, root_path: &str) {
        let doc = self.doc;
        let owner = doc.element(owner_id);
        let value_element = doc.element(value_id);
        let element_path = doc.name_path(value_id);

        let side = match value_element.kind() {
            ElementKind::Input => PortKind::Input,
            ElementKind::Output => PortKind::Output,
            ElementKind::Material
            | ElementKind::Node
            | ElementKind::NodeGraph
            | ElementKind::NodeDef
            | ElementKind::Other => return,
        };
        let Some(upstream) = Upstream::of(value_element, side) else {
            return;
        };

        let owner_path = doc.name_path(owner_id);
        let parent_path = owner.parent().map(|parent| doc.name_path(parent)).unwrap_or_default();
        let is_material = owner.kind() == ElementKind::Material;

        // Locate the upstream prim
        let mut connection_path = upstream_path(upstream, side, owner.kind(), root_path, &owner_path, &parent_path);
        let mut source = self.stage.prim_at(&connection_path);
        if source.is_none() && is_material {
            connection_path = format!("/{}{connection_path}", owner.name());
            source = self.stage.prim_at(&connection_path);
        }
        let Some(source) = source else {
            self.diagnostics
                .push(&element_path, DiagnosticKind::MissingSource { path: connection_path });
            return;
        };
        if source.kind.is_none() {
            self.diagnostics.push(
                &element_path,
                DiagnosticKind::UnsupportedSource {
                    path: source.path.to_string(),
                },
            );
            return;
        }
        let source_path = source.path.clone();
        let has_interface_input = match upstream {
            Upstream::Interface(name) => source.input(name).is_some(),
            _ => false,
        };

        let source_port = match upstream {
            Upstream::Interface(name) => name,
            _ => value_element.non_empty_attribute("output").unwrap_or("out"),
        };

        // Locate the downstream prim and port
        let dest_path = format!("{root_path}{owner_path}");
        let Some(dest) = self.stage.prim_at(&dest_path) else {
            self.diagnostics
                .push(&element_path, DiagnosticKind::MissingDestination { path: dest_path });
            return;
        };
        if dest.kind.is_none() {
            self.diagnostics
                .push(&element_path, DiagnosticKind::UnsupportedDestination { path: dest_path });
            return;
        }
        let (dest_kind, dest_port) = match side {
            PortKind::Input if is_material => (PortKind::Output, material_output_name(value_element.name())),
            PortKind::Input => (PortKind::Input, value_element.name().to_string()),
            PortKind::Output => (PortKind::Output, value_element.name().to_string()),
        };
        if dest.port(dest_kind, &dest_port).is_none() {
            self.diagnostics.push(
                &element_path,
                DiagnosticKind::MissingDestinationPort {
                    prim: dest_path,
                    port: dest_port,
                },
            );
            return;
        }
        let dest_prim_path: SdfPath = dest.path.clone();

        let result = match upstream {
            Upstream::Interface(name) => {
                if !has_interface_input {
                    self.diagnostics.push(
                        &element_path,
                        DiagnosticKind::MissingInterfaceInput {
                            prim: source_path.to_string(),
                            input: name.to_string(),
                        },
                    );
                    return;
                }
                self.stage.connect(
                    &dest_prim_path,
                    dest_kind,
                    &dest_port,
                    ConnectionSource {
                        prim_path: source_path.clone(),
                        kind: PortKind::Input,
                        name: name.to_string(),
                    },
                )
            }
            Upstream::Node(_) | Upstream::NodeGraph(_) => {
                self.stage
                    .connect_to_output(&dest_prim_path, dest_kind, &dest_port, &source_path, source_port)
            }
        };

        let source_target = format!("{}.{}{source_port}", source_path, upstream_port_prefix(upstream));
        let dest_target = dest_prim_path.property(&format!("{}{dest_port}", dest_kind.prefix()));
        match result {
            Ok(()) => log::debug!("Connected {} --> {}", source_target, dest_target),
            Err(err) => self.diagnostics.push(
                &element_path,
                DiagnosticKind::ConnectFailed {
                    source: source_target,
                    destination: dest_target,
                    reason: format!("{err:#}"),
                },
            ),
        }
    }
}

fn upstream_port_prefix(upstream: Upstream<'_>) -> &'static str {
    match upstream {
        Upstream::Interface(_) => PortKind::Input.prefix(),
        Upstream::Node(_) | Upstream::NodeGraph(_) => PortKind::Output.prefix(),
    }
}

/// Compute the prim path a reference points at.
///
/// Inputs resolve siblings in the owner's parent scope and interface names to the parent
/// itself. Outputs of a node graph resolve inside the graph.
fn upstream_path(
    upstream: Upstream<'_>,
    side: PortKind,
    owner_kind: ElementKind,
    root_path: &str,
    owner_path: &str,
    parent_path: &str,
) -> String {
    let name = upstream.name();
    let path = match side {
        PortKind::Input => match (upstream, parent_path.is_empty()) {
            (Upstream::Interface(_), false) => format!("{root_path}{parent_path}"),
            (Upstream::Interface(_), true) => root_path.to_string(),
            (_, false) => format!("{root_path}{parent_path}/{name}"),
            (_, true) => format!("{root_path}{name}"),
        },
        PortKind::Output if owner_kind == ElementKind::NodeGraph => format!("{root_path}{owner_path}/{name}"),
        PortKind::Output if !parent_path.is_empty() => format!("{root_path}{parent_path}/{name}"),
        PortKind::Output => format!("{root_path}{name}"),
    };

    match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mtlx::{parse_mtlx, Library};
    use crate::sdf;
    use crate::shade::PrimKind;
    use crate::translate::{convert_mtlx_to_usd, find_material_nodes, TranslateOptions, Translation, Translator};

    fn translate(xml: &str) -> Translation {
        let doc = parse_mtlx(xml).unwrap();
        convert_mtlx_to_usd(&doc, &Library::empty(), TranslateOptions::default())
    }

    fn connection_of(translation: &Translation, prim: &str, kind: PortKind, port: &str) -> Option<String> {
        translation
            .stage
            .prim_at(prim)?
            .port(kind, port)?
            .connection
            .as_ref()
            .map(|c| c.target_path())
    }

    #[test]
    fn test_upstream_paths() {
        let node = Upstream::Node("a");
        assert_eq!(
            upstream_path(node, PortKind::Input, ElementKind::Node, "/M/", "NG/b", "NG"),
            "/M/NG/a"
        );
        assert_eq!(upstream_path(node, PortKind::Input, ElementKind::Node, "/", "b", ""), "/a");
        assert_eq!(
            upstream_path(Upstream::Interface("file"), PortKind::Input, ElementKind::Node, "/M/", "NG/img", "NG"),
            "/M/NG"
        );
        assert_eq!(
            upstream_path(node, PortKind::Output, ElementKind::NodeGraph, "/M/", "NG", ""),
            "/M/NG/a"
        );
        assert_eq!(upstream_path(node, PortKind::Output, ElementKind::Node, "/", "b", ""), "/a");
        // Interface reference at the root stays the root
        assert_eq!(
            upstream_path(Upstream::Interface("x"), PortKind::Input, ElementKind::Node, "/", "b", ""),
            "/"
        );
    }

    #[test]
    fn test_sibling_connection() {
        let translation = translate(
            r#"<materialx>
  <nodegraph name="NG">
    <constant name="a" type="color3"><input name="value" type="color3" value="1, 0, 0"/></constant>
    <multiply name="b" type="color3"><input name="in1" type="color3" nodename="a"/></multiply>
  </nodegraph>
</materialx>"#,
        );

        assert!(translation.diagnostics.is_empty());
        assert_eq!(
            connection_of(&translation, "/NG/b", PortKind::Input, "in1").as_deref(),
            Some("/NG/a.outputs:out")
        );
        let created = translation.stage.prim_at("/NG/a").unwrap().output("out").unwrap();
        assert_eq!(created.type_name, crate::sdf::ValueTypeName::Color3f);
    }

    #[test]
    fn test_missing_source() {
        let translation = translate(
            r#"<materialx>
  <nodegraph name="NG">
    <multiply name="b" type="color3"><input name="in1" type="color3" nodename="a"/></multiply>
  </nodegraph>
</materialx>"#,
        );

        let diagnostics: Vec<_> = translation.diagnostics.for_element("NG/b/in1").collect();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].kind,
            DiagnosticKind::MissingSource {
                path: "/NG/a".to_string()
            }
        );
        assert!(connection_of(&translation, "/NG/b", PortKind::Input, "in1").is_none());
    }

    #[test]
    fn test_named_output_and_graph_outputs() {
        let translation = translate(
            r#"<materialx>
  <nodegraph name="NG">
    <separate3 name="sep" type="multioutput"/>
    <output name="r" type="float" nodename="sep" output="outr"/>
  </nodegraph>
  <standard_surface name="SR" type="surfaceshader">
    <input name="base" type="float" nodegraph="NG" output="r"/>
  </standard_surface>
  <surfacematerial name="M" type="material">
    <input name="surfaceshader" type="surfaceshader" nodename="SR"/>
  </surfacematerial>
</materialx>"#,
        );

        assert!(translation.diagnostics.is_empty(), "{:?}", translation.diagnostics);
        assert_eq!(
            connection_of(&translation, "/M/NG", PortKind::Output, "r").as_deref(),
            Some("/M/NG/sep.outputs:outr")
        );
        assert_eq!(
            connection_of(&translation, "/M/SR", PortKind::Input, "base").as_deref(),
            Some("/M/NG.outputs:r")
        );
        assert_eq!(
            connection_of(&translation, "/M", PortKind::Output, "mtlx:surface").as_deref(),
            Some("/M/SR.outputs:out")
        );
    }

    #[test]
    fn test_interface_connection() {
        let translation = translate(
            r#"<materialx>
  <nodegraph name="NG">
    <input name="file" type="filename" value="a.png"/>
    <image name="img" type="color3"><input name="file" type="filename" interfacename="file"/></image>
  </nodegraph>
</materialx>"#,
        );

        assert!(translation.diagnostics.is_empty());
        assert_eq!(
            connection_of(&translation, "/NG/img", PortKind::Input, "file").as_deref(),
            Some("/NG.inputs:file")
        );
    }

    #[test]
    fn test_missing_interface_input() {
        let translation = translate(
            r#"<materialx>
  <nodegraph name="NG">
    <image name="img" type="color3"><input name="file" type="filename" interfacename="tex"/></image>
  </nodegraph>
</materialx>"#,
        );

        assert_eq!(
            translation.diagnostics.iter().next().map(|d| &d.kind),
            Some(&DiagnosticKind::MissingInterfaceInput {
                prim: "/NG".to_string(),
                input: "tex".to_string()
            })
        );
    }

    #[test]
    fn test_interface_output_is_ignored() {
        let translation = translate(
            r#"<materialx>
  <nodegraph name="NG">
    <input name="x" type="float"/>
    <output name="out" type="float" interfacename="x"/>
  </nodegraph>
</materialx>"#,
        );

        assert!(translation.diagnostics.is_empty());
        assert!(connection_of(&translation, "/NG", PortKind::Output, "out").is_none());
    }

    #[test]
    fn test_material_without_shader() {
        let translation = translate(
            r#"<materialx>
  <surfacematerial name="M" type="material">
    <input name="surfaceshader" type="surfaceshader" nodename="missing"/>
  </surfacematerial>
</materialx>"#,
        );

        assert_eq!(
            translation.diagnostics.iter().next().map(|d| &d.kind),
            Some(&DiagnosticKind::MissingSource {
                path: "/M/missing".to_string()
            })
        );
    }

    #[test]
    fn test_material_output_has_no_destination_port() {
        let translation = translate(
            r#"<materialx>
  <standard_surface name="SR" type="surfaceshader"/>
  <surfacematerial name="M" type="material">
    <output name="out" type="material" nodename="SR"/>
  </surfacematerial>
</materialx>"#,
        );

        let diagnostics: Vec<_> = translation.diagnostics.for_element("M/out").collect();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].kind,
            DiagnosticKind::MissingDestinationPort {
                prim: "/M".to_string(),
                port: "out".to_string()
            }
        );
        assert!(translation.stage.prim_at("/M").unwrap().output("out").is_none());
    }

    #[test]
    fn test_interface_reference_at_root_is_unsupported() {
        let translation = translate(
            r#"<materialx>
  <image name="img" type="color3"><input name="file" type="filename" interfacename="file"/></image>
</materialx>"#,
        );

        let diagnostics: Vec<_> = translation.diagnostics.for_element("img/file").collect();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].kind,
            DiagnosticKind::UnsupportedSource {
                path: "/".to_string()
            }
        );
        assert!(connection_of(&translation, "/img", PortKind::Input, "file").is_none());
    }

    #[test]
    fn test_missing_destination() {
        let translation = translate(
            r#"<materialx>
  <constant name="a" type="float"/>
  <multiply name="bad-name" type="float"><input name="in1" type="float" nodename="a"/></multiply>
</materialx>"#,
        );

        let diagnostics: Vec<_> = translation.diagnostics.for_element("bad-name/in1").collect();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].kind,
            DiagnosticKind::MissingDestination {
                path: "/bad-name".to_string()
            }
        );
    }

    #[test]
    fn test_typeless_destination() -> anyhow::Result<()> {
        let doc = parse_mtlx(
            r#"<materialx>
  <nodegraph name="NG">
    <constant name="a" type="float"/>
    <multiply name="b" type="float"><input name="in1" type="float" nodename="a"/></multiply>
  </nodegraph>
</materialx>"#,
        )?;
        let library = Library::empty();
        let nodes = find_material_nodes(&doc);
        let mut translator = Translator::new(&doc, &library, TranslateOptions::default(), &nodes);

        // Only a child of "b" is defined, so "b" itself stays a typeless ancestor
        translator.stage.define(&sdf::path("/NG/a")?, PrimKind::Shader)?;
        translator.stage.define(&sdf::path("/NG/b/inner")?, PrimKind::Shader)?;
        translator.emit_connections(&nodes);

        let diagnostics: Vec<_> = translator.diagnostics.for_element("NG/b/in1").collect();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].kind,
            DiagnosticKind::UnsupportedDestination {
                path: "/NG/b".to_string()
            }
        );
        Ok(())
    }
}
