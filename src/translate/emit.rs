//! First pass: prims, ports and values.

use crate::mtlx::{Document, Element, ElementId, ElementKind, NodeDefRef};
use crate::sdf::Path as SdfPath;
use crate::shade::{Port, Prim, PrimKind};

use super::diagnostics::{DiagnosticKind, Diagnostics};
use super::values::{map_mtlx_to_usd_type, map_mtlx_to_usd_value, material_output_name};
use super::Translator;

impl Translator<'_> {
    /// Define a prim for every material, node and node graph.
    pub(super) fn emit_nodes(&mut self, nodes: &[String]) {
        let doc = self.doc;

        for name_path in nodes {
            let Some(id) = doc.descendant(name_path) else {
                continue;
            };
            let element = doc.element(id);
            let kind = match element.kind() {
                ElementKind::Material => PrimKind::Material,
                ElementKind::Node => PrimKind::Shader,
                ElementKind::NodeGraph => PrimKind::NodeGraph,
                ElementKind::Input | ElementKind::Output | ElementKind::NodeDef | ElementKind::Other => continue,
            };

            let prim_path = self.prim_path(name_path, kind);
            let prim_path = match SdfPath::new(&prim_path) {
                Ok(path) => path,
                Err(_) => {
                    self.diagnostics
                        .push(name_path, DiagnosticKind::InvalidPrimPath { path: prim_path });
                    continue;
                }
            };

            // Materials never take ports from their definition
            let node_def = match kind {
                PrimKind::Material => None,
                PrimKind::NodeGraph | PrimKind::Shader => self.library.node_def(doc, id),
            };
            if node_def.is_none() && kind == PrimKind::Shader {
                log::debug!("No node definition found for '{}' ({})", name_path, element.category());
            }

            let prim = match self.stage.define(&prim_path, kind) {
                Ok(prim) => prim,
                Err(err) => {
                    log::debug!("Failed to define {}: {err:#}", prim_path);
                    self.diagnostics.push(
                        name_path,
                        DiagnosticKind::InvalidPrimPath {
                            path: prim_path.to_string(),
                        },
                    );
                    continue;
                }
            };
            if kind == PrimKind::Shader {
                prim.shader_id = node_def.map(|nd| nd.name().to_string());
            }

            log::debug!("Defined {} {}", kind.type_name(), prim_path);
            emit_value_elements(
                doc,
                id,
                node_def,
                prim,
                self.options.emit_all_value_elements,
                &mut self.diagnostics,
            );
        }
    }

    /// Prim path for an element: materials live at the root, everything else under the
    /// active material when there is one.
    fn prim_path(&self, name_path: &str, kind: PrimKind) -> String {
        match (&self.material, kind) {
            (Some(material), PrimKind::NodeGraph | PrimKind::Shader) => format!("/{material}/{name_path}"),
            _ => format!("/{name_path}"),
        }
    }
}

/// Author definition ports first, then layer the instance's own inputs and outputs on top.
fn emit_value_elements(
    doc: &Document,
    id: ElementId,
    node_def: Option<NodeDefRef<'_>>,
    prim: &mut Prim,
    emit_all: bool,
    diagnostics: &mut Diagnostics,
) {
    let is_material = doc.element(id).kind() == ElementKind::Material;

    if let Some(node_def) = node_def {
        let defs = node_def.document;
        for def_id in node_def.value_elements() {
            let def = defs.element(def_id);
            let type_name = map_mtlx_to_usd_type(def.element_type());
            match def.kind() {
                ElementKind::Input if emit_all => {
                    let port = prim.create_input(def.name(), type_name);
                    set_port_value(port, def, &defs.name_path(def_id), diagnostics);
                }
                ElementKind::Output => {
                    prim.create_output(def.name(), type_name);
                }
                ElementKind::Input
                | ElementKind::Material
                | ElementKind::Node
                | ElementKind::NodeGraph
                | ElementKind::NodeDef
                | ElementKind::Other => {}
            }
        }
    }

    for value_id in doc.active_value_elements(id) {
        let value_element = doc.element(value_id);
        let type_name = map_mtlx_to_usd_type(value_element.element_type());
        match value_element.kind() {
            ElementKind::Input => {
                let port = if is_material {
                    prim.create_output(&material_output_name(value_element.name()), type_name)
                } else {
                    prim.create_input(value_element.name(), type_name)
                };
                set_port_value(port, value_element, &doc.name_path(value_id), diagnostics);
            }
            ElementKind::Output if !is_material => {
                if prim.output(value_element.name()).is_none() {
                    prim.create_output(value_element.name(), type_name);
                }
            }
            ElementKind::Output
            | ElementKind::Material
            | ElementKind::Node
            | ElementKind::NodeGraph
            | ElementKind::NodeDef
            | ElementKind::Other => {
                log::debug!(
                    "Skip mapping of element: {} ({})",
                    doc.name_path(value_id),
                    value_element.category()
                );
            }
        }
    }
}

/// Set a port's value from an element's value string. Empty strings leave the port alone.
fn set_port_value(port: &mut Port, element: &Element, element_path: &str, diagnostics: &mut Diagnostics) {
    let value = element.value_string();
    if value.is_empty() {
        return;
    }

    match map_mtlx_to_usd_value(element.element_type(), value) {
        Ok(Some(converted)) => port.value = Some(converted),
        Ok(None) => {}
        Err(err) => {
            log::debug!("{err:#}");
            diagnostics.push(
                element_path,
                DiagnosticKind::InvalidValue {
                    value_type: element.element_type().to_string(),
                    value: value.to_string(),
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::mtlx::{parse_mtlx, Library};
    use crate::sdf::{Value, ValueTypeName};
    use crate::shade::PrimKind;
    use crate::translate::{convert_mtlx_to_usd, DiagnosticKind, TranslateOptions};

    fn translate(xml: &str) -> crate::translate::Translation {
        let doc = parse_mtlx(xml).unwrap();
        convert_mtlx_to_usd(&doc, &Library::empty(), TranslateOptions::default())
    }

    #[test]
    fn test_no_material_paths_at_root() {
        let translation = translate(
            r#"<materialx>
  <nodegraph name="NG">
    <constant name="c" type="float"><input name="value" type="float" value="2"/></constant>
  </nodegraph>
</materialx>"#,
        );

        let stage = &translation.stage;
        assert_eq!(stage.prim_at("/NG").unwrap().kind, Some(PrimKind::NodeGraph));
        let constant = stage.prim_at("/NG/c").unwrap();
        assert_eq!(constant.kind, Some(PrimKind::Shader));
        assert_eq!(constant.shader_id, None);
        assert_eq!(constant.input("value").unwrap().value, Some(Value::Float(2.0)));
    }

    #[test]
    fn test_material_prefix() {
        let translation = translate(
            r#"<materialx>
  <nodegraph name="NG"/>
  <surfacematerial name="M" type="material"/>
</materialx>"#,
        );

        let stage = &translation.stage;
        assert!(stage.prim_at("/NG").is_none());
        assert_eq!(stage.prim_at("/M/NG").unwrap().kind, Some(PrimKind::NodeGraph));
        assert_eq!(stage.prim_at("/M").unwrap().kind, Some(PrimKind::Material));
    }

    #[test]
    fn test_value_coercion() {
        let translation = translate(
            r#"<materialx>
  <nodegraph name="NG">
    <add name="a" type="vector3">
      <input name="in1" type="vector3" value="1,2,3"/>
      <input name="in2" type="color4" value="0, 0, 0, 1"/>
      <input name="in3" type="string" value=""/>
      <input name="in4" type="matrix33" value="1,0,0,0,1,0,0,0,1"/>
    </add>
  </nodegraph>
</materialx>"#,
        );

        let shader = translation.stage.prim_at("/NG/a").unwrap();
        let in1 = shader.input("in1").unwrap();
        assert_eq!(in1.type_name, ValueTypeName::Vector3f);
        assert_eq!(in1.value, Some(Value::Vec3f([1.0, 2.0, 3.0])));
        assert_eq!(shader.input("in2").unwrap().value, Some(Value::Vec4f([0.0, 0.0, 0.0, 1.0])));
        assert_eq!(shader.input("in3").unwrap().value, None);
        let in4 = shader.input("in4").unwrap();
        assert_eq!(in4.type_name, ValueTypeName::Token);
        assert_eq!(in4.value, None);
        assert!(translation.diagnostics.is_empty());
    }

    #[test]
    fn test_invalid_value_reported() {
        let translation = translate(
            r#"<materialx>
  <constant name="c" type="float"><input name="value" type="float" value="abc"/></constant>
</materialx>"#,
        );

        let diagnostics: Vec<_> = translation.diagnostics.for_element("c/value").collect();
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(diagnostics[0].kind, DiagnosticKind::InvalidValue { .. }));
        assert!(translation.stage.prim_at("/c").unwrap().input("value").unwrap().value.is_none());
    }

    #[test]
    fn test_material_inputs_become_outputs() {
        let translation = translate(
            r#"<materialx>
  <surfacematerial name="M" type="material">
    <input name="surfaceshader" type="surfaceshader"/>
    <input name="displacementshader" type="displacementshader"/>
    <output name="out" type="material"/>
  </surfacematerial>
</materialx>"#,
        );

        let material = translation.stage.prim_at("/M").unwrap();
        assert!(material.output("mtlx:surface").is_some());
        assert!(material.output("mtlx:displacement").is_some());
        assert!(material.output("out").is_none());
        assert_eq!(material.inputs().count(), 0);
    }

    #[test]
    fn test_invalid_prim_path() {
        let translation = translate(
            r#"<materialx>
  <constant name="bad-name" type="float"/>
</materialx>"#,
        );

        assert!(translation.stage.is_empty());
        assert!(matches!(
            translation.diagnostics.iter().next().unwrap().kind,
            DiagnosticKind::InvalidPrimPath { .. }
        ));
    }
}
