//! In-memory stage holding shading prims.

use anyhow::{bail, ensure, Context, Result};
use std::collections::HashMap;

use crate::sdf::Path as SdfPath;

use super::types::*;

/// A minimal in-memory USD stage for shading networks.
///
/// Prims are keyed by path; the pseudo-root `/` always exists and is typeless.
#[derive(Debug, Clone)]
pub struct Stage {
    prims: HashMap<SdfPath, Prim>,
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage {
    /// Create an empty stage.
    pub fn new() -> Self {
        let root = SdfPath::abs_root();
        let mut prims = HashMap::new();
        prims.insert(root.clone(), Prim::new(root));
        Self { prims }
    }

    /// The pseudo-root prim.
    pub fn pseudo_root(&self) -> &Prim {
        &self.prims[&SdfPath::abs_root()]
    }

    /// True when no prim has been defined.
    pub fn is_empty(&self) -> bool {
        self.pseudo_root().children.is_empty()
    }

    /// Number of prims, excluding the pseudo-root.
    pub fn len(&self) -> usize {
        self.prims.len() - 1
    }

    /// Define a typed prim, creating typeless ancestors as needed.
    ///
    /// Defining an existing prim changes its type and keeps its ports and children.
    pub fn define(&mut self, path: &SdfPath, kind: PrimKind) -> Result<&mut Prim> {
        ensure!(!path.is_abs_root(), "Cannot define the pseudo-root");

        for prefix in path.prefixes() {
            if self.prims.contains_key(&prefix) {
                continue;
            }
            let parent = prefix.parent().context("Prim path has no parent")?;
            self.prims
                .get_mut(&parent)
                .context("Parent prim missing")?
                .children
                .push(prefix.name().to_string());
            self.prims.insert(prefix.clone(), Prim::new(prefix));
        }

        let prim = self.prims.get_mut(path).context("Prim was not created")?;
        prim.kind = Some(kind);
        Ok(prim)
    }

    /// Get a prim by path.
    pub fn prim(&self, path: &SdfPath) -> Option<&Prim> {
        self.prims.get(path)
    }

    /// Get a prim by path string. Invalid paths resolve to nothing.
    pub fn prim_at(&self, path: &str) -> Option<&Prim> {
        let path = SdfPath::new(path).ok()?;
        self.prims.get(&path)
    }

    /// All prims in depth-first authoring order, excluding the pseudo-root.
    pub fn traverse(&self) -> Vec<&Prim> {
        let mut order = Vec::with_capacity(self.len());
        let mut stack = vec![self.pseudo_root()];
        while let Some(prim) = stack.pop() {
            if !prim.path.is_abs_root() {
                order.push(prim);
            }
            for child in prim.children.iter().rev() {
                if let Some(child_prim) = prim.path.append_child(child).ok().and_then(|p| self.prims.get(&p)) {
                    stack.push(child_prim);
                }
            }
        }
        order
    }

    /// Connect a destination port to an existing source port.
    pub fn connect(
        &mut self,
        dest: &SdfPath,
        dest_kind: PortKind,
        dest_name: &str,
        source: ConnectionSource,
    ) -> Result<()> {
        let source_exists = self
            .prim(&source.prim_path)
            .and_then(|prim| prim.port(source.kind, &source.name))
            .is_some();
        if !source_exists {
            bail!("Connection source does not exist: {}", source.target_path());
        }

        let port = self
            .prims
            .get_mut(dest)
            .and_then(|prim| prim.port_mut(dest_kind, dest_name))
            .with_context(|| format!("Destination port not found: {}", dest.property(dest_name)))?;
        port.connection = Some(source);
        Ok(())
    }

    /// Connect a destination port to an output of `source_prim`.
    ///
    /// The source output is created with the destination's type when it does not exist yet.
    pub fn connect_to_output(
        &mut self,
        dest: &SdfPath,
        dest_kind: PortKind,
        dest_name: &str,
        source_prim: &SdfPath,
        source_output: &str,
    ) -> Result<()> {
        let type_name = self
            .prim(dest)
            .and_then(|prim| prim.port(dest_kind, dest_name))
            .map(|port| port.type_name)
            .with_context(|| format!("Destination port not found: {}", dest.property(dest_name)))?;

        let source = self
            .prims
            .get_mut(source_prim)
            .with_context(|| format!("Connection source prim not found: {source_prim}"))?;
        if source.output(source_output).is_none() {
            source.create_output(source_output, type_name);
        }

        self.connect(
            dest,
            dest_kind,
            dest_name,
            ConnectionSource {
                prim_path: source_prim.clone(),
                kind: PortKind::Output,
                name: source_output.to_string(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdf::{self, ValueTypeName};

    #[test]
    fn test_define_creates_typeless_ancestors() {
        let mut stage = Stage::new();
        stage.define(&sdf::path("/M/NG/img").unwrap(), PrimKind::Shader).unwrap();

        assert_eq!(stage.len(), 3);
        assert_eq!(stage.prim_at("/M").unwrap().kind, None);
        assert_eq!(stage.prim_at("/M/NG").unwrap().children, vec!["img"]);
        assert_eq!(stage.prim_at("/M/NG/img").unwrap().kind, Some(PrimKind::Shader));

        // Later definition upgrades the typeless ancestor
        stage.define(&sdf::path("/M").unwrap(), PrimKind::Material).unwrap();
        assert_eq!(stage.prim_at("/M").unwrap().kind, Some(PrimKind::Material));
        assert_eq!(stage.pseudo_root().children, vec!["M"]);
    }

    #[test]
    fn test_define_root_fails() {
        let mut stage = Stage::new();
        assert!(stage.define(&sdf::Path::abs_root(), PrimKind::Material).is_err());
        assert!(stage.is_empty());
    }

    #[test]
    fn test_prim_at_invalid_path() {
        let stage = Stage::new();
        assert!(stage.prim_at("").is_none());
        assert!(stage.prim_at("relative").is_none());
        assert!(stage.prim_at("/").is_some());
    }

    #[test]
    fn test_traverse_order() {
        let mut stage = Stage::new();
        for p in ["/B", "/A/Y", "/A/X", "/C"] {
            stage.define(&sdf::path(p).unwrap(), PrimKind::Shader).unwrap();
        }
        let paths: Vec<&str> = stage.traverse().iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["/B", "/A", "/A/Y", "/A/X", "/C"]);
    }

    #[test]
    fn test_connect_to_output_creates_source() -> Result<()> {
        let mut stage = Stage::new();
        let a = sdf::path("/A")?;
        let b = sdf::path("/B")?;
        stage.define(&a, PrimKind::Shader)?;
        stage.define(&b, PrimKind::Shader)?.create_input("in", ValueTypeName::Color3f);

        stage.connect_to_output(&b, PortKind::Input, "in", &a, "out")?;

        let out = stage.prim(&a).unwrap().output("out").unwrap();
        assert_eq!(out.type_name, ValueTypeName::Color3f);
        let connection = stage.prim(&b).unwrap().input("in").unwrap().connection.clone().unwrap();
        assert_eq!(connection.target_path(), "/A.outputs:out");
        Ok(())
    }

    #[test]
    fn test_connect_missing_ports() -> Result<()> {
        let mut stage = Stage::new();
        let a = sdf::path("/A")?;
        stage.define(&a, PrimKind::NodeGraph)?;

        let missing_source = ConnectionSource {
            prim_path: a.clone(),
            kind: PortKind::Input,
            name: "file".to_string(),
        };
        assert!(stage.connect(&a, PortKind::Output, "out", missing_source).is_err());
        assert!(stage.connect_to_output(&a, PortKind::Input, "in", &a, "out").is_err());
        Ok(())
    }
}
