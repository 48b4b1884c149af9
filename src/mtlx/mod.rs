//! MaterialX (.mtlx) document module.
//!
//! MaterialX is an open standard for representing materials and looks in computer graphics.
//! This module reads MaterialX XML into a generic element tree, writes it back, and
//! resolves node definitions against a [`Library`].
//!
//! # Element kinds
//!
//! - `nodegraph` - Node graphs containing texture and operation nodes
//! - nodes, e.g. `image` or `standard_surface` - shader and pattern node instances
//! - nodes of type `material`, e.g. `surfacematerial` - material definitions
//! - `input` / `output` - value elements, optionally connected upstream
//! - `nodedef` - node definitions
//!
//! # Example
//!
//! ```ignore
//! use mtlxusd::mtlx::{parse_mtlx_file, ElementKind};
//! use std::path::Path;
//!
//! let doc = parse_mtlx_file(Path::new("material.mtlx"))?;
//!
//! for id in doc.traverse() {
//!     if doc.element(id).kind() == ElementKind::Material {
//!         println!("Material: {}", doc.name_path(id));
//!     }
//! }
//! ```

mod error;
pub mod library;
mod parser;
mod types;
mod writer;

pub use error::ErrorHighlight;
pub use library::{Library, NodeDefRef};
pub use parser::{parse_mtlx, parse_mtlx_file};
pub use types::*;
pub use writer::write_mtlx;
