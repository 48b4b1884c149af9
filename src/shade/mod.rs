//! UsdShade module: an in-memory stage of shading prims.
//!
//! This module provides structured types for USD's shading concepts:
//! - `Material` - exposes terminal outputs (`outputs:mtlx:surface`)
//! - `NodeGraph` - groups nodes behind interface inputs and outputs
//! - `Shader` - a shading node identified by `info:id`
//!
//! # Example
//!
//! ```ignore
//! use mtlxusd::sdf;
//! use mtlxusd::shade::{PrimKind, Stage};
//!
//! let mut stage = Stage::new();
//! stage.define(&sdf::path("/Mat")?, PrimKind::Material)?;
//!
//! for prim in stage.traverse() {
//!     println!("{}: {:?}", prim.path, prim.kind);
//! }
//! ```

mod stage;
mod types;

pub use stage::Stage;
pub use types::*;
