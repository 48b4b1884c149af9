//! `mtlxusd` translates MaterialX shading graphs into USD (UsdShade) stages.
//!
//! # Modules
//!
//! - `mtlx` - MaterialX document model, XML reader and writer, definition libraries
//! - `sdf` - Scene Description Foundations: prim paths and attribute values
//! - `shade` - In-memory stage with Material, NodeGraph and Shader prims
//! - `usda` - Text format (.usda) writer
//! - `translate` - MaterialX to UsdShade graph translation

pub mod mtlx;
pub mod sdf;
pub mod shade;
pub mod translate;
pub mod usda;

pub use translate::{convert_mtlx_str_to_usd, convert_mtlx_to_usd, TranslateOptions, Translation};
