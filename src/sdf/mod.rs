//! Scene description foundations: prim paths and typed attribute values.

mod path;
mod value;

pub use path::{is_valid_identifier, path, Path};
pub use value::{Value, ValueTypeName};
