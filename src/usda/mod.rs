//! Text format (.usda) writer.

mod writer;

pub use writer::{format_value, write_stage};
