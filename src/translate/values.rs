//! MaterialX to USD type and value mapping.

use anyhow::{bail, ensure, Context, Result};

use crate::sdf::{Value, ValueTypeName};

/// Namespace prepended to material terminal outputs.
pub const MATERIAL_OUTPUT_NAMESPACE: &str = "mtlx:";

/// Map a MaterialX shader stage name to USD's output notation.
pub fn map_shader_notation(name: &str) -> &str {
    match name {
        "surfaceshader" => "surface",
        "displacementshader" => "displacement",
        "volumeshader" => "volume",
        other => other,
    }
}

/// Name of the Material output a material input maps to, e.g. `mtlx:surface`.
pub fn material_output_name(input_name: &str) -> String {
    format!("{MATERIAL_OUTPUT_NAMESPACE}{}", map_shader_notation(input_name))
}

/// Map a MaterialX type to a USD value type. Unknown types map to `token`.
pub fn map_mtlx_to_usd_type(mtlx_type: &str) -> ValueTypeName {
    match mtlx_type {
        "filename" => ValueTypeName::Asset,
        "string" => ValueTypeName::String,
        "boolean" => ValueTypeName::Bool,
        "integer" => ValueTypeName::Int,
        "float" => ValueTypeName::Float,
        "color3" => ValueTypeName::Color3f,
        "color4" => ValueTypeName::Color4f,
        "vector2" => ValueTypeName::Float2,
        "vector3" => ValueTypeName::Vector3f,
        "vector4" => ValueTypeName::Float4,
        "surfaceshader" => ValueTypeName::Token,
        _ => ValueTypeName::Token,
    }
}

/// Convert a MaterialX value string of a given type to a USD value.
///
/// Returns `Ok(None)` for types that have no value conversion (shader types, matrices, ...).
pub fn map_mtlx_to_usd_value(mtlx_type: &str, value: &str) -> Result<Option<Value>> {
    let converted = match mtlx_type {
        "float" => Value::Float(parse_float(value)?),
        "integer" => Value::Int(
            value
                .trim()
                .parse()
                .with_context(|| format!("Invalid integer '{value}'"))?,
        ),
        "boolean" => match value.trim() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            other => bail!("Invalid boolean '{other}'"),
        },
        "string" => Value::String(value.to_string()),
        "filename" => Value::AssetPath(value.to_string()),
        "vector2" => Value::Vec2f(parse_vector::<2>(value)?),
        "color3" | "vector3" => Value::Vec3f(parse_vector::<3>(value)?),
        "color4" | "vector4" => Value::Vec4f(parse_vector::<4>(value)?),
        _ => return Ok(None),
    };
    Ok(Some(converted))
}

fn parse_float(value: &str) -> Result<f32> {
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid float '{value}'"))
}

/// Parse a comma separated MaterialX vector with exactly `N` components.
fn parse_vector<const N: usize>(value: &str) -> Result<[f32; N]> {
    let parts: Vec<f32> = value.split(',').map(parse_float).collect::<Result<_>>()?;
    ensure!(
        parts.len() == N,
        "Expected {N} components, got {} in '{value}'",
        parts.len()
    );

    let mut out = [0.0; N];
    out.copy_from_slice(&parts);
    Ok(out)
}
