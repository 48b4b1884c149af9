use std::fmt::Write;

use crate::sdf::{Path as SdfPath, Value};
use crate::shade::{Port, Prim, Stage};

const INDENT: &str = "    ";

/// Serialize a stage to USDA text.
pub fn write_stage(stage: &Stage) -> String {
    let mut out = String::from("#usda 1.0\n");

    for child in &stage.pseudo_root().children {
        if let Some(prim) = child_prim(stage, &SdfPath::abs_root(), child) {
            out.push('\n');
            write_prim(stage, prim, 0, &mut out);
        }
    }

    out
}

fn child_prim<'s>(stage: &'s Stage, parent: &SdfPath, name: &str) -> Option<&'s Prim> {
    parent.append_child(name).ok().and_then(|path| stage.prim(&path))
}

fn write_prim(stage: &Stage, prim: &Prim, depth: usize, out: &mut String) {
    let indent = INDENT.repeat(depth);
    let inner = INDENT.repeat(depth + 1);

    match prim.kind {
        Some(kind) => {
            let _ = writeln!(out, "{indent}def {} \"{}\"", kind.type_name(), prim.path.name());
        }
        None => {
            let _ = writeln!(out, "{indent}def \"{}\"", prim.path.name());
        }
    }
    let _ = writeln!(out, "{indent}{{");

    if let Some(shader_id) = &prim.shader_id {
        let _ = writeln!(out, "{inner}uniform token info:id = {}", quote(shader_id));
    }
    for port in &prim.ports {
        write_port(port, &inner, out);
    }

    let mut first = prim.shader_id.is_none() && prim.ports.is_empty();
    for child in &prim.children {
        if let Some(child) = child_prim(stage, &prim.path, child) {
            if !first {
                out.push('\n');
            }
            first = false;
            write_prim(stage, child, depth + 1, out);
        }
    }

    let _ = writeln!(out, "{indent}}}");
}

fn write_port(port: &Port, indent: &str, out: &mut String) {
    let type_name = port.type_name.as_str();
    let name = port.full_name();

    if let Some(value) = &port.value {
        let _ = writeln!(out, "{indent}{type_name} {name} = {}", format_value(value));
    }
    if let Some(connection) = &port.connection {
        let _ = writeln!(out, "{indent}{type_name} {name}.connect = <{}>", connection.target_path());
    }
    if port.value.is_none() && port.connection.is_none() {
        let _ = writeln!(out, "{indent}{type_name} {name}");
    }
}

/// Format a value the way USDA spells it.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Bool(b) => u8::from(*b).to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => format_float(*f),
        Value::String(s) => quote(s),
        Value::AssetPath(s) => format!("@{s}@"),
        Value::Vec2f(v) => format_tuple(v),
        Value::Vec3f(v) => format_tuple(v),
        Value::Vec4f(v) => format_tuple(v),
    }
}

fn format_float(f: f32) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else {
        f.to_string()
    }
}

fn format_tuple(values: &[f32]) -> String {
    let parts: Vec<String> = values.iter().copied().map(format_float).collect();
    format!("({})", parts.join(", "))
}

fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for ch in s.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            _ => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}
