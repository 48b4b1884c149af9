/// Attribute value types used by shading ports.
///
/// See <https://openusd.org/dev/api/_usd__page__datatypes.html>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueTypeName {
    Asset,
    String,
    Bool,
    Int,
    Float,
    Color3f,
    Color4f,
    Float2,
    Vector3f,
    Float4,
    Token,
}

impl ValueTypeName {
    /// The USDA spelling of the type.
    pub fn as_str(self) -> &'static str {
        match self {
            ValueTypeName::Asset => "asset",
            ValueTypeName::String => "string",
            ValueTypeName::Bool => "bool",
            ValueTypeName::Int => "int",
            ValueTypeName::Float => "float",
            ValueTypeName::Color3f => "color3f",
            ValueTypeName::Color4f => "color4f",
            ValueTypeName::Float2 => "float2",
            ValueTypeName::Vector3f => "vector3f",
            ValueTypeName::Float4 => "float4",
            ValueTypeName::Token => "token",
        }
    }
}

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Float(f32),
    String(String),
    AssetPath(String),
    Vec2f([f32; 2]),
    Vec3f([f32; 3]),
    Vec4f([f32; 4]),
}
