// src/property.rs
//! Typed shader property values.
//!
//! A property is one of five kinds. Values are a closed enum so every
//! consumer matches exhaustively; adding a kind is a compile-time change.

use std::fmt;

use glam::Vec4;
use serde::{Deserialize, Serialize};

/// The kind of a shader property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PropertyKind {
    /// 32-bit floating point scalar
    Float,
    /// RGBA color
    Color,
    /// 4D vector of floats
    Vector4,
    /// 32-bit signed integer
    Integer,
    /// Texture resource handle
    Texture,
}

impl PropertyKind {
    pub const ALL: [PropertyKind; 5] = [
        PropertyKind::Float,
        PropertyKind::Color,
        PropertyKind::Vector4,
        PropertyKind::Integer,
        PropertyKind::Texture,
    ];

    /// Zero value used when a definition is authored without a value.
    pub fn default_value(self) -> PropertyValue {
        match self {
            PropertyKind::Float => PropertyValue::Float(0.0),
            PropertyKind::Color => PropertyValue::Color(Color::WHITE),
            PropertyKind::Vector4 => PropertyValue::Vector4(Vec4::ZERO),
            PropertyKind::Integer => PropertyValue::Integer(0),
            PropertyKind::Texture => PropertyValue::Texture(TextureHandle::default()),
        }
    }
}

/// Linear RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const RED: Color = Color::rgba(1.0, 0.0, 0.0, 1.0);
    pub const CLEAR: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

impl From<[f32; 4]> for Color {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Color::rgba(r, g, b, a)
    }
}

impl From<Color> for Vec4 {
    fn from(c: Color) -> Self {
        Vec4::new(c.r, c.g, c.b, c.a)
    }
}

/// Represents a texture handle owned by the rendering engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextureHandle(pub u32);

impl TextureHandle {
    pub const NONE: TextureHandle = TextureHandle(0);

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// A single typed property value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum PropertyValue {
    Float(f32),
    Color(Color),
    Vector4(Vec4),
    Integer(i32),
    Texture(TextureHandle),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::Float(_) => PropertyKind::Float,
            PropertyValue::Color(_) => PropertyKind::Color,
            PropertyValue::Vector4(_) => PropertyKind::Vector4,
            PropertyValue::Integer(_) => PropertyKind::Integer,
            PropertyValue::Texture(_) => PropertyKind::Texture,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match *self {
            PropertyValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match *self {
            PropertyValue::Color(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<Vec4> {
        match *self {
            PropertyValue::Vector4(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match *self {
            PropertyValue::Integer(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_texture(&self) -> Option<TextureHandle> {
        match *self {
            PropertyValue::Texture(v) => Some(v),
            _ => None,
        }
    }
}

impl From<f32> for PropertyValue {
    fn from(v: f32) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<Color> for PropertyValue {
    fn from(v: Color) -> Self {
        PropertyValue::Color(v)
    }
}

impl From<Vec4> for PropertyValue {
    fn from(v: Vec4) -> Self {
        PropertyValue::Vector4(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        PropertyValue::Integer(v)
    }
}

impl From<TextureHandle> for PropertyValue {
    fn from(v: TextureHandle) -> Self {
        PropertyValue::Texture(v)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Float(v) => write!(f, "{v}"),
            PropertyValue::Color(c) => write!(f, "rgba({}, {}, {}, {})", c.r, c.g, c.b, c.a),
            PropertyValue::Vector4(v) => write!(f, "({}, {}, {}, {})", v.x, v.y, v.z, v.w),
            PropertyValue::Integer(v) => write!(f, "{v}"),
            PropertyValue::Texture(t) => write!(f, "texture#{}", t.0),
        }
    }
}

/// A value paired with the shader property name it targets.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedProperty {
    pub name: String,
    pub value: PropertyValue,
}

impl NamedProperty {
    pub fn new(name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn kind(&self) -> PropertyKind {
        self.value.kind()
    }
}

/// An authored property a member controls.
///
/// The cached `value` is only an initial value and an inspection mirror;
/// the group's [`PropertyStore`](crate::store::PropertyStore) is the
/// authoritative copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    /// Shader property name
    pub name: String,
    /// Last known value; its variant fixes the definition's kind
    pub value: PropertyValue,
}

impl PropertyDefinition {
    /// Create a definition holding the kind's zero value.
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            value: kind.default_value(),
        }
    }

    /// Set the cached value. Builder style, like the other authored types.
    pub fn with_value(mut self, value: impl Into<PropertyValue>) -> Self {
        self.value = value.into();
        self
    }

    pub fn kind(&self) -> PropertyKind {
        self.value.kind()
    }

    /// True when this definition describes the same (name, kind) pair.
    pub fn matches(&self, name: &str, kind: PropertyKind) -> bool {
        self.name == name && self.kind() == kind
    }
}
