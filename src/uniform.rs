//! Typed shader uniforms.
//!
//! A [`Uniform`] knows how to upload itself and how to write its own GLSL
//! declaration, including nested arrays and structs. Leaf values are pushed
//! through a location resolved by the owning [`Material`](crate::Material);
//! arrays and structs are flattened into leaves when the material binds them.

use glam::{Mat4, Vec2, Vec3, Vec4};
use indexmap::IndexMap;

use crate::gl::{Graphics, ShaderStage};

#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
    /// Homogeneous elements; element 0 decides the declared type.
    Array(Vec<Uniform>),
    /// Fields in declaration order.
    Struct(IndexMap<String, Uniform>),
}

impl UniformValue {
    /// GLSL type keyword. `None` for arrays and structs.
    pub fn glsl_type(&self) -> Option<&'static str> {
        Some(match self {
            UniformValue::Float(_) => "float",
            UniformValue::Int(_) => "int",
            UniformValue::Vec2(_) => "vec2",
            UniformValue::Vec3(_) => "vec3",
            UniformValue::Vec4(_) => "vec4",
            UniformValue::Mat4(_) => "mat4",
            UniformValue::Array(_) | UniformValue::Struct(_) => return None,
        })
    }

    pub fn is_leaf(&self) -> bool {
        self.glsl_type().is_some()
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(v: [f32; 2]) -> Self {
        UniformValue::Vec2(Vec2::from_array(v))
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(v: [f32; 3]) -> Self {
        UniformValue::Vec3(Vec3::from_array(v))
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(v: [f32; 4]) -> Self {
        UniformValue::Vec4(Vec4::from_array(v))
    }
}

impl From<Mat4> for UniformValue {
    fn from(v: Mat4) -> Self {
        UniformValue::Mat4(v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Uniform {
    pub value: UniformValue,
    /// Stage in which the uniform is neither declared nor expected.
    pub exclude_from: Option<ShaderStage>,
    /// Only meaningful for `mat4`.
    pub transpose: bool,
}

impl Uniform {
    pub fn new(value: UniformValue) -> Self {
        Self {
            value,
            exclude_from: None,
            transpose: false,
        }
    }

    pub fn float(v: f32) -> Self {
        Self::new(UniformValue::Float(v))
    }

    pub fn int(v: i32) -> Self {
        Self::new(UniformValue::Int(v))
    }

    pub fn vec2(v: [f32; 2]) -> Self {
        Self::new(v.into())
    }

    pub fn vec3(v: [f32; 3]) -> Self {
        Self::new(v.into())
    }

    pub fn vec4(v: [f32; 4]) -> Self {
        Self::new(v.into())
    }

    pub fn mat4(m: Mat4) -> Self {
        Self::new(UniformValue::Mat4(m))
    }

    pub fn array(elements: Vec<Uniform>) -> Self {
        Self::new(UniformValue::Array(elements))
    }

    pub fn structure<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Uniform)>,
        K: Into<String>,
    {
        Self::new(UniformValue::Struct(
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn excluded_from(mut self, stage: ShaderStage) -> Self {
        self.exclude_from = Some(stage);
        self
    }

    pub fn transposed(mut self) -> Self {
        self.transpose = true;
        self
    }

    /// Replaces the value in place.
    pub fn set(&mut self, value: impl Into<UniformValue>) {
        self.value = value.into();
    }

    pub fn as_float(&self) -> Option<f32> {
        match self.value {
            UniformValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Uniform> {
        match &self.value {
            UniformValue::Struct(fields) => fields.get(name),
            _ => None,
        }
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Uniform> {
        match &mut self.value {
            UniformValue::Struct(fields) => fields.get_mut(name),
            _ => None,
        }
    }

    pub fn element(&self, index: usize) -> Option<&Uniform> {
        match &self.value {
            UniformValue::Array(items) => items.get(index),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, index: usize) -> Option<&mut Uniform> {
        match &mut self.value {
            UniformValue::Array(items) => items.get_mut(index),
            _ => None,
        }
    }

    /// Child reached by one path step: array element or struct field index.
    pub(crate) fn child(&self, index: usize) -> Option<&Uniform> {
        match &self.value {
            UniformValue::Array(items) => items.get(index),
            UniformValue::Struct(fields) => fields.get_index(index).map(|(_, u)| u),
            _ => None,
        }
    }

    /// Uploads a leaf value. Missing locations are skipped silently.
    pub fn push<G: Graphics>(&self, gl: &G, location: Option<&G::UniformLocation>) {
        let Some(location) = location else {
            return;
        };
        match &self.value {
            UniformValue::Float(v) => gl.uniform1f(location, *v),
            UniformValue::Int(v) => gl.uniform1i(location, *v),
            UniformValue::Vec2(v) => gl.uniform2fv(location, &v.to_array()),
            UniformValue::Vec3(v) => gl.uniform3fv(location, &v.to_array()),
            UniformValue::Vec4(v) => gl.uniform4fv(location, &v.to_array()),
            UniformValue::Mat4(m) => {
                gl.uniform_matrix4fv(location, self.transpose, &m.to_cols_array())
            }
            // expanded into leaves at bind time
            UniformValue::Array(_) | UniformValue::Struct(_) => {}
        }
    }

    /// GLSL declaration of this uniform for `stage`, or an empty string when
    /// excluded from it. `array_len > 0` declares `name[array_len]`.
    pub fn declare(&self, name: &str, stage: ShaderStage, array_len: usize) -> String {
        if self.exclude_from == Some(stage) {
            return String::new();
        }
        let suffix = if array_len > 0 {
            format!("[{array_len}]")
        } else {
            String::new()
        };
        match &self.value {
            UniformValue::Array(items) => {
                let len = items.len();
                let head = items
                    .first()
                    .map(|first| first.declare(name, stage, len))
                    .unwrap_or_default();
                format!("{head}\nconst int {name}_length = {len};")
            }
            UniformValue::Struct(fields) => {
                let body: Vec<String> = fields
                    .iter()
                    .map(|(field, uniform)| uniform.declare(field, stage, 0))
                    .filter(|decl| !decl.is_empty())
                    .map(|decl| decl.strip_prefix("uniform").unwrap_or(&decl).to_owned())
                    .collect();
                format!(
                    "uniform struct {} \n{{\n{}\n}} {name}{suffix};",
                    struct_type_name(name),
                    body.join("\n")
                )
            }
            leaf => {
                let ty = leaf.glsl_type().unwrap_or("float");
                format!("uniform {ty} {name}{suffix};")
            }
        }
    }
}

/// `u_waveLayers` -> `WaveLayers`.
fn struct_type_name(name: &str) -> String {
    let bare = name.strip_prefix("u_").unwrap_or(name);
    let mut chars = bare.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Named top-level uniforms in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformSet {
    entries: IndexMap<String, Uniform>,
}

impl UniformSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, uniform: Uniform) -> &mut Self {
        self.entries.insert(name.into(), uniform);
        self
    }

    pub fn with(mut self, name: impl Into<String>, uniform: Uniform) -> Self {
        self.insert(name, uniform);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Uniform> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Uniform> {
        self.entries.get_mut(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Uniform)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Follows a binding path: top-level index, then child indices.
    pub fn at_path(&self, path: &[usize]) -> Option<&Uniform> {
        let (first, rest) = path.split_first()?;
        let (_, mut uniform) = self.entries.get_index(*first)?;
        for index in rest {
            uniform = uniform.child(*index)?;
        }
        Some(uniform)
    }

    /// Declarations of every entry for `stage`, one per line.
    pub fn declarations(&self, stage: ShaderStage) -> String {
        self.entries
            .iter()
            .map(|(name, uniform)| uniform.declare(name, stage, 0))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<K: Into<String>> FromIterator<(K, Uniform)> for UniformSet {
    fn from_iter<T: IntoIterator<Item = (K, Uniform)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::{Graphics, HeadlessGl};

    #[test]
    fn leaf_declarations_use_the_value_type() {
        let stage = ShaderStage::Vertex;
        assert_eq!(Uniform::float(1.0).declare("u_time", stage, 0), "uniform float u_time;");
        assert_eq!(Uniform::int(3).declare("u_mode", stage, 0), "uniform int u_mode;");
        assert_eq!(
            Uniform::vec4([0.0, 0.0, 0.0, 0.0]).declare("u_active", stage, 0),
            "uniform vec4 u_active;"
        );
        assert_eq!(
            Uniform::mat4(Mat4::IDENTITY).declare("projectionMatrix", stage, 0),
            "uniform mat4 projectionMatrix;"
        );
    }

    #[test]
    fn float_array_declares_length_constant() {
        let u = Uniform::array(vec![Uniform::float(0.5), Uniform::float(1.5)]);
        let decl = u.declare("u_weights", ShaderStage::Fragment, 0);
        assert!(decl.contains("uniform float u_weights[2];"), "{decl}");
        assert!(decl.contains("const int u_weights_length = 2;"), "{decl}");
    }

    #[test]
    fn struct_exclusion_is_per_stage() {
        let u = Uniform::structure([("noiseAmp", Uniform::float(320.0))])
            .excluded_from(ShaderStage::Fragment);
        let vertex = u.declare("u_vertDeform", ShaderStage::Vertex, 0);
        assert!(vertex.starts_with("uniform struct VertDeform"), "{vertex}");
        assert!(vertex.contains(" float noiseAmp;"));
        assert!(vertex.ends_with("} u_vertDeform;"));
        assert_eq!(u.declare("u_vertDeform", ShaderStage::Fragment, 0), "");
    }

    #[test]
    fn array_of_structs_is_braced_and_sized() {
        let layer = |seed: f32| {
            Uniform::structure([
                ("color", Uniform::vec3([1.0, 0.0, 0.0])),
                ("noiseSeed", Uniform::float(seed)),
            ])
        };
        let u = Uniform::array(vec![layer(1.0), layer(2.0), layer(3.0)]);
        let decl = u.declare("u_waveLayers", ShaderStage::Vertex, 0);
        assert!(decl.contains("uniform struct WaveLayers \n{\n"), "{decl}");
        assert!(decl.contains(" vec3 color;"));
        assert!(decl.contains(" float noiseSeed;"));
        assert!(decl.contains("} u_waveLayers[3];"));
        assert!(decl.contains("const int u_waveLayers_length = 3;"));
        assert!(!decl.contains("uniform vec3"), "struct fields keep no `uniform` keyword");
    }

    #[test]
    fn push_without_location_is_a_no_op() {
        let gl = HeadlessGl::new();
        Uniform::float(2.0).push::<HeadlessGl>(&gl, None);
        assert_eq!(gl.uniform_writes(), 0);
    }

    #[test]
    fn push_dispatches_by_type() {
        let gl = HeadlessGl::new();
        let program = gl.create_program().unwrap();
        gl.link_program(&program);
        let location = gl.uniform_location(&program, "u_offset");
        Uniform::vec2([0.25, -0.5]).push(&gl, location.as_ref());
        assert_eq!(gl.uniform("u_offset"), Some(vec![0.25, -0.5]));
    }

    #[test]
    fn path_lookup_descends_arrays_and_structs() {
        let set = UniformSet::new()
            .with("u_time", Uniform::float(0.0))
            .with(
                "u_layers",
                Uniform::array(vec![Uniform::structure([
                    ("color", Uniform::vec3([0.1, 0.2, 0.3])),
                    ("seed", Uniform::float(7.0)),
                ])]),
            );
        assert_eq!(set.at_path(&[1, 0, 1]).and_then(Uniform::as_float), Some(7.0));
        assert!(set.at_path(&[1, 3]).is_none());
        assert!(set.at_path(&[]).is_none());
    }
}
