//! Graphics context seam.
//!
//! Everything above this module talks to the GPU through [`Graphics`], a thin
//! mirror of the WebGL calls the renderer actually issues. The browser build
//! implements it on top of `WebGl2RenderingContext`; [`HeadlessGl`] records the
//! same calls in memory so the renderer can be driven on the host.

mod headless;
#[cfg(target_arch = "wasm32")]
mod webgl;

pub use headless::{
    BufferContents, DrawCall, HeadlessBuffer, HeadlessGl, HeadlessLocation, HeadlessProgram,
    HeadlessShader,
};
#[cfg(target_arch = "wasm32")]
pub use webgl::WebGl;

use std::fmt;

/// Shader stage a piece of GLSL belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        })
    }
}

/// Buffer bind point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// `ARRAY_BUFFER`: per-vertex attribute data.
    Array,
    /// `ELEMENT_ARRAY_BUFFER`: triangle or line indices.
    ElementArray,
}

/// Component type of attribute or index data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    Float,
    UnsignedShort,
}

/// Primitive assembly mode for indexed draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    Triangles,
    Lines,
}

/// Borrowed typed array handed to `bufferData`.
#[derive(Debug, Clone, Copy)]
pub enum BufferData<'a> {
    F32(&'a [f32]),
    U16(&'a [u16]),
}

/// The subset of a WebGL context the renderer needs.
///
/// Methods take `&self` like the JS API does; handles are associated types so
/// each backend keeps its own object model.
pub trait Graphics {
    type Shader;
    type Program;
    type Buffer;
    type UniformLocation;

    fn create_shader(&self, stage: ShaderStage) -> Option<Self::Shader>;
    fn shader_source(&self, shader: &Self::Shader, source: &str);
    fn compile_shader(&self, shader: &Self::Shader);
    fn shader_compiled(&self, shader: &Self::Shader) -> bool;
    fn shader_info_log(&self, shader: &Self::Shader) -> Option<String>;

    fn create_program(&self) -> Option<Self::Program>;
    fn attach_shader(&self, program: &Self::Program, shader: &Self::Shader);
    fn link_program(&self, program: &Self::Program);
    fn program_linked(&self, program: &Self::Program) -> bool;
    fn program_info_log(&self, program: &Self::Program) -> Option<String>;
    fn use_program(&self, program: Option<&Self::Program>);

    fn uniform_location(&self, program: &Self::Program, name: &str)
        -> Option<Self::UniformLocation>;
    /// Returns -1 when the attribute is not active, like `getAttribLocation`.
    fn attrib_location(&self, program: &Self::Program, name: &str) -> i32;

    fn uniform1f(&self, location: &Self::UniformLocation, value: f32);
    fn uniform1i(&self, location: &Self::UniformLocation, value: i32);
    fn uniform2fv(&self, location: &Self::UniformLocation, value: &[f32]);
    fn uniform3fv(&self, location: &Self::UniformLocation, value: &[f32]);
    fn uniform4fv(&self, location: &Self::UniformLocation, value: &[f32]);
    fn uniform_matrix4fv(&self, location: &Self::UniformLocation, transpose: bool, value: &[f32]);

    fn create_buffer(&self) -> Option<Self::Buffer>;
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<&Self::Buffer>);
    /// Uploads to the buffer bound at `target` with a `STATIC_DRAW` hint.
    fn buffer_data(&self, target: BufferTarget, data: BufferData<'_>);
    fn enable_vertex_attrib_array(&self, location: u32);
    fn vertex_attrib_pointer(
        &self,
        location: u32,
        size: i32,
        ty: ComponentType,
        normalized: bool,
        stride: i32,
        offset: i32,
    );

    /// Resizes the drawing buffer (canvas `width`/`height` attributes).
    fn set_drawable_size(&self, width: u32, height: u32);
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32);
    fn clear_depth(&self, depth: f32);
    /// Clears the color and depth buffers.
    fn clear(&self);
    fn line_width(&self, width: f32);
    fn draw_elements(&self, mode: DrawMode, count: i32, ty: ComponentType, offset: i32);
}
