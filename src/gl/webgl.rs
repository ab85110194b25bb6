use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    HtmlCanvasElement, WebGl2RenderingContext as GL, WebGlBuffer, WebGlProgram, WebGlShader,
    WebGlUniformLocation,
};

use super::{BufferData, BufferTarget, ComponentType, DrawMode, Graphics, ShaderStage};
use crate::error::HikariError;

/// WebGL2 context bound to the canvas it draws into.
pub struct WebGl {
    gl: GL,
    canvas: HtmlCanvasElement,
}

impl WebGl {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, HikariError> {
        let gl: GL = canvas
            .get_context("webgl2")
            .map_err(HikariError::from)?
            .ok_or_else(|| HikariError::Context("WebGL2 not supported".into()))?
            .dyn_into()
            .map_err(|_: JsValue| HikariError::Context("context is not WebGL2".into()))?;
        Ok(Self { gl, canvas })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

fn target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Array => GL::ARRAY_BUFFER,
        BufferTarget::ElementArray => GL::ELEMENT_ARRAY_BUFFER,
    }
}

fn component(ty: ComponentType) -> u32 {
    match ty {
        ComponentType::Float => GL::FLOAT,
        ComponentType::UnsignedShort => GL::UNSIGNED_SHORT,
    }
}

impl Graphics for WebGl {
    type Shader = WebGlShader;
    type Program = WebGlProgram;
    type Buffer = WebGlBuffer;
    type UniformLocation = WebGlUniformLocation;

    fn create_shader(&self, stage: ShaderStage) -> Option<WebGlShader> {
        self.gl.create_shader(match stage {
            ShaderStage::Vertex => GL::VERTEX_SHADER,
            ShaderStage::Fragment => GL::FRAGMENT_SHADER,
        })
    }

    fn shader_source(&self, shader: &WebGlShader, source: &str) {
        self.gl.shader_source(shader, source);
    }

    fn compile_shader(&self, shader: &WebGlShader) {
        self.gl.compile_shader(shader);
    }

    fn shader_compiled(&self, shader: &WebGlShader) -> bool {
        self.gl
            .get_shader_parameter(shader, GL::COMPILE_STATUS)
            .as_bool()
            .unwrap_or(false)
    }

    fn shader_info_log(&self, shader: &WebGlShader) -> Option<String> {
        self.gl.get_shader_info_log(shader)
    }

    fn create_program(&self) -> Option<WebGlProgram> {
        self.gl.create_program()
    }

    fn attach_shader(&self, program: &WebGlProgram, shader: &WebGlShader) {
        self.gl.attach_shader(program, shader);
    }

    fn link_program(&self, program: &WebGlProgram) {
        self.gl.link_program(program);
    }

    fn program_linked(&self, program: &WebGlProgram) -> bool {
        self.gl
            .get_program_parameter(program, GL::LINK_STATUS)
            .as_bool()
            .unwrap_or(false)
    }

    fn program_info_log(&self, program: &WebGlProgram) -> Option<String> {
        self.gl.get_program_info_log(program)
    }

    fn use_program(&self, program: Option<&WebGlProgram>) {
        self.gl.use_program(program);
    }

    fn uniform_location(&self, program: &WebGlProgram, name: &str) -> Option<WebGlUniformLocation> {
        self.gl.get_uniform_location(program, name)
    }

    fn attrib_location(&self, program: &WebGlProgram, name: &str) -> i32 {
        self.gl.get_attrib_location(program, name)
    }

    fn uniform1f(&self, location: &WebGlUniformLocation, value: f32) {
        self.gl.uniform1f(Some(location), value);
    }

    fn uniform1i(&self, location: &WebGlUniformLocation, value: i32) {
        self.gl.uniform1i(Some(location), value);
    }

    fn uniform2fv(&self, location: &WebGlUniformLocation, value: &[f32]) {
        self.gl.uniform2fv_with_f32_array(Some(location), value);
    }

    fn uniform3fv(&self, location: &WebGlUniformLocation, value: &[f32]) {
        self.gl.uniform3fv_with_f32_array(Some(location), value);
    }

    fn uniform4fv(&self, location: &WebGlUniformLocation, value: &[f32]) {
        self.gl.uniform4fv_with_f32_array(Some(location), value);
    }

    fn uniform_matrix4fv(&self, location: &WebGlUniformLocation, transpose: bool, value: &[f32]) {
        self.gl
            .uniform_matrix4fv_with_f32_array(Some(location), transpose, value);
    }

    fn create_buffer(&self) -> Option<WebGlBuffer> {
        self.gl.create_buffer()
    }

    fn bind_buffer(&self, bind: BufferTarget, buffer: Option<&WebGlBuffer>) {
        self.gl.bind_buffer(target(bind), buffer);
    }

    fn buffer_data(&self, bind: BufferTarget, data: BufferData<'_>) {
        // Copies into a fresh JS typed array so no view into wasm memory escapes.
        match data {
            BufferData::F32(values) => {
                let array = js_sys::Float32Array::from(values);
                self.gl
                    .buffer_data_with_array_buffer_view(target(bind), &array, GL::STATIC_DRAW);
            }
            BufferData::U16(values) => {
                let array = js_sys::Uint16Array::from(values);
                self.gl
                    .buffer_data_with_array_buffer_view(target(bind), &array, GL::STATIC_DRAW);
            }
        }
    }

    fn enable_vertex_attrib_array(&self, location: u32) {
        self.gl.enable_vertex_attrib_array(location);
    }

    fn vertex_attrib_pointer(
        &self,
        location: u32,
        size: i32,
        ty: ComponentType,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        self.gl
            .vertex_attrib_pointer_with_i32(location, size, component(ty), normalized, stride, offset);
    }

    fn set_drawable_size(&self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.gl.viewport(x, y, width, height);
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.gl.clear_color(r, g, b, a);
    }

    fn clear_depth(&self, depth: f32) {
        self.gl.clear_depth(depth);
    }

    fn clear(&self) {
        self.gl.clear(GL::COLOR_BUFFER_BIT | GL::DEPTH_BUFFER_BIT);
    }

    fn line_width(&self, width: f32) {
        self.gl.line_width(width);
    }

    fn draw_elements(&self, mode: DrawMode, count: i32, ty: ComponentType, offset: i32) {
        let mode = match mode {
            DrawMode::Triangles => GL::TRIANGLES,
            DrawMode::Lines => GL::LINES,
        };
        self.gl
            .draw_elements_with_i32(mode, count, component(ty), offset);
    }
}
