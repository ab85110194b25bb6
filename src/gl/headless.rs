use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};

use super::{BufferData, BufferTarget, ComponentType, DrawMode, Graphics, ShaderStage};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeadlessShader(u32);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeadlessProgram(u32);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeadlessBuffer(u32);

/// Uniform location: the program it was resolved against and the fully
/// qualified GLSL name (`u_waveLayers[1].color`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeadlessLocation {
    program: u32,
    name: String,
}

impl HeadlessLocation {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Contents last uploaded into a buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum BufferContents {
    F32(Vec<f32>),
    U16(Vec<u16>),
}

/// One `drawElements` call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub mode: DrawMode,
    pub count: i32,
    pub program: Option<u32>,
    pub line_width: f32,
}

#[derive(Debug)]
struct ShaderRecord {
    stage: ShaderStage,
    source: String,
    compiled: bool,
}

#[derive(Debug, Default)]
struct ProgramRecord {
    shaders: Vec<u32>,
    linked: bool,
    attributes: HashMap<String, i32>,
}

#[derive(Debug, Default)]
struct BufferRecord {
    contents: Option<BufferContents>,
    uploads: usize,
}

#[derive(Debug, Default)]
struct State {
    next_handle: u32,
    shaders: HashMap<u32, ShaderRecord>,
    programs: HashMap<u32, ProgramRecord>,
    buffers: HashMap<u32, BufferRecord>,
    bound: HashMap<BufferTarget, u32>,
    current_program: Option<u32>,
    uniforms: HashMap<String, Vec<f32>>,
    uniform_writes: usize,
    enabled_attributes: BTreeSet<u32>,
    attribute_pointers: HashMap<u32, (i32, ComponentType, bool)>,
    drawable_size: (u32, u32),
    viewport: (i32, i32, i32, i32),
    clear_color: [f32; 4],
    clears: usize,
    line_width: f32,
    draws: Vec<DrawCall>,
    inactive_uniforms: HashSet<String>,
    failing_stage: Option<ShaderStage>,
    failing_link: bool,
}

/// In-memory [`Graphics`] backend that records every call.
///
/// Uniform names resolve unless marked inactive with
/// [`HeadlessGl::deactivate_uniform`]; attributes resolve when the vertex
/// source declares them.
#[derive(Debug, Default)]
pub struct HeadlessGl {
    state: RefCell<State>,
}

impl HeadlessGl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `name` behave like a uniform the shader compiler optimized out.
    pub fn deactivate_uniform(&self, name: &str) {
        self.state.borrow_mut().inactive_uniforms.insert(name.to_owned());
    }

    /// Makes every subsequent compile of `stage` fail.
    pub fn fail_compile(&self, stage: ShaderStage) {
        self.state.borrow_mut().failing_stage = Some(stage);
    }

    /// Makes every subsequent link fail.
    pub fn fail_link(&self) {
        self.state.borrow_mut().failing_link = true;
    }

    pub fn draws(&self) -> Vec<DrawCall> {
        self.state.borrow().draws.clone()
    }

    pub fn draw_count(&self) -> usize {
        self.state.borrow().draws.len()
    }

    pub fn clear_count(&self) -> usize {
        self.state.borrow().clears
    }

    /// Last value pushed for the uniform with this qualified name.
    pub fn uniform(&self, name: &str) -> Option<Vec<f32>> {
        self.state.borrow().uniforms.get(name).cloned()
    }

    pub fn uniform_writes(&self) -> usize {
        self.state.borrow().uniform_writes
    }

    pub fn buffer_contents(&self, buffer: &HeadlessBuffer) -> Option<BufferContents> {
        self.state
            .borrow()
            .buffers
            .get(&buffer.0)
            .and_then(|b| b.contents.clone())
    }

    pub fn buffer_uploads(&self, buffer: &HeadlessBuffer) -> usize {
        self.state
            .borrow()
            .buffers
            .get(&buffer.0)
            .map_or(0, |b| b.uploads)
    }

    pub fn buffer_count(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    pub fn shader_sources(&self, program: &HeadlessProgram) -> Vec<(ShaderStage, String)> {
        let state = self.state.borrow();
        let Some(record) = state.programs.get(&program.0) else {
            return Vec::new();
        };
        record
            .shaders
            .iter()
            .filter_map(|id| state.shaders.get(id))
            .map(|s| (s.stage, s.source.clone()))
            .collect()
    }

    pub fn attribute_enabled(&self, location: u32) -> bool {
        self.state.borrow().enabled_attributes.contains(&location)
    }

    pub fn attribute_pointer(&self, location: u32) -> Option<(i32, ComponentType, bool)> {
        self.state.borrow().attribute_pointers.get(&location).copied()
    }

    pub fn drawable_size(&self) -> (u32, u32) {
        self.state.borrow().drawable_size
    }

    pub fn viewport_rect(&self) -> (i32, i32, i32, i32) {
        self.state.borrow().viewport
    }

    fn handle(&self) -> u32 {
        let mut state = self.state.borrow_mut();
        state.next_handle += 1;
        state.next_handle
    }

    fn record_uniform(&self, location: &HeadlessLocation, value: Vec<f32>) {
        let mut state = self.state.borrow_mut();
        state.uniform_writes += 1;
        state.uniforms.insert(location.name.clone(), value);
    }
}

/// Attribute names declared as `attribute <type> <name>;` in `source`.
fn declared_attributes(source: &str) -> Vec<String> {
    source
        .lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix("attribute ")?;
            let name = rest.split_whitespace().nth(1)?;
            Some(name.trim_end_matches(';').to_owned())
        })
        .collect()
}

impl Graphics for HeadlessGl {
    type Shader = HeadlessShader;
    type Program = HeadlessProgram;
    type Buffer = HeadlessBuffer;
    type UniformLocation = HeadlessLocation;

    fn create_shader(&self, stage: ShaderStage) -> Option<HeadlessShader> {
        let id = self.handle();
        self.state.borrow_mut().shaders.insert(
            id,
            ShaderRecord {
                stage,
                source: String::new(),
                compiled: false,
            },
        );
        Some(HeadlessShader(id))
    }

    fn shader_source(&self, shader: &HeadlessShader, source: &str) {
        if let Some(record) = self.state.borrow_mut().shaders.get_mut(&shader.0) {
            record.source = source.to_owned();
        }
    }

    fn compile_shader(&self, shader: &HeadlessShader) {
        let mut state = self.state.borrow_mut();
        let failing = state.failing_stage;
        if let Some(record) = state.shaders.get_mut(&shader.0) {
            record.compiled = failing != Some(record.stage);
        }
    }

    fn shader_compiled(&self, shader: &HeadlessShader) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader.0)
            .is_some_and(|s| s.compiled)
    }

    fn shader_info_log(&self, shader: &HeadlessShader) -> Option<String> {
        let state = self.state.borrow();
        let record = state.shaders.get(&shader.0)?;
        (!record.compiled).then(|| format!("ERROR: 0:1: {} shader rejected", record.stage))
    }

    fn create_program(&self) -> Option<HeadlessProgram> {
        let id = self.handle();
        self.state
            .borrow_mut()
            .programs
            .insert(id, ProgramRecord::default());
        Some(HeadlessProgram(id))
    }

    fn attach_shader(&self, program: &HeadlessProgram, shader: &HeadlessShader) {
        if let Some(record) = self.state.borrow_mut().programs.get_mut(&program.0) {
            record.shaders.push(shader.0);
        }
    }

    fn link_program(&self, program: &HeadlessProgram) {
        let mut state = self.state.borrow_mut();
        let Some(record) = state.programs.get(&program.0) else {
            return;
        };
        let compiled = record
            .shaders
            .iter()
            .all(|id| state.shaders.get(id).is_some_and(|s| s.compiled));
        let attributes: Vec<String> = record
            .shaders
            .iter()
            .filter_map(|id| state.shaders.get(id))
            .filter(|s| s.stage == ShaderStage::Vertex)
            .flat_map(|s| declared_attributes(&s.source))
            .collect();
        let linked = compiled && !state.failing_link;
        if let Some(record) = state.programs.get_mut(&program.0) {
            record.linked = linked;
            record.attributes = attributes
                .into_iter()
                .enumerate()
                .map(|(i, name)| (name, i as i32))
                .collect();
        }
    }

    fn program_linked(&self, program: &HeadlessProgram) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program.0)
            .is_some_and(|p| p.linked)
    }

    fn program_info_log(&self, program: &HeadlessProgram) -> Option<String> {
        let linked = self.program_linked(program);
        (!linked).then(|| "ERROR: program failed to link".to_owned())
    }

    fn use_program(&self, program: Option<&HeadlessProgram>) {
        self.state.borrow_mut().current_program = program.map(|p| p.0);
    }

    fn uniform_location(&self, program: &HeadlessProgram, name: &str) -> Option<HeadlessLocation> {
        let state = self.state.borrow();
        let linked = state.programs.get(&program.0).is_some_and(|p| p.linked);
        if !linked || state.inactive_uniforms.contains(name) {
            return None;
        }
        Some(HeadlessLocation {
            program: program.0,
            name: name.to_owned(),
        })
    }

    fn attrib_location(&self, program: &HeadlessProgram, name: &str) -> i32 {
        self.state
            .borrow()
            .programs
            .get(&program.0)
            .filter(|p| p.linked)
            .and_then(|p| p.attributes.get(name).copied())
            .unwrap_or(-1)
    }

    fn uniform1f(&self, location: &HeadlessLocation, value: f32) {
        self.record_uniform(location, vec![value]);
    }

    fn uniform1i(&self, location: &HeadlessLocation, value: i32) {
        self.record_uniform(location, vec![value as f32]);
    }

    fn uniform2fv(&self, location: &HeadlessLocation, value: &[f32]) {
        self.record_uniform(location, value.to_vec());
    }

    fn uniform3fv(&self, location: &HeadlessLocation, value: &[f32]) {
        self.record_uniform(location, value.to_vec());
    }

    fn uniform4fv(&self, location: &HeadlessLocation, value: &[f32]) {
        self.record_uniform(location, value.to_vec());
    }

    fn uniform_matrix4fv(&self, location: &HeadlessLocation, _transpose: bool, value: &[f32]) {
        self.record_uniform(location, value.to_vec());
    }

    fn create_buffer(&self) -> Option<HeadlessBuffer> {
        let id = self.handle();
        self.state
            .borrow_mut()
            .buffers
            .insert(id, BufferRecord::default());
        Some(HeadlessBuffer(id))
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<&HeadlessBuffer>) {
        let mut state = self.state.borrow_mut();
        match buffer {
            Some(b) => state.bound.insert(target, b.0),
            None => state.bound.remove(&target),
        };
    }

    fn buffer_data(&self, target: BufferTarget, data: BufferData<'_>) {
        let mut state = self.state.borrow_mut();
        let Some(id) = state.bound.get(&target).copied() else {
            return;
        };
        if let Some(record) = state.buffers.get_mut(&id) {
            record.contents = Some(match data {
                BufferData::F32(values) => BufferContents::F32(values.to_vec()),
                BufferData::U16(values) => BufferContents::U16(values.to_vec()),
            });
            record.uploads += 1;
        }
    }

    fn enable_vertex_attrib_array(&self, location: u32) {
        self.state.borrow_mut().enabled_attributes.insert(location);
    }

    fn vertex_attrib_pointer(
        &self,
        location: u32,
        size: i32,
        ty: ComponentType,
        normalized: bool,
        _stride: i32,
        _offset: i32,
    ) {
        self.state
            .borrow_mut()
            .attribute_pointers
            .insert(location, (size, ty, normalized));
    }

    fn set_drawable_size(&self, width: u32, height: u32) {
        self.state.borrow_mut().drawable_size = (width, height);
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.state.borrow_mut().viewport = (x, y, width, height);
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.state.borrow_mut().clear_color = [r, g, b, a];
    }

    fn clear_depth(&self, _depth: f32) {}

    fn clear(&self) {
        self.state.borrow_mut().clears += 1;
    }

    fn line_width(&self, width: f32) {
        self.state.borrow_mut().line_width = width;
    }

    fn draw_elements(&self, mode: DrawMode, count: i32, _ty: ComponentType, _offset: i32) {
        let mut state = self.state.borrow_mut();
        let call = DrawCall {
            mode,
            count,
            program: state.current_program,
            line_width: state.line_width,
        };
        state.draws.push(call);
    }
}
