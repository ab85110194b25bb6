//! Shader programs with generated uniform declarations.

use crate::gl::{Graphics, ShaderStage};
use crate::uniform::{Uniform, UniformSet, UniformValue};

const PRECISION: &str = "precision highp float;";

const VERTEX_ATTRIBUTES: &str = "attribute vec4 position;\nattribute vec2 uv;\nattribute vec2 uvNorm;";

/// Which uniform set a binding reads from at draw time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformScope {
    /// Shared uniforms owned by the [`RenderContext`](crate::RenderContext).
    Common,
    /// Uniforms owned by the material itself.
    Material,
}

/// A leaf uniform and the location it resolved to.
#[derive(Debug)]
pub struct UniformBinding<L> {
    pub scope: UniformScope,
    /// Fully qualified GLSL name, e.g. `u_waveLayers[0].color`.
    pub name: String,
    /// Index path into the scope's [`UniformSet`].
    pub path: Vec<usize>,
    pub location: L,
}

/// Driver message captured while building a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramDiagnostic {
    Compile { stage: ShaderStage, log: String },
    Link { log: String },
}

/// Compiled and linked shader program plus its flattened uniform bindings.
///
/// Never relinked: uniform values change every frame, the program and its
/// binding table do not.
pub struct Material<G: Graphics> {
    vertex_source: String,
    fragment_source: String,
    program: Option<G::Program>,
    uniforms: UniformSet,
    bindings: Vec<UniformBinding<G::UniformLocation>>,
    diagnostics: Vec<ProgramDiagnostic>,
}

impl<G: Graphics> Material<G> {
    pub fn new(
        gl: &G,
        vertex: &str,
        fragment: &str,
        uniforms: UniformSet,
        common: &UniformSet,
    ) -> Self {
        let vertex_source = format!(
            "{PRECISION}\n{VERTEX_ATTRIBUTES}\n{}\n{}\n{vertex}\n",
            common.declarations(ShaderStage::Vertex),
            uniforms.declarations(ShaderStage::Vertex),
        );
        let fragment_source = format!(
            "{PRECISION}\n{}\n{}\n{fragment}\n",
            common.declarations(ShaderStage::Fragment),
            uniforms.declarations(ShaderStage::Fragment),
        );

        let mut material = Self {
            vertex_source,
            fragment_source,
            program: None,
            uniforms,
            bindings: Vec::new(),
            diagnostics: Vec::new(),
        };
        material.build(gl, common);
        material
    }

    fn build(&mut self, gl: &G, common: &UniformSet) {
        let vertex = self.compile(gl, ShaderStage::Vertex);
        let fragment = self.compile(gl, ShaderStage::Fragment);
        let Some(program) = gl.create_program() else {
            log::warn!(target: "hikari::gl", "createProgram returned null");
            return;
        };
        for shader in vertex.iter().chain(fragment.iter()) {
            gl.attach_shader(&program, shader);
        }
        gl.link_program(&program);
        if !gl.program_linked(&program) {
            let log = gl.program_info_log(&program).unwrap_or_default();
            log::warn!(target: "hikari::gl", "program link failed: {log}");
            self.diagnostics.push(ProgramDiagnostic::Link { log });
        }

        let mut bindings = Vec::new();
        bind_set(gl, &program, UniformScope::Common, common, &mut bindings);
        bind_set(gl, &program, UniformScope::Material, &self.uniforms, &mut bindings);
        self.bindings = bindings;
        self.program = Some(program);
    }

    fn compile(&mut self, gl: &G, stage: ShaderStage) -> Option<G::Shader> {
        let source = match stage {
            ShaderStage::Vertex => &self.vertex_source,
            ShaderStage::Fragment => &self.fragment_source,
        };
        let shader = gl.create_shader(stage)?;
        gl.shader_source(&shader, source);
        gl.compile_shader(&shader);
        if !gl.shader_compiled(&shader) {
            let log = gl.shader_info_log(&shader).unwrap_or_default();
            log::warn!(target: "hikari::gl", "{stage} shader compile failed: {log}");
            self.diagnostics.push(ProgramDiagnostic::Compile { stage, log });
        }
        Some(shader)
    }

    pub fn program(&self) -> Option<&G::Program> {
        self.program.as_ref()
    }

    pub fn vertex_source(&self) -> &str {
        &self.vertex_source
    }

    pub fn fragment_source(&self) -> &str {
        &self.fragment_source
    }

    pub fn uniforms(&self) -> &UniformSet {
        &self.uniforms
    }

    pub fn uniforms_mut(&mut self) -> &mut UniformSet {
        &mut self.uniforms
    }

    pub fn uniform_mut(&mut self, name: &str) -> Option<&mut Uniform> {
        self.uniforms.get_mut(name)
    }

    pub fn bindings(&self) -> &[UniformBinding<G::UniformLocation>] {
        &self.bindings
    }

    /// Compile and link failures, in the order they happened.
    pub fn diagnostics(&self) -> &[ProgramDiagnostic] {
        &self.diagnostics
    }

    /// Pushes every bound uniform, reading common ones from `common`.
    pub fn push_uniforms(&self, gl: &G, common: &UniformSet) {
        for binding in &self.bindings {
            let set = match binding.scope {
                UniformScope::Common => common,
                UniformScope::Material => &self.uniforms,
            };
            if let Some(uniform) = set.at_path(&binding.path) {
                uniform.push(gl, Some(&binding.location));
            }
        }
    }
}

fn bind_set<G: Graphics>(
    gl: &G,
    program: &G::Program,
    scope: UniformScope,
    set: &UniformSet,
    out: &mut Vec<UniformBinding<G::UniformLocation>>,
) {
    for (index, (name, uniform)) in set.iter().enumerate() {
        bind(gl, program, scope, name.to_owned(), vec![index], uniform, out);
    }
}

/// Walks arrays (`name[i]`) and structs (`name.field`) down to leaves and
/// keeps the leaves whose location resolves.
fn bind<G: Graphics>(
    gl: &G,
    program: &G::Program,
    scope: UniformScope,
    name: String,
    path: Vec<usize>,
    uniform: &Uniform,
    out: &mut Vec<UniformBinding<G::UniformLocation>>,
) {
    match &uniform.value {
        UniformValue::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                let mut child = path.clone();
                child.push(i);
                bind(gl, program, scope, format!("{name}[{i}]"), child, item, out);
            }
        }
        UniformValue::Struct(fields) => {
            for (i, (field, item)) in fields.iter().enumerate() {
                let mut child = path.clone();
                child.push(i);
                bind(gl, program, scope, format!("{name}.{field}"), child, item, out);
            }
        }
        _ => {
            if let Some(location) = gl.uniform_location(program, &name) {
                out.push(UniformBinding {
                    scope,
                    name,
                    path,
                    location,
                });
            }
        }
    }
}
