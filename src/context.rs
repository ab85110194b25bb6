//! Render context: owns the graphics backend, canvas size, shared uniforms
//! and the meshes drawn each frame.

use glam::Mat4;

use crate::geometry::{Orientation, PlaneGeometry};
use crate::gl::Graphics;
use crate::material::Material;
use crate::mesh::Mesh;
use crate::uniform::{Uniform, UniformSet, UniformValue};

pub const PROJECTION_MATRIX: &str = "projectionMatrix";
pub const MODEL_VIEW_MATRIX: &str = "modelViewMatrix";
pub const RESOLUTION: &str = "resolution";
pub const ASPECT_RATIO: &str = "aspectRatio";

/// Handle to a mesh owned by a [`RenderContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshId(usize);

pub struct RenderContext<G: Graphics> {
    gl: G,
    width: f32,
    height: f32,
    meshes: Vec<Mesh<G>>,
    common: UniformSet,
    debug: bool,
}

impl<G: Graphics> RenderContext<G> {
    pub fn new(gl: G, debug: bool) -> Self {
        let common = UniformSet::new()
            .with(PROJECTION_MATRIX, Uniform::mat4(Mat4::IDENTITY))
            .with(MODEL_VIEW_MATRIX, Uniform::mat4(Mat4::IDENTITY))
            .with(RESOLUTION, Uniform::vec2([1.0, 1.0]))
            .with(ASPECT_RATIO, Uniform::float(1.0));
        Self {
            gl,
            width: 1.0,
            height: 1.0,
            meshes: Vec::new(),
            common,
            debug,
        }
    }

    pub fn gl(&self) -> &G {
        &self.gl
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn common_uniforms(&self) -> &UniformSet {
        &self.common
    }

    fn debug(&self, message: impl FnOnce() -> String) {
        if self.debug {
            log::debug!(target: "hikari::gl", "{}", message());
        }
    }

    /// Resizes the drawing buffer and viewport and refreshes `resolution` and
    /// `aspectRatio`.
    pub fn set_size(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        self.gl.set_drawable_size(width as u32, height as u32);
        self.gl.viewport(0, 0, width as i32, height as i32);
        self.set_common(RESOLUTION, [width, height].into());
        let aspect = if height > 0.0 { width / height } else { 1.0 };
        self.set_common(ASPECT_RATIO, aspect.into());
        self.debug(|| format!("setSize width={width} height={height}"));
    }

    /// Orthographic projection spanning the current size in pixels.
    pub fn set_orthographic_camera(&mut self, x: f32, y: f32, z: f32, near: f32, far: f32) {
        #[rustfmt::skip]
        let projection = Mat4::from_cols_array(&[
            2.0 / self.width, 0.0, 0.0, 0.0,
            0.0, 2.0 / self.height, 0.0, 0.0,
            0.0, 0.0, 2.0 / (near - far), 0.0,
            x, y, z, 1.0,
        ]);
        self.set_projection_matrix(projection);
    }

    /// [`Self::set_orthographic_camera`] centered at the origin with a
    /// -2000..2000 depth range.
    pub fn set_default_camera(&mut self) {
        self.set_orthographic_camera(0.0, 0.0, 0.0, -2000.0, 2000.0);
    }

    pub fn projection_matrix(&self) -> Mat4 {
        match self.common.get(PROJECTION_MATRIX).map(|u| &u.value) {
            Some(UniformValue::Mat4(m)) => *m,
            _ => Mat4::IDENTITY,
        }
    }

    pub fn set_projection_matrix(&mut self, projection: Mat4) {
        self.set_common(PROJECTION_MATRIX, projection.into());
        self.debug(|| format!("setOrthographicCamera {:?}", projection.to_cols_array()));
    }

    pub fn set_model_view_matrix(&mut self, model_view: Mat4) {
        self.set_common(MODEL_VIEW_MATRIX, model_view.into());
    }

    fn set_common(&mut self, name: &str, value: UniformValue) {
        if let Some(uniform) = self.common.get_mut(name) {
            uniform.value = value;
        }
    }

    pub fn create_material(&self, vertex: &str, fragment: &str, uniforms: UniformSet) -> Material<G> {
        Material::new(&self.gl, vertex, fragment, uniforms, &self.common)
    }

    pub fn create_geometry(
        &self,
        width: f32,
        height: f32,
        x_segments: u32,
        y_segments: u32,
        orientation: Orientation,
    ) -> PlaneGeometry<G> {
        PlaneGeometry::new(&self.gl, width, height, x_segments, y_segments, orientation)
    }

    pub fn create_mesh(&mut self, geometry: PlaneGeometry<G>, material: Material<G>) -> MeshId {
        let mesh = Mesh::new(&self.gl, geometry, material);
        self.meshes.push(mesh);
        let id = MeshId(self.meshes.len() - 1);
        self.debug(|| format!("createMesh #{}", id.0));
        id
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh<G>> {
        self.meshes.get(id.0)
    }

    /// Mesh plus the backend, for edits that re-upload buffers.
    pub fn mesh_mut(&mut self, id: MeshId) -> Option<(&G, &mut Mesh<G>)> {
        let mesh = self.meshes.get_mut(id.0)?;
        Some((&self.gl, mesh))
    }

    pub fn meshes(&self) -> &[Mesh<G>] {
        &self.meshes
    }

    /// Clears to transparent and draws every mesh in creation order.
    pub fn render(&self) {
        self.gl.clear_color(0.0, 0.0, 0.0, 0.0);
        self.gl.clear_depth(1.0);
        self.gl.clear();
        for mesh in &self.meshes {
            mesh.draw(&self.gl, &self.common);
        }
    }
}
