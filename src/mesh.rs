use crate::geometry::{PlaneAttribute, PlaneGeometry};
use crate::gl::{ComponentType, DrawMode, Graphics};
use crate::material::Material;
use crate::uniform::UniformSet;

const WIREFRAME_LINE_WIDTH: f32 = 1.5;

/// A plane geometry drawn with one material.
pub struct Mesh<G: Graphics> {
    pub geometry: PlaneGeometry<G>,
    pub material: Material<G>,
    pub wireframe: bool,
    attribute_locations: Vec<(PlaneAttribute, i32)>,
}

impl<G: Graphics> Mesh<G> {
    /// Resolves attribute locations once against the material's program.
    pub fn new(gl: &G, geometry: PlaneGeometry<G>, material: Material<G>) -> Self {
        let attribute_locations = match material.program() {
            Some(program) => PlaneAttribute::ALL
                .iter()
                .map(|&attr| {
                    let location = geometry.attribute(attr).bind_for_program(gl, attr.name(), program);
                    (attr, location)
                })
                .collect(),
            None => Vec::new(),
        };
        Self {
            geometry,
            material,
            wireframe: false,
            attribute_locations,
        }
    }

    pub fn attribute_locations(&self) -> &[(PlaneAttribute, i32)] {
        &self.attribute_locations
    }

    pub fn draw(&self, gl: &G, common: &UniformSet) {
        let Some(program) = self.material.program() else {
            return;
        };
        gl.use_program(Some(program));
        self.material.push_uniforms(gl, common);
        for (attr, location) in &self.attribute_locations {
            self.geometry.attribute(*attr).use_for_draw(gl, *location);
        }

        let count = self.geometry.attribute(PlaneAttribute::Index).len();
        if count == 0 {
            return;
        }
        let mode = if self.wireframe {
            gl.line_width(WIREFRAME_LINE_WIDTH);
            DrawMode::Lines
        } else {
            DrawMode::Triangles
        };
        gl.draw_elements(mode, count as i32, ComponentType::UnsignedShort, 0);
    }
}
