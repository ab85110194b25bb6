use hikari_wasm::geometry::{PlaneAttribute, MAX_VERTICES};
use hikari_wasm::gl::{BufferContents, DrawMode, HeadlessGl};
use hikari_wasm::{Orientation, PlaneGeometry, RenderContext, Uniform, UniformSet};

fn floats(gl: &HeadlessGl, geometry: &PlaneGeometry<HeadlessGl>, which: PlaneAttribute) -> Vec<f32> {
    let buffer = geometry.attribute(which).buffer().expect("buffer");
    match gl.buffer_contents(buffer) {
        Some(BufferContents::F32(values)) => values,
        other => panic!("expected f32 data, got {other:?}"),
    }
}

fn indices(gl: &HeadlessGl, geometry: &PlaneGeometry<HeadlessGl>) -> Vec<u16> {
    let buffer = geometry.attribute(PlaneAttribute::Index).buffer().expect("buffer");
    match gl.buffer_contents(buffer) {
        Some(BufferContents::U16(values)) => values,
        other => panic!("expected u16 data, got {other:?}"),
    }
}

fn approx_eq(a: &[f32], b: &[f32]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-5)
}

#[test]
fn counts_follow_segments() {
    let gl = HeadlessGl::new();
    for (xs, ys) in [(1, 1), (3, 2), (8, 6)] {
        let plane = PlaneGeometry::new(&gl, 10.0, 10.0, xs, ys, Orientation::XZ);
        let vertices = (xs as usize + 1) * (ys as usize + 1);
        assert_eq!(plane.vertex_count(), vertices);
        assert_eq!(plane.triangle_count(), 2 * xs as usize * ys as usize);
        assert_eq!(plane.attribute(PlaneAttribute::Position).len(), 3 * vertices);
        assert_eq!(plane.attribute(PlaneAttribute::Uv).len(), 2 * vertices);
        assert_eq!(plane.attribute(PlaneAttribute::UvNorm).len(), 2 * vertices);
        assert_eq!(plane.attribute(PlaneAttribute::Index).len(), 6 * xs as usize * ys as usize);
    }
}

#[test]
fn single_quad_layout() {
    let gl = HeadlessGl::new();
    let plane = PlaneGeometry::new(&gl, 1.0, 1.0, 1, 1, Orientation::XZ);
    assert!(approx_eq(
        &floats(&gl, &plane, PlaneAttribute::Uv),
        &[0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0]
    ));
    assert!(approx_eq(
        &floats(&gl, &plane, PlaneAttribute::UvNorm),
        &[-1.0, 1.0, 1.0, 1.0, -1.0, -1.0, 1.0, -1.0]
    ));
    assert_eq!(indices(&gl, &plane), [0, 2, 1, 1, 2, 3]);
}

#[test]
fn xz_plane_is_centered_and_flipped() {
    let gl = HeadlessGl::new();
    let plane = PlaneGeometry::new(&gl, 10.0, 10.0, 1, 1, Orientation::XZ);
    let positions = floats(&gl, &plane, PlaneAttribute::Position);
    assert!(approx_eq(&positions[0..3], &[-5.0, 0.0, 5.0]));
    assert!(approx_eq(&positions[9..12], &[5.0, 0.0, -5.0]));
}

#[test]
fn resize_keeps_the_unused_axis() {
    let gl = HeadlessGl::new();
    let mut plane = PlaneGeometry::new(&gl, 10.0, 10.0, 1, 1, Orientation::XY);
    plane.set_size(&gl, 4.0, 2.0, Orientation::XZ);
    let positions = floats(&gl, &plane, PlaneAttribute::Position);
    // y still holds the previous xy layout
    assert!(approx_eq(&positions[0..3], &[-2.0, 5.0, 1.0]));
}

#[test]
fn resize_uploads_positions_only() {
    let gl = HeadlessGl::new();
    let mut plane = PlaneGeometry::new(&gl, 10.0, 10.0, 2, 2, Orientation::XZ);
    let buffer = |which| plane.attribute(which).buffer().cloned().expect("buffer");
    let (position, uv, index) = (
        buffer(PlaneAttribute::Position),
        buffer(PlaneAttribute::Uv),
        buffer(PlaneAttribute::Index),
    );
    plane.set_size(&gl, 20.0, 5.0, Orientation::XZ);
    assert_eq!(gl.buffer_uploads(&position), 2);
    assert_eq!(gl.buffer_uploads(&uv), 1);
    assert_eq!(gl.buffer_uploads(&index), 1);
    assert_eq!((plane.width(), plane.height()), (20.0, 5.0));
}

#[test]
fn set_topology_leaves_positions_alone() {
    let gl = HeadlessGl::new();
    let mut plane = PlaneGeometry::new(&gl, 10.0, 10.0, 2, 2, Orientation::XZ);
    let position = plane.attribute(PlaneAttribute::Position).buffer().cloned().expect("buffer");
    let before = floats(&gl, &plane, PlaneAttribute::Position);
    plane.set_topology(&gl, 4, 4);
    assert_eq!(floats(&gl, &plane, PlaneAttribute::Position), before);
    assert_eq!(gl.buffer_uploads(&position), 1);
}

#[test]
fn positions_are_reused_only_for_the_same_vertex_count() {
    let gl = HeadlessGl::new();
    let mut plane = PlaneGeometry::new(&gl, 10.0, 10.0, 3, 2, Orientation::XY);
    // 3x2 and 2x3 both have 12 vertices
    plane.set_topology(&gl, 2, 3);
    plane.set_size(&gl, 4.0, 2.0, Orientation::XZ);
    let positions = floats(&gl, &plane, PlaneAttribute::Position);
    assert!(approx_eq(&positions[0..3], &[-2.0, 5.0, 1.0]));

    plane.set_topology(&gl, 4, 4);
    plane.set_size(&gl, 4.0, 2.0, Orientation::XZ);
    let positions = floats(&gl, &plane, PlaneAttribute::Position);
    assert_eq!(positions.len(), 3 * 25);
    assert!(approx_eq(&positions[0..3], &[-2.0, 0.0, 1.0]));
}

#[test]
fn indices_stay_below_vertex_count() {
    let gl = HeadlessGl::new();
    let mut plane = PlaneGeometry::new(&gl, 1.0, 1.0, 1, 1, Orientation::XZ);
    for xs in 1..=6 {
        for ys in 1..=6 {
            plane.set_topology(&gl, xs, ys);
            let indices = indices(&gl, &plane);
            assert_eq!(indices.len(), 6 * xs as usize * ys as usize);
            assert!(
                indices.iter().all(|&i| (i as usize) < plane.vertex_count()),
                "{xs}x{ys}"
            );
        }
    }
}

#[test]
fn zero_segments_become_one() {
    let gl = HeadlessGl::new();
    let plane = PlaneGeometry::new(&gl, 1.0, 1.0, 0, 0, Orientation::XZ);
    assert_eq!(plane.segments(), (1, 1));
}

#[test]
fn huge_grids_fit_sixteen_bit_indices() {
    let gl = HeadlessGl::new();
    let plane = PlaneGeometry::new(&gl, 1.0, 1.0, 400, 300, Orientation::XZ);
    assert!(plane.vertex_count() <= MAX_VERTICES);
    let (xs, ys) = plane.segments();
    assert!(xs > ys && ys > 1);
    let max = indices(&gl, &plane).into_iter().max().expect("indices");
    assert!((max as usize) < plane.vertex_count());
}

fn scene(wireframe: bool) -> RenderContext<HeadlessGl> {
    let mut ctx = RenderContext::new(HeadlessGl::new(), false);
    ctx.set_size(200.0, 100.0);
    ctx.set_default_camera();
    let uniforms = UniformSet::new().with("u_time", Uniform::float(1.5));
    let material = ctx.create_material("void main() {}", "void main() {}", uniforms);
    let geometry = ctx.create_geometry(200.0, 100.0, 4, 2, Orientation::XZ);
    let id = ctx.create_mesh(geometry, material);
    if let Some((_, mesh)) = ctx.mesh_mut(id) {
        mesh.wireframe = wireframe;
    }
    ctx
}

#[test]
fn render_clears_then_draws_triangles() {
    let ctx = scene(false);
    ctx.render();
    let gl = ctx.gl();
    assert_eq!(gl.clear_count(), 1);
    let draws = gl.draws();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].mode, DrawMode::Triangles);
    assert_eq!(draws[0].count, 48);
    assert_eq!(gl.uniform("u_time"), Some(vec![1.5]));
    assert_eq!(gl.uniform("resolution"), Some(vec![200.0, 100.0]));
    assert_eq!(gl.uniform("aspectRatio"), Some(vec![2.0]));
}

#[test]
fn wireframe_draws_lines() {
    let ctx = scene(true);
    ctx.render();
    let draws = ctx.gl().draws();
    assert_eq!(draws[0].mode, DrawMode::Lines);
    assert_eq!(draws[0].line_width, 1.5);
}

#[test]
fn vertex_attributes_are_enabled_index_is_not() {
    let ctx = scene(false);
    ctx.render();
    let gl = ctx.gl();
    let mesh = &ctx.meshes()[0];
    for (attr, location) in mesh.attribute_locations() {
        match attr {
            PlaneAttribute::Index => assert_eq!(*location, -1),
            _ => {
                let location = u32::try_from(*location).expect("resolved");
                assert!(gl.attribute_enabled(location), "{} enabled", attr.name());
            }
        }
    }
    let position = mesh
        .attribute_locations()
        .iter()
        .find(|(attr, _)| *attr == PlaneAttribute::Position)
        .map(|(_, l)| *l as u32)
        .expect("position");
    assert_eq!(gl.attribute_pointer(position).map(|p| p.0), Some(3));
}

#[test]
fn broken_shaders_still_render_without_uniforms() {
    let gl = HeadlessGl::new();
    gl.fail_compile(hikari_wasm::gl::ShaderStage::Vertex);
    let mut ctx = RenderContext::new(gl, false);
    ctx.set_size(10.0, 10.0);
    let uniforms = UniformSet::new().with("u_time", Uniform::float(1.0));
    let material = ctx.create_material("oops", "void main() {}", uniforms);
    assert_eq!(material.diagnostics().len(), 2);
    let geometry = ctx.create_geometry(10.0, 10.0, 1, 1, Orientation::XZ);
    ctx.create_mesh(geometry, material);
    ctx.render();
    assert_eq!(ctx.gl().draw_count(), 1);
    assert_eq!(ctx.gl().uniform_writes(), 0);
}
