//! Spinning paint-swirl gradient drawn on a single full-canvas quad.

use super::{Animator, Effect, FrameClock, FrameRequest, Lifecycle, Scene, Viewport};
use crate::color::{self, Rgba};
use crate::config::BalatroConfig;
use crate::context::RenderContext;
use crate::geometry::Orientation;
use crate::gl::Graphics;
use crate::uniform::{Uniform, UniformSet};

const VERTEX: &str = include_str!("shaders/balatro.vert");
const FRAGMENT: &str = include_str!("shaders/balatro.frag");

const DEFAULT_COLOR1: Rgba = [222.0 / 255.0, 68.0 / 255.0, 59.0 / 255.0, 1.0];
const DEFAULT_COLOR2: Rgba = [0.0, 107.0 / 255.0, 180.0 / 255.0, 1.0];
const DEFAULT_COLOR3: Rgba = [22.0 / 255.0, 35.0 / 255.0, 37.0 / 255.0, 1.0];

/// Which of the three palette slots a color setter targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSlot {
    One,
    Two,
    Three,
}

impl ColorSlot {
    fn uniform(self) -> &'static str {
        match self {
            ColorSlot::One => "uColor1",
            ColorSlot::Two => "uColor2",
            ColorSlot::Three => "uColor3",
        }
    }

    fn default_color(self) -> Rgba {
        match self {
            ColorSlot::One => DEFAULT_COLOR1,
            ColorSlot::Two => DEFAULT_COLOR2,
            ColorSlot::Three => DEFAULT_COLOR3,
        }
    }
}

pub struct BalatroGradient<G: Graphics> {
    config: BalatroConfig,
    animator: Animator,
    scene: Option<Scene<G>>,
}

impl<G: Graphics> BalatroGradient<G> {
    pub fn new(config: BalatroConfig) -> Self {
        let animator = Animator::new(FrameClock::new(0.0, config.max_frame_time_step));
        Self {
            config,
            animator,
            scene: None,
        }
    }

    pub fn config(&self) -> &BalatroConfig {
        &self.config
    }

    pub fn context(&self) -> Option<&RenderContext<G>> {
        self.scene.as_ref().map(|s| &s.ctx)
    }

    pub fn uniform(&self, name: &str) -> Option<&Uniform> {
        self.scene.as_ref()?.uniform(name)
    }

    fn color(&self, slot: ColorSlot) -> Rgba {
        let value = match slot {
            ColorSlot::One => &self.config.color1,
            ColorSlot::Two => &self.config.color2,
            ColorSlot::Three => &self.config.color3,
        };
        color::parse_or(value, slot.default_color())
    }

    fn build_uniforms(&self) -> UniformSet {
        let c = &self.config;
        UniformSet::new()
            .with("iTime", Uniform::float(0.0))
            .with("uSpinRotation", Uniform::float(c.spin_rotation))
            .with("uSpinSpeed", Uniform::float(c.spin_speed))
            .with("uOffset", Uniform::vec2(c.offset))
            .with("uColor1", Uniform::vec4(self.color(ColorSlot::One)))
            .with("uColor2", Uniform::vec4(self.color(ColorSlot::Two)))
            .with("uColor3", Uniform::vec4(self.color(ColorSlot::Three)))
            .with("uContrast", Uniform::float(c.contrast))
            .with("uLighting", Uniform::float(c.lighting))
            .with("uSpinAmount", Uniform::float(c.spin_amount))
            .with("uPixelFilter", Uniform::float(c.pixel_filter))
            .with("uSpinEase", Uniform::float(c.spin_ease))
            .with("uIsRotate", Uniform::int(i32::from(c.is_rotate)))
            .with("uMouse", Uniform::vec2([0.5, 0.5]))
    }

    fn with_uniform(&mut self, name: &str, f: impl FnOnce(&mut Uniform)) {
        if let Some(uniform) = self.scene.as_mut().and_then(|s| s.uniform_mut(name)) {
            f(uniform);
        }
    }

    fn set_float(&mut self, name: &str, value: f32) {
        self.with_uniform(name, |u| u.set(value));
    }

    pub fn set_spin_rotation(&mut self, value: f32) {
        self.config.spin_rotation = value;
        self.set_float("uSpinRotation", value);
    }

    pub fn set_spin_speed(&mut self, value: f32) {
        self.config.spin_speed = value;
        self.set_float("uSpinSpeed", value);
    }

    pub fn set_offset(&mut self, offset: [f32; 2]) {
        self.config.offset = offset;
        self.with_uniform("uOffset", |u| u.set(offset));
    }

    pub fn set_color(&mut self, slot: ColorSlot, value: &str) {
        let target = match slot {
            ColorSlot::One => &mut self.config.color1,
            ColorSlot::Two => &mut self.config.color2,
            ColorSlot::Three => &mut self.config.color3,
        };
        *target = value.to_owned();
        let rgba = self.color(slot);
        self.with_uniform(slot.uniform(), |u| u.set(rgba));
    }

    pub fn set_color1(&mut self, value: &str) {
        self.set_color(ColorSlot::One, value);
    }

    pub fn set_color2(&mut self, value: &str) {
        self.set_color(ColorSlot::Two, value);
    }

    pub fn set_color3(&mut self, value: &str) {
        self.set_color(ColorSlot::Three, value);
    }

    pub fn set_contrast(&mut self, value: f32) {
        self.config.contrast = value;
        self.set_float("uContrast", value);
    }

    pub fn set_lighting(&mut self, value: f32) {
        self.config.lighting = value;
        self.set_float("uLighting", value);
    }

    pub fn set_spin_amount(&mut self, value: f32) {
        self.config.spin_amount = value;
        self.set_float("uSpinAmount", value);
    }

    pub fn set_pixel_filter(&mut self, value: f32) {
        self.config.pixel_filter = value;
        self.set_float("uPixelFilter", value);
    }

    pub fn set_spin_ease(&mut self, value: f32) {
        self.config.spin_ease = value;
        self.set_float("uSpinEase", value);
    }

    pub fn set_is_rotate(&mut self, value: bool) {
        self.config.is_rotate = value;
        self.with_uniform("uIsRotate", |u| u.set(i32::from(value)));
    }

    /// Turning interaction off recenters the mouse uniform.
    pub fn set_mouse_interaction(&mut self, enabled: bool) {
        self.config.mouse_interaction = enabled;
        if !enabled {
            self.with_uniform("uMouse", |u| u.set([0.5_f32, 0.5]));
        }
    }

    pub fn set_wireframe(&mut self, wireframe: bool) {
        self.config.wireframe = wireframe;
        if let Some((_, mesh)) = self.scene.as_mut().and_then(Scene::mesh_mut) {
            mesh.wireframe = wireframe;
        }
    }

    pub fn set_max_frame_time_step(&mut self, step: f32) {
        self.config.max_frame_time_step = step;
        self.animator.clock_mut().set_max_frame_time_step(step);
    }
}

impl<G: Graphics> Effect<G> for BalatroGradient<G> {
    fn connect(&mut self, gl: G, viewport: Viewport) -> FrameRequest {
        if self.scene.is_some() || self.animator.lifecycle() != Lifecycle::Uninitialized {
            return FrameRequest::Idle;
        }
        let mut ctx = RenderContext::new(gl, self.config.debug);
        let material = ctx.create_material(VERTEX, FRAGMENT, self.build_uniforms());
        let geometry = ctx.create_geometry(1.0, 1.0, 1, 1, Orientation::XY);
        let mesh = ctx.create_mesh(geometry, material);
        self.scene = Some(Scene { ctx, mesh });
        self.resize(viewport);
        self.animator.initialize(self.config.playing)
    }

    /// Keeps a single quad: only positions follow the canvas size.
    fn resize(&mut self, viewport: Viewport) {
        let wireframe = self.config.wireframe;
        let Some(scene) = &mut self.scene else {
            return;
        };
        scene.ctx.set_size(viewport.width, viewport.height);
        scene.ctx.set_default_camera();
        if let Some((gl, mesh)) = scene.mesh_mut() {
            mesh.geometry.set_topology(gl, 1, 1);
            mesh.geometry
                .set_size(gl, viewport.width, viewport.height, Orientation::XY);
            mesh.wireframe = wireframe;
        }
    }

    fn tick(&mut self, timestamp: Option<f64>, hidden: bool) -> FrameRequest {
        let (render, next) = self.animator.tick(timestamp, hidden);
        if let Some(t) = render {
            let seconds = (t / 1000.0) as f32;
            self.set_float("iTime", seconds);
            if let Some(scene) = &self.scene {
                scene.ctx.render();
            }
        }
        next
    }

    fn animator(&self) -> &Animator {
        &self.animator
    }

    fn animator_mut(&mut self) -> &mut Animator {
        &mut self.animator
    }

    fn resolve_css_vars(&mut self, lookup: &dyn Fn(&str) -> Option<String>) {
        self.config.resolve_css_vars(lookup);
    }

    fn wants_pointer(&self) -> bool {
        self.config.mouse_interaction
    }

    fn pointer_moved(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if !self.config.mouse_interaction || width <= 0.0 || height <= 0.0 {
            return;
        }
        let mouse = [(x / width).clamp(0.0, 1.0), (1.0 - y / height).clamp(0.0, 1.0)];
        self.with_uniform("uMouse", |u| u.set(mouse));
    }
}
