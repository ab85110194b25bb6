//! Morphing wave gradient: a dense plane displaced by simplex noise, colored
//! by stacked noise-driven wave layers.

use glam::{Mat4, Vec3};

use super::{Animator, Effect, FrameClock, FrameRequest, Lifecycle, Scene, Viewport};
use crate::color::{self, Rgba};
use crate::config::{MorphConfig, MAX_WAVE_COLORS};
use crate::context::RenderContext;
use crate::geometry::Orientation;
use crate::gl::{Graphics, ShaderStage};
use crate::uniform::{Uniform, UniformSet};

const NOISE: &str = include_str!("shaders/noise.glsl");
const BLEND: &str = include_str!("shaders/blend.glsl");
const VERTEX: &str = include_str!("shaders/morph.vert");
const FRAGMENT: &str = include_str!("shaders/morph.frag");

/// Initial value of the time accumulator, in milliseconds.
const START_TIME_MS: f64 = 1_253_106.0;
/// Below this width the top shadow uses the softer preset.
const SHADOW_WIDTH_THRESHOLD: f32 = 600.0;
const MIN_ZOOM: f32 = 0.5;

const DEFAULT_BASE: Rgba = [169.0 / 255.0, 96.0 / 255.0, 238.0 / 255.0, 1.0];
const DEFAULT_WAVES: [Rgba; 3] = [
    [1.0, 51.0 / 255.0, 61.0 / 255.0, 1.0],
    [144.0 / 255.0, 224.0 / 255.0, 1.0, 1.0],
    [1.0, 203.0 / 255.0, 87.0 / 255.0, 1.0],
];

pub struct MorphGradient<G: Graphics> {
    config: MorphConfig,
    animator: Animator,
    scene: Option<Scene<G>>,
    active_colors: [f32; 4],
}

impl<G: Graphics> MorphGradient<G> {
    pub fn new(mut config: MorphConfig) -> Self {
        if config.wave_colors.len() > MAX_WAVE_COLORS {
            log::warn!(
                target: "hikari::effect",
                "{} wave colors given, keeping the first {MAX_WAVE_COLORS}",
                config.wave_colors.len()
            );
            config.wave_colors.truncate(MAX_WAVE_COLORS);
        }
        let animator = Animator::new(FrameClock::new(START_TIME_MS, config.max_frame_time_step));
        Self {
            config,
            animator,
            scene: None,
            active_colors: [1.0; 4],
        }
    }

    pub fn config(&self) -> &MorphConfig {
        &self.config
    }

    pub fn context(&self) -> Option<&RenderContext<G>> {
        self.scene.as_ref().map(|s| &s.ctx)
    }

    pub fn uniform(&self, name: &str) -> Option<&Uniform> {
        self.scene.as_ref()?.uniform(name)
    }

    /// Current segment grid of the plane.
    pub fn segments(&self) -> Option<(u32, u32)> {
        Some(self.scene.as_ref()?.mesh()?.geometry.segments())
    }

    pub fn active_colors(&self) -> [f32; 4] {
        self.active_colors
    }

    fn base_color(&self) -> [f32; 3] {
        color::rgb(color::parse_or(&self.config.base_color, DEFAULT_BASE))
    }

    fn wave_color(&self, index: usize) -> Option<[f32; 3]> {
        let value = self.config.wave_colors.get(index)?;
        let default = DEFAULT_WAVES[index % DEFAULT_WAVES.len()];
        Some(color::rgb(color::parse_or(value, default)))
    }

    fn build_uniforms(&self) -> UniformSet {
        let c = &self.config;
        let sections = (c.wave_colors.len() + 1) as f32;
        let layers = (1..=c.wave_colors.len())
            .map(|e| {
                let ef = e as f32;
                let color = self.wave_color(e - 1).unwrap_or([0.0; 3]);
                Uniform::structure([
                    ("color", Uniform::vec3(color)),
                    ("noiseFreq", Uniform::vec2([2.0 + ef / sections, 3.0 + ef / sections])),
                    ("noiseSpeed", Uniform::float(11.0 + 0.3 * ef)),
                    ("noiseFlow", Uniform::float(6.5 + 0.3 * ef)),
                    ("noiseSeed", Uniform::float(c.seed + 10.0 * ef)),
                    ("noiseFloor", Uniform::float(0.1)),
                    ("noiseCeil", Uniform::float(0.63 + 0.07 * ef)),
                ])
            })
            .collect();

        UniformSet::new()
            .with("u_time", Uniform::float(self.animator.clock().elapsed() as f32))
            .with("u_shadow_power", Uniform::float(5.0))
            .with("u_darken_top", Uniform::float(if c.darken_top { 1.0 } else { 0.0 }))
            .with("u_active_colors", Uniform::vec4(self.active_colors))
            .with(
                "u_global",
                Uniform::structure([
                    ("noiseFreq", Uniform::vec2([c.freq_x, c.freq_y])),
                    ("noiseSpeed", Uniform::float(5e-6)),
                ]),
            )
            .with(
                "u_vertDeform",
                Uniform::structure([
                    ("incline", Uniform::float(0.0)),
                    ("offsetTop", Uniform::float(-0.5)),
                    ("offsetBottom", Uniform::float(-0.5)),
                    ("noiseFreq", Uniform::vec2([3.0, 4.0])),
                    ("noiseAmp", Uniform::float(c.amplitude)),
                    ("noiseSpeed", Uniform::float(10.0)),
                    ("noiseFlow", Uniform::float(3.0)),
                    ("noiseSeed", Uniform::float(c.seed)),
                ])
                .excluded_from(ShaderStage::Fragment),
            )
            .with(
                "u_baseColor",
                Uniform::vec3(self.base_color()).excluded_from(ShaderStage::Fragment),
            )
            .with(
                "u_waveLayers",
                Uniform::array(layers).excluded_from(ShaderStage::Fragment),
            )
    }

    fn segment_counts(&self, width: f32, height: f32) -> (u32, u32) {
        let [dx, dy] = self.config.density;
        let count = |len: f32, density: f32| (len * density).ceil().max(1.0) as u32;
        (count(width, dx), count(height, dy))
    }

    fn apply_camera(&mut self) {
        let zoom = self.config.zoom.max(MIN_ZOOM);
        let rotation = self.config.rotation.to_radians();
        let Some(scene) = &mut self.scene else {
            return;
        };
        scene.ctx.set_default_camera();
        if zoom != 1.0 || rotation != 0.0 {
            let projection = scene.ctx.projection_matrix()
                * Mat4::from_scale(Vec3::new(zoom, zoom, 1.0))
                * Mat4::from_rotation_z(rotation);
            scene.ctx.set_projection_matrix(projection);
        }
    }

    /// Regenerates the grid for the current size and density.
    fn rebuild_plane(&mut self) {
        let Some(scene) = &self.scene else {
            return;
        };
        let (width, height) = (scene.ctx.width(), scene.ctx.height());
        let (xs, ys) = self.segment_counts(width, height);
        let wireframe = self.config.wireframe;
        let Some((gl, mesh)) = self.scene.as_mut().and_then(Scene::mesh_mut) else {
            return;
        };
        mesh.geometry.set_topology(gl, xs, ys);
        mesh.geometry.set_size(gl, width, height, Orientation::XZ);
        mesh.wireframe = wireframe;
    }

    fn with_uniform(&mut self, name: &str, f: impl FnOnce(&mut Uniform)) {
        if let Some(uniform) = self.scene.as_mut().and_then(|s| s.uniform_mut(name)) {
            f(uniform);
        }
    }

    fn write_frequency(&mut self) {
        let freq = [self.config.freq_x, self.config.freq_y];
        self.with_uniform("u_global", |u| {
            if let Some(f) = u.field_mut("noiseFreq") {
                f.set(freq);
            }
        });
    }

    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.config.amplitude = amplitude;
        self.with_uniform("u_vertDeform", |u| {
            if let Some(f) = u.field_mut("noiseAmp") {
                f.set(amplitude);
            }
        });
    }

    /// Reseeds the deformation and every wave layer (layer `e` gets
    /// `seed + 10 * e`).
    pub fn set_seed(&mut self, seed: f32) {
        self.config.seed = seed;
        self.with_uniform("u_vertDeform", |u| {
            if let Some(f) = u.field_mut("noiseSeed") {
                f.set(seed);
            }
        });
        let layers = self.config.wave_colors.len();
        self.with_uniform("u_waveLayers", |u| {
            for i in 0..layers {
                if let Some(f) = u.element_mut(i).and_then(|l| l.field_mut("noiseSeed")) {
                    f.set(seed + 10.0 * (i + 1) as f32);
                }
            }
        });
    }

    pub fn set_freq_x(&mut self, freq: f32) {
        self.config.freq_x = freq;
        self.write_frequency();
    }

    pub fn set_freq_y(&mut self, freq: f32) {
        self.config.freq_y = freq;
        self.write_frequency();
    }

    /// Shifts both noise frequencies by `delta`.
    pub fn update_frequency(&mut self, delta: f32) {
        self.config.freq_x += delta;
        self.config.freq_y += delta;
        self.write_frequency();
    }

    /// [`Self::update_frequency`] by the configured `freqDelta`.
    pub fn step_frequency(&mut self) {
        self.update_frequency(self.config.freq_delta);
    }

    /// Flips color `index` (0 = base, 1.. = wave layers) on or off.
    pub fn toggle_color(&mut self, index: usize) {
        let Some(slot) = self.active_colors.get_mut(index) else {
            return;
        };
        *slot = if *slot == 0.0 { 1.0 } else { 0.0 };
        let active = self.active_colors;
        self.with_uniform("u_active_colors", |u| u.set(active));
    }

    pub fn set_base_color(&mut self, value: &str) {
        self.config.base_color = value.to_owned();
        let rgb = self.base_color();
        self.with_uniform("u_baseColor", |u| u.set(rgb));
    }

    /// Recolors an existing wave layer. The layer count is fixed at connect.
    pub fn set_wave_color(&mut self, index: usize, value: &str) {
        let Some(slot) = self.config.wave_colors.get_mut(index) else {
            return;
        };
        *slot = value.to_owned();
        let Some(rgb) = self.wave_color(index) else {
            return;
        };
        self.with_uniform("u_waveLayers", |u| {
            if let Some(f) = u.element_mut(index).and_then(|l| l.field_mut("color")) {
                f.set(rgb);
            }
        });
    }

    pub fn set_darken_top(&mut self, darken: bool) {
        self.config.darken_top = darken;
        self.with_uniform("u_darken_top", |u| u.set(if darken { 1.0_f32 } else { 0.0 }));
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.config.zoom = zoom;
        self.apply_camera();
    }

    /// Degrees.
    pub fn set_rotation(&mut self, rotation: f32) {
        self.config.rotation = rotation;
        self.apply_camera();
    }

    pub fn set_wireframe(&mut self, wireframe: bool) {
        self.config.wireframe = wireframe;
        if let Some((_, mesh)) = self.scene.as_mut().and_then(Scene::mesh_mut) {
            mesh.wireframe = wireframe;
        }
    }

    /// Rebuilds the grid immediately.
    pub fn set_density(&mut self, density: [f32; 2]) {
        self.config.density = density.map(|d| d.max(0.0));
        self.rebuild_plane();
    }

    pub fn set_max_frame_time_step(&mut self, step: f32) {
        self.config.max_frame_time_step = step;
        self.animator.clock_mut().set_max_frame_time_step(step);
    }
}

impl<G: Graphics> Effect<G> for MorphGradient<G> {
    fn connect(&mut self, gl: G, viewport: Viewport) -> FrameRequest {
        if self.scene.is_some() || self.animator.lifecycle() != Lifecycle::Uninitialized {
            return FrameRequest::Idle;
        }
        let mut ctx = RenderContext::new(gl, self.config.debug);
        let vertex = [NOISE, BLEND, VERTEX].join("\n\n");
        let material = ctx.create_material(&vertex, FRAGMENT, self.build_uniforms());
        let geometry = ctx.create_geometry(1.0, 1.0, 1, 1, Orientation::XZ);
        let mesh = ctx.create_mesh(geometry, material);
        self.scene = Some(Scene { ctx, mesh });
        self.resize(viewport);
        self.animator.initialize(self.config.playing)
    }

    fn resize(&mut self, viewport: Viewport) {
        let width = viewport.width;
        let height = self.config.height.unwrap_or(viewport.height);
        let Some(scene) = &mut self.scene else {
            return;
        };
        scene.ctx.set_size(width, height);
        self.apply_camera();
        self.rebuild_plane();
        let shadow = if width < SHADOW_WIDTH_THRESHOLD { 5.0_f32 } else { 6.0 };
        self.with_uniform("u_shadow_power", |u| u.set(shadow));
    }

    fn tick(&mut self, timestamp: Option<f64>, hidden: bool) -> FrameRequest {
        let (render, next) = self.animator.tick(timestamp, hidden);
        if let Some(t) = render {
            self.with_uniform("u_time", |u| u.set(t as f32));
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
}
