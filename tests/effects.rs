use hikari_wasm::effect::{Effect, FrameRequest, Lifecycle, Viewport};
use hikari_wasm::gl::HeadlessGl;
use hikari_wasm::{BalatroConfig, BalatroGradient, MorphConfig, MorphGradient, UniformValue};

/// Stands in for `requestAnimationFrame`: at most one frame is queued and a
/// second request while one is pending is a bug.
struct Frames {
    scheduled: bool,
    now: f64,
}

impl Frames {
    fn new(first: FrameRequest) -> Self {
        let mut frames = Frames {
            scheduled: false,
            now: 0.0,
        };
        frames.accept(first);
        frames
    }

    fn accept(&mut self, request: FrameRequest) {
        if request == FrameRequest::Schedule {
            assert!(!self.scheduled, "two frame chains alive");
            self.scheduled = true;
        }
    }

    fn run<E: Effect<HeadlessGl>>(&mut self, effect: &mut E, frames: usize) {
        for _ in 0..frames {
            if !self.scheduled {
                return;
            }
            self.scheduled = false;
            self.now += 16.0;
            let request = effect.tick(Some(self.now), false);
            self.accept(request);
        }
    }
}

fn gl_of<G>(ctx: Option<&hikari_wasm::RenderContext<G>>) -> &G
where
    G: hikari_wasm::gl::Graphics,
{
    ctx.expect("connected").gl()
}

fn approx_eq(a: &[f32], b: &[f32]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-5)
}

fn vec4(value: &UniformValue) -> [f32; 4] {
    match value {
        UniformValue::Vec4(v) => v.to_array(),
        other => panic!("expected vec4, got {other:?}"),
    }
}

fn morph(config: MorphConfig, width: f32, height: f32) -> (MorphGradient<HeadlessGl>, Frames) {
    let mut effect = MorphGradient::new(config);
    let request = effect.connect(HeadlessGl::new(), Viewport::new(width, height));
    (effect, Frames::new(request))
}

fn balatro(config: BalatroConfig) -> (BalatroGradient<HeadlessGl>, Frames) {
    let mut effect = BalatroGradient::new(config);
    let request = effect.connect(HeadlessGl::new(), Viewport::new(400.0, 200.0));
    (effect, Frames::new(request))
}

#[test]
fn morph_grid_follows_size_and_density() {
    let config = MorphConfig {
        density: [0.01, 0.01],
        ..MorphConfig::default()
    };
    let (mut effect, _) = morph(config, 800.0, 600.0);
    assert_eq!(effect.segments(), Some((8, 6)));

    effect.resize(Viewport::new(400.0, 300.0));
    assert_eq!(effect.segments(), Some((4, 3)));
    let ctx = effect.context().expect("connected");
    let plane = &ctx.meshes()[0].geometry;
    assert_eq!(plane.attribute(hikari_wasm::geometry::PlaneAttribute::Index).len(), 72);
    assert_eq!((plane.width(), plane.height()), (400.0, 300.0));
}

#[test]
fn morph_density_change_rebuilds_immediately() {
    let config = MorphConfig {
        density: [0.01, 0.01],
        ..MorphConfig::default()
    };
    let (mut effect, _) = morph(config, 800.0, 600.0);
    effect.set_density([0.0, 0.0]);
    assert_eq!(effect.segments(), Some((1, 1)));
}

#[test]
fn absurd_density_is_clamped_to_sixteen_bit_indices() {
    let (mut effect, mut frames) = morph(MorphConfig::default(), 800.0, 600.0);
    effect.set_density([1e7, 1e7]);
    effect.resize(Viewport::new(1920.0, 1080.0));
    let plane = &effect.context().expect("connected").meshes()[0].geometry;
    assert!(plane.vertex_count() <= hikari_wasm::geometry::MAX_VERTICES);
    let (xs, ys) = plane.segments();
    assert!(xs > 1 && ys > 1);
    frames.run(&mut effect, 1);
    assert_eq!(gl_of(effect.context()).draw_count(), 1);
}

#[test]
fn morph_fixed_height_overrides_the_canvas() {
    let config = MorphConfig {
        height: Some(300.0),
        ..MorphConfig::default()
    };
    let (effect, _) = morph(config, 1000.0, 900.0);
    let ctx = effect.context().expect("connected");
    assert_eq!((ctx.width(), ctx.height()), (1000.0, 300.0));
}

#[test]
fn morph_shadow_power_tracks_width() {
    let (mut effect, _) = morph(MorphConfig::default(), 500.0, 400.0);
    let shadow = |e: &MorphGradient<HeadlessGl>| e.uniform("u_shadow_power").and_then(|u| u.as_float());
    assert_eq!(shadow(&effect), Some(5.0));
    effect.resize(Viewport::new(1200.0, 400.0));
    assert_eq!(shadow(&effect), Some(6.0));
}

#[test]
fn morph_wave_layers_stay_out_of_the_fragment_stage() {
    let (effect, _) = morph(MorphConfig::default(), 800.0, 600.0);
    let material = &effect.context().expect("connected").meshes()[0].material;
    assert!(material.vertex_source().contains("const int u_waveLayers_length = 3;"));
    assert!(material.vertex_source().contains("uniform struct WaveLayers"));
    assert!(!material.fragment_source().contains("u_waveLayers"));
    assert!(material.fragment_source().contains("u_darken_top"));
    assert!(material.diagnostics().is_empty());
}

#[test]
fn frames_render_while_playing() {
    let (mut effect, mut frames) = morph(MorphConfig::default(), 800.0, 600.0);
    frames.run(&mut effect, 10);
    assert_eq!(gl_of(effect.context()).draw_count(), 10);
    assert_eq!(effect.animator().rendered_frames(), 10);
    // first frame only seeds the clock
    let t = effect.uniform("u_time").and_then(|u| u.as_float());
    assert_eq!(t, Some(1_253_106.0 + 9.0 * 16.0));
    let pushed = gl_of(effect.context()).uniform("u_time");
    assert_eq!(pushed, Some(vec![1_253_106.0 + 9.0 * 16.0]));
}

#[test]
fn long_gaps_advance_by_one_capped_step() {
    let (mut effect, _) = morph(MorphConfig::default(), 800.0, 600.0);
    let _ = effect.tick(Some(1000.0), false);
    let _ = effect.tick(Some(5000.0), false);
    let t = effect.uniform("u_time").and_then(|u| u.as_float()).expect("u_time");
    assert!((t - (1_253_106.0 + 1000.0 / 15.0)).abs() < 0.1, "t = {t}");
}

#[test]
fn repeated_play_keeps_a_single_chain() {
    let (mut effect, mut frames) = morph(MorphConfig::default(), 800.0, 600.0);
    for _ in 0..3 {
        let request = effect.play();
        frames.accept(request);
    }
    frames.run(&mut effect, 5);
    assert_eq!(gl_of(effect.context()).draw_count(), 5);

    effect.pause();
    effect.pause();
    frames.run(&mut effect, 5);
    assert!(!frames.scheduled, "pending frame ends the chain");
    assert_eq!(gl_of(effect.context()).draw_count(), 5);

    let request = effect.play();
    assert_eq!(request, FrameRequest::Schedule);
    frames.accept(request);
    frames.run(&mut effect, 4);
    assert_eq!(gl_of(effect.context()).draw_count(), 9);
}

#[test]
fn starting_paused_waits_for_play() {
    let config = MorphConfig {
        playing: false,
        ..MorphConfig::default()
    };
    let (mut effect, mut frames) = morph(config, 800.0, 600.0);
    assert!(!frames.scheduled);
    assert!(effect.is_connected());
    frames.accept(effect.play());
    frames.run(&mut effect, 2);
    assert_eq!(gl_of(effect.context()).draw_count(), 2);
}

#[test]
fn hidden_documents_skip_rendering() {
    let (mut effect, _) = morph(MorphConfig::default(), 800.0, 600.0);
    assert_eq!(effect.tick(Some(16.0), true), FrameRequest::Schedule);
    assert_eq!(gl_of(effect.context()).draw_count(), 0);
}

#[test]
fn scrolling_pauses_and_settling_resumes() {
    let (mut effect, mut frames) = morph(MorphConfig::default(), 800.0, 600.0);
    effect.scroll_started();
    assert!(!effect.animator().is_playing());
    frames.run(&mut effect, 3);
    assert_eq!(gl_of(effect.context()).draw_count(), 0);

    let request = effect.scroll_settled();
    assert_eq!(request, FrameRequest::Schedule);
    frames.accept(request);
    frames.run(&mut effect, 3);
    assert_eq!(gl_of(effect.context()).draw_count(), 3);
}

#[test]
fn off_screen_canvas_is_not_resumed_by_scroll() {
    let (mut effect, _) = morph(MorphConfig::default(), 800.0, 600.0);
    effect.set_intersecting(false);
    effect.scroll_started();
    assert_eq!(effect.scroll_settled(), FrameRequest::Idle);
    assert!(!effect.animator().is_playing());
}

#[test]
fn disconnect_stops_everything() {
    let (mut effect, mut frames) = morph(MorphConfig::default(), 800.0, 600.0);
    frames.run(&mut effect, 2);
    effect.disconnect();
    assert_eq!(effect.animator().lifecycle(), Lifecycle::Disconnected);
    assert!(!effect.is_connected());
    frames.run(&mut effect, 5);
    assert!(!frames.scheduled);
    assert_eq!(gl_of(effect.context()).draw_count(), 2);
    assert_eq!(effect.play(), FrameRequest::Idle);
    assert_eq!(
        effect.connect(HeadlessGl::new(), Viewport::new(10.0, 10.0)),
        FrameRequest::Idle
    );
}

#[test]
fn connect_twice_is_a_no_op() {
    let (mut effect, _) = morph(MorphConfig::default(), 800.0, 600.0);
    assert_eq!(
        effect.connect(HeadlessGl::new(), Viewport::new(10.0, 10.0)),
        FrameRequest::Idle
    );
    assert_eq!(effect.context().expect("connected").width(), 800.0);
}

#[test]
fn morph_setters_write_through_to_uniforms() {
    let (mut effect, _) = morph(MorphConfig::default(), 800.0, 600.0);

    effect.set_amplitude(100.0);
    let deform = effect.uniform("u_vertDeform").expect("u_vertDeform");
    assert_eq!(deform.field("noiseAmp").and_then(|u| u.as_float()), Some(100.0));

    effect.set_seed(7.0);
    let layers = effect.uniform("u_waveLayers").expect("u_waveLayers");
    let seed = layers.element(1).and_then(|l| l.field("noiseSeed")).and_then(|u| u.as_float());
    assert_eq!(seed, Some(27.0));

    effect.toggle_color(1);
    assert_eq!(effect.active_colors(), [1.0, 0.0, 1.0, 1.0]);
    effect.toggle_color(1);
    effect.toggle_color(9);
    assert_eq!(effect.active_colors(), [1.0; 4]);

    effect.set_darken_top(true);
    assert_eq!(effect.uniform("u_darken_top").and_then(|u| u.as_float()), Some(1.0));
}

#[test]
fn extra_wave_colors_are_dropped() {
    let config = MorphConfig {
        wave_colors: ["#111111", "#222222", "#333333", "#444444", "#555555"]
            .map(String::from)
            .to_vec(),
        ..MorphConfig::default()
    };
    let (effect, _) = morph(config, 800.0, 600.0);
    assert_eq!(effect.config().wave_colors.len(), 3);
    let layers = effect.uniform("u_waveLayers").expect("u_waveLayers");
    assert!(layers.element(2).is_some());
    assert!(layers.element(3).is_none());
}

#[test]
fn frequency_steps_by_the_configured_delta() {
    let config = MorphConfig {
        freq_x: 1.0,
        freq_y: 2.0,
        freq_delta: 0.5,
        ..MorphConfig::default()
    };
    let (mut effect, _) = morph(config, 800.0, 600.0);
    effect.step_frequency();
    effect.update_frequency(-1.0);
    let global = effect.uniform("u_global").expect("u_global");
    match global.field("noiseFreq").map(|u| &u.value) {
        Some(UniformValue::Vec2(v)) => assert!(approx_eq(&v.to_array(), &[0.5, 1.5])),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn zoom_scales_the_projection_with_a_floor() {
    let (mut effect, _) = morph(MorphConfig::default(), 800.0, 600.0);
    let scale_x = |e: &MorphGradient<HeadlessGl>| e.context().expect("connected").projection_matrix().x_axis.x;
    assert!((scale_x(&effect) - 2.0 / 800.0).abs() < 1e-7);
    effect.set_zoom(2.0);
    assert!((scale_x(&effect) - 4.0 / 800.0).abs() < 1e-7);
    effect.set_zoom(0.1);
    assert!((scale_x(&effect) - 1.0 / 800.0).abs() < 1e-7);
}

#[test]
fn wireframe_toggles_draw_mode() {
    let (mut effect, mut frames) = morph(MorphConfig::default(), 800.0, 600.0);
    effect.set_wireframe(true);
    frames.run(&mut effect, 1);
    let draws = gl_of(effect.context()).draws();
    assert_eq!(draws[0].mode, hikari_wasm::gl::DrawMode::Lines);
}

#[test]
fn balatro_color_updates_keep_the_program() {
    let (mut effect, mut frames) = balatro(BalatroConfig::default());
    frames.run(&mut effect, 1);
    let pushed = gl_of(effect.context()).uniform("uColor1").expect("uColor1");
    assert!(approx_eq(&pushed, &[222.0 / 255.0, 68.0 / 255.0, 59.0 / 255.0, 1.0]));

    let program = |e: &BalatroGradient<HeadlessGl>| {
        e.context().expect("connected").meshes()[0].material.program().cloned()
    };
    let before = program(&effect);
    effect.set_color1("#000000");
    frames.run(&mut effect, 1);
    assert_eq!(program(&effect), before);
    assert_eq!(gl_of(effect.context()).uniform("uColor1"), Some(vec![0.0, 0.0, 0.0, 1.0]));
}

#[test]
fn css_variables_resolve_before_connect() {
    let mut effect = BalatroGradient::new(BalatroConfig {
        color1: "var(--gradient-color-1)".into(),
        ..BalatroConfig::default()
    });
    let lookup = |name: &str| (name == "--gradient-color-1").then(|| " #0000ff".to_owned());
    effect.resolve_css_vars(&lookup);
    let mut frames = Frames::new(effect.connect(HeadlessGl::new(), Viewport::new(400.0, 200.0)));
    frames.run(&mut effect, 1);
    assert_eq!(gl_of(effect.context()).uniform("uColor1"), Some(vec![0.0, 0.0, 1.0, 1.0]));
}

#[test]
fn balatro_bad_colors_fall_back_to_defaults() {
    let config = BalatroConfig {
        color2: "not a color".into(),
        ..BalatroConfig::default()
    };
    let (mut effect, _) = balatro(config);
    let color2 = vec4(&effect.uniform("uColor2").expect("uColor2").value);
    assert!(approx_eq(&color2, &[0.0, 107.0 / 255.0, 180.0 / 255.0, 1.0]));

    effect.set_color3("#fff");
    let color3 = vec4(&effect.uniform("uColor3").expect("uColor3").value);
    assert!(approx_eq(&color3, &[1.0; 4]));
}

#[test]
fn balatro_time_is_in_seconds() {
    let (mut effect, _) = balatro(BalatroConfig::default());
    let _ = effect.tick(Some(1000.0), false);
    let _ = effect.tick(Some(1500.0), false);
    let t = effect.uniform("iTime").and_then(|u| u.as_float());
    assert_eq!(t, Some(0.5));
}

#[test]
fn balatro_pointer_maps_to_uv_space() {
    let (mut effect, _) = balatro(BalatroConfig::default());
    assert!(effect.wants_pointer());
    effect.pointer_moved(50.0, 25.0, 200.0, 100.0);
    let mouse = |e: &BalatroGradient<HeadlessGl>| match &e.uniform("uMouse").expect("uMouse").value {
        UniformValue::Vec2(v) => v.to_array(),
        other => panic!("unexpected {other:?}"),
    };
    assert!(approx_eq(&mouse(&effect), &[0.25, 0.75]));

    effect.set_mouse_interaction(false);
    assert!(approx_eq(&mouse(&effect), &[0.5, 0.5]));
    effect.pointer_moved(0.0, 0.0, 200.0, 100.0);
    assert!(approx_eq(&mouse(&effect), &[0.5, 0.5]));
}

#[test]
fn balatro_stays_a_single_quad() {
    let (mut effect, _) = balatro(BalatroConfig::default());
    effect.resize(Viewport::new(1920.0, 1080.0));
    let ctx = effect.context().expect("connected");
    let plane = &ctx.meshes()[0].geometry;
    assert_eq!(plane.segments(), (1, 1));
    assert_eq!((plane.width(), plane.height()), (1920.0, 1080.0));
    assert_eq!(ctx.gl().drawable_size(), (1920, 1080));
}
