//! Animated gradient effects.
//!
//! An effect owns one [`RenderContext`](crate::RenderContext) and one mesh and
//! is driven from outside: the browser runtime (or a test) calls
//! [`Effect::tick`] once per animation frame and schedules the next frame only
//! when the tick returns [`FrameRequest::Schedule`]. Effects never own timers
//! or listeners themselves.

pub mod balatro;
pub mod morph;

pub use balatro::BalatroGradient;
pub use morph::MorphGradient;

use crate::context::{MeshId, RenderContext};
use crate::gl::Graphics;
use crate::mesh::Mesh;
use crate::uniform::Uniform;

/// Debounce between the last scroll event and resuming playback.
pub const SCROLL_SETTLE_MS: u32 = 200;
/// Delay before the canvas parent is marked loaded.
pub const PARENT_LOADED_DELAY_MS: u32 = 3000;
/// Class added to the canvas (and later its parent) once rendering starts.
pub const LOADED_CLASS: &str = "isLoaded";

/// Canvas size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Whether the caller must request one more animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum FrameRequest {
    Schedule,
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Initialized,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    Playing,
    Paused,
}

/// Time accumulator fed by animation-frame timestamps (milliseconds).
#[derive(Debug, Clone, PartialEq)]
pub struct FrameClock {
    t: f64,
    last: Option<f64>,
    max_frame_time_step: f32,
}

impl FrameClock {
    pub fn new(start: f64, max_frame_time_step: f32) -> Self {
        Self {
            t: start,
            last: None,
            max_frame_time_step,
        }
    }

    pub fn elapsed(&self) -> f64 {
        self.t
    }

    pub fn set_max_frame_time_step(&mut self, step: f32) {
        self.max_frame_time_step = step;
    }

    /// Advances by the time since the previous frame, capped at one
    /// `1000 / max_frame_time_step` ms step when a cap is set. The first
    /// frame only seeds the reference timestamp.
    pub fn advance(&mut self, now: f64) -> f64 {
        let last = self.last.replace(now).unwrap_or(now);
        let delta = (now - last).max(0.0);
        let step = if self.max_frame_time_step > 0.0 {
            delta.min(1000.0 / f64::from(self.max_frame_time_step))
        } else {
            delta
        };
        self.t += step;
        self.t
    }
}

/// Playback state shared by every effect: the Playing/Paused machine, the
/// single pending frame guard, and the scroll/visibility flags.
#[derive(Debug, Clone)]
pub struct Animator {
    lifecycle: Lifecycle,
    playback: Playback,
    frame_pending: bool,
    clock: FrameClock,
    intersecting: bool,
    paused_by_scroll: bool,
    rendered_frames: u64,
}

impl Animator {
    pub fn new(clock: FrameClock) -> Self {
        Self {
            lifecycle: Lifecycle::Uninitialized,
            playback: Playback::Paused,
            frame_pending: false,
            clock,
            intersecting: true,
            paused_by_scroll: false,
            rendered_frames: 0,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn playback(&self) -> Playback {
        self.playback
    }

    pub fn is_playing(&self) -> bool {
        self.playback == Playback::Playing
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut FrameClock {
        &mut self.clock
    }

    pub fn rendered_frames(&self) -> u64 {
        self.rendered_frames
    }

    pub fn is_intersecting(&self) -> bool {
        self.intersecting
    }

    pub(crate) fn initialize(&mut self, playing: bool) -> FrameRequest {
        self.lifecycle = Lifecycle::Initialized;
        log::debug!(target: "hikari::effect", "initialized");
        if playing {
            self.play()
        } else {
            FrameRequest::Idle
        }
    }

    /// Starts playback. Schedules a frame only if none is pending, so at most
    /// one frame chain is ever alive.
    pub fn play(&mut self) -> FrameRequest {
        if self.lifecycle != Lifecycle::Initialized {
            return FrameRequest::Idle;
        }
        self.playback = Playback::Playing;
        self.paused_by_scroll = false;
        if self.frame_pending {
            FrameRequest::Idle
        } else {
            self.frame_pending = true;
            FrameRequest::Schedule
        }
    }

    /// Stops rescheduling. An already requested frame still fires and ends
    /// the chain.
    pub fn pause(&mut self) {
        self.playback = Playback::Paused;
    }

    /// Consumes the pending frame. Returns the accumulated time when this
    /// frame should render, plus whether the chain continues.
    pub(crate) fn tick(&mut self, timestamp: Option<f64>, hidden: bool) -> (Option<f64>, FrameRequest) {
        self.frame_pending = false;
        if self.lifecycle != Lifecycle::Initialized {
            return (None, FrameRequest::Idle);
        }
        let render = match timestamp {
            Some(now) if !hidden && self.is_playing() => {
                self.rendered_frames += 1;
                Some(self.clock.advance(now))
            }
            _ => None,
        };
        let next = if self.is_playing() {
            self.frame_pending = true;
            FrameRequest::Schedule
        } else {
            FrameRequest::Idle
        };
        (render, next)
    }

    /// Scrolling started: pause if playing, remembering to resume.
    pub fn scroll_started(&mut self) {
        if self.is_playing() {
            self.pause();
            self.paused_by_scroll = true;
        }
    }

    /// Scrolling settled: resume if the scroll paused playback and the
    /// canvas is still visible.
    pub fn scroll_settled(&mut self) -> FrameRequest {
        if self.paused_by_scroll && self.intersecting {
            self.play()
        } else {
            FrameRequest::Idle
        }
    }

    pub fn set_intersecting(&mut self, intersecting: bool) {
        self.intersecting = intersecting;
    }

    pub(crate) fn disconnect(&mut self) {
        self.pause();
        self.paused_by_scroll = false;
        self.lifecycle = Lifecycle::Disconnected;
        log::debug!(target: "hikari::effect", "disconnected");
    }
}

/// Render context plus the one mesh an effect draws.
pub(crate) struct Scene<G: Graphics> {
    pub ctx: RenderContext<G>,
    pub mesh: MeshId,
}

impl<G: Graphics> Scene<G> {
    pub fn mesh(&self) -> Option<&Mesh<G>> {
        self.ctx.mesh(self.mesh)
    }

    pub fn mesh_mut(&mut self) -> Option<(&G, &mut Mesh<G>)> {
        self.ctx.mesh_mut(self.mesh)
    }

    pub fn uniform(&self, name: &str) -> Option<&Uniform> {
        self.mesh()?.material.uniforms().get(name)
    }

    pub fn uniform_mut(&mut self, name: &str) -> Option<&mut Uniform> {
        let (_, mesh) = self.mesh_mut()?;
        mesh.material.uniform_mut(name)
    }
}

/// Lifecycle surface the browser runtime drives.
pub trait Effect<G: Graphics> {
    /// Builds the context, mesh and uniforms and performs the first resize.
    fn connect(&mut self, gl: G, viewport: Viewport) -> FrameRequest;

    fn resize(&mut self, viewport: Viewport);

    /// One animation frame. `timestamp` is the `requestAnimationFrame`
    /// argument in milliseconds.
    fn tick(&mut self, timestamp: Option<f64>, hidden: bool) -> FrameRequest;

    fn animator(&self) -> &Animator;

    fn animator_mut(&mut self) -> &mut Animator;

    fn play(&mut self) -> FrameRequest {
        self.animator_mut().play()
    }

    fn pause(&mut self) {
        self.animator_mut().pause();
    }

    fn scroll_started(&mut self) {
        self.animator_mut().scroll_started();
    }

    fn scroll_settled(&mut self) -> FrameRequest {
        self.animator_mut().scroll_settled()
    }

    fn set_intersecting(&mut self, intersecting: bool) {
        self.animator_mut().set_intersecting(intersecting);
    }

    fn wants_pointer(&self) -> bool {
        false
    }

    /// Pointer position relative to the canvas box of `width` x `height`.
    fn pointer_moved(&mut self, _x: f32, _y: f32, _width: f32, _height: f32) {}

    /// Resolves `--name` / `var(--name)` color options. Call before
    /// [`Effect::connect`]; uniforms are built from the resolved values.
    fn resolve_css_vars(&mut self, _lookup: &dyn Fn(&str) -> Option<String>) {}

    fn disconnect(&mut self) {
        self.animator_mut().disconnect();
    }

    fn is_connected(&self) -> bool {
        self.animator().lifecycle() == Lifecycle::Initialized
    }
}
