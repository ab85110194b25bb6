#![cfg_attr(target_arch = "wasm32", allow(dead_code))]

//! Minimal WebGL rendering layer plus two animated gradient backgrounds.
//!
//! The core (`uniform`, `attribute`, `material`, `geometry`, `mesh`,
//! `context`) is generic over [`gl::Graphics`] so it runs against the
//! in-memory [`gl::HeadlessGl`] on the host and against WebGL 2 in the
//! browser.

pub mod attribute;
pub mod color;
pub mod config;
pub mod context;
pub mod effect;
pub mod error;
pub mod geometry;
pub mod gl;
pub mod material;
pub mod mesh;
pub mod uniform;

pub use attribute::{AttributeBuffer, AttributeData};
pub use config::{BalatroConfig, MorphConfig};
pub use context::{MeshId, RenderContext};
pub use effect::{BalatroGradient, Effect, FrameRequest, MorphGradient, Viewport};
pub use error::HikariError;
pub use geometry::{Orientation, PlaneGeometry};
pub use material::Material;
pub use mesh::Mesh;
pub use uniform::{Uniform, UniformSet, UniformValue};

// Only compile wasm-specific code when targeting wasm32.
#[cfg(target_arch = "wasm32")]
mod wasm;
