//! Segmented plane mesh data.

use std::str::FromStr;

use crate::attribute::{AttributeBuffer, AttributeData};
use crate::error::HikariError;
use crate::gl::Graphics;

/// Largest vertex count addressable with 16-bit indices.
pub const MAX_VERTICES: usize = u16::MAX as usize + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

impl Axis {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'x' => Some(Axis::X),
            'y' => Some(Axis::Y),
            'z' => Some(Axis::Z),
            _ => None,
        }
    }
}

/// Axes the plane spans: grid x goes to `first`, grid y (negated) to `second`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Orientation {
    pub first: Axis,
    pub second: Axis,
}

impl Orientation {
    pub const XZ: Orientation = Orientation {
        first: Axis::X,
        second: Axis::Z,
    };
    pub const XY: Orientation = Orientation {
        first: Axis::X,
        second: Axis::Y,
    };
}

impl Default for Orientation {
    fn default() -> Self {
        Orientation::XZ
    }
}

impl FromStr for Orientation {
    type Err = HikariError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars().map(Axis::from_char);
        match (chars.next(), chars.next(), chars.next()) {
            (Some(Some(first)), Some(Some(second)), None) if first != second => {
                Ok(Orientation { first, second })
            }
            _ => Err(HikariError::Config(format!("invalid plane orientation: {s}"))),
        }
    }
}

/// Vertex attributes of a plane, in binding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneAttribute {
    Position,
    Uv,
    UvNorm,
    Index,
}

impl PlaneAttribute {
    pub const ALL: [PlaneAttribute; 4] = [
        PlaneAttribute::Position,
        PlaneAttribute::Uv,
        PlaneAttribute::UvNorm,
        PlaneAttribute::Index,
    ];

    /// GLSL attribute name.
    pub fn name(self) -> &'static str {
        match self {
            PlaneAttribute::Position => "position",
            PlaneAttribute::Uv => "uv",
            PlaneAttribute::UvNorm => "uvNorm",
            PlaneAttribute::Index => "index",
        }
    }
}

/// A `width` x `height` plane split into `x_segments` x `y_segments` quads.
///
/// Topology (uv, uvNorm, index) and size (position) are regenerated
/// independently: a resize that keeps segment counts touches positions only.
pub struct PlaneGeometry<G: Graphics> {
    width: f32,
    height: f32,
    orientation: Orientation,
    x_segments: u32,
    y_segments: u32,
    vertex_count: usize,
    triangle_count: usize,
    position: AttributeBuffer<G>,
    uv: AttributeBuffer<G>,
    uv_norm: AttributeBuffer<G>,
    index: AttributeBuffer<G>,
}

impl<G: Graphics> PlaneGeometry<G> {
    pub fn new(
        gl: &G,
        width: f32,
        height: f32,
        x_segments: u32,
        y_segments: u32,
        orientation: Orientation,
    ) -> Self {
        let mut geometry = Self {
            width,
            height,
            orientation,
            x_segments: 1,
            y_segments: 1,
            vertex_count: 0,
            triangle_count: 0,
            position: AttributeBuffer::vertex(gl, 3),
            uv: AttributeBuffer::vertex(gl, 2),
            uv_norm: AttributeBuffer::vertex(gl, 2),
            index: AttributeBuffer::index(gl),
        };
        geometry.set_topology(gl, x_segments, y_segments);
        geometry.set_size(gl, width, height, orientation);
        geometry
    }

    /// Regenerates uv, normalized uv and indices for a new segment grid.
    pub fn set_topology(&mut self, gl: &G, x_segments: u32, y_segments: u32) {
        let (xs, ys) = clamp_segments(x_segments, y_segments);
        self.x_segments = xs;
        self.y_segments = ys;
        self.vertex_count = (xs as usize + 1) * (ys as usize + 1);
        self.triangle_count = xs as usize * ys as usize * 2;

        let mut uv = vec![0.0_f32; 2 * self.vertex_count];
        let mut uv_norm = vec![0.0_f32; 2 * self.vertex_count];
        let mut index = vec![0_u16; 3 * self.triangle_count];
        let (xf, yf) = (xs as f32, ys as f32);

        for y in 0..=ys {
            for x in 0..=xs {
                let v = (y * (xs + 1) + x) as usize;
                uv[2 * v] = x as f32 / xf;
                uv[2 * v + 1] = 1.0 - y as f32 / yf;
                uv_norm[2 * v] = x as f32 / xf * 2.0 - 1.0;
                uv_norm[2 * v + 1] = 1.0 - y as f32 / yf * 2.0;

                if x < xs && y < ys {
                    let cell = (y * xs + x) as usize;
                    // the vertex count clamp keeps these within u16
                    let v = v as u16;
                    let below = v + 1 + xs as u16;
                    index[6 * cell..6 * cell + 6]
                        .copy_from_slice(&[v, below, v + 1, v + 1, below, below + 1]);
                }
            }
        }

        self.uv.set_values(AttributeData::F32(uv));
        self.uv_norm.set_values(AttributeData::F32(uv_norm));
        self.index.set_values(AttributeData::U16(index));
        self.uv.upload(gl);
        self.uv_norm.upload(gl);
        self.index.upload(gl);
    }

    /// Recomputes positions, reusing the position array when its length still
    /// matches the vertex count.
    pub fn set_size(&mut self, gl: &G, width: f32, height: f32, orientation: Orientation) {
        self.width = width;
        self.height = height;
        self.orientation = orientation;

        let len = 3 * self.vertex_count;
        let reuse = matches!(self.position.values(), Some(AttributeData::F32(v)) if v.len() == len);
        if !reuse {
            self.position.set_values(AttributeData::F32(vec![0.0; len]));
        }
        let Some(AttributeData::F32(positions)) = self.position.values_mut() else {
            return;
        };

        let x0 = width / -2.0;
        let y0 = height / -2.0;
        let seg_w = width / self.x_segments as f32;
        let seg_h = height / self.y_segments as f32;
        let (a, b) = (orientation.first as usize, orientation.second as usize);

        for y in 0..=self.y_segments {
            let y_pos = y0 + y as f32 * seg_h;
            for x in 0..=self.x_segments {
                let x_pos = x0 + x as f32 * seg_w;
                let v = (y * (self.x_segments + 1) + x) as usize;
                positions[3 * v + a] = x_pos;
                positions[3 * v + b] = -y_pos;
            }
        }
        self.position.upload(gl);
    }

    pub fn attribute(&self, which: PlaneAttribute) -> &AttributeBuffer<G> {
        match which {
            PlaneAttribute::Position => &self.position,
            PlaneAttribute::Uv => &self.uv,
            PlaneAttribute::UvNorm => &self.uv_norm,
            PlaneAttribute::Index => &self.index,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn segments(&self) -> (u32, u32) {
        (self.x_segments, self.y_segments)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn triangle_count(&self) -> usize {
        self.triangle_count
    }
}

/// Forces both counts to at least 1 and scales them down proportionally so
/// the vertex count fits 16-bit indices.
fn clamp_segments(x_segments: u32, y_segments: u32) -> (u32, u32) {
    let (mut xs, mut ys) = (x_segments.max(1), y_segments.max(1));
    let max = MAX_VERTICES as u64;
    let count = |xs: u32, ys: u32| (u64::from(xs) + 1).saturating_mul(u64::from(ys) + 1);
    if count(xs, ys) <= max {
        return (xs, ys);
    }
    let scale = (max as f64 / count(xs, ys) as f64).sqrt();
    xs = ((xs as f64 * scale).floor() as u32).max(1);
    ys = ((ys as f64 * scale).floor() as u32).max(1);
    // Trim the longer axis to what the shorter one leaves room for.
    while count(xs, ys) > max {
        if xs >= ys {
            xs = (max / (u64::from(ys) + 1)).saturating_sub(1).max(1) as u32;
        } else {
            ys = (max / (u64::from(xs) + 1)).saturating_sub(1).max(1) as u32;
        }
    }
    log::warn!(
        target: "hikari::gl",
        "segment grid {x_segments}x{y_segments} exceeds 16-bit indices, using {xs}x{ys}"
    );
    (xs, ys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_parses_axis_pairs() {
        assert_eq!("xz".parse::<Orientation>().unwrap(), Orientation::XZ);
        assert_eq!("xy".parse::<Orientation>().unwrap(), Orientation::XY);
        assert!("xx".parse::<Orientation>().is_err());
        assert!("xyz".parse::<Orientation>().is_err());
        assert!("ab".parse::<Orientation>().is_err());
    }

    #[test]
    fn oversized_grids_are_clamped() {
        let (xs, ys) = clamp_segments(1000, 1000);
        assert!((xs as usize + 1) * (ys as usize + 1) <= MAX_VERTICES);
        assert!(xs > 200 && ys > 200);
        assert_eq!(clamp_segments(0, 4), (1, 4));
        assert_eq!(clamp_segments(255, 255), (255, 255));
    }

    #[test]
    fn saturated_segment_counts_do_not_overflow() {
        for (x, y) in [(u32::MAX, u32::MAX), (u32::MAX, 1), (1, u32::MAX), (u32::MAX, 300)] {
            let (xs, ys) = clamp_segments(x, y);
            assert!(xs >= 1 && ys >= 1);
            assert!((u64::from(xs) + 1) * (u64::from(ys) + 1) <= MAX_VERTICES as u64);
        }
        assert_eq!(clamp_segments(u32::MAX, 1), (32767, 1));
    }
}
