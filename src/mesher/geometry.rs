//! Mesh geometry types.

use crate::types::Direction;
use glam::Vec3;

/// A textured vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    /// Normalized texture coordinates, v = 0 at the top of the image.
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(position: Vec3, uv: [f32; 2]) -> Self {
        Self { position, uv }
    }
}

/// One element face, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct Quad {
    pub vertices: [Vertex; 4],
    pub direction: Direction,
    /// Texture reference as written on the face (`#name` or a key).
    pub texture: String,
    pub tintindex: i32,
    /// False draws the face without lighting.
    pub shade: bool,
}

/// All faces of a model in draw order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub quads: Vec<Quad>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, quad: Quad) {
        self.quads.push(quad);
    }
}
