//! Cuboid element to quad conversion.
//!
//! Coordinates stay in 16-unit block space; the builder only re-centers them
//! on the block middle so the camera transform rotates around it.

use super::geometry::{Mesh, Quad, Vertex};
use crate::error::{RenderError, Result};
use crate::resource_pack::{Model, ModelElement};
use crate::types::{Axis, BlockTransform, Direction, ElementRotation};
use glam::{Mat3, Vec3};

const BLOCK_CENTER: Vec3 = Vec3::splat(8.0);

/// Builds quads for model elements, optionally placed inside a larger scene.
#[derive(Debug, Clone, Default)]
pub struct GeometryBuilder {
    /// Subtracted from every vertex; centers a multi-block scene.
    pub center_offset: Vec3,
    /// Added to every vertex; places a block inside a scene.
    pub offset: Vec3,
    /// Blockstate rotation applied around the block center.
    pub block_transform: BlockTransform,
}

impl GeometryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offsets(mut self, center_offset: Vec3, offset: Vec3) -> Self {
        self.center_offset = center_offset;
        self.offset = offset;
        self
    }

    pub fn with_block_transform(mut self, transform: BlockTransform) -> Self {
        self.block_transform = transform;
        self
    }

    /// Quads for every element of a model, in element order.
    pub fn build_model(&self, model: &Model) -> Result<Mesh> {
        let mut mesh = Mesh::new();
        for element in &model.elements {
            for quad in self.build_element(element)? {
                mesh.push(quad);
            }
        }
        Ok(mesh)
    }

    /// Up to six quads for one element.
    pub fn build_element(&self, element: &ModelElement) -> Result<Vec<Quad>> {
        let corners = self.element_vertices(element);

        element
            .faces
            .iter()
            .map(|(&direction, face)| {
                let uv = face
                    .uv
                    .unwrap_or_else(|| auto_uv(direction, element.min(), element.max()));
                let order = rotate_vertex_order(direction.quad_indices(), face.rotation)?;
                let corner_uvs = quad_uvs(uv);

                let vertices = [0usize, 1, 2, 3].map(|i| Vertex::new(corners[order[i]], corner_uvs[i]));
                Ok(Quad {
                    vertices,
                    direction,
                    texture: face.texture.clone(),
                    tintindex: face.tintindex,
                    shade: element.shade,
                })
            })
            .collect()
    }

    /// The eight corners after element rotation, block rotation and placement.
    pub fn element_vertices(&self, element: &ModelElement) -> [Vec3; 8] {
        let [x1, y1, z1] = element.min();
        let [x2, y2, z2] = element.max();
        let raw = [
            Vec3::new(x1, y1, z1),
            Vec3::new(x2, y1, z1),
            Vec3::new(x2, y2, z1),
            Vec3::new(x1, y2, z1),
            Vec3::new(x1, y2, z2),
            Vec3::new(x2, y2, z2),
            Vec3::new(x2, y1, z2),
            Vec3::new(x1, y1, z2),
        ];

        let block_rotation = block_rotation_matrix(&self.block_transform);
        raw.map(|p| {
            let mut v = p - BLOCK_CENTER;
            if let Some(rotation) = &element.rotation {
                v = apply_element_rotation(v, rotation);
            }
            if let Some(m) = block_rotation {
                v = m * v;
            }
            v - self.center_offset + self.offset
        })
    }
}

/// Rotate a block-centered point around the element's pivot.
pub fn apply_element_rotation(v: Vec3, rotation: &ElementRotation) -> Vec3 {
    let origin = Vec3::from_array(rotation.origin) - BLOCK_CENTER;
    let angle = rotation.angle_radians();
    let matrix = match rotation.axis {
        Axis::X => Mat3::from_rotation_x(angle),
        Axis::Y => Mat3::from_rotation_y(angle),
        Axis::Z => Mat3::from_rotation_z(angle),
    };

    let mut rotated = matrix * (v - origin);
    let scale = rotation.rescale_factor();
    if scale != 1.0 {
        let axis = rotation.axis.index();
        for i in 0..3 {
            if i != axis {
                rotated[i] *= scale;
            }
        }
    }
    rotated + origin
}

fn block_rotation_matrix(transform: &BlockTransform) -> Option<Mat3> {
    if transform.is_identity() {
        return None;
    }
    // Minecraft rotates clockwise; glam follows the right-hand rule.
    let x_rot = Mat3::from_rotation_x((-transform.x as f32).to_radians());
    let y_rot = Mat3::from_rotation_y((-transform.y as f32).to_radians());
    Some(y_rot * x_rot)
}

/// Rotate a face's corner order left by `rotation / 90` steps.
pub fn rotate_vertex_order(order: [usize; 4], rotation: i32) -> Result<[usize; 4]> {
    if rotation.rem_euclid(90) != 0 {
        return Err(RenderError::schema(
            "element face",
            format!("rotation must be a multiple of 90, got {}", rotation),
        ));
    }
    let steps = (rotation / 90).rem_euclid(4) as usize;
    let mut rotated = order;
    rotated.rotate_left(steps);
    Ok(rotated)
}

/// Corner UVs in quad order, normalized to 0..1.
fn quad_uvs(uv: [f32; 4]) -> [[f32; 2]; 4] {
    let [u1, v1, u2, v2] = uv.map(|c| c / 16.0);
    [[u1, v1], [u2, v1], [u2, v2], [u1, v2]]
}

/// Bring a coordinate outside the block back into `0..=16`.
fn wrap16(c: f32) -> f32 {
    if (0.0..=16.0).contains(&c) {
        c
    } else {
        c.rem_euclid(16.0)
    }
}

/// Default UV rectangle of a face, in 0..16, from the element bounds.
///
/// Side faces shift the span by `-(a1 + a2) mod 16` horizontally and by the
/// span height vertically; top and bottom use the XZ footprint directly.
pub fn auto_uv(direction: Direction, from: [f32; 3], to: [f32; 3]) -> [f32; 4] {
    let [x1, y1, z1] = from.map(wrap16);
    let [x2, y2, z2] = to.map(wrap16);
    let dv = (y2 - y1).rem_euclid(16.0);
    let side = |a1: f32, a2: f32| {
        let du = (-(a1 + a2)).rem_euclid(16.0);
        [a1 + du, y1 + dv, a2 + du, y2 + dv]
    };
    match direction {
        Direction::Down | Direction::Up => [x1, z1, x2, z2],
        Direction::North | Direction::South => side(x1, x2),
        Direction::East | Direction::West => side(z1, z2),
    }
}
