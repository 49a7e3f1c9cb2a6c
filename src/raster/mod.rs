//! Software rasterizer for GUI thumbnails.
//!
//! Reproduces the fixed-function pipeline the game uses for inventory icons:
//! orthographic camera, back-face culling, alpha test, depth test, two
//! directional lights, vertex colors multiplying nearest-sampled texels,
//! and polygon offset for stacked texture layers.

pub mod lighting;
pub mod math;

pub use lighting::Light;

use crate::config::{LightConfig, MAX_RENDER_SIZE, MIN_RENDER_SIZE};
use crate::error::{RenderError, Result};
use crate::mesher::{DrawList, DrawQuad, FaceLayer};
use crate::resource_pack::{Model, TextureData};
use crate::types::DisplayTransform;
use glam::{Mat4, Vec2, Vec3};
use image::RgbaImage;

/// Depth pulled toward the viewer per texture layer above the first.
const LAYER_DEPTH_OFFSET: f32 = 0.1e-3;

/// Color and depth buffers for one task.
pub struct FrameTarget {
    size: u32,
    color: Vec<[f32; 4]>,
    depth: Vec<f32>,
}

impl FrameTarget {
    pub fn new(size: u32) -> Result<Self> {
        if !(MIN_RENDER_SIZE..=MAX_RENDER_SIZE).contains(&size) {
            return Err(RenderError::Gl(format!(
                "incomplete framebuffer: size {} outside {}..={}",
                size, MIN_RENDER_SIZE, MAX_RENDER_SIZE
            )));
        }
        let pixels = (size * size) as usize;
        Ok(Self {
            size,
            color: vec![[0.0; 4]; pixels],
            depth: vec![f32::INFINITY; pixels],
        })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Reset to transparent black and far depth.
    pub fn clear(&mut self) {
        self.color.fill([0.0; 4]);
        self.depth.fill(f32::INFINITY);
    }

    /// Copy out the color buffer with the first row at the top.
    pub fn read_pixels(&self) -> RgbaImage {
        let size = self.size;
        RgbaImage::from_fn(size, size, |x, y| {
            let src = self.color[((size - 1 - y) * size + x) as usize];
            image::Rgba(src.map(|c| (c * 255.0).round().clamp(0.0, 255.0) as u8))
        })
    }
}

/// Camera transform and zoom for one draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub transform: DisplayTransform,
    pub zoom: f32,
}

impl Camera {
    pub fn new(transform: DisplayTransform, zoom: f32) -> Self {
        Self { transform, zoom }
    }

    /// The model's own `gui` display transform and zoom.
    pub fn gui(model: &Model) -> Self {
        Self::new(model.gui_transform(), model.zoom)
    }

    /// Half the visible width in block units; a unit-zoom block fills the frame.
    pub fn half_extent(&self) -> f32 {
        8.0 / self.zoom.max(f32::EPSILON)
    }
}

/// A vertex after modelview and projection.
#[derive(Clone, Copy)]
struct ScreenVertex {
    window: Vec3,
    uv: Vec2,
}

/// Blend factor for the source color.
#[derive(Clone, Copy, PartialEq)]
enum Blend {
    /// `ONE, ONE_MINUS_SRC_ALPHA`
    Premultiplied,
    /// `SRC_ALPHA, ONE_MINUS_SRC_ALPHA`
    Alpha,
}

pub struct Rasterizer {
    light: LightConfig,
}

impl Rasterizer {
    pub fn new(light: LightConfig) -> Self {
        Self { light }
    }

    /// Draw every quad of `list` into `target`.
    pub fn draw(&self, target: &mut FrameTarget, list: &DrawList, camera: &Camera) {
        let modelview = math::modelview(&camera.transform);
        let light = Light::for_model(list.gui_light, &self.light);
        for quad in &list.quads {
            self.draw_quad(target, quad, &modelview, camera.half_extent(), &light);
        }
    }

    fn draw_quad(&self, target: &mut FrameTarget, quad: &DrawQuad, modelview: &Mat4, half_extent: f32, light: &Light) {
        let view = quad.vertices.map(|v| modelview.transform_point3(v.position));
        let screen: [ScreenVertex; 4] = std::array::from_fn(|i| ScreenVertex {
            window: math::project(view[i], half_extent, target.size),
            uv: Vec2::from_array(quad.vertices[i].uv),
        });

        for (k, layer) in quad.layers.iter().enumerate() {
            let blend = if k == 0 { Blend::Premultiplied } else { Blend::Alpha };
            let depth_offset = -(k as f32) * LAYER_DEPTH_OFFSET;
            for [a, b, c] in [[0, 1, 2], [0, 2, 3]] {
                let normal = math::face_normal(view[a], view[b], view[c]);
                if normal.z <= 0.0 {
                    continue;
                }
                let intensity = if quad.shade { light.intensity(normal) } else { 1.0 };
                let color = vertex_color(layer, intensity);
                rasterize_triangle(
                    target,
                    [screen[a], screen[b], screen[c]],
                    &layer.texture,
                    color,
                    depth_offset,
                    blend,
                );
            }
        }
    }
}

fn vertex_color(layer: &FaceLayer, intensity: f32) -> [f32; 3] {
    layer.color.map(|c| (c as f32 / 255.0 * intensity).clamp(0.0, 1.0))
}

/// Nearest-texel lookup with clamped coordinates, as straight RGBA in 0..1.
fn sample(texture: &TextureData, uv: Vec2) -> [f32; 4] {
    if texture.width == 0 || texture.height == 0 {
        return [0.0; 4];
    }
    let x = ((uv.x * texture.width as f32).floor() as i64).clamp(0, texture.width as i64 - 1) as u32;
    let y = ((uv.y * texture.height as f32).floor() as i64).clamp(0, texture.height as i64 - 1) as u32;
    texture.get_pixel(x, y).map(|c| c as f32 / 255.0)
}

fn rasterize_triangle(
    target: &mut FrameTarget,
    vertices: [ScreenVertex; 3],
    texture: &TextureData,
    color: [f32; 3],
    depth_offset: f32,
    blend: Blend,
) {
    let [v0, v1, v2] = vertices;
    let (p0, p1, p2) = (v0.window.truncate(), v1.window.truncate(), v2.window.truncate());
    let size = target.size;

    let min = p0.min(p1).min(p2).max(Vec2::ZERO);
    let max = p0.max(p1).max(p2).min(Vec2::splat(size as f32));
    if min.x >= max.x || min.y >= max.y {
        return;
    }

    for y in (min.y as u32)..=(max.y as u32).min(size - 1) {
        for x in (min.x as u32)..=(max.x as u32).min(size - 1) {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let Some(w) = math::barycentric(p, p0, p1, p2) else {
                return;
            };
            if w.min_element() < 0.0 {
                continue;
            }

            let uv = v0.uv * w.x + v1.uv * w.y + v2.uv * w.z;
            let texel = sample(texture, uv);
            if texel[3] <= 0.0 {
                continue;
            }

            let depth = v0.window.z * w.x + v1.window.z * w.y + v2.window.z * w.z + depth_offset;
            let index = (y * size + x) as usize;
            if depth >= target.depth[index] {
                continue;
            }
            target.depth[index] = depth;

            let alpha = texel[3];
            let src = [
                texel[0] * color[0],
                texel[1] * color[1],
                texel[2] * color[2],
                alpha,
            ];
            let src_factor = match blend {
                Blend::Premultiplied => 1.0,
                Blend::Alpha => alpha,
            };
            for (dst, src) in target.color[index].iter_mut().zip(src) {
                *dst = (src * src_factor + *dst * (1.0 - alpha)).clamp(0.0, 1.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesher::{GeometryBuilder, Vertex};
    use crate::resource_pack::GuiLight;
    use std::sync::Arc;

    fn flat_quad(z: f32, texture: TextureData, color: [u8; 3]) -> DrawQuad {
        // North-facing 16x16 square as produced for sprite layers.
        let corners = [
            Vec3::new(8.0, 8.0, z),
            Vec3::new(-8.0, 8.0, z),
            Vec3::new(-8.0, -8.0, z),
            Vec3::new(8.0, -8.0, z),
        ];
        let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        DrawQuad {
            vertices: std::array::from_fn(|i| Vertex::new(corners[i], uvs[i])),
            layers: vec![FaceLayer {
                texture: Arc::new(texture),
                color,
            }],
            shade: true,
        }
    }

    fn sprite_camera() -> Camera {
        Camera::new(DisplayTransform::new([180.0, 0.0, 180.0], [0.0; 3], [1.0; 3]), 1.0)
    }

    fn front_list(quads: Vec<DrawQuad>) -> DrawList {
        DrawList {
            quads,
            gui_light: GuiLight::Front,
        }
    }

    #[test]
    fn test_frame_target_size_bounds() {
        assert!(FrameTarget::new(0).is_err());
        assert_eq!(FrameTarget::new(8192).err().map(|e| e.kind()), Some("GLError"));
        assert_eq!(FrameTarget::new(16).unwrap().size(), 16);
    }

    #[test]
    fn test_sprite_fills_frame() {
        let mut target = FrameTarget::new(32).unwrap();
        let list = front_list(vec![flat_quad(0.0, TextureData::solid(16, 16, [255, 0, 0, 255]), [255; 3])]);
        Rasterizer::new(LightConfig::default()).draw(&mut target, &list, &sprite_camera());
        let image = target.read_pixels();
        for pixel in image.pixels() {
            assert_eq!(pixel.0, [255, 0, 0, 255]);
        }
    }

    #[test]
    fn test_texture_orientation_survives_readback() {
        // top half red, bottom half blue
        let mut texture = TextureData::solid(2, 2, [0, 0, 255, 255]);
        texture.set_pixel(0, 0, [255, 0, 0, 255]);
        texture.set_pixel(1, 0, [255, 0, 0, 255]);
        let mut target = FrameTarget::new(16).unwrap();
        let list = front_list(vec![flat_quad(0.0, texture, [255; 3])]);
        Rasterizer::new(LightConfig::default()).draw(&mut target, &list, &sprite_camera());
        let image = target.read_pixels();
        assert_eq!(image.get_pixel(8, 2).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(8, 13).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_back_faces_are_culled() {
        let mut quad = flat_quad(0.0, TextureData::solid(16, 16, [255; 4]), [255; 3]);
        quad.vertices.reverse();
        let mut target = FrameTarget::new(16).unwrap();
        Rasterizer::new(LightConfig::default()).draw(&mut target, &front_list(vec![quad]), &sprite_camera());
        assert!(target.read_pixels().pixels().all(|p| p.0 == [0; 4]));
    }

    #[test]
    fn test_nearer_quad_wins_regardless_of_order() {
        let near = flat_quad(-1.0, TextureData::solid(16, 16, [0, 255, 0, 255]), [255; 3]);
        let far = flat_quad(0.0, TextureData::solid(16, 16, [255, 0, 0, 255]), [255; 3]);
        let mut target = FrameTarget::new(16).unwrap();
        let rasterizer = Rasterizer::new(LightConfig::default());
        rasterizer.draw(&mut target, &front_list(vec![near, far]), &sprite_camera());
        assert_eq!(target.read_pixels().get_pixel(8, 8).0, [0, 255, 0, 255]);
    }

    #[test]
    fn test_transparent_texels_are_discarded() {
        let mut quad = flat_quad(-1.0, TextureData::solid(16, 16, [0, 0, 0, 0]), [255; 3]);
        quad.layers.push(FaceLayer {
            texture: Arc::new(TextureData::solid(16, 16, [255, 255, 255, 255])),
            color: [0, 0, 255],
        });
        let behind = flat_quad(0.0, TextureData::solid(16, 16, [255, 0, 0, 255]), [255; 3]);
        let mut target = FrameTarget::new(16).unwrap();
        Rasterizer::new(LightConfig::default()).draw(&mut target, &front_list(vec![quad, behind]), &sprite_camera());
        // layer 0 is invisible, layer 1 is tinted blue and sits in front of the red quad
        assert_eq!(target.read_pixels().get_pixel(4, 4).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_unshaded_face_ignores_light() {
        let mut model = Model::default();
        model.elements.push(
            crate::resource_pack::ModelElement {
                shade: false,
                ..crate::resource_pack::ModelElement::new([0.0; 3], [16.0; 3])
            }
            .with_face(crate::types::Direction::Up, crate::resource_pack::ModelFace::new("#all")),
        );
        let mesh = GeometryBuilder::new().build_model(&model).unwrap();
        let quads = mesh
            .quads
            .into_iter()
            .map(|q| DrawQuad {
                vertices: q.vertices,
                layers: vec![FaceLayer {
                    texture: Arc::new(TextureData::solid(16, 16, [200, 200, 200, 255])),
                    color: [255; 3],
                }],
                shade: q.shade,
            })
            .collect();
        let list = DrawList {
            quads,
            gui_light: GuiLight::Side,
        };
        let mut target = FrameTarget::new(64).unwrap();
        Rasterizer::new(LightConfig::default()).draw(&mut target, &list, &Camera::gui(&model));
        let image = target.read_pixels();
        let lit: Vec<_> = image.pixels().filter(|p| p.0[3] > 0).collect();
        assert!(!lit.is_empty());
        assert!(lit.iter().all(|p| p.0 == [200, 200, 200, 255]));
    }
}
