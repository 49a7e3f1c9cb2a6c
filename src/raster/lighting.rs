//! Two-light GUI shading.

use crate::config::LightConfig;
use crate::resource_pack::GuiLight;
use glam::Vec3;

/// A directional light with ambient and diffuse terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    /// Unit vector toward the light, in view space.
    pub direction: Vec3,
    pub ambient: f32,
    pub diffuse: f32,
}

impl Light {
    /// Light for `gui_light: side` models, from the configuration.
    pub fn side(config: &LightConfig) -> Self {
        let [x, y, z, _] = config.position;
        Self {
            direction: Vec3::new(x, y, z).normalize_or_zero(),
            ambient: config.ambient,
            diffuse: config.power,
        }
    }

    /// Head-on light for `gui_light: front` models.
    pub fn front() -> Self {
        Self {
            direction: Vec3::Z,
            ambient: 0.0,
            diffuse: 1.0,
        }
    }

    pub fn for_model(gui_light: GuiLight, config: &LightConfig) -> Self {
        match gui_light {
            GuiLight::Side => Self::side(config),
            GuiLight::Front => Self::front(),
        }
    }

    /// Brightness multiplier for a face with the given normal.
    pub fn intensity(&self, normal: Vec3) -> f32 {
        let n = normal.normalize_or_zero();
        (self.ambient + self.diffuse * n.dot(self.direction).max(0.0)).clamp(0.0, 1.0)
    }
}
