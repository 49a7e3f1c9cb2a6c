//! Element rotations, blockstate rotations and display transforms.

use super::Axis;
use serde::{Deserialize, Serialize};

/// Block-level transform from a blockstate variant.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BlockTransform {
    /// X rotation in degrees (0, 90, 180, 270).
    pub x: i32,
    /// Y rotation in degrees (0, 90, 180, 270).
    pub y: i32,
}

impl BlockTransform {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn is_identity(&self) -> bool {
        self.x.rem_euclid(360) == 0 && self.y.rem_euclid(360) == 0
    }
}

/// Element-level rotation from a model element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRotation {
    /// Pivot in 0-16 block space.
    #[serde(default = "default_origin")]
    pub origin: [f32; 3],
    pub axis: Axis,
    /// Degrees; -45, -22.5, 0, 22.5 and 45 are the canonical values.
    pub angle: f32,
    #[serde(default)]
    pub rescale: bool,
}

fn default_origin() -> [f32; 3] {
    [8.0, 8.0, 8.0]
}

impl ElementRotation {
    pub fn new(origin: [f32; 3], axis: Axis, angle: f32) -> Self {
        Self {
            origin,
            axis,
            angle,
            rescale: false,
        }
    }

    pub fn angle_radians(&self) -> f32 {
        self.angle.to_radians()
    }

    /// Scale applied to the two coordinates perpendicular to the axis.
    /// A fixed sqrt(2) whenever `rescale` is set, whatever the angle.
    pub fn rescale_factor(&self) -> f32 {
        if self.rescale {
            std::f32::consts::SQRT_2
        } else {
            1.0
        }
    }
}

/// Camera transform of one display context.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayTransform {
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default)]
    pub translation: [f32; 3],
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],
}

fn unit_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

impl Default for DisplayTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl DisplayTransform {
    pub const IDENTITY: DisplayTransform = DisplayTransform {
        rotation: [0.0; 3],
        translation: [0.0; 3],
        scale: [1.0; 3],
    };

    /// Default `gui` context: isometric three-quarter view.
    pub const GUI: DisplayTransform = DisplayTransform {
        rotation: [30.0, 225.0, 0.0],
        translation: [0.0; 3],
        scale: [0.625; 3],
    };

    pub fn new(rotation: [f32; 3], translation: [f32; 3], scale: [f32; 3]) -> Self {
        Self {
            rotation,
            translation,
            scale,
        }
    }
}
