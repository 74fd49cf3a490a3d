//! Analysis shader materials.
//!
//! Two custom fragment programs over the standard mesh pipeline: a height
//! heat-map (blue→cyan→green→yellow→red over world height, for massing
//! analysis) and a linear camera-distance depth view. Parameters are packed
//! into a single vec4 uniform each to keep the bind layout minimal.

use bevy::prelude::*;
use bevy::render::render_resource::{AsBindGroup, ShaderRef};

/// Heat-map over world-space height.
/// params = (min_height, max_height, axis, unused); axis 0 = Y, 1 = Z.
#[derive(Asset, TypePath, AsBindGroup, Debug, Clone)]
pub struct HeightAnalysisMaterial {
    #[uniform(0)]
    pub params: Vec4,
}

impl HeightAnalysisMaterial {
    pub fn over_range(min_height: f32, max_height: f32) -> Self {
        Self {
            params: Vec4::new(min_height, max_height, 0.0, 0.0),
        }
    }
}

impl Material for HeightAnalysisMaterial {
    fn fragment_shader() -> ShaderRef {
        "shaders/height_analysis.wgsl".into()
    }
}

/// Linear depth from the camera.
/// params = (near, far, unused, unused).
#[derive(Asset, TypePath, AsBindGroup, Debug, Clone)]
pub struct DepthMaterial {
    #[uniform(0)]
    pub params: Vec4,
}

impl DepthMaterial {
    pub fn over_range(near: f32, far: f32) -> Self {
        Self {
            params: Vec4::new(near, far, 0.0, 0.0),
        }
    }
}

impl Material for DepthMaterial {
    fn fragment_shader() -> ShaderRef {
        "shaders/depth.wgsl".into()
    }
}
