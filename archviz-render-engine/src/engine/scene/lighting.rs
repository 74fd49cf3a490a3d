//! Architectural lighting rig: one shadow-casting sun plus ambient fill.

use bevy::pbr::DirectionalLightShadowMap;
use bevy::prelude::*;
use constants::device::DeviceClass;
use constants::render_settings::SHADOW_MAP_RESOLUTION;

pub fn spawn_lighting(commands: &mut Commands, device: DeviceClass) {
    // Mobile GPUs get a cheaper shadow map.
    let shadow_resolution = if device.is_mobile() {
        SHADOW_MAP_RESOLUTION / 2
    } else {
        SHADOW_MAP_RESOLUTION
    };
    commands.insert_resource(DirectionalLightShadowMap {
        size: shadow_resolution as usize,
    });

    commands.spawn((
        DirectionalLight {
            illuminance: 18_000.0,
            shadows_enabled: true,
            shadow_depth_bias: 0.05,
            ..default()
        },
        Transform::from_xyz(100.0, 150.0, 100.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.insert_resource(AmbientLight {
        color: Color::srgb(0.8, 0.8, 0.85),
        brightness: 220.0,
        ..default()
    });
}
