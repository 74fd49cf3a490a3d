use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::math::EulerRot;
use bevy::prelude::*;
use bevy::render::camera::ScalingMode;
use bevy::window::PrimaryWindow;
use constants::render_settings::CAMERA_DAMPING;

use crate::engine::assets::bounds::ModelBounds;

/// Copy of the live camera state, saved and restored on demand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSnapshot {
    pub position: Vec3,
    pub target: Vec3,
    pub zoom: f32,
}

/// Orbit controller around a focus target. Tools flip `enabled` on mode
/// transitions; the per-frame controller only reads input while enabled.
#[derive(Resource)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub enabled: bool,
    /// Damping factor for the lerp toward the target pose.
    pub damping: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            yaw: std::f32::consts::FRAC_PI_4,
            pitch: -0.6,
            distance: 60.0,
            enabled: true,
            damping: CAMERA_DAMPING,
        }
    }
}

impl OrbitCamera {
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Camera position implied by target/yaw/pitch/distance.
    pub fn position(&self) -> Vec3 {
        self.target + self.rotation() * Vec3::Z * self.distance
    }

    /// Pure read of the current pose; no side effect on the live camera.
    pub fn snapshot(&self) -> ViewportSnapshot {
        ViewportSnapshot {
            position: self.position(),
            target: self.target,
            zoom: self.distance,
        }
    }

    /// Write a snapshot back and recompute yaw/pitch from the stored
    /// position so the next controller frame reproduces it exactly.
    pub fn restore(&mut self, snapshot: &ViewportSnapshot) {
        self.target = snapshot.target;
        self.distance = snapshot.zoom.max(0.01);
        let offset = snapshot.position - snapshot.target;
        if offset.length_squared() > 1e-10 {
            let direction = offset / self.distance;
            self.pitch = (-direction.y).clamp(-1.0, 1.0).asin();
            self.yaw = direction.x.atan2(direction.z);
        }
    }

    /// Re-frame after a load so the whole model is in view.
    pub fn frame(&mut self, bounds: &ModelBounds) {
        self.target = bounds.center();
        self.distance = (bounds.max_dimension() * 1.8).clamp(0.5, 5000.0);
    }
}

/// Projection selection, driven by the RPC surface and animation scripts.
/// Architectural analysis views default to orthographic.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraProjectionMode {
    #[default]
    Orthographic,
    Perspective,
}

pub fn camera_controller(
    mut camera_query: Query<(&mut Transform, &mut Projection), With<Camera3d>>,
    mut orbit: ResMut<OrbitCamera>,
    projection_mode: Res<CameraProjectionMode>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll_events: EventReader<MouseWheel>,
    windows: Query<&Window, With<PrimaryWindow>>,
    time: Res<Time>,
) {
    let Ok((mut camera_transform, mut projection)) = camera_query.single_mut() else {
        return;
    };

    let mouse_delta: Vec2 = mouse_motion.read().map(|motion| motion.delta).sum();

    let mut scroll_accum = 0.0;
    for event in scroll_events.read() {
        scroll_accum += match event.unit {
            MouseScrollUnit::Line => event.y,
            MouseScrollUnit::Pixel => event.y * 0.05,
        };
    }

    if orbit.enabled {
        // Left drag orbits, right/middle drag pans.
        if mouse_button.pressed(MouseButton::Left) && mouse_delta != Vec2::ZERO {
            orbit.yaw -= mouse_delta.x * 0.0035;
            orbit.pitch -= mouse_delta.y * 0.0030;
            orbit.pitch = orbit.pitch.clamp(-1.55, 1.55);
        }

        let panning = mouse_button.pressed(MouseButton::Right)
            || mouse_button.pressed(MouseButton::Middle);
        if panning && mouse_delta != Vec2::ZERO {
            if let Ok(window) = windows.single() {
                let pan_speed = orbit.distance / window.height().max(1.0);
                let right = orbit.rotation() * Vec3::X;
                let up = orbit.rotation() * Vec3::Y;
                orbit.target += (-right * mouse_delta.x + up * mouse_delta.y) * pan_speed;
            }
        }

        if scroll_accum.abs() > f32::EPSILON {
            let factor = 1.0 - scroll_accum * 0.1;
            orbit.distance = (orbit.distance * factor.clamp(0.5, 2.0)).clamp(0.05, 5000.0);
        }
    }

    // Damped approach to the target pose; restore converges on the exact
    // saved transform because yaw/pitch/distance are recovered losslessly.
    let lerp = (orbit.damping * 60.0 * time.delta_secs()).min(1.0);
    let target_position = orbit.position();
    let target_rotation = orbit.rotation();
    camera_transform.translation = camera_transform.translation.lerp(target_position, lerp);
    camera_transform.rotation = camera_transform.rotation.slerp(target_rotation, lerp);

    match *projection_mode {
        CameraProjectionMode::Orthographic => {
            let mut ortho = OrthographicProjection::default_3d();
            ortho.scaling_mode = ScalingMode::FixedVertical {
                viewport_height: orbit.distance,
            };
            *projection = Projection::Orthographic(ortho);
        }
        CameraProjectionMode::Perspective => {
            if !matches!(*projection, Projection::Perspective(_)) {
                *projection = Projection::Perspective(PerspectiveProjection::default());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_restore_roundtrip_is_lossless() {
        let mut orbit = OrbitCamera {
            target: Vec3::new(3.0, 1.0, -2.0),
            yaw: 0.8,
            pitch: -0.4,
            distance: 25.0,
            ..Default::default()
        };
        let saved = orbit.snapshot();

        // Wander off, then restore.
        orbit.target = Vec3::ZERO;
        orbit.yaw = -2.0;
        orbit.pitch = 0.9;
        orbit.distance = 4.0;
        orbit.restore(&saved);

        assert!((orbit.snapshot().position - saved.position).length() < 1e-4);
        assert!((orbit.snapshot().target - saved.target).length() < 1e-6);
        assert_eq!(orbit.snapshot().zoom, saved.zoom);
    }

    #[test]
    fn save_is_a_pure_read() {
        let orbit = OrbitCamera::default();
        let before = (orbit.target, orbit.yaw, orbit.pitch, orbit.distance);
        let _ = orbit.snapshot();
        assert_eq!(
            before,
            (orbit.target, orbit.yaw, orbit.pitch, orbit.distance)
        );
    }

    #[test]
    fn framing_centres_on_model() {
        let mut orbit = OrbitCamera::default();
        orbit.frame(&ModelBounds {
            min: Vec3::new(-5.0, 0.0, -5.0),
            max: Vec3::new(5.0, 20.0, 5.0),
        });
        assert_eq!(orbit.target, Vec3::new(0.0, 10.0, 0.0));
        assert!((orbit.distance - 36.0).abs() < 1e-4);
    }
}
