//! Move tool: select the loaded model and drag it along the ground plane.
//!
//! Click-select raycasts against the container's oriented bounds; while the
//! button stays down the root follows the ground-plane hit, keeping the
//! offset grabbed at click time. Scroll or Q/E rotates the selection about
//! the vertical axis.

use bevy::input::mouse::MouseWheel;
use bevy::prelude::*;
use constants::render_settings::SELECTION_COLOR;

use crate::engine::assets::model_container::{LoadedModelRoot, ModelContainer};
use crate::rpc::web_rpc::WebRpcInterface;
use crate::tools::pointer::PointerNdc;
use crate::tools::ray::{ndc_ray, ray_ground_plane, ray_obb_intersection};
use crate::tools::tool_manager::InteractionState;

const ROTATE_KEY_SPEED: f32 = 1.2;
const ROTATE_SCROLL_SPEED: f32 = 0.08;

#[derive(Resource, Default)]
pub struct MoveTool {
    is_active: bool,
    pub dragging: bool,
    pub drag_offset: Vec3,
    pub clear_requested: bool,
}

impl MoveTool {
    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
        if !active {
            self.dragging = false;
            self.clear_requested = true;
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }
}

/// Present on the container root while it is selected for manipulation.
#[derive(Component)]
pub struct Selected;

pub fn move_select_system(
    mut move_tool: ResMut<MoveTool>,
    mut state: ResMut<InteractionState>,
    pointer: Res<PointerNdc>,
    mouse: Res<ButtonInput<MouseButton>>,
    keyboard: Res<ButtonInput<KeyCode>>,
    cameras: Query<(&GlobalTransform, &Camera), With<Camera3d>>,
    container: Res<ModelContainer>,
    roots: Query<&GlobalTransform, With<LoadedModelRoot>>,
    mut commands: Commands,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    if !move_tool.is_active() {
        return;
    }

    if mouse.just_released(MouseButton::Left) {
        move_tool.dragging = false;
    }
    if keyboard.just_pressed(KeyCode::Escape) {
        move_tool.clear_requested = true;
        return;
    }
    if !mouse.just_pressed(MouseButton::Left) {
        return;
    }

    let (Some(root), Some(bounds)) = (container.root, container.bounds) else {
        return;
    };
    let Ok(root_transform) = roots.get(root) else {
        return;
    };
    let Ok((camera_transform, camera)) = cameras.single() else {
        return;
    };
    let Some(ndc) = pointer.ndc else {
        return;
    };
    let Some(ray) = ndc_ray(camera, camera_transform, ndc) else {
        return;
    };

    let direction = ray.direction.as_vec3();
    let hit = ray_obb_intersection(ray.origin, direction, root_transform, bounds.min, bounds.max);

    if hit.is_some() {
        commands.entity(root).insert(Selected);
        state.selection = vec![root];
        move_tool.dragging = true;
        // Grab offset between the root and where the drag ray meets the ground.
        if let Some(ground) = ray_ground_plane(ray.origin, direction, 0.0) {
            move_tool.drag_offset = root_transform.translation() - ground;
        } else {
            move_tool.drag_offset = Vec3::ZERO;
        }
        rpc_interface.send_notification(
            "state_changed",
            serde_json::json!({ "key": "selection", "value": true }),
        );
    } else {
        move_tool.clear_requested = true;
    }
}

pub fn move_drag_system(
    move_tool: Res<MoveTool>,
    pointer: Res<PointerNdc>,
    mouse: Res<ButtonInput<MouseButton>>,
    cameras: Query<(&GlobalTransform, &Camera), With<Camera3d>>,
    mut roots: Query<&mut Transform, (With<LoadedModelRoot>, With<Selected>)>,
) {
    if !move_tool.is_active() || !move_tool.dragging || !mouse.pressed(MouseButton::Left) {
        return;
    }
    let Ok((camera_transform, camera)) = cameras.single() else {
        return;
    };
    let Some(ndc) = pointer.ndc else {
        return;
    };
    let Some(ray) = ndc_ray(camera, camera_transform, ndc) else {
        return;
    };
    let Some(ground) = ray_ground_plane(ray.origin, ray.direction.as_vec3(), 0.0) else {
        return;
    };

    for mut transform in &mut roots {
        let y = transform.translation.y;
        transform.translation = ground + move_tool.drag_offset;
        transform.translation.y = y;
    }
}

pub fn move_rotate_system(
    move_tool: Res<MoveTool>,
    keyboard: Res<ButtonInput<KeyCode>>,
    mut scroll_events: EventReader<MouseWheel>,
    time: Res<Time>,
    mut roots: Query<&mut Transform, (With<LoadedModelRoot>, With<Selected>)>,
) {
    if !move_tool.is_active() {
        scroll_events.clear();
        return;
    }

    let mut angle = 0.0;
    for event in scroll_events.read() {
        angle += event.y * ROTATE_SCROLL_SPEED;
    }
    if keyboard.pressed(KeyCode::KeyQ) {
        angle -= ROTATE_KEY_SPEED * time.delta_secs();
    }
    if keyboard.pressed(KeyCode::KeyE) {
        angle += ROTATE_KEY_SPEED * time.delta_secs();
    }
    if angle == 0.0 {
        return;
    }

    for mut transform in &mut roots {
        transform.rotate_y(angle);
    }
}

/// Deferred deselection; also runs the exit-hook cleanup when the tool
/// deactivates mid-drag.
pub fn apply_selection_clear(
    mut move_tool: ResMut<MoveTool>,
    mut state: ResMut<InteractionState>,
    selected: Query<Entity, With<Selected>>,
    mut commands: Commands,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    if !move_tool.clear_requested {
        return;
    }
    move_tool.clear_requested = false;
    move_tool.dragging = false;

    let had_selection = !selected.is_empty() || !state.selection.is_empty();
    for entity in &selected {
        commands.entity(entity).remove::<Selected>();
    }
    state.selection.clear();

    if had_selection {
        rpc_interface.send_notification(
            "state_changed",
            serde_json::json!({ "key": "selection", "value": false }),
        );
    }
}

/// Outline the selection bounds so manipulation has visible feedback.
pub fn highlight_selection(
    mut gizmos: Gizmos,
    container: Res<ModelContainer>,
    roots: Query<&GlobalTransform, (With<LoadedModelRoot>, With<Selected>)>,
) {
    let Some(bounds) = container.bounds else {
        return;
    };
    for transform in &roots {
        let outline = Transform::from_matrix(transform.compute_matrix()).mul_transform(
            Transform {
                translation: bounds.center(),
                scale: bounds.size(),
                ..default()
            },
        );
        gizmos.cuboid(outline, SELECTION_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deactivation_requests_cleanup() {
        let mut tool = MoveTool::default();
        tool.set_active(true);
        tool.dragging = true;
        tool.set_active(false);
        assert!(!tool.dragging);
        assert!(tool.clear_requested);
    }
}
