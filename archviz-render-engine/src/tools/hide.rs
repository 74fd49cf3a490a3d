//! Hide tool: click to hide individual meshes of the loaded model.
//!
//! Hidden meshes keep their entities; leaving the mode restores everything,
//! so visibility edits never outlive the tool session.

use bevy::prelude::*;

use crate::engine::assets::model_container::{MeshLocalBounds, ModelMesh};
use crate::rpc::web_rpc::WebRpcInterface;
use crate::tools::pointer::PointerNdc;
use crate::tools::ray::{ndc_ray, ray_obb_intersection};

#[derive(Resource, Default)]
pub struct HideTool {
    is_active: bool,
    pub restore_requested: bool,
}

impl HideTool {
    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
        if !active {
            self.restore_requested = true;
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }
}

#[derive(Component)]
pub struct HiddenByTool;

pub fn hide_click_system(
    hide_tool: Res<HideTool>,
    pointer: Res<PointerNdc>,
    mouse: Res<ButtonInput<MouseButton>>,
    cameras: Query<(&GlobalTransform, &Camera), With<Camera3d>>,
    mut meshes: Query<
        (Entity, &GlobalTransform, &MeshLocalBounds, &mut Visibility),
        (With<ModelMesh>, Without<HiddenByTool>),
    >,
    hidden: Query<(), With<HiddenByTool>>,
    mut commands: Commands,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    if !hide_tool.is_active() || !mouse.just_pressed(MouseButton::Left) {
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
    let direction = ray.direction.as_vec3();

    // Nearest still-visible mesh under the cursor.
    let mut best: Option<(Entity, f32)> = None;
    for (entity, transform, MeshLocalBounds(bounds), _) in &meshes {
        if let Some(t) =
            ray_obb_intersection(ray.origin, direction, transform, bounds.min, bounds.max)
        {
            if t > 0.0 && best.is_none_or(|(_, current)| t < current) {
                best = Some((entity, t));
            }
        }
    }

    let Some((entity, _)) = best else {
        return;
    };
    if let Ok((_, _, _, mut visibility)) = meshes.get_mut(entity) {
        *visibility = Visibility::Hidden;
        commands.entity(entity).insert(HiddenByTool);
        rpc_interface.send_notification(
            "visibility_changed",
            serde_json::json!({ "hidden": hidden.iter().count() + 1 }),
        );
    }
}

/// Exit-hook cleanup: everything the tool hid becomes visible again.
pub fn hide_restore_system(
    mut hide_tool: ResMut<HideTool>,
    mut hidden: Query<(Entity, &mut Visibility), With<HiddenByTool>>,
    mut commands: Commands,
) {
    if !hide_tool.restore_requested {
        return;
    }
    hide_tool.restore_requested = false;
    for (entity, mut visibility) in &mut hidden {
        *visibility = Visibility::Inherited;
        commands.entity(entity).remove::<HiddenByTool>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deactivation_schedules_restore() {
        let mut tool = HideTool::default();
        tool.set_active(true);
        assert!(tool.is_active());
        tool.set_active(false);
        assert!(tool.restore_requested);
    }
}
