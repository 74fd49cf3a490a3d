//! Ruler tool: two-click distance measurement with live hover preview.
//!
//! Hover tracking raycasts the NDC pointer sample against the loaded
//! model's mesh bounds, falling back to the ground plane. Only this tool
//! consumes pointer motion for hit-testing; orbit drag belongs to the
//! camera controller.

use bevy::prelude::*;
use constants::render_settings::{MEASURE_LINE_WIDTH, MEASURE_MARKER_SIZE};
use serde::{Deserialize, Serialize};

use crate::engine::assets::model_container::{MeshLocalBounds, ModelMesh};
use crate::rpc::web_rpc::WebRpcInterface;
use crate::tools::pointer::PointerNdc;
use crate::tools::ray::{ndc_ray, ray_ground_plane, ray_obb_intersection};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measurement {
    pub id: u32,
    pub start: Vec3,
    pub end: Vec3,
    pub distance: f32,
}

#[derive(Resource, Default)]
pub struct MeasureTool {
    is_active: bool,
    pub start_point: Option<Vec3>,
    pub preview_point: Option<Vec3>,
    pub next_id: u32,
    pub current: Option<Measurement>,
}

impl MeasureTool {
    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
        if !active {
            self.start_point = None;
            self.preview_point = None;
            self.current = None;
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }
}

#[derive(Component)]
pub struct MeasurePreview;

#[derive(Component)]
pub struct CompletedMeasurementTag;

/// Nearest hit over a set of oriented boxes, by entry distance.
pub fn nearest_box_hit<'a>(
    origin: Vec3,
    direction: Vec3,
    boxes: impl Iterator<Item = (&'a GlobalTransform, &'a MeshLocalBounds)>,
) -> Option<Vec3> {
    let mut best: Option<f32> = None;
    for (transform, MeshLocalBounds(bounds)) in boxes {
        if let Some(t) =
            ray_obb_intersection(origin, direction, transform, bounds.min, bounds.max)
        {
            if t > 0.0 && best.is_none_or(|current| t < current) {
                best = Some(t);
            }
        }
    }
    best.map(|t| origin + direction * t)
}

// Input/logic: click to start, move to preview, click to finish.
// Starting a new measurement drops the previous one.
pub fn measure_tool_system(
    mut measure_tool: ResMut<MeasureTool>,
    pointer: Res<PointerNdc>,
    mouse: Res<ButtonInput<MouseButton>>,
    cameras: Query<(&GlobalTransform, &Camera), With<Camera3d>>,
    mesh_boxes: Query<(&GlobalTransform, &MeshLocalBounds), With<ModelMesh>>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    if !measure_tool.is_active() {
        return;
    }
    let Ok((camera_transform, camera)) = cameras.single() else {
        return;
    };
    let Some(ndc) = pointer.ndc else {
        measure_tool.preview_point = None;
        return;
    };
    let Some(ray) = ndc_ray(camera, camera_transform, ndc) else {
        return;
    };

    // Model surface first, ground plane as fallback.
    let direction = ray.direction.as_vec3();
    let hit = nearest_box_hit(ray.origin, direction, mesh_boxes.iter())
        .or_else(|| ray_ground_plane(ray.origin, direction, 0.0));
    measure_tool.preview_point = hit;
    let Some(hit) = hit else {
        return;
    };

    if mouse.just_pressed(MouseButton::Left) {
        match measure_tool.start_point {
            None => {
                // Drop a previous completed measurement before starting anew.
                if measure_tool.current.take().is_some() {
                    rpc_interface.send_notification("measure_clear", serde_json::json!({}));
                }
                measure_tool.start_point = Some(hit);
                rpc_interface.send_notification(
                    "measure_started",
                    serde_json::json!({ "position": [hit.x, hit.y, hit.z] }),
                );
            }
            Some(start) => {
                let measurement = Measurement {
                    id: measure_tool.next_id,
                    start,
                    end: hit,
                    distance: start.distance(hit),
                };
                measure_tool.next_id += 1;
                rpc_interface.send_notification(
                    "measure_completed",
                    serde_json::json!({
                        "id": measurement.id,
                        "start": [measurement.start.x, measurement.start.y, measurement.start.z],
                        "end": [measurement.end.x, measurement.end.y, measurement.end.z],
                        "distance": measurement.distance,
                    }),
                );
                measure_tool.current = Some(measurement);
                measure_tool.start_point = None;
                measure_tool.preview_point = None;
            }
        }
        return;
    }

    // Live distance while a measurement is underway.
    if let Some(start) = measure_tool.start_point {
        rpc_interface.send_notification(
            "measure_updated",
            serde_json::json!({
                "start": [start.x, start.y, start.z],
                "end": [hit.x, hit.y, hit.z],
                "distance": start.distance(hit),
            }),
        );
    }
}

// Renderer: clears previous helper meshes each frame, rebuilds from state.
pub fn update_measure_render(
    mut commands: Commands,
    measure_tool: Res<MeasureTool>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    existing_preview: Query<Entity, With<MeasurePreview>>,
    existing_completed: Query<Entity, With<CompletedMeasurementTag>>,
) {
    for entity in &existing_preview {
        commands.entity(entity).despawn();
    }
    for entity in &existing_completed {
        commands.entity(entity).despawn();
    }

    let marker_material = |materials: &mut Assets<StandardMaterial>, color: Color| {
        materials.add(StandardMaterial {
            base_color: color,
            emissive: LinearRgba::new(1.0, 1.0, 0.2, 1.0),
            unlit: true,
            ..default()
        })
    };

    if let Some(preview) = measure_tool.preview_point {
        commands.spawn((
            Mesh3d(meshes.add(Sphere::new(MEASURE_MARKER_SIZE))),
            MeshMaterial3d(marker_material(&mut materials, Color::srgb(1.0, 1.0, 0.2))),
            Transform::from_translation(preview),
            MeasurePreview,
        ));
    }

    if let (Some(start), Some(preview)) = (measure_tool.start_point, measure_tool.preview_point) {
        spawn_measure_line(
            &mut commands,
            &mut meshes,
            &mut materials,
            start,
            preview,
            Color::srgb(1.0, 1.0, 0.2),
            MeasurePreview,
        );
    }

    if let Some(measurement) = &measure_tool.current {
        spawn_measure_line(
            &mut commands,
            &mut meshes,
            &mut materials,
            measurement.start,
            measurement.end,
            Color::srgb(1.0, 0.27, 0.0),
            CompletedMeasurementTag,
        );
    }
}

fn spawn_measure_line<M: Component>(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    start: Vec3,
    end: Vec3,
    color: Color,
    marker: M,
) {
    let span = end - start;
    let length = span.length();
    if length < 0.005 {
        return;
    }
    let midpoint = (start + end) * 0.5;
    let rotation = Quat::from_rotation_arc(Vec3::X, span / length);
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(length, MEASURE_LINE_WIDTH, MEASURE_LINE_WIDTH))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: color,
            emissive: LinearRgba::new(1.0, 0.5, 0.1, 1.0),
            unlit: true,
            ..default()
        })),
        Transform::from_translation(midpoint).with_rotation(rotation),
        marker,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::bounds::ModelBounds;

    #[test]
    fn deactivation_clears_transient_state() {
        let mut tool = MeasureTool::default();
        tool.set_active(true);
        tool.start_point = Some(Vec3::ONE);
        tool.preview_point = Some(Vec3::ZERO);
        tool.set_active(false);
        assert!(tool.start_point.is_none());
        assert!(tool.preview_point.is_none());
        assert!(tool.current.is_none());
    }

    #[test]
    fn nearest_hit_picks_closest_box() {
        let unit = ModelBounds {
            min: Vec3::splat(-0.5),
            max: Vec3::splat(0.5),
        };
        let near = GlobalTransform::from(Transform::from_xyz(0.0, 0.0, 2.0));
        let far = GlobalTransform::from(Transform::from_xyz(0.0, 0.0, -3.0));
        let near_bounds = MeshLocalBounds(unit);
        let far_bounds = MeshLocalBounds(unit);
        let boxes = [(&near, &near_bounds), (&far, &far_bounds)];

        let hit = nearest_box_hit(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::NEG_Z,
            boxes.iter().map(|(t, b)| (*t, *b)),
        )
        .unwrap();
        assert!((hit.z - 2.5).abs() < 1e-5);
    }
}
