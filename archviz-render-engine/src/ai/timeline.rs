//! Playback of generated animation scripts.
//!
//! The parsed timeline drives the scene one step at a time: container
//! rotation interpolates between the step's endpoints, camera projection
//! switches, presets apply once on step entry, and the section cut sweeps a
//! plane through the model. Steps advance on wall-clock time from the ECS
//! clock.

use archviz_ai::animation::{CameraMode, ScriptAxis};
use archviz_ai::{AnimationScript, ScriptAction};
use bevy::prelude::*;

use crate::engine::assets::model_container::{
    LoadedModelRoot, MeshLocalBounds, ModelContainer, ModelMesh,
};
use crate::engine::camera::orbit_camera::CameraProjectionMode;
use crate::engine::render::render_style::SetRenderStyleEvent;
use crate::rpc::web_rpc::WebRpcInterface;
use crate::tools::hide::HiddenByTool;

#[derive(Resource, Default)]
pub struct AnimationTimeline {
    script: Option<AnimationScript>,
    step_index: usize,
    elapsed_in_step: f32,
    /// Step whose one-shot effects (presets, camera switch) already ran.
    entered_step: Option<usize>,
}

impl AnimationTimeline {
    pub fn play(&mut self, script: AnimationScript) {
        self.script = Some(script);
        self.step_index = 0;
        self.elapsed_in_step = 0.0;
        self.entered_step = None;
    }

    pub fn stop(&mut self) {
        *self = Self::default();
    }

    pub fn is_playing(&self) -> bool {
        self.script.is_some()
    }
}

/// Sweeping cut plane, expressed in raw model space at mesh granularity.
#[derive(Resource)]
pub struct SectionCutState {
    pub active: bool,
    pub axis: ScriptAxis,
    /// 0.0 = untouched model, 1.0 = fully cut away.
    pub progress: f32,
}

impl Default for SectionCutState {
    fn default() -> Self {
        Self {
            active: false,
            axis: ScriptAxis::Y,
            progress: 0.0,
        }
    }
}

fn axis_index(axis: ScriptAxis) -> usize {
    match axis {
        ScriptAxis::X => 0,
        ScriptAxis::Y => 1,
        ScriptAxis::Z => 2,
    }
}

/// Mesh-granularity cut test: the plane sweeps from the top of the bounds
/// downward along the axis; a mesh disappears once its centre passes above
/// the plane.
pub fn section_keeps_visible(centre: f32, min: f32, max: f32, progress: f32) -> bool {
    let cutoff = max - (max - min) * progress.clamp(0.0, 1.0);
    centre <= cutoff
}

pub fn timeline_playback_system(
    time: Res<Time>,
    mut timeline: ResMut<AnimationTimeline>,
    mut projection_mode: ResMut<CameraProjectionMode>,
    mut section: ResMut<SectionCutState>,
    mut style_events: EventWriter<SetRenderStyleEvent>,
    mut roots: Query<&mut Transform, With<LoadedModelRoot>>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    let Some(script) = timeline.script.as_ref() else {
        return;
    };

    let Some(step) = script.timeline.get(timeline.step_index).cloned() else {
        timeline.stop();
        section.active = false;
        rpc_interface.send_notification("timeline_finished", serde_json::json!({}));
        return;
    };

    let duration = step.duration.max(f32::EPSILON);
    let progress = (timeline.elapsed_in_step / duration).clamp(0.0, 1.0);
    let entering = timeline.entered_step != Some(timeline.step_index);
    if entering {
        timeline.entered_step = Some(timeline.step_index);
    }

    match &step.action {
        ScriptAction::SetCamera { mode } => {
            if entering {
                *projection_mode = match mode {
                    CameraMode::Ortho => CameraProjectionMode::Orthographic,
                    CameraMode::Persp => CameraProjectionMode::Perspective,
                };
            }
        }
        ScriptAction::ApplyPreset { name } => {
            if entering {
                style_events.write(SetRenderStyleEvent {
                    requested: name.clone(),
                });
            }
        }
        ScriptAction::RotateObject { axis, from, to } => {
            let angle = (from + (to - from) * progress).to_radians();
            let axis_vector = match axis {
                ScriptAxis::X => Vec3::X,
                ScriptAxis::Y => Vec3::Y,
                ScriptAxis::Z => Vec3::Z,
            };
            for mut transform in &mut roots {
                transform.rotation = Quat::from_axis_angle(axis_vector, angle);
            }
        }
        ScriptAction::SectionCut { axis, from, to } => {
            section.active = true;
            section.axis = *axis;
            // Script values are percentages of the bounds.
            section.progress = ((from + (to - from) * progress) / 100.0).clamp(0.0, 1.0);
        }
    }

    timeline.elapsed_in_step += time.delta_secs();
    if timeline.elapsed_in_step >= duration {
        timeline.step_index += 1;
        timeline.elapsed_in_step = 0.0;
    }
}

/// Apply the cut plane to per-mesh visibility. Meshes the hide tool put
/// away stay hidden regardless.
pub fn section_cut_system(
    section: Res<SectionCutState>,
    container: Res<ModelContainer>,
    mut meshes: Query<
        (&MeshLocalBounds, &mut Visibility),
        (With<ModelMesh>, Without<HiddenByTool>),
    >,
) {
    if !section.is_changed() {
        return;
    }
    let Some(model_bounds) = container.raw_bounds else {
        return;
    };

    if !section.active {
        for (_, mut visibility) in &mut meshes {
            *visibility = Visibility::Inherited;
        }
        return;
    }

    let axis = axis_index(section.axis);
    let (min, max) = model_bounds.axis_range(axis);
    for (MeshLocalBounds(bounds), mut visibility) in &mut meshes {
        let centre = bounds.center()[axis];
        *visibility = if section_keeps_visible(centre, min, max, section.progress) {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_sweep_hides_top_first() {
        // Model spanning 0..10; plane at progress 0.3 sits at 7.
        assert!(section_keeps_visible(5.0, 0.0, 10.0, 0.3));
        assert!(!section_keeps_visible(8.0, 0.0, 10.0, 0.3));
        // Untouched and fully-cut extremes.
        assert!(section_keeps_visible(9.9, 0.0, 10.0, 0.0));
        assert!(!section_keeps_visible(0.1, 0.0, 10.0, 1.0));
    }

    #[test]
    fn play_resets_cursor() {
        let mut timeline = AnimationTimeline::default();
        timeline.step_index = 4;
        timeline.elapsed_in_step = 1.5;
        timeline.play(AnimationScript::default());
        assert_eq!(timeline.step_index, 0);
        assert_eq!(timeline.elapsed_in_step, 0.0);
        assert!(timeline.is_playing());
    }
}
