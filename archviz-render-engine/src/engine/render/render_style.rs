//! Presentation style presets.
//!
//! Styles swap the material component on every model mesh. `Original`
//! reinstalls the handles backed up at load time, so toggling through Clay
//! or an analysis view and back is lossless.

use bevy::prelude::*;

use crate::engine::assets::model_container::{ModelContainer, ModelMesh, OriginalMaterial};
use crate::engine::render::analysis_materials::{DepthMaterial, HeightAnalysisMaterial};
use crate::rpc::web_rpc::WebRpcInterface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderStyle {
    #[default]
    Original,
    Clay,
    Blueprint,
    HeightAnalysis,
    Depth,
}

impl RenderStyle {
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "original" => Some(Self::Original),
            "clay" => Some(Self::Clay),
            "blueprint" => Some(Self::Blueprint),
            "height" | "height_analysis" => Some(Self::HeightAnalysis),
            "depth" => Some(Self::Depth),
            _ => None,
        }
    }

    pub fn to_string(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Clay => "clay",
            Self::Blueprint => "blueprint",
            Self::HeightAnalysis => "height_analysis",
            Self::Depth => "depth",
        }
    }
}

#[derive(Event)]
pub struct SetRenderStyleEvent {
    pub requested: String,
}

#[derive(Resource, Default)]
pub struct RenderStyleState {
    pub current: RenderStyle,
}

pub fn handle_render_style_events(
    mut events: EventReader<SetRenderStyleEvent>,
    mut state: ResMut<RenderStyleState>,
    container: Res<ModelContainer>,
    mesh_entities: Query<(Entity, &OriginalMaterial), With<ModelMesh>>,
    mut commands: Commands,
    mut std_materials: ResMut<Assets<StandardMaterial>>,
    mut height_materials: ResMut<Assets<HeightAnalysisMaterial>>,
    mut depth_materials: ResMut<Assets<DepthMaterial>>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    for event in events.read() {
        let Some(style) = RenderStyle::from_string(&event.requested) else {
            warn!("Unknown render style: {}", event.requested);
            continue;
        };
        state.current = style;

        apply_style(
            style,
            &container,
            &mesh_entities,
            &mut commands,
            &mut std_materials,
            &mut height_materials,
            &mut depth_materials,
        );

        rpc_interface.send_notification(
            "state_changed",
            serde_json::json!({ "key": "renderStyle", "value": style.to_string() }),
        );
    }
}

fn apply_style(
    style: RenderStyle,
    container: &ModelContainer,
    mesh_entities: &Query<(Entity, &OriginalMaterial), With<ModelMesh>>,
    commands: &mut Commands,
    std_materials: &mut Assets<StandardMaterial>,
    height_materials: &mut Assets<HeightAnalysisMaterial>,
    depth_materials: &mut Assets<DepthMaterial>,
) {
    // One shared preset handle per application, not one per mesh.
    let preset: Option<Handle<StandardMaterial>> = match style {
        RenderStyle::Clay => Some(std_materials.add(StandardMaterial {
            base_color: Color::srgb(0.82, 0.80, 0.77),
            perceptual_roughness: 1.0,
            ..default()
        })),
        RenderStyle::Blueprint => Some(std_materials.add(StandardMaterial {
            base_color: Color::srgb(0.12, 0.25, 0.55),
            unlit: true,
            ..default()
        })),
        _ => None,
    };

    for (entity, original) in mesh_entities {
        let mut entity_commands = commands.entity(entity);
        entity_commands
            .remove::<MeshMaterial3d<HeightAnalysisMaterial>>()
            .remove::<MeshMaterial3d<DepthMaterial>>();

        match style {
            RenderStyle::Original => {
                entity_commands.insert(MeshMaterial3d(original.0.clone()));
            }
            RenderStyle::Clay | RenderStyle::Blueprint => {
                if let Some(preset) = &preset {
                    entity_commands.insert(MeshMaterial3d(preset.clone()));
                }
            }
            RenderStyle::HeightAnalysis => {
                let (min_height, max_height) = container
                    .bounds
                    .map(|bounds| (bounds.min.y, bounds.max.y))
                    .unwrap_or((0.0, 10.0));
                entity_commands
                    .remove::<MeshMaterial3d<StandardMaterial>>()
                    .insert(MeshMaterial3d(
                        height_materials
                            .add(HeightAnalysisMaterial::over_range(min_height, max_height)),
                    ));
            }
            RenderStyle::Depth => {
                let far = (container.max_dimension * 4.0).max(10.0);
                entity_commands
                    .remove::<MeshMaterial3d<StandardMaterial>>()
                    .insert(MeshMaterial3d(
                        depth_materials.add(DepthMaterial::over_range(0.1, far)),
                    ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_strings_round_trip() {
        for style in [
            RenderStyle::Original,
            RenderStyle::Clay,
            RenderStyle::Blueprint,
            RenderStyle::HeightAnalysis,
            RenderStyle::Depth,
        ] {
            assert_eq!(RenderStyle::from_string(style.to_string()), Some(style));
        }
        assert_eq!(RenderStyle::from_string("watercolour"), None);
    }
}
