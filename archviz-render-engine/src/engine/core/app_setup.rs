//! Application assembly: plugins, resources, schedules, scene setup.

use bevy::asset::AssetMetaCheck;
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::prelude::*;
use bevy::render::camera::ScalingMode;
use bevy::window::PrimaryWindow;
use bevy_common_assets::json::JsonAssetPlugin;
use constants::device::{DeviceClass, classify_device};
use constants::render_settings::BACKGROUND_COLOR;

use crate::ai::bridge::{
    AiBridge, GenerateAnimationEvent, GenerateExportEvent, handle_generate_animation_events,
    poll_ai_results,
};
use crate::ai::export::{PendingExport, handle_generate_export_events, submit_capture_system};
use crate::ai::timeline::{
    AnimationTimeline, SectionCutState, section_cut_system, timeline_playback_system,
};
use crate::engine::assets::model_container::ModelContainer;
use crate::engine::camera::orbit_camera::{CameraProjectionMode, OrbitCamera, camera_controller};
use crate::engine::core::settings::{
    DefaultUnit, SettingsLoader, ViewerSettings, apply_settings_when_ready, start_settings_load,
};
use crate::engine::core::window_config::create_window_config;
use crate::engine::loading::model_loader::{
    ModelLoadRequest, ModelLoadState, begin_model_load, complete_model_load,
};
use crate::engine::render::analysis_materials::{DepthMaterial, HeightAnalysisMaterial};
use crate::engine::render::pixelate_post_processing::{
    PixelatePostProcessPlugin, PixelateSettings,
};
use crate::engine::render::render_style::{
    RenderStyleState, SetRenderStyleEvent, handle_render_style_events,
};
use crate::engine::scene::grid::spawn_ground_grid;
use crate::engine::scene::lighting::spawn_lighting;
use crate::engine::systems::fps_tracking::{
    FpsText, fps_notification_system, fps_text_update_system,
};
use crate::rpc::web_rpc::WebRpcPlugin;
use crate::tools::hide::{HideTool, hide_click_system, hide_restore_system};
use crate::tools::measure::{MeasureTool, measure_tool_system, update_measure_render};
use crate::tools::move_tool::{
    MoveTool, apply_selection_clear, highlight_selection, move_drag_system, move_rotate_system,
    move_select_system,
};
use crate::tools::pointer::{PointerNdc, pointer_ndc_system};
use crate::tools::tool_manager::{
    InteractionState, RestoreViewportEvent, SaveViewportEvent, ToolModeEvent,
    handle_tool_keyboard_shortcuts, handle_tool_mode_events, handle_viewport_events,
};

pub fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        .add_plugins(FrameTimeDiagnosticsPlugin::default())
        .add_plugins(JsonAssetPlugin::<ViewerSettings>::new(&["json"]))
        .add_plugins(MaterialPlugin::<HeightAnalysisMaterial>::default())
        .add_plugins(MaterialPlugin::<DepthMaterial>::default())
        .add_plugins(PixelatePostProcessPlugin)
        .add_plugins(WebRpcPlugin);

    app.add_event::<ToolModeEvent>()
        .add_event::<SaveViewportEvent>()
        .add_event::<RestoreViewportEvent>()
        .add_event::<ModelLoadRequest>()
        .add_event::<SetRenderStyleEvent>()
        .add_event::<GenerateAnimationEvent>()
        .add_event::<GenerateExportEvent>();

    app.insert_resource(ClearColor(BACKGROUND_COLOR))
        .init_resource::<InteractionState>()
        .init_resource::<OrbitCamera>()
        .init_resource::<CameraProjectionMode>()
        .init_resource::<PointerNdc>()
        .init_resource::<MeasureTool>()
        .init_resource::<MoveTool>()
        .init_resource::<HideTool>()
        .init_resource::<ModelContainer>()
        .init_resource::<ModelLoadState>()
        .init_resource::<RenderStyleState>()
        .init_resource::<AnimationTimeline>()
        .init_resource::<SectionCutState>()
        .init_resource::<AiBridge>()
        .init_resource::<PendingExport>()
        .init_resource::<SettingsLoader>()
        .init_resource::<DefaultUnit>();

    app.add_systems(Startup, (setup_scene, start_settings_load));

    // Input and state transitions run in order: pointer sample first, then
    // mode changes, then the camera reacts.
    app.add_systems(
        Update,
        (
            pointer_ndc_system,
            handle_tool_keyboard_shortcuts,
            handle_tool_mode_events,
            handle_viewport_events,
            camera_controller,
            apply_settings_when_ready,
        )
            .chain(),
    );

    app.add_systems(
        Update,
        (
            measure_tool_system,
            update_measure_render,
            move_select_system,
            move_drag_system,
            move_rotate_system,
            apply_selection_clear,
            highlight_selection,
            hide_click_system,
            hide_restore_system,
        ),
    );

    app.add_systems(
        Update,
        (
            begin_model_load,
            complete_model_load,
            handle_render_style_events,
            handle_generate_animation_events,
            handle_generate_export_events,
            submit_capture_system,
            poll_ai_results,
            timeline_playback_system,
            section_cut_system,
            fps_notification_system,
            fps_text_update_system,
        ),
    );

    app
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    DefaultPlugins.set(window_config).set(asset_config)
}

/// One-time scene construction, including the device classification the
/// interaction layer branches on. Classification is computed here once and
/// deliberately not re-evaluated on resize.
fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut state: ResMut<InteractionState>,
) {
    let width = windows
        .single()
        .map(|window| window.width())
        .unwrap_or(1920.0);
    let device = classify_device(width, touch_capable());
    state.device = device;
    info!("device class: {}", device.to_string());

    spawn_lighting(&mut commands, device);
    spawn_ground_grid(&mut commands, &mut meshes, &mut materials);
    spawn_camera(&mut commands, device);
    spawn_ui(&mut commands);
}

#[cfg(target_arch = "wasm32")]
fn touch_capable() -> bool {
    web_sys::window()
        .map(|window| window.navigator().max_touch_points() > 0)
        .unwrap_or(false)
}

#[cfg(not(target_arch = "wasm32"))]
fn touch_capable() -> bool {
    false
}

fn spawn_camera(commands: &mut Commands, device: DeviceClass) {
    let mut ortho = OrthographicProjection::default_3d();
    ortho.scaling_mode = ScalingMode::FixedVertical {
        viewport_height: 60.0,
    };

    let mut pixelate = PixelateSettings::default();
    if device.is_mobile() {
        // Coarser default grid reads better on small screens.
        pixelate.pixel_size *= 1.5;
    }

    commands.spawn((
        Camera3d::default(),
        Projection::Orthographic(ortho),
        Transform::from_xyz(100.0, 100.0, 100.0).looking_at(Vec3::ZERO, Vec3::Y),
        pixelate,
    ));
}

fn spawn_ui(commands: &mut Commands) {
    commands
        .spawn(Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                Text::new("FPS: "),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::srgb(0.2, 0.2, 0.2)),
                Node {
                    position_type: PositionType::Absolute,
                    bottom: Val::Px(12.0),
                    right: Val::Px(12.0),
                    ..default()
                },
                FpsText,
            ));
        });
}
