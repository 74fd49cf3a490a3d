//! Viewer settings loaded from a JSON asset.
//!
//! Optional: the viewer starts with compiled-in defaults and applies the
//! asset once it arrives. Missing or malformed settings never block startup.

use bevy::prelude::*;
use constants::units::ModelUnit;
use serde::Deserialize;

use crate::engine::camera::orbit_camera::OrbitCamera;

pub const SETTINGS_ASSET_PATH: &str = "viewer_settings.json";

#[derive(Asset, TypePath, Debug, Clone, Deserialize)]
pub struct ViewerSettings {
    /// Background colour as linear RGB triplet.
    pub background: [f32; 3],
    pub camera_damping: f32,
    /// Unit assumed when a load request does not specify one.
    pub default_unit: String,
}

/// Unit applied to load requests that omit one.
#[derive(Resource, Default, Clone, Copy)]
pub struct DefaultUnit(pub ModelUnit);

#[derive(Resource, Default)]
pub struct SettingsLoader {
    handle: Option<Handle<ViewerSettings>>,
    applied: bool,
}

pub fn start_settings_load(mut loader: ResMut<SettingsLoader>, asset_server: Res<AssetServer>) {
    loader.handle = Some(asset_server.load(SETTINGS_ASSET_PATH));
}

pub fn apply_settings_when_ready(
    mut loader: ResMut<SettingsLoader>,
    settings_assets: Res<Assets<ViewerSettings>>,
    mut clear_color: ResMut<ClearColor>,
    mut orbit: ResMut<OrbitCamera>,
    mut default_unit: ResMut<DefaultUnit>,
) {
    if loader.applied {
        return;
    }
    let Some(settings) = loader
        .handle
        .as_ref()
        .and_then(|handle| settings_assets.get(handle))
    else {
        return;
    };

    clear_color.0 = Color::srgb(
        settings.background[0],
        settings.background[1],
        settings.background[2],
    );
    orbit.damping = settings.camera_damping.clamp(0.01, 1.0);
    if let Some(unit) = ModelUnit::from_string(&settings.default_unit) {
        default_unit.0 = unit;
    } else {
        warn!("viewer settings: unknown default unit {:?}", settings.default_unit);
    }
    loader.applied = true;
    info!("viewer settings applied");
}
