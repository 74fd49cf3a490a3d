//! Model load pipeline: request → guarded async parse → spawn.
//!
//! Parsing runs off the main schedule and lands its result in a shared slot
//! drained once per frame. Exactly one load may be in flight; a second
//! request is rejected outright rather than queued, and a generation token
//! keeps a stale completion from clobbering a newer load.

use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use constants::units::ModelUnit;

use crate::engine::assets::model_container::{
    EdgeLineCandidate, LoadedModelRoot, MeshLocalBounds, ModelContainer, ModelMesh,
    OriginalMaterial,
};
use crate::engine::camera::orbit_camera::OrbitCamera;
use crate::engine::loading::formats::{LoadError, ModelFormat};
use crate::engine::loading::gltf_import::import_gltf;
use crate::engine::loading::mesh_data::LoadedModel;
use crate::engine::loading::normalize::{ModelPlacement, normalize_model};
use crate::engine::loading::obj_import::import_obj;
use crate::engine::loading::stl_import::import_stl;
use crate::rpc::web_rpc::WebRpcInterface;

/// Where the model bytes come from.
#[derive(Debug, Clone)]
pub enum LoadSource {
    /// Browser file input: the frontend ships name + raw bytes.
    Bytes { name: String, bytes: Vec<u8> },
    /// Local path (native) or remote URL (wasm, fetched before parsing).
    Path(String),
}

impl LoadSource {
    pub fn display_name(&self) -> &str {
        match self {
            Self::Bytes { name, .. } => name,
            Self::Path(path) => path,
        }
    }
}

#[derive(Event)]
pub struct ModelLoadRequest {
    pub source: LoadSource,
    pub unit: ModelUnit,
}

type LoadSlot = Arc<Mutex<Option<Result<LoadedModel, LoadError>>>>;

struct InFlightLoad {
    slot: LoadSlot,
    unit: ModelUnit,
    generation: u64,
}

/// One-load-in-flight guard.
#[derive(Resource, Default)]
pub struct ModelLoadState {
    in_flight: Option<InFlightLoad>,
    generation: u64,
}

impl ModelLoadState {
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }
}

/// Dispatch by extension, then parse. Pure data in, pure data out — runs on
/// the loading task, never on the main thread.
pub fn parse_model(name: &str, bytes: &[u8]) -> Result<LoadedModel, LoadError> {
    let format = ModelFormat::from_path(name)?;
    debug!("parsing {} as {}", name, format.name());
    let meshes = match format {
        ModelFormat::Gltf | ModelFormat::Glb => import_gltf(bytes)?,
        ModelFormat::Obj => import_obj(bytes)?,
        ModelFormat::Stl => import_stl(bytes)?,
    };
    Ok(LoadedModel {
        source_name: name.to_string(),
        format,
        meshes,
    })
}

#[cfg(not(target_arch = "wasm32"))]
fn fetch_and_parse_blocking(source: LoadSource) -> Result<LoadedModel, LoadError> {
    match source {
        LoadSource::Bytes { name, bytes } => parse_model(&name, &bytes),
        LoadSource::Path(path) => {
            if path.starts_with("http://") || path.starts_with("https://") {
                return Err(LoadError::Io {
                    path,
                    message: "remote URLs are fetched by the web frontend".to_string(),
                });
            }
            let bytes = std::fs::read(&path).map_err(|error| LoadError::Io {
                path: path.clone(),
                message: error.to_string(),
            })?;
            parse_model(&path, &bytes)
        }
    }
}

#[cfg(target_arch = "wasm32")]
async fn fetch_and_parse_remote(source: LoadSource) -> Result<LoadedModel, LoadError> {
    match source {
        LoadSource::Bytes { name, bytes } => parse_model(&name, &bytes),
        LoadSource::Path(url) => {
            let response = reqwest::get(&url).await.map_err(|error| LoadError::Io {
                path: url.clone(),
                message: error.to_string(),
            })?;
            let bytes = response.bytes().await.map_err(|error| LoadError::Io {
                path: url.clone(),
                message: error.to_string(),
            })?;
            parse_model(&url, &bytes)
        }
    }
}

pub fn begin_model_load(
    mut events: EventReader<ModelLoadRequest>,
    mut load_state: ResMut<ModelLoadState>,
    mut rpc: ResMut<WebRpcInterface>,
) {
    for request in events.read() {
        if load_state.is_busy() {
            warn!(
                "load rejected, another load is in flight: {}",
                request.source.display_name()
            );
            rpc.send_notification(
                "load_rejected",
                serde_json::json!({
                    "name": request.source.display_name(),
                    "reason": "a model load is already in flight",
                }),
            );
            continue;
        }

        load_state.generation += 1;
        let generation = load_state.generation;
        let slot: LoadSlot = Arc::new(Mutex::new(None));
        let source = request.source.clone();

        info!("loading model: {}", source.display_name());

        #[cfg(not(target_arch = "wasm32"))]
        {
            let slot_for_task = slot.clone();
            bevy::tasks::AsyncComputeTaskPool::get()
                .spawn(async move {
                    let result = fetch_and_parse_blocking(source);
                    if let Ok(mut guard) = slot_for_task.lock() {
                        *guard = Some(result);
                    }
                })
                .detach();
        }

        #[cfg(target_arch = "wasm32")]
        {
            let slot_for_task = slot.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let result = fetch_and_parse_remote(source).await;
                if let Ok(mut guard) = slot_for_task.lock() {
                    *guard = Some(result);
                }
            });
        }

        load_state.in_flight = Some(InFlightLoad {
            slot,
            unit: request.unit,
            generation,
        });
    }
}

pub fn complete_model_load(
    mut commands: Commands,
    mut load_state: ResMut<ModelLoadState>,
    mut container: ResMut<ModelContainer>,
    mut orbit: ResMut<OrbitCamera>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut rpc: ResMut<WebRpcInterface>,
) {
    let current_generation = load_state.generation;
    let Some(in_flight) = load_state.in_flight.as_ref() else {
        return;
    };

    let Some(result) = in_flight.slot.lock().ok().and_then(|mut slot| slot.take()) else {
        return;
    };
    let unit = in_flight.unit;
    let generation = in_flight.generation;
    load_state.in_flight = None;

    if generation != current_generation {
        warn!("dropping stale load completion (generation {generation})");
        return;
    }

    match result.and_then(|model| {
        let placement = normalize_model(&model, unit)?;
        Ok((model, placement))
    }) {
        Ok((model, placement)) => {
            spawn_model(
                &mut commands,
                &mut container,
                &mut meshes,
                &mut materials,
                &model,
                &placement,
            );
            orbit.frame(&placement.bounds);
            rpc.send_notification("model_loaded", container.info_json());
        }
        Err(error) => {
            warn!("model load failed: {error}");
            rpc.send_notification(
                "load_failed",
                serde_json::json!({ "error": error.to_string() }),
            );
        }
    }
}

/// Replace the container contents: despawn the previous subtree, spawn the
/// new one, back up materials, refresh derived attributes.
fn spawn_model(
    commands: &mut Commands,
    container: &mut ModelContainer,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    model: &LoadedModel,
    placement: &ModelPlacement,
) {
    if let Some(previous_root) = container.root.take() {
        commands.entity(previous_root).despawn();
    }
    container.clear();

    let root = commands
        .spawn((
            LoadedModelRoot,
            Transform::IDENTITY,
            Visibility::default(),
        ))
        .id();
    let pivot = commands
        .spawn((placement.transform, Visibility::default()))
        .id();
    commands.entity(root).add_child(pivot);

    for mesh_data in &model.meshes {
        let Some(local_bounds) = mesh_data.bounds() else {
            continue;
        };
        let material = materials.add(StandardMaterial {
            base_color: Color::srgba(
                mesh_data.base_color[0],
                mesh_data.base_color[1],
                mesh_data.base_color[2],
                mesh_data.base_color[3],
            ),
            perceptual_roughness: 0.85,
            ..default()
        });
        let child = commands
            .spawn((
                Mesh3d(meshes.add(mesh_data.to_mesh())),
                MeshMaterial3d(material.clone()),
                Transform::IDENTITY,
                Visibility::default(),
                ModelMesh,
                OriginalMaterial(material),
                EdgeLineCandidate,
                MeshLocalBounds(local_bounds),
            ))
            .id();
        commands.entity(pivot).add_child(child);
    }

    container.root = Some(root);
    container.source_name = Some(model.source_name.clone());
    container.bounds = Some(placement.bounds);
    container.raw_bounds = Some(placement.raw_bounds);
    container.max_dimension = placement.max_dimension;
    container.vertex_count = placement.vertex_count;

    info!(
        "model processed: {} ({} vertices, max dimension {:.2} m)",
        model.source_name, placement.vertex_count, placement.max_dimension
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_model_dispatches_and_rejects() {
        assert!(matches!(
            parse_model("building.3dm", &[]),
            Err(LoadError::UnsupportedFormat(ext)) if ext == "3dm"
        ));
        assert!(parse_model("flat.obj", b"v 0 0 0\nv 1 0 0\nv 1 1 0\nf 1 2 3\n").is_ok());
    }

    #[test]
    fn second_request_is_rejected_while_busy() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_event::<ModelLoadRequest>()
            .init_resource::<ModelLoadState>()
            .init_resource::<WebRpcInterface>()
            .add_systems(Update, begin_model_load);

        // Two requests in the same frame: only the first may start.
        app.world_mut().send_event(ModelLoadRequest {
            source: LoadSource::Bytes {
                name: "a.obj".into(),
                bytes: b"v 0 0 0\nv 1 0 0\nv 1 1 0\nf 1 2 3\n".to_vec(),
            },
            unit: ModelUnit::Meters,
        });
        app.world_mut().send_event(ModelLoadRequest {
            source: LoadSource::Bytes {
                name: "b.obj".into(),
                bytes: b"v 0 0 0\nv 1 0 0\nv 1 1 0\nf 1 2 3\n".to_vec(),
            },
            unit: ModelUnit::Meters,
        });
        app.update();

        assert!(app.world().resource::<ModelLoadState>().is_busy());
        let rejected: Vec<_> = app
            .world_mut()
            .resource_mut::<WebRpcInterface>()
            .take_notifications()
            .into_iter()
            .filter(|notification| notification.method == "load_rejected")
            .collect();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].params["name"], "b.obj");
    }
}
