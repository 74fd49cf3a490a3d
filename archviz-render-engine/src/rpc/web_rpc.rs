//! JSON-RPC 2.0 communication layer for the web frontend.
//!
//! Bidirectional messaging between the engine and the hosting page via
//! iframe postMessage: requests get responses with matching ids,
//! notifications flow one way. State observers hang off the same channel —
//! every committed tool-mode change emits a `state_changed` notification
//! with `{key, value}` so external UI can stay in sync.

use base64::Engine as _;
use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use constants::units::ModelUnit;
use serde::{Deserialize, Serialize};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use web_sys::{MessageEvent, window};

use crate::ai::bridge::{GenerateAnimationEvent, GenerateExportEvent};
use crate::engine::assets::model_container::ModelContainer;
use crate::engine::core::settings::DefaultUnit;
use crate::engine::loading::model_loader::{LoadSource, ModelLoadRequest};
use crate::engine::render::pixelate_post_processing::SetPixelationEvent;
use crate::engine::render::render_style::SetRenderStyleEvent;
use crate::tools::tool_manager::{
    RestoreViewportEvent, SaveViewportEvent, ToolModeEvent, ToolSelectionSource,
};

/// JSON-RPC 2.0 request structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub result: Option<serde_json::Value>,
    pub error: Option<RpcError>,
    pub id: Option<serde_json::Value>,
}

/// One-way notification to the frontend.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: serde_json::Value,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

impl RpcError {
    pub fn invalid_params(message: &str) -> Self {
        Self {
            code: -32602,
            message: message.to_string(),
            data: None,
        }
    }
}

/// Resource queuing outbound messages until the end-of-frame flush.
#[derive(Resource, Default)]
pub struct WebRpcInterface {
    outgoing_notifications: Vec<RpcNotification>,
    outgoing_responses: Vec<RpcResponse>,
}

impl WebRpcInterface {
    /// Send a notification to the frontend without expecting a response.
    pub fn send_notification(&mut self, method: &str, params: serde_json::Value) {
        self.outgoing_notifications.push(RpcNotification {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        });
    }

    fn queue_response(&mut self, response: RpcResponse) {
        self.outgoing_responses.push(response);
    }

    /// Drain queued notifications; used by the flush system and by tests
    /// asserting on observer behaviour.
    pub fn take_notifications(&mut self) -> Vec<RpcNotification> {
        std::mem::take(&mut self.outgoing_notifications)
    }
}

pub struct WebRpcPlugin;

impl Plugin for WebRpcPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WebRpcInterface>()
            .add_event::<IncomingRpcMessage>()
            .add_systems(
                Update,
                (
                    process_incoming_messages,
                    handle_rpc_messages,
                    send_outgoing_messages,
                )
                    .chain(),
            );

        #[cfg(target_arch = "wasm32")]
        app.add_systems(Startup, setup_message_listener);
    }
}

#[cfg(target_arch = "wasm32")]
fn setup_message_listener(mut commands: Commands) {
    use std::sync::{Arc, Mutex};

    let message_queue: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let queue_clone = message_queue.clone();

    let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
        if let Ok(data) = event.data().dyn_into::<js_sys::JsString>() {
            let message: String = data.into();
            // Cheap pre-filter before the real parse on the engine side.
            if message.contains("jsonrpc") {
                if let Ok(mut queue) = queue_clone.lock() {
                    queue.push(message);
                }
            }
        }
    }) as Box<dyn FnMut(MessageEvent)>);

    if let Some(window) = window() {
        window
            .add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
            .expect("Failed to register message listener");
    }

    // Ownership moves to the JS side for the lifetime of the page.
    closure.forget();
    commands.insert_resource(MessageQueue(message_queue));
}

/// Thread-safe inbound queue filled by the postMessage listener.
#[derive(Resource)]
struct MessageQueue(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

#[derive(Event)]
pub struct IncomingRpcMessage {
    pub content: String,
}

fn process_incoming_messages(
    message_queue: Option<Res<MessageQueue>>,
    mut message_events: EventWriter<IncomingRpcMessage>,
) {
    let Some(queue) = message_queue else {
        return;
    };
    let messages = if let Ok(mut queue) = queue.0.lock() {
        std::mem::take(&mut *queue)
    } else {
        Vec::new()
    };
    for content in messages {
        message_events.write(IncomingRpcMessage { content });
    }
}

/// Event writers the method table dispatches into.
#[derive(bevy::ecs::system::SystemParam)]
pub struct RpcDispatch<'w> {
    tool_events: EventWriter<'w, ToolModeEvent>,
    load_events: EventWriter<'w, ModelLoadRequest>,
    style_events: EventWriter<'w, SetRenderStyleEvent>,
    pixelation_events: EventWriter<'w, SetPixelationEvent>,
    save_viewport_events: EventWriter<'w, SaveViewportEvent>,
    restore_viewport_events: EventWriter<'w, RestoreViewportEvent>,
    animation_events: EventWriter<'w, GenerateAnimationEvent>,
    export_events: EventWriter<'w, GenerateExportEvent>,
}

pub fn handle_rpc_messages(
    mut events: EventReader<IncomingRpcMessage>,
    diagnostics: Res<DiagnosticsStore>,
    container: Res<ModelContainer>,
    default_unit: Res<DefaultUnit>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut dispatch: RpcDispatch,
) {
    for event in events.read() {
        match serde_json::from_str::<RpcRequest>(&event.content) {
            Ok(request) => {
                if let Some(response) = handle_rpc_request(
                    &request,
                    &diagnostics,
                    &container,
                    default_unit.0,
                    &mut dispatch,
                ) {
                    rpc_interface.queue_response(response);
                }
            }
            Err(parse_error) => {
                warn!("discarding unparsable RPC message: {parse_error}");
            }
        }
    }
}

fn handle_rpc_request(
    request: &RpcRequest,
    diagnostics: &DiagnosticsStore,
    container: &ModelContainer,
    default_unit: ModelUnit,
    dispatch: &mut RpcDispatch,
) -> Option<RpcResponse> {
    // Notifications (no id) still dispatch, but get no response.
    let result = match request.method.as_str() {
        "set_tool_mode" => handle_set_tool_mode(&request.params, dispatch),
        "load_model" => handle_load_model(&request.params, default_unit, dispatch),
        "set_render_style" => handle_set_render_style(&request.params, dispatch),
        "set_pixelation" => handle_set_pixelation(&request.params, dispatch),
        "save_viewport" => {
            dispatch.save_viewport_events.write(SaveViewportEvent);
            Ok(serde_json::json!({ "saved": true }))
        }
        "restore_viewport" => {
            dispatch.restore_viewport_events.write(RestoreViewportEvent);
            Ok(serde_json::json!({ "restored": true }))
        }
        "generate_animation" => handle_generate_animation(&request.params, dispatch),
        "generate_export" => handle_generate_export(&request.params, dispatch),
        "get_fps" => handle_get_fps(diagnostics),
        "get_model_info" => Ok(container.info_json()),
        _ => {
            warn!("Unknown RPC method: {}", request.method);
            Err(RpcError {
                code: -32601,
                message: "Method not found".to_string(),
                data: Some(serde_json::json!({ "method": request.method })),
            })
        }
    };

    let id = request.id.clone()?;
    Some(match result {
        Ok(value) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: Some(value),
            error: None,
            id: Some(id),
        },
        Err(error) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id: Some(id),
        },
    })
}

fn handle_set_tool_mode(
    params: &serde_json::Value,
    dispatch: &mut RpcDispatch,
) -> Result<serde_json::Value, RpcError> {
    #[derive(Deserialize)]
    struct Params {
        mode: String,
    }
    let params = serde_json::from_value::<Params>(params.clone())
        .map_err(|_| RpcError::invalid_params("Expected 'mode' parameter"))?;

    // Validation happens in the transition system: an unknown mode warns
    // and leaves state untouched, it is not an RPC error.
    dispatch.tool_events.write(ToolModeEvent {
        requested: params.mode.clone(),
        source: ToolSelectionSource::Rpc,
    });
    Ok(serde_json::json!({ "requested": params.mode }))
}

fn handle_load_model(
    params: &serde_json::Value,
    default_unit: ModelUnit,
    dispatch: &mut RpcDispatch,
) -> Result<serde_json::Value, RpcError> {
    #[derive(Deserialize)]
    struct Params {
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        data_base64: Option<String>,
        #[serde(default)]
        unit: Option<String>,
    }
    let params = serde_json::from_value::<Params>(params.clone())
        .map_err(|_| RpcError::invalid_params("Malformed load_model parameters"))?;

    let unit = match params.unit.as_deref() {
        None => default_unit,
        Some(raw) => ModelUnit::from_string(raw)
            .ok_or_else(|| RpcError::invalid_params("Unit must be 'm' or 'mm'"))?,
    };

    let source = match (params.url, params.name, params.data_base64) {
        (Some(url), _, None) => LoadSource::Path(url),
        (None, Some(name), Some(encoded)) => {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(encoded.as_bytes())
                .map_err(|_| RpcError::invalid_params("data_base64 is not valid base64"))?;
            LoadSource::Bytes { name, bytes }
        }
        _ => {
            return Err(RpcError::invalid_params(
                "Expected either 'url' or 'name' + 'data_base64'",
            ));
        }
    };

    let display_name = source.display_name().to_string();
    dispatch.load_events.write(ModelLoadRequest { source, unit });
    Ok(serde_json::json!({ "requested": display_name, "unit": unit.to_string() }))
}

fn handle_set_render_style(
    params: &serde_json::Value,
    dispatch: &mut RpcDispatch,
) -> Result<serde_json::Value, RpcError> {
    #[derive(Deserialize)]
    struct Params {
        style: String,
    }
    let params = serde_json::from_value::<Params>(params.clone())
        .map_err(|_| RpcError::invalid_params("Expected 'style' parameter"))?;
    dispatch.style_events.write(SetRenderStyleEvent {
        requested: params.style.clone(),
    });
    Ok(serde_json::json!({ "requested": params.style }))
}

fn handle_set_pixelation(
    params: &serde_json::Value,
    dispatch: &mut RpcDispatch,
) -> Result<serde_json::Value, RpcError> {
    #[derive(Deserialize)]
    struct Params {
        enabled: bool,
        #[serde(default)]
        pixel_size: Option<f32>,
    }
    let params = serde_json::from_value::<Params>(params.clone())
        .map_err(|_| RpcError::invalid_params("Expected 'enabled' parameter"))?;
    dispatch.pixelation_events.write(SetPixelationEvent {
        enabled: params.enabled,
        pixel_size: params.pixel_size,
    });
    Ok(serde_json::json!({ "enabled": params.enabled }))
}

fn handle_generate_animation(
    params: &serde_json::Value,
    dispatch: &mut RpcDispatch,
) -> Result<serde_json::Value, RpcError> {
    #[derive(Deserialize)]
    struct Params {
        prompt: String,
    }
    let params = serde_json::from_value::<Params>(params.clone())
        .map_err(|_| RpcError::invalid_params("Expected 'prompt' parameter"))?;
    dispatch.animation_events.write(GenerateAnimationEvent {
        prompt: params.prompt,
    });
    Ok(serde_json::json!({ "accepted": true }))
}

fn handle_generate_export(
    params: &serde_json::Value,
    dispatch: &mut RpcDispatch,
) -> Result<serde_json::Value, RpcError> {
    #[derive(Deserialize)]
    struct Params {
        prompt: String,
    }
    let params = serde_json::from_value::<Params>(params.clone())
        .map_err(|_| RpcError::invalid_params("Expected 'prompt' parameter"))?;
    dispatch.export_events.write(GenerateExportEvent {
        prompt: params.prompt,
    });
    Ok(serde_json::json!({ "accepted": true }))
}

fn handle_get_fps(diagnostics: &DiagnosticsStore) -> Result<serde_json::Value, RpcError> {
    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|diagnostic| diagnostic.smoothed())
        .unwrap_or(0.0) as f32;
    Ok(serde_json::json!({ "fps": fps }))
}

/// Flush queued notifications and responses, notifications first.
fn send_outgoing_messages(mut rpc_interface: ResMut<WebRpcInterface>) {
    for notification in rpc_interface.take_notifications() {
        send_message_to_parent(&notification);
    }
    let responses = std::mem::take(&mut rpc_interface.outgoing_responses);
    for response in responses {
        send_message_to_parent(&response);
    }
}

fn send_message_to_parent<T: Serialize>(message: &T) {
    #[cfg(target_arch = "wasm32")]
    {
        match serde_json::to_string(message) {
            Ok(json) => {
                if let Some(window) = window() {
                    if let Some(parent) = window.parent().ok().flatten() {
                        if let Err(error) = parent.post_message(&JsValue::from_str(&json), "*") {
                            error!("Failed to send message to parent: {:?}", error);
                        }
                    }
                }
            }
            Err(error) => {
                error!("Failed to serialize message: {error}");
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
    }
}
