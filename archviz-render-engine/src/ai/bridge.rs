//! Bridge between the ECS schedule and the async AI clients.
//!
//! Requests run on a dedicated tokio runtime (native) or the browser task
//! queue (wasm); completions land in a shared queue drained once per frame.
//! Every request carries a token: results for superseded or timed-out
//! requests are dropped instead of applied, and the configured timeout
//! bounds every wait.

use std::sync::{Arc, Mutex};

use archviz_ai::{AiConfig, AnimationScript, AnimationScriptClient, StylizeClient, StylizedRender};
use bevy::prelude::*;

use crate::ai::timeline::AnimationTimeline;
use crate::rpc::web_rpc::WebRpcInterface;

#[derive(Event)]
pub struct GenerateAnimationEvent {
    pub prompt: String,
}

#[derive(Event)]
pub struct GenerateExportEvent {
    pub prompt: String,
}

pub enum AiTaskResult {
    Animation {
        request_id: u64,
        result: Result<Option<AnimationScript>, String>,
    },
    Export {
        request_id: u64,
        result: Result<Option<StylizedRender>, String>,
    },
}

struct PendingRequest {
    id: u64,
    started_at: f32,
}

#[derive(Resource)]
pub struct AiBridge {
    config: AiConfig,
    results: Arc<Mutex<Vec<AiTaskResult>>>,
    next_request_id: u64,
    animation_request: Option<PendingRequest>,
    export_request: Option<PendingRequest>,
    #[cfg(not(target_arch = "wasm32"))]
    runtime: Option<tokio::runtime::Runtime>,
}

impl Default for AiBridge {
    fn default() -> Self {
        Self::new(AiConfig::from_env())
    }
}

impl AiBridge {
    pub fn new(config: AiConfig) -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
        {
            Ok(runtime) => Some(runtime),
            Err(error) => {
                error!("failed to start AI runtime: {error}");
                None
            }
        };

        Self {
            config,
            results: Arc::new(Mutex::new(Vec::new())),
            next_request_id: 0,
            animation_request: None,
            export_request: None,
            #[cfg(not(target_arch = "wasm32"))]
            runtime,
        }
    }

    pub fn timeout_secs(&self) -> f32 {
        self.config.timeout.as_secs_f32()
    }

    fn next_id(&mut self) -> u64 {
        self.next_request_id += 1;
        self.next_request_id
    }

    fn push_result(results: &Arc<Mutex<Vec<AiTaskResult>>>, result: AiTaskResult) {
        if let Ok(mut queue) = results.lock() {
            queue.push(result);
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn spawn(&self, future: impl Future<Output = ()> + Send + 'static) {
        if let Some(runtime) = &self.runtime {
            runtime.spawn(future);
        } else {
            error!("AI request dropped: runtime unavailable");
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn spawn(&self, future: impl Future<Output = ()> + 'static) {
        wasm_bindgen_futures::spawn_local(future);
    }

    /// Kick off script generation; a previous in-flight request is
    /// superseded and its eventual completion dropped.
    pub fn spawn_animation(&mut self, prompt: String, now: f32) -> u64 {
        let id = self.next_id();
        self.animation_request = Some(PendingRequest {
            id,
            started_at: now,
        });

        let config = self.config.clone();
        let results = self.results.clone();
        self.spawn(async move {
            let client = AnimationScriptClient::new(config);
            let result = client
                .generate_script(&prompt)
                .await
                .map_err(|error| error.to_string());
            Self::push_result(&results, AiTaskResult::Animation {
                request_id: id,
                result,
            });
        });
        id
    }

    pub fn spawn_export(&mut self, png_base64: String, prompt: String, now: f32) -> u64 {
        let id = self.next_id();
        self.export_request = Some(PendingRequest {
            id,
            started_at: now,
        });

        let config = self.config.clone();
        let results = self.results.clone();
        self.spawn(async move {
            let client = StylizeClient::new(config);
            let result = client
                .stylize(&png_base64, &prompt)
                .await
                .map_err(|error| error.to_string());
            Self::push_result(&results, AiTaskResult::Export {
                request_id: id,
                result,
            });
        });
        id
    }

    /// Drain completions, keeping only those matching a live request token.
    fn drain_current(&mut self) -> Vec<AiTaskResult> {
        let mut drained = Vec::new();
        let Ok(mut queue) = self.results.lock() else {
            return drained;
        };
        for result in queue.drain(..) {
            let live = match &result {
                AiTaskResult::Animation { request_id, .. } => {
                    self.animation_request.as_ref().map(|r| r.id) == Some(*request_id)
                }
                AiTaskResult::Export { request_id, .. } => {
                    self.export_request.as_ref().map(|r| r.id) == Some(*request_id)
                }
            };
            if live {
                drained.push(result);
            } else {
                debug!("dropping stale AI completion");
            }
        }
        drained
    }
}

pub fn handle_generate_animation_events(
    mut events: EventReader<GenerateAnimationEvent>,
    mut bridge: ResMut<AiBridge>,
    time: Res<Time>,
) {
    for event in events.read() {
        info!("requesting animation script");
        bridge.spawn_animation(event.prompt.clone(), time.elapsed_secs());
    }
}

pub fn poll_ai_results(
    mut bridge: ResMut<AiBridge>,
    time: Res<Time>,
    mut timeline: ResMut<AnimationTimeline>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    let now = time.elapsed_secs();
    let timeout = bridge.timeout_secs();

    // Abandon requests that outlived the timeout; a late completion is then
    // dropped as stale by the token check.
    if let Some(request) = &bridge.animation_request {
        if now - request.started_at > timeout {
            warn!("animation request timed out");
            bridge.animation_request = None;
            rpc_interface.send_notification(
                "ai_failed",
                serde_json::json!({ "stage": "animation", "error": "timed out" }),
            );
        }
    }
    if let Some(request) = &bridge.export_request {
        if now - request.started_at > timeout {
            warn!("export request timed out");
            bridge.export_request = None;
            rpc_interface.send_notification(
                "ai_failed",
                serde_json::json!({ "stage": "export", "error": "timed out" }),
            );
        }
    }

    for result in bridge.drain_current() {
        match result {
            AiTaskResult::Animation { result, .. } => {
                bridge.animation_request = None;
                match result {
                    Ok(Some(script)) => {
                        rpc_interface.send_notification(
                            "animation_ready",
                            serde_json::json!({
                                "steps": script.timeline.len(),
                                "duration": script.total_duration(),
                            }),
                        );
                        timeline.play(script);
                    }
                    Ok(None) => {
                        // The model answered but produced no usable JSON.
                        rpc_interface.send_notification(
                            "ai_failed",
                            serde_json::json!({ "stage": "animation", "error": "no script in response" }),
                        );
                    }
                    Err(error) => {
                        warn!("animation generation failed: {error}");
                        rpc_interface.send_notification(
                            "ai_failed",
                            serde_json::json!({ "stage": "animation", "error": error }),
                        );
                    }
                }
            }
            AiTaskResult::Export { result, .. } => {
                bridge.export_request = None;
                match result {
                    Ok(Some(render)) => {
                        rpc_interface.send_notification(
                            "export_ready",
                            serde_json::json!({
                                "task_id": render.task_id,
                                "images": render.images,
                            }),
                        );
                    }
                    Ok(None) => {
                        rpc_interface.send_notification(
                            "ai_failed",
                            serde_json::json!({ "stage": "export", "error": "malformed response" }),
                        );
                    }
                    Err(error) => {
                        warn!("stylized export failed: {error}");
                        rpc_interface.send_notification(
                            "ai_failed",
                            serde_json::json!({ "stage": "export", "error": error }),
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bridge_without_runtime() -> AiBridge {
        AiBridge {
            config: AiConfig::default(),
            results: Arc::new(Mutex::new(Vec::new())),
            next_request_id: 0,
            animation_request: None,
            export_request: None,
            #[cfg(not(target_arch = "wasm32"))]
            runtime: None,
        }
    }

    #[test]
    fn stale_completions_are_dropped() {
        let mut bridge = bridge_without_runtime();
        bridge.animation_request = Some(PendingRequest {
            id: 7,
            started_at: 0.0,
        });

        AiBridge::push_result(
            &bridge.results,
            AiTaskResult::Animation {
                request_id: 3, // superseded
                result: Ok(None),
            },
        );
        AiBridge::push_result(
            &bridge.results,
            AiTaskResult::Animation {
                request_id: 7,
                result: Ok(None),
            },
        );

        let drained = bridge.drain_current();
        assert_eq!(drained.len(), 1);
        assert!(matches!(
            drained[0],
            AiTaskResult::Animation { request_id: 7, .. }
        ));
    }
}
