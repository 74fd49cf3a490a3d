//! Stylized export: capture the presented frame and hand it to the image
//! synthesis client.
//!
//! Capture goes through the renderer's screenshot path so the encoded image
//! reflects the frame being rendered when the request arrived, then the PNG
//! is base64-encoded and submitted via the AI bridge.

use std::sync::{Arc, Mutex};

use archviz_ai::stylize::encode_image_base64;
use bevy::prelude::*;
use bevy::render::view::screenshot::{Screenshot, ScreenshotCaptured};

use crate::ai::bridge::{AiBridge, GenerateExportEvent};
use crate::rpc::web_rpc::WebRpcInterface;

type CaptureSlot = Arc<Mutex<Option<Vec<u8>>>>;

#[derive(Resource, Default)]
pub struct PendingExport {
    prompt: Option<String>,
    capture: Option<CaptureSlot>,
}

pub fn handle_generate_export_events(
    mut events: EventReader<GenerateExportEvent>,
    mut pending: ResMut<PendingExport>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut commands: Commands,
) {
    for event in events.read() {
        if pending.prompt.is_some() {
            warn!("export request ignored: capture already pending");
            rpc_interface.send_notification(
                "ai_failed",
                serde_json::json!({ "stage": "export", "error": "capture already pending" }),
            );
            continue;
        }

        info!("capturing viewport for stylized export");
        let slot: CaptureSlot = Arc::new(Mutex::new(None));
        let slot_for_observer = slot.clone();
        pending.prompt = Some(event.prompt.clone());
        pending.capture = Some(slot);

        commands.spawn(Screenshot::primary_window()).observe(
            move |trigger: Trigger<ScreenshotCaptured>| {
                let image = trigger.event().0.clone();
                match encode_png(image) {
                    Some(png) => {
                        if let Ok(mut guard) = slot_for_observer.lock() {
                            *guard = Some(png);
                        }
                    }
                    None => {
                        // Leave an empty payload; submission reports failure.
                        if let Ok(mut guard) = slot_for_observer.lock() {
                            *guard = Some(Vec::new());
                        }
                    }
                }
            },
        );
    }
}

fn encode_png(image: Image) -> Option<Vec<u8>> {
    let dynamic = image.try_into_dynamic().ok()?;
    let mut buffer = std::io::Cursor::new(Vec::new());
    dynamic
        .write_to(&mut buffer, image::ImageFormat::Png)
        .ok()?;
    Some(buffer.into_inner())
}

/// Once the capture lands, encode and submit it.
pub fn submit_capture_system(
    mut pending: ResMut<PendingExport>,
    mut bridge: ResMut<AiBridge>,
    time: Res<Time>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    let Some(slot) = pending.capture.as_ref() else {
        return;
    };
    let Some(png) = slot.lock().ok().and_then(|mut guard| guard.take()) else {
        return;
    };
    let prompt = pending.prompt.take().unwrap_or_default();
    pending.capture = None;

    if png.is_empty() {
        warn!("screenshot encoding failed, export aborted");
        rpc_interface.send_notification(
            "ai_failed",
            serde_json::json!({ "stage": "export", "error": "screenshot encoding failed" }),
        );
        return;
    }

    info!("submitting stylized export ({} bytes captured)", png.len());
    bridge.spawn_export(encode_image_base64(&png), prompt, time.elapsed_secs());
}
