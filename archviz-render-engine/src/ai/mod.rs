//! Cloud AI integration: request bridging, script playback, frame export.

/// Async request bridge with timeout and stale-result handling.
pub mod bridge;

/// Screenshot capture and stylized-export submission.
pub mod export;

/// Animation script playback and the section-cut sweep.
pub mod timeline;
