//! Interactive tools and the interaction state machine.
//!
//! The `InteractionState` resource is the single source of truth for the
//! interaction layer: active tool mode, device class, selection, and the
//! saved viewport snapshot. All mode changes funnel through
//! `tool_manager::handle_tool_mode_events`.
//!
//! ## Tool Mode Lifecycle
//!
//! ```text
//! Keyboard/RPC input
//!   └─> ToolModeEvent (raw string)
//!       └─> handle_tool_mode_events()
//!           ├─> validate against the closed enum (unknown -> warn, no-op)
//!           ├─> exit hook of the outgoing mode (also on self-transition)
//!           ├─> commit into InteractionState
//!           ├─> enter hook of the incoming mode
//!           └─> state_changed {key: "toolMode", value} notification
//! ```
//!
//! ## Modes
//!
//! - **View** — free orbit; the camera controller owns all pointer drag.
//! - **Ruler** — orbit locked; the NDC pointer sample raycasts the model
//!   for two-click distance measurement with live preview.
//! - **Move** — orbit locked; click-select the container and drag it along
//!   the ground plane, scroll/Q-E to rotate.
//! - **Hide** — orbit stays free; clicking hides individual meshes, leaving
//!   the mode restores them.

/// Click-to-hide with restore-on-exit.
pub mod hide;

/// Two-click distance measurement with hover preview.
pub mod measure;

/// Container selection and ground-plane dragging.
pub mod move_tool;

/// Pointer-to-NDC normalization.
pub mod pointer;

/// Ray intersection helpers shared by the picking tools.
pub mod ray;

/// Interaction state, mode transitions, viewport snapshots, shortcuts.
pub mod tool_manager;
