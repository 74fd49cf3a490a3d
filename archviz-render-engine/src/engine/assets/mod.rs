/// Axis-aligned bounds helper for loaded geometry.
pub mod bounds;

/// Single-model container resource, material backups, per-mesh markers.
pub mod model_container;
