/// Orbit controller, viewport snapshots, projection switching.
pub mod orbit_camera;
