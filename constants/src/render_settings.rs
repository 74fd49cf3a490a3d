use bevy::color::{Color, Srgba};

/// Neutral studio backdrop used before any style preset is applied.
pub const BACKGROUND_COLOR: Color = Color::Srgba(Srgba {
    red: 0.94,
    green: 0.94,
    blue: 0.94,
    alpha: 1.0,
});

pub const GRID_COLOR: Color = Color::Srgba(Srgba {
    red: 0.53,
    green: 0.53,
    blue: 0.53,
    alpha: 0.5,
});

pub const SELECTION_COLOR: Color = Color::Srgba(Srgba {
    red: 0.063,
    green: 0.486,
    blue: 0.063,
    alpha: 1.0,
});

/// Architectural shadow quality; halved automatically on mobile-class devices.
pub const SHADOW_MAP_RESOLUTION: u32 = 4096;

pub const DEFAULT_PIXELATION_SIZE: f32 = 6.0;

/// Ground grid footprint in metres when no model bounds are available.
pub const GRID_EXTENT: f32 = 50.0;
pub const GRID_CELL_SIZE: f32 = 1.0;

pub const MEASURE_LINE_WIDTH: f32 = 0.02;
pub const MEASURE_MARKER_SIZE: f32 = 0.05;

/// Damping factor for orbit camera smoothing.
pub const CAMERA_DAMPING: f32 = 0.25;
