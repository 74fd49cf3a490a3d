//! Pointer input normalization.
//!
//! Mouse and touch both arrive as window cursor positions; this maps them
//! into normalized device coordinates so ray casting is viewport-independent.
//! The sample is ephemeral — refreshed every frame, never accumulated.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

/// Latest pointer position in NDC, `None` while the cursor is outside the
/// render surface.
#[derive(Resource, Default)]
pub struct PointerNdc {
    pub ndc: Option<Vec2>,
}

/// Map a surface-relative pixel position into [-1,1]².
///
/// The vertical axis flips: pixel origin is top-left, NDC origin is the
/// centre with +Y up, so the exact top-left pixel maps to (-1, 1) and the
/// exact bottom-right to (1, -1).
pub fn viewport_to_ndc(pixel: Vec2, surface_origin: Vec2, surface_size: Vec2) -> Vec2 {
    Vec2::new(
        (pixel.x - surface_origin.x) / surface_size.x * 2.0 - 1.0,
        -((pixel.y - surface_origin.y) / surface_size.y * 2.0 - 1.0),
    )
}

pub fn pointer_ndc_system(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut pointer: ResMut<PointerNdc>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    pointer.ndc = window.cursor_position().map(|position| {
        viewport_to_ndc(
            position,
            Vec2::ZERO,
            Vec2::new(window.width(), window.height()),
        )
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: Vec2 = Vec2::new(800.0, 600.0);

    #[test]
    fn top_left_pixel_maps_to_minus_one_plus_one() {
        assert_eq!(viewport_to_ndc(Vec2::ZERO, Vec2::ZERO, SIZE), Vec2::new(-1.0, 1.0));
    }

    #[test]
    fn bottom_right_pixel_maps_to_plus_one_minus_one() {
        assert_eq!(viewport_to_ndc(SIZE, Vec2::ZERO, SIZE), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn centre_maps_to_origin() {
        assert_eq!(viewport_to_ndc(SIZE * 0.5, Vec2::ZERO, SIZE), Vec2::ZERO);
    }

    #[test]
    fn surface_offset_is_subtracted() {
        let ndc = viewport_to_ndc(Vec2::new(110.0, 20.0), Vec2::new(110.0, 20.0), SIZE);
        assert_eq!(ndc, Vec2::new(-1.0, 1.0));
    }
}
