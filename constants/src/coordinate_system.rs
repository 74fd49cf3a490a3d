use bevy::math::{Quat, Vec3};

/// Up-axis correction matrix for Z-up source formats (row-major: [x_new, y_new, z_new]).
/// Equivalent to a -90° X rotation (Z→Y, -Y→Z, X→X).
pub const Z_UP_TO_Y_UP: [[f32; 3]; 3] = [
    [1.0, 0.0, 0.0],  // X = X
    [0.0, 0.0, 1.0],  // Y = Z
    [0.0, -1.0, 0.0], // Z = -Y
];

/// Rotation form of [`Z_UP_TO_Y_UP`], applied to the root of Z-up models.
pub fn up_axis_correction() -> Quat {
    Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2)
}

/// Transform a Z-up point into the scene's Y-up convention.
pub fn transform_coordinates(x: f32, y: f32, z: f32) -> (f32, f32, f32) {
    let input = [x, y, z];
    let mut output = [0.0; 3];

    for i in 0..3 {
        for j in 0..3 {
            output[i] += Z_UP_TO_Y_UP[i][j] * input[j];
        }
    }

    (output[0], output[1], output[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn z_axis_maps_to_y() {
        assert_eq!(transform_coordinates(0.0, 0.0, 1.0), (0.0, 1.0, 0.0));
        assert_eq!(transform_coordinates(0.0, 1.0, 0.0), (0.0, 0.0, -1.0));
        assert_eq!(transform_coordinates(1.0, 0.0, 0.0), (1.0, 0.0, 0.0));
    }

    #[test]
    fn quat_agrees_with_matrix() {
        let rotated = up_axis_correction() * Vec3::new(0.3, -1.2, 4.5);
        let (x, y, z) = transform_coordinates(0.3, -1.2, 4.5);
        assert!((rotated - Vec3::new(x, y, z)).length() < 1e-5);
    }
}
