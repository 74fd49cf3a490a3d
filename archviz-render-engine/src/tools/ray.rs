use bevy::prelude::*;

/// Slab-method ray/AABB intersection; returns the entry distance, or the
/// exit distance when the origin is inside the box.
pub fn ray_aabb_intersection(origin: Vec3, direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut near = f32::NEG_INFINITY;
    let mut far = f32::INFINITY;

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        if d.abs() < 1e-8 {
            // Parallel to the slab: must already be inside it.
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let mut t0 = (min[axis] - o) / d;
        let mut t1 = (max[axis] - o) / d;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        near = near.max(t0);
        far = far.min(t1);
        if near > far {
            return None;
        }
    }

    if far < 0.0 {
        return None;
    }
    Some(if near >= 0.0 { near } else { far })
}

/// Ray against an oriented box: transform the ray into the box's local
/// space and run the slab test against its local half extents.
pub fn ray_obb_intersection(
    origin: Vec3,
    direction: Vec3,
    transform: &GlobalTransform,
    local_min: Vec3,
    local_max: Vec3,
) -> Option<f32> {
    let inverse = transform.compute_matrix().inverse();
    let local_origin = inverse.transform_point3(origin);
    let local_direction = inverse.transform_vector3(direction);
    ray_aabb_intersection(local_origin, local_direction, local_min, local_max)
}

/// World-space ray through a normalized-device-coordinate sample. Two NDC
/// depths are unprojected so the same code serves orthographic and
/// perspective cameras.
pub fn ndc_ray(camera: &Camera, camera_transform: &GlobalTransform, ndc: Vec2) -> Option<Ray3d> {
    let near = camera.ndc_to_world(camera_transform, ndc.extend(1.0))?;
    let mid = camera.ndc_to_world(camera_transform, ndc.extend(0.5))?;
    let direction = Dir3::new(mid - near).ok()?;
    Some(Ray3d {
        origin: near,
        direction,
    })
}

/// Intersection with the horizontal plane `y = plane_y`.
pub fn ray_ground_plane(origin: Vec3, direction: Vec3, plane_y: f32) -> Option<Vec3> {
    if direction.y.abs() < 1e-4 {
        return None;
    }
    let t = (plane_y - origin.y) / direction.y;
    if t > 0.0 {
        Some(origin + direction * t)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: Vec3 = Vec3::new(-1.0, -1.0, -1.0);
    const MAX: Vec3 = Vec3::new(1.0, 1.0, 1.0);

    #[test]
    fn head_on_hit_reports_entry_distance() {
        let t = ray_aabb_intersection(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, MIN, MAX).unwrap();
        assert!((t - 4.0).abs() < 1e-6);
    }

    #[test]
    fn offset_ray_misses() {
        assert!(ray_aabb_intersection(Vec3::new(3.0, 0.0, 5.0), Vec3::NEG_Z, MIN, MAX).is_none());
    }

    #[test]
    fn origin_inside_returns_exit() {
        let t = ray_aabb_intersection(Vec3::ZERO, Vec3::Z, MIN, MAX).unwrap();
        assert!((t - 1.0).abs() < 1e-6);
    }

    #[test]
    fn parallel_ray_outside_slab_misses() {
        assert!(
            ray_aabb_intersection(Vec3::new(0.0, 2.0, 5.0), Vec3::NEG_Z, MIN, MAX).is_none()
        );
    }

    #[test]
    fn behind_the_origin_misses() {
        assert!(ray_aabb_intersection(Vec3::new(0.0, 0.0, 5.0), Vec3::Z, MIN, MAX).is_none());
    }

    #[test]
    fn obb_respects_translation() {
        let transform = GlobalTransform::from(Transform::from_xyz(10.0, 0.0, 0.0));
        assert!(
            ray_obb_intersection(Vec3::new(10.0, 0.0, 5.0), Vec3::NEG_Z, &transform, MIN, MAX)
                .is_some()
        );
        assert!(
            ray_obb_intersection(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, &transform, MIN, MAX)
                .is_none()
        );
    }

    #[test]
    fn ground_plane_hit() {
        let hit = ray_ground_plane(Vec3::new(0.0, 10.0, 0.0), Vec3::new(1.0, -1.0, 0.0), 0.0)
            .unwrap();
        assert!((hit - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-4);
        assert!(ray_ground_plane(Vec3::new(0.0, 10.0, 0.0), Vec3::X, 0.0).is_none());
    }
}
