use bevy::prelude::*;

/// Axis-aligned bounds of a loaded model, recomputed synchronously after
/// every load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl ModelBounds {
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec3>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self {
            min: first,
            max: first,
        };
        for point in iter {
            bounds.min = bounds.min.min(point);
            bounds.max = bounds.max.max(point);
        }
        Some(bounds)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn max_dimension(&self) -> f32 {
        self.size().max_element()
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Extent along one axis as `(min, max)`, X=0 Y=1 Z=2.
    pub fn axis_range(&self, axis: usize) -> (f32, f32) {
        (self.min[axis], self.max[axis])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_from_points() {
        let bounds = ModelBounds::from_points([
            Vec3::new(-1.0, 2.0, 0.0),
            Vec3::new(3.0, -2.0, 5.0),
            Vec3::new(0.0, 0.0, 1.0),
        ])
        .unwrap();
        assert_eq!(bounds.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(3.0, 2.0, 5.0));
        assert_eq!(bounds.center(), Vec3::new(1.0, 0.0, 2.5));
        assert_eq!(bounds.max_dimension(), 5.0);
    }

    #[test]
    fn empty_iterator_has_no_bounds() {
        assert!(ModelBounds::from_points(std::iter::empty()).is_none());
    }
}
