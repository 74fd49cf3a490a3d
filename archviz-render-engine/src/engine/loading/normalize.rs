//! Post-parse model normalization.
//!
//! Every loaded root gets the same treatment before it reaches the scene:
//! unit scaling (millimetre sources shrink by exactly 0.001), the fixed
//! up-axis correction for Z-up formats, and recentering so the bounding-box
//! centre sits on the origin. The container's derived attributes come out of
//! the same pass.

use bevy::prelude::*;
use constants::coordinate_system::up_axis_correction;
use constants::units::ModelUnit;

use crate::engine::assets::bounds::ModelBounds;
use crate::engine::loading::formats::LoadError;
use crate::engine::loading::mesh_data::LoadedModel;

/// Transform and derived attributes applied to a freshly loaded root.
#[derive(Debug, Clone)]
pub struct ModelPlacement {
    /// Scale + up-axis rotation + centering translation for the root node.
    pub transform: Transform,
    /// World-space bounds after normalization (centre ≈ origin).
    pub bounds: ModelBounds,
    /// Bounds in raw model space, before any correction.
    pub raw_bounds: ModelBounds,
    pub max_dimension: f32,
    pub vertex_count: usize,
}

pub fn normalize_model(model: &LoadedModel, unit: ModelUnit) -> Result<ModelPlacement, LoadError> {
    let raw_bounds = model.raw_bounds().ok_or(LoadError::EmptyGeometry)?;

    let scale = unit.scale_factor();
    let rotation = if model.format.is_z_up() {
        up_axis_correction()
    } else {
        Quat::IDENTITY
    };

    // Bounds of the scaled+rotated model, walked over the actual vertices —
    // rotating an AABB by its corners would over-approximate.
    let oriented = ModelBounds::from_points(
        model
            .meshes
            .iter()
            .flat_map(|mesh| mesh.positions.iter())
            .map(|p| rotation * (Vec3::from_array(*p) * scale)),
    )
    .ok_or(LoadError::EmptyGeometry)?;

    // Cancel the bounding-box centre so the model orbits around its middle.
    let translation = -oriented.center();
    let bounds = ModelBounds {
        min: oriented.min + translation,
        max: oriented.max + translation,
    };

    Ok(ModelPlacement {
        transform: Transform {
            translation,
            rotation,
            scale: Vec3::splat(scale),
        },
        bounds,
        raw_bounds,
        max_dimension: bounds.max_dimension(),
        vertex_count: model.vertex_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::loading::formats::ModelFormat;
    use crate::engine::loading::mesh_data::{MeshData, unit_quad};

    fn model(format: ModelFormat, meshes: Vec<MeshData>) -> LoadedModel {
        LoadedModel {
            source_name: "test".into(),
            format,
            meshes,
        }
    }

    #[test]
    fn millimetre_unit_scales_by_exactly_0_001() {
        let placement = normalize_model(
            &model(ModelFormat::Obj, vec![unit_quad("quad")]),
            ModelUnit::Millimeters,
        )
        .unwrap();
        assert_eq!(placement.transform.scale, Vec3::splat(0.001));
        assert!((placement.max_dimension - 0.001).abs() < 1e-9);
    }

    #[test]
    fn metre_unit_is_unscaled() {
        let placement = normalize_model(
            &model(ModelFormat::Obj, vec![unit_quad("quad")]),
            ModelUnit::Meters,
        )
        .unwrap();
        assert_eq!(placement.transform.scale, Vec3::ONE);
    }

    #[test]
    fn bounds_centre_lands_on_origin() {
        // Quad spans (0,0)-(1,1); without centering its centre is (0.5, 0.5, 0).
        let placement = normalize_model(
            &model(ModelFormat::Obj, vec![unit_quad("quad")]),
            ModelUnit::Meters,
        )
        .unwrap();
        assert!(placement.bounds.center().length() < 1e-6);
        assert_eq!(placement.transform.translation, Vec3::new(-0.5, -0.5, 0.0));
    }

    #[test]
    fn z_up_format_gets_axis_correction() {
        let placement = normalize_model(
            &model(ModelFormat::Stl, vec![unit_quad("quad")]),
            ModelUnit::Meters,
        )
        .unwrap();
        // The quad lived in the XY plane; after correction it spans XZ.
        assert!(placement.bounds.size().y < 1e-6);
        assert!((placement.bounds.size().z - 1.0).abs() < 1e-5);
        assert!(placement.bounds.center().length() < 1e-6);
        assert_eq!(placement.transform.rotation, up_axis_correction());
    }

    #[test]
    fn vertex_count_is_recorded() {
        let placement = normalize_model(
            &model(ModelFormat::Obj, vec![unit_quad("a"), unit_quad("b")]),
            ModelUnit::Meters,
        )
        .unwrap();
        assert_eq!(placement.vertex_count, 8);
    }

    #[test]
    fn empty_model_is_rejected() {
        assert!(matches!(
            normalize_model(&model(ModelFormat::Obj, Vec::new()), ModelUnit::Meters),
            Err(LoadError::EmptyGeometry)
        ));
    }
}
