//! Parser-neutral mesh payload.
//!
//! Every importer lowers its format into `MeshData`, so normalization and
//! entity spawning never see a format-specific type. Kept free of render
//! resources to stay constructible on the async loading task.

use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};

use crate::engine::assets::bounds::ModelBounds;
use crate::engine::loading::formats::ModelFormat;

#[derive(Debug, Clone)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub base_color: [f32; 4],
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn bounds(&self) -> Option<ModelBounds> {
        ModelBounds::from_points(self.positions.iter().map(|p| Vec3::from_array(*p)))
    }

    /// Bake a node transform into the vertex data (glTF scene flattening).
    pub fn apply_transform(&mut self, matrix: Mat4) {
        if matrix == Mat4::IDENTITY {
            return;
        }
        for position in &mut self.positions {
            *position = matrix.transform_point3(Vec3::from_array(*position)).to_array();
        }
        let normal_matrix = matrix.inverse().transpose();
        for normal in &mut self.normals {
            *normal = normal_matrix
                .transform_vector3(Vec3::from_array(*normal))
                .normalize_or_zero()
                .to_array();
        }
    }

    /// Area-weighted smooth normals for formats that ship without them.
    pub fn compute_smooth_normals(&mut self) {
        let mut accumulated = vec![Vec3::ZERO; self.positions.len()];
        for triangle in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];
            if i0 >= accumulated.len() || i1 >= accumulated.len() || i2 >= accumulated.len() {
                continue;
            }
            let v0 = Vec3::from_array(self.positions[i0]);
            let v1 = Vec3::from_array(self.positions[i1]);
            let v2 = Vec3::from_array(self.positions[i2]);
            // Un-normalized cross product weights large faces more heavily.
            let face_normal = (v1 - v0).cross(v2 - v0);
            accumulated[i0] += face_normal;
            accumulated[i1] += face_normal;
            accumulated[i2] += face_normal;
        }
        self.normals = accumulated
            .into_iter()
            .map(|n| n.normalize_or(Vec3::Y).to_array())
            .collect();
    }

    pub fn to_mesh(&self) -> Mesh {
        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        );
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions.clone());
        if self.normals.len() == self.positions.len() {
            mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals.clone());
        }
        if self.uvs.len() == self.positions.len() {
            mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, self.uvs.clone());
        }
        mesh.insert_indices(Indices::U32(self.indices.clone()));
        mesh
    }
}

/// A fully parsed model, ready for normalization and spawning.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub source_name: String,
    pub format: ModelFormat,
    pub meshes: Vec<MeshData>,
}

impl LoadedModel {
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(MeshData::vertex_count).sum()
    }

    /// Bounds over all meshes in raw model space (before normalization).
    pub fn raw_bounds(&self) -> Option<ModelBounds> {
        self.meshes
            .iter()
            .filter_map(MeshData::bounds)
            .reduce(|a, b| a.union(&b))
    }
}

#[cfg(test)]
pub(crate) fn unit_quad(name: &str) -> MeshData {
    MeshData {
        name: name.to_string(),
        positions: vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ],
        normals: Vec::new(),
        uvs: Vec::new(),
        indices: vec![0, 1, 2, 0, 2, 3],
        base_color: [1.0, 1.0, 1.0, 1.0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smooth_normals_for_flat_quad_point_forward() {
        let mut quad = unit_quad("quad");
        quad.compute_smooth_normals();
        assert_eq!(quad.normals.len(), 4);
        for normal in &quad.normals {
            assert!((Vec3::from_array(*normal) - Vec3::Z).length() < 1e-5);
        }
    }

    #[test]
    fn transform_bakes_into_positions() {
        let mut quad = unit_quad("quad");
        quad.compute_smooth_normals();
        quad.apply_transform(Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)));
        let bounds = quad.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(11.0, 1.0, 0.0));
        // Pure translation leaves normals untouched.
        assert!((Vec3::from_array(quad.normals[0]) - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn model_vertex_count_sums_meshes() {
        let model = LoadedModel {
            source_name: "two_quads.obj".into(),
            format: ModelFormat::Obj,
            meshes: vec![unit_quad("a"), unit_quad("b")],
        };
        assert_eq!(model.vertex_count(), 8);
    }
}
