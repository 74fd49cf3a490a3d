//! glTF / GLB import.
//!
//! Parses with the `gltf` crate, flattens the node hierarchy by baking node
//! transforms into vertex data, and keeps only what the viewer needs from
//! materials (the PBR base colour factor).

use bevy::prelude::*;

use crate::engine::loading::formats::LoadError;
use crate::engine::loading::mesh_data::MeshData;

pub fn import_gltf(bytes: &[u8]) -> Result<Vec<MeshData>, LoadError> {
    let (document, buffers, _images) =
        gltf::import_slice(bytes).map_err(|error| LoadError::Parse {
            format: "glTF",
            message: error.to_string(),
        })?;

    let mut meshes = Vec::new();
    if let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) {
        for node in scene.nodes() {
            collect_node(&node, Mat4::IDENTITY, &buffers, &mut meshes);
        }
    }

    // Some exporters write meshes without a scene; fall back to the mesh list.
    if meshes.is_empty() {
        for mesh in document.meshes() {
            collect_mesh(&mesh, Mat4::IDENTITY, &buffers, &mut meshes);
        }
    }

    if meshes.is_empty() {
        return Err(LoadError::EmptyGeometry);
    }
    Ok(meshes)
}

fn collect_node(
    node: &gltf::Node,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<MeshData>,
) {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        collect_mesh(&mesh, world, buffers, out);
    }
    for child in node.children() {
        collect_node(&child, world, buffers, out);
    }
}

fn collect_mesh(
    mesh: &gltf::Mesh,
    world: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<MeshData>,
) {
    for primitive in mesh.primitives() {
        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
        let Some(positions) = reader.read_positions() else {
            continue;
        };
        let positions: Vec<[f32; 3]> = positions.collect();
        if positions.is_empty() {
            continue;
        }

        let normals: Vec<[f32; 3]> = reader
            .read_normals()
            .map(|normals| normals.collect())
            .unwrap_or_default();
        let uvs: Vec<[f32; 2]> = reader
            .read_tex_coords(0)
            .map(|coords| coords.into_f32().collect())
            .unwrap_or_default();
        let indices: Vec<u32> = reader
            .read_indices()
            .map(|indices| indices.into_u32().collect())
            .unwrap_or_else(|| (0..positions.len() as u32).collect());

        let base_color = primitive
            .material()
            .pbr_metallic_roughness()
            .base_color_factor();

        let mut data = MeshData {
            name: mesh.name().unwrap_or("mesh").to_string(),
            positions,
            normals,
            uvs,
            indices,
            base_color,
        };
        if data.normals.len() != data.positions.len() {
            data.compute_smooth_normals();
        }
        data.apply_transform(world);
        out.push(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_are_a_parse_error() {
        let result = import_gltf(b"definitely not a gltf file");
        assert!(matches!(result, Err(LoadError::Parse { format: "glTF", .. })));
    }

    #[test]
    fn minimal_embedded_gltf_parses() {
        // One triangle, positions only, base64-embedded buffer.
        let gltf_json = r#"{
            "asset": {"version": "2.0"},
            "scene": 0,
            "scenes": [{"nodes": [0]}],
            "nodes": [{"mesh": 0, "translation": [2.0, 0.0, 0.0]}],
            "meshes": [{"primitives": [{"attributes": {"POSITION": 0}}]}],
            "accessors": [{
                "bufferView": 0,
                "componentType": 5126,
                "count": 3,
                "type": "VEC3",
                "min": [0.0, 0.0, 0.0],
                "max": [1.0, 1.0, 0.0]
            }],
            "bufferViews": [{"buffer": 0, "byteOffset": 0, "byteLength": 36}],
            "buffers": [{
                "byteLength": 36,
                "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAACAPwAAgD8AAAAA"
            }]
        }"#;

        let meshes = import_gltf(gltf_json.as_bytes()).expect("embedded gltf should parse");
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].vertex_count(), 3);
        // Node translation is baked into positions.
        let bounds = meshes[0].bounds().unwrap();
        assert_eq!(bounds.min.x, 2.0);
        assert_eq!(bounds.max.x, 3.0);
    }
}
