//! Wavefront OBJ import via `tobj`.
//!
//! Material libraries are not resolved — the viewer's style presets replace
//! per-face materials anyway — so the MTL callback hands back an empty set.

use std::io::{BufReader, Cursor};

use crate::engine::loading::formats::LoadError;
use crate::engine::loading::mesh_data::MeshData;

const DEFAULT_BASE_COLOR: [f32; 4] = [0.8, 0.8, 0.8, 1.0];

pub fn import_obj(bytes: &[u8]) -> Result<Vec<MeshData>, LoadError> {
    let mut reader = BufReader::new(Cursor::new(bytes));
    let (models, _materials) = tobj::load_obj_buf(
        &mut reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |_material_path| Ok((Vec::new(), Default::default())),
    )
    .map_err(|error| LoadError::Parse {
        format: "OBJ",
        message: error.to_string(),
    })?;

    let mut meshes = Vec::new();
    for model in models {
        let mesh = model.mesh;
        if mesh.positions.is_empty() {
            continue;
        }
        let positions: Vec<[f32; 3]> = mesh
            .positions
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]])
            .collect();
        let normals: Vec<[f32; 3]> = mesh
            .normals
            .chunks_exact(3)
            .map(|n| [n[0], n[1], n[2]])
            .collect();
        let uvs: Vec<[f32; 2]> = mesh
            .texcoords
            .chunks_exact(2)
            .map(|uv| [uv[0], uv[1]])
            .collect();

        let mut data = MeshData {
            name: if model.name.is_empty() {
                "obj".to_string()
            } else {
                model.name
            },
            positions,
            normals,
            uvs,
            indices: mesh.indices,
            base_color: DEFAULT_BASE_COLOR,
        };
        if data.normals.len() != data.positions.len() {
            data.compute_smooth_normals();
        }
        meshes.push(data);
    }

    if meshes.is_empty() {
        return Err(LoadError::EmptyGeometry);
    }
    Ok(meshes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBE_FACE: &str = "\
o face
v 0.0 0.0 0.0
v 2.0 0.0 0.0
v 2.0 2.0 0.0
v 0.0 2.0 0.0
f 1 2 3 4
";

    #[test]
    fn quad_is_triangulated() {
        let meshes = import_obj(CUBE_FACE.as_bytes()).expect("obj should parse");
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].name, "face");
        assert_eq!(meshes[0].vertex_count(), 4);
        // One quad becomes two triangles.
        assert_eq!(meshes[0].indices.len(), 6);
        // Missing normals are computed.
        assert_eq!(meshes[0].normals.len(), 4);
    }

    #[test]
    fn geometry_free_input_is_rejected() {
        assert!(matches!(
            import_obj(b"# just a comment\n"),
            Err(LoadError::EmptyGeometry)
        ));
    }
}
