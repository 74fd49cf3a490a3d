//! Binary/ASCII STL import via `stl_io`.
//!
//! STL is the one accepted format with a Z-up convention; the loader applies
//! the fixed up-axis correction to its root after normalization. Face
//! normals in the file are ignored in favour of recomputed smooth normals —
//! exports frequently ship zeroed or unnormalized ones.

use std::io::Cursor;

use crate::engine::loading::formats::LoadError;
use crate::engine::loading::mesh_data::MeshData;

const DEFAULT_BASE_COLOR: [f32; 4] = [0.75, 0.75, 0.78, 1.0];

pub fn import_stl(bytes: &[u8]) -> Result<Vec<MeshData>, LoadError> {
    let mut cursor = Cursor::new(bytes);
    let stl = stl_io::read_stl(&mut cursor).map_err(|error| LoadError::Parse {
        format: "STL",
        message: error.to_string(),
    })?;

    if stl.faces.is_empty() || stl.vertices.is_empty() {
        return Err(LoadError::EmptyGeometry);
    }

    let positions: Vec<[f32; 3]> = stl
        .vertices
        .iter()
        .map(|vertex| [vertex[0], vertex[1], vertex[2]])
        .collect();

    let mut indices = Vec::with_capacity(stl.faces.len() * 3);
    for face in &stl.faces {
        let [a, b, c] = face.vertices;
        if a < positions.len() && b < positions.len() && c < positions.len() {
            indices.extend_from_slice(&[a as u32, b as u32, c as u32]);
        }
    }

    let mut data = MeshData {
        name: "stl".to_string(),
        positions,
        normals: Vec::new(),
        uvs: Vec::new(),
        indices,
        base_color: DEFAULT_BASE_COLOR,
    };
    data.compute_smooth_normals();
    Ok(vec![data])
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Binary STL with a single triangle in the XY plane.
    fn single_triangle_stl() -> Vec<u8> {
        let mut bytes = vec![0u8; 80]; // header
        bytes.extend_from_slice(&1u32.to_le_bytes()); // triangle count
        let triangle: [[f32; 3]; 4] = [
            [0.0, 0.0, 1.0], // normal
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
        ];
        for vector in triangle {
            for component in vector {
                bytes.extend_from_slice(&component.to_le_bytes());
            }
        }
        bytes.extend_from_slice(&0u16.to_le_bytes()); // attribute byte count
        bytes
    }

    #[test]
    fn binary_triangle_parses() {
        let meshes = import_stl(&single_triangle_stl()).expect("stl should parse");
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].vertex_count(), 3);
        assert_eq!(meshes[0].indices.len(), 3);
        assert_eq!(meshes[0].normals.len(), 3);
    }

    #[test]
    fn truncated_data_is_a_parse_error() {
        assert!(matches!(
            import_stl(&[0u8; 10]),
            Err(LoadError::Parse { format: "STL", .. })
        ));
    }
}
