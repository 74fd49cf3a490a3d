//! Flat ground reference grid built from line-list meshes.

use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::PrimitiveTopology;
use bevy::render::view::NoFrustumCulling;
use constants::render_settings::{GRID_CELL_SIZE, GRID_COLOR, GRID_EXTENT};

#[derive(Component)]
pub struct GroundGrid;

pub fn spawn_ground_grid(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
) {
    let grid_material = materials.add(StandardMaterial {
        base_color: GRID_COLOR,
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..default()
    });

    commands.spawn((
        Mesh3d(meshes.add(grid_line_mesh(GRID_EXTENT, GRID_CELL_SIZE))),
        MeshMaterial3d(grid_material),
        Transform::IDENTITY,
        Visibility::Visible,
        NoFrustumCulling,
        GroundGrid,
    ));
}

/// One mesh holding every grid line; lines run both axes across the XZ
/// plane at y = 0.
fn grid_line_mesh(extent: f32, cell_size: f32) -> Mesh {
    let mut vertices: Vec<[f32; 3]> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    let line_count = (extent * 2.0 / cell_size).round() as i32;
    for i in 0..=line_count {
        let offset = -extent + i as f32 * cell_size;

        let base = vertices.len() as u32;
        vertices.push([offset, 0.0, -extent]);
        vertices.push([offset, 0.0, extent]);
        vertices.push([-extent, 0.0, offset]);
        vertices.push([extent, 0.0, offset]);
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 3]);
    }

    let mut mesh = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::RENDER_WORLD);
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, vertices);
    mesh.insert_indices(bevy::render::mesh::Indices::U32(indices));
    mesh
}
