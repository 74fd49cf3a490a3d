use bevy::prelude::*;

use crate::engine::assets::bounds::ModelBounds;

/// Mutable group node owning zero-or-one loaded model subtrees, replaced
/// wholesale on each load. Derived attributes are recomputed synchronously
/// after every load; there is no incremental diffing.
#[derive(Resource, Default)]
pub struct ModelContainer {
    /// Outer container entity. Animation rotates this one: after
    /// normalization the model's bounding-box centre sits on the origin, so
    /// rotating the container rotates about the geometric centre.
    pub root: Option<Entity>,
    pub source_name: Option<String>,
    pub bounds: Option<ModelBounds>,
    /// Bounds in raw model space, used by the section-cut sweep.
    pub raw_bounds: Option<ModelBounds>,
    pub max_dimension: f32,
    pub vertex_count: usize,
}

impl ModelContainer {
    pub fn is_loaded(&self) -> bool {
        self.root.is_some()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn info_json(&self) -> serde_json::Value {
        match (&self.source_name, &self.bounds) {
            (Some(name), Some(bounds)) => serde_json::json!({
                "loaded": true,
                "name": name,
                "max_dimension": self.max_dimension,
                "vertex_count": self.vertex_count,
                "size": [bounds.size().x, bounds.size().y, bounds.size().z],
            }),
            _ => serde_json::json!({ "loaded": false }),
        }
    }
}

/// Marker for the outer container entity (animation pivot).
#[derive(Component)]
pub struct LoadedModelRoot;

/// Marker for every renderable mesh entity of the loaded model.
#[derive(Component)]
pub struct ModelMesh;

/// Deep-copied original material handle, kept so the Original style preset
/// can undo Clay/Blueprint/analysis swaps.
#[derive(Component, Clone)]
pub struct OriginalMaterial(pub Handle<StandardMaterial>);

/// Marks meshes eligible for deferred edge-line generation (the Blueprint
/// preset's outline pass); generation itself does not happen at load time.
#[derive(Component)]
pub struct EdgeLineCandidate;

/// Mesh bounds in raw model space, for ray tests and the section cut.
#[derive(Component, Clone, Copy)]
pub struct MeshLocalBounds(pub ModelBounds);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_reports_unloaded_container() {
        let container = ModelContainer::default();
        assert_eq!(container.info_json()["loaded"], false);
    }

    #[test]
    fn clear_resets_derived_attributes() {
        let mut container = ModelContainer {
            source_name: Some("villa.glb".into()),
            max_dimension: 12.0,
            vertex_count: 4096,
            ..Default::default()
        };
        container.clear();
        assert!(!container.is_loaded());
        assert_eq!(container.vertex_count, 0);
        assert!(container.source_name.is_none());
    }
}
