//! Model loading pipeline.
//!
//! Extension dispatch to format-specific importers, a parser-neutral mesh
//! payload, post-parse normalization (unit scale, up-axis correction,
//! centering), and the guarded request/complete systems that replace the
//! scene's model container.

/// Extension dispatch and loader errors.
pub mod formats;

/// glTF/GLB importer (node transforms baked into vertices).
pub mod gltf_import;

/// Parser-neutral mesh payload and loaded-model aggregate.
pub mod mesh_data;

/// Request/complete systems with the one-load-in-flight guard.
pub mod model_loader;

/// Unit scaling, axis correction, centering, derived attributes.
pub mod normalize;

/// Wavefront OBJ importer.
pub mod obj_import;

/// Binary/ASCII STL importer (the Z-up CAD path).
pub mod stl_import;
