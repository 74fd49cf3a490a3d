/// Height heat-map and linear depth materials.
pub mod analysis_materials;

/// Full-screen pixelation pass after tonemapping.
pub mod pixelate_post_processing;

/// Style presets with original-material restore.
pub mod render_style;
