use thiserror::Error;

/// Model formats accepted by the loader, dispatched on file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Gltf,
    Glb,
    Obj,
    Stl,
}

impl ModelFormat {
    pub fn from_extension(ext: &str) -> Result<Self, LoadError> {
        match ext.to_lowercase().as_str() {
            "gltf" => Ok(Self::Gltf),
            "glb" => Ok(Self::Glb),
            "obj" => Ok(Self::Obj),
            "stl" => Ok(Self::Stl),
            other => Err(LoadError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Extension dispatch from a file name, URL or path. Query strings are
    /// stripped first so `model.glb?v=2` still resolves.
    pub fn from_path(path: &str) -> Result<Self, LoadError> {
        let without_query = path.split('?').next().unwrap_or(path);
        let extension = without_query
            .rsplit('.')
            .next()
            .filter(|ext| !ext.contains('/') && *ext != without_query)
            .ok_or_else(|| LoadError::UnsupportedFormat(String::new()))?;
        Self::from_extension(extension)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Gltf => "glTF",
            Self::Glb => "GLB",
            Self::Obj => "OBJ",
            Self::Stl => "STL",
        }
    }

    /// STL comes out of CAD packages Z-up and gets the fixed up-axis
    /// correction; glTF and OBJ are already Y-up.
    pub fn is_z_up(&self) -> bool {
        matches!(self, Self::Stl)
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported file format: .{0}")]
    UnsupportedFormat(String),
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },
    #[error("failed to parse {format} data: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },
    #[error("model contains no geometry")]
    EmptyGeometry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_known_extensions() {
        assert_eq!(ModelFormat::from_path("house.glb").unwrap(), ModelFormat::Glb);
        assert_eq!(
            ModelFormat::from_path("scene.GLTF").unwrap(),
            ModelFormat::Gltf
        );
        assert_eq!(
            ModelFormat::from_path("assets/site.obj").unwrap(),
            ModelFormat::Obj
        );
        assert_eq!(
            ModelFormat::from_path("https://cdn.example.com/tower.stl?v=3").unwrap(),
            ModelFormat::Stl
        );
    }

    #[test]
    fn rejects_unknown_extensions() {
        assert!(matches!(
            ModelFormat::from_path("model.3dm"),
            Err(LoadError::UnsupportedFormat(ext)) if ext == "3dm"
        ));
        assert!(matches!(
            ModelFormat::from_path("model.fbx"),
            Err(LoadError::UnsupportedFormat(_))
        ));
        assert!(ModelFormat::from_path("no_extension").is_err());
    }

    #[test]
    fn only_stl_needs_axis_correction() {
        assert!(ModelFormat::Stl.is_z_up());
        assert!(!ModelFormat::Glb.is_z_up());
        assert!(!ModelFormat::Obj.is_z_up());
    }
}
