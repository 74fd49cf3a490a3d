/// Model units accepted by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelUnit {
    #[default]
    Meters,
    Millimeters,
}

impl ModelUnit {
    /// Convert string identifier to unit for RPC compatibility.
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "m" => Some(Self::Meters),
            "mm" => Some(Self::Millimeters),
            _ => None,
        }
    }

    pub fn to_string(&self) -> &'static str {
        match self {
            Self::Meters => "m",
            Self::Millimeters => "mm",
        }
    }

    /// Uniform scale applied to a loaded root so the scene works in metres.
    pub fn scale_factor(&self) -> f32 {
        match self {
            Self::Meters => 1.0,
            Self::Millimeters => 0.001,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millimetre_scale_is_exact() {
        assert_eq!(ModelUnit::Millimeters.scale_factor(), 0.001);
        assert_eq!(ModelUnit::Meters.scale_factor(), 1.0);
    }

    #[test]
    fn parses_known_units_only() {
        assert_eq!(ModelUnit::from_string("mm"), Some(ModelUnit::Millimeters));
        assert_eq!(ModelUnit::from_string("M"), Some(ModelUnit::Meters));
        assert_eq!(ModelUnit::from_string("ft"), None);
    }
}
