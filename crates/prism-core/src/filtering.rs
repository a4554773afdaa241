//! Texture filtering modes and their technique names

use serde::{Deserialize, Serialize};

/// Texture filtering mode selectable on a loaded effect.
///
/// Each mode corresponds to a named technique in the effect's technique
/// table. The set is closed; cycling walks the modes in a fixed
/// round-robin order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilteringMethod {
    /// Nearest-neighbor sampling.
    #[default]
    Point,
    /// Bilinear/trilinear sampling.
    Linear,
    /// Anisotropic sampling.
    Anisotropic,
}

impl FilteringMethod {
    /// All modes, in cycle order.
    pub const ALL: [FilteringMethod; 3] = [
        FilteringMethod::Point,
        FilteringMethod::Linear,
        FilteringMethod::Anisotropic,
    ];

    /// Returns the next mode in the fixed order
    /// Point -> Linear -> Anisotropic -> Point.
    pub fn next(self) -> Self {
        match self {
            FilteringMethod::Point => FilteringMethod::Linear,
            FilteringMethod::Linear => FilteringMethod::Anisotropic,
            FilteringMethod::Anisotropic => FilteringMethod::Point,
        }
    }

    /// Returns the technique name associated with this mode.
    pub fn technique_name(self) -> &'static str {
        match self {
            FilteringMethod::Point => "FilterPoint",
            FilteringMethod::Linear => "FilterLinear",
            FilteringMethod::Anisotropic => "FilterAnisotropic",
        }
    }
}

impl std::fmt::Display for FilteringMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FilteringMethod::Point => "point",
            FilteringMethod::Linear => "linear",
            FilteringMethod::Anisotropic => "anisotropic",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_returns_to_start_after_three_steps() {
        for mode in FilteringMethod::ALL {
            assert_eq!(mode.next().next().next(), mode);
        }
    }

    #[test]
    fn cycle_order_is_fixed() {
        let mut mode = FilteringMethod::Point;
        mode = mode.next();
        assert_eq!(mode, FilteringMethod::Linear);
        mode = mode.next();
        assert_eq!(mode, FilteringMethod::Anisotropic);
        mode = mode.next();
        assert_eq!(mode, FilteringMethod::Point);
    }

    #[test]
    fn repeated_cycling_stays_in_closed_set() {
        let mut mode = FilteringMethod::default();
        for _ in 0..100 {
            mode = mode.next();
            assert!(FilteringMethod::ALL.contains(&mode));
            assert!([
                "FilterPoint",
                "FilterLinear",
                "FilterAnisotropic"
            ]
            .contains(&mode.technique_name()));
        }
    }

    #[test]
    fn default_mode_is_point() {
        assert_eq!(FilteringMethod::default(), FilteringMethod::Point);
        assert_eq!(FilteringMethod::default().technique_name(), "FilterPoint");
    }
}
