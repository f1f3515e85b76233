use serde::{Deserialize, Serialize};

/// The single configurable tolerance set shared by kernels, operations and
/// the wire composer.
///
/// Values are in model units (millimetres) and radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelTolerance {
    /// Distance below which two points are coincident.
    pub coincidence: f64,
    /// Angle below which two directions count as parallel.
    pub angular: f64,
    /// Extra length given to cutting tools so that their faces never
    /// coincide with faces of the solid being cut.
    pub overlap_slack: f64,
    /// Extrusion depth of the throwaway solids in the wire composer.
    pub composer_depth: f64,
    /// Relative tolerance of extreme-position selectors.
    pub selection: f64,
    /// Segments approximating a quarter circle in polygonal evaluation.
    pub arc_segments: u32,
    /// Chordal tolerance for tessellation.
    pub mesh: f64,
    /// Grid cells per axis for numerical volume integration.
    pub volume_samples: u32,
}

impl Default for KernelTolerance {
    fn default() -> Self {
        Self {
            coincidence: 1e-7,
            angular: 1e-6,
            overlap_slack: 0.01,
            composer_depth: 1.0,
            selection: 1e-4,
            arc_segments: 32,
            mesh: 0.05,
            volume_samples: 64,
        }
    }
}

impl KernelTolerance {
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        let positive = [
            ("coincidence", self.coincidence),
            ("angular", self.angular),
            ("composer_depth", self.composer_depth),
            ("selection", self.selection),
            ("mesh", self.mesh),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(format!("{name} must be positive, got {value}"));
            }
        }
        if !(self.overlap_slack.is_finite() && self.overlap_slack >= 0.0) {
            return Err(format!("overlap_slack must not be negative, got {}", self.overlap_slack));
        }
        if self.arc_segments < 2 {
            return Err("arc_segments must be at least 2".to_string());
        }
        if self.volume_samples < 8 {
            return Err("volume_samples must be at least 8".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(KernelTolerance::default().validate().is_ok());
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let t: KernelTolerance = serde_json::from_str(r#"{"overlap_slack": 0.05}"#).unwrap();
        assert_eq!(t.overlap_slack, 0.05);
        assert_eq!(t.arc_segments, KernelTolerance::default().arc_segments);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let t = KernelTolerance {
            coincidence: 0.0,
            ..Default::default()
        };
        assert!(t.validate().unwrap_err().contains("coincidence"));
    }
}
