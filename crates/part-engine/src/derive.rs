//! Derived-measure pass.
//!
//! Secondary dimensions are computed once, up front, into a separate value.
//! The caller's measure tree is never written to.

use std::fmt::Debug;

use part_types::{MeasureError, MeasureNode};

use crate::error::{BuildError, MeasureContext};

pub trait DeriveMeasures {
    type Derived: Debug + Clone + PartialEq;

    /// Compute the derived measures. Must be deterministic.
    fn derive(measures: &MeasureNode) -> Result<Self::Derived, MeasureError>;
}

/// Run the derivation of `D`, attributing failures to `part`.
pub fn derive_for<D: DeriveMeasures>(part: &str, measures: &MeasureNode) -> Result<D::Derived, BuildError> {
    D::derive(measures).for_part(part)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ramp;

    #[derive(Debug, Clone, PartialEq)]
    struct RampDerived {
        slope_deg: f64,
    }

    impl DeriveMeasures for Ramp {
        type Derived = RampDerived;

        fn derive(measures: &MeasureNode) -> Result<RampDerived, MeasureError> {
            let v = measures.view();
            let rise = v.length("rise")?;
            let run = v.positive("run")?;
            Ok(RampDerived {
                slope_deg: rise.atan2(run).to_degrees(),
            })
        }
    }

    #[test]
    fn test_derivation_leaves_input_alone() {
        let m = MeasureNode::new().with("rise", 1.0).with("run", 1.0);
        let before = m.clone();
        let d = derive_for::<Ramp>("ramp", &m).unwrap();
        assert!((d.slope_deg - 45.0).abs() < 1e-12);
        assert_eq!(m, before);
        assert_eq!(derive_for::<Ramp>("ramp", &m).unwrap(), d);
    }

    #[test]
    fn test_missing_measure_names_path() {
        let m = MeasureNode::new().with("rise", 1.0);
        let err = derive_for::<Ramp>("ramp", &m).unwrap_err();
        assert_eq!(err.measure().map(|p| p.to_string()), Some("run".to_string()));
    }
}
