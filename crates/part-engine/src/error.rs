//! Build failures. Every variant is fatal: no partial part is returned.

use modeling_ops::OpError;
use part_types::{DisplayError, MeasureError, MeasurePath};

/// Why a part could not be built.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Missing, mistyped or inconsistent measures.
    #[error("invalid measures for {part}: {source}")]
    Configuration {
        part: String,
        #[source]
        source: MeasureError,
    },

    /// The kernel refused a construction step.
    #[error("step `{step}`{} failed: {source}", measure_note(.measure))]
    Geometry {
        step: String,
        measure: Option<MeasurePath>,
        #[source]
        source: OpError,
    },

    #[error("composition order violated at `{step}`: {reason}")]
    CompositionOrder { step: String, reason: String },

    #[error("no workplane tagged `{name}`")]
    TagNotFound { name: String },

    #[error("sub-part {part} failed: {source}")]
    SubPart {
        part: String,
        #[source]
        source: Box<BuildError>,
    },

    #[error("unknown part `{name}`")]
    UnknownPart { name: String },

    #[error("invalid display options: {0}")]
    Display(#[from] DisplayError),
}

fn measure_note(measure: &Option<MeasurePath>) -> String {
    match measure {
        Some(path) => format!(" (measure `{path}`)"),
        None => String::new(),
    }
}

impl BuildError {
    pub fn configuration(part: impl Into<String>, source: MeasureError) -> Self {
        BuildError::Configuration {
            part: part.into(),
            source,
        }
    }

    /// The construction step that failed, looking through sub-parts.
    pub fn step(&self) -> Option<&str> {
        match self {
            BuildError::Geometry { step, .. } | BuildError::CompositionOrder { step, .. } => Some(step),
            BuildError::SubPart { source, .. } => source.step(),
            _ => None,
        }
    }

    /// The measure path behind the failure, looking through sub-parts.
    pub fn measure(&self) -> Option<&MeasurePath> {
        match self {
            BuildError::Configuration { source, .. } => Some(source.path()),
            BuildError::Geometry { measure, .. } => measure.as_ref(),
            BuildError::SubPart { source, .. } => source.measure(),
            _ => None,
        }
    }

    /// Names of the nested parts down to the failing one, outermost first.
    pub fn part_chain(&self) -> Vec<&str> {
        match self {
            BuildError::SubPart { part, source } => {
                let mut chain = vec![part.as_str()];
                chain.extend(source.part_chain());
                chain
            }
            BuildError::Configuration { part, .. } => vec![part.as_str()],
            _ => Vec::new(),
        }
    }
}

/// Attach the construction step (and the measure driving it) to an
/// operation error.
pub trait StepContext<T> {
    fn step(self, step: &str) -> Result<T, BuildError>;

    fn step_with(self, step: &str, measure: impl Into<MeasurePath>) -> Result<T, BuildError>;
}

impl<T, E: Into<OpError>> StepContext<T> for Result<T, E> {
    fn step(self, step: &str) -> Result<T, BuildError> {
        self.map_err(|e| BuildError::Geometry {
            step: step.to_string(),
            measure: None,
            source: e.into(),
        })
    }

    fn step_with(self, step: &str, measure: impl Into<MeasurePath>) -> Result<T, BuildError> {
        self.map_err(|e| BuildError::Geometry {
            step: step.to_string(),
            measure: Some(measure.into()),
            source: e.into(),
        })
    }
}

/// Attach the part name to a measure lookup error.
pub trait MeasureContext<T> {
    fn for_part(self, part: &str) -> Result<T, BuildError>;
}

impl<T> MeasureContext<T> for Result<T, MeasureError> {
    fn for_part(self, part: &str) -> Result<T, BuildError> {
        self.map_err(|e| BuildError::configuration(part, e))
    }
}
