use kernel_bridge::{BoundingBox, KernelError, KernelIntrospect, KernelSolidHandle};
use part_types::DisplayOptions;

/// A finished part: one or more solids with display metadata.
///
/// Several solids appear when a part is delivered in pieces (split halves).
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub name: String,
    pub solids: Vec<KernelSolidHandle>,
    pub display: DisplayOptions,
}

impl Part {
    pub fn new(name: impl Into<String>, solids: Vec<KernelSolidHandle>, display: DisplayOptions) -> Self {
        Self {
            name: name.into(),
            solids,
            display,
        }
    }

    /// Total volume of all pieces.
    pub fn volume(&self, introspect: &dyn KernelIntrospect) -> Result<f64, KernelError> {
        self.solids.iter().map(|s| introspect.volume(s)).sum()
    }

    /// Bounding box around all pieces.
    pub fn bounding_box(&self, introspect: &dyn KernelIntrospect) -> Result<BoundingBox, KernelError> {
        self.solids
            .iter()
            .try_fold(BoundingBox::empty(), |acc, s| Ok(acc.union(&introspect.bounding_box(s)?)))
    }

    pub fn piece_count(&self) -> usize {
        self.solids.len()
    }
}
