use part_types::{KernelTolerance, MeasureNode};

use crate::metadata::PresetMetadata;

/// A named set of measures for one part type, with the kernel settings to
/// build it with.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurePreset {
    pub part: String,
    pub metadata: PresetMetadata,
    pub settings: KernelTolerance,
    pub measures: MeasureNode,
}

impl MeasurePreset {
    pub fn new(part: impl Into<String>, name: impl Into<String>, measures: MeasureNode) -> Self {
        Self {
            part: part.into(),
            metadata: PresetMetadata::new(name),
            settings: KernelTolerance::default(),
            measures,
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}
