use kernel_bridge::{KernelError, KernelId, KernelWireHandle};

/// Errors from modeling operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OpError {
    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("no profiles available for operation")]
    NoProfiles,

    #[error("invalid parameter: {reason}")]
    InvalidParameter { reason: String },

    #[error("radius {radius} exceeds the material at edge {edge:?}: at most {limit} fits")]
    ExceedsMaterial {
        radius: f64,
        limit: f64,
        edge: KernelId,
    },

    #[error("selector {selector} matched nothing")]
    EmptySelection { selector: String },

    #[error("wires are not coplanar: {reason}")]
    NotCoplanar { reason: String },
}

/// A planar region as wires: the outer boundary and the holes inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub outer: KernelWireHandle,
    pub holes: Vec<KernelWireHandle>,
}

impl Profile {
    pub fn new(outer: KernelWireHandle) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    pub fn with_hole(mut self, hole: KernelWireHandle) -> Self {
        self.holes.push(hole);
        self
    }

    /// Outer wire first, then the holes, as the kernel's extrude expects.
    pub fn wires(&self) -> Vec<KernelWireHandle> {
        std::iter::once(self.outer.clone())
            .chain(self.holes.iter().cloned())
            .collect()
    }
}
