pub use part_types::{BoundingBox, RigidMotion, TopoKind, TopoSignature};

/// A solid owned by one kernel instance. Handles from another kernel are
/// rejected with [`KernelError::EntityNotFound`]-style errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KernelSolidHandle(pub(crate) u64);

impl KernelSolidHandle {
    pub(crate) fn id(&self) -> u64 {
        self.0
    }
}

/// An open or closed chain of edges.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KernelWireHandle(pub(crate) u64);

impl KernelWireHandle {
    pub(crate) fn id(&self) -> u64 {
        self.0
    }
}

/// Face, edge or vertex id, valid while its solid lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KernelId(pub u64);

impl KernelId {
    /// End vertex of an edge that has none, like a full circle.
    pub const NONE: KernelId = KernelId(0);
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KernelError {
    #[error("boolean operation failed: {reason}")]
    BooleanFailed { reason: String },

    #[error("fillet failed: {reason}")]
    FilletFailed { reason: String },

    #[error("chamfer failed: {reason}")]
    ChamferFailed { reason: String },

    #[error("invalid geometry: {reason}")]
    InvalidGeometry { reason: String },

    #[error("tessellation failed: {reason}")]
    TessellationFailed { reason: String },

    #[error("entity not found: {id:?}")]
    EntityNotFound { id: KernelId },

    #[error("operation not supported: {operation}")]
    NotSupported { operation: String },

    #[error("kernel error: {message}")]
    Other { message: String },
}

/// Triangles of a tessellated solid, grouped by face.
#[derive(Debug, Clone, Default)]
pub struct RenderMesh {
    /// `[x0, y0, z0, x1, ...]`
    pub vertices: Vec<f32>,
    /// One normal per vertex, same layout as `vertices`.
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
    pub face_ranges: Vec<FaceRange>,
}

impl RenderMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Corner positions of triangle `i`.
    pub fn triangle(&self, i: usize) -> [[f32; 3]; 3] {
        let corner = |k: usize| {
            let v = self.indices[3 * i + k] as usize * 3;
            [self.vertices[v], self.vertices[v + 1], self.vertices[v + 2]]
        };
        [corner(0), corner(1), corner(2)]
    }
}

/// The index range `start_index..end_index` belongs to face `face_id`.
#[derive(Debug, Clone)]
pub struct FaceRange {
    pub face_id: KernelId,
    pub start_index: u32,
    pub end_index: u32,
}
