/// Face, edge or vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopoKind {
    Vertex,
    Edge,
    Face,
}

/// What the kernel can tell about one face, edge or vertex. Fields that do
/// not apply to the entity's kind stay `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopoSignature {
    /// `planar`, `cylindrical`, `conical`, `ruled`, `revolved` for faces;
    /// `line`, `arc`, `circle`, `curve` for edges; `point` for vertices.
    pub surface_type: Option<String>,
    pub area: Option<f64>,
    pub centroid: Option<[f64; 3]>,
    /// Outward unit normal of a planar face.
    pub normal: Option<[f64; 3]>,
    /// Unit direction of a straight edge.
    pub direction: Option<[f64; 3]>,
    /// `[min_x, min_y, min_z, max_x, max_y, max_z]`
    pub bbox: Option<[f64; 6]>,
    pub length: Option<f64>,
}

impl TopoSignature {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_line(&self) -> bool {
        self.surface_type.as_deref() == Some("line")
    }
}
