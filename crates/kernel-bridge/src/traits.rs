use crate::types::*;

/// Core geometry kernel trait. Provides all wire, solid and modification operations.
/// Implemented by TruckKernel (wraps real truck) and MockKernel (analytic test double).
pub trait Kernel {
    /// Create a polyline wire through world points.
    /// A closed wire connects the last point back to the first.
    fn make_polyline_wire(
        &mut self,
        points: &[[f64; 3]],
        closed: bool,
    ) -> Result<KernelWireHandle, KernelError>;

    /// Create a closed circular wire.
    fn make_circle_wire(
        &mut self,
        center: [f64; 3],
        normal: [f64; 3],
        radius: f64,
    ) -> Result<KernelWireHandle, KernelError>;

    /// Extrude coplanar closed wires along a direction vector.
    /// The first wire is the outer boundary, the rest are holes.
    fn extrude_wires(
        &mut self,
        wires: &[KernelWireHandle],
        direction: [f64; 3],
        depth: f64,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Ruled solid between two closed planar wires.
    fn loft_wires(
        &mut self,
        bottom: &KernelWireHandle,
        top: &KernelWireHandle,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Sweep a closed profile along an open path wire.
    /// The profile must be orthogonal to the path at its start.
    fn sweep_wire(
        &mut self,
        profile: &KernelWireHandle,
        path: &KernelWireHandle,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Revolve a closed planar wire around an axis lying in its plane.
    fn revolve_wire(
        &mut self,
        profile: &KernelWireHandle,
        axis_origin: [f64; 3],
        axis_direction: [f64; 3],
        angle: f64,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Cylinder with its base disc centered at `base_center`, extending along `axis`.
    fn make_cylinder(
        &mut self,
        base_center: [f64; 3],
        axis: [f64; 3],
        radius: f64,
        height: f64,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Truncated cone. `top_radius` may be zero.
    fn make_cone(
        &mut self,
        base_center: [f64; 3],
        axis: [f64; 3],
        base_radius: f64,
        top_radius: f64,
        height: f64,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Boolean union of two solids.
    fn boolean_union(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Boolean subtraction: a minus b.
    fn boolean_subtract(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Boolean intersection of two solids.
    fn boolean_intersect(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Fillet (round) the specified edges with the given radius.
    fn fillet_edges(
        &mut self,
        solid: &KernelSolidHandle,
        edges: &[KernelId],
        radius: f64,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Chamfer (bevel) the specified edges with the given distance.
    fn chamfer_edges(
        &mut self,
        solid: &KernelSolidHandle,
        edges: &[KernelId],
        distance: f64,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// A copy of the solid moved by a rigid motion.
    fn transform_solid(
        &mut self,
        solid: &KernelSolidHandle,
        motion: &RigidMotion,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Boundary wires of a planar face, outer wire first.
    fn face_wires(
        &mut self,
        solid: &KernelSolidHandle,
        face: KernelId,
    ) -> Result<Vec<KernelWireHandle>, KernelError>;

    /// Tessellate a solid to a triangle mesh.
    fn tessellate(
        &mut self,
        solid: &KernelSolidHandle,
        tolerance: f64,
    ) -> Result<RenderMesh, KernelError>;
}

/// Topology introspection trait. Provides read-only queries on kernel geometry.
pub trait KernelIntrospect {
    /// List all faces of a solid.
    fn list_faces(&self, solid: &KernelSolidHandle) -> Vec<KernelId>;

    /// List all edges of a solid.
    fn list_edges(&self, solid: &KernelSolidHandle) -> Vec<KernelId>;

    /// List all vertices of a solid.
    fn list_vertices(&self, solid: &KernelSolidHandle) -> Vec<KernelId>;

    /// Get the edges bounding a face.
    fn face_edges(&self, face: KernelId) -> Vec<KernelId>;

    /// Get the faces adjacent to an edge.
    fn edge_faces(&self, edge: KernelId) -> Vec<KernelId>;

    /// Get the vertices at the ends of an edge.
    /// Closed edges return [`KernelId::NONE`] for both ends.
    fn edge_vertices(&self, edge: KernelId) -> (KernelId, KernelId);

    /// Compute the geometric signature of a single entity.
    fn compute_signature(&self, entity: KernelId, kind: TopoKind) -> TopoSignature;

    /// Compute signatures for all entities of a given kind in a solid.
    fn compute_all_signatures(
        &self,
        solid: &KernelSolidHandle,
        kind: TopoKind,
    ) -> Vec<(KernelId, TopoSignature)> {
        let ids = match kind {
            TopoKind::Face => self.list_faces(solid),
            TopoKind::Edge => self.list_edges(solid),
            TopoKind::Vertex => self.list_vertices(solid),
        };
        ids.into_iter()
            .map(|id| (id, self.compute_signature(id, kind)))
            .collect()
    }

    /// Sample points of a wire, in order. Closed wires do not repeat the first point.
    fn wire_points(&self, wire: &KernelWireHandle) -> Result<Vec<[f64; 3]>, KernelError>;

    /// Enclosed volume of a solid.
    fn volume(&self, solid: &KernelSolidHandle) -> Result<f64, KernelError>;

    /// Axis-aligned bounding box of a solid.
    fn bounding_box(&self, solid: &KernelSolidHandle) -> Result<BoundingBox, KernelError>;

    /// Whether a point lies inside the solid.
    fn contains_point(
        &self,
        solid: &KernelSolidHandle,
        point: [f64; 3],
    ) -> Result<bool, KernelError>;
}
