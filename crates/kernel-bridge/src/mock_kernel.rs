//! Analytic test double implementing Kernel and KernelIntrospect.
//!
//! Solids are exact CSG trees over profile prisms, ruled lofts, frustums and
//! revolutions, so volumes, bounding boxes and point membership can be
//! checked against closed-form expectations. Unions of coplanar prisms of
//! equal height merge into a single prism by polygon union, which is what
//! the wire composer relies on.
//!
//! Fillets and chamfers are supported on single prisms and lofts: straight
//! side edges become rounded profile corners, and a complete cap boundary
//! becomes a rounded or bevelled cap edge.

use std::collections::{BTreeMap, HashMap};

use part_types::{BoundingBox, Frame, KernelTolerance, RigidMotion};

use crate::math::*;
use crate::mock_mesh;
use crate::mock_profile::{CornerOp, Loop, Region, Seg};
use crate::mock_shape::{CapTrim, CapTrims, Frustum, Loft, Prism, Revolution, Section, Shape};
use crate::mock_topology::{EdgeOrigin, FaceGeom, Topology};
use crate::traits::{Kernel, KernelIntrospect};
use crate::types::*;

const STRIDE: u64 = 1_000_000;
const EDGE_BASE: u64 = 300_000;
const VERTEX_BASE: u64 = 600_000;

#[derive(Debug, Clone)]
struct MockWire {
    points: Vec<V3>,
    closed: bool,
    segs: Vec<Seg>,
}

#[derive(Debug, Clone)]
struct MockSolid {
    shape: Shape,
    topology: Topology,
}

/// Analytic test double for the geometry kernel.
/// Implements both Kernel and KernelIntrospect.
pub struct MockKernel {
    tolerance: KernelTolerance,
    next_handle: u64,
    solids: HashMap<u64, MockSolid>,
    wires: HashMap<u64, MockWire>,
}

impl MockKernel {
    pub fn new() -> Self {
        Self::with_tolerance(KernelTolerance::default())
    }

    pub fn with_tolerance(tolerance: KernelTolerance) -> Self {
        Self {
            tolerance,
            next_handle: 1,
            solids: HashMap::new(),
            wires: HashMap::new(),
        }
    }

    pub fn tolerance(&self) -> &KernelTolerance {
        &self.tolerance
    }

    /// Number of solids currently held by the kernel.
    pub fn solid_count(&self) -> usize {
        self.solids.len()
    }

    fn alloc(&mut self) -> u64 {
        let h = self.next_handle;
        self.next_handle += 1;
        h
    }

    fn store(&mut self, shape: Shape) -> KernelSolidHandle {
        let topology = Topology::of(&shape, self.tolerance.arc_segments);
        let h = self.alloc();
        tracing::trace!(
            handle = h,
            faces = topology.faces.len(),
            edges = topology.edges.len(),
            "mock solid stored"
        );
        self.solids.insert(h, MockSolid { shape, topology });
        KernelSolidHandle(h)
    }

    fn store_wire(&mut self, wire: MockWire) -> KernelWireHandle {
        let h = self.alloc();
        self.wires.insert(h, wire);
        KernelWireHandle(h)
    }

    fn solid(&self, handle: &KernelSolidHandle) -> Result<&MockSolid, KernelError> {
        self.solids.get(&handle.id()).ok_or(KernelError::EntityNotFound {
            id: KernelId(handle.id()),
        })
    }

    fn wire(&self, handle: &KernelWireHandle) -> Result<&MockWire, KernelError> {
        self.wires.get(&handle.id()).ok_or(KernelError::EntityNotFound {
            id: KernelId(handle.id()),
        })
    }

    fn decode(id: KernelId) -> (u64, TopoKind, usize) {
        let handle = id.0 / STRIDE;
        let rem = id.0 % STRIDE;
        if rem >= VERTEX_BASE {
            (handle, TopoKind::Vertex, (rem - VERTEX_BASE) as usize)
        } else if rem >= EDGE_BASE {
            (handle, TopoKind::Edge, (rem - EDGE_BASE) as usize)
        } else {
            (handle, TopoKind::Face, rem as usize)
        }
    }

    fn encode(handle: u64, kind: TopoKind, index: usize) -> KernelId {
        let base = match kind {
            TopoKind::Face => 0,
            TopoKind::Edge => EDGE_BASE,
            TopoKind::Vertex => VERTEX_BASE,
        };
        KernelId(handle * STRIDE + base + index as u64)
    }

    /// Look up an entity record, checking kind and range.
    fn entity(&self, id: KernelId, kind: TopoKind) -> Option<(u64, &MockSolid, usize)> {
        let (h, k, idx) = Self::decode(id);
        if k != kind {
            return None;
        }
        let solid = self.solids.get(&h)?;
        let len = match kind {
            TopoKind::Face => solid.topology.faces.len(),
            TopoKind::Edge => solid.topology.edges.len(),
            TopoKind::Vertex => solid.topology.vertices.len(),
        };
        (idx < len).then_some((h, solid, idx))
    }

    fn plane_tol(points: &[V3]) -> f64 {
        let bb = BoundingBox::from_points(points.iter());
        1e-6 * (1.0 + bb.diagonal())
    }

    /// Unit normal of a closed planar wire, following its winding.
    fn wire_normal(wire: &MockWire) -> Result<V3, KernelError> {
        if !wire.closed {
            return Err(KernelError::InvalidGeometry {
                reason: "wire is not closed".to_string(),
            });
        }
        if wire.points.len() < 3 {
            return Err(KernelError::InvalidGeometry {
                reason: "wire has fewer than 3 points".to_string(),
            });
        }
        let n = normalize(newell(&wire.points)).ok_or_else(|| KernelError::InvalidGeometry {
            reason: "wire encloses no area".to_string(),
        })?;
        let tol = Self::plane_tol(&wire.points);
        let p0 = wire.points[0];
        if wire.points.iter().any(|p| dot(n, sub(*p, p0)).abs() > tol) {
            return Err(KernelError::InvalidGeometry {
                reason: "wire is not planar".to_string(),
            });
        }
        Ok(n)
    }

    fn wire_loop(wire: &MockWire, frame: &Frame) -> Loop {
        Loop {
            pts: wire
                .points
                .iter()
                .map(|p| {
                    let l = frame.to_local(*p);
                    [l[0], l[1]]
                })
                .collect(),
            segs: wire.segs.clone(),
        }
    }

    fn frame(origin: V3, x_dir: V3, normal: V3) -> Result<Frame, KernelError> {
        Frame::new(origin, x_dir, normal).map_err(|e| KernelError::InvalidGeometry {
            reason: e.to_string(),
        })
    }

    /// Prism from coplanar closed wires swept along the unit vector `dir`.
    fn prism_from(&self, wires: &[&MockWire], dir: V3, height: f64) -> Result<Prism, KernelError> {
        let outer = wires[0];
        let n = Self::wire_normal(outer)?;
        if dot(n, dir).abs() < 1.0 - self.tolerance.angular {
            return Err(KernelError::NotSupported {
                operation: "extrusion oblique to the profile plane".to_string(),
            });
        }
        let x = orthogonal(dir);
        let frame = Self::frame(outer.points[0], x, dir)?;
        let tol = Self::plane_tol(&outer.points);
        let mut loops = Vec::with_capacity(wires.len());
        for w in wires {
            Self::wire_normal(w)?;
            if w.points.iter().any(|p| frame.to_local(*p)[2].abs() > tol) {
                return Err(KernelError::InvalidGeometry {
                    reason: "wires are not coplanar".to_string(),
                });
            }
            loops.push(Self::wire_loop(w, &frame));
        }
        Ok(Prism {
            frame,
            region: Region::new(loops),
            height,
            trims: CapTrims::default(),
        })
    }

    /// Union two prisms into one when they share base plane, direction and height.
    fn merge_prisms(&self, a: &Shape, b: &Shape) -> Option<Prism> {
        let (Shape::Prism(pa), Shape::Prism(pb)) = (a, b) else {
            return None;
        };
        if !pa.trims.is_empty() || !pb.trims.is_empty() {
            return None;
        }
        let na = pa.frame.normal();
        if dot(na, pb.frame.normal()) < 1.0 - self.tolerance.angular {
            return None;
        }
        let tol = self.tolerance.coincidence.max(1e-9) * 10.0;
        let offset = sub(pb.frame.origin(), pa.frame.origin());
        if dot(na, offset).abs() > tol * (1.0 + norm(offset)) || (pa.height - pb.height).abs() > tol {
            return None;
        }
        let mapped = pb.region.map(|q| {
            let l = pa.frame.to_local(pb.frame.to_world(q));
            [l[0], l[1]]
        });
        Some(Prism {
            frame: pa.frame,
            region: pa.region.union(&mapped, self.tolerance.coincidence.max(1e-9)),
            height: pa.height,
            trims: CapTrims::default(),
        })
    }

    fn modify_edges(
        &mut self,
        solid: &KernelSolidHandle,
        edges: &[KernelId],
        corner: CornerOp,
        cap: CapTrim,
    ) -> Result<KernelSolidHandle, KernelError> {
        let fillet = matches!(corner, CornerOp::Round(_));
        let fail = |reason: String| {
            if fillet {
                KernelError::FilletFailed { reason }
            } else {
                KernelError::ChamferFailed { reason }
            }
        };
        let size = match corner {
            CornerOp::Round(r) | CornerOp::Chamfer(r) => r,
        };
        if !(size.is_finite() && size > 0.0) {
            return Err(fail(format!("size must be positive, got {size}")));
        }
        if edges.is_empty() {
            return Err(fail("no edges selected".to_string()));
        }
        let rec = self.solid(solid)?;
        let mut origins = Vec::with_capacity(edges.len());
        for &e in edges {
            let (h, _, idx) = Self::decode(e);
            match self.entity(e, TopoKind::Edge) {
                Some(_) if h == solid.id() => origins.push(rec.topology.edges[idx].origin),
                _ => return Err(KernelError::EntityNotFound { id: e }),
            }
        }
        if !rec.shape.is_leaf() {
            return Err(KernelError::NotSupported {
                operation: "edge treatment on a solid built by boolean operations".to_string(),
            });
        }

        let arc_segments = self.tolerance.arc_segments;
        let eps = self.tolerance.coincidence.max(1e-9);
        let shape = if origins.iter().all(|o| matches!(o, EdgeOrigin::Side { .. })) {
            let mut by_loop: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
            for o in &origins {
                if let EdgeOrigin::Side { lp, vertex } = *o {
                    by_loop.entry(lp).or_default().push(vertex);
                }
            }
            match &rec.shape {
                Shape::Prism(p) => {
                    if !p.trims.is_empty() {
                        return Err(KernelError::NotSupported {
                            operation: "profile corner treatment after cap edge treatment".to_string(),
                        });
                    }
                    let mut loops = p.region.loops.clone();
                    for (lp, vertices) in &by_loop {
                        let l = &p.region.loops[*lp];
                        let corners: Vec<(usize, usize)> =
                            vertices.iter().map(|&v| (v, l.arc_steps(v, arc_segments))).collect();
                        loops[*lp] = l.modify_corners(&corners, corner).map_err(fail)?.simplified(eps);
                    }
                    Shape::Prism(Prism {
                        region: Region::new(loops),
                        ..p.clone()
                    })
                }
                Shape::Loft(l) => {
                    if !l.trims.is_empty() {
                        return Err(KernelError::NotSupported {
                            operation: "profile corner treatment after cap edge treatment".to_string(),
                        });
                    }
                    let vertices = by_loop.get(&0).cloned().unwrap_or_default();
                    let corners: Vec<(usize, usize)> = vertices
                        .iter()
                        .map(|&v| {
                            let steps = l
                                .bottom
                                .profile
                                .arc_steps(v, arc_segments)
                                .max(l.top.profile.arc_steps(v, arc_segments));
                            (v, steps)
                        })
                        .collect();
                    let bottom = l.bottom.profile.modify_corners(&corners, corner).map_err(&fail)?;
                    let top = l.top.profile.modify_corners(&corners, corner).map_err(&fail)?;
                    let (bs, ts) = (bottom.simplified(eps), top.simplified(eps));
                    let (bottom, mut top) = if bs.len() == ts.len() && bs.segs == ts.segs {
                        (bs, ts)
                    } else {
                        (bottom, top)
                    };
                    top.segs = bottom.segs.clone();
                    Shape::Loft(Loft {
                        bottom: Section {
                            frame: l.bottom.frame,
                            profile: bottom,
                        },
                        top: Section {
                            frame: l.top.frame,
                            profile: top,
                        },
                        trims: l.trims,
                    })
                }
                _ => {
                    return Err(KernelError::NotSupported {
                        operation: "edge treatment on this solid type".to_string(),
                    })
                }
            }
        } else if let Some(top) = cap_side(&origins) {
            let cap_edges: Vec<usize> = rec
                .topology
                .edges
                .iter()
                .enumerate()
                .filter(|(_, e)| matches!(e.origin, EdgeOrigin::Cap { top: t, .. } if t == top))
                .map(|(i, _)| i)
                .collect();
            let mut selected: Vec<usize> = edges.iter().map(|e| Self::decode(*e).2).collect();
            selected.sort_unstable();
            selected.dedup();
            if selected != cap_edges {
                return Err(KernelError::NotSupported {
                    operation: "treatment of part of a cap boundary".to_string(),
                });
            }
            let with_trim = |trims: CapTrims, height: f64| -> Result<CapTrims, KernelError> {
                let other = if top { trims.bottom } else { trims.top };
                let used = other.map_or(0.0, |t| t.size());
                if size + used > height * (1.0 + 1e-9) {
                    return Err(fail(format!("size {size} does not fit the solid height {height:.4}")));
                }
                let mut trims = trims;
                if top {
                    trims.top = Some(cap);
                } else {
                    trims.bottom = Some(cap);
                }
                Ok(trims)
            };
            match &rec.shape {
                Shape::Prism(p) => Shape::Prism(Prism {
                    trims: with_trim(p.trims, p.height)?,
                    ..p.clone()
                }),
                Shape::Loft(l) => {
                    let height = dot(
                        l.bottom.frame.normal(),
                        sub(l.top.frame.origin(), l.bottom.frame.origin()),
                    );
                    Shape::Loft(Loft {
                        trims: with_trim(l.trims, height)?,
                        ..l.clone()
                    })
                }
                _ => {
                    return Err(KernelError::NotSupported {
                        operation: "edge treatment on this solid type".to_string(),
                    })
                }
            }
        } else {
            return Err(KernelError::NotSupported {
                operation: "treatment of a mixed edge selection".to_string(),
            });
        };
        Ok(self.store(shape))
    }
}

/// `Some(top)` when every origin is a cap edge on the same cap.
fn cap_side(origins: &[EdgeOrigin]) -> Option<bool> {
    let mut side = None;
    for o in origins {
        match (o, side) {
            (EdgeOrigin::Cap { top, .. }, None) => side = Some(*top),
            (EdgeOrigin::Cap { top, .. }, Some(s)) if *top == s => {}
            _ => return None,
        }
    }
    side
}

impl Default for MockKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel for MockKernel {
    fn make_polyline_wire(
        &mut self,
        points: &[[f64; 3]],
        closed: bool,
    ) -> Result<KernelWireHandle, KernelError> {
        if points.len() < 2 || (closed && points.len() < 3) {
            return Err(KernelError::InvalidGeometry {
                reason: format!("polyline needs more points, got {}", points.len()),
            });
        }
        let mut points = points.to_vec();
        if closed && dist(points[0], points[points.len() - 1]) <= self.tolerance.coincidence {
            points.pop();
        }
        let segs = Loop::polygon(vec![[0.0; 2]; points.len()]).segs;
        Ok(self.store_wire(MockWire {
            points,
            closed,
            segs,
        }))
    }

    fn make_circle_wire(
        &mut self,
        center: [f64; 3],
        normal: [f64; 3],
        radius: f64,
    ) -> Result<KernelWireHandle, KernelError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(KernelError::InvalidGeometry {
                reason: format!("circle radius must be positive, got {radius}"),
            });
        }
        let n = normalize(normal).ok_or_else(|| KernelError::InvalidGeometry {
            reason: "circle normal has zero length".to_string(),
        })?;
        let frame = Self::frame(center, orthogonal(n), n)?;
        let count = 4 * self.tolerance.arc_segments as usize;
        let circle = Loop::circle([0.0, 0.0], radius, count);
        let points = circle.pts.iter().map(|q| frame.to_world(*q)).collect();
        Ok(self.store_wire(MockWire {
            points,
            closed: true,
            segs: circle.segs,
        }))
    }

    fn extrude_wires(
        &mut self,
        wires: &[KernelWireHandle],
        direction: [f64; 3],
        depth: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        if wires.is_empty() {
            return Err(KernelError::InvalidGeometry {
                reason: "no wires to extrude".to_string(),
            });
        }
        if !depth.is_finite() || depth.abs() <= self.tolerance.coincidence {
            return Err(KernelError::InvalidGeometry {
                reason: format!("extrusion depth must be non-zero, got {depth}"),
            });
        }
        let dir = normalize(direction).ok_or_else(|| KernelError::InvalidGeometry {
            reason: "extrude direction has zero length".to_string(),
        })?;
        let dir = scale(dir, depth.signum());
        let ws = wires.iter().map(|w| self.wire(w)).collect::<Result<Vec<_>, _>>()?;
        let prism = self.prism_from(&ws, dir, depth.abs())?;
        Ok(self.store(Shape::Prism(prism)))
    }

    fn loft_wires(
        &mut self,
        bottom: &KernelWireHandle,
        top: &KernelWireHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        let b = self.wire(bottom)?;
        let t = self.wire(top)?;
        if b.points.len() != t.points.len() {
            return Err(KernelError::NotSupported {
                operation: format!(
                    "loft between sections with {} and {} vertices",
                    b.points.len(),
                    t.points.len()
                ),
            });
        }
        let mut nb = Self::wire_normal(b)?;
        let mut nt = Self::wire_normal(t)?;
        let (cb, ct) = (centroid(&b.points), centroid(&t.points));
        let axis = sub(ct, cb);
        if dot(nb, axis) < 0.0 {
            nb = scale(nb, -1.0);
        }
        if dot(nt, axis) < 0.0 {
            nt = scale(nt, -1.0);
        }
        if dot(nb, axis) <= self.tolerance.coincidence || dot(nt, axis) <= self.tolerance.coincidence {
            return Err(KernelError::InvalidGeometry {
                reason: "loft sections are not separated along their normals".to_string(),
            });
        }
        let x = sub(b.points[1], b.points[0]);
        let fb = Self::frame(cb, x, nb)?;
        let ft = Self::frame(ct, fb.x_dir(), nt)
            .or_else(|_| Self::frame(ct, sub(t.points[1], t.points[0]), nt))?;
        let mut lb = Self::wire_loop(b, &fb);
        let mut lt = Self::wire_loop(t, &ft);
        if lb.signed_area() < 0.0 {
            lb = lb.reversed();
            lt = lt.reversed();
        }
        if lt.signed_area() < 0.0 {
            return Err(KernelError::InvalidGeometry {
                reason: "loft sections wind in opposite directions".to_string(),
            });
        }
        lt.segs = lb.segs.clone();
        let loft = Loft {
            bottom: Section {
                frame: fb,
                profile: lb,
            },
            top: Section {
                frame: ft,
                profile: lt,
            },
            trims: CapTrims::default(),
        };
        Ok(self.store(Shape::Loft(loft)))
    }

    fn sweep_wire(
        &mut self,
        profile: &KernelWireHandle,
        path: &KernelWireHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        let path = self.wire(path)?;
        if path.closed || path.points.len() != 2 {
            return Err(KernelError::NotSupported {
                operation: "sweep along a path other than one straight segment".to_string(),
            });
        }
        let (p0, p1) = (path.points[0], path.points[1]);
        let length = dist(p0, p1);
        let dir = normalize(sub(p1, p0)).ok_or_else(|| KernelError::InvalidGeometry {
            reason: "sweep path has zero length".to_string(),
        })?;
        let w = self.wire(profile)?;
        let n = Self::wire_normal(w)?;
        if dot(n, dir).abs() < 1.0 - self.tolerance.angular {
            return Err(KernelError::InvalidGeometry {
                reason: "profile is not orthogonal to the sweep path".to_string(),
            });
        }
        if dot(n, sub(p0, w.points[0])).abs() > Self::plane_tol(&w.points) {
            return Err(KernelError::InvalidGeometry {
                reason: "profile does not lie at the start of the sweep path".to_string(),
            });
        }
        let prism = self.prism_from(&[w], dir, length)?;
        Ok(self.store(Shape::Prism(prism)))
    }

    fn revolve_wire(
        &mut self,
        profile: &KernelWireHandle,
        axis_origin: [f64; 3],
        axis_direction: [f64; 3],
        angle: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        let axis = normalize(axis_direction).ok_or_else(|| KernelError::InvalidGeometry {
            reason: "revolve axis has zero length".to_string(),
        })?;
        if !(angle.is_finite() && angle > 0.0) {
            return Err(KernelError::InvalidGeometry {
                reason: format!("revolve angle must be positive, got {angle}"),
            });
        }
        let angle = angle.min(2.0 * std::f64::consts::PI);
        let w = self.wire(profile)?;
        let n = Self::wire_normal(w)?;
        let tol = Self::plane_tol(&w.points);
        if dot(n, axis).abs() > self.tolerance.angular || dot(n, sub(axis_origin, w.points[0])).abs() > tol {
            return Err(KernelError::InvalidGeometry {
                reason: "revolve axis does not lie in the profile plane".to_string(),
            });
        }
        let radial = |p: V3| {
            let d = sub(p, axis_origin);
            sub(d, scale(axis, dot(d, axis)))
        };
        let far = w
            .points
            .iter()
            .map(|p| radial(*p))
            .max_by(|a, b| norm(*a).total_cmp(&norm(*b)))
            .unwrap_or([0.0; 3]);
        let frame = Self::frame(axis_origin, far, axis)?;
        let mut pts = Vec::with_capacity(w.points.len());
        for p in &w.points {
            let l = frame.to_local(*p);
            if l[0] < -tol {
                return Err(KernelError::InvalidGeometry {
                    reason: "profile crosses the revolve axis".to_string(),
                });
            }
            pts.push([l[0].max(0.0), l[2]]);
        }
        let shape = Shape::Revolution(Revolution {
            frame,
            profile: Loop {
                pts,
                segs: w.segs.clone(),
            },
            angle,
        });
        Ok(self.store(shape))
    }

    fn make_cylinder(
        &mut self,
        base_center: [f64; 3],
        axis: [f64; 3],
        radius: f64,
        height: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        self.make_cone(base_center, axis, radius, radius, height)
    }

    fn make_cone(
        &mut self,
        base_center: [f64; 3],
        axis: [f64; 3],
        base_radius: f64,
        top_radius: f64,
        height: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        let axis = normalize(axis).ok_or_else(|| KernelError::InvalidGeometry {
            reason: "axis has zero length".to_string(),
        })?;
        if !(height.is_finite() && height > 0.0) {
            return Err(KernelError::InvalidGeometry {
                reason: format!("height must be positive, got {height}"),
            });
        }
        if !(base_radius > 0.0 && top_radius >= 0.0) {
            return Err(KernelError::InvalidGeometry {
                reason: format!("invalid radii {base_radius} / {top_radius}"),
            });
        }
        Ok(self.store(Shape::Frustum(Frustum {
            base: base_center,
            axis,
            base_radius,
            top_radius,
            height,
        })))
    }

    fn boolean_union(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        let sa = self.solid(a)?.shape.clone();
        let sb = self.solid(b)?.shape.clone();
        let shape = match self.merge_prisms(&sa, &sb) {
            Some(p) => Shape::Prism(p),
            None => {
                let mut parts = Vec::new();
                for s in [sa, sb] {
                    match s {
                        Shape::Union(inner) => parts.extend(inner),
                        other => parts.push(other),
                    }
                }
                Shape::Union(parts)
            }
        };
        Ok(self.store(shape))
    }

    fn boolean_subtract(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        let sa = self.solid(a)?.shape.clone();
        let sb = self.solid(b)?.shape.clone();
        Ok(self.store(Shape::Difference(Box::new(sa), Box::new(sb))))
    }

    fn boolean_intersect(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        let sa = self.solid(a)?.shape.clone();
        let sb = self.solid(b)?.shape.clone();
        Ok(self.store(Shape::Intersection(Box::new(sa), Box::new(sb))))
    }

    fn fillet_edges(
        &mut self,
        solid: &KernelSolidHandle,
        edges: &[KernelId],
        radius: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        self.modify_edges(solid, edges, CornerOp::Round(radius), CapTrim::Round(radius))
    }

    fn chamfer_edges(
        &mut self,
        solid: &KernelSolidHandle,
        edges: &[KernelId],
        distance: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        self.modify_edges(
            solid,
            edges,
            CornerOp::Chamfer(distance),
            CapTrim::Chamfer(distance),
        )
    }

    fn transform_solid(
        &mut self,
        solid: &KernelSolidHandle,
        motion: &RigidMotion,
    ) -> Result<KernelSolidHandle, KernelError> {
        let shape = self.solid(solid)?.shape.transformed(motion);
        Ok(self.store(shape))
    }

    fn face_wires(
        &mut self,
        solid: &KernelSolidHandle,
        face: KernelId,
    ) -> Result<Vec<KernelWireHandle>, KernelError> {
        let (h, rec, idx) = self
            .entity(face, TopoKind::Face)
            .ok_or(KernelError::EntityNotFound { id: face })?;
        if h != solid.id() {
            return Err(KernelError::EntityNotFound { id: face });
        }
        let FaceGeom::Planar { loops, segs, .. } = &rec.topology.faces[idx].geom else {
            return Err(KernelError::NotSupported {
                operation: "wires of a non-planar face".to_string(),
            });
        };
        let wires: Vec<MockWire> = loops
            .iter()
            .zip(segs.iter())
            .map(|(points, segs)| MockWire {
                points: points.clone(),
                closed: true,
                segs: segs.clone(),
            })
            .collect();
        Ok(wires.into_iter().map(|w| self.store_wire(w)).collect())
    }

    fn tessellate(
        &mut self,
        solid: &KernelSolidHandle,
        tolerance: f64,
    ) -> Result<RenderMesh, KernelError> {
        let h = solid.id();
        let rec = self.solid(solid)?;
        let mesh = mock_mesh::tessellate(&rec.shape, &rec.topology, tolerance, |i| {
            Self::encode(h, TopoKind::Face, i)
        });
        if mesh.indices.is_empty() {
            return Err(KernelError::TessellationFailed {
                reason: "solid has no boundary".to_string(),
            });
        }
        Ok(mesh)
    }
}

impl KernelIntrospect for MockKernel {
    fn list_faces(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        self.solids
            .get(&solid.id())
            .map(|s| {
                (0..s.topology.faces.len())
                    .map(|i| Self::encode(solid.id(), TopoKind::Face, i))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn list_edges(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        self.solids
            .get(&solid.id())
            .map(|s| {
                (0..s.topology.edges.len())
                    .map(|i| Self::encode(solid.id(), TopoKind::Edge, i))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn list_vertices(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        self.solids
            .get(&solid.id())
            .map(|s| {
                (0..s.topology.vertices.len())
                    .map(|i| Self::encode(solid.id(), TopoKind::Vertex, i))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn face_edges(&self, face: KernelId) -> Vec<KernelId> {
        let Some((h, rec, idx)) = self.entity(face, TopoKind::Face) else {
            return Vec::new();
        };
        rec.topology.faces[idx]
            .edges
            .iter()
            .map(|&e| Self::encode(h, TopoKind::Edge, e))
            .collect()
    }

    fn edge_faces(&self, edge: KernelId) -> Vec<KernelId> {
        let Some((h, rec, idx)) = self.entity(edge, TopoKind::Edge) else {
            return Vec::new();
        };
        rec.topology.edges[idx]
            .faces
            .iter()
            .map(|&f| Self::encode(h, TopoKind::Face, f))
            .collect()
    }

    fn edge_vertices(&self, edge: KernelId) -> (KernelId, KernelId) {
        let Some((h, rec, idx)) = self.entity(edge, TopoKind::Edge) else {
            return (KernelId::NONE, KernelId::NONE);
        };
        match rec.topology.edges[idx].ends {
            Some((a, b)) => (
                Self::encode(h, TopoKind::Vertex, a),
                Self::encode(h, TopoKind::Vertex, b),
            ),
            None => (KernelId::NONE, KernelId::NONE),
        }
    }

    fn compute_signature(&self, entity: KernelId, kind: TopoKind) -> TopoSignature {
        let Some((_, rec, idx)) = self.entity(entity, kind) else {
            return TopoSignature::empty();
        };
        match kind {
            TopoKind::Face => rec.topology.faces[idx].sig.clone(),
            TopoKind::Edge => rec.topology.edges[idx].sig.clone(),
            TopoKind::Vertex => {
                let p = rec.topology.vertices[idx];
                TopoSignature {
                    surface_type: Some("point".to_string()),
                    centroid: Some(p),
                    bbox: Some([p[0], p[1], p[2], p[0], p[1], p[2]]),
                    ..TopoSignature::empty()
                }
            }
        }
    }

    fn wire_points(&self, wire: &KernelWireHandle) -> Result<Vec<[f64; 3]>, KernelError> {
        Ok(self.wire(wire)?.points.clone())
    }

    fn volume(&self, solid: &KernelSolidHandle) -> Result<f64, KernelError> {
        Ok(self.solid(solid)?.shape.volume(self.tolerance.volume_samples))
    }

    fn bounding_box(&self, solid: &KernelSolidHandle) -> Result<BoundingBox, KernelError> {
        Ok(self.solid(solid)?.shape.bounding_box())
    }

    fn contains_point(
        &self,
        solid: &KernelSolidHandle,
        point: [f64; 3],
    ) -> Result<bool, KernelError> {
        Ok(self.solid(solid)?.shape.contains(point))
    }
}
