//! KernelIntrospect for TruckKernel, wrapping truck topology queries.
//!
//! Entity ids encode the owning solid: `handle * 10000 + index` for faces,
//! with edges offset by 1000 and vertices by 2000. Indices run across all
//! shells of the solid in boundary order.

use std::collections::{HashMap, HashSet};

use truck_modeling::geometry::Surface;
use truck_modeling::topology::{Edge, Face, Solid, Vertex, Wire};
use truck_modeling::{BoundedCurve, ParameterDivision1D};

use crate::math::{self, V3};
use crate::tessellation;
use crate::traits::KernelIntrospect;
use crate::truck_kernel::TruckKernel;
use crate::types::*;

const STRIDE: u64 = 10_000;
const EDGE_BASE: u64 = 1_000;
const VERTEX_BASE: u64 = 2_000;
/// Chord tolerance for curved edge lengths, as a share of the mesh tolerance.
const LENGTH_REFINEMENT: f64 = 1e-3;

pub(crate) fn face_id(handle: u64, index: usize) -> KernelId {
    KernelId(handle * STRIDE + index as u64)
}

fn edge_id(handle: u64, index: usize) -> KernelId {
    KernelId(handle * STRIDE + EDGE_BASE + index as u64)
}

fn vertex_id(handle: u64, index: usize) -> KernelId {
    KernelId(handle * STRIDE + VERTEX_BASE + index as u64)
}

/// Owning handle and in-kind index of an entity id.
fn split(id: KernelId, kind: TopoKind) -> (u64, Option<usize>) {
    let local = id.0 % STRIDE;
    let index = match kind {
        TopoKind::Face => (local < EDGE_BASE).then_some(local),
        TopoKind::Edge => (EDGE_BASE..VERTEX_BASE)
            .contains(&local)
            .then(|| local - EDGE_BASE),
        TopoKind::Vertex => (local >= VERTEX_BASE).then(|| local - VERTEX_BASE),
    };
    (id.0 / STRIDE, index.map(|i| i as usize))
}

fn faces(solid: &Solid) -> Vec<&Face> {
    solid
        .boundaries()
        .iter()
        .flat_map(|shell| shell.face_iter())
        .collect()
}

fn edges(solid: &Solid) -> Vec<Edge> {
    let mut seen = HashSet::new();
    solid
        .boundaries()
        .iter()
        .flat_map(|shell| shell.edge_iter())
        .filter(|e| seen.insert(e.id()))
        .collect()
}

fn vertices(solid: &Solid) -> Vec<Vertex> {
    let mut seen = HashSet::new();
    solid
        .boundaries()
        .iter()
        .flat_map(|shell| shell.vertex_iter())
        .filter(|v| seen.insert(v.id()))
        .collect()
}

pub(crate) fn face_at<'a>(
    solid: &'a Solid,
    handle: &KernelSolidHandle,
    face: KernelId,
) -> Option<&'a Face> {
    match split(face, TopoKind::Face) {
        (h, Some(i)) if h == handle.id() => faces(solid).get(i).copied(),
        _ => None,
    }
}

/// Points along a wire at the given chord tolerance, without repeating
/// the shared vertex between consecutive edges.
pub(crate) fn sample_wire(wire: &Wire, tolerance: f64) -> Vec<V3> {
    let mut out: Vec<V3> = Vec::new();
    for edge in wire.edge_iter() {
        let curve = edge.oriented_curve();
        let range = curve.range_tuple();
        let (_, pts) = curve.parameter_division(range, tolerance);
        let n = pts.len();
        for p in pts.into_iter().take(n.saturating_sub(1)) {
            out.push([p[0], p[1], p[2]]);
        }
    }
    let closed = match (wire.front_vertex(), wire.back_vertex()) {
        (Some(a), Some(b)) => a.id() == b.id(),
        _ => true,
    };
    if !closed {
        if let Some(v) = wire.back_vertex() {
            let p = v.point();
            out.push([p[0], p[1], p[2]]);
        }
    }
    out
}

fn triangle_stats(tris: &[[[f64; 3]; 3]]) -> (f64, V3, V3) {
    let mut area = 0.0;
    let mut weighted = [0.0; 3];
    let mut normal = [0.0; 3];
    for [a, b, c] in tris {
        let n = math::cross(math::sub(*b, *a), math::sub(*c, *a));
        let t = math::norm(n) / 2.0;
        area += t;
        weighted = math::add(weighted, math::scale(math::centroid(&[*a, *b, *c]), t));
        normal = math::add(normal, n);
    }
    let centroid = if area > 0.0 {
        math::scale(weighted, 1.0 / area)
    } else {
        [0.0; 3]
    };
    (area, centroid, normal)
}

fn face_signature(face: &Face, tris: &[[[f64; 3]; 3]]) -> TopoSignature {
    let surface_type = match face.oriented_surface() {
        Surface::Plane(_) => "planar",
        Surface::RevolutedCurve(_) => "revolved",
        Surface::BSplineSurface(_) | Surface::NurbsSurface(_) => "nurbs",
    };
    let (area, centroid, normal) = triangle_stats(tris);
    let bbox = BoundingBox::from_points(tris.iter().flat_map(|t| t.iter()));
    TopoSignature {
        surface_type: Some(surface_type.to_string()),
        area: Some(area),
        centroid: Some(centroid),
        normal: (surface_type == "planar")
            .then(|| math::normalize(normal))
            .flatten(),
        direction: None,
        bbox: Some(bbox.to_array()),
        length: None,
    }
}

fn polyline_length(pts: &[V3]) -> f64 {
    pts.windows(2).map(|w| math::dist(w[0], w[1])).sum()
}

fn edge_signature(edge: &Edge, tolerance: f64) -> TopoSignature {
    let curve = edge.oriented_curve();
    let (_, pts) = curve.parameter_division(curve.range_tuple(), tolerance);
    let pts: Vec<V3> = pts.iter().map(|p| [p[0], p[1], p[2]]).collect();
    let sampled = polyline_length(&pts);
    let (first, last) = match (pts.first(), pts.last()) {
        (Some(a), Some(b)) => (*a, *b),
        _ => return TopoSignature::empty(),
    };
    let chord = math::dist(first, last);
    let straight = chord > 0.0 && (sampled - chord).abs() <= 1e-9 * sampled.max(1.0);
    // a chord polyline at the mesh tolerance runs short on curves
    let length = if straight {
        sampled
    } else {
        let fine = (tolerance * LENGTH_REFINEMENT).max(1e-9);
        let (_, dense) = curve.parameter_division(curve.range_tuple(), fine);
        let dense: Vec<V3> = dense.iter().map(|p| [p[0], p[1], p[2]]).collect();
        polyline_length(&dense)
    };
    let closed = edge.front().id() == edge.back().id();
    let curve_type = if straight {
        "line"
    } else {
        let center = math::centroid(&pts[..pts.len() - usize::from(closed)]);
        let radii: Vec<f64> = pts.iter().map(|p| math::dist(*p, center)).collect();
        let round = radii
            .iter()
            .all(|r| (r - radii[0]).abs() <= tolerance.max(1e-6));
        match (closed, round) {
            (true, true) => "circle",
            (false, _) if pts.len() >= 3 => "arc",
            _ => "curve",
        }
    };
    TopoSignature {
        surface_type: Some(curve_type.to_string()),
        area: None,
        centroid: Some(math::centroid(&pts)),
        normal: None,
        direction: straight
            .then(|| math::normalize(math::sub(last, first)))
            .flatten(),
        bbox: Some(BoundingBox::from_points(pts.iter()).to_array()),
        length: Some(length),
    }
}

fn vertex_signature(vertex: &Vertex) -> TopoSignature {
    let p = vertex.point();
    TopoSignature {
        surface_type: Some("point".to_string()),
        centroid: Some([p[0], p[1], p[2]]),
        ..TopoSignature::empty()
    }
}

impl TruckKernel {
    fn lookup(&self, handle: u64) -> Option<&Solid> {
        self.get_solid(&KernelSolidHandle(handle))
    }

    fn triangles(&self, solid: &KernelSolidHandle) -> Result<Vec<[[f64; 3]; 3]>, KernelError> {
        let truck_solid = self.get_solid(solid).ok_or(KernelError::EntityNotFound {
            id: KernelId(solid.id()),
        })?;
        let tris = tessellation::solid_triangles(truck_solid, self.tolerance().mesh);
        if tris.is_empty() {
            return Err(KernelError::TessellationFailed {
                reason: "solid has no triangles".to_string(),
            });
        }
        Ok(tris)
    }
}

impl KernelIntrospect for TruckKernel {
    fn list_faces(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        let Some(truck_solid) = self.get_solid(solid) else {
            return Vec::new();
        };
        (0..faces(truck_solid).len())
            .map(|i| face_id(solid.id(), i))
            .collect()
    }

    fn list_edges(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        let Some(truck_solid) = self.get_solid(solid) else {
            return Vec::new();
        };
        (0..edges(truck_solid).len())
            .map(|i| edge_id(solid.id(), i))
            .collect()
    }

    fn list_vertices(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        let Some(truck_solid) = self.get_solid(solid) else {
            return Vec::new();
        };
        (0..vertices(truck_solid).len())
            .map(|i| vertex_id(solid.id(), i))
            .collect()
    }

    fn face_edges(&self, face: KernelId) -> Vec<KernelId> {
        let (h, Some(fi)) = split(face, TopoKind::Face) else {
            return Vec::new();
        };
        let Some(truck_solid) = self.lookup(h) else {
            return Vec::new();
        };
        let Some(target) = faces(truck_solid).get(fi).copied() else {
            return Vec::new();
        };
        let index: HashMap<_, usize> = edges(truck_solid)
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id(), i))
            .collect();
        target
            .boundaries()
            .iter()
            .flat_map(|w| w.edge_iter())
            .filter_map(|e| index.get(&e.id()).map(|&i| edge_id(h, i)))
            .collect()
    }

    fn edge_faces(&self, edge: KernelId) -> Vec<KernelId> {
        let (h, Some(ei)) = split(edge, TopoKind::Edge) else {
            return Vec::new();
        };
        let Some(truck_solid) = self.lookup(h) else {
            return Vec::new();
        };
        let Some(target) = edges(truck_solid).get(ei).map(|e| e.id()) else {
            return Vec::new();
        };
        faces(truck_solid)
            .iter()
            .enumerate()
            .filter(|(_, f)| {
                f.boundaries()
                    .iter()
                    .flat_map(|w| w.edge_iter())
                    .any(|e| e.id() == target)
            })
            .map(|(fi, _)| face_id(h, fi))
            .collect()
    }

    fn edge_vertices(&self, edge: KernelId) -> (KernelId, KernelId) {
        let none = (KernelId::NONE, KernelId::NONE);
        let (h, Some(ei)) = split(edge, TopoKind::Edge) else {
            return none;
        };
        let Some(truck_solid) = self.lookup(h) else {
            return none;
        };
        let Some(target) = edges(truck_solid).get(ei).cloned() else {
            return none;
        };
        if target.front().id() == target.back().id() {
            return none;
        }
        let index: HashMap<_, usize> = vertices(truck_solid)
            .iter()
            .enumerate()
            .map(|(i, v)| (v.id(), i))
            .collect();
        let find = |v: &Vertex| {
            index
                .get(&v.id())
                .map(|&i| vertex_id(h, i))
                .unwrap_or(KernelId::NONE)
        };
        (find(target.front()), find(target.back()))
    }

    fn compute_signature(&self, entity: KernelId, kind: TopoKind) -> TopoSignature {
        let (h, Some(i)) = split(entity, kind) else {
            return TopoSignature::empty();
        };
        let Some(truck_solid) = self.lookup(h) else {
            return TopoSignature::empty();
        };
        let tol = self.tolerance().mesh;
        match kind {
            TopoKind::Face => {
                let all = faces(truck_solid);
                let Some(face) = all.get(i) else {
                    return TopoSignature::empty();
                };
                let tris = tessellation::face_triangles(truck_solid, tol);
                face_signature(face, tris.get(i).map(Vec::as_slice).unwrap_or(&[]))
            }
            TopoKind::Edge => edges(truck_solid)
                .get(i)
                .map(|e| edge_signature(e, tol))
                .unwrap_or_else(TopoSignature::empty),
            TopoKind::Vertex => vertices(truck_solid)
                .get(i)
                .map(vertex_signature)
                .unwrap_or_else(TopoSignature::empty),
        }
    }

    fn compute_all_signatures(
        &self,
        solid: &KernelSolidHandle,
        kind: TopoKind,
    ) -> Vec<(KernelId, TopoSignature)> {
        let Some(truck_solid) = self.get_solid(solid) else {
            return Vec::new();
        };
        if kind != TopoKind::Face {
            return self
                .list_ids(solid, kind)
                .into_iter()
                .map(|id| (id, self.compute_signature(id, kind)))
                .collect();
        }
        // one triangulation for all faces
        let tris = tessellation::face_triangles(truck_solid, self.tolerance().mesh);
        faces(truck_solid)
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let t = tris.get(i).map(Vec::as_slice).unwrap_or(&[]);
                (face_id(solid.id(), i), face_signature(f, t))
            })
            .collect()
    }

    fn wire_points(&self, wire: &KernelWireHandle) -> Result<Vec<[f64; 3]>, KernelError> {
        let truck_wire = self.get_wire(wire).ok_or(KernelError::EntityNotFound {
            id: KernelId(wire.id()),
        })?;
        Ok(sample_wire(truck_wire, self.tolerance().mesh))
    }

    fn volume(&self, solid: &KernelSolidHandle) -> Result<f64, KernelError> {
        Ok(tessellation::mesh_volume(&self.triangles(solid)?))
    }

    fn bounding_box(&self, solid: &KernelSolidHandle) -> Result<BoundingBox, KernelError> {
        Ok(tessellation::mesh_bounds(&self.triangles(solid)?))
    }

    fn contains_point(
        &self,
        solid: &KernelSolidHandle,
        point: [f64; 3],
    ) -> Result<bool, KernelError> {
        Ok(tessellation::mesh_contains(&self.triangles(solid)?, point))
    }
}

impl TruckKernel {
    fn list_ids(&self, solid: &KernelSolidHandle, kind: TopoKind) -> Vec<KernelId> {
        match kind {
            TopoKind::Face => self.list_faces(solid),
            TopoKind::Edge => self.list_edges(solid),
            TopoKind::Vertex => self.list_vertices(solid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Kernel;
    use part_types::KernelTolerance;

    fn make_box() -> (TruckKernel, KernelSolidHandle) {
        let mut kernel = TruckKernel::new();
        let wire = kernel
            .make_polyline_wire(
                &[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 3.0, 0.0], [0.0, 3.0, 0.0]],
                true,
            )
            .unwrap();
        let handle = kernel.extrude_wires(&[wire], [0.0, 0.0, 1.0], 4.0).unwrap();
        (kernel, handle)
    }

    #[test]
    fn test_truck_introspect_box_counts() {
        let (kernel, handle) = make_box();
        assert_eq!(kernel.list_faces(&handle).len(), 6);
        assert_eq!(kernel.list_edges(&handle).len(), 12);
        assert_eq!(kernel.list_vertices(&handle).len(), 8);
    }

    #[test]
    fn test_truck_introspect_adjacency() {
        let (kernel, handle) = make_box();
        for face in kernel.list_faces(&handle) {
            assert_eq!(kernel.face_edges(face).len(), 4);
        }
        for edge in kernel.list_edges(&handle) {
            assert_eq!(kernel.edge_faces(edge).len(), 2);
            let (a, b) = kernel.edge_vertices(edge);
            assert_ne!(a, KernelId::NONE);
            assert_ne!(a, b);
        }
    }

    #[test]
    fn test_truck_introspect_face_signatures() {
        let (kernel, handle) = make_box();
        let sigs = kernel.compute_all_signatures(&handle, TopoKind::Face);
        let top = sigs
            .iter()
            .find(|(_, s)| s.centroid.is_some_and(|c| (c[2] - 4.0).abs() < 1e-9))
            .expect("top face");
        let n = top.1.normal.unwrap();
        assert!((n[2] - 1.0).abs() < 1e-9, "top normal points outward");
        assert!((top.1.area.unwrap() - 6.0).abs() < 1e-9);
        let total: f64 = sigs.iter().filter_map(|(_, s)| s.area).sum();
        assert!((total - 52.0).abs() < 1e-6);
    }

    #[test]
    fn test_truck_introspect_edge_signatures() {
        let (kernel, handle) = make_box();
        let sigs = kernel.compute_all_signatures(&handle, TopoKind::Edge);
        assert!(sigs.iter().all(|(_, s)| s.is_line()));
        let vertical = sigs
            .iter()
            .filter(|(_, s)| s.direction.is_some_and(|d| d[2].abs() > 0.999))
            .count();
        assert_eq!(vertical, 4);
    }

    #[test]
    fn test_truck_introspect_curved_edges() {
        let mut kernel = TruckKernel::new();
        let handle = kernel
            .make_cylinder([0.0; 3], [0.0, 0.0, 1.0], 1.0, 2.0)
            .unwrap();
        let sigs = kernel.compute_all_signatures(&handle, TopoKind::Edge);
        let curved: f64 = sigs
            .iter()
            .filter(|(_, s)| !s.is_line())
            .filter_map(|(_, s)| s.length)
            .sum();
        // both rims
        assert!((curved - 4.0 * std::f64::consts::PI).abs() < 0.01, "{curved}");
    }

    #[test]
    fn test_truck_arc_length_beats_the_mesh_chord() {
        let mut kernel = TruckKernel::with_tolerance(KernelTolerance {
            mesh: 0.2,
            ..KernelTolerance::default()
        });
        let handle = kernel
            .make_cylinder([0.0; 3], [0.0, 0.0, 1.0], 5.0, 1.0)
            .unwrap();
        let rims: f64 = kernel
            .compute_all_signatures(&handle, TopoKind::Edge)
            .iter()
            .filter(|(_, s)| !s.is_line())
            .filter_map(|(_, s)| s.length)
            .sum();
        assert!((rims - 20.0 * std::f64::consts::PI).abs() < 0.01, "{rims}");
    }

    #[test]
    fn test_truck_face_wires_roundtrip() {
        let (mut kernel, handle) = make_box();
        let faces = kernel.compute_all_signatures(&handle, TopoKind::Face);
        let (top, _) = faces
            .iter()
            .find(|(_, s)| s.normal.is_some_and(|n| n[2] > 0.999))
            .unwrap();
        let wires = kernel.face_wires(&handle, *top).unwrap();
        assert_eq!(wires.len(), 1);
        let pts = kernel.wire_points(&wires[0]).unwrap();
        assert!(pts.len() >= 4);
        assert!(pts.iter().all(|p| (p[2] - 4.0).abs() < 1e-9));
    }
}
