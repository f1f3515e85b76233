//! Boundary topology of mock solids.
//!
//! Every leaf contributes its own faces, edges and vertices; composite
//! solids concatenate the records of their leaves. Edges remember where
//! they came from so that fillets and chamfers can be mapped back onto
//! the profile.

use std::collections::HashMap;
use std::f64::consts::PI;

use part_types::TopoSignature;

use crate::math::*;
use crate::mock_profile::{Loop, Region, Seg, SegKind};
use crate::mock_shape::{Frustum, Loft, Prism, Revolution, Shape};

/// Where an edge sits on its leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EdgeOrigin {
    /// Straight edge between the caps at profile vertex `vertex` of loop `lp`.
    Side { lp: usize, vertex: usize },
    /// Boundary edge of the bottom or top cap on loop `lp`.
    Cap { top: bool, lp: usize },
    Other,
}

/// Geometry needed to triangulate a face.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FaceGeom {
    /// Planar face bounded by closed loops, outer loop first. `segs` keeps
    /// the edge grouping of each loop.
    Planar {
        loops: Vec<Vec<V3>>,
        segs: Vec<Vec<Seg>>,
        normal: V3,
    },
    /// Ruled strip between two polylines with matching point counts.
    Strip { lower: Vec<V3>, upper: Vec<V3> },
    /// Open polyline revolved about an axis.
    Revolved {
        profile: Vec<V3>,
        origin: V3,
        axis: V3,
        angle: f64,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct FaceRec {
    pub sig: TopoSignature,
    pub edges: Vec<usize>,
    pub geom: FaceGeom,
}

#[derive(Debug, Clone)]
pub(crate) struct EdgeRec {
    pub sig: TopoSignature,
    pub ends: Option<(usize, usize)>,
    pub faces: Vec<usize>,
    pub origin: EdgeOrigin,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Topology {
    pub faces: Vec<FaceRec>,
    pub edges: Vec<EdgeRec>,
    pub vertices: Vec<V3>,
}

impl Topology {
    pub fn of(shape: &Shape, arc_segments: u32) -> Topology {
        let mut topo = Topology::default();
        for leaf in shape.leaves() {
            match leaf {
                Shape::Prism(p) => topo.add_prism(p),
                Shape::Loft(l) => topo.add_loft(l),
                Shape::Frustum(f) => topo.add_frustum(f, arc_segments),
                Shape::Revolution(r) => topo.add_revolution(r, arc_segments),
                _ => {}
            }
        }
        for (fi, face) in topo.faces.iter().enumerate() {
            for &e in &face.edges {
                if !topo.edges[e].faces.contains(&fi) {
                    topo.edges[e].faces.push(fi);
                }
            }
        }
        topo
    }

    fn vertex(&mut self, p: V3) -> usize {
        self.vertices.push(p);
        self.vertices.len() - 1
    }

    fn edge(
        &mut self,
        points: &[V3],
        kind: SegKind,
        closed: bool,
        ends: Option<(usize, usize)>,
        origin: EdgeOrigin,
    ) -> usize {
        self.edges.push(EdgeRec {
            sig: polyline_signature(points, kind, closed),
            ends,
            faces: Vec::new(),
            origin,
        });
        self.edges.len() - 1
    }

    fn face(&mut self, sig: TopoSignature, edges: Vec<usize>, geom: FaceGeom) -> usize {
        self.faces.push(FaceRec { sig, edges, geom });
        self.faces.len() - 1
    }

    /// Side walls, cap edges and corner edges shared by prisms and lofts.
    /// `lower` and `upper` map a loop and a profile point to world space.
    fn add_walls(
        &mut self,
        loops: &[&Loop],
        lower: &dyn Fn(V2) -> V3,
        upper: &dyn Fn(V2) -> V3,
        upper_loops: &[&Loop],
        interior: V3,
    ) -> (Vec<Vec<usize>>, Vec<Vec<usize>>) {
        let mut bottom_edges = Vec::new();
        let mut top_edges = Vec::new();
        for (lp, l) in loops.iter().enumerate() {
            let u = upper_loops[lp];
            let corners = l.corners();
            let mut vb = HashMap::new();
            let mut vt = HashMap::new();
            let mut side = HashMap::new();
            for &c in &corners {
                let b = lower(l.pts[c]);
                let t = upper(u.pts[c]);
                let ib = self.vertex(b);
                let it = self.vertex(t);
                vb.insert(c, ib);
                vt.insert(c, it);
                let e = self.edge(&[b, t], SegKind::Line, false, Some((ib, it)), EdgeOrigin::Side { lp, vertex: c });
                side.insert(c, e);
            }

            let mut be_loop = Vec::new();
            let mut te_loop = Vec::new();
            for span in l.edges() {
                let last = (span.first + span.count) % l.len();
                let closed = corners.is_empty();
                let bp: Vec<V3> = l.span_points(&span).into_iter().map(lower).collect();
                let tp: Vec<V3> = u.span_points(&span).into_iter().map(upper).collect();
                let ends_b = (!closed).then(|| (vb[&span.first], vb[&last]));
                let ends_t = (!closed).then(|| (vt[&span.first], vt[&last]));
                let be = self.edge(&bp, span.kind, closed, ends_b, EdgeOrigin::Cap { top: false, lp });
                let te = self.edge(&tp, span.kind, closed, ends_t, EdgeOrigin::Cap { top: true, lp });
                be_loop.push(be);
                te_loop.push(te);

                let mut edges = vec![be, te];
                if !closed {
                    edges.push(side[&span.first]);
                    if last != span.first {
                        edges.push(side[&last]);
                    }
                }
                let sig = strip_signature(&bp, &tp, span.kind, interior);
                self.face(sig, edges, FaceGeom::Strip { lower: bp, upper: tp });
            }
            bottom_edges.push(be_loop);
            top_edges.push(te_loop);
        }
        (bottom_edges, top_edges)
    }

    fn add_prism(&mut self, p: &Prism) {
        let f = p.frame;
        let h = p.height;
        let loops: Vec<&Loop> = p.region.loops.iter().collect();
        let lower = |q: V2| f.to_world3([q[0], q[1], 0.0]);
        let upper = |q: V2| f.to_world3([q[0], q[1], h]);
        let (cmin, cmax) = p.region.bounds();
        let interior = f.to_world3([(cmin[0] + cmax[0]) / 2.0, (cmin[1] + cmax[1]) / 2.0, h / 2.0]);
        let (bottom, top) = self.add_walls(&loops, &lower, &upper, &loops, interior);

        let up = f.normal();
        for (outer, holes) in p.region.faces() {
            let ids: Vec<usize> = std::iter::once(outer).chain(holes.iter().copied()).collect();
            let (c2, area) = p.region.face_centroid(&ids);
            for (z, normal, edges) in [(0.0, scale(up, -1.0), &bottom), (h, up, &top)] {
                let loops3: Vec<Vec<V3>> = ids
                    .iter()
                    .map(|&i| p.region.loops[i].pts.iter().map(|q| f.to_world3([q[0], q[1], z])).collect())
                    .collect();
                let sig = TopoSignature {
                    surface_type: Some("planar".to_string()),
                    area: Some(area.abs()),
                    centroid: Some(f.to_world3([c2[0], c2[1], z])),
                    normal: Some(normal),
                    direction: None,
                    bbox: Some(bbox_of(loops3.iter().flatten())),
                    length: None,
                };
                let face_edges = ids.iter().flat_map(|&i| edges[i].iter().copied()).collect();
                let segs = ids.iter().map(|&i| p.region.loops[i].segs.clone()).collect();
                self.face(
                    sig,
                    face_edges,
                    FaceGeom::Planar {
                        loops: loops3,
                        segs,
                        normal,
                    },
                );
            }
        }
    }

    fn add_loft(&mut self, l: &Loft) {
        let bf = l.bottom.frame;
        let tf = l.top.frame;
        let lower = |q: V2| bf.to_world(q);
        let upper = |q: V2| tf.to_world(q);
        let interior = lerp(
            centroid(&l.bottom.world_points()),
            centroid(&l.top.world_points()),
            0.5,
        );
        let (bottom, top) = self.add_walls(&[&l.bottom.profile], &lower, &upper, &[&l.top.profile], interior);

        for (section, normal, edges) in [
            (&l.bottom, scale(bf.normal(), -1.0), &bottom[0]),
            (&l.top, tf.normal(), &top[0]),
        ] {
            let pts = section.world_points();
            let region = Region::new(vec![section.profile.clone()]);
            let (c2, area) = region.face_centroid(&[0]);
            let sig = TopoSignature {
                surface_type: Some("planar".to_string()),
                area: Some(area.abs()),
                centroid: Some(section.frame.to_world(c2)),
                normal: Some(normal),
                direction: None,
                bbox: Some(bbox_of(pts.iter())),
                length: None,
            };
            self.face(
                sig,
                edges.clone(),
                FaceGeom::Planar {
                    loops: vec![pts],
                    segs: vec![section.profile.segs.clone()],
                    normal,
                },
            );
        }
    }

    fn add_frustum(&mut self, f: &Frustum, arc_segments: u32) {
        let n = 4 * arc_segments.max(2) as usize;
        let u = orthogonal(f.axis);
        let v = cross(f.axis, u);
        let ring = |h: f64, r: f64| -> Vec<V3> {
            (0..n)
                .map(|i| {
                    let a = 2.0 * PI * i as f64 / n as f64;
                    let c = add(f.base, scale(f.axis, h));
                    add(c, add(scale(u, r * a.cos()), scale(v, r * a.sin())))
                })
                .collect()
        };
        let bottom = ring(0.0, f.base_radius);
        let top = ring(f.height, f.top_radius);
        let top_center = add(f.base, scale(f.axis, f.height));
        let ring_segs = Loop::curve(vec![[0.0, 0.0]; n]).segs;

        let be = self.edge(&bottom, SegKind::Arc, true, None, EdgeOrigin::Other);
        let mut side_edges = vec![be];
        let bottom_sig = disc_signature(f.base, scale(f.axis, -1.0), f.base_radius, &bottom);
        self.face(
            bottom_sig,
            vec![be],
            FaceGeom::Planar {
                loops: vec![bottom.clone()],
                segs: vec![ring_segs.clone()],
                normal: scale(f.axis, -1.0),
            },
        );
        if f.top_radius > 1e-12 {
            let te = self.edge(&top, SegKind::Arc, true, None, EdgeOrigin::Other);
            side_edges.push(te);
            let top_sig = disc_signature(top_center, f.axis, f.top_radius, &top);
            self.face(
                top_sig,
                vec![te],
                FaceGeom::Planar {
                    loops: vec![top.clone()],
                    segs: vec![ring_segs.clone()],
                    normal: f.axis,
                },
            );
        }
        let slant = (f.height.powi(2) + (f.base_radius - f.top_radius).powi(2)).sqrt();
        let conical = (f.base_radius - f.top_radius).abs() > 1e-12;
        let mut lower = bottom.clone();
        lower.push(bottom[0]);
        let mut upper = top.clone();
        upper.push(top[0]);
        let sig = TopoSignature {
            surface_type: Some(if conical { "conical" } else { "cylindrical" }.to_string()),
            area: Some(PI * (f.base_radius + f.top_radius) * slant),
            centroid: Some(add(f.base, scale(f.axis, f.height / 2.0))),
            normal: None,
            direction: Some(f.axis),
            bbox: Some(bbox_of(bottom.iter().chain(top.iter()))),
            length: None,
        };
        self.face(sig, side_edges, FaceGeom::Strip { lower, upper });
    }

    fn add_revolution(&mut self, r: &Revolution, arc_segments: u32) {
        let fr = r.frame;
        let origin = fr.origin();
        let axis = fr.normal();
        let to_world = |q: V2| fr.to_world3([q[0], 0.0, q[1]]);
        let steps = ((r.angle / (PI / 2.0)) * arc_segments as f64).ceil().max(3.0) as usize;
        let ring = |q: V2| -> Vec<V3> {
            (0..steps)
                .map(|i| {
                    let a = r.angle * i as f64 / steps as f64;
                    fr.to_world3([q[0] * a.cos(), q[0] * a.sin(), q[1]])
                })
                .collect()
        };

        let l = &r.profile;
        let mut circle_of = HashMap::new();
        for c in l.corners() {
            let q = l.pts[c];
            if q[0] > 1e-12 {
                let pts = ring(q);
                let e = self.edge(&pts, SegKind::Arc, true, None, EdgeOrigin::Other);
                circle_of.insert(c, e);
            }
        }
        for span in l.edges() {
            let prof = l.span_points(&span);
            let last = (span.first + span.count) % l.len();
            let edges: Vec<usize> = [span.first, last]
                .iter()
                .filter_map(|c| circle_of.get(c).copied())
                .collect();
            let length: f64 = l.span_length(&span);
            let mean_r = prof.iter().map(|q| q[0]).sum::<f64>() / prof.len() as f64;
            let mean_z = prof.iter().map(|q| q[1]).sum::<f64>() / prof.len() as f64;
            let (dr, dz) = (prof[prof.len() - 1][0] - prof[0][0], prof[prof.len() - 1][1] - prof[0][1]);
            let (surface, normal) = match span.kind {
                SegKind::Line if dz.abs() < 1e-12 => {
                    let up = if dr > 0.0 { -1.0 } else { 1.0 };
                    ("planar", Some(scale(axis, up)))
                }
                SegKind::Line if dr.abs() < 1e-12 => ("cylindrical", None),
                SegKind::Line => ("conical", None),
                SegKind::Arc => ("revolved", None),
            };
            let world: Vec<V3> = prof.iter().map(|q| to_world(*q)).collect();
            let sig = TopoSignature {
                surface_type: Some(surface.to_string()),
                area: Some(r.angle * mean_r * length),
                centroid: Some(fr.to_world3([0.0, 0.0, mean_z])),
                normal,
                direction: Some(axis),
                bbox: Some(bbox_of(prof.iter().flat_map(|q| ring(*q)).collect::<Vec<_>>().iter())),
                length: None,
            };
            self.face(
                sig,
                edges,
                FaceGeom::Revolved {
                    profile: world,
                    origin,
                    axis,
                    angle: r.angle,
                },
            );
        }
    }
}

pub(crate) fn bbox_of<'a>(points: impl Iterator<Item = &'a V3>) -> [f64; 6] {
    let mut b = [f64::INFINITY, f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY];
    for p in points {
        for k in 0..3 {
            b[k] = b[k].min(p[k]);
            b[k + 3] = b[k + 3].max(p[k]);
        }
    }
    b
}

fn polyline_signature(points: &[V3], kind: SegKind, closed: bool) -> TopoSignature {
    let n = points.len();
    let segments = if closed { n } else { n.saturating_sub(1) };
    let mut length = 0.0;
    let mut weighted = [0.0; 3];
    for i in 0..segments {
        let a = points[i];
        let b = points[(i + 1) % n];
        let l = dist(a, b);
        length += l;
        weighted = add(weighted, scale(lerp(a, b, 0.5), l));
    }
    let centroid = if length > 0.0 {
        scale(weighted, 1.0 / length)
    } else {
        points.first().copied().unwrap_or([0.0; 3])
    };
    let (surface, direction) = match (kind, closed) {
        (_, true) => ("circle", None),
        (SegKind::Line, false) => ("line", normalize(sub(points[n - 1], points[0]))),
        (SegKind::Arc, false) => ("arc", None),
    };
    TopoSignature {
        surface_type: Some(surface.to_string()),
        area: None,
        centroid: Some(centroid),
        normal: None,
        direction,
        bbox: Some(bbox_of(points.iter())),
        length: Some(length),
    }
}

fn strip_signature(lower: &[V3], upper: &[V3], kind: SegKind, interior: V3) -> TopoSignature {
    let mut outline: Vec<V3> = lower.to_vec();
    outline.extend(upper.iter().rev().copied());
    let mut area = 0.0;
    for i in 0..lower.len().saturating_sub(1) {
        let quad = [lower[i], lower[i + 1], upper[i + 1], upper[i]];
        area += norm(newell(&quad)) / 2.0;
    }
    let center = centroid(&outline);
    let (surface, normal) = match kind {
        SegKind::Line => {
            let n = normalize(newell(&outline)).unwrap_or([0.0, 0.0, 1.0]);
            let n = if dot(n, sub(center, interior)) < 0.0 { scale(n, -1.0) } else { n };
            let planar = outline
                .iter()
                .all(|p| dot(n, sub(*p, outline[0])).abs() < 1e-9 * (1.0 + dist(*p, outline[0])));
            (if planar { "planar" } else { "ruled" }, planar.then_some(n))
        }
        SegKind::Arc => ("cylindrical", None),
    };
    TopoSignature {
        surface_type: Some(surface.to_string()),
        area: Some(area),
        centroid: Some(center),
        normal,
        direction: None,
        bbox: Some(bbox_of(outline.iter())),
        length: None,
    }
}

fn disc_signature(center: V3, normal: V3, radius: f64, ring: &[V3]) -> TopoSignature {
    TopoSignature {
        surface_type: Some("planar".to_string()),
        area: Some(PI * radius * radius),
        centroid: Some(center),
        normal: Some(normal),
        direction: None,
        bbox: Some(bbox_of(ring.iter())),
        length: None,
    }
}
