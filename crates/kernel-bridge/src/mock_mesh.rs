//! Triangulation of mock solids.
//!
//! Leaf faces are triangulated directly. For composite solids the
//! triangles are refined and kept only where they separate inside from
//! outside, which trims them to the boundary of the boolean result.

use crate::math::*;
use crate::mock_shape::Shape;
use crate::mock_topology::{FaceGeom, Topology};
use crate::types::{FaceRange, KernelId, RenderMesh};

pub(crate) type Tri = [V3; 3];

/// Ear clipping of a simple polygon. Returns index triples in counter-clockwise order.
pub(crate) fn ear_clip(poly: &[V2]) -> Vec<[usize; 3]> {
    let n = poly.len();
    if n < 3 {
        return Vec::new();
    }
    let mut idx: Vec<usize> = (0..n).collect();
    if signed_area2(poly) < 0.0 {
        idx.reverse();
    }
    let convex = |a: V2, b: V2, c: V2| cross2(sub2(b, a), sub2(c, b)) > 1e-14;
    let mut out = Vec::with_capacity(n - 2);
    while idx.len() > 3 {
        let m = idx.len();
        let ear = (0..m).find(|&i| {
            let (a, b, c) = (idx[(i + m - 1) % m], idx[i], idx[(i + 1) % m]);
            let (pa, pb, pc) = (poly[a], poly[b], poly[c]);
            convex(pa, pb, pc)
                && !idx
                    .iter()
                    .any(|&k| k != a && k != b && k != c && in_triangle(poly[k], pa, pb, pc))
        });
        match ear {
            Some(i) => {
                out.push([idx[(i + m - 1) % m], idx[i], idx[(i + 1) % m]]);
                idx.remove(i);
            }
            None => {
                // only reflex or collinear vertices remain; drop a collinear one
                let flat = (0..m).find(|&i| {
                    let (a, b, c) = (poly[idx[(i + m - 1) % m]], poly[idx[i]], poly[idx[(i + 1) % m]]);
                    cross2(sub2(b, a), sub2(c, b)).abs() <= 1e-14
                });
                match flat {
                    Some(i) => {
                        idx.remove(i);
                    }
                    None => break,
                }
            }
        }
    }
    if idx.len() == 3 {
        out.push([idx[0], idx[1], idx[2]]);
    }
    out
}

fn in_triangle(p: V2, a: V2, b: V2, c: V2) -> bool {
    let d1 = cross2(sub2(b, a), sub2(p, a));
    let d2 = cross2(sub2(c, b), sub2(p, b));
    let d3 = cross2(sub2(a, c), sub2(p, c));
    d1 >= 0.0 && d2 >= 0.0 && d3 >= 0.0
}

fn triangulate_face(geom: &FaceGeom) -> Vec<Tri> {
    match geom {
        FaceGeom::Planar { loops, normal, .. } => {
            let x = orthogonal(*normal);
            let y = cross(*normal, x);
            let mut tris = Vec::new();
            for pts in loops {
                let flat: Vec<V2> = pts.iter().map(|p| [dot(*p, x), dot(*p, y)]).collect();
                for [a, b, c] in ear_clip(&flat) {
                    tris.push([pts[a], pts[b], pts[c]]);
                }
            }
            tris
        }
        FaceGeom::Strip { lower, upper } => {
            let mut tris = Vec::new();
            for i in 0..lower.len().saturating_sub(1) {
                tris.push([lower[i], lower[i + 1], upper[i + 1]]);
                tris.push([lower[i], upper[i + 1], upper[i]]);
            }
            tris
        }
        FaceGeom::Revolved {
            profile,
            origin,
            axis,
            angle,
        } => {
            let steps = ((angle.abs() / (std::f64::consts::PI / 16.0)).ceil() as usize).max(3);
            let rotate = |p: V3, a: f64| -> V3 {
                part_types::RigidMotion::rotation(*origin, *axis, a).apply_point(p)
            };
            let mut tris = Vec::new();
            for s in 0..steps {
                let a0 = angle * s as f64 / steps as f64;
                let a1 = angle * (s + 1) as f64 / steps as f64;
                for i in 0..profile.len().saturating_sub(1) {
                    let (p, q) = (profile[i], profile[i + 1]);
                    let (p0, q0, p1, q1) = (rotate(p, a0), rotate(q, a0), rotate(p, a1), rotate(q, a1));
                    tris.push([p0, q0, q1]);
                    tris.push([p0, q1, p1]);
                }
            }
            tris
        }
    }
}

fn tri_normal(t: &Tri) -> Option<V3> {
    normalize(cross(sub(t[1], t[0]), sub(t[2], t[0])))
}

fn refine(t: Tri, max_edge: f64, out: &mut Vec<Tri>) {
    let longest = dist(t[0], t[1]).max(dist(t[1], t[2])).max(dist(t[2], t[0]));
    let k = (longest / max_edge).ceil().max(1.0) as usize;
    if k == 1 {
        out.push(t);
        return;
    }
    let at = |i: usize, j: usize| -> V3 {
        let u = i as f64 / k as f64;
        let v = j as f64 / k as f64;
        add(t[0], add(scale(sub(t[1], t[0]), u), scale(sub(t[2], t[0]), v)))
    };
    for i in 0..k {
        for j in 0..(k - i) {
            out.push([at(i, j), at(i + 1, j), at(i, j + 1)]);
            if i + j + 1 < k {
                out.push([at(i + 1, j), at(i + 1, j + 1), at(i, j + 1)]);
            }
        }
    }
}

/// Mesh a shape. Face ranges are labelled with `face_id(index)` for each
/// topology face that contributed triangles.
pub(crate) fn tessellate(
    shape: &Shape,
    topology: &Topology,
    tolerance: f64,
    face_id: impl Fn(usize) -> KernelId,
) -> RenderMesh {
    let bb = shape.bounding_box();
    let diag = bb.diagonal().max(1e-9);
    let eps = diag * 1e-6;
    let simple_leaf = match shape {
        Shape::Prism(p) => p.region.is_simple() && p.trims.is_empty(),
        Shape::Loft(l) => l.trims.is_empty(),
        Shape::Frustum(_) | Shape::Revolution(_) => true,
        _ => false,
    };
    let max_edge = (diag / 48.0).max(tolerance * 4.0);

    let mut mesh = RenderMesh {
        vertices: Vec::new(),
        normals: Vec::new(),
        indices: Vec::new(),
        face_ranges: Vec::new(),
    };
    for (fi, face) in topology.faces.iter().enumerate() {
        let raw = triangulate_face(&face.geom);
        let candidates = if simple_leaf {
            raw
        } else {
            let mut fine = Vec::new();
            for t in raw {
                refine(t, max_edge, &mut fine);
            }
            fine
        };

        let start_index = mesh.indices.len() as u32;
        for t in candidates {
            let Some(n) = tri_normal(&t) else {
                continue;
            };
            let c = centroid(&t);
            let plus = shape.contains(add(c, scale(n, eps)));
            let minus = shape.contains(sub(c, scale(n, eps)));
            if !simple_leaf && plus == minus {
                continue;
            }
            let (t, n) = if plus {
                ([t[0], t[2], t[1]], scale(n, -1.0))
            } else {
                (t, n)
            };
            for p in t {
                let base = (mesh.vertices.len() / 3) as u32;
                mesh.vertices.extend(p.iter().map(|v| *v as f32));
                mesh.normals.extend(n.iter().map(|v| *v as f32));
                mesh.indices.push(base);
            }
        }
        let end_index = mesh.indices.len() as u32;
        if end_index > start_index {
            mesh.face_ranges.push(FaceRange {
                face_id: face_id(fi),
                start_index,
                end_index,
            });
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ear_clip_concave() {
        // L shape
        let poly = [[0.0, 0.0], [2.0, 0.0], [2.0, 1.0], [1.0, 1.0], [1.0, 2.0], [0.0, 2.0]];
        let tris = ear_clip(&poly);
        assert_eq!(tris.len(), 4);
        let area: f64 = tris
            .iter()
            .map(|[a, b, c]| signed_area2(&[poly[*a], poly[*b], poly[*c]]))
            .sum();
        assert!((area - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_refine_preserves_area() {
        let t = [[0.0, 0.0, 0.0], [3.0, 0.0, 0.0], [0.0, 3.0, 0.0]];
        let mut out = Vec::new();
        refine(t, 1.0, &mut out);
        assert_eq!(out.len(), 25);
        let area: f64 = out.iter().map(|t| norm(newell(t)) / 2.0).sum();
        assert!((area - 4.5).abs() < 1e-12);
    }
}
