//! Tessellation of truck solids.
//!
//! Wraps truck-meshalgo to produce RenderMesh with FaceRange entries that
//! map triangle index ranges to logical faces, and derives volume, bounds
//! and point membership from the merged triangle mesh.

use crate::types::*;
use crate::types::BoundingBox;
use truck_meshalgo::prelude::*;
use truck_meshalgo::tessellation::{MeshableShape, MeshedShape};

type TruckSolid = truck_modeling::Solid;

/// Tessellate a truck Solid into a RenderMesh with per-face tracking.
/// `face_id` maps the running face index (across shells) to its KernelId.
pub fn tessellate_solid(
    solid: &TruckSolid,
    tolerance: f64,
    face_id: impl Fn(usize) -> KernelId,
) -> Result<RenderMesh, KernelError> {
    let meshed_solid = solid.triangulation(tolerance);

    let mut all_vertices: Vec<f32> = Vec::new();
    let mut all_normals: Vec<f32> = Vec::new();
    let mut all_indices: Vec<u32> = Vec::new();
    let mut face_ranges: Vec<FaceRange> = Vec::new();

    let faces = meshed_solid.boundaries().iter().flat_map(|shell| shell.face_iter());
    for (index, face) in faces.enumerate() {
        let maybe_mesh: Option<PolygonMesh> = face.surface();
        let Some(mut face_mesh) = maybe_mesh else {
            continue;
        };
        if !face.orientation() {
            face_mesh.invert();
        }

        let start_index = all_indices.len() as u32;
        let base_vertex = (all_vertices.len() / 3) as u32;

        let positions = face_mesh.positions();
        let normals = face_mesh.normals();
        for pos in positions {
            all_vertices.extend([pos[0] as f32, pos[1] as f32, pos[2] as f32]);
        }
        if normals.len() == positions.len() {
            for norm in normals {
                all_normals.extend([norm[0] as f32, norm[1] as f32, norm[2] as f32]);
            }
        } else {
            for _ in 0..positions.len() {
                all_normals.extend([0.0, 0.0, 1.0]);
            }
        }
        for tri in face_mesh.tri_faces() {
            for v in tri.iter() {
                all_indices.push(v.pos as u32 + base_vertex);
            }
        }

        let end_index = all_indices.len() as u32;
        if end_index > start_index {
            face_ranges.push(FaceRange {
                face_id: face_id(index),
                start_index,
                end_index,
            });
        }
    }

    if all_indices.is_empty() {
        return Err(KernelError::TessellationFailed {
            reason: "truck produced no triangles".to_string(),
        });
    }

    Ok(RenderMesh {
        vertices: all_vertices,
        normals: all_normals,
        indices: all_indices,
        face_ranges,
    })
}

/// All triangles of the solid as world-space corner triples.
pub(crate) fn solid_triangles(solid: &TruckSolid, tolerance: f64) -> Vec<[[f64; 3]; 3]> {
    let mesh = solid.triangulation(tolerance).to_polygon();
    let positions = mesh.positions();
    mesh.tri_faces()
        .iter()
        .map(|tri| {
            let p = |k: usize| {
                let q = positions[tri[k].pos];
                [q[0], q[1], q[2]]
            };
            [p(0), p(1), p(2)]
        })
        .collect()
}

/// Triangles of each face in boundary order, oriented outward.
pub(crate) fn face_triangles(solid: &TruckSolid, tolerance: f64) -> Vec<Vec<[[f64; 3]; 3]>> {
    let meshed_solid = solid.triangulation(tolerance);
    meshed_solid
        .boundaries()
        .iter()
        .flat_map(|shell| shell.face_iter())
        .map(|face| {
            let maybe_mesh: Option<PolygonMesh> = face.surface();
            let Some(mut mesh) = maybe_mesh else {
                return Vec::new();
            };
            if !face.orientation() {
                mesh.invert();
            }
            let positions = mesh.positions();
            mesh.tri_faces()
                .iter()
                .map(|tri| {
                    let p = |k: usize| {
                        let q = positions[tri[k].pos];
                        [q[0], q[1], q[2]]
                    };
                    [p(0), p(1), p(2)]
                })
                .collect()
        })
        .collect()
}

/// Enclosed volume by the divergence theorem.
pub(crate) fn mesh_volume(triangles: &[[[f64; 3]; 3]]) -> f64 {
    triangles
        .iter()
        .map(|[a, b, c]| {
            let cross = [
                b[1] * c[2] - b[2] * c[1],
                b[2] * c[0] - b[0] * c[2],
                b[0] * c[1] - b[1] * c[0],
            ];
            (a[0] * cross[0] + a[1] * cross[1] + a[2] * cross[2]) / 6.0
        })
        .sum::<f64>()
        .abs()
}

pub(crate) fn mesh_bounds(triangles: &[[[f64; 3]; 3]]) -> BoundingBox {
    BoundingBox::from_points(triangles.iter().flat_map(|t| t.iter()))
}

/// Parity of ray crossings along a fixed skew direction.
pub(crate) fn mesh_contains(triangles: &[[[f64; 3]; 3]], p: [f64; 3]) -> bool {
    const DIR: [f64; 3] = [0.577_215_664_9, 0.618_033_988_7, 0.533_969_117_3];
    let sub = |a: [f64; 3], b: [f64; 3]| [a[0] - b[0], a[1] - b[1], a[2] - b[2]];
    let cross = |a: [f64; 3], b: [f64; 3]| {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    };
    let dot = |a: [f64; 3], b: [f64; 3]| a[0] * b[0] + a[1] * b[1] + a[2] * b[2];

    let mut hits = 0usize;
    for [a, b, c] in triangles {
        let e1 = sub(*b, *a);
        let e2 = sub(*c, *a);
        let h = cross(DIR, e2);
        let det = dot(e1, h);
        if det.abs() < 1e-14 {
            continue;
        }
        let s = sub(p, *a);
        let u = dot(s, h) / det;
        if !(0.0..=1.0).contains(&u) {
            continue;
        }
        let q = cross(s, e1);
        let v = dot(DIR, q) / det;
        if v < 0.0 || u + v > 1.0 {
            continue;
        }
        if dot(e2, q) / det > 0.0 {
            hits += 1;
        }
    }
    hits % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives;

    fn cube() -> TruckSolid {
        let wire = primitives::polyline_wire(
            &[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 2.0, 0.0], [0.0, 2.0, 0.0]],
            true,
        )
        .unwrap();
        let face = primitives::planar_face(&[wire]).unwrap();
        truck_modeling::builder::tsweep(&face, truck_modeling::Vector3::new(0.0, 0.0, 2.0))
    }

    #[test]
    fn test_tessellate_box_face_ranges() {
        let mesh = tessellate_solid(&cube(), 0.1, |i| KernelId(i as u64)).unwrap();
        assert_eq!(mesh.face_ranges.len(), 6, "Box should have 6 face ranges");
        let covered: u32 = mesh
            .face_ranges
            .iter()
            .map(|r| r.end_index - r.start_index)
            .sum();
        assert_eq!(covered, mesh.indices.len() as u32);
    }

    #[test]
    fn test_mesh_volume_and_membership() {
        let tris = solid_triangles(&cube(), 0.1);
        assert!((mesh_volume(&tris) - 8.0).abs() < 1e-6);
        assert!(mesh_contains(&tris, [1.0, 1.0, 1.0]));
        assert!(!mesh_contains(&tris, [3.0, 1.0, 1.0]));
        let bb = mesh_bounds(&tris);
        assert!((bb.max[2] - 2.0).abs() < 1e-9);
    }
}
