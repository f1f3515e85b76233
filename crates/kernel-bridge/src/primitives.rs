//! Higher-level primitive builders on top of truck's sweep API.
//!
//! truck has no built-in cylinder or cone; everything is successive sweeps.

use std::f64::consts::PI;

use truck_modeling::builder;
use truck_modeling::geometry::{Curve, Line};
use truck_modeling::topology::{Edge, Face, Solid, Wire};
use truck_modeling::{InnerSpace, Point3, Rad, Vector3};

use crate::types::KernelError;

pub(crate) fn point(p: [f64; 3]) -> Point3 {
    Point3::new(p[0], p[1], p[2])
}

pub(crate) fn vector(v: [f64; 3]) -> Vector3 {
    Vector3::new(v[0], v[1], v[2])
}

fn unit(v: [f64; 3], what: &str) -> Result<Vector3, KernelError> {
    let v = vector(v);
    if v.magnitude() < 1e-12 {
        return Err(KernelError::InvalidGeometry {
            reason: format!("{what} has zero length"),
        });
    }
    Ok(v.normalize())
}

/// Any unit vector orthogonal to `axis`.
fn radial(axis: Vector3) -> Vector3 {
    let helper = if axis.x.abs() < 0.9 {
        Vector3::unit_x()
    } else {
        Vector3::unit_y()
    };
    axis.cross(helper).normalize()
}

/// Straight-edged wire through the points. Vertices are shared between
/// consecutive edges so the wire is connected.
pub fn polyline_wire(points: &[[f64; 3]], closed: bool) -> Result<Wire, KernelError> {
    if points.len() < 2 || (closed && points.len() < 3) {
        return Err(KernelError::InvalidGeometry {
            reason: format!("polyline needs more points, got {}", points.len()),
        });
    }
    let pts: Vec<Point3> = points.iter().map(|p| point(*p)).collect();
    let vertices: Vec<_> = pts.iter().map(|&p| builder::vertex(p)).collect();
    let n = pts.len();
    let count = if closed { n } else { n - 1 };
    let edges: Vec<Edge> = (0..count)
        .map(|i| {
            let j = (i + 1) % n;
            Edge::new(&vertices[i], &vertices[j], Curve::Line(Line(pts[i], pts[j])))
        })
        .collect();
    Ok(Wire::from_iter(edges))
}

/// Full circle wire, counter-clockwise when seen from the tip of `normal`.
pub fn circle_wire(center: [f64; 3], normal: [f64; 3], radius: f64) -> Result<Wire, KernelError> {
    if radius <= 0.0 {
        return Err(KernelError::InvalidGeometry {
            reason: format!("circle radius must be positive, got {radius}"),
        });
    }
    let axis = unit(normal, "circle normal")?;
    let c = point(center);
    let v = builder::vertex(c + radial(axis) * radius);
    Ok(builder::rsweep(&v, c, axis, Rad(2.0 * PI)))
}

pub fn planar_face(wires: &[Wire]) -> Result<Face, KernelError> {
    builder::try_attach_plane(wires).map_err(|e| KernelError::InvalidGeometry {
        reason: format!("failed to create planar face: {e}"),
    })
}

/// Cylinder: circle wire → face → translational sweep along the axis.
pub fn cylinder(base: [f64; 3], axis: [f64; 3], radius: f64, height: f64) -> Result<Solid, KernelError> {
    if height <= 0.0 {
        return Err(KernelError::InvalidGeometry {
            reason: format!("height must be positive, got {height}"),
        });
    }
    let dir = unit(axis, "axis")?;
    let face = planar_face(&[circle_wire(base, axis, radius)?])?;
    Ok(builder::tsweep(&face, dir * height))
}

/// Truncated cone: half-section polygon → face → rotational sweep 2π.
pub fn cone(
    base: [f64; 3],
    axis: [f64; 3],
    base_radius: f64,
    top_radius: f64,
    height: f64,
) -> Result<Solid, KernelError> {
    if height <= 0.0 || base_radius <= 0.0 || top_radius < 0.0 {
        return Err(KernelError::InvalidGeometry {
            reason: format!("invalid cone {base_radius}/{top_radius} x {height}"),
        });
    }
    let dir = unit(axis, "axis")?;
    let u = radial(dir);
    let b = point(base);
    let top = b + dir * height;
    let mut section = vec![b, b + u * base_radius];
    if top_radius > 1e-12 {
        section.push(top + u * top_radius);
    }
    section.push(top);
    let raw: Vec<[f64; 3]> = section.iter().map(|p| [p.x, p.y, p.z]).collect();
    let face = planar_face(&[polyline_wire(&raw, true)?])?;
    Ok(builder::rsweep(&face, b, dir, Rad(2.0 * PI)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_counts(solid: &Solid) -> (usize, usize, usize) {
        let shell = &solid.boundaries()[0];
        let faces = shell.face_iter().count();
        let mut edge_ids = std::collections::HashSet::new();
        for edge in shell.edge_iter() {
            edge_ids.insert(edge.id());
        }
        let mut vert_ids = std::collections::HashSet::new();
        for v in shell.vertex_iter() {
            vert_ids.insert(v.id());
        }
        (vert_ids.len(), edge_ids.len(), faces)
    }

    #[test]
    fn test_extruded_square_topology() {
        let wire = polyline_wire(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 2.0, 0.0], [0.0, 2.0, 0.0]],
            true,
        )
        .unwrap();
        let face = planar_face(&[wire]).unwrap();
        let solid = builder::tsweep(&face, Vector3::new(0.0, 0.0, 3.0));
        let (v, e, f) = unique_counts(&solid);
        assert_eq!((v, e, f), (8, 12, 6));
        // Euler's formula: V - E + F = 2
        assert_eq!(v as i64 - e as i64 + f as i64, 2);
    }

    #[test]
    fn test_cylinder_has_caps_and_side() {
        let solid = cylinder([0.0; 3], [0.0, 0.0, 1.0], 1.0, 2.0).unwrap();
        let faces = solid.boundaries()[0].face_iter().count();
        assert!(faces >= 3, "Cylinder should have at least 3 faces");
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(polyline_wire(&[[0.0; 3], [1.0, 0.0, 0.0]], true).is_err());
        assert!(circle_wire([0.0; 3], [0.0; 3], 1.0).is_err());
        assert!(cone([0.0; 3], [0.0, 0.0, 1.0], 1.0, 0.5, -1.0).is_err());
    }
}
