use kernel_bridge::{Kernel, KernelIntrospect, KernelSolidHandle, KernelWireHandle, TopoKind};

use crate::geom;
use crate::types::OpError;

/// Plane spanned by a closed planar wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WirePlane {
    /// First sample point of the wire.
    pub origin: [f64; 3],
    /// Unit normal by the right-hand rule along the wire.
    pub normal: [f64; 3],
}

impl WirePlane {
    /// Signed distance of a point from the plane.
    pub fn distance(&self, p: [f64; 3]) -> f64 {
        geom::dot(geom::sub(p, self.origin), self.normal)
    }
}

/// Combined trait for operations that need both mutable Kernel access
/// and read-only KernelIntrospect access on the same object.
///
/// This avoids the borrow-checker issue of needing &mut and & on the same value.
pub trait KernelBundle: Kernel + KernelIntrospect {
    fn as_introspect(&self) -> &dyn KernelIntrospect;

    /// Plane of a closed wire. Fails when the wire encloses no area or
    /// strays further than `tolerance` from its own plane.
    fn wire_plane(&self, wire: &KernelWireHandle, tolerance: f64) -> Result<WirePlane, OpError> {
        let points = self.wire_points(wire)?;
        let normal = geom::normalize(geom::newell(&points)).ok_or_else(|| {
            OpError::InvalidParameter {
                reason: "wire encloses no area".to_string(),
            }
        })?;
        let plane = WirePlane {
            origin: points[0],
            normal,
        };
        if let Some(p) = points.iter().find(|p| plane.distance(**p).abs() > tolerance) {
            return Err(OpError::NotCoplanar {
                reason: format!("wire point {p:?} is off its plane"),
            });
        }
        Ok(plane)
    }

    /// Number of faces, edges and vertices of a solid.
    fn topology_counts(&self, solid: &KernelSolidHandle) -> [usize; 3] {
        [
            self.list_faces(solid).len(),
            self.list_edges(solid).len(),
            self.list_vertices(solid).len(),
        ]
    }

    /// Faces whose planar normal points along `direction`.
    fn faces_facing(&self, solid: &KernelSolidHandle, direction: [f64; 3], tolerance: f64) -> Vec<kernel_bridge::KernelId> {
        self.compute_all_signatures(solid, TopoKind::Face)
            .into_iter()
            .filter(|(_, sig)| {
                sig.normal
                    .is_some_and(|n| geom::dot(n, direction) >= 1.0 - tolerance)
            })
            .map(|(id, _)| id)
            .collect()
    }
}

// Blanket implementation for any type that implements both traits
impl<T: Kernel + KernelIntrospect> KernelBundle for T {
    fn as_introspect(&self) -> &dyn KernelIntrospect {
        self
    }
}
