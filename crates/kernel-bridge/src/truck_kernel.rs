//! Real geometry kernel wrapping truck.
//!
//! truck has no fillet, chamfer or loft between arbitrary wires; those
//! operations report `NotSupported` and parts that need them build with
//! the mock kernel.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use part_types::KernelTolerance;

use crate::primitives::{self, point, vector};
use crate::tessellation;
use crate::traits::Kernel;
use crate::truck_introspect::{self, face_at};
use crate::types::*;

use tracing::{debug, instrument};
use truck_modeling::builder;
use truck_modeling::topology::{Solid, Wire};
use truck_modeling::{InnerSpace, Matrix4, Rad, Vector3};

/// Real geometry kernel backed by the truck BREP library.
pub struct TruckKernel {
    tolerance: KernelTolerance,
    next_handle: u64,
    solids: HashMap<u64, Solid>,
    wires: HashMap<u64, Wire>,
}

impl TruckKernel {
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

    fn alloc(&mut self) -> u64 {
        let h = self.next_handle;
        self.next_handle += 1;
        h
    }

    pub(crate) fn store_solid(&mut self, solid: Solid) -> KernelSolidHandle {
        let h = self.alloc();
        self.solids.insert(h, solid);
        KernelSolidHandle(h)
    }

    fn store_wire(&mut self, wire: Wire) -> KernelWireHandle {
        let h = self.alloc();
        self.wires.insert(h, wire);
        KernelWireHandle(h)
    }

    pub(crate) fn get_solid(&self, handle: &KernelSolidHandle) -> Option<&Solid> {
        self.solids.get(&handle.id())
    }

    pub(crate) fn get_wire(&self, handle: &KernelWireHandle) -> Option<&Wire> {
        self.wires.get(&handle.id())
    }

    fn solid(&self, handle: &KernelSolidHandle) -> Result<Solid, KernelError> {
        self.get_solid(handle)
            .cloned()
            .ok_or(KernelError::EntityNotFound {
                id: KernelId(handle.id()),
            })
    }

    fn wire(&self, handle: &KernelWireHandle) -> Result<Wire, KernelError> {
        self.get_wire(handle)
            .cloned()
            .ok_or(KernelError::EntityNotFound {
                id: KernelId(handle.id()),
            })
    }

    /// Newell normal of a sampled wire (unnormalized).
    fn wire_normal(&self, wire: &Wire) -> Vector3 {
        let pts = truck_introspect::sample_wire(wire, self.tolerance.mesh);
        let n = pts.len();
        let mut acc = Vector3::new(0.0, 0.0, 0.0);
        for i in 0..n {
            let a = pts[i];
            let b = pts[(i + 1) % n];
            acc.x += (a[1] - b[1]) * (a[2] + b[2]);
            acc.y += (a[2] - b[2]) * (a[0] + b[0]);
            acc.z += (a[0] - b[0]) * (a[1] + b[1]);
        }
        acc
    }

    /// Planar face from an outer wire and holes, oriented so that its
    /// normal follows `towards`.
    fn oriented_face(&self, mut wires: Vec<Wire>, towards: Vector3) -> Result<truck_modeling::Face, KernelError> {
        for (i, w) in wires.iter_mut().enumerate() {
            let along = self.wire_normal(w).dot(towards) > 0.0;
            // the outer wire runs with the sweep, holes against it
            if along != (i == 0) {
                *w = w.inverse();
            }
        }
        primitives::planar_face(&wires)
    }

    #[instrument(skip(self, a, b))]
    fn boolean(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
        op: &str,
    ) -> Result<KernelSolidHandle, KernelError> {
        let solid_a = self.solid(a)?;
        let mut solid_b = self.solid(b)?;
        // truck_shapeops works to the mesh tolerance
        let tol = self.tolerance.mesh;
        if op == "subtraction" {
            // A - B = A ∩ ¬B; not() mutates in place
            solid_b.not();
        }
        // truck-topology asserts on degenerate wires (coplanar faces are the
        // usual trigger) instead of returning None
        let result = panic::catch_unwind(AssertUnwindSafe(|| match op {
            "union" => truck_shapeops::or(&solid_a, &solid_b, tol),
            _ => truck_shapeops::and(&solid_a, &solid_b, tol),
        }))
        .map_err(|payload| {
            let cause = panic_message(payload.as_ref());
            debug!(op, tol, cause, "truck boolean panicked");
            KernelError::BooleanFailed {
                reason: format!("truck failed on {op}: {cause}"),
            }
        })?;
        let Some(result) = result else {
            debug!(op, tol, "truck boolean returned nothing");
            return Err(KernelError::BooleanFailed {
                reason: format!("truck returned no result for {op}"),
            });
        };
        Ok(self.store_solid(result))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "panic"
    }
}

impl Default for TruckKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel for TruckKernel {
    fn make_polyline_wire(
        &mut self,
        points: &[[f64; 3]],
        closed: bool,
    ) -> Result<KernelWireHandle, KernelError> {
        let wire = primitives::polyline_wire(points, closed)?;
        Ok(self.store_wire(wire))
    }

    fn make_circle_wire(
        &mut self,
        center: [f64; 3],
        normal: [f64; 3],
        radius: f64,
    ) -> Result<KernelWireHandle, KernelError> {
        let wire = primitives::circle_wire(center, normal, radius)?;
        Ok(self.store_wire(wire))
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
        let dir = vector(direction);
        if dir.magnitude() < 1e-12 {
            return Err(KernelError::InvalidGeometry {
                reason: "extrude direction has zero length".to_string(),
            });
        }
        if depth.abs() <= self.tolerance.coincidence {
            return Err(KernelError::InvalidGeometry {
                reason: format!("extrusion depth must be non-zero, got {depth}"),
            });
        }
        let sweep_vec = dir.normalize() * depth;
        let truck_wires = wires.iter().map(|w| self.wire(w)).collect::<Result<Vec<_>, _>>()?;
        let face = self.oriented_face(truck_wires, sweep_vec)?;
        let solid = builder::tsweep(&face, sweep_vec);
        Ok(self.store_solid(solid))
    }

    fn loft_wires(
        &mut self,
        _bottom: &KernelWireHandle,
        _top: &KernelWireHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        Err(KernelError::NotSupported {
            operation: "loft_wires".to_string(),
        })
    }

    fn sweep_wire(
        &mut self,
        profile: &KernelWireHandle,
        path: &KernelWireHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        let path = self.wire(path)?;
        let ends: Vec<_> = path.vertex_iter().map(|v| v.point()).collect();
        if path.len() != 1 || ends.len() != 2 {
            return Err(KernelError::NotSupported {
                operation: "sweep along a path other than one straight segment".to_string(),
            });
        }
        let sweep_vec = ends[1] - ends[0];
        let profile = self.wire(profile)?;
        let n = self.wire_normal(&profile);
        if n.magnitude() < 1e-12
            || n.normalize().dot(sweep_vec.normalize()).abs() < 1.0 - self.tolerance.angular
        {
            return Err(KernelError::InvalidGeometry {
                reason: "profile is not orthogonal to the sweep path".to_string(),
            });
        }
        let face = self.oriented_face(vec![profile], sweep_vec)?;
        let solid = builder::tsweep(&face, sweep_vec);
        Ok(self.store_solid(solid))
    }

    fn revolve_wire(
        &mut self,
        profile: &KernelWireHandle,
        axis_origin: [f64; 3],
        axis_direction: [f64; 3],
        angle: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        let axis = vector(axis_direction);
        if axis.magnitude() < 1e-12 {
            return Err(KernelError::InvalidGeometry {
                reason: "revolve axis has zero length".to_string(),
            });
        }
        let wire = self.wire(profile)?;
        let face = primitives::planar_face(&[wire])?;
        let solid = builder::rsweep(&face, point(axis_origin), axis.normalize(), Rad(angle));
        Ok(self.store_solid(solid))
    }

    fn make_cylinder(
        &mut self,
        base_center: [f64; 3],
        axis: [f64; 3],
        radius: f64,
        height: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        let solid = primitives::cylinder(base_center, axis, radius, height)?;
        Ok(self.store_solid(solid))
    }

    fn make_cone(
        &mut self,
        base_center: [f64; 3],
        axis: [f64; 3],
        base_radius: f64,
        top_radius: f64,
        height: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        let solid = primitives::cone(base_center, axis, base_radius, top_radius, height)?;
        Ok(self.store_solid(solid))
    }

    fn boolean_union(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        self.boolean(a, b, "union")
    }

    fn boolean_subtract(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        self.boolean(a, b, "subtraction")
    }

    fn boolean_intersect(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        self.boolean(a, b, "intersection")
    }

    fn fillet_edges(
        &mut self,
        _solid: &KernelSolidHandle,
        _edges: &[KernelId],
        _radius: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        Err(KernelError::NotSupported {
            operation: "fillet_edges".to_string(),
        })
    }

    fn chamfer_edges(
        &mut self,
        _solid: &KernelSolidHandle,
        _edges: &[KernelId],
        _distance: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        Err(KernelError::NotSupported {
            operation: "chamfer_edges".to_string(),
        })
    }

    fn transform_solid(
        &mut self,
        solid: &KernelSolidHandle,
        motion: &RigidMotion,
    ) -> Result<KernelSolidHandle, KernelError> {
        let truck_solid = self.solid(solid)?;
        let m = motion.matrix();
        // cgmath matrices are built column by column
        let mat = Matrix4::new(
            m[0][0], m[1][0], m[2][0], m[3][0], m[0][1], m[1][1], m[2][1], m[3][1], m[0][2],
            m[1][2], m[2][2], m[3][2], m[0][3], m[1][3], m[2][3], m[3][3],
        );
        let moved = builder::transformed(&truck_solid, mat);
        Ok(self.store_solid(moved))
    }

    fn face_wires(
        &mut self,
        solid: &KernelSolidHandle,
        face: KernelId,
    ) -> Result<Vec<KernelWireHandle>, KernelError> {
        let truck_solid = self.solid(solid)?;
        let truck_face = face_at(&truck_solid, solid, face).ok_or(KernelError::EntityNotFound { id: face })?;
        let wires = truck_face.boundaries();
        Ok(wires.into_iter().map(|w| self.store_wire(w)).collect())
    }

    fn tessellate(
        &mut self,
        solid: &KernelSolidHandle,
        tolerance: f64,
    ) -> Result<RenderMesh, KernelError> {
        let truck_solid = self.get_solid(solid).ok_or(KernelError::EntityNotFound {
            id: KernelId(solid.id()),
        })?;
        let h = solid.id();
        tessellation::tessellate_solid(truck_solid, tolerance, |i| truck_introspect::face_id(h, i))
    }
}
