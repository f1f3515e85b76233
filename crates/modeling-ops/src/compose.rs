//! Boolean union of planar wires.
//!
//! Each wire is extruded into a slab, the slabs are fused with the 3D
//! boolean union, and the faces of the fused solid lying in the base plane
//! give back the combined outlines. Touching outlines fuse unreliably; the
//! caller widens one of them by `overlap_slack` first (see
//! [`ComposerSettings::nudge`]).

use kernel_bridge::{KernelSolidHandle, KernelWireHandle, TopoKind};
use part_types::KernelTolerance;
use tracing::{debug, instrument};

use crate::geom;
use crate::kernel_ext::{KernelBundle, WirePlane};
use crate::types::{OpError, Profile};

/// Tunables of the wire composer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComposerSettings {
    /// Thickness of the temporary slabs.
    pub extrude_depth: f64,
    /// Distance within which points count as lying in the base plane.
    pub plane_tolerance: f64,
    /// Overlap callers add to outlines that would otherwise only touch.
    pub overlap_slack: f64,
}

impl ComposerSettings {
    pub fn from_tolerance(tol: &KernelTolerance) -> Self {
        Self {
            extrude_depth: tol.composer_depth,
            plane_tolerance: tol.coincidence.max(1e-9) * 100.0,
            overlap_slack: tol.overlap_slack,
        }
    }

    /// A length grown by the overlap slack.
    pub fn nudge(&self, length: f64) -> f64 {
        length + self.overlap_slack
    }
}

impl Default for ComposerSettings {
    fn default() -> Self {
        Self::from_tolerance(&KernelTolerance::default())
    }
}

/// Result of a wire union: one profile per connected region.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedWires {
    pub profiles: Vec<Profile>,
    /// Normal of the base plane, taken from the first input wire.
    pub normal: [f64; 3],
}

impl ComposedWires {
    /// All wires, each region's outer boundary followed by its holes.
    pub fn wires(&self) -> Vec<KernelWireHandle> {
        self.profiles.iter().flat_map(|p| p.wires()).collect()
    }

    /// The single region of the union; fails when the outlines are disjoint.
    pub fn single(&self) -> Result<&Profile, OpError> {
        match self.profiles.as_slice() {
            [one] => Ok(one),
            other => Err(OpError::InvalidParameter {
                reason: format!("expected one connected outline, got {}", other.len()),
            }),
        }
    }
}

/// Union closed coplanar wires into outer boundaries and holes.
#[instrument(skip(kb, wires, settings), fields(wires = wires.len()))]
pub fn union_wires(
    kb: &mut dyn KernelBundle,
    wires: &[KernelWireHandle],
    settings: &ComposerSettings,
) -> Result<ComposedWires, OpError> {
    let Some(first) = wires.first() else {
        return Err(OpError::NoProfiles);
    };
    let plane = kb.wire_plane(first, settings.plane_tolerance)?;
    if wires.len() == 1 {
        return Ok(ComposedWires {
            profiles: vec![Profile::new(first.clone())],
            normal: plane.normal,
        });
    }
    for (i, wire) in wires.iter().enumerate().skip(1) {
        check_coplanar(kb, wire, &plane, settings.plane_tolerance)
            .map_err(|reason| OpError::NotCoplanar {
                reason: format!("wire {i}: {reason}"),
            })?;
    }

    let mut fused: Option<KernelSolidHandle> = None;
    for wire in wires {
        let slab = kb.extrude_wires(std::slice::from_ref(wire), plane.normal, settings.extrude_depth)?;
        fused = Some(match fused {
            None => slab,
            Some(acc) => kb.boolean_union(&acc, &slab)?,
        });
    }
    let Some(fused) = fused else {
        return Err(OpError::NoProfiles);
    };

    let down = geom::scale(plane.normal, -1.0);
    let base_faces: Vec<_> = kb
        .compute_all_signatures(&fused, TopoKind::Face)
        .into_iter()
        .filter(|(_, sig)| {
            let facing = sig
                .normal
                .is_some_and(|n| geom::dot(n, down) >= 1.0 - settings.plane_tolerance);
            let on_plane = sig
                .centroid
                .is_some_and(|c| plane.distance(c).abs() <= settings.plane_tolerance);
            facing && on_plane
        })
        .map(|(id, _)| id)
        .collect();

    let mut profiles = Vec::with_capacity(base_faces.len());
    for face in base_faces {
        let mut face_wires = kb.face_wires(&fused, face)?.into_iter();
        if let Some(outer) = face_wires.next() {
            profiles.push(Profile {
                outer,
                holes: face_wires.collect(),
            });
        }
    }
    if profiles.is_empty() {
        return Err(OpError::EmptySelection {
            selector: "base-plane faces of the composed slabs".to_string(),
        });
    }
    debug!(profiles = profiles.len(), "wires composed");
    Ok(ComposedWires {
        profiles,
        normal: plane.normal,
    })
}

fn check_coplanar(
    kb: &dyn KernelBundle,
    wire: &KernelWireHandle,
    base: &WirePlane,
    tolerance: f64,
) -> Result<(), String> {
    let own = kb.wire_plane(wire, tolerance).map_err(|e| e.to_string())?;
    if geom::dot(own.normal, base.normal).abs() < 1.0 - tolerance {
        return Err("plane is tilted against the first wire".to_string());
    }
    if base.distance(own.origin).abs() > tolerance {
        return Err("plane is offset from the first wire".to_string());
    }
    Ok(())
}
