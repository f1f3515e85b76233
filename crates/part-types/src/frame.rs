//! Oriented coordinate frames (workplanes).

use nalgebra::{Isometry3, Matrix3, Point3, Rotation3, Translation3, Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::motion::RigidMotion;

/// Errors from frame construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameError {
    #[error("degenerate frame: {reason}")]
    Degenerate { reason: String },

    #[error("unknown named frame: {name}")]
    UnknownName { name: String },
}

/// An oriented coordinate system: origin, in-plane x axis, and normal.
///
/// The in-plane y axis is `normal × x_dir`. All three axes are unit length and
/// mutually orthogonal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    origin: Point3<f64>,
    x_dir: Vector3<f64>,
    normal: Vector3<f64>,
}

impl Frame {
    /// Create a frame. `x_dir` is projected into the plane before normalizing.
    pub fn new(origin: [f64; 3], x_dir: [f64; 3], normal: [f64; 3]) -> Result<Self, FrameError> {
        let n = Vector3::from(normal);
        let n = Unit::try_new(n, 1e-12)
            .ok_or_else(|| FrameError::Degenerate {
                reason: "normal has zero length".to_string(),
            })?
            .into_inner();
        let x = Vector3::from(x_dir);
        let x = x - n * n.dot(&x);
        let x = Unit::try_new(x, 1e-12)
            .ok_or_else(|| FrameError::Degenerate {
                reason: "x direction is parallel to the normal".to_string(),
            })?
            .into_inner();
        Ok(Self {
            origin: Point3::from(origin),
            x_dir: x,
            normal: n,
        })
    }

    fn axes(x: [f64; 3], n: [f64; 3]) -> Self {
        Self {
            origin: Point3::origin(),
            x_dir: Vector3::from(x),
            normal: Vector3::from(n),
        }
    }

    pub fn xy() -> Self {
        Self::axes([1.0, 0.0, 0.0], [0.0, 0.0, 1.0])
    }

    pub fn yz() -> Self {
        Self::axes([0.0, 1.0, 0.0], [1.0, 0.0, 0.0])
    }

    pub fn zx() -> Self {
        Self::axes([0.0, 0.0, 1.0], [0.0, 1.0, 0.0])
    }

    /// Front view plane: x along +X, normal along −Y, so in-plane y is +Z.
    pub fn xz() -> Self {
        Self::axes([1.0, 0.0, 0.0], [0.0, -1.0, 0.0])
    }

    pub fn yx() -> Self {
        Self::axes([0.0, 1.0, 0.0], [0.0, 0.0, -1.0])
    }

    pub fn zy() -> Self {
        Self::axes([0.0, 0.0, 1.0], [-1.0, 0.0, 0.0])
    }

    /// Look up one of the six axis-aligned named frames.
    pub fn named(name: &str) -> Result<Self, FrameError> {
        match name.to_ascii_uppercase().as_str() {
            "XY" => Ok(Self::xy()),
            "YZ" => Ok(Self::yz()),
            "ZX" => Ok(Self::zx()),
            "XZ" => Ok(Self::xz()),
            "YX" => Ok(Self::yx()),
            "ZY" => Ok(Self::zy()),
            _ => Err(FrameError::UnknownName {
                name: name.to_string(),
            }),
        }
    }

    pub fn origin(&self) -> [f64; 3] {
        [self.origin.x, self.origin.y, self.origin.z]
    }

    pub fn x_dir(&self) -> [f64; 3] {
        [self.x_dir.x, self.x_dir.y, self.x_dir.z]
    }

    pub fn y_dir(&self) -> [f64; 3] {
        let y = self.normal.cross(&self.x_dir);
        [y.x, y.y, y.z]
    }

    pub fn normal(&self) -> [f64; 3] {
        [self.normal.x, self.normal.y, self.normal.z]
    }

    /// Local (x, y) in the plane to world coordinates.
    pub fn to_world(&self, local: [f64; 2]) -> [f64; 3] {
        self.to_world3([local[0], local[1], 0.0])
    }

    /// Local (x, y, z) to world coordinates; z runs along the normal.
    pub fn to_world3(&self, local: [f64; 3]) -> [f64; 3] {
        let y = self.normal.cross(&self.x_dir);
        let p = self.origin + self.x_dir * local[0] + y * local[1] + self.normal * local[2];
        [p.x, p.y, p.z]
    }

    /// Local direction to world direction.
    pub fn vector_to_world(&self, local: [f64; 3]) -> [f64; 3] {
        let y = self.normal.cross(&self.x_dir);
        let v = self.x_dir * local[0] + y * local[1] + self.normal * local[2];
        [v.x, v.y, v.z]
    }

    /// World coordinates to local (x, y, z).
    pub fn to_local(&self, world: [f64; 3]) -> [f64; 3] {
        let d = Point3::from(world) - self.origin;
        let y = self.normal.cross(&self.x_dir);
        [d.dot(&self.x_dir), d.dot(&y), d.dot(&self.normal)]
    }

    /// Move the origin along the normal.
    pub fn offset(&self, distance: f64) -> Self {
        Self {
            origin: self.origin + self.normal * distance,
            ..*self
        }
    }

    /// Move the origin within the plane, in local coordinates.
    pub fn shifted(&self, dx: f64, dy: f64) -> Self {
        Self {
            origin: Point3::from(self.to_world([dx, dy])),
            ..*self
        }
    }

    /// Place the origin at a world point, keeping the axes.
    pub fn with_origin(&self, origin: [f64; 3]) -> Self {
        Self {
            origin: Point3::from(origin),
            ..*self
        }
    }

    /// Rotate the axes in place by angles in degrees about the current local
    /// x, y and z axes. The z rotation is applied first, then y, then x, all
    /// about the axes of this frame (not the intermediate ones).
    pub fn rotated(&self, rotate_deg: [f64; 3]) -> Self {
        let y = self.normal.cross(&self.x_dir);
        let rx = Rotation3::from_axis_angle(&Unit::new_unchecked(self.x_dir), rotate_deg[0].to_radians());
        let ry = Rotation3::from_axis_angle(&Unit::new_unchecked(y), rotate_deg[1].to_radians());
        let rz = Rotation3::from_axis_angle(&Unit::new_unchecked(self.normal), rotate_deg[2].to_radians());
        let r = rx * ry * rz;
        Self {
            origin: self.origin,
            x_dir: (r * self.x_dir).normalize(),
            normal: (r * self.normal).normalize(),
        }
    }

    /// Offset the origin by a local vector, then rotate the axes.
    pub fn transformed(&self, offset: [f64; 3], rotate_deg: [f64; 3]) -> Self {
        let origin = self.to_world3(offset);
        self.rotated(rotate_deg).with_origin(origin)
    }

    /// Flip the normal, keeping the x direction (the y direction flips too).
    pub fn inverted(&self) -> Self {
        Self {
            normal: -self.normal,
            ..*self
        }
    }

    /// Isometry mapping local coordinates to world coordinates.
    pub fn isometry(&self) -> Isometry3<f64> {
        let y = self.normal.cross(&self.x_dir);
        let basis = Matrix3::from_columns(&[self.x_dir, y, self.normal]);
        let rotation = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(basis));
        Isometry3::from_parts(Translation3::from(self.origin.coords), rotation)
    }

    /// The rigid motion carrying geometry expressed relative to `self` onto
    /// the same local placement relative to `target`.
    pub fn motion_to(&self, target: &Frame) -> RigidMotion {
        RigidMotion::from_isometry(target.isometry() * self.isometry().inverse())
    }

    /// Apply a rigid motion to the frame.
    pub fn moved(&self, motion: &RigidMotion) -> Self {
        let iso = motion.isometry();
        Self {
            origin: iso.transform_point(&self.origin),
            x_dir: iso.transform_vector(&self.x_dir).normalize(),
            normal: iso.transform_vector(&self.normal).normalize(),
        }
    }

    /// Same origin and axes within `tol`.
    pub fn approx_eq(&self, other: &Frame, tol: f64) -> bool {
        (self.origin - other.origin).norm() <= tol
            && (self.x_dir - other.x_dir).norm() <= tol
            && (self.normal - other.normal).norm() <= tol
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::xy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_vec_eq(a: [f64; 3], b: [f64; 3]) {
        for i in 0..3 {
            assert_abs_diff_eq!(a[i], b[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_named_frames_are_right_handed() {
        for name in ["XY", "YZ", "ZX", "XZ", "YX", "ZY"] {
            let f = Frame::named(name).unwrap();
            let x = Vector3::from(f.x_dir());
            let y = Vector3::from(f.y_dir());
            let n = Vector3::from(f.normal());
            assert_abs_diff_eq!(x.cross(&y).dot(&n), 1.0, epsilon = 1e-12);
        }
        assert!(Frame::named("QQ").is_err());
    }

    #[test]
    fn test_xz_has_z_up_in_plane() {
        let f = Frame::xz();
        assert_vec_eq(f.y_dir(), [0.0, 0.0, 1.0]);
        assert_vec_eq(f.to_world([2.0, 3.0]), [2.0, 0.0, 3.0]);
    }

    #[test]
    fn test_new_orthogonalizes_x() {
        let f = Frame::new([0.0; 3], [1.0, 0.0, 1.0], [0.0, 0.0, 2.0]).unwrap();
        assert_vec_eq(f.x_dir(), [1.0, 0.0, 0.0]);
        assert_vec_eq(f.normal(), [0.0, 0.0, 1.0]);
        assert!(Frame::new([0.0; 3], [0.0, 0.0, 1.0], [0.0, 0.0, 1.0]).is_err());
    }

    #[test]
    fn test_transformed_rotates_about_local_x() {
        let f = Frame::xy().transformed([0.0, 0.0, 10.0], [90.0, 0.0, 0.0]);
        assert_vec_eq(f.origin(), [0.0, 0.0, 10.0]);
        assert_vec_eq(f.x_dir(), [1.0, 0.0, 0.0]);
        assert_vec_eq(f.normal(), [0.0, -1.0, 0.0]);
    }

    #[test]
    fn test_local_world_roundtrip() {
        let f = Frame::xz().transformed([1.0, 2.0, 3.0], [10.0, 20.0, 30.0]);
        let p = [0.3, -4.0, 2.5];
        let back = f.to_local(f.to_world3(p));
        assert_vec_eq(back, p);
    }

    #[test]
    fn test_motion_to_maps_frames() {
        let a = Frame::xy();
        let b = Frame::yz().offset(5.0).shifted(1.0, 2.0);
        let m = a.motion_to(&b);
        assert!(a.moved(&m).approx_eq(&b, 1e-9));
        assert_vec_eq(m.apply_point(a.to_world3([1.0, 2.0, 3.0])), b.to_world3([1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_inverted_keeps_x() {
        let f = Frame::xy().inverted();
        assert_vec_eq(f.x_dir(), [1.0, 0.0, 0.0]);
        assert_vec_eq(f.normal(), [0.0, 0.0, -1.0]);
        assert_vec_eq(f.y_dir(), [0.0, -1.0, 0.0]);
    }
}
