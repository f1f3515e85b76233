use nalgebra::{Isometry3, Point3, Translation3, Unit, UnitQuaternion, Vector3};

/// A proper rigid motion (rotation followed by translation).
///
/// Kernels receive motions through [`RigidMotion::matrix`] so they do not
/// depend on the math library used here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidMotion {
    iso: Isometry3<f64>,
}

impl RigidMotion {
    pub fn identity() -> Self {
        Self {
            iso: Isometry3::identity(),
        }
    }

    pub fn translation(v: [f64; 3]) -> Self {
        Self {
            iso: Isometry3::from_parts(
                Translation3::new(v[0], v[1], v[2]),
                UnitQuaternion::identity(),
            ),
        }
    }

    /// Rotation by `angle` radians about the axis through `origin` along `axis`.
    /// A zero-length axis yields the identity.
    pub fn rotation(origin: [f64; 3], axis: [f64; 3], angle: f64) -> Self {
        let axis = Vector3::from(axis);
        let Some(axis) = Unit::try_new(axis, 1e-12) else {
            return Self::identity();
        };
        let o = Vector3::from(origin);
        let rot = UnitQuaternion::from_axis_angle(&axis, angle);
        let to_origin = Isometry3::from_parts(Translation3::from(-o), UnitQuaternion::identity());
        let back = Isometry3::from_parts(Translation3::from(o), UnitQuaternion::identity());
        let spin = Isometry3::from_parts(Translation3::identity(), rot);
        Self {
            iso: back * spin * to_origin,
        }
    }

    pub fn from_isometry(iso: Isometry3<f64>) -> Self {
        Self { iso }
    }

    pub fn isometry(&self) -> Isometry3<f64> {
        self.iso
    }

    /// Apply `self` first, then `next`.
    pub fn then(&self, next: &RigidMotion) -> RigidMotion {
        RigidMotion {
            iso: next.iso * self.iso,
        }
    }

    pub fn inverse(&self) -> RigidMotion {
        RigidMotion {
            iso: self.iso.inverse(),
        }
    }

    pub fn apply_point(&self, p: [f64; 3]) -> [f64; 3] {
        let q = self.iso.transform_point(&Point3::from(p));
        [q.x, q.y, q.z]
    }

    pub fn apply_vector(&self, v: [f64; 3]) -> [f64; 3] {
        let w = self.iso.transform_vector(&Vector3::from(v));
        [w.x, w.y, w.z]
    }

    /// Row-major homogeneous 4×4 matrix.
    pub fn matrix(&self) -> [[f64; 4]; 4] {
        let m = self.iso.to_homogeneous();
        let mut out = [[0.0; 4]; 4];
        for (r, row) in out.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = m[(r, c)];
            }
        }
        out
    }

    /// True when the motion moves no point by more than `tol` within a unit-scale region.
    pub fn is_identity(&self, tol: f64) -> bool {
        self.iso.translation.vector.norm() <= tol && self.iso.rotation.angle() <= tol
    }
}

impl Default for RigidMotion {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_rotation_about_offset_axis() {
        let m = RigidMotion::rotation([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], FRAC_PI_2);
        let p = m.apply_point([2.0, 0.0, 0.0]);
        assert_abs_diff_eq!(p[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p[1], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_then_and_inverse() {
        let a = RigidMotion::translation([1.0, 2.0, 3.0]);
        let b = RigidMotion::rotation([0.0; 3], [1.0, 0.0, 0.0], 0.3);
        let ab = a.then(&b);
        let p = [0.5, -0.25, 2.0];
        let q = ab.apply_point(p);
        let expected = b.apply_point(a.apply_point(p));
        for i in 0..3 {
            assert_abs_diff_eq!(q[i], expected[i], epsilon = 1e-12);
        }
        assert!(ab.then(&ab.inverse()).is_identity(1e-12));
    }

    #[test]
    fn test_matrix_is_row_major() {
        let m = RigidMotion::translation([4.0, 5.0, 6.0]).matrix();
        assert_eq!(m[0][3], 4.0);
        assert_eq!(m[1][3], 5.0);
        assert_eq!(m[2][3], 6.0);
        assert_eq!(m[3], [0.0, 0.0, 0.0, 1.0]);
    }
}
