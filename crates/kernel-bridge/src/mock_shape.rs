//! Analytic solids for the mock kernel: profile prisms, ruled lofts,
//! frustums and revolutions, combined by boolean nodes.
//!
//! Point membership is exact for every node. Volumes are closed-form for
//! plain leaves and integrated on a regular grid otherwise.

use std::f64::consts::PI;

use part_types::{BoundingBox, Frame, RigidMotion};

use crate::math::*;
use crate::mock_profile::{Loop, Region};

/// Edge treatment applied along a whole cap boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum CapTrim {
    Round(f64),
    Chamfer(f64),
}

impl CapTrim {
    pub(crate) fn size(&self) -> f64 {
        match *self {
            CapTrim::Round(r) | CapTrim::Chamfer(r) => r,
        }
    }

    /// Whether a point at distance `d` from the side walls and `h` from the cap is kept.
    fn keeps(&self, d: f64, h: f64) -> bool {
        match *self {
            CapTrim::Round(r) => {
                if d >= r || h >= r {
                    return true;
                }
                (r - d).powi(2) + (r - h).powi(2) <= r * r
            }
            CapTrim::Chamfer(c) => d >= c || h >= c || d + h >= c,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct CapTrims {
    pub bottom: Option<CapTrim>,
    pub top: Option<CapTrim>,
}

impl CapTrims {
    pub fn is_empty(&self) -> bool {
        self.bottom.is_none() && self.top.is_none()
    }

    fn keeps(&self, d: f64, from_bottom: f64, from_top: f64) -> bool {
        self.bottom.map_or(true, |t| t.keeps(d, from_bottom))
            && self.top.map_or(true, |t| t.keeps(d, from_top))
    }
}

/// A region in the local xy plane of `frame`, extruded from z = 0 to z = height.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Prism {
    pub frame: Frame,
    pub region: Region,
    pub height: f64,
    pub trims: CapTrims,
}

/// A loop lying in the xy plane of its frame.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Section {
    pub frame: Frame,
    pub profile: Loop,
}

impl Section {
    pub fn world_points(&self) -> Vec<V3> {
        self.profile.pts.iter().map(|p| self.frame.to_world(*p)).collect()
    }
}

/// Ruled solid between two sections matched vertex by vertex. Both frame
/// normals point from the bottom section towards the top one.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Loft {
    pub bottom: Section,
    pub top: Section,
    pub trims: CapTrims,
}

/// Cylinder or truncated cone.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Frustum {
    pub base: V3,
    pub axis: V3,
    pub base_radius: f64,
    pub top_radius: f64,
    pub height: f64,
}

/// A profile in the local (x, z) half plane of `frame` revolved about the
/// frame normal by `angle` radians, starting at the local x axis.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Revolution {
    pub frame: Frame,
    pub profile: Loop,
    pub angle: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Shape {
    Prism(Prism),
    Loft(Loft),
    Frustum(Frustum),
    Revolution(Revolution),
    Union(Vec<Shape>),
    Difference(Box<Shape>, Box<Shape>),
    Intersection(Box<Shape>, Box<Shape>),
}

impl Prism {
    fn contains(&self, p: V3) -> bool {
        let l = self.frame.to_local(p);
        if l[2] < 0.0 || l[2] > self.height {
            return false;
        }
        let q = [l[0], l[1]];
        if !self.region.contains(q) {
            return false;
        }
        if self.trims.is_empty() {
            return true;
        }
        let d = self.region.boundary_distance(q);
        self.trims.keeps(d, l[2], self.height - l[2])
    }

    fn bounding_box(&self) -> BoundingBox {
        let (min, max) = self.region.bounds();
        let mut bb = BoundingBox::empty();
        for x in [min[0], max[0]] {
            for y in [min[1], max[1]] {
                for z in [0.0, self.height] {
                    bb.include(self.frame.to_world3([x, y, z]));
                }
            }
        }
        bb
    }
}

impl Loft {
    /// Whether the two sections lie in parallel planes.
    pub fn is_parallel(&self) -> bool {
        dot(self.bottom.frame.normal(), self.top.frame.normal()) > 1.0 - 1e-12
    }

    fn centers(&self) -> (V3, V3) {
        (
            centroid(&self.bottom.world_points()),
            centroid(&self.top.world_points()),
        )
    }

    fn normal_at(&self, t: f64) -> V3 {
        let n = lerp(self.bottom.frame.normal(), self.top.frame.normal(), t);
        normalize(n).unwrap_or(self.bottom.frame.normal())
    }

    /// Section polygon at parameter `t` in world coordinates.
    pub fn section_at(&self, t: f64) -> Vec<V3> {
        let b = self.bottom.world_points();
        let top = self.top.world_points();
        b.iter().zip(top.iter()).map(|(p, q)| lerp(*p, *q, t)).collect()
    }

    /// Section parameter of the plane through `p`, if `p` lies between the caps.
    fn parameter_of(&self, p: V3) -> Option<f64> {
        let (cb, ct) = self.centers();
        let f = |t: f64| dot(self.normal_at(t), sub(p, lerp(cb, ct, t)));
        let (f0, f1) = (f(0.0), f(1.0));
        if f0 < 0.0 || f1 > 0.0 {
            return None;
        }
        let (mut lo, mut hi) = (0.0, 1.0);
        for _ in 0..60 {
            let mid = 0.5 * (lo + hi);
            if f(mid) > 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        Some(0.5 * (lo + hi))
    }

    /// Point expressed in 2D coordinates of the section plane at `t`, with the section polygon.
    fn section_2d(&self, p: V3, t: f64) -> (V2, Vec<V2>) {
        let n = self.normal_at(t);
        let x = lerp(self.bottom.frame.x_dir(), self.top.frame.x_dir(), t);
        let x = normalize(sub(x, scale(n, dot(x, n)))).unwrap_or_else(|| orthogonal(n));
        let y = cross(n, x);
        let proj = |q: V3| [dot(q, x), dot(q, y)];
        let poly = self.section_at(t).into_iter().map(proj).collect();
        (proj(p), poly)
    }

    fn contains(&self, p: V3) -> bool {
        let Some(t) = self.parameter_of(p) else {
            return false;
        };
        let (q, poly) = self.section_2d(p, t);
        if !point_in_polygon(q, &poly) {
            return false;
        }
        if self.trims.is_empty() {
            return true;
        }
        let n = poly.len();
        let d = (0..n)
            .map(|i| segment_distance2(q, poly[i], poly[(i + 1) % n]))
            .fold(f64::INFINITY, f64::min);
        let from_bottom = dot(self.bottom.frame.normal(), sub(p, self.bottom.frame.origin()));
        let from_top = dot(self.top.frame.normal(), sub(self.top.frame.origin(), p));
        self.trims.keeps(d, from_bottom, from_top)
    }

    /// Exact prismatoid volume for parallel sections.
    fn prismatoid_volume(&self) -> f64 {
        let n = self.bottom.frame.normal();
        let h = dot(n, sub(self.top.frame.origin(), self.bottom.frame.origin())).abs();
        let area = |pts: &[V3]| norm(newell(pts)) / 2.0;
        let a0 = area(&self.section_at(0.0));
        let am = area(&self.section_at(0.5));
        let a1 = area(&self.section_at(1.0));
        h / 6.0 * (a0 + 4.0 * am + a1)
    }
}

impl Frustum {
    fn radius_at(&self, h: f64) -> f64 {
        self.base_radius + (self.top_radius - self.base_radius) * h / self.height
    }

    fn contains(&self, p: V3) -> bool {
        let d = sub(p, self.base);
        let h = dot(d, self.axis);
        if h < 0.0 || h > self.height {
            return false;
        }
        let radial = norm(sub(d, scale(self.axis, h)));
        radial <= self.radius_at(h)
    }

    fn volume(&self) -> f64 {
        let (r0, r1) = (self.base_radius, self.top_radius);
        PI * self.height / 3.0 * (r0 * r0 + r0 * r1 + r1 * r1)
    }

    fn bounding_box(&self) -> BoundingBox {
        let mut bb = BoundingBox::empty();
        let top = add(self.base, scale(self.axis, self.height));
        for (c, r) in [(self.base, self.base_radius), (top, self.top_radius)] {
            let ext: Vec<f64> = (0..3)
                .map(|i| r * (1.0 - self.axis[i] * self.axis[i]).max(0.0).sqrt())
                .collect();
            bb.include([c[0] - ext[0], c[1] - ext[1], c[2] - ext[2]]);
            bb.include([c[0] + ext[0], c[1] + ext[1], c[2] + ext[2]]);
        }
        bb
    }
}

impl Revolution {
    fn full_turn(&self) -> bool {
        self.angle >= 2.0 * PI - 1e-12
    }

    fn contains(&self, p: V3) -> bool {
        let l = self.frame.to_local(p);
        if !self.full_turn() {
            let mut phi = l[1].atan2(l[0]);
            if phi < 0.0 {
                phi += 2.0 * PI;
            }
            if phi > self.angle {
                return false;
            }
        }
        let r = l[0].hypot(l[1]);
        self.profile.contains([r, l[2]])
    }

    /// Pappus: the angle times the first moment of the profile about the axis.
    fn volume(&self) -> f64 {
        let pts = &self.profile.pts;
        let n = pts.len();
        let mut moment = 0.0;
        for i in 0..n {
            let (a, b) = (pts[i], pts[(i + 1) % n]);
            moment += (a[0] + b[0]) * cross2(a, b) / 6.0;
        }
        self.angle * moment.abs()
    }

    fn bounding_box(&self) -> BoundingBox {
        let r_max = self.profile.pts.iter().map(|p| p[0]).fold(0.0, f64::max);
        let z_min = self.profile.pts.iter().map(|p| p[1]).fold(f64::INFINITY, f64::min);
        let z_max = self.profile.pts.iter().map(|p| p[1]).fold(f64::NEG_INFINITY, f64::max);
        let mut bb = BoundingBox::empty();
        for x in [-r_max, r_max] {
            for y in [-r_max, r_max] {
                for z in [z_min, z_max] {
                    bb.include(self.frame.to_world3([x, y, z]));
                }
            }
        }
        bb
    }
}

impl Shape {
    pub fn contains(&self, p: V3) -> bool {
        match self {
            Shape::Prism(s) => s.contains(p),
            Shape::Loft(s) => s.contains(p),
            Shape::Frustum(s) => s.contains(p),
            Shape::Revolution(s) => s.contains(p),
            Shape::Union(parts) => parts.iter().any(|s| s.contains(p)),
            Shape::Difference(a, b) => a.contains(p) && !b.contains(p),
            Shape::Intersection(a, b) => a.contains(p) && b.contains(p),
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            Shape::Prism(s) => s.bounding_box(),
            Shape::Loft(s) => BoundingBox::from_points(
                s.bottom.world_points().iter().chain(s.top.world_points().iter()),
            ),
            Shape::Frustum(s) => s.bounding_box(),
            Shape::Revolution(s) => s.bounding_box(),
            Shape::Union(parts) => parts
                .iter()
                .fold(BoundingBox::empty(), |bb, s| bb.union(&s.bounding_box())),
            Shape::Difference(a, _) => a.bounding_box(),
            Shape::Intersection(a, b) => a.bounding_box().intersection(&b.bounding_box()),
        }
    }

    /// Leaves in depth-first order.
    pub fn leaves(&self) -> Vec<&Shape> {
        match self {
            Shape::Union(parts) => parts.iter().flat_map(|s| s.leaves()).collect(),
            Shape::Difference(a, b) | Shape::Intersection(a, b) => {
                let mut out = a.leaves();
                out.extend(b.leaves());
                out
            }
            leaf => vec![leaf],
        }
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(
            self,
            Shape::Union(_) | Shape::Difference(..) | Shape::Intersection(..)
        )
    }

    /// Closed-form volume when one exists.
    fn exact_volume(&self) -> Option<f64> {
        match self {
            Shape::Prism(s) if s.trims.is_empty() => Some(s.region.area() * s.height),
            Shape::Loft(s) if s.trims.is_empty() && s.is_parallel() => Some(s.prismatoid_volume()),
            Shape::Frustum(s) => Some(s.volume()),
            Shape::Revolution(s) => Some(s.volume()),
            _ => None,
        }
    }

    pub fn volume(&self, samples: u32) -> f64 {
        if let Some(v) = self.exact_volume() {
            return v;
        }
        let bb = self.bounding_box();
        if bb.is_empty() {
            return 0.0;
        }
        let n = samples.max(1) as usize;
        let size = bb.size();
        let step = [size[0] / n as f64, size[1] / n as f64, size[2] / n as f64];
        let mut count = 0usize;
        for i in 0..n {
            let x = bb.min[0] + (i as f64 + 0.5) * step[0];
            for j in 0..n {
                let y = bb.min[1] + (j as f64 + 0.5) * step[1];
                for k in 0..n {
                    let z = bb.min[2] + (k as f64 + 0.5) * step[2];
                    if self.contains([x, y, z]) {
                        count += 1;
                    }
                }
            }
        }
        count as f64 * step[0] * step[1] * step[2]
    }

    pub fn transformed(&self, motion: &RigidMotion) -> Shape {
        match self {
            Shape::Prism(s) => Shape::Prism(Prism {
                frame: s.frame.moved(motion),
                ..s.clone()
            }),
            Shape::Loft(s) => Shape::Loft(Loft {
                bottom: Section {
                    frame: s.bottom.frame.moved(motion),
                    profile: s.bottom.profile.clone(),
                },
                top: Section {
                    frame: s.top.frame.moved(motion),
                    profile: s.top.profile.clone(),
                },
                trims: s.trims,
            }),
            Shape::Frustum(s) => Shape::Frustum(Frustum {
                base: motion.apply_point(s.base),
                axis: motion.apply_vector(s.axis),
                ..s.clone()
            }),
            Shape::Revolution(s) => Shape::Revolution(Revolution {
                frame: s.frame.moved(motion),
                ..s.clone()
            }),
            Shape::Union(parts) => Shape::Union(parts.iter().map(|s| s.transformed(motion)).collect()),
            Shape::Difference(a, b) => Shape::Difference(
                Box::new(a.transformed(motion)),
                Box::new(b.transformed(motion)),
            ),
            Shape::Intersection(a, b) => Shape::Intersection(
                Box::new(a.transformed(motion)),
                Box::new(b.transformed(motion)),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Shape {
        Shape::Prism(Prism {
            frame: Frame::xy(),
            region: Region::new(vec![Loop::polygon(vec![
                [0.0, 0.0],
                [2.0, 0.0],
                [2.0, 3.0],
                [0.0, 3.0],
            ])]),
            height: 4.0,
            trims: CapTrims::default(),
        })
    }

    #[test]
    fn test_prism_volume_and_membership() {
        let s = unit_box();
        assert!((s.volume(16) - 24.0).abs() < 1e-12);
        assert!(s.contains([1.0, 1.0, 1.0]));
        assert!(!s.contains([1.0, 1.0, 4.5]));
        assert!(!s.contains([2.5, 1.0, 1.0]));
    }

    #[test]
    fn test_difference_volume_by_sampling() {
        let hole = Shape::Frustum(Frustum {
            base: [1.0, 1.5, -1.0],
            axis: [0.0, 0.0, 1.0],
            base_radius: 0.5,
            top_radius: 0.5,
            height: 6.0,
        });
        let s = Shape::Difference(Box::new(unit_box()), Box::new(hole));
        let expected = 24.0 - PI * 0.25 * 4.0;
        assert!((s.volume(96) - expected).abs() < 0.1);
        assert!(!s.contains([1.0, 1.5, 2.0]));
        assert!(s.bounding_box().approx_eq(&unit_box().bounding_box(), 1e-12));
    }

    #[test]
    fn test_parallel_loft_is_pyramid_frustum() {
        let square = |s: f64| Loop::polygon(vec![[-s, -s], [s, -s], [s, s], [-s, s]]);
        let loft = Loft {
            bottom: Section {
                frame: Frame::xy(),
                profile: square(2.0),
            },
            top: Section {
                frame: Frame::xy().offset(3.0),
                profile: square(1.0),
            },
            trims: CapTrims::default(),
        };
        // (h/3)(A0 + A1 + sqrt(A0 A1)) = 1 * (16 + 4 + 8)
        let shape = Shape::Loft(loft);
        assert!((shape.volume(8) - 28.0).abs() < 1e-9);
        assert!(shape.contains([1.4, 1.4, 1.5]));
        assert!(!shape.contains([1.6, 1.6, 1.5]));
    }

    #[test]
    fn test_transformed_moves_membership() {
        let m = RigidMotion::translation([10.0, 0.0, 0.0]);
        let s = unit_box().transformed(&m);
        assert!(s.contains([11.0, 1.0, 1.0]));
        assert!(!s.contains([1.0, 1.0, 1.0]));
    }

    #[test]
    fn test_round_trim_keeps_inside_the_arc() {
        let t = CapTrim::Round(1.0);
        assert!(t.keeps(1.0, 0.0));
        assert!(!t.keeps(0.05, 0.05));
        assert!(t.keeps(0.5, 0.2));
        assert_eq!(t.size(), 1.0);
    }
}
