//! Small fixed-size vector helpers shared by the kernels.

pub(crate) type V3 = [f64; 3];
pub(crate) type V2 = [f64; 2];

pub(crate) fn add(a: V3, b: V3) -> V3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub(crate) fn sub(a: V3, b: V3) -> V3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub(crate) fn scale(a: V3, s: f64) -> V3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

pub(crate) fn dot(a: V3, b: V3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub(crate) fn cross(a: V3, b: V3) -> V3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub(crate) fn norm(a: V3) -> f64 {
    dot(a, a).sqrt()
}

pub(crate) fn dist(a: V3, b: V3) -> f64 {
    norm(sub(a, b))
}

/// Unit vector, or `None` for (near) zero vectors.
pub(crate) fn normalize(a: V3) -> Option<V3> {
    let n = norm(a);
    if n < 1e-12 {
        None
    } else {
        Some(scale(a, 1.0 / n))
    }
}

pub(crate) fn lerp(a: V3, b: V3, t: f64) -> V3 {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

pub(crate) fn centroid(points: &[V3]) -> V3 {
    if points.is_empty() {
        return [0.0; 3];
    }
    let s = points.iter().fold([0.0; 3], |acc, p| add(acc, *p));
    scale(s, 1.0 / points.len() as f64)
}

/// Newell normal of a closed polygon; its length is twice the enclosed area.
pub(crate) fn newell(points: &[V3]) -> V3 {
    let n = points.len();
    let mut acc = [0.0; 3];
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        acc[0] += (a[1] - b[1]) * (a[2] + b[2]);
        acc[1] += (a[2] - b[2]) * (a[0] + b[0]);
        acc[2] += (a[0] - b[0]) * (a[1] + b[1]);
    }
    acc
}

/// Any unit vector orthogonal to `n`.
pub(crate) fn orthogonal(n: V3) -> V3 {
    let helper = if n[0].abs() < 0.9 {
        [1.0, 0.0, 0.0]
    } else {
        [0.0, 1.0, 0.0]
    };
    normalize(cross(n, helper)).unwrap_or([0.0, 0.0, 1.0])
}

pub(crate) fn sub2(a: V2, b: V2) -> V2 {
    [a[0] - b[0], a[1] - b[1]]
}

pub(crate) fn cross2(a: V2, b: V2) -> f64 {
    a[0] * b[1] - a[1] * b[0]
}

pub(crate) fn dot2(a: V2, b: V2) -> f64 {
    a[0] * b[0] + a[1] * b[1]
}

pub(crate) fn norm2(a: V2) -> f64 {
    dot2(a, a).sqrt()
}

pub(crate) fn dist2(a: V2, b: V2) -> f64 {
    norm2(sub2(a, b))
}

pub(crate) fn lerp2(a: V2, b: V2, t: f64) -> V2 {
    [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t]
}

/// Distance from `p` to the segment `a`–`b`.
pub(crate) fn segment_distance2(p: V2, a: V2, b: V2) -> f64 {
    let ab = sub2(b, a);
    let len2 = dot2(ab, ab);
    if len2 < 1e-24 {
        return dist2(p, a);
    }
    let t = (dot2(sub2(p, a), ab) / len2).clamp(0.0, 1.0);
    dist2(p, lerp2(a, b, t))
}

/// Even-odd point-in-polygon test.
pub(crate) fn point_in_polygon(p: V2, poly: &[V2]) -> bool {
    let n = poly.len();
    let mut inside = false;
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let (a, b) = (poly[i], poly[j]);
        if (a[1] > p[1]) != (b[1] > p[1]) {
            let x = a[0] + (p[1] - a[1]) * (b[0] - a[0]) / (b[1] - a[1]);
            if p[0] < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Signed area of a polygon, positive for counter-clockwise order.
pub(crate) fn signed_area2(poly: &[V2]) -> f64 {
    let n = poly.len();
    let mut s = 0.0;
    for i in 0..n {
        s += cross2(poly[i], poly[(i + 1) % n]);
    }
    s / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newell_area() {
        let square = [[0.0, 0.0, 1.0], [2.0, 0.0, 1.0], [2.0, 2.0, 1.0], [0.0, 2.0, 1.0]];
        let n = newell(&square);
        assert!((n[2] - 8.0).abs() < 1e-12);
        assert!(n[0].abs() < 1e-12 && n[1].abs() < 1e-12);
    }

    #[test]
    fn test_point_in_polygon() {
        let tri = [[0.0, 0.0], [4.0, 0.0], [0.0, 4.0]];
        assert!(point_in_polygon([1.0, 1.0], &tri));
        assert!(!point_in_polygon([3.0, 3.0], &tri));
        assert!((signed_area2(&tri) - 8.0).abs() < 1e-12);
    }
}
