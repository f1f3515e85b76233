//! Planar profiles for the mock kernel.
//!
//! A profile is a set of closed polygonal loops. Consecutive segments that
//! share a group id form one topological edge, so a sampled arc is still a
//! single edge. Regions use even-odd containment.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::math::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SegKind {
    Line,
    Arc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Seg {
    pub group: u32,
    pub kind: SegKind,
}

/// Closed loop. Segment `i` runs from `pts[i]` to `pts[i + 1]`, wrapping.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Loop {
    pub pts: Vec<V2>,
    pub segs: Vec<Seg>,
}

/// Consecutive segments forming one edge, starting at vertex `first`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EdgeSpan {
    pub first: usize,
    pub count: usize,
    pub kind: SegKind,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum CornerOp {
    Round(f64),
    Chamfer(f64),
}

impl Loop {
    /// Polygon whose every side is its own straight edge.
    pub fn polygon(pts: Vec<V2>) -> Loop {
        let segs = (0..pts.len() as u32)
            .map(|group| Seg {
                group,
                kind: SegKind::Line,
            })
            .collect();
        Loop { pts, segs }
    }

    /// Closed loop forming a single curved edge.
    pub fn curve(pts: Vec<V2>) -> Loop {
        let segs = vec![
            Seg {
                group: 0,
                kind: SegKind::Arc,
            };
            pts.len()
        ];
        Loop { pts, segs }
    }

    pub fn circle(center: V2, radius: f64, count: usize) -> Loop {
        let pts = (0..count)
            .map(|i| {
                let a = 2.0 * PI * i as f64 / count as f64;
                [center[0] + radius * a.cos(), center[1] + radius * a.sin()]
            })
            .collect();
        Loop::curve(pts)
    }

    pub fn len(&self) -> usize {
        self.pts.len()
    }

    pub fn point(&self, i: usize) -> V2 {
        self.pts[i % self.pts.len()]
    }

    pub fn signed_area(&self) -> f64 {
        signed_area2(&self.pts)
    }

    pub fn reversed(&self) -> Loop {
        let n = self.len();
        let pts = (0..n).map(|k| self.pts[(n - k) % n]).collect();
        let segs = (0..n).map(|k| self.segs[(2 * n - 1 - k) % n]).collect();
        Loop { pts, segs }
    }

    pub fn contains(&self, p: V2) -> bool {
        point_in_polygon(p, &self.pts)
    }

    pub fn boundary_distance(&self, p: V2) -> f64 {
        (0..self.len())
            .map(|i| segment_distance2(p, self.pts[i], self.point(i + 1)))
            .fold(f64::INFINITY, f64::min)
    }

    pub fn seg_len(&self, i: usize) -> f64 {
        dist2(self.point(i), self.point(i + 1))
    }

    /// Vertex indices where the edge group changes.
    pub fn corners(&self) -> Vec<usize> {
        let n = self.len();
        (0..n)
            .filter(|&i| self.segs[(i + n - 1) % n].group != self.segs[i].group)
            .collect()
    }

    /// Edges in loop order. A loop with one group is a single closed edge.
    pub fn edges(&self) -> Vec<EdgeSpan> {
        let n = self.len();
        let corners = self.corners();
        if corners.is_empty() {
            return vec![EdgeSpan {
                first: 0,
                count: n,
                kind: self.segs.first().map_or(SegKind::Line, |s| s.kind),
            }];
        }
        corners
            .iter()
            .enumerate()
            .map(|(k, &c)| {
                let next = corners[(k + 1) % corners.len()];
                let count = match (next + n - c) % n {
                    0 => n,
                    count => count,
                };
                EdgeSpan {
                    first: c,
                    count,
                    kind: self.segs[c].kind,
                }
            })
            .collect()
    }

    /// Points along an edge, both end vertices included.
    pub fn span_points(&self, span: &EdgeSpan) -> Vec<V2> {
        (0..=span.count).map(|k| self.point(span.first + k)).collect()
    }

    pub fn span_length(&self, span: &EdgeSpan) -> f64 {
        (0..span.count).map(|k| self.seg_len(span.first + k)).sum()
    }

    fn next_group(&self) -> u32 {
        self.segs.iter().map(|s| s.group + 1).max().unwrap_or(0)
    }

    /// Drop zero-length segments and merge consecutive collinear straight segments.
    pub fn simplified(&self, eps: f64) -> Loop {
        let n = self.len();
        let mut pts = Vec::with_capacity(n);
        let mut segs = Vec::with_capacity(n);
        for i in 0..n {
            if self.seg_len(i) > eps {
                pts.push(self.pts[i]);
                segs.push(self.segs[i]);
            }
        }
        loop {
            let n = pts.len();
            if n < 4 {
                break;
            }
            let removable = (0..n).find(|&i| {
                let prev = (i + n - 1) % n;
                if segs[prev].kind != SegKind::Line || segs[i].kind != SegKind::Line {
                    return false;
                }
                let d1 = sub2(pts[i], pts[prev]);
                let d2 = sub2(pts[(i + 1) % n], pts[i]);
                cross2(d1, d2).abs() <= 1e-9 * norm2(d1) * norm2(d2) && dot2(d1, d2) > 0.0
            });
            match removable {
                Some(i) => {
                    pts.remove(i);
                    segs.remove(i);
                }
                None => break,
            }
        }
        Loop { pts, segs }
    }

    /// Interior angle at a vertex between its two adjacent segments.
    fn corner_angle(&self, corner: usize) -> f64 {
        let n = self.len();
        let v = self.pts[corner];
        let u1 = sub2(self.pts[(corner + n - 1) % n], v);
        let u2 = sub2(self.point(corner + 1), v);
        let c = dot2(u1, u2) / (norm2(u1) * norm2(u2)).max(1e-300);
        c.clamp(-1.0, 1.0).acos()
    }

    /// Segments needed to round a corner with `per_quarter` segments per quarter turn.
    pub fn arc_steps(&self, corner: usize, per_quarter: u32) -> usize {
        let turn = PI - self.corner_angle(corner);
        ((turn / FRAC_PI_2) * per_quarter as f64).ceil().max(1.0) as usize
    }

    /// Round or bevel the given corners. Each entry is `(vertex, arc_steps)`.
    ///
    /// The setback along each adjacent edge may not exceed half of that
    /// edge's length; only corners between two straight edges qualify.
    pub fn modify_corners(&self, corners: &[(usize, usize)], op: CornerOp) -> Result<Loop, String> {
        let n = self.len();
        let mut replacement: Vec<Option<(Vec<V2>, u32)>> = vec![None; n];
        let mut group = self.next_group();
        for &(c, steps) in corners {
            if c >= n {
                return Err(format!("corner {c} out of range"));
            }
            let prev = (c + n - 1) % n;
            if self.segs[prev].kind != SegKind::Line || self.segs[c].kind != SegKind::Line {
                return Err("only corners between two straight edges can be modified".to_string());
            }
            let v = self.pts[c];
            let l1 = self.seg_len(prev);
            let l2 = self.seg_len(c);
            let theta = self.corner_angle(c);
            if theta < 1e-6 || PI - theta < 1e-9 {
                return Err("corner is degenerate".to_string());
            }
            let setback = match op {
                CornerOp::Round(r) => r / (theta / 2.0).tan(),
                CornerOp::Chamfer(d) => d,
            };
            let limit = 0.5 * l1.min(l2);
            if setback > limit * (1.0 + 1e-9) + 1e-12 {
                return Err(format!(
                    "setback {setback:.4} exceeds half of the adjacent edge length {:.4}",
                    2.0 * limit
                ));
            }
            let u1 = [(self.pts[prev][0] - v[0]) / l1, (self.pts[prev][1] - v[1]) / l1];
            let u2 = [(self.point(c + 1)[0] - v[0]) / l2, (self.point(c + 1)[1] - v[1]) / l2];
            let a = [v[0] + u1[0] * setback, v[1] + u1[1] * setback];
            let b = [v[0] + u2[0] * setback, v[1] + u2[1] * setback];
            let pts = match op {
                CornerOp::Chamfer(_) => vec![a, b],
                CornerOp::Round(r) => {
                    let bis = [u1[0] + u2[0], u1[1] + u2[1]];
                    let bl = norm2(bis);
                    let off = r / (theta / 2.0).sin();
                    let center = [v[0] + bis[0] / bl * off, v[1] + bis[1] / bl * off];
                    let alpha = (a[1] - center[1]).atan2(a[0] - center[0]);
                    let beta = (b[1] - center[1]).atan2(b[0] - center[0]);
                    let mut delta = beta - alpha;
                    while delta > PI {
                        delta -= 2.0 * PI;
                    }
                    while delta <= -PI {
                        delta += 2.0 * PI;
                    }
                    let steps = steps.max(1);
                    let mut pts = vec![a];
                    for k in 1..steps {
                        let ang = alpha + delta * k as f64 / steps as f64;
                        pts.push([center[0] + r * ang.cos(), center[1] + r * ang.sin()]);
                    }
                    pts.push(b);
                    pts
                }
            };
            replacement[c] = Some((pts, group));
            group += 1;
        }

        let kind = match op {
            CornerOp::Round(_) => SegKind::Arc,
            CornerOp::Chamfer(_) => SegKind::Line,
        };
        let mut pts = Vec::new();
        let mut segs = Vec::new();
        for i in 0..n {
            match &replacement[i] {
                Some((corner_pts, g)) => {
                    let last = corner_pts.len() - 1;
                    for (k, p) in corner_pts.iter().enumerate() {
                        pts.push(*p);
                        if k < last {
                            segs.push(Seg { group: *g, kind });
                        } else {
                            segs.push(self.segs[i]);
                        }
                    }
                }
                None => {
                    pts.push(self.pts[i]);
                    segs.push(self.segs[i]);
                }
            }
        }
        Ok(Loop { pts, segs })
    }
}

/// Even-odd region bounded by loops. Outer loops run counter-clockwise,
/// holes clockwise.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Region {
    pub loops: Vec<Loop>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SourceKey {
    operand: u8,
    lp: usize,
    group: u32,
    kind: SegKind,
}

#[derive(Debug, Clone, Copy)]
struct Piece {
    a: V2,
    b: V2,
    key: SourceKey,
}

impl Region {
    pub fn new(loops: Vec<Loop>) -> Region {
        let mut region = Region { loops };
        region.orient();
        region
    }

    pub fn contains(&self, p: V2) -> bool {
        self.loops.iter().filter(|l| l.contains(p)).count() % 2 == 1
    }

    pub fn boundary_distance(&self, p: V2) -> f64 {
        self.loops
            .iter()
            .map(|l| l.boundary_distance(p))
            .fold(f64::INFINITY, f64::min)
    }

    pub fn area(&self) -> f64 {
        self.loops.iter().map(Loop::signed_area).sum()
    }

    /// A single loop without holes.
    pub fn is_simple(&self) -> bool {
        self.loops.len() == 1
    }

    fn depth(&self, i: usize) -> usize {
        let probe = self.loops[i].pts[0];
        self.loops
            .iter()
            .enumerate()
            .filter(|(j, l)| *j != i && l.contains(probe))
            .count()
    }

    fn orient(&mut self) {
        for i in 0..self.loops.len() {
            let outer = self.depth(i) % 2 == 0;
            if (self.loops[i].signed_area() > 0.0) != outer {
                self.loops[i] = self.loops[i].reversed();
            }
        }
    }

    /// Outer loops with the holes directly inside them.
    pub fn faces(&self) -> Vec<(usize, Vec<usize>)> {
        let depths: Vec<usize> = (0..self.loops.len()).map(|i| self.depth(i)).collect();
        (0..self.loops.len())
            .filter(|&i| depths[i] % 2 == 0)
            .map(|i| {
                let holes = (0..self.loops.len())
                    .filter(|&j| {
                        depths[j] == depths[i] + 1 && self.loops[i].contains(self.loops[j].pts[0])
                    })
                    .collect();
                (i, holes)
            })
            .collect()
    }

    pub fn bounds(&self) -> (V2, V2) {
        let mut min = [f64::INFINITY; 2];
        let mut max = [f64::NEG_INFINITY; 2];
        for p in self.loops.iter().flat_map(|l| l.pts.iter()) {
            for k in 0..2 {
                min[k] = min[k].min(p[k]);
                max[k] = max[k].max(p[k]);
            }
        }
        (min, max)
    }

    /// Area-weighted centroid and area of a face given by loop indices.
    pub fn face_centroid(&self, loops: &[usize]) -> (V2, f64) {
        let mut area = 0.0;
        let mut cx = 0.0;
        let mut cy = 0.0;
        for &i in loops {
            let pts = &self.loops[i].pts;
            let n = pts.len();
            for k in 0..n {
                let p = pts[k];
                let q = pts[(k + 1) % n];
                let c = cross2(p, q);
                area += c / 2.0;
                cx += (p[0] + q[0]) * c / 6.0;
                cy += (p[1] + q[1]) * c / 6.0;
            }
        }
        if area.abs() < 1e-300 {
            return ([0.0, 0.0], 0.0);
        }
        ([cx / area, cy / area], area)
    }

    pub fn map(&self, f: impl Fn(V2) -> V2) -> Region {
        let loops = self
            .loops
            .iter()
            .map(|l| Loop {
                pts: l.pts.iter().map(|p| f(*p)).collect(),
                segs: l.segs.clone(),
            })
            .collect();
        Region::new(loops)
    }

    fn pieces(&self, operand: u8) -> Vec<Piece> {
        let mut out = Vec::new();
        for (lp, l) in self.loops.iter().enumerate() {
            for i in 0..l.len() {
                out.push(Piece {
                    a: l.pts[i],
                    b: l.point(i + 1),
                    key: SourceKey {
                        operand,
                        lp,
                        group: l.segs[i].group,
                        kind: l.segs[i].kind,
                    },
                });
            }
        }
        out
    }

    /// Exact polygonal union. Edge groups of both operands carry over to the
    /// result; an edge cut into separate pieces becomes separate edges.
    pub fn union(&self, other: &Region, eps: f64) -> Region {
        let pa = split_pieces(&self.pieces(0), &other.pieces(1), eps);
        let pb = split_pieces(&other.pieces(1), &self.pieces(0), eps);
        let delta = (eps * 10.0).max(1e-6);
        let inside = |p: V2| self.contains(p) || other.contains(p);

        let mut kept = Vec::new();
        for (from_b, piece) in pa.iter().map(|p| (false, p)).chain(pb.iter().map(|p| (true, p))) {
            let d = sub2(piece.b, piece.a);
            let len = norm2(d);
            if len <= eps {
                continue;
            }
            let mid = lerp2(piece.a, piece.b, 0.5);
            if from_b && self.boundary_distance(mid) <= eps * 10.0 {
                continue;
            }
            let left_n = [-d[1] / len, d[0] / len];
            let left = inside([mid[0] + left_n[0] * delta, mid[1] + left_n[1] * delta]);
            let right = inside([mid[0] - left_n[0] * delta, mid[1] - left_n[1] * delta]);
            if left == right {
                continue;
            }
            if left {
                kept.push(*piece);
            } else {
                kept.push(Piece {
                    a: piece.b,
                    b: piece.a,
                    key: piece.key,
                });
            }
        }

        let loops = chain_pieces(&kept, eps * 10.0)
            .into_iter()
            .map(|l| l.simplified(eps))
            .filter(|l| l.len() >= 3)
            .collect();
        Region::new(loops)
    }
}

fn split_pieces(pieces: &[Piece], cutters: &[Piece], eps: f64) -> Vec<Piece> {
    let mut out = Vec::new();
    for piece in pieces {
        let r = sub2(piece.b, piece.a);
        let len = norm2(r);
        if len <= eps {
            continue;
        }
        let et = eps / len;
        let mut params = Vec::new();
        for c in cutters {
            let s = sub2(c.b, c.a);
            let slen = norm2(s);
            if slen <= eps {
                continue;
            }
            let qp = sub2(c.a, piece.a);
            let denom = cross2(r, s);
            if denom.abs() > 1e-12 * len * slen {
                let t = cross2(qp, s) / denom;
                let w = cross2(qp, r) / denom;
                let ew = eps / slen;
                if w >= -ew && w <= 1.0 + ew && t > et && t < 1.0 - et {
                    params.push(t);
                }
            } else if cross2(qp, r).abs() / len < eps {
                for q in [c.a, c.b] {
                    let t = dot2(sub2(q, piece.a), r) / (len * len);
                    if t > et && t < 1.0 - et {
                        params.push(t);
                    }
                }
            }
        }
        params.sort_by(f64::total_cmp);
        params.dedup_by(|a, b| (*a - *b).abs() <= et);
        let mut start = piece.a;
        for t in params {
            let p = lerp2(piece.a, piece.b, t);
            out.push(Piece {
                a: start,
                b: p,
                key: piece.key,
            });
            start = p;
        }
        out.push(Piece {
            a: start,
            b: piece.b,
            key: piece.key,
        });
    }
    out
}

fn chain_pieces(kept: &[Piece], join: f64) -> Vec<Loop> {
    let n = kept.len();
    let mut used = vec![false; n];
    let mut loops = Vec::new();
    for start in 0..n {
        if used[start] {
            continue;
        }
        used[start] = true;
        let mut chain = vec![start];
        let origin = kept[start].a;
        let mut end = kept[start].b;
        let mut closed = false;
        for _ in 0..n {
            if dist2(end, origin) <= join {
                closed = true;
                break;
            }
            let Some(next) = (0..n).find(|&j| !used[j] && dist2(kept[j].a, end) <= join) else {
                break;
            };
            used[next] = true;
            chain.push(next);
            end = kept[next].b;
        }
        if !closed || chain.len() < 3 {
            continue;
        }

        let keys: Vec<SourceKey> = chain.iter().map(|&j| kept[j].key).collect();
        let m = keys.len();
        let mut groups = vec![0u32; m];
        for i in 1..m {
            groups[i] = if keys[i] == keys[i - 1] {
                groups[i - 1]
            } else {
                groups[i - 1] + 1
            };
        }
        if groups[m - 1] != 0 && keys[m - 1] == keys[0] {
            let last = groups[m - 1];
            for g in groups.iter_mut().filter(|g| **g == last) {
                *g = 0;
            }
        }
        loops.push(Loop {
            pts: chain.iter().map(|&j| kept[j].a).collect(),
            segs: keys
                .iter()
                .zip(groups)
                .map(|(k, group)| Seg { group, kind: k.kind })
                .collect(),
        });
    }
    loops
}
