//! Predicate-combinator selectors over faces and edges.
//!
//! A selector is a small expression tree evaluated against an explicit
//! enumeration of a solid's entities. Results keep the kernel's
//! enumeration order, so the same solid always yields the same list.

use std::fmt;
use std::marker::PhantomData;

use kernel_bridge::{KernelId, KernelIntrospect, KernelSolidHandle, TopoKind, TopoSignature};

use crate::geom;
use crate::types::OpError;

/// One enumerated entity with the attributes predicates look at.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityInfo {
    pub id: KernelId,
    pub centroid: [f64; 3],
    /// Unit direction for straight edges, unit normal for planar faces.
    pub axis: Option<[f64; 3]>,
    /// Length for edges, area for faces.
    pub size: Option<f64>,
    pub bbox: Option<[f64; 6]>,
    /// Curve type for edges, surface type for faces.
    pub geom_type: Option<String>,
}

pub type EdgeInfo = EntityInfo;
pub type FaceInfo = EntityInfo;

impl EntityInfo {
    fn from_signature(id: KernelId, sig: TopoSignature, kind: TopoKind) -> Option<Self> {
        let axis = match kind {
            TopoKind::Edge => sig.direction,
            _ => sig.normal,
        };
        let size = match kind {
            TopoKind::Edge => sig.length,
            _ => sig.area,
        };
        Some(Self {
            id,
            centroid: sig.centroid?,
            axis,
            size,
            bbox: sig.bbox,
            geom_type: sig.surface_type,
        })
    }
}

/// Marker for the entity kind a selector ranges over.
pub trait EntityKind {
    const KIND: TopoKind;
    const NAME: &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edges;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Faces;

impl EntityKind for Edges {
    const KIND: TopoKind = TopoKind::Edge;
    const NAME: &'static str = "edges";
}

impl EntityKind for Faces {
    const KIND: TopoKind = TopoKind::Face;
    const NAME: &'static str = "faces";
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    All,
    ParallelTo([f64; 3]),
    PerpendicularTo([f64; 3]),
    NormalAlong([f64; 3]),
    Extreme { dir: [f64; 3], max: bool },
    OfType(String),
    Near { point: [f64; 3], distance: f64 },
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    Not(Box<Node>),
    Within(Box<Node>, Box<Node>),
}

/// Selector over entities of kind `K`.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector<K> {
    node: Node,
    kind: PhantomData<K>,
}

pub type EdgeSelector = Selector<Edges>;
pub type FaceSelector = Selector<Faces>;

fn unit(v: [f64; 3]) -> [f64; 3] {
    geom::normalize(v).unwrap_or([0.0, 0.0, 1.0])
}

impl<K: EntityKind> Selector<K> {
    fn wrap(node: Node) -> Self {
        Self {
            node,
            kind: PhantomData,
        }
    }

    /// Every entity.
    pub fn all() -> Self {
        Self::wrap(Node::All)
    }

    /// Edge direction (or face normal) parallel to `axis`, either sense.
    pub fn parallel_to(axis: [f64; 3]) -> Self {
        Self::wrap(Node::ParallelTo(unit(axis)))
    }

    /// Edge direction (or face normal) perpendicular to `axis`.
    pub fn perpendicular_to(axis: [f64; 3]) -> Self {
        Self::wrap(Node::PerpendicularTo(unit(axis)))
    }

    /// Edge direction (or face normal) pointing along `dir`, same sense.
    pub fn normal_along(dir: [f64; 3]) -> Self {
        Self::wrap(Node::NormalAlong(unit(dir)))
    }

    /// Entities whose centroid is extreme along `dir`: the farthest when
    /// `max`, the nearest otherwise. Ties within tolerance are all kept.
    pub fn extreme(dir: [f64; 3], max: bool) -> Self {
        Self::wrap(Node::Extreme { dir: unit(dir), max })
    }

    pub fn of_type(geom_type: &str) -> Self {
        Self::wrap(Node::OfType(geom_type.to_string()))
    }

    /// Centroid within `distance` of `point`.
    pub fn near(point: [f64; 3], distance: f64) -> Self {
        Self::wrap(Node::Near { point, distance })
    }

    pub fn and(self, other: Self) -> Self {
        Self::wrap(Node::And(Box::new(self.node), Box::new(other.node)))
    }

    pub fn or(self, other: Self) -> Self {
        Self::wrap(Node::Or(Box::new(self.node), Box::new(other.node)))
    }

    /// Chained selection: `refine` is evaluated only over the entities this
    /// selector keeps, so extremes are taken among those survivors.
    pub fn within(self, refine: Self) -> Self {
        Self::wrap(Node::Within(Box::new(self.node), Box::new(refine.node)))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::wrap(Node::Not(Box::new(self.node)))
    }

    /// Enumerate the entities of `solid` this selector ranges over.
    pub fn enumerate(introspect: &dyn KernelIntrospect, solid: &KernelSolidHandle) -> Vec<EntityInfo> {
        introspect
            .compute_all_signatures(solid, K::KIND)
            .into_iter()
            .filter_map(|(id, sig)| EntityInfo::from_signature(id, sig, K::KIND))
            .collect()
    }

    /// Ids of the matching entities in enumeration order.
    pub fn select(
        &self,
        introspect: &dyn KernelIntrospect,
        solid: &KernelSolidHandle,
        tolerance: f64,
    ) -> Vec<KernelId> {
        let infos = Self::enumerate(introspect, solid);
        let keep = eval(&self.node, &infos, tolerance);
        infos
            .iter()
            .zip(keep)
            .filter(|(_, k)| *k)
            .map(|(info, _)| info.id)
            .collect()
    }

    /// Like [`Selector::select`], failing on an empty result.
    pub fn select_required(
        &self,
        introspect: &dyn KernelIntrospect,
        solid: &KernelSolidHandle,
        tolerance: f64,
    ) -> Result<Vec<KernelId>, OpError> {
        let ids = self.select(introspect, solid, tolerance);
        if ids.is_empty() {
            return Err(OpError::EmptySelection {
                selector: self.to_string(),
            });
        }
        Ok(ids)
    }
}

/// Per-entity verdicts. Extremes depend on the whole candidate set, so the
/// tree is evaluated over all entities at once.
fn eval(node: &Node, infos: &[EntityInfo], tol: f64) -> Vec<bool> {
    let each = |f: &dyn Fn(&EntityInfo) -> bool| infos.iter().map(f).collect::<Vec<_>>();
    match node {
        Node::All => vec![true; infos.len()],
        Node::ParallelTo(axis) => each(&|i| {
            i.axis
                .is_some_and(|a| geom::dot(a, *axis).abs() >= 1.0 - tol)
        }),
        Node::PerpendicularTo(axis) => each(&|i| i.axis.is_some_and(|a| geom::dot(a, *axis).abs() <= tol)),
        Node::NormalAlong(dir) => each(&|i| i.axis.is_some_and(|a| geom::dot(a, *dir) >= 1.0 - tol)),
        Node::Extreme { dir, max } => {
            let key = |i: &EntityInfo| {
                let d = geom::dot(i.centroid, *dir);
                if *max {
                    d
                } else {
                    -d
                }
            };
            let best = infos.iter().map(key).fold(f64::NEG_INFINITY, f64::max);
            each(&|i| key(i) >= best - tol)
        }
        Node::OfType(t) => each(&|i| i.geom_type.as_deref() == Some(t.as_str())),
        Node::Near { point, distance } => {
            each(&|i| geom::norm(geom::sub(i.centroid, *point)) <= distance + tol)
        }
        Node::And(a, b) => zip(eval(a, infos, tol), eval(b, infos, tol), |x, y| x && y),
        Node::Or(a, b) => zip(eval(a, infos, tol), eval(b, infos, tol), |x, y| x || y),
        Node::Not(a) => eval(a, infos, tol).into_iter().map(|x| !x).collect(),
        Node::Within(outer, refine) => {
            let keep = eval(outer, infos, tol);
            let subset: Vec<EntityInfo> = infos
                .iter()
                .zip(&keep)
                .filter(|(_, k)| **k)
                .map(|(i, _)| i.clone())
                .collect();
            let mut verdicts = eval(refine, &subset, tol).into_iter();
            keep.into_iter()
                .map(|k| k && verdicts.next().unwrap_or(false))
                .collect()
        }
    }
}

fn zip(a: Vec<bool>, b: Vec<bool>, f: impl Fn(bool, bool) -> bool) -> Vec<bool> {
    a.into_iter().zip(b).map(|(x, y)| f(x, y)).collect()
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::All => write!(f, "*"),
            Node::ParallelTo(a) => write!(f, "|{a:?}"),
            Node::PerpendicularTo(a) => write!(f, "#{a:?}"),
            Node::NormalAlong(a) => write!(f, "+{a:?}"),
            Node::Extreme { dir, max: true } => write!(f, ">{dir:?}"),
            Node::Extreme { dir, max: false } => write!(f, "<{dir:?}"),
            Node::OfType(t) => write!(f, "%{t}"),
            Node::Near { point, distance } => write!(f, "near({point:?}, {distance})"),
            Node::And(a, b) => write!(f, "({a} and {b})"),
            Node::Or(a, b) => write!(f, "({a} or {b})"),
            Node::Not(a) => write!(f, "not {a}"),
            Node::Within(a, b) => write!(f, "{a} then {b}"),
        }
    }
}

impl<K: EntityKind> fmt::Display for Selector<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", K::NAME, self.node)
    }
}
