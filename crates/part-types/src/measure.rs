//! Measure Tree: the nested dimension record describing one part variant.
//!
//! A tree is built once (from a preset file or the builder API) and is
//! read-only afterwards. All typed lookups go through [`MeasureView`], which
//! remembers the dotted path it was reached by, so every error names the full
//! path of the offending measure.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

/// Dotted path of a measure inside a tree, e.g. `block.upper_width`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeasurePath(Vec<String>);

impl MeasurePath {
    /// The empty path, naming the tree root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a dotted path. Empty segments are ignored.
    pub fn parse(path: &str) -> Self {
        Self(
            path.split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Append a (possibly dotted) key.
    pub fn join(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.extend(key.split('.').filter(|s| !s.is_empty()).map(str::to_string));
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for MeasurePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<root>")
        } else {
            f.write_str(&self.0.join("."))
        }
    }
}

impl From<&str> for MeasurePath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

/// Errors from measure lookups and the derived-measure pass.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeasureError {
    #[error("missing measure `{path}`")]
    Missing { path: MeasurePath },

    #[error("measure `{path}` has the wrong type: expected {expected}, found {found}")]
    WrongType {
        path: MeasurePath,
        expected: &'static str,
        found: &'static str,
    },

    #[error("measure `{path}` out of range: {reason}")]
    OutOfRange { path: MeasurePath, reason: String },

    #[error("inconsistent measures at `{path}`: {reason}")]
    Inconsistent { path: MeasurePath, reason: String },

    #[error("duplicate measure key `{path}`")]
    Duplicate { path: MeasurePath },
}

impl MeasureError {
    /// The measure path this error is about.
    pub fn path(&self) -> &MeasurePath {
        match self {
            MeasureError::Missing { path }
            | MeasureError::WrongType { path, .. }
            | MeasureError::OutOfRange { path, .. }
            | MeasureError::Inconsistent { path, .. }
            | MeasureError::Duplicate { path } => path,
        }
    }
}

/// A single entry of a [`MeasureNode`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MeasureValue {
    /// Length, angle (degrees) or count.
    Number(f64),
    Flag(bool),
    /// Enumerations are stored as their text label.
    Text(String),
    Node(MeasureNode),
    /// Explicitly switched-off optional group (`null` in preset files).
    Absent,
}

impl MeasureValue {
    /// Human-readable type name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            MeasureValue::Number(_) => "number",
            MeasureValue::Flag(_) => "flag",
            MeasureValue::Text(_) => "text",
            MeasureValue::Node(_) => "group",
            MeasureValue::Absent => "absent",
        }
    }
}

impl From<f64> for MeasureValue {
    fn from(v: f64) -> Self {
        MeasureValue::Number(v)
    }
}

impl From<i32> for MeasureValue {
    fn from(v: i32) -> Self {
        MeasureValue::Number(f64::from(v))
    }
}

impl From<bool> for MeasureValue {
    fn from(v: bool) -> Self {
        MeasureValue::Flag(v)
    }
}

impl From<&str> for MeasureValue {
    fn from(v: &str) -> Self {
        MeasureValue::Text(v.to_string())
    }
}

impl From<String> for MeasureValue {
    fn from(v: String) -> Self {
        MeasureValue::Text(v)
    }
}

impl From<MeasureNode> for MeasureValue {
    fn from(v: MeasureNode) -> Self {
        MeasureValue::Node(v)
    }
}

impl<T: Into<MeasureValue>> From<Option<T>> for MeasureValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(MeasureValue::Absent)
    }
}

/// A mapping from measure name to value. Keys are unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MeasureNode {
    entries: BTreeMap<String, MeasureValue>,
}

impl MeasureNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. Replaces an existing entry of the same name.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<MeasureValue>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Insert a new entry; a second entry with the same name is rejected.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<MeasureValue>,
    ) -> Result<(), MeasureError> {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return Err(MeasureError::Duplicate {
                path: MeasurePath::parse(&key),
            });
        }
        self.entries.insert(key, value.into());
        Ok(())
    }

    /// Direct child lookup (no path traversal).
    pub fn get(&self, key: &str) -> Option<&MeasureValue> {
        self.entries.get(key)
    }

    /// Dotted-path lookup.
    pub fn lookup(&self, path: &str) -> Option<&MeasureValue> {
        let path = MeasurePath::parse(path);
        let (last, parents) = path.segments().split_last()?;
        let mut node = self;
        for segment in parents {
            match node.entries.get(segment) {
                Some(MeasureValue::Node(child)) => node = child,
                _ => return None,
            }
        }
        node.entries.get(last)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MeasureValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A path-tracking reader over this node as the tree root.
    pub fn view(&self) -> MeasureView<'_> {
        MeasureView {
            node: self,
            path: MeasurePath::root(),
        }
    }
}

impl<'de> Deserialize<'de> for MeasureNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(NodeVisitor)
    }
}

impl<'de> Deserialize<'de> for MeasureValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = MeasureNode;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of measure names to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut node = MeasureNode::new();
        while let Some(key) = map.next_key::<String>()? {
            let value: MeasureValue = map.next_value()?;
            if node.entries.contains_key(&key) {
                return Err(de::Error::custom(format!("duplicate measure key `{key}`")));
            }
            node.entries.insert(key, value);
        }
        Ok(node)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = MeasureValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number, boolean, string, null or nested measure group")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(MeasureValue::Flag(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(MeasureValue::Number(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(MeasureValue::Number(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(MeasureValue::Number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(MeasureValue::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(MeasureValue::Text(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(MeasureValue::Absent)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(MeasureValue::Absent)
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
        NodeVisitor.visit_map(map).map(MeasureValue::Node)
    }
}

/// Read-only view of a (sub)tree that knows its own path.
#[derive(Debug, Clone)]
pub struct MeasureView<'a> {
    node: &'a MeasureNode,
    path: MeasurePath,
}

impl<'a> MeasureView<'a> {
    pub fn path(&self) -> &MeasurePath {
        &self.path
    }

    pub fn node(&self) -> &'a MeasureNode {
        self.node
    }

    /// Full path of `key` below this view.
    pub fn path_of(&self, key: &str) -> MeasurePath {
        self.path.join(key)
    }

    fn value(&self, key: &str) -> Option<&'a MeasureValue> {
        self.node.lookup(key)
    }

    fn required(&self, key: &str) -> Result<&'a MeasureValue, MeasureError> {
        match self.value(key) {
            None | Some(MeasureValue::Absent) => Err(MeasureError::Missing {
                path: self.path_of(key),
            }),
            Some(v) => Ok(v),
        }
    }

    fn wrong_type(&self, key: &str, expected: &'static str, found: &MeasureValue) -> MeasureError {
        MeasureError::WrongType {
            path: self.path_of(key),
            expected,
            found: found.kind(),
        }
    }

    /// Any finite number.
    pub fn number(&self, key: &str) -> Result<f64, MeasureError> {
        match self.required(key)? {
            MeasureValue::Number(v) if v.is_finite() => Ok(*v),
            MeasureValue::Number(v) => Err(MeasureError::OutOfRange {
                path: self.path_of(key),
                reason: format!("{v} is not finite"),
            }),
            other => Err(self.wrong_type(key, "number", other)),
        }
    }

    /// A length, finite and not negative.
    pub fn length(&self, key: &str) -> Result<f64, MeasureError> {
        let v = self.number(key)?;
        if v < 0.0 {
            return Err(MeasureError::OutOfRange {
                path: self.path_of(key),
                reason: format!("length {v} is negative"),
            });
        }
        Ok(v)
    }

    /// A strictly positive length.
    pub fn positive(&self, key: &str) -> Result<f64, MeasureError> {
        let v = self.number(key)?;
        if v <= 0.0 {
            return Err(MeasureError::OutOfRange {
                path: self.path_of(key),
                reason: format!("{v} must be greater than zero"),
            });
        }
        Ok(v)
    }

    /// An angle in degrees.
    pub fn angle(&self, key: &str) -> Result<f64, MeasureError> {
        self.number(key)
    }

    pub fn flag(&self, key: &str) -> Result<bool, MeasureError> {
        match self.required(key)? {
            MeasureValue::Flag(v) => Ok(*v),
            other => Err(self.wrong_type(key, "flag", other)),
        }
    }

    /// Flag with a default when missing or absent.
    pub fn flag_or(&self, key: &str, default: bool) -> Result<bool, MeasureError> {
        match self.value(key) {
            None | Some(MeasureValue::Absent) => Ok(default),
            Some(MeasureValue::Flag(v)) => Ok(*v),
            Some(other) => Err(self.wrong_type(key, "flag", other)),
        }
    }

    pub fn text(&self, key: &str) -> Result<&'a str, MeasureError> {
        match self.required(key)? {
            MeasureValue::Text(v) => Ok(v.as_str()),
            other => Err(self.wrong_type(key, "text", other)),
        }
    }

    /// Required nested group.
    pub fn child(&self, key: &str) -> Result<MeasureView<'a>, MeasureError> {
        match self.required(key)? {
            MeasureValue::Node(node) => Ok(MeasureView {
                node,
                path: self.path_of(key),
            }),
            other => Err(self.wrong_type(key, "group", other)),
        }
    }

    /// Optional nested group: missing or `null` both mean "not present".
    pub fn optional_child(&self, key: &str) -> Result<Option<MeasureView<'a>>, MeasureError> {
        match self.value(key) {
            None | Some(MeasureValue::Absent) => Ok(None),
            Some(MeasureValue::Node(node)) => Ok(Some(MeasureView {
                node,
                path: self.path_of(key),
            })),
            Some(other) => Err(self.wrong_type(key, "group", other)),
        }
    }

    pub fn optional_number(&self, key: &str) -> Result<Option<f64>, MeasureError> {
        match self.value(key) {
            None | Some(MeasureValue::Absent) => Ok(None),
            Some(_) => self.number(key).map(Some),
        }
    }

    pub fn optional_length(&self, key: &str) -> Result<Option<f64>, MeasureError> {
        match self.value(key) {
            None | Some(MeasureValue::Absent) => Ok(None),
            Some(_) => self.length(key).map(Some),
        }
    }

    pub fn optional_text(&self, key: &str) -> Result<Option<&'a str>, MeasureError> {
        match self.value(key) {
            None | Some(MeasureValue::Absent) => Ok(None),
            Some(_) => self.text(key).map(Some),
        }
    }

    /// Build an `Inconsistent` error for `key` below this view.
    pub fn inconsistent(&self, key: &str, reason: impl Into<String>) -> MeasureError {
        MeasureError::Inconsistent {
            path: self.path_of(key),
            reason: reason.into(),
        }
    }

    /// Build an `OutOfRange` error for `key` below this view.
    pub fn out_of_range(&self, key: &str, reason: impl Into<String>) -> MeasureError {
        MeasureError::OutOfRange {
            path: self.path_of(key),
            reason: reason.into(),
        }
    }
}
