//! Plain-text part reports.
//!
//! Reports are text, not JSON, because they are read by people scanning
//! test output, not by tools.

use std::fmt;

use kernel_bridge::{BoundingBox, KernelIntrospect};
use part_engine::Part;
use part_types::Color;

use crate::helpers::HarnessError;
use crate::oracle::OracleVerdict;

/// A built part summarized piece by piece.
#[derive(Debug, Clone, PartialEq)]
pub struct PartReport {
    pub name: String,
    pub color: String,
    pub opacity: f64,
    pub pieces: Vec<PieceSummary>,
    pub verdicts: Vec<OracleVerdict>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieceSummary {
    pub volume: f64,
    pub bounding_box: BoundingBox,
    pub faces: usize,
    pub edges: usize,
}

fn describe_color(color: &Color) -> String {
    match color {
        Color::Named(name) => name.clone(),
        Color::Rgb([r, g, b]) => format!("#{r:02x}{g:02x}{b:02x}"),
    }
}

impl PartReport {
    pub fn collect(
        introspect: &dyn KernelIntrospect,
        part: &Part,
        verdicts: &[OracleVerdict],
    ) -> Result<Self, HarnessError> {
        let pieces = part
            .solids
            .iter()
            .map(|s| {
                Ok(PieceSummary {
                    volume: introspect.volume(s)?,
                    bounding_box: introspect.bounding_box(s)?,
                    faces: introspect.list_faces(s).len(),
                    edges: introspect.list_edges(s).len(),
                })
            })
            .collect::<Result<Vec<_>, HarnessError>>()?;
        Ok(Self {
            name: part.name.clone(),
            color: describe_color(&part.display.color),
            opacity: part.display.opacity(),
            pieces,
            verdicts: verdicts.to_vec(),
        })
    }

    pub fn total_volume(&self) -> f64 {
        self.pieces.iter().map(|p| p.volume).sum()
    }

    pub fn failed(&self) -> impl Iterator<Item = &OracleVerdict> {
        self.verdicts.iter().filter(|v| !v.passed)
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("=== {} ===\n", self.name));
        out.push_str(&format!("Display: {} @ opacity {:.2}\n", self.color, self.opacity));
        out.push_str(&format!(
            "Pieces ({}), total volume {:.3}:\n",
            self.pieces.len(),
            self.total_volume()
        ));
        for (i, p) in self.pieces.iter().enumerate() {
            let (min, max) = (p.bounding_box.min, p.bounding_box.max);
            out.push_str(&format!(
                "  [{i}] volume {:.3} | F={} E={} | ({:.2}, {:.2}, {:.2}) -> ({:.2}, {:.2}, {:.2})\n",
                p.volume, p.faces, p.edges, min[0], min[1], min[2], max[0], max[1], max[2],
            ));
        }
        if !self.verdicts.is_empty() {
            out.push_str(&format!("\nChecks ({}):\n", self.verdicts.len()));
            for v in &self.verdicts {
                let status = if v.passed { "PASS" } else { "FAIL" };
                out.push_str(&format!("  [{status}] {}: {}\n", v.oracle_name, v.detail));
            }
        }
        out
    }
}

impl fmt::Display for PartReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}
