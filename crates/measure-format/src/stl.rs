//! STL export of tessellated solids.

use kernel_bridge::{Kernel, KernelSolidHandle, RenderMesh};
use tracing::info;

use crate::errors::ExportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StlFormat {
    #[default]
    Binary,
    Ascii,
}

type Triangle = [[f32; 3]; 3];

fn triangles(mesh: &RenderMesh) -> impl Iterator<Item = Triangle> + '_ {
    (0..mesh.triangle_count()).map(move |i| mesh.triangle(i))
}

fn facet_normal(t: &Triangle) -> [f32; 3] {
    let u = [t[1][0] - t[0][0], t[1][1] - t[0][1], t[1][2] - t[0][2]];
    let v = [t[2][0] - t[0][0], t[2][1] - t[0][1], t[2][2] - t[0][2]];
    let n = [u[1] * v[2] - u[2] * v[1], u[2] * v[0] - u[0] * v[2], u[0] * v[1] - u[1] * v[0]];
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if len > 0.0 {
        [n[0] / len, n[1] / len, n[2] / len]
    } else {
        [0.0; 3]
    }
}

/// Tessellate `solids` and write them as one STL body called `name`.
pub fn export_stl(
    kernel: &mut dyn Kernel,
    solids: &[KernelSolidHandle],
    name: &str,
    tolerance: f64,
    format: StlFormat,
) -> Result<Vec<u8>, ExportError> {
    if solids.is_empty() {
        return Err(ExportError::NoSolid);
    }
    let meshes = solids
        .iter()
        .map(|s| kernel.tessellate(s, tolerance))
        .collect::<Result<Vec<_>, _>>()?;
    let tris: Vec<Triangle> = meshes.iter().flat_map(triangles).collect();
    info!(name, triangles = tris.len(), ?format, "stl export");
    Ok(match format {
        StlFormat::Binary => binary(name, &tris),
        StlFormat::Ascii => ascii(name, &tris).into_bytes(),
    })
}

fn binary(name: &str, tris: &[Triangle]) -> Vec<u8> {
    let mut out = Vec::with_capacity(84 + 50 * tris.len());
    let mut header = [b' '; 80];
    let label = format!("partgen {name}");
    let n = label.len().min(80);
    header[..n].copy_from_slice(&label.as_bytes()[..n]);
    out.extend_from_slice(&header);
    out.extend_from_slice(&(tris.len() as u32).to_le_bytes());
    for t in tris {
        for c in facet_normal(t).iter().chain(t.iter().flatten()) {
            out.extend_from_slice(&c.to_le_bytes());
        }
        out.extend_from_slice(&0u16.to_le_bytes());
    }
    out
}

fn ascii(name: &str, tris: &[Triangle]) -> String {
    let solid_name: String = name.chars().map(|c| if c.is_whitespace() { '_' } else { c }).collect();
    let mut out = format!("solid {solid_name}\n");
    for t in tris {
        let n = facet_normal(t);
        out.push_str(&format!("  facet normal {:e} {:e} {:e}\n    outer loop\n", n[0], n[1], n[2]));
        for v in t {
            out.push_str(&format!("      vertex {:e} {:e} {:e}\n", v[0], v[1], v[2]));
        }
        out.push_str("    endloop\n  endfacet\n");
    }
    out.push_str(&format!("endsolid {solid_name}\n"));
    out
}
