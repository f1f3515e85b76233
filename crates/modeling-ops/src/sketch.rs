//! Planar wires drawn in the local coordinates of a frame.

use std::f64::consts::TAU;

use kernel_bridge::KernelWireHandle;
use part_types::Frame;

use crate::kernel_ext::KernelBundle;
use crate::types::OpError;

/// Draws closed wires on a frame. Points are local (x, y) in the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sketch {
    frame: Frame,
}

impl Sketch {
    pub fn on(frame: Frame) -> Self {
        Self { frame }
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Rectangle `width` along x by `height` along y. Each axis is either
    /// centered on the origin or starts at it.
    pub fn rect(
        &self,
        kb: &mut dyn KernelBundle,
        width: f64,
        height: f64,
        centered: (bool, bool),
    ) -> Result<KernelWireHandle, OpError> {
        if width <= 0.0 || height <= 0.0 {
            return Err(OpError::InvalidParameter {
                reason: format!("rectangle {width} x {height} is empty"),
            });
        }
        let x0 = if centered.0 { -width / 2.0 } else { 0.0 };
        let y0 = if centered.1 { -height / 2.0 } else { 0.0 };
        self.polyline(
            kb,
            &[
                [x0, y0],
                [x0 + width, y0],
                [x0 + width, y0 + height],
                [x0, y0 + height],
            ],
            true,
        )
    }

    pub fn polyline(
        &self,
        kb: &mut dyn KernelBundle,
        points: &[[f64; 2]],
        closed: bool,
    ) -> Result<KernelWireHandle, OpError> {
        let world: Vec<[f64; 3]> = points.iter().map(|p| self.frame.to_world(*p)).collect();
        Ok(kb.make_polyline_wire(&world, closed)?)
    }

    pub fn circle(
        &self,
        kb: &mut dyn KernelBundle,
        center: [f64; 2],
        radius: f64,
    ) -> Result<KernelWireHandle, OpError> {
        if radius <= 0.0 {
            return Err(OpError::InvalidParameter {
                reason: format!("circle radius must be positive, got {radius}"),
            });
        }
        Ok(kb.make_circle_wire(self.frame.to_world(center), self.frame.normal(), radius)?)
    }

    /// Regular polygon inscribed in a circle of `diameter`, first vertex on +x.
    pub fn regular_polygon(
        &self,
        kb: &mut dyn KernelBundle,
        center: [f64; 2],
        sides: usize,
        diameter: f64,
    ) -> Result<KernelWireHandle, OpError> {
        if sides < 3 || diameter <= 0.0 {
            return Err(OpError::InvalidParameter {
                reason: format!("regular polygon needs 3+ sides and a positive size, got {sides} / {diameter}"),
            });
        }
        let r = diameter / 2.0;
        let points: Vec<[f64; 2]> = (0..sides)
            .map(|i| {
                let a = TAU * i as f64 / sides as f64;
                [center[0] + r * a.cos(), center[1] + r * a.sin()]
            })
            .collect();
        self.polyline(kb, &points, true)
    }
}
