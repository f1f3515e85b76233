//! Debug visualization channel for intermediate shapes.
//!
//! Sinks only observe shapes; nothing shown ever feeds back into the
//! geometry being built.

use kernel_bridge::{KernelSolidHandle, KernelWireHandle};
use part_types::DisplayOptions;
use tracing::debug;

/// An intermediate shape handed to a debug sink.
#[derive(Debug, Clone, PartialEq)]
pub enum Shown {
    Solid(KernelSolidHandle),
    Wire(KernelWireHandle),
}

impl From<KernelSolidHandle> for Shown {
    fn from(h: KernelSolidHandle) -> Self {
        Shown::Solid(h)
    }
}

impl From<KernelWireHandle> for Shown {
    fn from(h: KernelWireHandle) -> Self {
        Shown::Wire(h)
    }
}

pub trait DebugSink {
    fn show(&mut self, name: &str, shape: &Shown, display: &DisplayOptions);
}

impl<S: DebugSink + ?Sized> DebugSink for &mut S {
    fn show(&mut self, name: &str, shape: &Shown, display: &DisplayOptions) {
        (**self).show(name, shape, display);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DebugSink for NullSink {
    fn show(&mut self, _name: &str, _shape: &Shown, _display: &DisplayOptions) {}
}

/// Keeps every shown shape, in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub shown: Vec<(String, Shown, DisplayOptions)>,
}

impl RecordingSink {
    pub fn names(&self) -> Vec<&str> {
        self.shown.iter().map(|(n, _, _)| n.as_str()).collect()
    }
}

impl DebugSink for RecordingSink {
    fn show(&mut self, name: &str, shape: &Shown, display: &DisplayOptions) {
        self.shown.push((name.to_string(), shape.clone(), display.clone()));
    }
}

/// Forwards shown shapes as `debug!` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DebugSink for TracingSink {
    fn show(&mut self, name: &str, shape: &Shown, options: &DisplayOptions) {
        debug!(
            name,
            ?shape,
            color = ?options.color,
            opacity = options.opacity(),
            "debug shape"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_bridge::{Kernel, MockKernel};
    use part_types::Color;

    #[test]
    fn test_sinks_take_any_shape() {
        let mut kernel = MockKernel::new();
        let wire = kernel.make_circle_wire([0.0; 3], [0.0, 0.0, 1.0], 1.0).unwrap();
        let shown = Shown::from(wire);
        let mut options = DisplayOptions::default();
        options.color = Color::Named("red".to_string());

        TracingSink.show("circle", &shown, &options);
        NullSink.show("circle", &shown, &options);
        let mut recording = RecordingSink::default();
        (&mut recording).show("circle", &shown, &options);
        assert_eq!(recording.names(), vec!["circle"]);
        assert_eq!(recording.shown[0].2.color, Color::Named("red".to_string()));
    }
}
