use kernel_bridge::KernelIntrospect;
use modeling_ops::{ComposerSettings, KernelBundle};
use part_types::{Color, DisplayOptions, KernelTolerance};
use tracing::trace;

use crate::debug::{DebugSink, NullSink, Shown};

/// Everything a sub-shape builder needs besides its frame and measures:
/// kernel access, the tolerance settings and the debug channel.
pub struct BuildContext<'a> {
    kernel: &'a mut dyn KernelBundle,
    sink: Box<dyn DebugSink + 'a>,
    tolerance: KernelTolerance,
    debug: bool,
    parts: Vec<String>,
}

impl<'a> BuildContext<'a> {
    pub fn new(kernel: &'a mut dyn KernelBundle, tolerance: KernelTolerance) -> Self {
        Self {
            kernel,
            sink: Box::new(NullSink),
            tolerance,
            debug: false,
            parts: Vec::new(),
        }
    }

    pub fn with_sink(mut self, sink: impl DebugSink + 'a) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn kernel(&mut self) -> &mut dyn KernelBundle {
        &mut *self.kernel
    }

    pub fn introspect(&self) -> &dyn KernelIntrospect {
        self.kernel.as_introspect()
    }

    pub fn tolerance(&self) -> &KernelTolerance {
        &self.tolerance
    }

    pub fn composer(&self) -> ComposerSettings {
        ComposerSettings::from_tolerance(&self.tolerance)
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug
    }

    pub(crate) fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Nesting depth of the part being built; 0 outside any part.
    pub fn depth(&self) -> usize {
        self.parts.len()
    }

    /// Name of the innermost part being built.
    pub fn current_part(&self) -> Option<&str> {
        self.parts.last().map(String::as_str)
    }

    pub(crate) fn enter(&mut self, part: &str) {
        self.parts.push(part.to_string());
    }

    pub(crate) fn leave(&mut self) {
        self.parts.pop();
    }

    /// Show an intermediate shape when the debug channel is on.
    pub fn show(&mut self, name: &str, shape: impl Into<Shown>, display: &DisplayOptions) {
        if !self.debug {
            return;
        }
        let shape = shape.into();
        let qualified = match self.current_part() {
            Some(part) => format!("{part}/{name}"),
            None => name.to_string(),
        };
        trace!(name = %qualified, "show");
        self.sink.show(&qualified, &shape, display);
    }

    /// Show with the default translucent debug color.
    pub fn show_debug(&mut self, name: &str, shape: impl Into<Shown>) {
        let display = DisplayOptions::opaque(Color::named("red"))
            .with_opacity(0.5)
            .unwrap_or_default();
        self.show(name, shape, &display);
    }
}
