//! Composite-part assembly.
//!
//! A part is built by a [`PartBuilder`] inside a [`BuildContext`]: sub-shapes
//! are produced relative to a [`Workplane`], composed with unions before
//! cuts, and the result is moved into the caller's frame as a [`Part`].

pub mod assembly;
pub mod catalog;
pub mod composition;
pub mod context;
pub mod debug;
pub mod derive;
pub mod error;
pub mod part;
pub mod workplane;

pub use assembly::{assemble, split_pieces, PartBuilder};
pub use catalog::PartCatalog;
pub use composition::Composition;
pub use context::BuildContext;
pub use debug::{DebugSink, NullSink, RecordingSink, Shown, TracingSink};
pub use derive::{derive_for, DeriveMeasures};
pub use error::{BuildError, MeasureContext, StepContext};
pub use part::Part;
pub use workplane::Workplane;
