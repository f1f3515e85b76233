pub mod bounds;
pub mod display;
pub mod frame;
pub mod measure;
pub mod motion;
pub mod tolerance;
pub mod topo;

pub use bounds::*;
pub use display::*;
pub use frame::*;
pub use measure::*;
pub use motion::*;
pub use tolerance::*;
pub use topo::*;
