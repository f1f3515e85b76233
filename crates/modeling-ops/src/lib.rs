pub mod boolean;
pub mod chamfer;
pub mod compose;
pub mod extrude;
pub mod fillet;
mod geom;
pub mod holes;
pub mod kernel_ext;
pub mod loft;
pub mod revolve;
pub mod select;
pub mod sketch;
pub mod sweep;
pub mod types;

pub use boolean::{execute_boolean, execute_split, BooleanKind, SplitKeep};
pub use chamfer::execute_chamfer;
pub use compose::{union_wires, ComposedWires, ComposerSettings};
pub use extrude::{execute_extrude, execute_symmetric_extrude};
pub use fillet::{execute_fillet, material_limit};
pub use holes::{cbore_hole, csk_face_hole, csk_hole, face_frame, Counterbore, Countersink};
pub use kernel_ext::{KernelBundle, WirePlane};
pub use loft::execute_loft;
pub use revolve::execute_revolve;
pub use select::{EdgeInfo, EdgeSelector, EntityInfo, FaceInfo, FaceSelector, Selector};
pub use sketch::Sketch;
pub use sweep::execute_sweep;
pub use types::*;
