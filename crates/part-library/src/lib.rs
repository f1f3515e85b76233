//! The parts that can be generated, and presets for them.

pub mod box_lid;
pub mod foot_block;
pub mod presets;
pub mod wall_mount;
pub mod xmount_plug;

pub use box_lid::BoxLidFixation;
pub use foot_block::FootBlock;
pub use presets::bundled_presets;
pub use wall_mount::WallMount;
pub use xmount_plug::XMountPlug;

use part_engine::PartCatalog;

/// Every part type of the library, by name.
pub fn catalog() -> PartCatalog {
    let mut catalog = PartCatalog::new();
    catalog
        .register(BoxLidFixation)
        .register(FootBlock)
        .register(XMountPlug)
        .register(WallMount);
    catalog
}
