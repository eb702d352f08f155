pub mod loaders;
pub mod volume;
pub mod work;

pub use loaders::load_work_ids;
pub use volume::{group_order_key, group_precedes, sort_volumes, ImageDescriptor, VolumeInfo};
pub use work::WorkId;
