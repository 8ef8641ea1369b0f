pub mod crop;
pub mod downsample;
pub mod grayscale;
pub mod processor;
pub mod resize;

pub use crop::{center_crop, center_crop_region, CropRegion};
pub use downsample::{drops_all_frames, should_keep_frame};
pub use grayscale::{luma, to_grayscale};
pub use processor::{ClipTransformer, TransformStats};
pub use resize::resize_area;
