pub mod crop;
pub mod padding;

pub use crop::crop_rotated;
pub use padding::{letterbox, Letterbox};
