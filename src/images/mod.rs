pub mod normalize;
pub mod services;

pub use normalize::{normalize_image, ImageError, NormalizeOptions, NormalizedImage};
pub use services::{validate_upload, UploadItem};
