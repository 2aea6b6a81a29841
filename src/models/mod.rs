pub mod api;
pub mod batch;
pub mod generation;
pub mod image;

pub use api::*;
pub use batch::*;
pub use generation::*;
pub use image::*;
