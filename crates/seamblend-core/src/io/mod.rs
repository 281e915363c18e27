pub mod image_io;
pub mod sink;

pub use image_io::{load_source, probe, save_composite, save_mask, ImageInfo};
pub use sink::{DebugArtifacts, FileSink};
