pub mod bbox;
pub mod extractor;
pub mod renderer;

pub use bbox::BoxInferencer;
pub use extractor::{crop_scaled, ExtractionSummary, ImageExtractor};
pub use renderer::{PageRenderer, Rasterizer};
