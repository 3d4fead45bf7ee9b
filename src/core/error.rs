use thiserror::Error;

/// Errors reading or parsing a TOML config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid footer pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Failures of the page layout collaborator.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Page {page} out of range (document has {count} pages)")]
    PageOutOfRange { page: usize, count: usize },

    #[error("{tool} failed: {message}")]
    Tool { tool: &'static str, message: String },

    #[error("Malformed {tool} output: {message}")]
    Malformed { tool: &'static str, message: String },

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcomes of crop-rectangle inference other than success.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CropError {
    #[error("Cannot find start of question {number} on page {page}")]
    AnchorNotFound { number: u32, page: usize },

    #[error("Question {number} on page {page} yields an empty crop ({x0}, {y0}, {x1}, {y1})")]
    DegenerateBox {
        number: u32,
        page: usize,
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
    },
}
