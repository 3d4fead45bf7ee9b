//! Positioned-text view of a PDF page.
//!
//! The parser and the crop inferencer only ever see [`PageLayout`]: page size,
//! words with their boxes, and embedded image rectangles. Where the layout
//! comes from (poppler, a JSON dump, a test fixture) is behind [`LayoutSource`].

pub mod lines;
pub mod pdf_info;
pub mod poppler;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::LayoutError;
use crate::core::geometry::BBox;

pub use lines::words_to_text;
pub use pdf_info::PdfInfo;
pub use poppler::PopplerLayout;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub bbox: BBox,
}

impl Word {
    pub fn new(text: impl Into<String>, x0: f32, top: f32, x1: f32, bottom: f32) -> Self {
        Self {
            text: text.into(),
            bbox: BBox::new(x0, top, x1, bottom),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Left,
    Right,
}

impl Column {
    pub const BOTH: [Column; 2] = [Column::Left, Column::Right];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    /// 1-based.
    pub page_number: usize,
    pub width: f32,
    pub height: f32,
    pub words: Vec<Word>,
    #[serde(default)]
    pub images: Vec<BBox>,
}

impl PageLayout {
    pub fn new(page_number: usize, width: f32, height: f32) -> Self {
        Self {
            page_number,
            width,
            height,
            words: Vec::new(),
            images: Vec::new(),
        }
    }

    pub fn mid_x(&self) -> f32 {
        self.width / 2.0
    }

    /// Column a box belongs to, judged by its left edge.
    pub fn column_of(&self, bbox: &BBox) -> Column {
        if bbox.x0 < self.mid_x() {
            Column::Left
        } else {
            Column::Right
        }
    }

    pub fn column_region(&self, column: Column) -> BBox {
        match column {
            Column::Left => BBox::new(0.0, 0.0, self.mid_x(), self.height),
            Column::Right => BBox::new(self.mid_x(), 0.0, self.width, self.height),
        }
    }

    pub fn column_words(&self, column: Column) -> impl Iterator<Item = &Word> {
        self.words
            .iter()
            .filter(move |word| self.column_of(&word.bbox) == column)
    }

    pub fn column_has_images(&self, column: Column) -> bool {
        let region = self.column_region(column);
        self.images.iter().any(|image| region.contains(image))
    }

    pub fn column_text(&self, column: Column, y_tolerance: f32) -> String {
        words_to_text(self.column_words(column), y_tolerance)
    }

    pub fn text(&self, y_tolerance: f32) -> String {
        words_to_text(self.words.iter(), y_tolerance)
    }
}

pub trait LayoutSource {
    fn page_count(&self) -> usize;

    /// Page by 1-based number.
    fn page(&self, page_number: usize) -> Result<&PageLayout, LayoutError>;
}

/// Fully materialised document layout; also the on-disk layout dump format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentLayout {
    pub pages: Vec<PageLayout>,
}

impl DocumentLayout {
    pub fn new(pages: Vec<PageLayout>) -> Self {
        Self { pages }
    }

    pub fn from_json_file(path: &Path) -> Result<Self, LayoutError> {
        let data = fs::read_to_string(path)?;
        serde_json::from_str(&data).map_err(|e| LayoutError::Malformed {
            tool: "layout dump",
            message: e.to_string(),
        })
    }
}

impl LayoutSource for DocumentLayout {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, page_number: usize) -> Result<&PageLayout, LayoutError> {
        page_number
            .checked_sub(1)
            .and_then(|idx| self.pages.get(idx))
            .ok_or(LayoutError::PageOutOfRange {
                page: page_number,
                count: self.pages.len(),
            })
    }
}
