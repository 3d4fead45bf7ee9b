//! Crop rectangle for one question on its page.
//!
//! The question starts at its `N.` anchor word. It ends just above `(N+1).`
//! when that anchor sits in the same column; the last question of a column
//! instead ends below its choice D, or below the last body word when no
//! choice D can be found.

use tracing::debug;

use crate::core::config::CropConfig;
use crate::core::error::CropError;
use crate::core::geometry::BBox;
use crate::layout::{Column, PageLayout, Word};

#[derive(Debug, Clone)]
pub struct BoxInferencer {
    config: CropConfig,
}

impl BoxInferencer {
    pub fn new(config: &CropConfig) -> Self {
        Self { config: config.clone() }
    }

    pub fn infer(&self, page: &PageLayout, number: u32) -> Result<BBox, CropError> {
        let c = &self.config;
        let anchor_text = format!("{number}.");
        let anchor = page
            .words
            .iter()
            .find(|word| word.text == anchor_text)
            .ok_or(CropError::AnchorNotFound {
                number,
                page: page.page_number,
            })?;

        let column = page.column_of(&anchor.bbox);
        let mid_x = page.mid_x();
        let (x0, x1) = match column {
            Column::Left => (c.left_margin, mid_x - c.left_gutter),
            Column::Right => (mid_x + c.right_gutter, page.width - c.right_margin),
        };
        let y0 = anchor.bbox.top() - c.anchor_padding;

        let next_text = number.checked_add(1).map(|next| format!("{next}."));
        let next_anchor = next_text.and_then(|next_text| {
            page.column_words(column)
                .filter(|word| word.text == next_text && word.bbox.top() > anchor.bbox.top())
                .min_by(|a, b| a.bbox.top().total_cmp(&b.bbox.top()))
        });

        let y1 = match next_anchor {
            Some(next) => next.bbox.top() - c.next_anchor_gap,
            None => self.column_end(page, column, y0),
        };
        let y1 = y1.min(page.height - c.bottom_margin);

        let bbox = BBox::new(x0, y0, x1, y1);
        if bbox.is_empty() {
            return Err(CropError::DegenerateBox {
                number,
                page: page.page_number,
                x0,
                y0,
                x1,
                y1,
            });
        }

        debug!(
            "Q{number} on page {}: crop ({x0:.1}, {y0:.1}, {x1:.1}, {y1:.1}), next anchor {}",
            page.page_number,
            if next_anchor.is_some() { "found" } else { "absent" }
        );
        Ok(bbox)
    }

    /// Bottom edge for the last question of a column.
    fn column_end(&self, page: &PageLayout, column: Column, y0: f32) -> f32 {
        let c = &self.config;
        let body: Vec<&Word> = page
            .column_words(column)
            .filter(|word| word.bbox.top() >= y0 && !self.is_footer(&word.text))
            .collect();

        let last_d = body
            .iter()
            .filter(|word| self.is_d_marker(&word.text))
            .max_by(|a, b| a.bbox.bottom().total_cmp(&b.bbox.bottom()));

        if let Some(d) = last_d {
            let window_top = d.bbox.top() - c.d_marker_lead;
            let window_bottom = d.bbox.bottom() + c.d_marker_window;
            let bottom = body
                .iter()
                .filter(|word| word.bbox.top() >= window_top && word.bbox.bottom() <= window_bottom)
                .map(|word| word.bbox.bottom())
                .fold(d.bbox.bottom(), f32::max);
            return bottom + c.d_marker_padding;
        }

        body.iter()
            .map(|word| word.bbox.bottom())
            .reduce(f32::max)
            .map_or(page.height - c.empty_column_margin, |bottom| bottom + c.fallback_padding)
    }

    fn is_footer(&self, text: &str) -> bool {
        self.config.footer_keywords.iter().any(|keyword| text.contains(keyword.as_str()))
    }

    fn is_d_marker(&self, text: &str) -> bool {
        self.config.d_markers.iter().any(|marker| text.contains(marker.as_str()))
    }
}
