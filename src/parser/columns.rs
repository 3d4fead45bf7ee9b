use regex::{Regex, RegexBuilder};

use crate::core::error::ConfigError;
use crate::layout::{Column, PageLayout};

/// Compiled footer and header boilerplate for one exam year.
#[derive(Debug, Clone)]
pub struct FooterFilter {
    patterns: Vec<Regex>,
}

impl FooterFilter {
    pub fn new(patterns: &[String], year: u32) -> Result<Self, ConfigError> {
        let year = year.to_string();
        let patterns = patterns
            .iter()
            .map(|pattern| {
                let pattern = pattern.replace("{year}", &year);
                RegexBuilder::new(&pattern)
                    .case_insensitive(true)
                    .multi_line(true)
                    .build()
                    .map_err(|source| ConfigError::Pattern { pattern, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn strip(&self, text: &str) -> String {
        let mut text = text.to_string();
        for pattern in &self.patterns {
            text = pattern.replace_all(&text, "").into_owned();
        }
        text
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnText {
    pub column: Column,
    pub text: String,
    pub has_images: bool,
}

/// Text of each non-empty column, left first, with boilerplate removed.
pub fn segment_columns(page: &PageLayout, footers: &FooterFilter, y_tolerance: f32) -> Vec<ColumnText> {
    Column::BOTH
        .into_iter()
        .filter_map(|column| {
            let raw = page.column_text(column, y_tolerance);
            if raw.trim().is_empty() {
                return None;
            }
            Some(ColumnText {
                column,
                text: footers.strip(&raw),
                has_images: page.column_has_images(column),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ParserConfig;
    use crate::core::geometry::BBox;
    use crate::layout::Word;
    use pretty_assertions::assert_eq;

    fn filter(year: u32) -> FooterFilter {
        FooterFilter::new(&ParserConfig::default().footer_patterns, year).unwrap()
    }

    #[test]
    fn strips_year_specific_notice() {
        let text = "1. Question\nNot valid for use as an USNCO Exam after April 30, 2018 please\n(A) a";
        let stripped = filter(2018).strip(text);
        assert!(!stripped.contains("April"), "{stripped}");
        assert!(stripped.contains("1. Question"));
    }

    #[test]
    fn notice_for_another_year_is_kept() {
        let text = "Exam after April 30, 2017";
        assert_eq!(filter(2018).strip(text), text);
    }

    #[test]
    fn strips_page_number_lines_and_end_marker() {
        let text = "(D) four\n  Page 3 \nEND OF TEST";
        assert_eq!(filter(2018).strip(text), "(D) four\n\n");
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = FooterFilter::new(&["(unclosed".to_string()], 2018).unwrap_err();
        assert!(matches!(err, ConfigError::Pattern { .. }));
    }

    #[test]
    fn empty_columns_are_skipped() {
        let mut page = PageLayout::new(3, 612.0, 792.0);
        page.words = vec![Word::new("1.", 40.0, 100.0, 50.0, 110.0), Word::new("Why?", 55.0, 100.0, 80.0, 110.0)];
        page.images = vec![BBox::new(60.0, 150.0, 200.0, 250.0)];

        let columns = segment_columns(&page, &filter(2018), 3.0);
        assert_eq!(
            columns,
            vec![ColumnText {
                column: Column::Left,
                text: "1. Why?".to_string(),
                has_images: true,
            }]
        );
    }
}
