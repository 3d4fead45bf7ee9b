//! Tunable parameters for parsing and cropping.
//!
//! Every layout heuristic reads its thresholds from here so a corpus typeset
//! differently can be retargeted from a TOML file without code changes:
//!
//! ```toml
//! [parser]
//! skip_leading_pages = 2
//! footer_patterns = ["END OF TEST[^\n]*"]
//!
//! [crop]
//! bottom_margin = 70.0
//! render_scale = 3.0
//!
//! [paths]
//! pdf_dir = "usnco-exams"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;
use crate::core::model::ExamType;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub parser: ParserConfig,
    pub crop: CropConfig,
    pub paths: PathsConfig,
}

impl Config {
    /// Load configuration from a TOML file. Missing keys keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParserConfig {
    /// Cover and instruction pages before the first question page.
    pub skip_leading_pages: usize,
    /// Words whose tops differ by at most this much share a text line.
    pub line_y_tolerance: f32,
    /// A digits-only line at least this long is never a subscript line.
    pub subscript_max_len: usize,
    /// Formula elements closer than this (in characters) form one run.
    pub element_run_gap: usize,
    pub stem_min_chars: usize,
    pub stem_max_chars: usize,
    /// Regexes stripped from column text. `{year}` expands to the exam year.
    pub footer_patterns: Vec<String>,
    pub summary_issue_limit: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            skip_leading_pages: 2,
            line_y_tolerance: 3.0,
            subscript_max_len: 30,
            element_run_gap: 3,
            stem_min_chars: 5,
            stem_max_chars: 500,
            footer_patterns: default_footer_patterns(),
            summary_issue_limit: 5,
        }
    }
}

fn default_footer_patterns() -> Vec<String> {
    [
        r"Property of ACS USNCO[^\n]*Local Sectio[^\n]*",
        r"ot for use as USNCO Local Section[^\n]*",
        r"Page \d+ Property of ACS USNCO[^\n]*",
        r"Exam after [A-Za-z]+ \d{1,2}, {year}[^\n]*",
        r"END OF TEST[^\n]*",
        r"^[ \t]*Page \d+( of \d+)?[ \t]*$",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CropConfig {
    pub left_margin: f32,
    /// Gap kept between the left crop and the page midline.
    pub left_gutter: f32,
    /// Gap kept between the page midline and the right crop.
    pub right_gutter: f32,
    pub right_margin: f32,
    /// Space above the anchor word included in the crop.
    pub anchor_padding: f32,
    /// Space left above the next question's anchor.
    pub next_anchor_gap: f32,
    /// Choice-D continuation window: words starting this far above the marker...
    pub d_marker_lead: f32,
    /// ...and ending at most this far below it belong to choice D.
    pub d_marker_window: f32,
    pub d_marker_padding: f32,
    pub fallback_padding: f32,
    /// Bottom margin used when a column holds no usable words at all.
    pub empty_column_margin: f32,
    /// No crop ever extends below `height - bottom_margin`.
    pub bottom_margin: f32,
    pub render_scale: f32,
    pub footer_keywords: Vec<String>,
    pub d_markers: Vec<String>,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            left_margin: 36.0,
            left_gutter: 6.0,
            right_gutter: 10.0,
            right_margin: 34.0,
            anchor_padding: 5.0,
            next_anchor_gap: 3.0,
            d_marker_lead: 2.0,
            d_marker_window: 30.0,
            d_marker_padding: 10.0,
            fallback_padding: 5.0,
            empty_column_margin: 80.0,
            bottom_margin: 70.0,
            render_scale: 3.0,
            footer_keywords: ["Page", "Property", "ACS", "USNCO", "Exam", "END", "OF", "TEST"]
                .into_iter()
                .map(String::from)
                .collect(),
            d_markers: ["(D)", "D.", "D)"].into_iter().map(String::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    pub pdf_dir: PathBuf,
    /// File name of an exam PDF; `{year}` and `{type}` are substituted.
    pub pdf_template: String,
    pub parsed_dir: PathBuf,
    pub image_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            pdf_dir: PathBuf::from("usnco-exams"),
            pdf_template: "{year}-usnco-{type}-exam-part-i.pdf".to_string(),
            parsed_dir: PathBuf::from("parsed_exams"),
            image_dir: PathBuf::from("question_images"),
        }
    }
}

impl PathsConfig {
    pub fn pdf_path(&self, year: u32, exam_type: ExamType) -> PathBuf {
        let name = self
            .pdf_template
            .replace("{year}", &year.to_string())
            .replace("{type}", exam_type.as_str());
        self.pdf_dir.join(name)
    }

    pub fn exam_dir(&self, year: u32) -> PathBuf {
        self.parsed_dir.join(year.to_string())
    }

    pub fn parsed_json(&self, year: u32, exam_type: ExamType) -> PathBuf {
        self.exam_dir(year).join(format!("{exam_type}_parsed.json"))
    }

    pub fn answer_key_json(&self, year: u32, exam_type: ExamType) -> PathBuf {
        self.exam_dir(year).join(format!("{exam_type}_answer_key.json"))
    }

    pub fn report_md(&self, year: u32, exam_type: ExamType) -> PathBuf {
        self.exam_dir(year).join(format!("{exam_type}_parsing_report.md"))
    }

    pub fn image_output_dir(&self, year: u32, exam_type: ExamType) -> PathBuf {
        self.image_dir.join(year.to_string()).join(exam_type.as_str())
    }

    /// Link recorded in `image_path`: rooted at the image directory's own
    /// name, so the parsed JSON never carries a machine-local prefix.
    pub fn image_link(&self, year: u32, exam_type: ExamType, file_name: &str) -> String {
        let root = self
            .image_dir
            .file_name()
            .map_or_else(|| "question_images".into(), |name| name.to_string_lossy());
        format!("{root}/{year}/{exam_type}/{file_name}")
    }
}
