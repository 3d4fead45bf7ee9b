use std::fmt;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::core::config::Config;
use crate::core::model::{ExamResult, ExamType};
use crate::crop::{ExtractionSummary, ImageExtractor, PageRenderer, Rasterizer};
use crate::export::{read_exam_result, AnswerKeyExporter, Exporter, JsonExporter, ReportExporter};
use crate::layout::{LayoutSource, PopplerLayout};
use crate::parser::ExamParser;

/// Inclusive span of exam years, written `2000-2025` or `2018`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub first: u32,
    pub last: u32,
}

impl YearRange {
    pub fn years(&self) -> RangeInclusive<u32> {
        self.first..=self.last
    }
}

impl FromStr for YearRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_year = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid year {part:?}"))
        };
        let (first, last) = match s.split_once('-') {
            Some((first, last)) => (parse_year(first)?, parse_year(last)?),
            None => {
                let year = parse_year(s)?;
                (year, year)
            }
        };
        if first > last {
            return Err(format!("year range {first}-{last} is reversed"));
        }
        Ok(Self { first, last })
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first == self.last {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{}-{}", self.first, self.last)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Parse,
    Images,
    /// Parse, then extract images.
    All,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub config: Config,
    pub years: YearRange,
    pub exam_type: ExamType,
}

impl PipelineConfig {
    pub fn new(config: Config, years: YearRange, exam_type: ExamType) -> Self {
        Self {
            config,
            years,
            exam_type,
        }
    }
}

#[derive(Debug)]
pub struct UnitReport {
    pub result: ExamResult,
    pub extraction: Option<ExtractionSummary>,
    pub outputs: Vec<PathBuf>,
}

#[derive(Debug)]
pub enum UnitOutcome {
    Completed(UnitReport),
    /// An input file is absent; nothing was written for this unit.
    Skipped { reason: String },
}

#[derive(Debug)]
pub struct UnitResult {
    pub year: u32,
    pub exam_type: ExamType,
    pub outcome: Result<UnitOutcome>,
}

/// Run `stage` for every year in the range. A unit that is skipped or fails
/// does not stop the batch.
pub fn run_batch(pipeline: &PipelineConfig, stage: Stage) -> Vec<UnitResult> {
    pipeline
        .years
        .years()
        .map(|year| {
            let outcome = run_unit(&pipeline.config, year, pipeline.exam_type, stage);
            if let Err(err) = &outcome {
                error!("{year} {}: {err:#}", pipeline.exam_type);
            }
            UnitResult {
                year,
                exam_type: pipeline.exam_type,
                outcome,
            }
        })
        .collect()
}

pub fn run_unit(config: &Config, year: u32, exam_type: ExamType, stage: Stage) -> Result<UnitOutcome> {
    match stage {
        Stage::Parse => parse_unit(config, year, exam_type),
        Stage::Images => images_unit(config, year, exam_type),
        Stage::All => match parse_unit(config, year, exam_type)? {
            UnitOutcome::Completed(parsed) => match images_unit(config, year, exam_type)? {
                UnitOutcome::Completed(mut imaged) => {
                    let mut outputs = parsed.outputs;
                    outputs.append(&mut imaged.outputs);
                    outputs.dedup();
                    imaged.outputs = outputs;
                    Ok(UnitOutcome::Completed(imaged))
                }
                skipped => Ok(skipped),
            },
            skipped => Ok(skipped),
        },
    }
}

/// Text pass for one exam PDF.
pub fn parse_unit(config: &Config, year: u32, exam_type: ExamType) -> Result<UnitOutcome> {
    let pdf_path = config.paths.pdf_path(year, exam_type);
    if !pdf_path.exists() {
        let reason = format!("PDF file not found at {}", pdf_path.display());
        warn!("{reason}");
        return Ok(UnitOutcome::Skipped { reason });
    }

    info!("parsing {}", pdf_path.display());
    let layout = PopplerLayout::new()
        .load(&pdf_path)
        .with_context(|| format!("failed to read layout of {}", pdf_path.display()))?;
    parse_layout(config, year, exam_type, &layout).map(UnitOutcome::Completed)
}

/// Parse an already loaded layout and write the parsed JSON and the report.
pub fn parse_layout(config: &Config, year: u32, exam_type: ExamType, layout: &dyn LayoutSource) -> Result<UnitReport> {
    let parser = ExamParser::new(&config.parser, year, exam_type).context("invalid parser configuration")?;
    let result = parser.parse(layout)?;

    let paths = &config.paths;
    let outputs = vec![
        JsonExporter::new(paths.parsed_json(year, exam_type)).export(&result)?,
        ReportExporter::new(paths.report_md(year, exam_type)).export(&result)?,
    ];
    Ok(UnitReport {
        result,
        extraction: None,
        outputs,
    })
}

/// Image pass for one exam; needs the PDF and the parsed JSON.
pub fn images_unit(config: &Config, year: u32, exam_type: ExamType) -> Result<UnitOutcome> {
    let pdf_path = config.paths.pdf_path(year, exam_type);
    if !pdf_path.exists() {
        let reason = format!("PDF not found at {}", pdf_path.display());
        warn!("{reason}");
        return Ok(UnitOutcome::Skipped { reason });
    }
    let json_path = config.paths.parsed_json(year, exam_type);
    if !json_path.exists() {
        let reason = format!("Parsed JSON not found at {}", json_path.display());
        warn!("{reason}");
        return Ok(UnitOutcome::Skipped { reason });
    }

    let result = read_exam_result(&json_path)?;
    let layout = PopplerLayout::new()
        .load(&pdf_path)
        .with_context(|| format!("failed to read layout of {}", pdf_path.display()))?;
    let renderer = PageRenderer::new(&pdf_path)?;
    extract_layout(config, &layout, renderer, result).map(UnitOutcome::Completed)
}

/// Crop every question of `result` and rewrite the parsed JSON, the answer
/// key and the report.
pub fn extract_layout<R: Rasterizer>(
    config: &Config,
    layout: &dyn LayoutSource,
    rasterizer: R,
    result: ExamResult,
) -> Result<UnitReport> {
    let paths = &config.paths;
    let mut extractor = ImageExtractor::new(rasterizer, &config.crop, paths, &result);
    let (result, summary) = extractor.extract(layout, result)?;

    let (year, exam_type) = (result.exam_year, result.exam_type);
    let outputs = vec![
        JsonExporter::new(paths.parsed_json(year, exam_type)).export(&result)?,
        AnswerKeyExporter::new(paths.answer_key_json(year, exam_type)).export(&result)?,
        ReportExporter::new(paths.report_md(year, exam_type)).export(&result)?,
    ];
    Ok(UnitReport {
        result,
        extraction: Some(summary),
        outputs,
    })
}

/// The first `limit` issues as numbered lines for the end-of-run summary.
pub fn issue_summary(result: &ExamResult, limit: usize) -> Vec<String> {
    result
        .parsing_issues
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, issue)| {
            let number = issue
                .question_number
                .map_or_else(|| "N/A".to_string(), |n| n.to_string());
            format!("{}. Q{number}: {}", i + 1, issue.issue)
        })
        .collect()
}
