use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::Result;
use image::DynamicImage;
use pretty_assertions::assert_eq;

use examstruct::core::config::{Config, CropConfig, ParserConfig};
use examstruct::core::geometry::BBox;
use examstruct::core::model::{AnswerKey, ChoiceLetter, Confidence, ExamType, IssueKind};
use examstruct::crop::{BoxInferencer, Rasterizer};
use examstruct::export::read_exam_result;
use examstruct::layout::{DocumentLayout, LayoutSource, PageLayout, Word};
use examstruct::parser::{extract_answer_key, match_answers, ExamParser};
use examstruct::pipeline::{extract_layout, parse_layout, parse_unit, UnitOutcome};

/// Lay a line of text out word by word, five points per character.
fn line(text: &str, x0: f32, top: f32) -> Vec<Word> {
    let mut x = x0;
    text.split_whitespace()
        .map(|token| {
            let width = 5.0 * token.chars().count() as f32;
            let word = Word::new(token, x, top, x + width, top + 10.0);
            x += width + 4.0;
            word
        })
        .collect()
}

fn page(number: usize, lines: &[(&str, f32, f32)]) -> PageLayout {
    let mut page = PageLayout::new(number, 612.0, 792.0);
    for &(text, x0, top) in lines {
        page.words.extend(line(text, x0, top));
    }
    page
}

/// Cover, instructions, one two-column question page, answer key.
fn synthetic_exam() -> DocumentLayout {
    let mut questions = page(
        3,
        &[
            ("5. Which element has the highest first ionization energy?", 40.0, 100.0),
            ("(A) Li (B) Na", 40.0, 115.0),
            ("(C) K (D) Rb", 40.0, 130.0),
            ("as measured in the gas phase", 40.0, 150.0),
            ("at standard pressure and temperature", 40.0, 175.0),
            ("Page 3", 280.0, 740.0),
            ("6. Identify the structure shown.", 320.0, 100.0),
            ("(A) I (B) II (C) III (D) IV", 320.0, 260.0),
        ],
    );
    questions.images = vec![BBox::new(330.0, 120.0, 500.0, 250.0)];

    DocumentLayout::new(vec![
        page(1, &[("2018 U.S. National Chemistry Olympiad", 100.0, 300.0)]),
        page(2, &[("DIRECTIONS", 40.0, 80.0)]),
        questions,
        page(4, &[("ANSWER KEY", 40.0, 80.0), ("5. D 6. B", 40.0, 100.0)]),
    ])
}

struct BlankPages;

impl Rasterizer for BlankPages {
    fn render_page(&self, _page_number: usize, scale: f32) -> Result<DynamicImage> {
        Ok(DynamicImage::new_rgb8((612.0 * scale) as u32, (792.0 * scale) as u32))
    }
}

fn temp_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.paths.pdf_dir = root.join("usnco-exams");
    config.paths.parsed_dir = root.join("parsed_exams");
    config.paths.image_dir = root.join("question_images");
    config
}

/// Last question of a column: parsed fully, crop ends under its choice D
#[test]
fn test_last_question_in_column_uses_choice_d() -> Result<()> {
    let exam = synthetic_exam();
    let parser = ExamParser::new(&ParserConfig::default(), 2018, ExamType::National)?;
    let result = parser.parse(&exam)?;

    assert_eq!(result.total_questions, 2);
    assert!(result.parsing_issues.is_empty(), "{:?}", result.parsing_issues);

    let q5 = &result.questions[0];
    assert_eq!(q5.number, 5);
    assert!(!q5.has_images);
    assert_eq!(q5.parsing_confidence, Confidence::High);
    assert_eq!(q5.correct_answer, "D");
    assert_eq!(q5.choices.get(ChoiceLetter::A), Some("Li"));

    let q6 = &result.questions[1];
    assert!(q6.has_images);
    assert_eq!(q6.parsing_confidence, Confidence::Medium);

    // The D window reaches the first explanatory line (bottom 160) but not
    // the second (bottom 185), which the no-D fallback would have used.
    let bbox = BoxInferencer::new(&CropConfig::default()).infer(exam.page(3)?, 5)?;
    assert_eq!(bbox, BBox::new(36.0, 95.0, 300.0, 170.0));
    Ok(())
}

/// Every crop stays above the bottom margin
#[test]
fn test_crop_bottom_never_enters_margin() -> Result<()> {
    let exam = synthetic_exam();
    let inferencer = BoxInferencer::new(&CropConfig::default());
    let page = exam.page(3)?;
    for number in [5, 6] {
        let bbox = inferencer.infer(page, number)?;
        assert!(bbox.y1 <= page.height - 70.0);
        assert!(bbox.x0 < bbox.x1 && bbox.y0 < bbox.y1);
    }
    Ok(())
}

/// Matcher flags exactly the symmetric difference of question and key numbers
#[test]
fn test_answer_matching_is_bidirectional() -> Result<()> {
    let exam = synthetic_exam();
    let parser = ExamParser::new(&ParserConfig::default(), 2018, ExamType::National)?;
    let parsed = parser.parse_page(exam.page(3)?);

    let key: AnswerKey = extract_answer_key("6. A 7. B 8. C");
    let (questions, issues) = match_answers(parsed.questions, &key);

    let question_numbers: BTreeSet<u32> = questions.iter().map(|q| q.number).collect();
    let key_numbers: BTreeSet<u32> = key.numbers().collect();

    let missing: BTreeSet<u32> = issues
        .iter()
        .filter(|i| i.kind == IssueKind::MissingAnswer)
        .filter_map(|i| i.question_number)
        .collect();
    let orphans: BTreeSet<u32> = issues
        .iter()
        .filter(|i| i.kind == IssueKind::OrphanAnswer)
        .filter_map(|i| i.question_number)
        .collect();

    assert_eq!(missing, question_numbers.difference(&key_numbers).copied().collect::<BTreeSet<u32>>());
    assert_eq!(orphans, key_numbers.difference(&question_numbers).copied().collect::<BTreeSet<u32>>());
    assert_eq!(issues.len(), missing.len() + orphans.len());
    Ok(())
}

/// Text pass writes the parsed JSON and report; JSON reads back unchanged
#[test]
fn test_parse_layout_writes_outputs() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = temp_config(dir.path());

    let report = parse_layout(&config, 2018, ExamType::National, &synthetic_exam())?;
    let exam_dir = dir.path().join("parsed_exams/2018");
    assert_eq!(
        report.outputs,
        vec![exam_dir.join("national_parsed.json"), exam_dir.join("national_parsing_report.md")]
    );

    let back = read_exam_result(&report.outputs[0])?;
    assert_eq!(back, report.result);
    Ok(())
}

/// Image pass sets image paths and writes the answer key
#[test]
fn test_image_pass_writes_answer_key() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = temp_config(dir.path());
    let exam = synthetic_exam();

    let parsed = parse_layout(&config, 2018, ExamType::National, &exam)?.result;
    let report = extract_layout(&config, &exam, BlankPages, parsed)?;

    let summary = report.extraction.as_ref().expect("image pass reports a summary");
    assert_eq!(summary.extracted, 2);
    assert_eq!(summary.failed, 0);
    assert!(dir.path().join("question_images/2018/national/q05.png").exists());
    assert!(dir.path().join("question_images/2018/national/q06.png").exists());

    let key_path = dir.path().join("parsed_exams/2018/national_answer_key.json");
    let entries: serde_json::Value = serde_json::from_str(&fs::read_to_string(key_path)?)?;
    assert_eq!(entries[0]["question_number"], 5);
    assert_eq!(entries[0]["answer"], "D");
    assert_eq!(entries[1]["image_path"], "question_images/2018/national/q06.png");

    let rewritten = read_exam_result(&dir.path().join("parsed_exams/2018/national_parsed.json"))?;
    assert!(rewritten.questions.iter().all(|q| q.image_path.is_some()));
    Ok(())
}

/// A layout saved by the `layout` command parses like the live PDF
#[test]
fn test_layout_dump_file_parses() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = temp_config(dir.path());
    let dump = dir.path().join("layout.json");
    fs::write(&dump, serde_json::to_string_pretty(&synthetic_exam())?)?;

    let layout = DocumentLayout::from_json_file(&dump)?;
    assert_eq!(layout.page_count(), 4);

    let report = parse_layout(&config, 2018, ExamType::National, &layout)?;
    let numbers: Vec<u32> = report.result.questions.iter().map(|q| q.number).collect();
    assert_eq!(numbers, vec![5, 6]);
    assert_eq!(report.result.questions[1].correct_answer, "B");
    Ok(())
}

/// Integration test: parse a real exam when it is available locally
#[test]
fn test_parse_real_exam() -> Result<()> {
    let config = Config::default();
    let pdf = config.paths.pdf_path(2018, ExamType::National);
    if !pdf.exists() {
        eprintln!("Skipping test: {} not found", pdf.display());
        return Ok(());
    }

    let dir = tempfile::tempdir()?;
    let mut config = config;
    config.paths.parsed_dir = dir.path().join("parsed_exams");

    match parse_unit(&config, 2018, ExamType::National)? {
        UnitOutcome::Completed(report) => {
            assert!(report.result.total_questions > 0);
            let numbers: Vec<u32> = report.result.questions.iter().map(|q| q.number).collect();
            let mut sorted = numbers.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(numbers, sorted, "question numbers are sorted and unique");
        }
        UnitOutcome::Skipped { reason } => panic!("unexpected skip: {reason}"),
    }
    Ok(())
}
