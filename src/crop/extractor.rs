use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use image::{DynamicImage, GenericImageView};
use tracing::{debug, info, warn};

use crate::core::config::{CropConfig, PathsConfig};
use crate::core::geometry::BBox;
use crate::core::model::{ExamResult, ExamType, IssueKind, ParsingIssue, Question};
use crate::crop::bbox::BoxInferencer;
use crate::crop::renderer::Rasterizer;
use crate::layout::LayoutSource;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionSummary {
    pub extracted: usize,
    pub failed: usize,
    pub output_dir: PathBuf,
    /// Mean size of the written PNGs, `None` when nothing was written.
    pub average_kb: Option<f64>,
}

/// Second pass: crops every parsed question out of its rendered page.
pub struct ImageExtractor<R: Rasterizer> {
    rasterizer: R,
    inferencer: BoxInferencer,
    render_scale: f32,
    output_dir: PathBuf,
    paths: PathsConfig,
    exam_year: u32,
    exam_type: ExamType,
    pages: HashMap<usize, DynamicImage>,
}

impl<R: Rasterizer> ImageExtractor<R> {
    /// Images land in `<image_dir>/<year>/<type>/`.
    pub fn new(rasterizer: R, config: &CropConfig, paths: &PathsConfig, result: &ExamResult) -> Self {
        Self {
            rasterizer,
            inferencer: BoxInferencer::new(config),
            render_scale: config.render_scale,
            output_dir: paths.image_output_dir(result.exam_year, result.exam_type),
            paths: paths.clone(),
            exam_year: result.exam_year,
            exam_type: result.exam_type,
            pages: HashMap::new(),
        }
    }

    /// Crop all questions of `result`, returning it with `image_path` set on
    /// every question that produced an image. Questions whose crop cannot be
    /// inferred keep no image and gain a parsing issue instead.
    pub fn extract(
        &mut self,
        layout: &dyn LayoutSource,
        mut result: ExamResult,
    ) -> Result<(ExamResult, ExtractionSummary)> {
        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("failed to create {}", self.output_dir.display()))?;
        info!(
            "extracting images for {} questions into {}",
            result.questions.len(),
            self.output_dir.display()
        );

        // Results of an earlier image pass are replaced, not accumulated.
        result.parsing_issues.retain(|issue| issue.kind != IssueKind::AnchorNotFound);

        let mut sizes_kb = Vec::new();
        let mut failed = 0;
        for question in &mut result.questions {
            question.image_path = None;
            let page = layout
                .page(question.page_number)
                .with_context(|| format!("question {} refers to a missing page", question.number))?;

            let bbox = match self.inferencer.infer(page, question.number) {
                Ok(bbox) => bbox,
                Err(err) => {
                    warn!("{err}");
                    result
                        .parsing_issues
                        .push(ParsingIssue::review(IssueKind::AnchorNotFound, Some(question.number), err.to_string()));
                    failed += 1;
                    continue;
                }
            };

            let size_kb = self.save_crop(question, &bbox)?;
            debug!("Q{} written ({size_kb:.1} KB)", question.number);
            sizes_kb.push(size_kb);
        }

        let average_kb = if sizes_kb.is_empty() {
            None
        } else {
            Some(sizes_kb.iter().sum::<f64>() / sizes_kb.len() as f64)
        };
        let summary = ExtractionSummary {
            extracted: sizes_kb.len(),
            failed,
            output_dir: self.output_dir.clone(),
            average_kb,
        };
        Ok((result, summary))
    }

    fn save_crop(&mut self, question: &mut Question, bbox: &BBox) -> Result<f64> {
        let scale = self.render_scale;
        let page_image = self.page_image(question.page_number)?;
        let cropped = crop_scaled(page_image, bbox, scale).with_context(|| {
            format!(
                "crop for question {} falls outside the rendered page {}",
                question.number, question.page_number
            )
        })?;

        let file_name = format!("q{:02}.png", question.number);
        let output_path = self.output_dir.join(&file_name);
        cropped
            .save(&output_path)
            .with_context(|| format!("failed to write {}", output_path.display()))?;

        let bytes = fs::metadata(&output_path)?.len();
        question.image_path = Some(self.paths.image_link(self.exam_year, self.exam_type, &file_name));
        Ok(bytes as f64 / 1024.0)
    }

    fn page_image(&mut self, page_number: usize) -> Result<&DynamicImage> {
        if !self.pages.contains_key(&page_number) {
            let image = self
                .rasterizer
                .render_page(page_number, self.render_scale)
                .with_context(|| format!("failed to render page {page_number}"))?;
            self.pages.insert(page_number, image);
        }
        self.pages
            .get(&page_number)
            .ok_or_else(|| anyhow::anyhow!("page {page_number} missing from render cache"))
    }
}

/// Cut a page-space box out of a page rendered at `scale`, clamped to the
/// bitmap. `None` when nothing of the box lies on the bitmap.
pub fn crop_scaled(page_image: &DynamicImage, bbox: &BBox, scale: f32) -> Option<DynamicImage> {
    let scaled = bbox.scale(scale);
    let (img_width, img_height) = page_image.dimensions();
    let x0 = scaled.x0.max(0.0) as u32;
    let y0 = scaled.y0.max(0.0) as u32;
    let x1 = scaled.x1.min(img_width as f32) as u32;
    let y1 = scaled.y1.min(img_height as f32) as u32;

    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(page_image.crop_imm(x0, y0, x1 - x0, y1 - y0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use crate::core::model::{Choices, Confidence};
    use crate::layout::{DocumentLayout, PageLayout, Word};
    use pretty_assertions::assert_eq;

    struct BlankPages {
        renders: Cell<usize>,
    }

    impl Rasterizer for BlankPages {
        fn render_page(&self, _page_number: usize, scale: f32) -> Result<DynamicImage> {
            self.renders.set(self.renders.get() + 1);
            Ok(DynamicImage::new_rgb8((612.0 * scale) as u32, (792.0 * scale) as u32))
        }
    }

    fn question(number: u32) -> Question {
        Question {
            number,
            text: format!("Question {number}"),
            choices: Choices::new(),
            correct_answer: "A".to_string(),
            page_number: 3,
            has_images: false,
            parsing_confidence: Confidence::Low,
            image_path: None,
        }
    }

    fn layout() -> DocumentLayout {
        let mut page = PageLayout::new(3, 612.0, 792.0);
        page.words = vec![
            Word::new("1.", 40.0, 100.0, 50.0, 110.0),
            Word::new("2.", 40.0, 300.0, 50.0, 310.0),
            Word::new("(D)", 40.0, 400.0, 55.0, 410.0),
        ];
        DocumentLayout::new(vec![PageLayout::new(1, 612.0, 792.0), PageLayout::new(2, 612.0, 792.0), page])
    }

    #[test]
    fn crops_each_question_and_records_failures() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let image_dir = dir.path().join("question_images");
        let paths = PathsConfig {
            image_dir: image_dir.clone(),
            ..PathsConfig::default()
        };
        let result = ExamResult::new(2018, ExamType::Local, vec![question(1), question(2), question(3)], vec![]);

        let rasterizer = BlankPages { renders: Cell::new(0) };
        let mut extractor = ImageExtractor::new(rasterizer, &CropConfig::default(), &paths, &result);
        let (result, summary) = extractor.extract(&layout(), result)?;

        assert_eq!(summary.extracted, 2);
        assert_eq!(summary.failed, 1);
        assert!(summary.average_kb.is_some());
        assert_eq!(extractor.rasterizer.renders.get(), 1);

        // Recorded relative to the image directory even though it is absolute here.
        assert_eq!(
            result.questions[0].image_path.as_deref(),
            Some("question_images/2018/local/q01.png")
        );
        assert!(image_dir.join("2018/local/q02.png").exists());
        assert_eq!(result.questions[2].image_path, None);

        assert_eq!(result.parsing_issues.len(), 1);
        assert_eq!(result.parsing_issues[0].kind, IssueKind::AnchorNotFound);
        assert_eq!(result.parsing_issues[0].question_number, Some(3));

        let saved = image::open(image_dir.join("2018/local/q01.png"))?;
        // (36, 95)..(300, 297) at 3x
        assert_eq!(saved.dimensions(), (792, 606));
        Ok(())
    }

    #[test]
    fn second_pass_replaces_earlier_crop_issues() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let result = ExamResult::new(2018, ExamType::Local, vec![question(3)], vec![]);
        let mut extractor = ImageExtractor::new(
            BlankPages { renders: Cell::new(0) },
            &CropConfig::default(),
            &PathsConfig {
                image_dir: dir.path().join("question_images"),
                ..PathsConfig::default()
            },
            &result,
        );

        let (once, _) = extractor.extract(&layout(), result)?;
        let (twice, _) = extractor.extract(&layout(), once)?;
        assert_eq!(twice.parsing_issues.len(), 1);
        Ok(())
    }

    #[test]
    fn crop_is_clamped_to_bitmap() {
        let page = DynamicImage::new_rgb8(300, 300);
        let cropped = crop_scaled(&page, &BBox::new(50.0, 50.0, 200.0, 200.0), 1.0).unwrap();
        assert_eq!(cropped.dimensions(), (150, 150));

        let clamped = crop_scaled(&page, &BBox::new(250.0, 250.0, 400.0, 400.0), 1.0).unwrap();
        assert_eq!(clamped.dimensions(), (50, 50));

        assert!(crop_scaled(&page, &BBox::new(400.0, 400.0, 500.0, 500.0), 1.0).is_none());
    }
}
