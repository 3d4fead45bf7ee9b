use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use image::{DynamicImage, ImageReader};
use tempfile::TempDir;

/// Turns one PDF page into a bitmap. `scale` is pixels per PDF point.
pub trait Rasterizer {
    fn render_page(&self, page_number: usize, scale: f32) -> Result<DynamicImage>;
}

/// Renders pages of one PDF through poppler's `pdftoppm`.
#[derive(Debug)]
pub struct PageRenderer {
    pdf_path: PathBuf,
    work_dir: TempDir,
}

impl PageRenderer {
    pub fn new(pdf_path: &Path) -> Result<Self> {
        let work_dir = tempfile::tempdir().context("failed to create render work directory")?;
        Ok(Self {
            pdf_path: pdf_path.to_path_buf(),
            work_dir,
        })
    }
}

impl Rasterizer for PageRenderer {
    fn render_page(&self, page_number: usize, scale: f32) -> Result<DynamicImage> {
        let prefix = self.work_dir.path().join(format!("page_{page_number:03}"));
        let prefix_str = prefix
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("non-UTF8 output path not supported"))?;
        let dpi = (72.0 * scale).round() as u32;

        let status = Command::new("pdftoppm")
            .arg("-png")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg(page_number.to_string())
            .arg("-l")
            .arg(page_number.to_string())
            .arg("-singlefile")
            .arg(&self.pdf_path)
            .arg(prefix_str)
            .status()
            .with_context(|| "failed to invoke pdftoppm; is poppler-utils installed?")?;

        if !status.success() {
            anyhow::bail!("pdftoppm failed with status: {status}");
        }

        // -singlefile writes `<prefix>.png` without a page suffix
        let image_path = prefix.with_extension("png");
        let image = ImageReader::open(&image_path)
            .with_context(|| format!("expected rendered image not found: {}", image_path.display()))?
            .decode()
            .with_context(|| format!("failed to decode {}", image_path.display()))?;
        Ok(image)
    }
}
