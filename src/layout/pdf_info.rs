use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};

/// Document-level facts reported by poppler's `pdfinfo`.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfInfo {
    pub pages: usize,
    pub title: Option<String>,
    pub page_size: Option<String>,
}

impl PdfInfo {
    pub fn probe(pdf_path: &Path) -> Result<Self> {
        let output = Command::new("pdfinfo")
            .arg(pdf_path)
            .output()
            .with_context(|| format!("failed to invoke pdfinfo on {}", pdf_path.display()))?;

        if !output.status.success() {
            anyhow::bail!("pdfinfo failed with status: {}", output.status);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_pdfinfo(&stdout)
            .with_context(|| format!("unexpected pdfinfo output for {}", pdf_path.display()))
    }
}

fn parse_pdfinfo(stdout: &str) -> Result<PdfInfo> {
    let mut pages = None;
    let mut title = None;
    let mut page_size = None;

    for line in stdout.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Pages" => {
                let count: usize = value
                    .parse()
                    .with_context(|| format!("failed to parse page count from 'Pages:' line: {value}"))?;
                pages = Some(count);
            }
            "Title" if !value.is_empty() => title = Some(value.to_string()),
            "Page size" => page_size = Some(value.to_string()),
            _ => {}
        }
    }

    let pages = pages.context("pdfinfo output did not contain a 'Pages:' line")?;
    Ok(PdfInfo {
        pages,
        title,
        page_size,
    })
}
