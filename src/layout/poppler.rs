//! Layout extraction through poppler's command-line tools.
//!
//! `pdftotext -bbox` yields every word with its box; `pdftohtml -xml` yields the
//! embedded image rectangles. Both report coordinates in PDF points with the
//! origin at the top-left corner, which is the frame [`PageLayout`] uses.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::process::Command;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, warn};

use crate::core::error::LayoutError;
use crate::core::geometry::BBox;
use crate::layout::{DocumentLayout, PageLayout, Word};

#[derive(Debug, Default)]
pub struct PopplerLayout;

impl PopplerLayout {
    pub fn new() -> Self {
        Self
    }

    pub fn load(&self, pdf_path: &Path) -> Result<DocumentLayout, LayoutError> {
        let path_arg = pdf_path.to_string_lossy();
        let xhtml = run_tool("pdftotext", &["-q", "-bbox", &path_arg, "-"])?;
        let mut pages = parse_bbox_xhtml(&xhtml)?;

        match self.probe_images(pdf_path) {
            Ok(mut images) => {
                for page in &mut pages {
                    page.images = images.remove(&page.page_number).unwrap_or_default();
                }
            }
            Err(err) => warn!(
                "image probe failed for {}, treating pages as text-only: {err}",
                pdf_path.display()
            ),
        }

        debug!("loaded {} pages from {}", pages.len(), pdf_path.display());
        Ok(DocumentLayout::new(pages))
    }

    fn probe_images(&self, pdf_path: &Path) -> Result<HashMap<usize, Vec<BBox>>, LayoutError> {
        let work_dir = tempfile::tempdir()?;
        let prefix = work_dir.path().join("layout");
        let path_arg = pdf_path.to_string_lossy();
        let prefix_arg = prefix.to_string_lossy();
        run_tool("pdftohtml", &["-q", "-xml", "-zoom", "1", &path_arg, &prefix_arg])?;

        let xml = fs::read_to_string(prefix.with_extension("xml"))?;
        parse_pdftohtml_images(&xml)
    }
}

fn run_tool(tool: &'static str, args: &[&str]) -> Result<String, LayoutError> {
    let output = Command::new(tool)
        .args(args)
        .output()
        .map_err(|e| LayoutError::Tool {
            tool,
            message: format!("failed to invoke ({e}); is poppler-utils installed?"),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(LayoutError::Tool {
            tool,
            message: format!("{}: {}", output.status, stderr.trim()),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

pub(crate) fn parse_bbox_xhtml(xml: &str) -> Result<Vec<PageLayout>, LayoutError> {
    const TOOL: &str = "pdftotext";

    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut pages: Vec<PageLayout> = Vec::new();
    let mut open_word: Option<BBox> = None;
    let mut word_text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"page" => {
                let width = attr_f32(&e, b"width", TOOL)?;
                let height = attr_f32(&e, b"height", TOOL)?;
                pages.push(PageLayout::new(pages.len() + 1, width, height));
            }
            Event::Start(e) if e.name().as_ref() == b"word" => {
                open_word = Some(BBox::new(
                    attr_f32(&e, b"xMin", TOOL)?,
                    attr_f32(&e, b"yMin", TOOL)?,
                    attr_f32(&e, b"xMax", TOOL)?,
                    attr_f32(&e, b"yMax", TOOL)?,
                ));
                word_text.clear();
            }
            Event::Text(t) if open_word.is_some() => word_text.push_str(&t.unescape()?),
            Event::End(e) if e.name().as_ref() == b"word" => {
                let Some(bbox) = open_word.take() else {
                    continue;
                };
                let text = word_text.trim();
                if text.is_empty() {
                    continue;
                }
                let page = pages.last_mut().ok_or_else(|| LayoutError::Malformed {
                    tool: TOOL,
                    message: "word outside of a page element".to_string(),
                })?;
                page.words.push(Word {
                    text: text.to_string(),
                    bbox,
                });
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(pages)
}

pub(crate) fn parse_pdftohtml_images(xml: &str) -> Result<HashMap<usize, Vec<BBox>>, LayoutError> {
    const TOOL: &str = "pdftohtml";

    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    reader.check_end_names(false);

    let mut images: HashMap<usize, Vec<BBox>> = HashMap::new();
    let mut current_page: Option<usize> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"page" => {
                current_page = Some(attr_f32(&e, b"number", TOOL)? as usize);
            }
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"image" => {
                let Some(page) = current_page else {
                    continue;
                };
                let left = attr_f32(&e, b"left", TOOL)?;
                let top = attr_f32(&e, b"top", TOOL)?;
                let width = attr_f32(&e, b"width", TOOL)?;
                let height = attr_f32(&e, b"height", TOOL)?;
                images
                    .entry(page)
                    .or_default()
                    .push(BBox::new(left, top, left + width, top + height));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(images)
}

fn attr_f32(element: &BytesStart<'_>, key: &[u8], tool: &'static str) -> Result<f32, LayoutError> {
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() != key {
            continue;
        }
        let value = attr.unescape_value()?;
        return value.trim().parse::<f32>().map_err(|_| LayoutError::Malformed {
            tool,
            message: format!(
                "attribute {} has non-numeric value {value:?}",
                String::from_utf8_lossy(key)
            ),
        });
    }

    Err(LayoutError::Malformed {
        tool,
        message: format!(
            "<{}> lacks attribute {}",
            String::from_utf8_lossy(element.name().as_ref()),
            String::from_utf8_lossy(key)
        ),
    })
}
