use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::core::geometry::{BBox, PageGeometry};

#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    /// Top-down page coordinates, as poppler reports them.
    pub bbox: BBox,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WordPage {
    pub geometry: PageGeometry,
    pub words: Vec<Word>,
}

/// Extracts word boxes with `pdftotext -bbox`.
#[derive(Debug, Clone)]
pub struct WordExtractor {
    binary: PathBuf,
}

impl Default for WordExtractor {
    fn default() -> Self {
        Self::new(PathBuf::from("pdftotext"))
    }
}

impl WordExtractor {
    pub fn new(binary: PathBuf) -> Self {
        Self { binary }
    }

    pub fn extract(&self, pdf_path: &Path) -> Result<Vec<WordPage>> {
        let output = Command::new(&self.binary)
            .arg("-bbox")
            .arg("-enc")
            .arg("UTF-8")
            .arg(pdf_path)
            .arg("-")
            .output()
            .with_context(|| {
                format!(
                    "failed to invoke {}; is poppler-utils installed?",
                    self.binary.display()
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("pdftotext failed with status {}: {}", output.status, stderr.trim());
        }

        let xhtml = String::from_utf8_lossy(&output.stdout);
        parse_bbox_xhtml(&xhtml)
            .with_context(|| format!("failed to read word boxes for {}", pdf_path.display()))
    }
}

/// Parses the XHTML document written by `pdftotext -bbox`.
///
/// Every `<page width height>` element opens a new page; `<word xMin yMin xMax
/// yMax>` elements inside it carry one word each.
pub fn parse_bbox_xhtml(xhtml: &str) -> Result<Vec<WordPage>> {
    let mut reader = Reader::from_str(xhtml);
    reader.trim_text(true);

    let mut pages: Vec<WordPage> = Vec::new();
    let mut pending: Option<BBox> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"page" => pages.push(WordPage {
                    geometry: page_geometry(&e)?,
                    words: Vec::new(),
                }),
                b"word" => pending = Some(word_bbox(&e)?),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"page" => pages.push(WordPage {
                    geometry: page_geometry(&e)?,
                    words: Vec::new(),
                }),
                b"word" => push_word(&mut pages, word_bbox(&e)?, String::new())?,
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if let Some(bbox) = pending.take() {
                    let text = e
                        .unescape()
                        .map(|t| t.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&e).into_owned());
                    push_word(&mut pages, bbox, text)?;
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"word" {
                    if let Some(bbox) = pending.take() {
                        push_word(&mut pages, bbox, String::new())?;
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                anyhow::bail!(
                    "malformed pdftotext output at byte {}: {e}",
                    reader.buffer_position()
                );
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(pages)
}

fn push_word(pages: &mut [WordPage], bbox: BBox, text: String) -> Result<()> {
    let page = pages
        .last_mut()
        .ok_or_else(|| anyhow::anyhow!("<word> found outside of any <page>"))?;
    page.words.push(Word { text, bbox });
    Ok(())
}

fn page_geometry(e: &BytesStart<'_>) -> Result<PageGeometry> {
    Ok(PageGeometry::new(
        float_attr(e, b"width")?,
        float_attr(e, b"height")?,
    ))
}

fn word_bbox(e: &BytesStart<'_>) -> Result<BBox> {
    Ok(BBox::new(
        float_attr(e, b"xMin")?,
        float_attr(e, b"yMin")?,
        float_attr(e, b"xMax")?,
        float_attr(e, b"yMax")?,
    ))
}

fn float_attr(e: &BytesStart<'_>, key: &[u8]) -> Result<f64> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            let value = String::from_utf8_lossy(&attr.value);
            return value.trim().parse::<f64>().with_context(|| {
                format!(
                    "attribute {} is not a number: {value}",
                    String::from_utf8_lossy(key)
                )
            });
        }
    }
    anyhow::bail!(
        "<{}> is missing attribute {}",
        String::from_utf8_lossy(e.name().as_ref()),
        String::from_utf8_lossy(key)
    )
}
