use anyhow::{Context, Result};
use log::{debug, info, warn};
use lopdf::{Document, ObjectId};
use std::collections::BTreeMap;
use std::path::Path;

use crate::core::geometry::{BBox, PositionedItem, YAxis};
use crate::core::model::PageContent;
use crate::parser::image_locator::{crop_box, locate_images, rotation};
use crate::parser::word_extractor::{WordExtractor, WordPage};
use crate::parser::DocumentSource;

/// Production document source: words from `pdftotext -bbox`, images from the
/// content streams parsed with `lopdf`.
///
/// Word boxes arrive top-down. Image placements are found in PDF user space
/// and flipped around the top of the CropBox, the box pdftotext measures
/// against, before they reach the core.
pub struct PopplerSource {
    word_pages: Vec<WordPage>,
    document: Document,
    page_ids: BTreeMap<u32, ObjectId>,
}

impl PopplerSource {
    pub fn open(path: &Path, extractor: &WordExtractor) -> Result<Self> {
        let word_pages = extractor.extract(path)?;
        let document = Document::load(path)
            .with_context(|| format!("failed to parse PDF: {}", path.display()))?;
        let page_ids = document.get_pages();

        if page_ids.len() != word_pages.len() {
            anyhow::bail!(
                "page count mismatch for {}: pdftotext saw {}, lopdf saw {}",
                path.display(),
                word_pages.len(),
                page_ids.len()
            );
        }

        info!(
            "opened {} ({} page(s))",
            path.display(),
            word_pages.len()
        );

        Ok(Self {
            word_pages,
            document,
            page_ids,
        })
    }

    fn image_items(&self, page_number: usize) -> Result<Vec<PositionedItem>> {
        let page_id = u32::try_from(page_number)
            .ok()
            .and_then(|n| self.page_ids.get(&n))
            .copied()
            .with_context(|| format!("page {page_number} has no page object"))?;

        let page_top = crop_box(&self.document, page_id)?.y1;
        let degrees = rotation(&self.document, page_id)?;
        if degrees != 0 {
            warn!("page {page_number}: /Rotate {degrees} is not applied to image placements");
        }
        let placements = locate_images(&self.document, page_id)
            .with_context(|| format!("failed to locate images on page {page_number}"))?;

        Ok(placements
            .iter()
            .map(|placement| image_item(placement, page_top))
            .collect())
    }
}

/// Converts an image box from PDF user space into a top-down content item.
pub fn image_item(placement: &BBox, page_top: f64) -> PositionedItem {
    let (top, bottom) = YAxis::BottomUp.to_top_down(placement.y0, placement.y1, page_top);
    PositionedItem::image(top, bottom)
}

impl DocumentSource for PopplerSource {
    fn page_count(&self) -> usize {
        self.word_pages.len()
    }

    fn load_page(&self, page_number: usize) -> Result<PageContent> {
        let word_page = page_number
            .checked_sub(1)
            .and_then(|idx| self.word_pages.get(idx))
            .with_context(|| {
                format!(
                    "page {page_number} is out of range (document has {} page(s))",
                    self.word_pages.len()
                )
            })?;

        let mut items: Vec<PositionedItem> = word_page
            .words
            .iter()
            .map(|word| {
                let (top, bottom) = YAxis::TopDown.to_top_down(word.bbox.y0, word.bbox.y1, 0.0);
                PositionedItem::text(top, bottom)
            })
            .collect();
        let text_count = items.len();
        items.extend(self.image_items(page_number)?);

        debug!(
            "page {page_number}: {text_count} word(s), {} image(s)",
            items.len() - text_count
        );

        Ok(PageContent {
            page_number,
            geometry: word_page.geometry,
            items,
        })
    }
}
