pub mod image_locator;
pub mod pdf_reader;
pub mod poppler_source;
pub mod word_extractor;

pub use pdf_reader::PdfReader;
pub use poppler_source::PopplerSource;

use anyhow::Result;

use crate::core::model::PageContent;

/// Supplies page geometry and positioned content, one page at a time.
///
/// Items handed out must already be in top-down page coordinates. Pages are
/// 1-based and may be requested concurrently.
pub trait DocumentSource: Sync {
    fn page_count(&self) -> usize;

    fn load_page(&self, page_number: usize) -> Result<PageContent>;
}
