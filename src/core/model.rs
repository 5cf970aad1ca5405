use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::geometry::{ContentSpan, PageGeometry, PositionedItem};

/// Everything a document source knows about one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContent {
    /// 1-based.
    pub page_number: usize,
    pub geometry: PageGeometry,
    pub items: Vec<PositionedItem>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EmptySpaceResult {
    pub page_number: usize,
    pub top_percent: f64,
    pub bottom_percent: f64,
    pub content_span: Option<ContentSpan>,
}

impl EmptySpaceResult {
    pub fn is_empty_page(&self) -> bool {
        self.content_span.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PageOutcome {
    Analyzed {
        geometry: PageGeometry,
        result: EmptySpaceResult,
    },
    Failed {
        page_number: usize,
        reason: String,
    },
}

impl PageOutcome {
    pub fn page_number(&self) -> usize {
        match self {
            PageOutcome::Analyzed { result, .. } => result.page_number,
            PageOutcome::Failed { page_number, .. } => *page_number,
        }
    }

    pub fn result(&self) -> Option<&EmptySpaceResult> {
        match self {
            PageOutcome::Analyzed { result, .. } => Some(result),
            PageOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub source: PathBuf,
    pub pages: Vec<PageOutcome>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DocumentSummary {
    pub analyzed: usize,
    pub empty: usize,
    pub failed: usize,
    /// Means over pages with content; `None` when there are none.
    pub mean_top_percent: Option<f64>,
    pub mean_bottom_percent: Option<f64>,
}

impl DocumentReport {
    pub fn summary(&self) -> DocumentSummary {
        let results: Vec<&EmptySpaceResult> =
            self.pages.iter().filter_map(PageOutcome::result).collect();
        let with_content: Vec<&EmptySpaceResult> = results
            .iter()
            .copied()
            .filter(|r| !r.is_empty_page())
            .collect();

        let mean = |f: fn(&EmptySpaceResult) -> f64| {
            if with_content.is_empty() {
                None
            } else {
                let total: f64 = with_content.iter().map(|r| f(r)).sum();
                Some(total / with_content.len() as f64)
            }
        };

        DocumentSummary {
            analyzed: results.len(),
            empty: results.len() - with_content.len(),
            failed: self.pages.len() - results.len(),
            mean_top_percent: mean(|r| r.top_percent),
            mean_bottom_percent: mean(|r| r.bottom_percent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn analyzed(page_number: usize, top: f64, bottom: f64, empty: bool) -> PageOutcome {
        PageOutcome::Analyzed {
            geometry: PageGeometry::new(600.0, 800.0),
            result: EmptySpaceResult {
                page_number,
                top_percent: top,
                bottom_percent: bottom,
                content_span: (!empty).then(|| ContentSpan::new(0.0, 1.0)),
            },
        }
    }

    #[test]
    fn summary_skips_empty_and_failed_pages_in_means() {
        let report = DocumentReport {
            source: PathBuf::from("doc.pdf"),
            pages: vec![
                analyzed(1, 80.0, 90.0, false),
                analyzed(2, 100.0, 100.0, true),
                PageOutcome::Failed {
                    page_number: 3,
                    reason: "boom".to_string(),
                },
                analyzed(4, 90.0, 70.0, false),
            ],
        };

        assert_eq!(
            report.summary(),
            DocumentSummary {
                analyzed: 3,
                empty: 1,
                failed: 1,
                mean_top_percent: Some(85.0),
                mean_bottom_percent: Some(80.0),
            }
        );
    }

    #[test]
    fn summary_of_blank_document_has_no_means() {
        let report = DocumentReport {
            source: PathBuf::from("blank.pdf"),
            pages: vec![analyzed(1, 100.0, 100.0, true)],
        };
        let summary = report.summary();
        assert_eq!(summary.empty, 1);
        assert_eq!(summary.mean_top_percent, None);
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_string(&PageOutcome::Failed {
            page_number: 2,
            reason: "bad xobject".to_string(),
        })
        .unwrap();
        assert!(json.contains(r#""status":"failed""#));
    }
}
