use thiserror::Error;

/// Broken caller contracts detected while analyzing a page.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("page {page}: height must be a positive finite number, got {height}")]
    InvalidPageHeight { page: usize, height: f64 },

    #[error("page {page}: content span has non-finite coordinates ({topmost}, {bottommost})")]
    NonFiniteSpan {
        page: usize,
        topmost: f64,
        bottommost: f64,
    },
}
