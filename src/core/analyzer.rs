use crate::core::error::AnalysisError;
use crate::core::geometry::{ContentSpan, PageGeometry};
use crate::core::model::EmptySpaceResult;

/// Percentage reported for both edges of a page without content.
pub const EMPTY_PAGE_PERCENT: f64 = 100.0;

/// Computes the top and bottom empty-space percentages of one page.
///
/// A page without a content span is fully empty on both edges. Otherwise
/// `top = (height - topmost) / height * 100` and `bottom = bottommost / height * 100`.
/// Results are not clamped: content lying outside the page box yields values
/// outside `[0, 100]`, which is how extraction anomalies surface.
///
/// The page height must be positive and finite; the span, when present, must
/// have finite coordinates.
pub fn analyze(
    page_number: usize,
    geometry: &PageGeometry,
    span: Option<ContentSpan>,
) -> Result<EmptySpaceResult, AnalysisError> {
    let height = geometry.height;
    if !height.is_finite() || height <= 0.0 {
        return Err(AnalysisError::InvalidPageHeight {
            page: page_number,
            height,
        });
    }

    let Some(span) = span else {
        return Ok(EmptySpaceResult {
            page_number,
            top_percent: EMPTY_PAGE_PERCENT,
            bottom_percent: EMPTY_PAGE_PERCENT,
            content_span: None,
        });
    };

    if !span.topmost.is_finite() || !span.bottommost.is_finite() {
        return Err(AnalysisError::NonFiniteSpan {
            page: page_number,
            topmost: span.topmost,
            bottommost: span.bottommost,
        });
    }

    Ok(EmptySpaceResult {
        page_number,
        top_percent: (height - span.topmost) / height * 100.0,
        bottom_percent: span.bottommost / height * 100.0,
        content_span: Some(span),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn page(height: f64) -> PageGeometry {
        PageGeometry::new(612.0, height)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn letter_sized_example() {
        let result = analyze(1, &page(800.0), Some(ContentSpan::new(100.0, 700.0))).unwrap();
        assert_eq!(result.top_percent, 87.5);
        assert_eq!(result.bottom_percent, 87.5);
        assert_eq!(result.content_span, Some(ContentSpan::new(100.0, 700.0)));
    }

    #[test]
    fn content_touching_both_edges() {
        let result = analyze(2, &page(1000.0), Some(ContentSpan::new(0.0, 1000.0))).unwrap();
        assert_eq!((result.top_percent, result.bottom_percent), (100.0, 100.0));
    }

    #[test]
    fn empty_page_is_fully_empty() {
        let result = analyze(3, &page(842.0), None).unwrap();
        assert_eq!(
            result,
            EmptySpaceResult {
                page_number: 3,
                top_percent: 100.0,
                bottom_percent: 100.0,
                content_span: None,
            }
        );
        assert!(result.is_empty_page());
    }

    #[test]
    fn content_below_page_is_not_clamped() {
        let result = analyze(4, &page(500.0), Some(ContentSpan::new(50.0, 600.0))).unwrap();
        assert_close(result.bottom_percent, 120.0);
        assert_eq!(format!("{:.2}", result.bottom_percent), "120.00");
    }

    #[test]
    fn content_above_page_is_not_clamped() {
        let result = analyze(4, &page(500.0), Some(ContentSpan::new(-50.0, 100.0))).unwrap();
        assert_close(result.top_percent, 110.0);
    }

    #[test]
    fn rejects_non_positive_height() {
        for height in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            let err = analyze(7, &page(height), None).unwrap_err();
            assert!(matches!(err, AnalysisError::InvalidPageHeight { page: 7, .. }));
        }
    }

    #[test]
    fn rejects_non_finite_span() {
        let err = analyze(1, &page(800.0), Some(ContentSpan::new(f64::NAN, 10.0))).unwrap_err();
        assert!(matches!(err, AnalysisError::NonFiniteSpan { page: 1, .. }));
    }

    proptest! {
        #[test]
        fn empty_pages_ignore_geometry(width in 1.0f64..5000.0, height in 1.0f64..5000.0) {
            let result = analyze(1, &PageGeometry::new(width, height), None).unwrap();
            prop_assert_eq!(result.top_percent, 100.0);
            prop_assert_eq!(result.bottom_percent, 100.0);
        }

        #[test]
        fn analysis_is_repeatable(
            height in 1.0f64..5000.0,
            top in -100.0f64..5000.0,
            bottom in -100.0f64..5000.0,
        ) {
            let span = Some(ContentSpan::new(top, bottom));
            let first = analyze(5, &page(height), span).unwrap();
            let second = analyze(5, &page(height), span).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn top_percent_grows_as_content_starts_higher(
            height in 100.0f64..5000.0,
            top in 1.0f64..100.0,
            shift in 0.5f64..50.0,
            bottom in 100.0f64..5000.0,
        ) {
            let lower = analyze(1, &page(height), Some(ContentSpan::new(top, bottom))).unwrap();
            let higher =
                analyze(1, &page(height), Some(ContentSpan::new(top - shift, bottom))).unwrap();
            prop_assert!(higher.top_percent > lower.top_percent);
            prop_assert_eq!(higher.bottom_percent, lower.bottom_percent);
        }

        #[test]
        fn boundary_edges_map_to_one_hundred(height in 1.0f64..5000.0) {
            let result =
                analyze(1, &page(height), Some(ContentSpan::new(0.0, height))).unwrap();
            prop_assert_eq!(result.top_percent, 100.0);
            prop_assert_eq!(result.bottom_percent, 100.0);
        }
    }
}
