use crate::core::geometry::{ContentSpan, PositionedItem};

/// Folds the vertical extents of a page's content into one span.
///
/// Returns `None` when there is nothing on the page. Text and image items are
/// treated alike and their order does not matter.
pub fn collect<'a, I>(items: I) -> Option<ContentSpan>
where
    I: IntoIterator<Item = &'a PositionedItem>,
{
    items
        .into_iter()
        .map(ContentSpan::from)
        .reduce(|acc, span| acc.merge(&span))
}

/// Merges spans gathered from separate sources of the same page.
pub fn merge_spans(a: Option<ContentSpan>, b: Option<ContentSpan>) -> Option<ContentSpan> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.merge(&b)),
        (a, b) => a.or(b),
    }
}
