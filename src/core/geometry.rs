use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in whatever space the caller works in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BBox {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Smallest box containing every point. `None` for an empty slice.
    pub fn from_points(points: &[(f64, f64)]) -> Option<Self> {
        let (&(x, y), rest) = points.split_first()?;
        Some(rest.iter().fold(BBox::new(x, y, x, y), |acc, &(x, y)| {
            acc.union(&BBox::new(x, y, x, y))
        }))
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Image,
}

/// Vertical extent of one piece of page content.
///
/// Coordinates are top-down: the origin sits at the top edge of the page and
/// values grow towards the bottom. Sources working in another convention go
/// through [`YAxis::to_top_down`] before building items.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PositionedItem {
    pub kind: ContentKind,
    pub top: f64,
    pub bottom: f64,
}

impl PositionedItem {
    pub fn new(kind: ContentKind, top: f64, bottom: f64) -> Self {
        Self { kind, top, bottom }
    }

    pub fn text(top: f64, bottom: f64) -> Self {
        Self::new(ContentKind::Text, top, bottom)
    }

    pub fn image(top: f64, bottom: f64) -> Self {
        Self::new(ContentKind::Image, top, bottom)
    }
}

/// Orientation of the vertical axis a collaborator reports coordinates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YAxis {
    /// Origin at the top edge, y grows downward (poppler `-bbox`, rendered views).
    TopDown,
    /// Origin at the bottom edge, y grows upward (PDF user space).
    BottomUp,
}

impl YAxis {
    /// Maps the extent `[y0, y1]` onto top-down coordinates, returned as
    /// `(top, bottom)`. `page_top` is the y of the upper page edge in the
    /// source space and is only consulted for [`YAxis::BottomUp`].
    pub fn to_top_down(self, y0: f64, y1: f64, page_top: f64) -> (f64, f64) {
        match self {
            YAxis::TopDown => (y0, y1),
            YAxis::BottomUp => (page_top - y1, page_top - y0),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
}

impl PageGeometry {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Vertical band of a page occupied by content.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ContentSpan {
    pub topmost: f64,
    pub bottommost: f64,
}

impl ContentSpan {
    pub fn new(topmost: f64, bottommost: f64) -> Self {
        Self {
            topmost,
            bottommost,
        }
    }

    pub fn merge(&self, other: &Self) -> Self {
        Self {
            topmost: self.topmost.min(other.topmost),
            bottommost: self.bottommost.max(other.bottommost),
        }
    }

    pub fn height(&self) -> f64 {
        self.bottommost - self.topmost
    }
}

impl From<&PositionedItem> for ContentSpan {
    fn from(item: &PositionedItem) -> Self {
        Self::new(item.top, item.bottom)
    }
}
