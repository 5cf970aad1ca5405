pub mod core;
pub mod export;
pub mod parser;
pub mod pipeline;

pub use crate::core::geometry::{ContentSpan, PageGeometry, PositionedItem};
pub use crate::core::model::{DocumentReport, EmptySpaceResult, PageOutcome};
pub use crate::core::{analyze, collect, AnalysisError};
