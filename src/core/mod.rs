pub mod analyzer;
pub mod error;
pub mod extent;
pub mod geometry;
pub mod model;

pub use analyzer::analyze;
pub use error::AnalysisError;
pub use extent::collect;
