pub mod timestamp;
pub mod level;
pub mod payload;
pub mod parser;
pub mod observer;
pub mod sections;
pub mod plan;
pub mod correlation;
pub mod aggregate;
pub mod gantt;
pub mod analysis;
pub mod query;
pub mod input;

pub use analysis::{analyze, AnalysisResult};
