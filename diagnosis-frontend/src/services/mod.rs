pub mod agents;
pub mod analysis;
pub mod ingestion;
pub mod metrics;
pub mod prompt;
pub mod renderer;

pub use analysis::run_analysis;
