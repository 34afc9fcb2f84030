//! Analysis modules.
//!
//! The aggregator holds the core statistics; insights and the review plan
//! build on it, and `dashboard` assembles everything into one report.

pub mod aggregator;
pub mod dashboard;
pub mod insights;
pub mod plan;

pub use dashboard::{build_dashboard, AnalysisOptions};
