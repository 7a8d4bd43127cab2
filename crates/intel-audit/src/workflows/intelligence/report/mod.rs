mod summary;
pub mod views;

pub use summary::{group_thousands, ReportSynthesizer};
pub use views::{InsightView, MarketOpportunity, MarketReport};
