pub mod financials;
pub mod guide;
pub mod reports;

pub use financials::{enrich_financials, EnrichParams, EnrichStats};
pub use guide::{ingest_guide, GuideStats, GUIDE_INDEX};
pub use reports::{ingest_reports, ReportStats, REPORT_ROOTS};
