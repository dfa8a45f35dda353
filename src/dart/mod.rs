pub mod api;
pub mod financials;
pub mod industry;
pub mod parsing;
pub mod report;

pub use api::{fetch_statement, DartApiClient, FinancialApi, StatementBasis};
pub use financials::{compute_financials, Financials};
pub use industry::{IndustryCodes, IndustryLookup};
pub use report::ReportKind;
