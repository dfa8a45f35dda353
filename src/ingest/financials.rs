use anyhow::Result;

use crate::dart::api::{fetch_statement, FinancialApi};
use crate::dart::financials::compute_financials;
use crate::dart::report::ReportKind;
use crate::search::{schema, SearchIndex};
use crate::utils::progress::ProgressTracker;

/// Upper bound on companies returned by the corp-code aggregation.
pub const MAX_COMPANIES: usize = 10_000;

#[derive(Debug, Clone)]
pub struct EnrichParams {
    pub index: String,
    pub business_year: String,
    pub report_code: String,
}

impl EnrichParams {
    pub fn new(business_year: &str, report_code: &str) -> Self {
        Self {
            index: ReportKind::EquityRegistration.index_name().to_string(),
            business_year: business_year.to_string(),
            report_code: report_code.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichStats {
    pub companies: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub documents_updated: u64,
}

/// Fetches statements for every company in the index and stores the
/// derived figures on each of its documents. A failed mapping update is
/// fatal; failures for single companies are only counted.
pub async fn enrich_financials(
    store: &dyn SearchIndex,
    api: &dyn FinancialApi,
    params: &EnrichParams,
    progress: &ProgressTracker,
) -> Result<EnrichStats> {
    store
        .put_mapping(&params.index, &schema::financials_mapping())
        .await?;

    let corp_codes = store
        .distinct_values(&params.index, "corp_code", MAX_COMPANIES)
        .await?;
    let mut stats = EnrichStats {
        companies: corp_codes.len(),
        ..EnrichStats::default()
    };
    log::info!("Enriching {} companies in {}", corp_codes.len(), params.index);
    progress.start(corp_codes.len() as u64, "companies");

    for corp_code in corp_codes.iter().filter(|c| !c.is_empty()) {
        match enrich_company(store, api, params, corp_code).await {
            Ok(updated) => {
                stats.succeeded += 1;
                stats.documents_updated += updated;
            }
            Err(e) => {
                log::error!("Failed to enrich {}: {:#}", corp_code, e);
                stats.failed += 1;
            }
        }
        progress.increment(1);
    }
    progress.finish("done");
    Ok(stats)
}

async fn enrich_company(
    store: &dyn SearchIndex,
    api: &dyn FinancialApi,
    params: &EnrichParams,
    corp_code: &str,
) -> Result<u64> {
    let lines = fetch_statement(api, corp_code, &params.business_year, &params.report_code).await?;
    let financials = compute_financials(&lines);
    log::debug!("Financials for {}: {:?}", corp_code, financials);
    let updated = store
        .update_by_term(
            &params.index,
            "corp_code",
            corp_code,
            "financials",
            &serde_json::to_value(&financials)?,
        )
        .await?;
    Ok(updated)
}
