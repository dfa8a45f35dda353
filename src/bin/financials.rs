use anyhow::Result;
use colored::Colorize;
use darter::core::config::AppConfig;
use darter::dart::api::DartApiClient;
use darter::ingest::financials::{enrich_financials, EnrichParams};
use darter::search::OpenSearchClient;
use darter::utils::progress::ProgressTracker;
use darter::utils::retry::RetryPolicy;
use indicatif::MultiProgress;
use std::sync::Arc;
use std::time::Duration;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "darter-financials", about = "Attach computed financial ratios to indexed filings")]
struct Opt {
    /// Business year requested from the API
    #[structopt(long, env = "DARTER_BUSINESS_YEAR")]
    year: Option<String>,

    /// Report code requested from the API (11011 = annual)
    #[structopt(long, env = "DARTER_REPORT_CODE")]
    report_code: Option<String>,
}

fn fail(message: String) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), message);
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();
    let opt = Opt::from_args();

    let config = AppConfig::from_env().unwrap_or_else(|e| fail(format!("{:#}", e)));
    let api = DartApiClient::new(&config.dart, RetryPolicy::new(1, Duration::from_millis(500)))
        .unwrap_or_else(|e| fail(format!("{:#}", e)));
    let retry = RetryPolicy::new(config.index.max_retries, Duration::from_secs(1));
    let store = OpenSearchClient::new(&config.index, retry)?;

    let params = EnrichParams::new(
        opt.year.as_deref().unwrap_or(&config.dart.business_year),
        opt.report_code.as_deref().unwrap_or(&config.dart.report_code),
    );
    let multi = Arc::new(MultiProgress::new());
    let progress = ProgressTracker::new(Some(&multi), "API", 0);

    let stats = enrich_financials(&store, &api, &params, &progress)
        .await
        .unwrap_or_else(|e| fail(format!("{:#}", e)));

    println!();
    println!("{}", "Financial enrichment complete".green().bold());
    println!("  companies: {}", stats.companies);
    println!("  succeeded: {}", stats.succeeded.to_string().green());
    println!("  failed:    {}", stats.failed.to_string().red());
    println!("  documents: {}", stats.documents_updated);
    Ok(())
}
