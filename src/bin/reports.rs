use anyhow::Result;
use colored::Colorize;
use darter::core::config::AppConfig;
use darter::dart::industry::IndustryCodes;
use darter::ingest::reports::ingest_reports;
use darter::search::OpenSearchClient;
use darter::utils::jsonl::JsonlWriter;
use darter::utils::progress::IngestProgress;
use darter::utils::retry::RetryPolicy;
use indicatif::MultiProgress;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "darter-reports", about = "Index DART XML filings into per-kind report indices")]
struct Opt {
    /// Root of the report tree (1분기, 3분기, 반기, 사업, 증권)
    #[structopt(long, parse(from_os_str), env = "DARTER_REPORT_DIR")]
    report_dir: Option<PathBuf>,

    /// Industry code table (corp_code, induty_code)
    #[structopt(long, parse(from_os_str), env = "DARTER_INDUSTRY_CSV")]
    industry_csv: Option<PathBuf>,

    /// Also write every record as NDJSON to this file
    #[structopt(long, parse(from_os_str), env = "DARTER_OUTPUT")]
    output: Option<PathBuf>,
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

    let mut config = AppConfig::from_env().unwrap_or_else(|e| fail(format!("{:#}", e)));
    config.report_dir = opt.report_dir.unwrap_or(config.report_dir);
    config.industry_csv = opt.industry_csv.unwrap_or(config.industry_csv);
    config.output = opt.output.or(config.output);

    if !config.report_dir.is_dir() {
        fail(format!("the directory {:?} does not exist", config.report_dir));
    }
    let industry = IndustryCodes::from_path(&config.industry_csv)
        .unwrap_or_else(|e| fail(format!("{:#}", e)));
    log::info!("Loaded {} industry codes", industry.len());

    let retry = RetryPolicy::new(config.index.max_retries, Duration::from_secs(1));
    let store = OpenSearchClient::new(&config.index, retry)?;
    let mut output = match &config.output {
        Some(path) => Some(JsonlWriter::create(path)?),
        None => None,
    };

    let multi = Arc::new(MultiProgress::new());
    let progress = IngestProgress::new(Some(&multi));
    let stats = ingest_reports(
        &config.report_dir,
        &store,
        &industry,
        output.as_mut(),
        &progress,
    )
    .await
    .unwrap_or_else(|e| fail(format!("{:#}", e)));
    if let Some(writer) = output {
        writer.finish()?;
    }

    println!();
    println!("{}", "Ingestion complete".green().bold());
    println!("  files:       {}", stats.files);
    println!("  indexed:     {}", stats.indexed.to_string().green());
    println!("  failed:      {}", stats.index_failed.to_string().red());
    println!("  skipped:     {}", stats.skipped.to_string().yellow());
    println!("  unparseable: {}", stats.parse_failed.to_string().red());
    for (folder, count) in &stats.per_folder {
        println!("  {:<6} {}", folder.cyan(), count);
    }
    Ok(())
}
