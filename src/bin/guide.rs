use anyhow::Result;
use colored::Colorize;
use darter::core::config::AppConfig;
use darter::ingest::guide::{ingest_guide, GUIDE_INDEX};
use darter::search::OpenSearchClient;
use darter::utils::jsonl::JsonlWriter;
use darter::utils::retry::RetryPolicy;
use std::path::PathBuf;
use std::time::Duration;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "darter-guide", about = "Index the risk disclosure guide into risk_standard")]
struct Opt {
    /// Text extracted from the guide PDF, one line per text line
    #[structopt(long, parse(from_os_str), env = "DARTER_GUIDE_PATH")]
    guide: Option<PathBuf>,

    /// Also write every entry as NDJSON to this file
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

    let config = AppConfig::from_env().unwrap_or_else(|e| fail(format!("{:#}", e)));
    let guide_path = opt.guide.unwrap_or(config.guide_path);
    if !guide_path.is_file() {
        fail(format!("the guide file {:?} does not exist", guide_path));
    }

    let retry = RetryPolicy::new(config.index.max_retries, Duration::from_secs(1));
    let store = OpenSearchClient::new(&config.index, retry)?;
    let mut output = match opt.output.or(config.output) {
        Some(path) => Some(JsonlWriter::create(&path)?),
        None => None,
    };

    let stats = ingest_guide(&guide_path, &store, output.as_mut())
        .await
        .unwrap_or_else(|e| fail(format!("{:#}", e)));
    if let Some(writer) = output {
        writer.finish()?;
    }

    println!(
        "{} {} entries into {}: {} ok, {} failed",
        "Indexed".green().bold(),
        stats.entries,
        GUIDE_INDEX.cyan(),
        stats.indexed.to_string().green(),
        stats.failed.to_string().red()
    );
    Ok(())
}
