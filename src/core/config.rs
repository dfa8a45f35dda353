use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Connection settings for the search cluster.
#[derive(Clone, Debug)]
pub struct IndexConfig {
    pub hosts: Vec<Url>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
    pub max_retries: u32,
}

/// Settings for the financial statement API.
#[derive(Clone, Debug)]
pub struct DartConfig {
    pub api_key: Option<String>,
    pub api_url: Url,
    pub business_year: String,
    pub report_code: String,
    pub timeout: Duration,
}

impl DartConfig {
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| anyhow!("DART_API_KEY environment variable not set"))
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub index: IndexConfig,
    pub dart: DartConfig,
    pub report_dir: PathBuf,
    pub guide_path: PathBuf,
    pub industry_csv: PathBuf,
    pub output: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let hosts = get_or("OS_HOSTS", "http://localhost:9200")
            .split(',')
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(|h| Url::parse(h).with_context(|| format!("Invalid OS_HOSTS entry: {}", h)))
            .collect::<Result<Vec<_>>>()?;
        if hosts.is_empty() {
            return Err(anyhow!("OS_HOSTS must name at least one host"));
        }

        let index = IndexConfig {
            hosts,
            username: get("OS_USER"),
            password: get("OS_PASS"),
            timeout: Duration::from_secs(parse_var(&get, "OS_TIMEOUT_SECS", 60)?),
            max_retries: parse_var(&get, "OS_MAX_RETRIES", 3)?,
        };

        let api_url = get_or(
            "DART_API_URL",
            "https://opendart.fss.or.kr/api/fnlttSinglAcntAll.json",
        );
        let dart = DartConfig {
            api_key: get("DART_API_KEY"),
            api_url: Url::parse(&api_url)
                .with_context(|| format!("Invalid DART_API_URL: {}", api_url))?,
            business_year: get_or("DARTER_BUSINESS_YEAR", "2024"),
            report_code: get_or("DARTER_REPORT_CODE", "11011"),
            timeout: Duration::from_secs(10),
        };

        Ok(Self {
            index,
            dart,
            report_dir: PathBuf::from(get_or("DARTER_REPORT_DIR", "./report")),
            guide_path: PathBuf::from(get_or("DARTER_GUIDE_PATH", "./standard/risk_guide.txt")),
            industry_csv: PathBuf::from(get_or(
                "DARTER_INDUSTRY_CSV",
                "./company_overview_codes.csv",
            )),
            output: get("DARTER_OUTPUT").map(PathBuf::from),
        })
    }
}

fn parse_var<G, T>(get: &G, key: &str, default: T) -> Result<T>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: {}", key, raw)),
        None => Ok(default),
    }
}
