use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use strum::{Display, EnumIter};
use url::Url;

use super::financials::AccountLine;
use crate::core::config::DartConfig;
use crate::utils::retry::RetryPolicy;

/// Status code of a successful API response.
pub const STATUS_OK: &str = "000";

/// Which statement set to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum StatementBasis {
    #[strum(serialize = "CFS")]
    Consolidated,
    #[strum(serialize = "OFS")]
    Separate,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub list: Vec<AccountLine>,
}

impl ApiResponse {
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

#[async_trait]
pub trait FinancialApi: Send + Sync {
    async fn fetch(
        &self,
        corp_code: &str,
        business_year: &str,
        report_code: &str,
        basis: StatementBasis,
    ) -> Result<ApiResponse>;
}

/// Client for the single-company full financial statement endpoint.
pub struct DartApiClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    retry: RetryPolicy,
}

impl DartApiClient {
    pub fn new(config: &DartConfig, retry: RetryPolicy) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        let client = Client::builder()
            .timeout(config.timeout)
            .gzip(true)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: config.api_url.clone(),
            api_key,
            retry,
        })
    }

    fn request_url(&self, corp_code: &str, year: &str, report_code: &str, basis: StatementBasis) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("crtfc_key", &self.api_key)
            .append_pair("corp_code", corp_code)
            .append_pair("bsns_year", year)
            .append_pair("reprt_code", report_code)
            .append_pair("fs_div", &basis.to_string());
        url
    }
}

#[async_trait]
impl FinancialApi for DartApiClient {
    async fn fetch(
        &self,
        corp_code: &str,
        business_year: &str,
        report_code: &str,
        basis: StatementBasis,
    ) -> Result<ApiResponse> {
        let url = self.request_url(corp_code, business_year, report_code, basis);
        let label = format!("{} statement for {}", basis, corp_code);
        let client = &self.client;
        let url = &url;

        self.retry
            .run(&label, move || async move {
                log::debug!("Requesting {} statement for {}", basis, corp_code);
                let response = client
                    .get(url.as_str())
                    .header(reqwest::header::ACCEPT, mime::APPLICATION_JSON.as_ref())
                    .send()
                    .await?;

                log::debug!("Response status: {}", response.status());
                if !response.status().is_success() {
                    return Err(anyhow!(
                        "HTTP request failed with status: {}",
                        response.status()
                    ));
                }
                let body = response.json::<ApiResponse>().await?;
                Ok(body)
            })
            .await
    }
}

/// Consolidated statement first; the separate one when the consolidated
/// request does not succeed. `Err` once both have failed.
pub async fn fetch_statement(
    api: &dyn FinancialApi,
    corp_code: &str,
    business_year: &str,
    report_code: &str,
) -> Result<Vec<AccountLine>> {
    let mut last_status = String::new();
    for basis in [StatementBasis::Consolidated, StatementBasis::Separate] {
        let response = api
            .fetch(corp_code, business_year, report_code, basis)
            .await?;
        if response.is_ok() {
            return Ok(response.list);
        }
        log::debug!(
            "No {} statement for {}: {} {}",
            basis,
            corp_code,
            response.status,
            response.message
        );
        last_status = format!("{} {}", response.status, response.message);
    }
    Err(anyhow!(
        "No financial statement for {}: {}",
        corp_code,
        last_status.trim()
    ))
}


#[cfg(test)]
mod tests {
    use super::fake::FakeApi;
    use super::*;
    use std::time::Duration;

    fn revenue() -> Vec<AccountLine> {
        vec![AccountLine {
            account_name: "매출액".to_string(),
            statement_division: "CIS".to_string(),
            current_amount: Some("100".to_string()),
            prior_amount: None,
        }]
    }

    #[tokio::test]
    async fn test_consolidated_first() {
        let api = FakeApi::default().with("001", StatementBasis::Consolidated, revenue());
        let lines = fetch_statement(&api, "001", "2024", "11011").await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(api.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_falls_back_to_separate() {
        let api = FakeApi::default().with("002", StatementBasis::Separate, revenue());
        let lines = fetch_statement(&api, "002", "2024", "11011").await.unwrap();
        assert_eq!(lines, revenue());
        let calls = api.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                ("002".to_string(), "CFS".to_string()),
                ("002".to_string(), "OFS".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_gives_up_after_both() {
        let api = FakeApi::default();
        let err = fetch_statement(&api, "003", "2024", "11011").await.unwrap_err();
        assert!(err.to_string().contains("013"));
    }

    #[test]
    fn test_request_url() {
        let config = DartConfig {
            api_key: Some("key".to_string()),
            api_url: Url::parse("https://opendart.fss.or.kr/api/fnlttSinglAcntAll.json").unwrap(),
            business_year: "2024".to_string(),
            report_code: "11011".to_string(),
            timeout: Duration::from_secs(10),
        };
        let client = DartApiClient::new(&config, RetryPolicy::none()).unwrap();
        let url = client.request_url("00126380", "2024", "11011", StatementBasis::Separate);
        assert_eq!(
            url.query(),
            Some("crtfc_key=key&corp_code=00126380&bsns_year=2024&reprt_code=11011&fs_div=OFS")
        );
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"status":"000","message":"정상","list":[{"account_nm":"자산총계","sj_div":"BS","thstrm_amount":"1,000"}]}"#;
        let response: ApiResponse = serde_json::from_str(body).unwrap();
        assert!(response.is_ok());
        assert_eq!(response.list[0].current_amount.as_deref(), Some("1,000"));
        assert_eq!(response.list[0].prior_amount, None);
    }
}
