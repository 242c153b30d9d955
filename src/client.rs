use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{token_looks_valid, AppConfig};
use crate::models::{
    sort_bars_ascending, Announcement, BalanceSheet, CashflowStatement, DailyBar, DailyBasic,
    DataTable, FinaIndicator, IncomeStatement, KlinePeriod, NewsItem, RealtimeInfo,
    ResearchReport, StockBasic,
};
use crate::services::cache::ResponseCache;
use crate::utils::date::{days_ago_compact, today_compact};

/// Request parameters as sent in the wire payload. BTreeMap keeps the key
/// order stable, which the response cache relies on for its file names.
pub type Params = BTreeMap<String, Value>;

/// Vendor application error code for invalid tokens and missing permissions
pub const AUTH_ERROR_CODE: i64 = 2002;

/// How many calendar days back to look when asking for the newest bar
const LATEST_PRICE_WINDOW_DAYS: i64 = 15;

#[derive(Debug, thiserror::Error)]
pub enum TushareError {
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("api error {code}: {msg}")]
    Api { code: i64, msg: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("no data for {0}")]
    NoData(String),
    #[error("{api_name} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        api_name: String,
        attempts: u32,
        last_error: String,
    },
    #[error("TUSHARE_TOKEN is not set or malformed")]
    MissingToken,
}

impl TushareError {
    /// Authentication failures are fatal to the calling command
    pub fn is_auth(&self) -> bool {
        matches!(self, TushareError::Auth(_) | TushareError::MissingToken)
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<DataTable>,
}

/// Whether a vendor error is the auth/permission class
fn is_auth_error(code: i64, msg: &str) -> bool {
    code == AUTH_ERROR_CODE || msg.to_lowercase().contains("token")
}

/// Insert a present-only string parameter
pub fn put_opt(params: &mut Params, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        params.insert(key.to_string(), Value::from(value));
    }
}

/// Thin client for the vendor's HTTP API: one POST endpoint, JSON in and
/// out, bounded retry with jittered backoff, optional on-disk response
/// cache keyed by request parameters.
pub struct TushareClient {
    http: Client,
    base_url: String,
    token: String,
    retry_times: u32,
    cache: Option<ResponseCache>,
}

impl TushareClient {
    pub fn new(token: &str) -> Result<Self, TushareError> {
        Self::with_timeout(token, Duration::from_secs(30), 3)
    }

    pub fn with_timeout(
        token: &str,
        timeout: Duration,
        retry_times: u32,
    ) -> Result<Self, TushareError> {
        if !token_looks_valid(token) {
            return Err(TushareError::MissingToken);
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: crate::config::DEFAULT_API_URL.to_string(),
            token: token.to_string(),
            retry_times: retry_times.max(1),
            cache: None,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, TushareError> {
        let token = config.token.as_deref().ok_or(TushareError::MissingToken)?;
        let client = Self::with_timeout(token, config.timeout, config.retry_times)?;
        Ok(client.with_base_url(&config.api_url))
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    fn build_payload(&self, api_name: &str, params: &Params) -> Value {
        serde_json::json!({
            "api_name": api_name,
            "token": self.token,
            "params": params,
            "fields": "",
        })
    }

    /// Call an endpoint, going through the response cache when one is attached
    pub async fn query(&self, api_name: &str, params: &Params) -> Result<DataTable, TushareError> {
        if let Some(cache) = &self.cache {
            if let Some(table) = cache.load(api_name, params) {
                debug!("{} served from cache ({} rows)", api_name, table.len());
                return Ok(table);
            }
        }

        let table = self.make_request(api_name, params).await?;

        if let Some(cache) = &self.cache {
            cache.store(api_name, params, &table);
        }
        Ok(table)
    }

    async fn make_request(
        &self,
        api_name: &str,
        params: &Params,
    ) -> Result<DataTable, TushareError> {
        let payload = self.build_payload(api_name, params);
        let mut last_error: Option<String> = None;

        for attempt in 0..self.retry_times {
            if attempt > 0 {
                let delay =
                    Duration::from_secs_f64(2.0_f64.powi(attempt as i32 - 1) + rand::random::<f64>());
                let delay = delay.min(Duration::from_secs(60));
                debug!(
                    "{} retrying in {:.1}s (attempt {}/{})",
                    api_name,
                    delay.as_secs_f64(),
                    attempt + 1,
                    self.retry_times
                );
                sleep(delay).await;
            }

            let response = self.http.post(&self.base_url).json(&payload).send().await;

            match response {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        match resp.json::<ApiResponse>().await {
                            Ok(body) => return self.unpack(api_name, body),
                            Err(e) => {
                                last_error = Some(e.to_string());
                                continue;
                            }
                        }
                    } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS
                        || status.is_server_error()
                    {
                        last_error = Some(format!("http status {}", status));
                        continue;
                    } else {
                        return Err(TushareError::InvalidResponse(format!(
                            "http status {}",
                            status
                        )));
                    }
                }
                Err(e) => {
                    last_error = Some(e.to_string());
                    continue;
                }
            }
        }

        Err(TushareError::RetriesExhausted {
            api_name: api_name.to_string(),
            attempts: self.retry_times,
            last_error: last_error.unwrap_or_else(|| "unknown error".to_string()),
        })
    }

    // Application-level errors are never retried: auth failures are fatal,
    // other codes are surfaced as labeled errors, empty tables are success.
    fn unpack(&self, api_name: &str, body: ApiResponse) -> Result<DataTable, TushareError> {
        if body.code != 0 {
            let msg = body.msg.unwrap_or_default();
            if is_auth_error(body.code, &msg) {
                return Err(TushareError::Auth(msg));
            }
            return Err(TushareError::Api {
                code: body.code,
                msg,
            });
        }

        match body.data {
            Some(table) if !table.is_empty() => {
                info!("{} returned {} rows", api_name, table.len());
                Ok(table)
            }
            Some(table) => {
                warn!("{} returned an empty result", api_name);
                Ok(table)
            }
            None => {
                warn!("{} returned no data section", api_name);
                Ok(DataTable::empty())
            }
        }
    }

    /// Stock universe. `list_status` defaults to listed ("L").
    pub async fn stock_basic(
        &self,
        list_status: Option<&str>,
        exchange: Option<&str>,
        market: Option<&str>,
    ) -> Result<Vec<StockBasic>, TushareError> {
        let mut params = Params::new();
        params.insert(
            "list_status".into(),
            Value::from(list_status.unwrap_or("L")),
        );
        put_opt(&mut params, "exchange", exchange);
        put_opt(&mut params, "market", market);

        let table = self.query("stock_basic", &params).await?;
        Ok(table.decode()?)
    }

    /// Listing info for a single code
    pub async fn stock_basic_one(
        &self,
        ts_code: &str,
    ) -> Result<Option<StockBasic>, TushareError> {
        let mut params = Params::new();
        params.insert("ts_code".into(), Value::from(ts_code));

        let table = self.query("stock_basic", &params).await?;
        let mut rows: Vec<StockBasic> = table.decode()?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    /// OHLCV history for one code, oldest bar first
    pub async fn kline(
        &self,
        ts_code: &str,
        period: KlinePeriod,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Vec<DailyBar>, TushareError> {
        let mut params = Params::new();
        params.insert("ts_code".into(), Value::from(ts_code));
        put_opt(&mut params, "start_date", start_date);
        put_opt(&mut params, "end_date", end_date);

        let table = self.query(period.api_name(), &params).await?;
        let mut bars: Vec<DailyBar> = table.decode()?;
        sort_bars_ascending(&mut bars);
        Ok(bars)
    }

    pub async fn daily(
        &self,
        ts_code: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Vec<DailyBar>, TushareError> {
        self.kline(ts_code, KlinePeriod::Daily, start_date, end_date)
            .await
    }

    pub async fn weekly(
        &self,
        ts_code: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Vec<DailyBar>, TushareError> {
        self.kline(ts_code, KlinePeriod::Weekly, start_date, end_date)
            .await
    }

    pub async fn monthly(
        &self,
        ts_code: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Vec<DailyBar>, TushareError> {
        self.kline(ts_code, KlinePeriod::Monthly, start_date, end_date)
            .await
    }

    /// Per-day valuation snapshot, either per code or per trade date
    pub async fn daily_basic(
        &self,
        ts_code: Option<&str>,
        trade_date: Option<&str>,
    ) -> Result<Vec<DailyBasic>, TushareError> {
        let mut params = Params::new();
        put_opt(&mut params, "ts_code", ts_code);
        put_opt(&mut params, "trade_date", trade_date);

        let table = self.query("daily_basic", &params).await?;
        Ok(table.decode()?)
    }

    pub async fn income_statement(
        &self,
        ts_code: &str,
        period: Option<&str>,
    ) -> Result<Vec<IncomeStatement>, TushareError> {
        let table = self.statement("income", ts_code, period).await?;
        Ok(table.decode()?)
    }

    pub async fn balance_sheet(
        &self,
        ts_code: &str,
        period: Option<&str>,
    ) -> Result<Vec<BalanceSheet>, TushareError> {
        let table = self.statement("balancesheet", ts_code, period).await?;
        Ok(table.decode()?)
    }

    pub async fn cashflow_statement(
        &self,
        ts_code: &str,
        period: Option<&str>,
    ) -> Result<Vec<CashflowStatement>, TushareError> {
        let table = self.statement("cashflow", ts_code, period).await?;
        Ok(table.decode()?)
    }

    // Consolidated statements only (report_type 1)
    async fn statement(
        &self,
        api_name: &str,
        ts_code: &str,
        period: Option<&str>,
    ) -> Result<DataTable, TushareError> {
        let mut params = Params::new();
        params.insert("ts_code".into(), Value::from(ts_code));
        params.insert("report_type".into(), Value::from("1"));
        put_opt(&mut params, "period", period);
        self.query(api_name, &params).await
    }

    pub async fn financial_indicator(
        &self,
        ts_code: &str,
        period: Option<&str>,
    ) -> Result<Vec<FinaIndicator>, TushareError> {
        let mut params = Params::new();
        params.insert("ts_code".into(), Value::from(ts_code));
        put_opt(&mut params, "period", period);

        let table = self.query("fina_indicator", &params).await?;
        Ok(table.decode()?)
    }

    /// Flash news, newest first as the vendor serves them
    pub async fn news(
        &self,
        src: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
        limit: u32,
    ) -> Result<Vec<NewsItem>, TushareError> {
        let mut params = Params::new();
        params.insert("limit".into(), Value::from(limit));
        put_opt(&mut params, "src", src);
        put_opt(&mut params, "start_date", start_date);
        put_opt(&mut params, "end_date", end_date);

        let table = self.query("news", &params).await?;
        Ok(table.decode()?)
    }

    pub async fn announcements(
        &self,
        ts_code: Option<&str>,
        ann_date: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
        year: Option<&str>,
        limit: u32,
    ) -> Result<Vec<Announcement>, TushareError> {
        let mut params = Params::new();
        params.insert("limit".into(), Value::from(limit));
        put_opt(&mut params, "ts_code", ts_code);
        put_opt(&mut params, "ann_date", ann_date);
        put_opt(&mut params, "start_date", start_date);
        put_opt(&mut params, "end_date", end_date);
        put_opt(&mut params, "year", year);

        let table = self.query("anns", &params).await?;
        Ok(table.decode()?)
    }

    pub async fn research_reports(
        &self,
        ts_code: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
        limit: u32,
    ) -> Result<Vec<ResearchReport>, TushareError> {
        let mut params = Params::new();
        params.insert("limit".into(), Value::from(limit));
        put_opt(&mut params, "ts_code", ts_code);
        put_opt(&mut params, "start_date", start_date);
        put_opt(&mut params, "end_date", end_date);

        let table = self.query("report", &params).await?;
        Ok(table.decode()?)
    }

    /// Most recent bar for a code, looking back a trailing calendar window
    pub async fn latest_price(&self, ts_code: &str) -> Result<Option<DailyBar>, TushareError> {
        let start = days_ago_compact(LATEST_PRICE_WINDOW_DAYS);
        let end = today_compact();
        let bars = self.daily(ts_code, Some(&start), Some(&end)).await?;
        Ok(bars.into_iter().last())
    }

    /// Listing info combined with the newest bar and derived change figures
    pub async fn realtime_info(&self, ts_code: &str) -> Result<RealtimeInfo, TushareError> {
        let basic = self
            .stock_basic_one(ts_code)
            .await?
            .ok_or_else(|| TushareError::NoData(ts_code.to_string()))?;
        let latest = self.latest_price(ts_code).await?;
        if latest.is_none() {
            warn!("{} has no recent trading data", ts_code);
        }
        Ok(RealtimeInfo::new(&basic, latest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_TOKEN: &str = "0123456789abcdef0123456789abcdef01234567";

    fn response(code: i64, msg: Option<&str>, data: Option<DataTable>) -> ApiResponse {
        ApiResponse {
            code,
            msg: msg.map(String::from),
            data,
        }
    }

    #[test]
    fn test_client_creation_validates_token() {
        assert!(TushareClient::new(TEST_TOKEN).is_ok());
        assert!(matches!(
            TushareClient::new("short"),
            Err(TushareError::MissingToken)
        ));
    }

    #[test]
    fn test_auth_error_classification() {
        assert!(is_auth_error(2002, "抱歉，您没有访问该接口的权限"));
        assert!(is_auth_error(-1, "token不对，请确认"));
        assert!(!is_auth_error(-1, "exceeded the daily limit"));
    }

    #[test]
    fn test_payload_shape() {
        let client = TushareClient::new(TEST_TOKEN).unwrap();
        let mut params = Params::new();
        params.insert("ts_code".into(), Value::from("000001.SZ"));

        let payload = client.build_payload("daily", &params);
        assert_eq!(payload["api_name"], "daily");
        assert_eq!(payload["token"], TEST_TOKEN);
        assert_eq!(payload["params"]["ts_code"], "000001.SZ");
        assert_eq!(payload["fields"], "");
    }

    #[test]
    fn test_put_opt_skips_none() {
        let mut params = Params::new();
        put_opt(&mut params, "exchange", None);
        put_opt(&mut params, "market", Some("主板"));
        assert!(!params.contains_key("exchange"));
        assert_eq!(params["market"], "主板");
    }

    #[test]
    fn test_unpack_auth_failure_is_fatal() {
        let client = TushareClient::new(TEST_TOKEN).unwrap();
        let err = client
            .unpack("daily", response(2002, Some("token无效"), None))
            .unwrap_err();
        assert!(err.is_auth());
    }

    #[test]
    fn test_unpack_api_error_is_labeled() {
        let client = TushareClient::new(TEST_TOKEN).unwrap();
        let err = client
            .unpack("daily", response(-1, Some("rate limited"), None))
            .unwrap_err();
        match err {
            TushareError::Api { code, msg } => {
                assert_eq!(code, -1);
                assert_eq!(msg, "rate limited");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unpack_empty_result_is_empty_table() {
        let client = TushareClient::new(TEST_TOKEN).unwrap();
        let table = client
            .unpack(
                "daily",
                response(0, None, Some(DataTable::new(vec!["ts_code".into()], vec![]))),
            )
            .unwrap();
        assert!(table.is_empty());

        let missing = client.unpack("daily", response(0, None, None)).unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_retry_stops_after_configured_attempts() {
        // Nothing listens on the discard port, so every attempt fails fast
        let client = TushareClient::with_timeout(TEST_TOKEN, Duration::from_secs(1), 2)
            .unwrap()
            .with_base_url("http://127.0.0.1:9");

        let err = client.query("daily", &Params::new()).await.unwrap_err();
        match err {
            TushareError::RetriesExhausted {
                api_name, attempts, ..
            } => {
                assert_eq!(api_name, "daily");
                assert_eq!(attempts, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_retry_floor_is_one_attempt() {
        let client = TushareClient::with_timeout(TEST_TOKEN, Duration::from_secs(1), 0).unwrap();
        assert_eq!(client.retry_times, 1);
    }
}
