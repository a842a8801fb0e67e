//! Yahoo Finance data fetcher
//!
//! Implements `MarketDataProvider` over Yahoo Finance's unofficial API:
//! - v7 quote / options for spot, expirations and chains
//! - v8 chart for daily bars and dividend events
//! - v10 quoteSummary for the earnings calendar, beta and market cap
//!
//! Note: Yahoo Finance data is delayed ~15 minutes and intended for
//! personal use.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::provider::MarketDataProvider;
use crate::core::{
    DividendInfo, OptionChain, OptionQuote, OptionType, PriceBar, RiskMetrics, ScreenerError,
    ScreenerResult,
};
use crate::models::{atr_percent, historical_volatility, DEFAULT_PERIOD};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// History window used for realized volatility and ATR
const RISK_LOOKBACK_DAYS: u32 = 31;

/// Yahoo Finance API client
pub struct YahooClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooClient {
    /// Client with a 10 second per-request timeout
    pub fn new() -> ScreenerResult<Self> {
        Self::with_timeout(Duration::from_secs(10))
    }

    pub fn with_timeout(timeout: Duration) -> ScreenerResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ScreenerError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the client at another host (proxies, recorded fixtures)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> ScreenerResult<T> {
        debug!("GET {}", url);
        self.client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| ScreenerError::Network(e.to_string()))?
            .json()
            .map_err(|e| ScreenerError::data(format!("Failed to parse {}: {}", what, e)))
    }

    fn options_page(
        &self,
        symbol: &str,
        expiry: Option<NaiveDate>,
    ) -> ScreenerResult<YahooOptionChainData> {
        let url = match expiry {
            Some(date) => format!(
                "{}/v7/finance/options/{}?date={}",
                self.base_url,
                symbol,
                date.and_time(NaiveTime::MIN).and_utc().timestamp()
            ),
            None => format!("{}/v7/finance/options/{}", self.base_url, symbol),
        };

        let response: YahooOptionsResponse = self.get_json(&url, "options")?;
        response
            .option_chain
            .result
            .into_iter()
            .next()
            .ok_or_else(|| ScreenerError::unavailable(symbol, "no options data returned"))
    }

    fn chart(
        &self,
        symbol: &str,
        lookback_days: u32,
        with_dividends: bool,
    ) -> ScreenerResult<YahooChartData> {
        let end = Utc::now();
        let start = end - chrono::Duration::days(i64::from(lookback_days));
        let mut url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d",
            self.base_url,
            symbol,
            start.timestamp(),
            end.timestamp()
        );
        if with_dividends {
            url.push_str("&events=div");
        }

        let response: YahooChartResponse = self.get_json(&url, "chart")?;
        response
            .chart
            .result
            .into_iter()
            .next()
            .ok_or_else(|| ScreenerError::data(format!("No chart data for {}", symbol)))
    }

    fn quote_summary(&self, symbol: &str, modules: &str) -> ScreenerResult<YahooSummaryData> {
        let url = format!(
            "{}/v10/finance/quoteSummary/{}?modules={}",
            self.base_url, symbol, modules
        );
        let response: YahooSummaryResponse = self.get_json(&url, "quote summary")?;
        response
            .quote_summary
            .result
            .into_iter()
            .next()
            .ok_or_else(|| ScreenerError::data(format!("No quote summary for {}", symbol)))
    }

    /// Convert Yahoo option data to our quote format
    fn convert_option_quote(
        data: &YahooOptionData,
        underlying: &str,
        expiry: NaiveDate,
        option_type: OptionType,
    ) -> Option<OptionQuote> {
        let strike = data.strike?;

        let mut quote = OptionQuote::new(underlying, expiry, strike, option_type);
        quote.bid = data.bid.unwrap_or(0.0);
        quote.ask = data.ask.unwrap_or(0.0);
        quote.last = data.last_price.unwrap_or(0.0);
        quote.volume = data.volume.unwrap_or(0).max(0) as u64;
        quote.open_interest = data.open_interest.unwrap_or(0).max(0) as u64;
        quote.implied_vol = data.implied_volatility;
        quote.delta = data.delta;
        quote.contract_symbol = data.contract_symbol.clone();

        Some(quote)
    }
}

fn timestamp_to_date(ts: f64) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts as i64, 0).map(|dt| dt.date_naive())
}

impl MarketDataProvider for YahooClient {
    fn current_price(&self, ticker: &str) -> ScreenerResult<f64> {
        let url = format!("{}/v7/finance/quote?symbols={}", self.base_url, ticker);
        let response: YahooQuoteResponse = self.get_json(&url, "quote")?;

        let price = response
            .quote_response
            .result
            .into_iter()
            .next()
            .and_then(|q| q.current_price.or(q.regular_market_price))
            .filter(|p| *p > 0.0)
            .ok_or_else(|| ScreenerError::unavailable(ticker, "no price"))?;

        Ok(price)
    }

    fn expirations(&self, ticker: &str) -> ScreenerResult<Vec<NaiveDate>> {
        let page = self.options_page(ticker, None)?;
        let mut expiries: Vec<NaiveDate> = page
            .expiration_dates
            .iter()
            .filter_map(|&ts| timestamp_to_date(ts as f64))
            .collect();
        expiries.sort();
        expiries.dedup();
        Ok(expiries)
    }

    fn option_chain(&self, ticker: &str, expiry: NaiveDate) -> ScreenerResult<OptionChain> {
        let page = self.options_page(ticker, Some(expiry))?;
        let mut chain = OptionChain::new();

        if let Some(options) = page.options.first() {
            for call in &options.calls {
                if let Some(quote) =
                    Self::convert_option_quote(call, ticker, expiry, OptionType::Call)
                {
                    chain.add_call(quote);
                }
            }
            for put in &options.puts {
                if let Some(quote) =
                    Self::convert_option_quote(put, ticker, expiry, OptionType::Put)
                {
                    chain.add_put(quote);
                }
            }
        }

        Ok(chain)
    }

    fn price_history(&self, ticker: &str, lookback_days: u32) -> ScreenerResult<Vec<PriceBar>> {
        Ok(self.chart(ticker, lookback_days, false)?.bars())
    }

    fn earnings_date(&self, ticker: &str) -> ScreenerResult<Option<NaiveDate>> {
        let summary = self.quote_summary(ticker, "calendarEvents")?;
        Ok(summary
            .calendar_events
            .and_then(|c| c.earnings)
            .and_then(|e| e.earnings_date.into_iter().find_map(|d| d.raw))
            .and_then(timestamp_to_date))
    }

    fn dividend_info(&self, ticker: &str) -> ScreenerResult<Option<DividendInfo>> {
        let summary = self.quote_summary(ticker, "calendarEvents")?;
        let Some(ex_date) = summary
            .calendar_events
            .and_then(|c| c.ex_dividend_date)
            .and_then(|d| d.raw)
            .and_then(timestamp_to_date)
        else {
            return Ok(None);
        };

        // Most recent paid amount stands in for the upcoming one
        let chart = self.chart(ticker, 365, true)?;
        let amount = chart
            .events
            .map(|e| e.dividends)
            .unwrap_or_default()
            .into_values()
            .max_by(|a, b| a.date.total_cmp(&b.date))
            .map(|d| d.amount);

        Ok(amount
            .filter(|a| *a > 0.0)
            .map(|amount| DividendInfo { ex_date, amount }))
    }

    fn risk_metrics(&self, ticker: &str) -> ScreenerResult<RiskMetrics> {
        let summary = self.quote_summary(ticker, "summaryDetail,defaultKeyStatistics")?;

        let beta = summary
            .summary_detail
            .as_ref()
            .and_then(|s| s.beta.as_ref())
            .and_then(|b| b.raw)
            .or_else(|| {
                summary
                    .default_key_statistics
                    .as_ref()
                    .and_then(|s| s.beta.as_ref())
                    .and_then(|b| b.raw)
            })
            .filter(|b| b.is_finite())
            .unwrap_or(1.0);
        let market_cap = summary
            .summary_detail
            .as_ref()
            .and_then(|s| s.market_cap.as_ref())
            .and_then(|m| m.raw)
            .unwrap_or(0.0);

        let bars = self.price_history(ticker, RISK_LOOKBACK_DAYS)?;
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

        Ok(RiskMetrics {
            beta,
            market_cap,
            hist_vol: historical_volatility(&closes),
            atr_pct: atr_percent(&bars, DEFAULT_PERIOD),
        })
    }
}

// Yahoo Finance API response structures

#[derive(Debug, Deserialize)]
struct YahooQuoteResponse {
    #[serde(rename = "quoteResponse")]
    quote_response: YahooQuoteResult,
}

#[derive(Debug, Deserialize)]
struct YahooQuoteResult {
    result: Vec<YahooQuoteData>,
}

#[derive(Debug, Deserialize)]
struct YahooQuoteData {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    #[serde(rename = "currentPrice")]
    current_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct YahooOptionsResponse {
    #[serde(rename = "optionChain")]
    option_chain: YahooOptionChain,
}

#[derive(Debug, Deserialize)]
struct YahooOptionChain {
    result: Vec<YahooOptionChainData>,
}

#[derive(Debug, Deserialize)]
struct YahooOptionChainData {
    #[serde(rename = "expirationDates", default)]
    expiration_dates: Vec<i64>,
    #[serde(default)]
    options: Vec<YahooOptions>,
}

#[derive(Debug, Deserialize)]
struct YahooOptions {
    #[serde(default)]
    calls: Vec<YahooOptionData>,
    #[serde(default)]
    puts: Vec<YahooOptionData>,
}

#[derive(Debug, Deserialize)]
struct YahooOptionData {
    #[serde(rename = "contractSymbol")]
    contract_symbol: Option<String>,
    strike: Option<f64>,
    bid: Option<f64>,
    ask: Option<f64>,
    #[serde(rename = "lastPrice")]
    last_price: Option<f64>,
    volume: Option<i64>,
    #[serde(rename = "openInterest")]
    open_interest: Option<i64>,
    #[serde(rename = "impliedVolatility")]
    implied_volatility: Option<f64>,
    delta: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartResult,
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    result: Vec<YahooChartData>,
}

#[derive(Debug, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    timestamp: Vec<i64>,
    events: Option<YahooChartEvents>,
    indicators: YahooIndicators,
}

impl YahooChartData {
    /// Bars with every OHLC field present, oldest first
    fn bars(&self) -> Vec<PriceBar> {
        let Some(q) = self.indicators.quote.first() else {
            return Vec::new();
        };
        let at = |v: &[Option<f64>], i: usize| v.get(i).copied().flatten();

        self.timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                Some(PriceBar {
                    date: timestamp_to_date(ts as f64)?,
                    open: at(&q.open, i)?,
                    high: at(&q.high, i)?,
                    low: at(&q.low, i)?,
                    close: at(&q.close, i)?,
                    volume: at(&q.volume, i).unwrap_or(0.0).max(0.0) as u64,
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct YahooChartEvents {
    #[serde(default)]
    dividends: HashMap<String, YahooDividendEvent>,
}

#[derive(Debug, Deserialize)]
struct YahooDividendEvent {
    amount: f64,
    date: f64,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct YahooSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: YahooSummaryResult,
}

#[derive(Debug, Deserialize)]
struct YahooSummaryResult {
    #[serde(default)]
    result: Vec<YahooSummaryData>,
}

#[derive(Debug, Deserialize)]
struct YahooSummaryData {
    #[serde(rename = "calendarEvents")]
    calendar_events: Option<YahooCalendarEvents>,
    #[serde(rename = "summaryDetail")]
    summary_detail: Option<YahooSummaryDetail>,
    #[serde(rename = "defaultKeyStatistics")]
    default_key_statistics: Option<YahooKeyStatistics>,
}

#[derive(Debug, Deserialize)]
struct YahooCalendarEvents {
    earnings: Option<YahooEarnings>,
    #[serde(rename = "exDividendDate")]
    ex_dividend_date: Option<YahooRaw>,
}

#[derive(Debug, Deserialize)]
struct YahooEarnings {
    #[serde(rename = "earningsDate", default)]
    earnings_date: Vec<YahooRaw>,
}

#[derive(Debug, Deserialize)]
struct YahooSummaryDetail {
    beta: Option<YahooRaw>,
    #[serde(rename = "marketCap")]
    market_cap: Option<YahooRaw>,
}

#[derive(Debug, Deserialize)]
struct YahooKeyStatistics {
    beta: Option<YahooRaw>,
}

/// `{"raw": 1.23, "fmt": "1.23"}`, or `{}` when Yahoo has no value
#[derive(Debug, Deserialize)]
struct YahooRaw {
    raw: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chart_bars() {
        let json = r#"{"chart":{"result":[{
            "timestamp":[1735828200,1735914600,1736173800],
            "events":{"dividends":{"1733000000":{"amount":0.485,"date":1733000000}}},
            "indicators":{"quote":[{
                "open":[61.0,62.0,null],
                "high":[62.0,63.0,64.0],
                "low":[60.5,61.5,62.5],
                "close":[61.5,62.5,63.5],
                "volume":[1000,2000,3000]
            }]}
        }],"error":null}}"#;

        let response: YahooChartResponse = serde_json::from_str(json).unwrap();
        let data = response.chart.result.into_iter().next().unwrap();
        let bars = data.bars();

        // Third bar has a null open and is skipped
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, 62.5);
        assert_eq!(bars[0].volume, 1000);

        let divs = data.events.unwrap().dividends;
        assert_eq!(divs.len(), 1);
    }

    #[test]
    fn test_parse_quote_summary() {
        let json = r#"{"quoteSummary":{"result":[{
            "calendarEvents":{
                "earnings":{"earningsDate":[{"raw":1753300800,"fmt":"2025-07-23"}]},
                "exDividendDate":{"raw":1749772800,"fmt":"2025-06-13"}
            },
            "summaryDetail":{"beta":{},"marketCap":{"raw":2.6e11}},
            "defaultKeyStatistics":{"beta":{"raw":0.45}}
        }],"error":null}}"#;

        let response: YahooSummaryResponse = serde_json::from_str(json).unwrap();
        let data = response.quote_summary.result.into_iter().next().unwrap();

        let calendar = data.calendar_events.unwrap();
        let earnings = calendar.earnings.unwrap().earnings_date[0].raw.unwrap();
        assert_eq!(
            timestamp_to_date(earnings),
            NaiveDate::from_ymd_opt(2025, 7, 23)
        );
        assert!(data.summary_detail.unwrap().beta.unwrap().raw.is_none());
        assert_eq!(data.default_key_statistics.unwrap().beta.unwrap().raw, Some(0.45));
    }

    #[test]
    fn test_convert_option_quote() {
        let json = r#"{"contractSymbol":"KO250620P00060000","strike":60.0,"bid":0.95,
            "ask":1.05,"lastPrice":1.0,"volume":150,"openInterest":-3,"impliedVolatility":0.21}"#;
        let data: YahooOptionData = serde_json::from_str(json).unwrap();
        let expiry = NaiveDate::from_ymd_opt(2025, 6, 20).unwrap();

        let quote =
            YahooClient::convert_option_quote(&data, "KO", expiry, OptionType::Put).unwrap();
        assert_eq!(quote.strike, 60.0);
        assert_eq!(quote.volume, 150);
        assert_eq!(quote.open_interest, 0);
        assert_eq!(quote.quoted_iv(), Some(0.21));
        assert!(quote.quoted_delta().is_none());
    }

    #[test]
    fn test_unreachable_host_is_network_error() {
        let client = YahooClient::new()
            .unwrap()
            .with_base_url("http://127.0.0.1:1");
        let err = client.current_price("KO").unwrap_err();
        assert!(matches!(err, ScreenerError::Network(_)));
        assert!(err.is_ticker_scoped());
    }

    #[test]
    #[ignore] // Requires network
    fn test_get_quote() {
        let client = YahooClient::new().unwrap();
        let price = client.current_price("KO").unwrap();

        assert!(price > 0.0);
        println!("KO price: {}", price);
    }

    #[test]
    #[ignore] // Requires network
    fn test_get_option_chain() {
        let client = YahooClient::new().unwrap();
        let expiries = client.expirations("KO").unwrap();

        if let Some(&expiry) = expiries.first() {
            let chain = client.option_chain("KO", expiry).unwrap();

            println!(
                "Chain for {}: {} calls, {} puts",
                expiry,
                chain.calls.len(),
                chain.puts.len()
            );

            assert!(!chain.puts.is_empty());
        }
    }

    #[test]
    #[ignore] // Requires network
    fn test_get_risk_metrics() {
        let client = YahooClient::new().unwrap();
        let metrics = client.risk_metrics("KO").unwrap();
        println!("KO risk: {:?}", metrics);
        assert!(metrics.hist_vol > 0.0);
    }
}
