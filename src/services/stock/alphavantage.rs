//! Alpha Vantage 股票接口实现
//!
//! 提供最新行情（GLOBAL_QUOTE）和日K线（TIME_SERIES_DAILY）
//! 对接 https://www.alphavantage.co/query

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::{Map, Value};

use super::MarketDataProvider;
use crate::config::ProviderConfig;
use crate::error::{Result, StockError};
use crate::models::{OhlcvRecord, OutputSize, Quote};

/// Alpha Vantage 默认接口地址
pub const ALPHA_VANTAGE_API: &str = "https://www.alphavantage.co/query";

const GLOBAL_QUOTE_KEY: &str = "Global Quote";
const DAILY_SERIES_KEY: &str = "Time Series (Daily)";

/// Alpha Vantage 客户端
///
/// API Key 和接口地址在构造时传入，不读取全局状态
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    /// HTTP 客户端
    client: Client,
    api_key: String,
    base_url: String,
}

impl AlphaVantageClient {
    /// 根据配置创建客户端
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
        })
    }

    /// 发送查询并做通用的错误检查
    async fn query(&self, function: &str, symbol: &str, extra: &[(&str, &str)]) -> Result<Value> {
        log::debug!("📡 请求 Alpha Vantage: {} function={} symbol={}", self.base_url, function, symbol);

        let mut params = vec![
            ("function", function),
            ("symbol", symbol),
            ("apikey", self.api_key.as_str()),
        ];
        params.extend_from_slice(extra);

        let response = self.client.get(&self.base_url).query(&params).send().await?;

        if !response.status().is_success() {
            return Err(StockError::ProviderStatus(response.status().as_u16()));
        }

        let text = response.text().await?;
        let data: Value = serde_json::from_str(&text)?;
        check_provider_message(&data, symbol)?;

        Ok(data)
    }
}

#[async_trait]
impl MarketDataProvider for AlphaVantageClient {
    async fn global_quote(&self, symbol: &str) -> Result<Quote> {
        let data = self.query("GLOBAL_QUOTE", symbol, &[]).await?;
        parse_global_quote(&data, symbol)
    }

    async fn daily_series(&self, symbol: &str, outputsize: OutputSize) -> Result<Vec<OhlcvRecord>> {
        let data = self
            .query("TIME_SERIES_DAILY", symbol, &[("outputsize", outputsize.as_str())])
            .await?;
        parse_daily_series(&data)
    }
}

/// 识别 Alpha Vantage 以 200 状态码返回的错误信息
///
/// - "Error Message": 无效调用，通常是代码不存在
/// - "Note": 免费额度限流
/// - "Information": 限流或权限提示
fn check_provider_message(data: &Value, symbol: &str) -> Result<()> {
    if data.get("Error Message").is_some() {
        return Err(StockError::UnknownSymbol(symbol.to_string()));
    }

    if let Some(note) = data.get("Note") {
        return Err(StockError::RateLimited(message_text(note)));
    }

    if let Some(info) = data.get("Information") {
        let text = message_text(info);
        let lower = text.to_lowercase();
        if lower.contains("rate limit") || lower.contains("requests per") || lower.contains("call frequency") {
            return Err(StockError::RateLimited(text));
        }
        return Err(StockError::Provider(text));
    }

    Ok(())
}

fn message_text(value: &Value) -> String {
    value
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string())
}

/// 解析 GLOBAL_QUOTE 响应
///
/// 格式: {"Global Quote": {"01. symbol": "AAPL", "05. price": "221.5300", ...}}
fn parse_global_quote(data: &Value, symbol: &str) -> Result<Quote> {
    let quote = data
        .get(GLOBAL_QUOTE_KEY)
        .and_then(Value::as_object)
        .ok_or_else(|| StockError::MalformedResponse(format!("缺少字段 {}", GLOBAL_QUOTE_KEY)))?;

    // 代码不存在时返回空对象
    if quote.is_empty() {
        return Err(StockError::UnknownSymbol(symbol.to_string()));
    }

    let price = parse_f64(quote, "05. price")?;
    let change = parse_f64(quote, "09. change")?;
    let volume = parse_u64(quote, "06. volume")?;
    let trading_day = parse_date(field(quote, "07. latest trading day")?)?;

    Ok(Quote {
        symbol: symbol.to_string(),
        price,
        change,
        change_percent: format_change_percent(price, change),
        volume,
        trading_day,
    })
}

/// 解析 TIME_SERIES_DAILY 响应，结果按日期升序
///
/// 格式: {"Time Series (Daily)": {"2025-03-26": {"1. open": "...", ...}, ...}}
fn parse_daily_series(data: &Value) -> Result<Vec<OhlcvRecord>> {
    let series = data
        .get(DAILY_SERIES_KEY)
        .and_then(Value::as_object)
        .ok_or_else(|| StockError::MalformedResponse(format!("缺少字段 {}", DAILY_SERIES_KEY)))?;

    let mut records = series
        .iter()
        .map(|(day, values)| {
            let values = values
                .as_object()
                .ok_or_else(|| StockError::MalformedResponse(format!("{} 的数据不是对象", day)))?;

            Ok(OhlcvRecord {
                date: parse_date(day)?,
                open: parse_f64(values, "1. open")?,
                high: parse_f64(values, "2. high")?,
                low: parse_f64(values, "3. low")?,
                close: parse_f64(values, "4. close")?,
                volume: parse_u64(values, "5. volume")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    records.sort_by_key(|r| r.date);
    Ok(records)
}

/// 由最新价和涨跌额推导涨跌幅，保留 4 位小数
pub fn format_change_percent(price: f64, change: f64) -> String {
    let previous_close = price - change;
    if previous_close == 0.0 {
        return "0.0000%".to_string();
    }
    format!("{:.4}%", change / previous_close * 100.0)
}

fn field<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| StockError::MalformedResponse(format!("缺少字段 {}", key)))
}

/// 解析数值字段，NaN 和无穷大同样视为格式错误
fn parse_f64(obj: &Map<String, Value>, key: &str) -> Result<f64> {
    let raw = field(obj, key)?;
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| StockError::MalformedResponse(format!("字段 {} 不是数字: {}", key, raw)))
}

fn parse_u64(obj: &Map<String, Value>, key: &str) -> Result<u64> {
    let raw = field(obj, key)?;
    raw.trim()
        .parse::<u64>()
        .map_err(|_| StockError::MalformedResponse(format!("字段 {} 不是整数: {}", key, raw)))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| StockError::MalformedResponse(format!("无法解析日期: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn quote_payload() -> Value {
        json!({
            "Global Quote": {
                "01. symbol": "AAPL",
                "02. open": "223.0000",
                "03. high": "224.1000",
                "04. low": "220.0800",
                "05. price": "221.5300",
                "06. volume": "58932401",
                "07. latest trading day": "2025-03-26",
                "08. previous close": "223.7400",
                "09. change": "-2.2100",
                "10. change percent": "-0.9877%"
            }
        })
    }

    #[test]
    fn test_parse_global_quote() {
        let quote = parse_global_quote(&quote_payload(), "AAPL").unwrap();

        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.price, 221.53);
        assert_eq!(quote.change, -2.21);
        assert_eq!(quote.volume, 58_932_401);
        assert_eq!(quote.trading_day, NaiveDate::from_ymd_opt(2025, 3, 26).unwrap());
        assert_eq!(quote.change_percent, "-0.9878%");
    }

    #[test]
    fn test_empty_global_quote_is_unknown_symbol() {
        let data = json!({ "Global Quote": {} });
        let err = parse_global_quote(&data, "NOPE").unwrap_err();
        assert!(matches!(err, StockError::UnknownSymbol(s) if s == "NOPE"));
    }

    #[test]
    fn test_malformed_quote_field_fails_whole_quote() {
        let mut data = quote_payload();
        data["Global Quote"]["06. volume"] = json!("lots");
        let err = parse_global_quote(&data, "AAPL").unwrap_err();
        assert!(matches!(err, StockError::MalformedResponse(_)));

        let mut data = quote_payload();
        data["Global Quote"].as_object_mut().unwrap().remove("05. price");
        assert!(matches!(
            parse_global_quote(&data, "AAPL"),
            Err(StockError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_daily_series_sorted_ascending() {
        let data = json!({
            "Meta Data": { "2. Symbol": "IBM" },
            "Time Series (Daily)": {
                "2025-03-26": { "1. open": "10.0", "2. high": "11.0", "3. low": "9.5", "4. close": "10.5", "5. volume": "300" },
                "2025-03-24": { "1. open": "9.0", "2. high": "9.8", "3. low": "8.9", "4. close": "9.6", "5. volume": "100" },
                "2025-03-25": { "1. open": "9.6", "2. high": "10.2", "3. low": "9.4", "4. close": "10.0", "5. volume": "200" }
            }
        });

        let records = parse_daily_series(&data).unwrap();
        let dates: Vec<String> = records.iter().map(|r| r.date.to_string()).collect();
        assert_eq!(dates, vec!["2025-03-24", "2025-03-25", "2025-03-26"]);
        assert_eq!(records[0].close, 9.6);
        assert_eq!(records[2].volume, 300);
    }

    #[test]
    fn test_non_finite_numbers_are_malformed() {
        for raw in ["NaN", "inf", "-inf", "infinity"] {
            let mut data = quote_payload();
            data["Global Quote"]["05. price"] = json!(raw);
            assert!(
                matches!(parse_global_quote(&data, "AAPL"), Err(StockError::MalformedResponse(_))),
                "price {} 应当被拒绝",
                raw
            );
        }

        let data = json!({
            "Time Series (Daily)": {
                "2025-03-25": { "1. open": "9.6", "2. high": "10.2", "3. low": "9.4", "4. close": "10.0", "5. volume": "200" },
                "2025-03-26": { "1. open": "10.0", "2. high": "11.0", "3. low": "9.5", "4. close": "NaN", "5. volume": "300" }
            }
        });
        assert!(matches!(
            parse_daily_series(&data),
            Err(StockError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_daily_series_empty() {
        let data = json!({ "Time Series (Daily)": {} });
        assert!(parse_daily_series(&data).unwrap().is_empty());
    }

    #[test]
    fn test_parse_daily_series_missing_key() {
        let data = json!({ "Meta Data": {} });
        assert!(matches!(
            parse_daily_series(&data),
            Err(StockError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_provider_messages() {
        let err = check_provider_message(
            &json!({ "Error Message": "Invalid API call. Please retry or visit the documentation" }),
            "XXXX",
        )
        .unwrap_err();
        assert!(matches!(err, StockError::UnknownSymbol(_)));

        let err = check_provider_message(
            &json!({ "Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute" }),
            "AAPL",
        )
        .unwrap_err();
        assert!(matches!(err, StockError::RateLimited(_)));

        let err = check_provider_message(
            &json!({ "Information": "We have detected your API key as demo and our standard API rate limit is 25 requests per day." }),
            "AAPL",
        )
        .unwrap_err();
        assert!(matches!(err, StockError::RateLimited(_)));

        let err = check_provider_message(
            &json!({ "Information": "The demo API key is for demo purposes only." }),
            "AAPL",
        )
        .unwrap_err();
        assert!(matches!(err, StockError::Provider(_)));

        assert!(check_provider_message(&quote_payload(), "AAPL").is_ok());
    }

    #[test]
    fn test_format_change_percent() {
        assert_eq!(format_change_percent(221.53, -2.21), "-0.9878%");
        assert_eq!(format_change_percent(110.0, 10.0), "10.0000%");
        assert_eq!(format_change_percent(5.0, 5.0), "0.0000%");
    }

    #[test]
    fn test_client_creation() {
        let config = ProviderConfig {
            api_key: "test_key".to_string(),
            ..ProviderConfig::default()
        };
        let client = AlphaVantageClient::new(&config).unwrap();
        assert_eq!(client.api_key, "test_key");
        assert_eq!(client.base_url, ALPHA_VANTAGE_API);
    }
}
