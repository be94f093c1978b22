//! 股票相关接口
//!
//! - GET /quote/{symbol}
//! - GET /analyze/{symbol}
//! - GET /historical/{symbol}?outputsize=compact|full&limit=N

use actix_web::{
    error::{InternalError, QueryPayloadError},
    web, Error, HttpRequest, HttpResponse, Result,
};

use crate::error::StockError;
use crate::models::HistoricalQuery;
use crate::services::StockDataService;

/// 错误转成 {symbol, message} 响应体
fn error_response(symbol: &str, err: &StockError) -> HttpResponse {
    HttpResponse::build(err.status_code()).json(err.error_body(symbol))
}

/// 查询参数解析失败时同样返回 {symbol, message}
fn query_error(err: QueryPayloadError, req: &HttpRequest) -> Error {
    let symbol = req.match_info().get("symbol").unwrap_or_default();
    let response = error_response(symbol, &StockError::InvalidQuery(err.to_string()));
    InternalError::from_response(err, response).into()
}

pub async fn get_quote(
    service: web::Data<dyn StockDataService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let symbol = path.into_inner();

    match service.fetch_quote(&symbol).await {
        Ok(quote) => Ok(HttpResponse::Ok().json(quote)),
        Err(e) => Ok(error_response(&symbol, &e)),
    }
}

pub async fn analyze(
    service: web::Data<dyn StockDataService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let symbol = path.into_inner();

    match service.fetch_analysis(&symbol).await {
        Ok(report) => Ok(HttpResponse::Ok().json(report)),
        Err(e) => Ok(error_response(&symbol, &e)),
    }
}

pub async fn historical(
    service: web::Data<dyn StockDataService>,
    path: web::Path<String>,
    query: web::Query<HistoricalQuery>,
) -> Result<HttpResponse> {
    let symbol = path.into_inner();

    match service.fetch_historical(&symbol, &query).await {
        Ok(report) => Ok(HttpResponse::Ok().json(report)),
        Err(e) => Ok(error_response(&symbol, &e)),
    }
}

/// 代码段允许为空，空代码交给服务层按校验错误处理
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/quote/{symbol:.*}", web::get().to(get_quote))
        .route("/analyze/{symbol:.*}", web::get().to(analyze))
        .service(
            web::resource("/historical/{symbol:.*}")
                .app_data(web::QueryConfig::default().error_handler(query_error))
                .route(web::get().to(historical)),
        );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IndicatorWindows, OhlcvRecord, OutputSize, Quote};
    use crate::services::stock::MockMarketDataProvider;
    use crate::services::StockService;
    use actix_web::{http::StatusCode, test, App};
    use chrono::NaiveDate;
    use serde_json::Value;
    use std::sync::Arc;

    fn stub_quote(symbol: &str) -> Quote {
        Quote {
            symbol: symbol.to_string(),
            price: 221.53,
            change: -2.21,
            change_percent: crate::services::stock::alphavantage::format_change_percent(221.53, -2.21),
            volume: 58_932_401,
            trading_day: NaiveDate::from_ymd_opt(2025, 3, 26).unwrap(),
        }
    }

    fn series(len: usize) -> Vec<OhlcvRecord> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        (0..len)
            .map(|i| OhlcvRecord {
                date: start + chrono::Duration::days(i as i64),
                open: 100.0,
                high: 110.0,
                low: 90.0,
                close: 100.0 + i as f64,
                volume: 500,
            })
            .collect()
    }

    fn data(provider: MockMarketDataProvider) -> web::Data<dyn StockDataService> {
        let service: Arc<dyn StockDataService> =
            Arc::new(StockService::new(Arc::new(provider), IndicatorWindows::default(), 30));
        web::Data::from(service)
    }

    async fn get_json(provider: MockMarketDataProvider, uri: &str) -> (StatusCode, Value) {
        let app = test::init_service(App::new().app_data(data(provider)).configure(config)).await;
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }

    #[actix_web::test]
    async fn test_quote_end_to_end() {
        let mut provider = MockMarketDataProvider::new();
        provider.expect_global_quote().times(1).returning(|s| Ok(stub_quote(s)));

        let (status, body) = get_json(provider, "/quote/aapl").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "AAPL");
        assert_eq!(body["price"], 221.53);
        assert_eq!(body["change"], -2.21);
        assert_eq!(body["change_percent"], "-0.9878%");
        assert_eq!(body["volume"], 58_932_401);
        assert_eq!(body["trading_day"], "2025-03-26");
    }

    #[actix_web::test]
    async fn test_invalid_symbol_is_400() {
        // 没有期望，调用数据源会 panic
        let (status, body) = get_json(MockMarketDataProvider::new(), "/quote/AA%20PL").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["symbol"], "AA PL");
        assert_eq!(body["message"], "股票代码格式无效: AA PL");
        assert_eq!(body.as_object().unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn test_provider_errors_map_to_status() {
        let cases = [
            (StockError::UnknownSymbol("ZZZZ".into()), StatusCode::NOT_FOUND),
            (StockError::RateLimited("5 calls per minute".into()), StatusCode::TOO_MANY_REQUESTS),
            (StockError::ProviderStatus(503), StatusCode::BAD_GATEWAY),
            (StockError::MalformedResponse("missing key".into()), StatusCode::BAD_GATEWAY),
        ];

        for (err, expected) in cases {
            let message = err.to_string();
            let mut provider = MockMarketDataProvider::new();
            let mut slot = Some(err);
            provider
                .expect_global_quote()
                .times(1)
                .returning(move |_| Err(slot.take().unwrap()));

            let (status, body) = get_json(provider, "/quote/zzzz").await;
            assert_eq!(status, expected);
            assert_eq!(body["symbol"], "ZZZZ");
            assert_eq!(body["message"], message);
        }
    }

    #[actix_web::test]
    async fn test_analyze_short_history_has_null_indicators() {
        let mut provider = MockMarketDataProvider::new();
        provider.expect_global_quote().returning(|s| Ok(stub_quote(s)));
        provider.expect_daily_series().returning(|_, _| Ok(series(25)));

        let (status, body) = get_json(provider, "/analyze/MSFT").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "MSFT");
        assert_eq!(body["indicators"]["sma_short"]["window"], 20);
        assert_eq!(body["indicators"]["sma_short"]["value"], 114.5);
        assert!(body["indicators"]["sma_long"]["value"].is_null());
        assert!(body["sentiment"]["trend"].is_null());
        assert_eq!(body["recent"].as_array().unwrap().len(), 25);
    }

    #[actix_web::test]
    async fn test_historical_query_params() {
        let mut provider = MockMarketDataProvider::new();
        provider
            .expect_daily_series()
            .times(1)
            .returning(|symbol, outputsize| {
                assert_eq!(symbol, "IBM");
                assert_eq!(outputsize, OutputSize::Full);
                Ok(series(30))
            });

        let (status, body) = get_json(provider, "/historical/ibm?outputsize=full&limit=3").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "IBM");
        let points = body["points"].as_array().unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0]["date"], "2025-01-28");
        assert_eq!(points[2]["close"], 129.0);
        assert!(points[2]["sma_long"].is_null());
        assert_eq!(points[2]["rsi"], 100.0);
    }

    #[actix_web::test]
    async fn test_historical_bad_query_is_error_body() {
        for uri in ["/historical/ibm?outputsize=huge", "/historical/ibm?limit=abc"] {
            let (status, body) = get_json(MockMarketDataProvider::new(), uri).await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["symbol"], "IBM");
            assert!(body["message"].as_str().unwrap().starts_with("查询参数无效"));
            assert_eq!(body.as_object().unwrap().len(), 2);
        }
    }

    #[actix_web::test]
    async fn test_missing_symbol_is_validation_error() {
        for uri in ["/quote/", "/analyze/", "/historical/", "/quote/%20"] {
            let (status, body) = get_json(MockMarketDataProvider::new(), uri).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body["symbol"], "");
            assert_eq!(body["message"], "股票代码不能为空");
        }
    }
}
