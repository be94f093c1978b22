//! 股票数据源模块
//!
//! 定义数据源接口，目前对接 Alpha Vantage。
//! 测试中用 mockall 生成的 `MockMarketDataProvider` 代替真实数据源。

pub mod alphavantage;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{OhlcvRecord, OutputSize, Quote};

pub use alphavantage::AlphaVantageClient;

/// 行情数据源
///
/// 每次调用对应一次外部请求，失败原样返回，不做重试
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// 获取最新行情
    async fn global_quote(&self, symbol: &str) -> Result<Quote>;

    /// 获取日K线，按日期升序
    async fn daily_series(&self, symbol: &str, outputsize: OutputSize) -> Result<Vec<OhlcvRecord>>;
}
