//! 股票数据服务
//!
//! HTTP、MCP、仪表盘三个出口共用的业务入口：
//! 校验代码 -> 调用数据源 -> 计算指标 -> 组装结果

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;

use crate::error::{Result, StockError};
use crate::models::{AnalysisReport, HistoricalQuery, HistoricalReport, IndicatorWindows, OutputSize, Quote};
use crate::services::analysis;
use crate::services::indicators::IndicatorSet;
use crate::services::stock::MarketDataProvider;

/// 股票代码格式，如 AAPL、BRK.B、TSCO.LON
static SYMBOL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9][A-Z0-9.\-]{0,14}$").expect("股票代码正则无效"));

/// 规范化并校验股票代码
///
/// 去掉首尾空白并转成大写，校验失败时不会发起任何网络请求
pub fn normalize_symbol(raw: &str) -> Result<String> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(StockError::EmptySymbol);
    }
    if !SYMBOL_PATTERN.is_match(&symbol) {
        return Err(StockError::InvalidSymbol(symbol));
    }
    Ok(symbol)
}

/// 各出口共用的数据能力
#[async_trait]
pub trait StockDataService: Send + Sync {
    /// 最新行情
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote>;

    /// 行情 + 技术指标分析报告
    async fn fetch_analysis(&self, symbol: &str) -> Result<AnalysisReport>;

    /// 日K线 + 指标序列
    async fn fetch_historical(&self, symbol: &str, query: &HistoricalQuery) -> Result<HistoricalReport>;
}

/// 基于行情数据源的服务实现
pub struct StockService {
    provider: Arc<dyn MarketDataProvider>,
    windows: IndicatorWindows,
    history_points: usize,
}

impl StockService {
    /// 创建服务实例
    pub fn new(provider: Arc<dyn MarketDataProvider>, windows: IndicatorWindows, history_points: usize) -> Self {
        Self {
            provider,
            windows,
            history_points,
        }
    }
}

#[async_trait]
impl StockDataService for StockService {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        let symbol = normalize_symbol(symbol)?;
        log::info!("获取行情: {}", symbol);

        self.provider
            .global_quote(&symbol)
            .await
            .inspect_err(|e| log::warn!("获取 {} 行情失败: {}", symbol, e))
    }

    async fn fetch_analysis(&self, symbol: &str) -> Result<AnalysisReport> {
        let symbol = normalize_symbol(symbol)?;
        log::info!("分析股票: {}", symbol);

        let (quote, records) = futures::try_join!(
            self.provider.global_quote(&symbol),
            self.provider.daily_series(&symbol, OutputSize::Compact),
        )
        .inspect_err(|e| log::warn!("分析 {} 失败: {}", symbol, e))?;

        let indicators = IndicatorSet::compute(&records, &self.windows);
        Ok(analysis::assemble(quote, &records, &indicators, self.history_points))
    }

    async fn fetch_historical(&self, symbol: &str, query: &HistoricalQuery) -> Result<HistoricalReport> {
        let symbol = normalize_symbol(symbol)?;
        log::info!("获取历史数据: {} outputsize={}", symbol, query.outputsize.as_str());

        let records = self
            .provider
            .daily_series(&symbol, query.outputsize)
            .await
            .inspect_err(|e| log::warn!("获取 {} 历史数据失败: {}", symbol, e))?;

        // 指标按完整序列计算，再截取最近 limit 条
        let indicators = IndicatorSet::compute(&records, &self.windows);
        let mut points = analysis::merge_points(&records, &indicators);
        if let Some(limit) = query.limit {
            let skip = points.len().saturating_sub(limit);
            points.drain(..skip);
        }

        Ok(HistoricalReport {
            symbol,
            windows: self.windows,
            points,
        })
    }
}
