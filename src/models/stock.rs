//! 股票数据模型
//!
//! 定义行情、日K线、技术指标和分析报告的数据结构。
//! 所有结构都是单次请求内构造的值，不做持久化。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 最新行情快照
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Quote {
    /// 股票代码（大写）
    pub symbol: String,
    /// 最新成交价
    pub price: f64,
    /// 涨跌额
    pub change: f64,
    /// 涨跌幅，由 price 和 change 推导，如 "-0.9878%"
    pub change_percent: String,
    /// 成交量
    pub volume: u64,
    /// 最新交易日
    pub trading_day: NaiveDate,
}

/// 单日 OHLCV 数据
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OhlcvRecord {
    /// 日期
    pub date: NaiveDate,
    /// 开盘价
    pub open: f64,
    /// 最高价
    pub high: f64,
    /// 最低价
    pub low: f64,
    /// 收盘价
    pub close: f64,
    /// 成交量
    pub volume: u64,
}

/// 日K线数据量
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputSize {
    /// 最近 100 个交易日
    #[default]
    Compact,
    /// 全部历史
    Full,
}

impl OutputSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputSize::Compact => "compact",
            OutputSize::Full => "full",
        }
    }
}

/// 历史数据查询参数
#[derive(Debug, Default, Clone, Deserialize)]
pub struct HistoricalQuery {
    /// 数据量（compact / full）
    #[serde(default)]
    pub outputsize: OutputSize,
    /// 只返回最近 N 条（指标仍按完整序列计算）
    pub limit: Option<usize>,
}

/// 技术指标窗口参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorWindows {
    /// 短期均线窗口
    pub short_window: usize,
    /// 长期均线窗口
    pub long_window: usize,
    /// RSI 窗口
    pub rsi_window: usize,
}

impl Default for IndicatorWindows {
    fn default() -> Self {
        Self {
            short_window: 20,
            long_window: 50,
            rsi_window: 14,
        }
    }
}

/// 与历史序列按下标对齐的指标序列
///
/// 预热期内的点为 `None`，不使用 0 之类的占位数值。
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    /// 窗口大小
    pub window: usize,
    /// 指标值
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    /// 最近一个有值的点
    pub fn latest(&self) -> Option<f64> {
        self.values.iter().rev().find_map(|v| *v)
    }
}

/// 历史数据点（OHLCV + 同日指标值）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalPoint {
    #[serde(flatten)]
    pub record: OhlcvRecord,
    pub sma_short: Option<f64>,
    pub sma_long: Option<f64>,
    pub rsi: Option<f64>,
}

/// `/historical/{symbol}` 的响应
#[derive(Debug, Clone, Serialize)]
pub struct HistoricalReport {
    pub symbol: String,
    pub windows: IndicatorWindows,
    /// 按日期升序
    pub points: Vec<HistoricalPoint>,
}

/// 单个指标的最新值
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatestIndicator {
    pub window: usize,
    /// 数据不足时为 null
    pub value: Option<f64>,
}

/// 报告中的指标汇总
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSummary {
    pub sma_short: LatestIndicator,
    pub sma_long: LatestIndicator,
    pub rsi: LatestIndicator,
}

/// 均线趋势
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

/// RSI 信号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RsiSignal {
    Overbought,
    Oversold,
    Neutral,
}

/// 市场情绪
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sentiment {
    /// 短期均线与长期均线比较，任一均线缺失时为 null
    pub trend: Option<Trend>,
    /// RSI 缺失时为 null
    pub rsi_signal: Option<RsiSignal>,
    /// 可读摘要，如 "Trend: Bullish, RSI: Neutral (55.20)"
    pub summary: String,
}

/// 分析报告
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub quote: Quote,
    /// 历史序列最后一个交易日
    pub latest_date: Option<NaiveDate>,
    pub latest_close: Option<f64>,
    /// 最新收盘价相对前一日的涨跌幅（%）
    pub daily_change_percent: Option<f64>,
    pub indicators: IndicatorSummary,
    pub sentiment: Sentiment,
    /// 最近若干个数据点，用于绘图
    pub recent: Vec<HistoricalPoint>,
}
