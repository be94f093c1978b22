//! 分析报告组装
//!
//! 把最新行情、日K线和指标序列组合成报告，不做任何网络请求

use crate::models::{
    AnalysisReport, HistoricalPoint, IndicatorSeries, IndicatorSummary, LatestIndicator,
    OhlcvRecord, Quote, RsiSignal, Sentiment, Trend,
};
use crate::services::indicators::IndicatorSet;

/// RSI 超买阈值
pub const RSI_OVERBOUGHT: f64 = 70.0;
/// RSI 超卖阈值
pub const RSI_OVERSOLD: f64 = 30.0;

/// 把日K线和指标逐点合并
pub fn merge_points(records: &[OhlcvRecord], indicators: &IndicatorSet) -> Vec<HistoricalPoint> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| HistoricalPoint {
            record: record.clone(),
            sma_short: indicators.sma_short.values.get(i).copied().flatten(),
            sma_long: indicators.sma_long.values.get(i).copied().flatten(),
            rsi: indicators.rsi.values.get(i).copied().flatten(),
        })
        .collect()
}

/// 组装分析报告
///
/// 指标数据不足时对应字段为 `None`，不会编造默认值
pub fn assemble(
    quote: Quote,
    records: &[OhlcvRecord],
    indicators: &IndicatorSet,
    history_points: usize,
) -> AnalysisReport {
    let summary = IndicatorSummary {
        sma_short: latest_of(&indicators.sma_short),
        sma_long: latest_of(&indicators.sma_long),
        rsi: latest_of(&indicators.rsi),
    };

    let latest = records.last();
    let daily_change_percent = match records {
        [.., prev, last] if prev.close != 0.0 => {
            Some((last.close - prev.close) / prev.close * 100.0)
        }
        _ => None,
    };

    let mut recent = merge_points(records, indicators);
    let skip = recent.len().saturating_sub(history_points);
    recent.drain(..skip);

    AnalysisReport {
        symbol: quote.symbol.clone(),
        quote,
        latest_date: latest.map(|r| r.date),
        latest_close: latest.map(|r| r.close),
        daily_change_percent,
        sentiment: sentiment(&summary),
        indicators: summary,
        recent,
    }
}

fn latest_of(series: &IndicatorSeries) -> LatestIndicator {
    LatestIndicator {
        window: series.window,
        value: series.latest(),
    }
}

/// 根据均线和 RSI 判断市场情绪
pub fn sentiment(summary: &IndicatorSummary) -> Sentiment {
    let trend = match (summary.sma_short.value, summary.sma_long.value) {
        (Some(short), Some(long)) if short > long => Some(Trend::Bullish),
        (Some(short), Some(long)) if short < long => Some(Trend::Bearish),
        (Some(_), Some(_)) => Some(Trend::Neutral),
        _ => None,
    };

    let rsi_signal = summary.rsi.value.map(|rsi| {
        if rsi > RSI_OVERBOUGHT {
            RsiSignal::Overbought
        } else if rsi < RSI_OVERSOLD {
            RsiSignal::Oversold
        } else {
            RsiSignal::Neutral
        }
    });

    let trend_text = trend.map_or("Insufficient data".to_string(), |t| format!("{:?}", t));
    let rsi_text = match (rsi_signal, summary.rsi.value) {
        (Some(signal), Some(value)) => format!("{:?} ({:.2})", signal, value),
        _ => "Insufficient data".to_string(),
    };

    Sentiment {
        trend,
        rsi_signal,
        summary: format!("Trend: {}, RSI: {}", trend_text, rsi_text),
    }
}
