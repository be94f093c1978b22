//! 技术指标计算
//!
//! 所有指标都按收盘价计算，结果与输入序列按下标对齐，
//! 预热期内的点为 `None`。
//!
//! RSI 的平均涨幅/跌幅使用简单移动平均（不是 Wilder 平滑），
//! 仪表盘只展示这里算出的值。

use crate::models::{IndicatorSeries, IndicatorWindows, OhlcvRecord};

/// 一组按窗口参数计算出的指标
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    pub sma_short: IndicatorSeries,
    pub sma_long: IndicatorSeries,
    pub rsi: IndicatorSeries,
}

impl IndicatorSet {
    /// 按窗口参数计算全部指标
    pub fn compute(records: &[OhlcvRecord], windows: &IndicatorWindows) -> Self {
        let closes: Vec<f64> = records.iter().map(|r| r.close).collect();

        Self {
            sma_short: IndicatorSeries {
                window: windows.short_window,
                values: sma(&closes, windows.short_window),
            },
            sma_long: IndicatorSeries {
                window: windows.long_window,
                values: sma(&closes, windows.long_window),
            },
            rsi: IndicatorSeries {
                window: windows.rsi_window,
                values: rsi(&closes, windows.rsi_window),
            },
        }
    }
}

/// 简单移动平均
///
/// 下标 i >= window - 1 时为最近 window 个收盘价的均值，之前为 `None`。
/// 序列长度不足一个窗口时全部为 `None`。
pub fn sma(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut values = vec![None; closes.len()];
    if window == 0 || closes.len() < window {
        return values;
    }

    for (offset, chunk) in closes.windows(window).enumerate() {
        let mean = chunk.iter().sum::<f64>() / window as f64;
        values[offset + window - 1] = Some(mean);
    }

    values
}

/// 相对强弱指数
///
/// 逐日涨跌 delta[i] = close[i] - close[i-1]，下标 i >= window 时取
/// 最近 window 个 delta 的平均涨幅和平均跌幅：
/// RSI = 100 - 100 / (1 + avg_gain / avg_loss)，avg_loss 为 0 时 RSI = 100。
/// 前 window 个点为 `None`。
pub fn rsi(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut values = vec![None; closes.len()];
    if window == 0 || closes.len() <= window {
        return values;
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    // deltas[k] 对应收盘价下标 k + 1
    for (offset, chunk) in deltas.windows(window).enumerate() {
        let (gain_sum, loss_sum) = chunk.iter().fold((0.0, 0.0), |(g, l), &d| {
            if d > 0.0 {
                (g + d, l)
            } else {
                (g, l - d)
            }
        });

        let avg_gain = gain_sum / window as f64;
        let avg_loss = loss_sum / window as f64;

        let value = if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        };
        values[offset + window] = Some(value);
    }

    values
}
