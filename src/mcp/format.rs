//! 资源的纯文本格式

use std::fmt::Write;

use crate::models::{AnalysisReport, LatestIndicator, Quote};

/// 行情文本
pub fn quote_text(quote: &Quote) -> String {
    format!(
        "Stock Quote: {}\nPrice: ${:.2}\nChange: {:.2} ({})\nVolume: {}\nLatest Trading Day: {}\n",
        quote.symbol,
        quote.price,
        quote.change,
        quote.change_percent,
        thousands(quote.volume),
        quote.trading_day,
    )
}

/// 分析报告文本
pub fn analysis_text(report: &AnalysisReport) -> String {
    let mut text = String::new();

    // 写入 String 不会失败
    let _ = writeln!(text, "Stock Analysis: {}", report.symbol);
    let _ = writeln!(
        text,
        "Latest Date: {}",
        report.latest_date.map_or("n/a".to_string(), |d| d.to_string())
    );
    let _ = writeln!(text, "Price: ${:.2} ({})", report.quote.price, report.quote.change_percent);
    let _ = writeln!(
        text,
        "Latest Close: {}",
        report.latest_close.map_or("n/a".to_string(), |c| format!("${:.2}", c))
    );
    let _ = writeln!(
        text,
        "Daily Change: {}",
        report.daily_change_percent.map_or("n/a".to_string(), |p| format!("{:.2}%", p))
    );
    let _ = writeln!(text, "Sentiment: {}", report.sentiment.summary);
    let _ = writeln!(text, "RSI({}): {}", report.indicators.rsi.window, indicator(&report.indicators.rsi));
    let _ = writeln!(
        text,
        "Short-term MA({}): {}",
        report.indicators.sma_short.window,
        indicator(&report.indicators.sma_short)
    );
    let _ = writeln!(
        text,
        "Long-term MA({}): {}",
        report.indicators.sma_long.window,
        indicator(&report.indicators.sma_long)
    );

    text
}

fn indicator(latest: &LatestIndicator) -> String {
    latest.value.map_or("n/a".to_string(), |v| format!("{:.2}", v))
}

/// 千分位分隔，如 58932401 -> "58,932,401"
pub fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}
