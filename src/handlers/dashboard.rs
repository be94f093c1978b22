//! 仪表盘页面
//!
//! 单页 HTML，浏览器端调用 /quote、/analyze、/historical 绘图

use actix_web::{web, HttpResponse, Result};
use serde::Deserialize;

use crate::services::stock_service::normalize_symbol;

const DASHBOARD_HTML: &str = include_str!("../../static/dashboard.html");
const DEFAULT_SYMBOL: &str = "AAPL";

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// 预填的股票代码
    pub symbol: Option<String>,
}

/// 渲染页面，非法代码回退到默认值
pub fn render(symbol: Option<&str>) -> String {
    let symbol = symbol
        .and_then(|s| normalize_symbol(s).ok())
        .unwrap_or_else(|| DEFAULT_SYMBOL.to_string());
    DASHBOARD_HTML.replace("{{SYMBOL}}", &symbol)
}

pub async fn dashboard(query: web::Query<DashboardQuery>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(render(query.symbol.as_deref())))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/dashboard", web::get().to(dashboard));
}
