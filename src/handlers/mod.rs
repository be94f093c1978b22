pub mod dashboard;
pub mod health;
pub mod mcp;
pub mod stock;

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::config)
        .configure(stock::config)
        .configure(mcp::config)
        .configure(dashboard::config);
}

/// 未匹配路由
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(json!({
        "message": format!("未找到路由: {} {}", req.method(), req.path()),
    }))
}
