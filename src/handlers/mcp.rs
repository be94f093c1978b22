//! MCP 的 HTTP 传输
//!
//! POST /mcp，请求体是一条 JSON-RPC 消息。通知没有响应体，返回 202。

use actix_web::{web, HttpResponse, Result};

use crate::mcp::McpServer;

pub async fn handle(server: web::Data<McpServer>, body: String) -> Result<HttpResponse> {
    match server.handle_message(&body).await {
        Some(reply) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .body(reply)),
        None => Ok(HttpResponse::Accepted().finish()),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/mcp", web::post().to(handle));
}
