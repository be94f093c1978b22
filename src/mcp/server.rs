//! MCP 请求分发
//!
//! 与传输方式无关，stdio 和 HTTP 共用。提供两个工具
//! （get_stock_quote / analyze_stock）和两个资源模板
//! （stock://{symbol}/quote / stock://{symbol}/analysis）。

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use super::format;
use super::protocol::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, INTERNAL_ERROR, INVALID_PARAMS, JSONRPC_VERSION,
    PROTOCOL_VERSION, RATE_LIMITED, RESOURCE_NOT_FOUND,
};
use crate::error::StockError;
use crate::services::StockDataService;

pub const SERVER_NAME: &str = "Stock Analysis Server";

const RESOURCE_SCHEME: &str = "stock://";

#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct SymbolArgs {
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct ReadResourceParams {
    uri: String,
}

/// 资源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResourceKind {
    Quote,
    Analysis,
}

/// 解析 stock://{symbol}/{quote|analysis}
fn parse_resource_uri(uri: &str) -> Option<(&str, ResourceKind)> {
    let rest = uri.strip_prefix(RESOURCE_SCHEME)?;
    let (symbol, kind) = rest.split_once('/')?;
    let kind = match kind {
        "quote" => ResourceKind::Quote,
        "analysis" => ResourceKind::Analysis,
        _ => return None,
    };
    Some((symbol, kind))
}

/// MCP 服务端
#[derive(Clone)]
pub struct McpServer {
    service: Arc<dyn StockDataService>,
}

impl McpServer {
    pub fn new(service: Arc<dyn StockDataService>) -> Self {
        Self { service }
    }

    /// 处理一条原始 JSON 消息，通知不返回任何内容
    pub async fn handle_message(&self, raw: &str) -> Option<String> {
        let response = match serde_json::from_str::<Value>(raw) {
            Err(e) => Some(JsonRpcResponse::failure(Value::Null, JsonRpcError::parse_error(e))),
            Ok(value) => {
                let id = value.get("id").cloned().unwrap_or(Value::Null);
                match serde_json::from_value::<JsonRpcRequest>(value) {
                    Ok(request) => self.handle(request).await,
                    Err(e) => Some(JsonRpcResponse::failure(
                        id,
                        JsonRpcError::invalid_request(format!("无效的请求: {}", e)),
                    )),
                }
            }
        };

        response.and_then(|r| match serde_json::to_string(&r) {
            Ok(text) => Some(text),
            Err(e) => {
                log::error!("序列化 MCP 响应失败: {}", e);
                None
            }
        })
    }

    /// 处理已解析的请求
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            log::debug!("收到通知: {}", request.method);
            return None;
        }

        let id = request.id.clone().unwrap_or(Value::Null);
        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::invalid_request("jsonrpc 必须为 \"2.0\""),
            ));
        }

        let params = request.params.unwrap_or(Value::Null);
        let response = match self.dispatch(&request.method, params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        };
        Some(response)
    }

    async fn dispatch(&self, method: &str, params: Value) -> Result<Value, JsonRpcError> {
        match method {
            "initialize" => Ok(initialize_result(&params)),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": tool_definitions() })),
            "tools/call" => self.call_tool(params).await,
            "resources/list" => Ok(json!({ "resources": [] })),
            "resources/templates/list" => Ok(json!({ "resourceTemplates": resource_templates() })),
            "resources/read" => self.read_resource(params).await,
            _ => Err(JsonRpcError::method_not_found(method)),
        }
    }

    async fn call_tool(&self, params: Value) -> Result<Value, JsonRpcError> {
        let call: ToolCallParams = serde_json::from_value(params)
            .map_err(|e| JsonRpcError::invalid_params(format!("tools/call 参数无效: {}", e)))?;
        let args: SymbolArgs = serde_json::from_value(call.arguments)
            .map_err(|e| JsonRpcError::invalid_params(format!("工具参数无效: {}", e)))?;

        log::info!("MCP 工具调用: {}({})", call.name, args.symbol);

        let outcome = match call.name.as_str() {
            "get_stock_quote" => self
                .service
                .fetch_quote(&args.symbol)
                .await
                .map(|quote| serde_json::to_value(quote)),
            "analyze_stock" => self
                .service
                .fetch_analysis(&args.symbol)
                .await
                .map(|report| serde_json::to_value(report)),
            other => {
                return Err(JsonRpcError::invalid_params(format!("未知工具: {}", other)));
            }
        };

        match outcome {
            Ok(Ok(value)) => {
                let text = serde_json::to_string_pretty(&value)
                    .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, e.to_string()))?;
                Ok(json!({
                    "content": [{ "type": "text", "text": text }],
                    "structuredContent": value,
                    "isError": false,
                }))
            }
            Ok(Err(e)) => Err(JsonRpcError::new(INTERNAL_ERROR, e.to_string())),
            Err(err) => {
                log::warn!("工具 {} 执行失败: {}", call.name, err);
                let body = err.error_body(&args.symbol);
                Ok(json!({
                    "content": [{ "type": "text", "text": json!(body).to_string() }],
                    "structuredContent": error_data(&args.symbol, &err),
                    "isError": true,
                }))
            }
        }
    }

    async fn read_resource(&self, params: Value) -> Result<Value, JsonRpcError> {
        let params: ReadResourceParams = serde_json::from_value(params)
            .map_err(|e| JsonRpcError::invalid_params(format!("resources/read 参数无效: {}", e)))?;
        let (symbol, kind) = parse_resource_uri(&params.uri)
            .ok_or_else(|| JsonRpcError::invalid_params(format!("无效的资源 URI: {}", params.uri)))?;

        log::info!("MCP 读取资源: {}", params.uri);

        let text = match kind {
            ResourceKind::Quote => self
                .service
                .fetch_quote(symbol)
                .await
                .map(|quote| format::quote_text(&quote)),
            ResourceKind::Analysis => self
                .service
                .fetch_analysis(symbol)
                .await
                .map(|report| format::analysis_text(&report)),
        }
        .map_err(|err| resource_error(symbol, err))?;

        Ok(json!({
            "contents": [{
                "uri": params.uri,
                "mimeType": "text/plain",
                "text": text,
            }]
        }))
    }
}

/// {symbol, message, kind}
fn error_data(symbol: &str, err: &StockError) -> Value {
    let body = err.error_body(symbol);
    json!({
        "symbol": body.symbol,
        "message": body.message,
        "kind": err.kind(),
    })
}

fn resource_error(symbol: &str, err: StockError) -> JsonRpcError {
    log::warn!("读取 {} 资源失败: {}", symbol, err);
    let code = match &err {
        e if e.is_validation() => INVALID_PARAMS,
        StockError::UnknownSymbol(_) => RESOURCE_NOT_FOUND,
        StockError::RateLimited(_) => RATE_LIMITED,
        _ => INTERNAL_ERROR,
    };
    JsonRpcError::new(code, err.to_string()).with_data(error_data(symbol, &err))
}

fn initialize_result(params: &Value) -> Value {
    // 客户端声明的版本原样返回，否则使用本端支持的版本
    let version = params
        .get("protocolVersion")
        .and_then(Value::as_str)
        .unwrap_or(PROTOCOL_VERSION);

    json!({
        "protocolVersion": version,
        "capabilities": {
            "tools": { "listChanged": false },
            "resources": { "subscribe": false, "listChanged": false },
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        },
        "instructions": "Stock quotes and technical analysis (SMA, RSI) backed by Alpha Vantage daily data.",
    })
}

fn symbol_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "symbol": {
                "type": "string",
                "description": description,
            }
        },
        "required": ["symbol"],
    })
}

fn tool_definitions() -> Value {
    json!([
        {
            "name": "get_stock_quote",
            "description": "Get the latest stock quote (price, change, volume, trading day) for a symbol.",
            "inputSchema": symbol_schema("The stock symbol to lookup (e.g., AAPL, MSFT, GOOGL)"),
        },
        {
            "name": "analyze_stock",
            "description": "Get the latest quote plus technical indicators (short/long SMA, RSI) and a sentiment summary.",
            "inputSchema": symbol_schema("The stock symbol to analyze (e.g., AAPL, MSFT, GOOGL)"),
        }
    ])
}

fn resource_templates() -> Value {
    json!([
        {
            "uriTemplate": "stock://{symbol}/quote",
            "name": "Stock quote",
            "description": "Latest quote formatted as text",
            "mimeType": "text/plain",
        },
        {
            "uriTemplate": "stock://{symbol}/analysis",
            "name": "Stock analysis",
            "description": "Technical analysis formatted as text",
            "mimeType": "text/plain",
        }
    ])
}
