//! MCP（Model Context Protocol）服务
//!
//! 把股票数据服务以工具和资源的形式暴露给 AI 助手

pub mod format;   // 资源文本格式
pub mod protocol; // JSON-RPC 消息
pub mod server;   // 请求分发
pub mod stdio;    // stdio 传输

pub use server::McpServer;
