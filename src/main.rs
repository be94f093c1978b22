//! 股票分析后端服务
//!
//! 基于 Alpha Vantage 日线数据提供行情、技术指标（SMA / RSI）和分析报告，
//! 通过 HTTP 接口、MCP 工具协议和网页仪表盘三种方式对外提供

mod config;     // 配置
mod error;      // 错误类型
mod handlers;   // HTTP 请求处理器
mod mcp;        // MCP 协议
mod models;     // 数据模型定义
mod services;   // 业务逻辑服务

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use clap::{Parser, Subcommand};
use env_logger::Env;

use crate::config::AppConfig;
use crate::mcp::McpServer;
use crate::services::stock::AlphaVantageClient;
use crate::services::{StockDataService, StockService};

#[derive(Debug, Parser)]
#[command(name = "stock-analysis-backend", version, about = "股票行情与技术分析服务")]
struct Cli {
    /// 配置文件路径（JSON）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// 启动 HTTP 服务（默认）
    Serve,
    /// 在 stdin/stdout 上运行 MCP 服务
    Mcp,
}

/// 应用程序入口
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 配置错误直接退出，此时日志还未初始化
    let config = AppConfig::load(cli.config.as_deref()).context("加载配置失败")?;

    // 日志输出到 stderr，RUST_LOG 优先于配置
    env_logger::Builder::from_env(Env::default().default_filter_or(config.log.level.as_str())).init();

    let provider = AlphaVantageClient::new(&config.provider).context("创建数据源客户端失败")?;
    let service: Arc<dyn StockDataService> = Arc::new(StockService::new(
        Arc::new(provider),
        config.analysis.windows(),
        config.analysis.history_points,
    ));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve_http(&config, service).await,
        Command::Mcp => {
            mcp::stdio::serve_stdio(McpServer::new(service))
                .await
                .context("MCP 服务异常退出")
        }
    }
}

/// 跨域策略：任意来源、方法和请求头，OPTIONS 预检直接应答
fn cors() -> Cors {
    Cors::permissive()
}

/// 启动 HTTP 服务器
async fn serve_http(config: &AppConfig, service: Arc<dyn StockDataService>) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    log::info!("启动股票分析服务，监听 {}", addr);

    let mcp_server = web::Data::new(McpServer::new(service.clone()));

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())  // 请求日志
            .wrap(cors())             // 跨域
            .app_data(web::Data::from(service.clone()))
            .app_data(mcp_server.clone())
            .configure(handlers::config)
            .default_service(web::to(handlers::not_found))
    });

    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server
        .bind(&addr)
        .with_context(|| format!("绑定地址 {} 失败", addr))?
        .run()
        .await
        .context("HTTP 服务异常退出")
}
