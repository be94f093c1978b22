//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置，数据源 API Key 可由环境变量覆盖

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::IndicatorWindows;
use crate::services::stock::alphavantage::ALPHA_VANTAGE_API;

/// 数据源 API Key 的环境变量名
pub const API_KEY_ENV: &str = "ALPHA_VANTAGE_API_KEY";

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// 数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Alpha Vantage API Key（必填）
    #[serde(default)]
    pub api_key: String,
    /// 接口地址
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// 技术分析配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// 短期均线窗口
    #[serde(default = "default_short_window")]
    pub short_window: usize,
    /// 长期均线窗口
    #[serde(default = "default_long_window")]
    pub long_window: usize,
    /// RSI 窗口
    #[serde(default = "default_rsi_window")]
    pub rsi_window: usize,
    /// 分析报告附带的最近数据点数量
    #[serde(default = "default_history_points")]
    pub history_points: usize,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 数据源配置
    #[serde(default)]
    pub provider: ProviderConfig,
    /// 技术分析配置
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }
fn default_base_url() -> String { ALPHA_VANTAGE_API.to_string() }
fn default_timeout() -> u64 { 30 }
fn default_connect_timeout() -> u64 { 10 }
fn default_short_window() -> usize { 20 }
fn default_long_window() -> usize { 50 }
fn default_rsi_window() -> usize { 14 }
fn default_history_points() -> usize { 30 }
fn default_log_level() -> String { "info".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            short_window: default_short_window(),
            long_window: default_long_window(),
            rsi_window: default_rsi_window(),
            history_points: default_history_points(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AnalysisConfig {
    /// 指标窗口参数
    pub fn windows(&self) -> IndicatorWindows {
        IndicatorWindows {
            short_window: self.short_window,
            long_window: self.long_window,
            rsi_window: self.rsi_window,
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件 {} 失败", path.display()))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("解析配置文件 {} 失败", path.display()))?;
        Ok(config)
    }

    /// 加载配置
    ///
    /// 指定路径时必须能读取；否则依次尝试默认路径，都不存在则使用默认值。
    /// 之后应用环境变量覆盖并校验，缺少 API Key 直接报错。
    /// 此时日志尚未初始化（日志级别来自配置），错误由调用方输出。
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => Self::from_default_paths()?,
        };

        config.apply_env(std::env::var(API_KEY_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_default_paths() -> anyhow::Result<Self> {
        let config_paths = [PathBuf::from("config.json"), PathBuf::from("config/config.json")];

        for path in &config_paths {
            if path.exists() {
                return Self::from_file(path);
            }
        }

        Ok(Self::default())
    }

    /// 环境变量中的 API Key 优先于配置文件
    pub fn apply_env(&mut self, api_key: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.provider.api_key = key;
        }
    }

    /// 启动前校验，失败视为致命错误
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.provider.api_key.trim().is_empty() {
            bail!("缺少数据源 API Key，请设置环境变量 {} 或配置 provider.api_key", API_KEY_ENV);
        }

        let analysis = &self.analysis;
        if analysis.short_window == 0 || analysis.long_window == 0 || analysis.rsi_window == 0 {
            bail!("指标窗口必须大于 0");
        }
        if analysis.history_points == 0 {
            bail!("analysis.history_points 必须大于 0");
        }

        Ok(())
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
