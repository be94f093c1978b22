//! 错误类型
//!
//! 分两类：校验错误（在发起网络请求前拒绝）和数据源错误（原样上抛，不重试）。

use actix_web::http::StatusCode;
use thiserror::Error;

use crate::models::ErrorBody;

/// 股票数据相关错误
#[derive(Debug, Error)]
pub enum StockError {
    /// 股票代码为空
    #[error("股票代码不能为空")]
    EmptySymbol,

    /// 股票代码格式不合法
    #[error("股票代码格式无效: {0}")]
    InvalidSymbol(String),

    /// 查询参数不合法
    #[error("查询参数无效: {0}")]
    InvalidQuery(String),

    /// 数据源不认识该代码
    #[error("未知的股票代码: {0}")]
    UnknownSymbol(String),

    /// 数据源明确返回了限流提示
    #[error("数据源请求频率超限: {0}")]
    RateLimited(String),

    /// 数据源返回的其他错误信息
    #[error("数据源错误: {0}")]
    Provider(String),

    /// 数据源 HTTP 状态码异常
    #[error("数据源返回状态码 {0}")]
    ProviderStatus(u16),

    /// 响应结构或字段无法解析
    #[error("数据源响应格式错误: {0}")]
    MalformedResponse(String),

    /// 网络错误
    #[error("网络错误: {0}")]
    Network(#[from] reqwest::Error),
}

impl StockError {
    /// 是否为校验错误
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            StockError::EmptySymbol | StockError::InvalidSymbol(_) | StockError::InvalidQuery(_)
        )
    }

    /// 错误类别，供调用方区分处理（如遇到 rate_limited 时退避）
    pub fn kind(&self) -> &'static str {
        match self {
            StockError::EmptySymbol | StockError::InvalidSymbol(_) | StockError::InvalidQuery(_) => {
                "validation"
            }
            StockError::UnknownSymbol(_) => "unknown_symbol",
            StockError::RateLimited(_) => "rate_limited",
            StockError::Provider(_) | StockError::ProviderStatus(_) => "provider",
            StockError::MalformedResponse(_) => "malformed_response",
            StockError::Network(_) => "network",
        }
    }

    /// 对外的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            StockError::EmptySymbol | StockError::InvalidSymbol(_) | StockError::InvalidQuery(_) => {
                StatusCode::BAD_REQUEST
            }
            StockError::UnknownSymbol(_) => StatusCode::NOT_FOUND,
            StockError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            StockError::Provider(_)
            | StockError::ProviderStatus(_)
            | StockError::MalformedResponse(_)
            | StockError::Network(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// 转成对外的错误体，代码按规范化后的形式回显
    pub fn error_body(&self, requested: &str) -> ErrorBody {
        ErrorBody::new(requested.trim().to_uppercase(), self.to_string())
    }
}

impl From<serde_json::Error> for StockError {
    fn from(err: serde_json::Error) -> Self {
        StockError::MalformedResponse(err.to_string())
    }
}

/// 股票操作的 Result 别名
pub type Result<T> = std::result::Result<T, StockError>;
