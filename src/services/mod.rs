//! 业务逻辑服务模块
//!
//! 封装数据获取、指标计算和报告组装

pub mod analysis;       // 分析报告组装
pub mod indicators;     // 技术指标
pub mod stock;          // 行情数据源
pub mod stock_service;  // 对外的数据服务

pub use stock_service::{StockDataService, StockService};
