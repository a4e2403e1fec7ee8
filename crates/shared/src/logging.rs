//! 日志初始化模块
//!
//! 基于 tracing-subscriber 提供统一的日志配置：
//! 环境过滤器 + json/pretty 两种输出格式。

use tracing_subscriber::{
    EnvFilter, Layer,
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::LoggingConfig;
use crate::error::{Result, SharedError};

/// 初始化全局日志订阅器
///
/// RUST_LOG 环境变量优先于配置文件中的级别。
/// 重复初始化返回错误而非 panic，便于在测试中容忍多次调用。
pub fn init(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = if config.format == "json" {
        fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        fmt::layer().with_target(true).with_ansi(true).boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| SharedError::Logging(e.to_string()))
}
