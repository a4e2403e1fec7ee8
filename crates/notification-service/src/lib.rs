//! 通知服务
//!
//! 诗歌平台的通知扇出与投递子系统，提供 REST API。
//!
//! ## 核心功能
//!
//! - **设备注册**：已登录用户与匿名设备的推送令牌登记
//! - **通知扇出**：按受众展开接收者集合，落库后尽力推送
//! - **通知读取**：按接收者分页读取历史，附带未读数
//! - **已读追踪**：单条/批量/全部已读标记
//! - **管理端广播**：多语言公告发送给全体用户与匿名设备
//!
//! ## 模块结构
//!
//! - `models`: 通知、设备等领域模型
//! - `repository`: sqlx 仓储层（trait + Postgres 实现）
//! - `identity`: 调用方身份解析（用户 / 匿名设备）
//! - `recipients`: 受众到接收者集合的展开
//! - `template`: 多语言内容渲染与时间格式化
//! - `push`: FCM HTTP v1 推送（凭证、发送器、网关）
//! - `dispatch`: 扇出入口
//! - `handlers` / `routes` / `dto`: HTTP 层
//!
//! ## 技术栈
//!
//! - Web 框架：Axum
//! - 数据验证：validator
//! - 序列化：serde (camelCase)

pub mod auth;
pub mod dispatch;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod push;
pub mod recipients;
pub mod repository;
pub mod routes;
pub mod state;
pub mod template;

// 重新导出核心类型
pub use dispatch::NotificationDispatcher;
pub use dto::{ApiResponse, NotificationDto, PageResponse, PaginationParams};
pub use error::{NotifyError, Result};
pub use identity::{CallerIdentity, IdentityResolver};
pub use models::{
    AdminMessage, Device, EntityKind, EntityRef, Language, NewNotification, Notification,
    NotificationKind, RecipientRef,
};
pub use recipients::{Audience, RecipientResolver};
pub use state::AppState;
