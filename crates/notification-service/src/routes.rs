//! 路由配置模块
//!
//! 定义所有 REST API 端点的路由映射

use axum::{
    Router,
    routing::{get, post},
};

use crate::{handlers, state::AppState};

/// 客户端路由（已登录用户与匿名设备共用）
pub fn client_routes() -> Router<AppState> {
    Router::new()
        .route("/fcm_token", post(handlers::notification::register_token))
        .route(
            "/notifications",
            get(handlers::notification::get_notifications),
        )
        .route(
            "/notifications/read",
            post(handlers::notification::mark_read),
        )
        .route(
            "/notifications/read/all",
            post(handlers::notification::mark_all_read),
        )
}

/// 管理端路由
pub fn admin_routes() -> Router<AppState> {
    Router::new().route(
        "/admin/send_notification",
        post(handlers::admin::send_notification),
    )
}

/// 构建完整的 API 路由
pub fn api_routes() -> Router<AppState> {
    client_routes().merge(admin_routes())
}
