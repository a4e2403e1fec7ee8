//! 可选认证中间件
//!
//! 读取接口同时面向已登录用户和匿名设备，所以认证是可选的：
//! Token 有效时注入 Claims，无效或缺失时按匿名继续，
//! 是否拒绝匿名由各 handler 自行决定。

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::auth::Claims;
use crate::state::AppState;

/// 当前调用方（可能匿名）
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<Claims>);

/// 可选认证中间件
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let claims = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .and_then(|token| match state.jwt_manager.verify_token(token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                // 无效 Token 不终止请求，降级为匿名路径
                debug!(error = %e, "Token 验证失败，按匿名请求处理");
                None
            }
        });

    request.extensions_mut().insert(CurrentUser(claims));
    next.run(request).await
}
