//! 管理端通知 API 处理器

use axum::{Extension, Json, extract::State};
use tracing::info;

use crate::dto::{AdminSendRequest, ApiResponse, DispatchResultDto};
use crate::error::{NotifyError, Result};
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// 管理员发送公告
///
/// POST /api/admin/send_notification
///
/// 广播给全体普通用户与所有匿名设备。标题/正文必须覆盖所有支持语言。
pub async fn send_notification(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<AdminSendRequest>,
) -> Result<Json<ApiResponse<DispatchResultDto>>> {
    let claims = current
        .0
        .as_ref()
        .ok_or_else(|| NotifyError::Unauthorized("需要登录".to_string()))?;
    if !claims.is_admin() {
        return Err(NotifyError::Forbidden("需要管理员权限".to_string()));
    }
    let admin_user_id = claims.user_id()?;

    let (message, target) = req.into_message();
    let notification = state
        .dispatcher
        .dispatch_admin_broadcast(admin_user_id, message, target)
        .await?;

    info!(
        notification_id = notification.id,
        admin_user_id, "管理员公告已发送"
    );

    Ok(Json(ApiResponse::success(DispatchResultDto {
        notification_id: notification.id,
    })))
}
