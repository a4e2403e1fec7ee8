//! 通知读取与设备注册 API 处理器

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use chrono::Utc;
use tracing::info;
use validator::Validate;

use crate::dto::{
    ApiResponse, DeviceDto, NotificationDto, NotificationListDto, NotificationQuery, PageResponse,
    ReadAllRequest, ReadRequest, RegisterTokenRequest,
};
use crate::dto::ReadResultDto;
use crate::error::Result;
use crate::identity::CallerIdentity;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// 注册/刷新设备推送令牌
///
/// POST /api/fcm_token
///
/// 已登录调用时设备关联当前用户；匿名调用时 user_id 为空，
/// 同一 (user, device_token) 重复注册只刷新 push_token 与语言。
pub async fn register_token(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<RegisterTokenRequest>,
) -> Result<Json<ApiResponse<DeviceDto>>> {
    req.validate()?;

    let user_id = match &current.0 {
        Some(claims) => Some(claims.user_id()?),
        None => None,
    };

    let device = state
        .devices
        .upsert(user_id, &req.device_token, &req.fcm_token, req.language())
        .await?;

    info!(
        device_id = device.id,
        user_id = ?device.user_id,
        "设备推送令牌已注册"
    );

    Ok(Json(ApiResponse::success(device.into())))
}

/// 通知列表（分页，附带未读数）
///
/// GET /api/notifications
pub async fn get_notifications(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<ApiResponse<NotificationListDto>>> {
    let identity = CallerIdentity::resolve(current.0.as_ref(), query.device_token.as_deref())?;
    let recipient = state.identity.recipient_ref(&identity).await?;

    let pagination = query.pagination();
    let page = pagination.page();
    let page_size = pagination.limit();
    let lang = query.language();
    let now = Utc::now();

    let (items, total) = state
        .notifications
        .list_for_recipient(recipient, page, page_size)
        .await?;
    let unread_count = state.notifications.unread_count(recipient).await?;

    let items = items
        .iter()
        .map(|(notification, read)| {
            NotificationDto::render(&state.templates, notification, *read, lang, now)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Json(ApiResponse::success(NotificationListDto {
        page: PageResponse::new(items, total, page, page_size),
        unread_count,
    })))
}

/// 标记指定通知为已读
///
/// POST /api/notifications/read
///
/// 不属于调用方的通知 ID 静默跳过，不报错也不产生副作用。
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<ReadRequest>,
) -> Result<Json<ApiResponse<ReadResultDto>>> {
    req.validate()?;

    let identity = CallerIdentity::resolve(current.0.as_ref(), req.device_token.as_deref())?;
    let recipient = state.identity.recipient_ref(&identity).await?;

    let updated = state
        .notifications
        .mark_read(recipient, &req.notification_ids)
        .await?;

    Ok(Json(ApiResponse::success(ReadResultDto { updated })))
}

/// 标记调用方全部通知为已读
///
/// POST /api/notifications/read/all
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<ReadAllRequest>,
) -> Result<Json<ApiResponse<ReadResultDto>>> {
    let identity = CallerIdentity::resolve(current.0.as_ref(), req.device_token.as_deref())?;
    let recipient = state.identity.recipient_ref(&identity).await?;

    let updated = state.notifications.mark_all_read(recipient).await?;

    Ok(Json(ApiResponse::success(ReadResultDto { updated })))
}
