//! 响应 DTO 定义

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::models::{Device, Language, Notification, NotificationKind};
use crate::template::{ICON_PATH, TemplateEngine, destination, format_age};

/// API 统一响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: "操作成功".to_string(),
            data: Some(data),
        }
    }

    /// 创建成功响应（无数据）
    pub fn success_empty() -> ApiResponse<()> {
        ApiResponse {
            success: true,
            code: "SUCCESS".to_string(),
            message: "操作成功".to_string(),
            data: None,
        }
    }
}

/// 分页响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl<T> PageResponse<T> {
    /// 创建分页响应
    pub fn new(items: Vec<T>, total: i64, page: i64, page_size: i64) -> Self {
        let total_pages = if page_size > 0 {
            (total + page_size - 1) / page_size
        } else {
            0
        };

        Self {
            items,
            total,
            page,
            page_size,
            total_pages,
        }
    }
}

/// 设备注册响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDto {
    pub id: i64,
    pub device_token: String,
    pub language: String,
}

impl From<Device> for DeviceDto {
    fn from(device: Device) -> Self {
        Self {
            id: device.id,
            device_token: device.device_token,
            language: device.language,
        }
    }
}

/// 客户端通知列表条目（已按请求语言渲染）
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDto {
    pub id: i64,
    pub kind: NotificationKind,
    pub icon: String,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_id: Option<i64>,
    /// 本地化的时间描述（相对或日期）
    pub date: String,
    pub read: bool,
}

impl NotificationDto {
    /// 渲染单条通知
    pub fn render(
        engine: &TemplateEngine,
        notification: &Notification,
        read: bool,
        lang: Language,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let rendered = engine.render(notification, lang)?;
        let dest = destination(notification);

        Ok(Self {
            id: notification.id,
            kind: notification.kind,
            icon: ICON_PATH.to_string(),
            title: rendered.title,
            message: rendered.message,
            destination_kind: dest.map(|d| d.kind.as_str().to_string()),
            destination_id: dest.map(|d| d.id),
            date: format_age(notification.created_at, now, lang),
            read,
        })
    }
}

/// 通知列表响应（分页 + 未读数）
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationListDto {
    #[serde(flatten)]
    pub page: PageResponse<NotificationDto>,
    pub unread_count: i64,
}

/// 已读标记结果
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadResultDto {
    pub updated: u64,
}

/// 管理员发送结果
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResultDto {
    pub notification_id: i64,
}
