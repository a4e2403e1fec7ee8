//! 请求 DTO 定义

use std::collections::BTreeMap;

use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::models::{AdminMessage, EntityKind, EntityRef, Language};

/// 分页参数
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl PaginationParams {
    /// 规范化页码（最小 1）
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    /// 获取限制条数（最大100）
    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, 100)
    }
}

/// 校验语言码在支持集合内
fn validate_language(language: &str) -> Result<(), ValidationError> {
    if Language::parse(language).is_some() {
        Ok(())
    } else {
        Err(ValidationError::new("unsupported_language"))
    }
}

/// 设备注册请求
///
/// 已登录用户带 Token 调用时设备关联到用户，匿名调用时 user_id 为空。
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterTokenRequest {
    /// 客户端生成的稳定设备标识
    #[validate(length(min = 1, max = 255))]
    pub device_token: String,
    /// 推送网关下发的注册令牌
    #[validate(length(min = 1, max = 4096))]
    pub fcm_token: String,
    /// 推送内容的首选语言，缺省为平台默认语言
    #[validate(custom(function = "validate_language"))]
    #[serde(default)]
    pub language: Option<String>,
}

impl RegisterTokenRequest {
    pub fn language(&self) -> Language {
        self.language
            .as_deref()
            .and_then(Language::parse)
            .unwrap_or_default()
    }
}

/// 通知列表查询参数
///
/// 分页字段直接内联，查询串反序列化不支持嵌套结构。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    /// 匿名访问时的设备标识
    pub device_token: Option<String>,
    /// 渲染语言，缺省为平台默认语言
    pub lang: Option<String>,
}

impl NotificationQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            page_size: self.page_size,
        }
    }

    pub fn language(&self) -> Language {
        self.lang
            .as_deref()
            .and_then(Language::parse)
            .unwrap_or_default()
    }
}

/// 标记已读请求
#[derive(Debug, Deserialize, Validate)]
pub struct ReadRequest {
    #[validate(length(min = 1, message = "notification_ids 不能为空"))]
    pub notification_ids: Vec<i64>,
    /// 匿名访问时的设备标识
    pub device_token: Option<String>,
}

/// 全部已读请求
#[derive(Debug, Default, Deserialize)]
pub struct ReadAllRequest {
    /// 匿名访问时的设备标识
    pub device_token: Option<String>,
}

/// 多态实体引用 DTO
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct EntityRefDto {
    pub kind: EntityKind,
    pub id: i64,
}

impl From<EntityRefDto> for EntityRef {
    fn from(dto: EntityRefDto) -> Self {
        EntityRef::new(dto.kind, dto.id)
    }
}

/// 管理员公告发送请求
///
/// 标题与正文必须覆盖所有支持语言，完整性在 AdminMessage::validate 中检查。
#[derive(Debug, Deserialize)]
pub struct AdminSendRequest {
    pub title: BTreeMap<Language, String>,
    pub body: BTreeMap<Language, String>,
    /// 点按通知后要打开的实体（可选）
    pub target: Option<EntityRefDto>,
}

impl AdminSendRequest {
    pub fn into_message(self) -> (AdminMessage, Option<EntityRef>) {
        let target = self.target.map(EntityRef::from);
        (
            AdminMessage {
                title: self.title,
                body: self.body,
            },
            target,
        )
    }
}
