//! 通知领域模型
//!
//! 通知一经创建不可变，只有接收者关联行的 read 标志会被更新。
//! source/target 是带标签的多态实体引用；kind 是封闭枚举，
//! 模板和跳转目标对 kind 做穷尽匹配，新增 kind 漏配处理器是编译错误。

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NotifyError, Result};

/// 支持的内容语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ar,
    En,
}

impl Language {
    /// 平台支持的全部语言，驱动管理端 payload 完整性校验
    pub const SUPPORTED: [Language; 2] = [Language::Ar, Language::En];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Ar => "ar",
            Language::En => "en",
        }
    }

    pub fn parse(s: &str) -> Option<Language> {
        match s {
            "ar" => Some(Language::Ar),
            "en" => Some(Language::En),
            _ => None,
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::Ar
    }
}

/// 通知类型
///
/// from_admin 的标题/正文来自管理员提交的 payload，
/// 其余类型由模板表按类型派生。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// 管理员公告广播
    FromAdmin,
    /// 新的入驻申请（通知管理员）
    NewJoinRequest,
    /// 入驻申请已通过
    JoinRequestApproved,
    /// 入驻申请已拒绝
    JoinRequestRejected,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::FromAdmin => "from_admin",
            NotificationKind::NewJoinRequest => "new_join_request",
            NotificationKind::JoinRequestApproved => "join_request_approved",
            NotificationKind::JoinRequestRejected => "join_request_rejected",
        }
    }

    /// 从持久化的字符串解析
    ///
    /// 数据库中出现未知类型说明生产方与模板表版本不一致，按内部错误处理
    pub fn parse(s: &str) -> Result<NotificationKind> {
        match s {
            "from_admin" => Ok(NotificationKind::FromAdmin),
            "new_join_request" => Ok(NotificationKind::NewJoinRequest),
            "join_request_approved" => Ok(NotificationKind::JoinRequestApproved),
            "join_request_rejected" => Ok(NotificationKind::JoinRequestRejected),
            other => Err(NotifyError::Internal(format!("未知的通知类型: {other}"))),
        }
    }
}

/// 可被通知引用的实体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    JoinRequest,
    Poem,
    Poet,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::JoinRequest => "join_request",
            EntityKind::Poem => "poem",
            EntityKind::Poet => "poet",
        }
    }

    pub fn parse(s: &str) -> Result<EntityKind> {
        match s {
            "user" => Ok(EntityKind::User),
            "join_request" => Ok(EntityKind::JoinRequest),
            "poem" => Ok(EntityKind::Poem),
            "poet" => Ok(EntityKind::Poet),
            other => Err(NotifyError::Internal(format!("未知的实体类型: {other}"))),
        }
    }
}

/// 多态实体引用（类型标签 + ID）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: i64,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: i64) -> Self {
        Self { kind, id }
    }
}

/// 通知接收者引用：恰为已登录用户或匿名设备之一
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecipientRef {
    /// 按用户 ID 关联
    User(i64),
    /// 按设备行 ID 关联
    Device(i64),
}

/// 通知实体
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub kind: NotificationKind,
    pub source: Option<EntityRef>,
    pub target: Option<EntityRef>,
    /// 按 kind 解释的任意键值负载
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// 待创建的通知
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub kind: NotificationKind,
    pub source: Option<EntityRef>,
    pub target: Option<EntityRef>,
    pub payload: serde_json::Value,
}

impl NewNotification {
    pub fn new(kind: NotificationKind) -> Self {
        Self {
            kind,
            source: None,
            target: None,
            payload: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_source(mut self, source: EntityRef) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_target(mut self, target: EntityRef) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// 管理员公告内容
///
/// 管理员在发送时必须同时提供所有支持语言的标题与正文，
/// 缺失语言在提交时立即报错，不会推迟到渲染时。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminMessage {
    pub title: BTreeMap<Language, String>,
    pub body: BTreeMap<Language, String>,
}

impl AdminMessage {
    /// 校验所有支持语言的标题/正文均存在且非空
    pub fn validate(&self) -> Result<()> {
        for lang in Language::SUPPORTED {
            match self.title.get(&lang) {
                Some(t) if !t.trim().is_empty() => {}
                _ => {
                    return Err(NotifyError::Validation(format!(
                        "公告标题缺少语言 {}",
                        lang.as_str()
                    )));
                }
            }
            match self.body.get(&lang) {
                Some(b) if !b.trim().is_empty() => {}
                _ => {
                    return Err(NotifyError::Validation(format!(
                        "公告正文缺少语言 {}",
                        lang.as_str()
                    )));
                }
            }
        }
        Ok(())
    }

    /// 转换为通知 payload（{"title": {...}, "body": {...}}）
    pub fn into_payload(self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin_message(langs: &[(Language, &str, &str)]) -> AdminMessage {
        let mut title = BTreeMap::new();
        let mut body = BTreeMap::new();
        for (lang, t, b) in langs {
            title.insert(*lang, t.to_string());
            body.insert(*lang, b.to_string());
        }
        AdminMessage { title, body }
    }

    #[test]
    fn test_kind_roundtrip() {
        let kinds = [
            NotificationKind::FromAdmin,
            NotificationKind::NewJoinRequest,
            NotificationKind::JoinRequestApproved,
            NotificationKind::JoinRequestRejected,
        ];
        for kind in kinds {
            assert_eq!(NotificationKind::parse(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn test_kind_parse_unknown_is_internal_error() {
        let err = NotificationKind::parse("preparing").unwrap_err();
        assert!(matches!(err, NotifyError::Internal(_)));
    }

    #[test]
    fn test_entity_kind_roundtrip() {
        for kind in [
            EntityKind::User,
            EntityKind::JoinRequest,
            EntityKind::Poem,
            EntityKind::Poet,
        ] {
            assert_eq!(EntityKind::parse(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn test_language_parse() {
        assert_eq!(Language::parse("ar"), Some(Language::Ar));
        assert_eq!(Language::parse("en"), Some(Language::En));
        assert_eq!(Language::parse("fr"), None);
        assert_eq!(Language::default(), Language::Ar);
    }

    #[test]
    fn test_admin_message_complete_is_valid() {
        let msg = admin_message(&[
            (Language::Ar, "مرحبا", "نص"),
            (Language::En, "Hi", "Body"),
        ]);
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn test_admin_message_missing_language_rejected() {
        // 只提供英文：校验应在提交时立即失败
        let msg = admin_message(&[(Language::En, "Hi", "Body")]);
        let err = msg.validate().unwrap_err();
        assert!(matches!(err, NotifyError::Validation(_)));
        assert!(err.to_string().contains("ar"));
    }

    #[test]
    fn test_admin_message_blank_body_rejected() {
        let mut msg = admin_message(&[
            (Language::Ar, "مرحبا", "نص"),
            (Language::En, "Hi", "Body"),
        ]);
        msg.body.insert(Language::En, "   ".to_string());
        assert!(msg.validate().is_err());
    }

    #[test]
    fn test_admin_message_payload_shape() {
        let msg = admin_message(&[
            (Language::Ar, "مرحبا", "نص"),
            (Language::En, "Hi", "Body"),
        ]);
        let payload = msg.into_payload().unwrap();
        assert_eq!(payload["title"]["en"], "Hi");
        assert_eq!(payload["body"]["ar"], "نص");
    }

    #[test]
    fn test_new_notification_builder() {
        let new = NewNotification::new(NotificationKind::NewJoinRequest)
            .with_source(EntityRef::new(EntityKind::User, 7))
            .with_target(EntityRef::new(EntityKind::JoinRequest, 42));

        assert_eq!(new.kind, NotificationKind::NewJoinRequest);
        assert_eq!(new.source.unwrap().id, 7);
        assert_eq!(new.target.unwrap().kind, EntityKind::JoinRequest);
        assert!(new.payload.as_object().unwrap().is_empty());
    }
}
