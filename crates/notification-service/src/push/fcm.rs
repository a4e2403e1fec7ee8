//! FCM HTTP v1 发送器
//!
//! 每个 push_token 一次 `messages:send` 调用。data 段携带类型与跳转信息
//! 供客户端路由，notification 段携带已按设备语言渲染好的标题与正文。

use async_trait::async_trait;
use serde_json::json;

use diwan_shared::config::FcmConfig;

use crate::error::{NotifyError, Result};
use crate::models::{EntityRef, NotificationKind};

/// iOS 锁屏角标的提示值
///
/// 推送侧不知道设备真实未读数，沿用平台约定的固定提示值，
/// 客户端打开后以接口返回的未读数为准。
const APNS_BADGE_HINT: u32 = 5;

/// 单条推送消息（已渲染，与设备语言绑定）
#[derive(Debug, Clone)]
pub struct PushMessage {
    pub notification_id: i64,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub destination: Option<EntityRef>,
}

impl PushMessage {
    /// 构造 FCM v1 的请求体
    pub fn to_fcm_payload(&self, push_token: &str) -> serde_json::Value {
        // data 段重复携带标题与正文，供客户端前台收到消息时自行展示
        let mut data = json!({
            "kind": self.kind.as_str(),
            "notification_id": self.notification_id.to_string(),
            "title": self.title,
            "body": self.body,
        });
        if let Some(destination) = self.destination {
            data["destination_kind"] = json!(destination.kind.as_str());
            data["destination_id"] = json!(destination.id.to_string());
        }

        json!({
            "message": {
                "token": push_token,
                "notification": {
                    "title": self.title,
                    "body": self.body,
                },
                "data": data,
                "android": {
                    "priority": "high",
                },
                "apns": {
                    "headers": {
                        "apns-priority": "10",
                    },
                    "payload": {
                        "aps": {
                            "badge": APNS_BADGE_HINT,
                        },
                    },
                },
            }
        })
    }
}

/// 推送发送器
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushSender: Send + Sync {
    /// 向单个 push_token 发送一条消息
    async fn send(&self, access_token: &str, push_token: &str, message: &PushMessage)
    -> Result<()>;
}

/// FCM HTTP v1 实现
pub struct FcmSender {
    http: reqwest::Client,
    endpoint: String,
}

impl FcmSender {
    pub fn new(config: &FcmConfig, http: reqwest::Client) -> Self {
        let endpoint = format!(
            "{}/v1/projects/{}/messages:send",
            config.api_base.trim_end_matches('/'),
            config.project_id
        );
        Self { http, endpoint }
    }
}

#[async_trait]
impl PushSender for FcmSender {
    async fn send(
        &self,
        access_token: &str,
        push_token: &str,
        message: &PushMessage,
    ) -> Result<()> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(access_token)
            .json(&message.to_fcm_payload(push_token))
            .send()
            .await
            .map_err(|e| NotifyError::Internal(format!("FCM 请求失败: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Internal(format!(
                "FCM 返回错误 ({status}): {body}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityKind;

    fn message() -> PushMessage {
        PushMessage {
            notification_id: 77,
            kind: NotificationKind::JoinRequestApproved,
            title: "تم قبول طلبك".to_string(),
            body: "تم قبول طلب انضمامك، أهلاً بك في المنصة".to_string(),
            destination: Some(EntityRef::new(EntityKind::JoinRequest, 42)),
        }
    }

    #[test]
    fn test_fcm_payload_shape() {
        let payload = message().to_fcm_payload("token-abc");
        let msg = &payload["message"];

        assert_eq!(msg["token"], "token-abc");
        assert_eq!(msg["notification"]["title"], "تم قبول طلبك");
        assert_eq!(msg["android"]["priority"], "high");
        assert_eq!(msg["apns"]["headers"]["apns-priority"], "10");
        assert_eq!(msg["apns"]["payload"]["aps"]["badge"], 5);

        // data 段的值全部是字符串，FCM 不接受数字
        assert_eq!(msg["data"]["kind"], "join_request_approved");
        assert_eq!(msg["data"]["title"], "تم قبول طلبك");
        assert_eq!(msg["data"]["notification_id"], "77");
        assert_eq!(msg["data"]["destination_kind"], "join_request");
        assert_eq!(msg["data"]["destination_id"], "42");
    }

    #[test]
    fn test_fcm_payload_without_destination() {
        let mut msg = message();
        msg.destination = None;
        let payload = msg.to_fcm_payload("token-abc");

        assert!(payload["message"]["data"]["destination_kind"].is_null());
    }

    #[test]
    fn test_endpoint_construction() {
        let config = FcmConfig {
            project_id: "diwan-prod".to_string(),
            credentials_path: "/etc/diwan/fcm.json".to_string(),
            api_base: "https://fcm.googleapis.com/".to_string(),
        };
        let sender = FcmSender::new(&config, reqwest::Client::new());
        assert_eq!(
            sender.endpoint,
            "https://fcm.googleapis.com/v1/projects/diwan-prod/messages:send"
        );
    }
}
