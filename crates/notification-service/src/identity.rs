//! 调用方身份解析
//!
//! 读取接口同时服务已登录用户和匿名设备：
//! 有效 Token 优先，其次 device_token，两者都没有则拒绝请求。
//! Token 无效或缺失不单独报错，按匿名路径继续尝试 device_token。

use std::sync::Arc;

use crate::auth::Claims;
use crate::error::{NotifyError, Result};
use crate::models::RecipientRef;
use crate::repository::DeviceRepositoryTrait;

/// 调用方身份：已登录用户或匿名设备
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallerIdentity {
    /// 已验证的用户 ID
    User(i64),
    /// 客户端设备标识（尚未解析为设备行）
    Device(String),
}

impl CallerIdentity {
    /// 从请求凭证解析身份
    pub fn resolve(claims: Option<&Claims>, device_token: Option<&str>) -> Result<Self> {
        if let Some(claims) = claims {
            return Ok(CallerIdentity::User(claims.user_id()?));
        }
        match device_token {
            Some(token) if !token.trim().is_empty() => {
                Ok(CallerIdentity::Device(token.to_string()))
            }
            _ => Err(NotifyError::IdentityRequired),
        }
    }
}

/// 身份到接收者引用的解析器
///
/// 设备路径需要一次数据库查找把 device_token 换成设备行 ID。
#[derive(Clone)]
pub struct IdentityResolver {
    devices: Arc<dyn DeviceRepositoryTrait>,
}

impl IdentityResolver {
    pub fn new(devices: Arc<dyn DeviceRepositoryTrait>) -> Self {
        Self { devices }
    }

    /// 将调用方身份解析为通知接收者引用
    ///
    /// 未注册的 device_token 返回 DeviceNotFound：读取历史要求设备先注册。
    pub async fn recipient_ref(&self, identity: &CallerIdentity) -> Result<RecipientRef> {
        match identity {
            CallerIdentity::User(user_id) => Ok(RecipientRef::User(*user_id)),
            CallerIdentity::Device(device_token) => {
                let device = self
                    .devices
                    .find_by_device_token(device_token)
                    .await?
                    .ok_or_else(|| NotifyError::DeviceNotFound(device_token.clone()))?;
                Ok(RecipientRef::Device(device.id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Device, Language};
    use crate::repository::traits::MockDeviceRepositoryTrait;
    use chrono::Utc;

    fn claims(user_id: i64) -> Claims {
        Claims {
            sub: user_id.to_string(),
            roles: vec!["user".to_string()],
            iat: 0,
            exp: i64::MAX,
            iss: "diwan-platform".to_string(),
        }
    }

    #[test]
    fn test_resolve_prefers_authenticated_user() {
        let identity = CallerIdentity::resolve(Some(&claims(7)), Some("dev-abc")).unwrap();
        assert_eq!(identity, CallerIdentity::User(7));
    }

    #[test]
    fn test_resolve_falls_back_to_device() {
        let identity = CallerIdentity::resolve(None, Some("dev-abc")).unwrap();
        assert_eq!(identity, CallerIdentity::Device("dev-abc".to_string()));
    }

    #[test]
    fn test_resolve_requires_some_identity() {
        let err = CallerIdentity::resolve(None, None).unwrap_err();
        assert!(matches!(err, NotifyError::IdentityRequired));

        // 空白 device_token 等同于未提供
        let err = CallerIdentity::resolve(None, Some("  ")).unwrap_err();
        assert!(matches!(err, NotifyError::IdentityRequired));
    }

    #[tokio::test]
    async fn test_recipient_ref_for_device() {
        let mut devices = MockDeviceRepositoryTrait::new();
        devices
            .expect_find_by_device_token()
            .withf(|token| token == "dev-abc")
            .returning(|_| {
                Ok(Some(Device {
                    id: 42,
                    user_id: None,
                    device_token: "dev-abc".to_string(),
                    push_token: "fcm-1".to_string(),
                    language: Language::En.as_str().to_string(),
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                }))
            });

        let resolver = IdentityResolver::new(Arc::new(devices));
        let recipient = resolver
            .recipient_ref(&CallerIdentity::Device("dev-abc".to_string()))
            .await
            .unwrap();
        assert_eq!(recipient, RecipientRef::Device(42));
    }

    #[tokio::test]
    async fn test_recipient_ref_unregistered_device() {
        let mut devices = MockDeviceRepositoryTrait::new();
        devices
            .expect_find_by_device_token()
            .returning(|_| Ok(None));

        let resolver = IdentityResolver::new(Arc::new(devices));
        let err = resolver
            .recipient_ref(&CallerIdentity::Device("ghost".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::DeviceNotFound(_)));
    }

    #[tokio::test]
    async fn test_recipient_ref_for_user_skips_lookup() {
        let devices = MockDeviceRepositoryTrait::new();
        let resolver = IdentityResolver::new(Arc::new(devices));
        let recipient = resolver
            .recipient_ref(&CallerIdentity::User(7))
            .await
            .unwrap();
        assert_eq!(recipient, RecipientRef::User(7));
    }
}
