//! 设备标识模型
//!
//! 匿名推送通道的主体：device_token 由客户端生成且稳定，
//! push_token 每次注册都会被网关下发的新值覆盖。
//! 设备后续登录时可关联 user_id，匿名期间的通知历史保留。

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::notification::Language;

/// 设备标识
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: i64,
    /// 关联用户，匿名设备为空
    pub user_id: Option<i64>,
    pub device_token: String,
    /// 推送网关注册值，注册时整体替换
    pub push_token: String,
    /// 推送内容的首选语言（存储为 "ar"/"en"）
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Device {
    /// 解析存储的语言偏好，无法识别时回退到默认语言
    pub fn preferred_language(&self) -> Language {
        Language::parse(&self.language).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(language: &str) -> Device {
        Device {
            id: 1,
            user_id: None,
            device_token: "dev-abc".to_string(),
            push_token: "fcm-token-1".to_string(),
            language: language.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_preferred_language() {
        assert_eq!(device("en").preferred_language(), Language::En);
        assert_eq!(device("ar").preferred_language(), Language::Ar);
    }

    #[test]
    fn test_preferred_language_fallback() {
        // 历史数据中可能存在不再支持的语言码，回退到默认语言而不是报错
        assert_eq!(device("fr").preferred_language(), Language::Ar);
    }
}
